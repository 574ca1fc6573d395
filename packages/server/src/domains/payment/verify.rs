use std::time::Duration;

use payu::{GatewayStatus, PayUService};

/// Bounded retry policy for gateway status confirmation.
#[derive(Debug, Clone, Copy)]
pub struct VerifyRetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for VerifyRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// What the gateway ultimately told us about a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Gateway reports the payment settled.
    Confirmed,
    /// Gateway reports a definitive failure.
    Declined,
    /// Attempts exhausted without a settled answer. The order is left
    /// re-verifiable; the caller reports failure to the user but must not
    /// move the order to a terminal state.
    Unconfirmed,
}

/// Poll the gateway until it reports a settled status or attempts run out.
/// Pending statuses and transient errors retry after the policy delay; a
/// definitive decline stops early.
pub async fn confirm_with_gateway(
    payu: &PayUService,
    txn_id: &str,
    policy: VerifyRetryPolicy,
) -> Confirmation {
    for attempt in 1..=policy.attempts {
        match payu.payment_status(txn_id).await {
            Ok(GatewayStatus::Success) => return Confirmation::Confirmed,
            Ok(GatewayStatus::Failure) => return Confirmation::Declined,
            Ok(GatewayStatus::Pending) => {
                tracing::debug!(txn_id, attempt, "payment still pending at gateway");
            }
            Err(e) => {
                tracing::warn!(txn_id, attempt, error = %e, "gateway status check failed");
            }
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }
    Confirmation::Unconfirmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use payu::{PayUOptions, PayUService};

    #[tokio::test]
    async fn unreachable_gateway_exhausts_attempts_as_unconfirmed() {
        let payu = PayUService::new(PayUOptions {
            merchant_key: "key".to_string(),
            merchant_salt: "salt".to_string(),
            // Nothing listens here; every status call errors out fast.
            base_url: "http://127.0.0.1:9".to_string(),
        });
        let policy = VerifyRetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(1),
        };

        let outcome = confirm_with_gateway(&payu, "FEST-test", policy).await;
        assert_eq!(outcome, Confirmation::Unconfirmed);
    }
}
