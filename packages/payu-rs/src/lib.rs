// PayU hosted-checkout client: request-hash signing, return-redirect hash
// verification, and the verify_payment status API.
// Hash sequences follow https://docs.payu.in/docs/generate-hash

pub mod models;

use std::collections::BTreeMap;

use reqwest::Client;
use sha2::{Digest, Sha512};

pub use crate::models::{
    CallbackParams, GatewayStatus, PaymentRequest, PreparedPayment, TransactionDetail,
    VerifyPaymentResponse,
};

// Five unused udf slots plus six slots PayU reserves after them.
const EMPTY_HASH_SLOTS: usize = 11;

#[derive(Debug, thiserror::Error)]
pub enum PayUError {
    #[error("request to PayU failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("PayU returned an unexpected payload: {0}")]
    Decode(String),
    #[error("PayU rejected the request: {0}")]
    Gateway(String),
}

#[derive(Debug, Clone)]
pub struct PayUOptions {
    pub merchant_key: String,
    pub merchant_salt: String,
    /// `https://test.payu.in` for the sandbox, `https://secure.payu.in` live.
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PayUService {
    options: PayUOptions,
    client: Client,
}

impl PayUService {
    pub fn new(options: PayUOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Build the signed hosted-checkout form for a payment.
    pub fn payment_request(&self, request: &PaymentRequest) -> PreparedPayment {
        let amount = format_amount(request.amount);
        let hash = self.request_hash(request, &amount);

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), self.options.merchant_key.clone());
        fields.insert("txnid".to_string(), request.txnid.clone());
        fields.insert("amount".to_string(), amount);
        fields.insert("productinfo".to_string(), request.productinfo.clone());
        fields.insert("firstname".to_string(), request.firstname.clone());
        fields.insert("email".to_string(), request.email.clone());
        fields.insert("surl".to_string(), request.surl.clone());
        fields.insert("furl".to_string(), request.furl.clone());
        fields.insert("hash".to_string(), hash);

        PreparedPayment {
            action: format!("{}/_payment", self.options.base_url),
            fields,
        }
    }

    /// Check the hash PayU sends back on the return redirect.
    ///
    /// The response hash is the request sequence reversed, salted at the
    /// front and with the transaction status spliced in.
    pub fn verify_response_hash(&self, params: &CallbackParams) -> bool {
        let amount = format_amount(params.amount);

        let mut parts: Vec<&str> = Vec::with_capacity(EMPTY_HASH_SLOTS + 8);
        parts.push(&self.options.merchant_salt);
        parts.push(&params.status);
        parts.extend(std::iter::repeat("").take(EMPTY_HASH_SLOTS));
        parts.push(&params.email);
        parts.push(&params.firstname);
        parts.push(&params.productinfo);
        parts.push(&amount);
        parts.push(&params.txnid);
        parts.push(&self.options.merchant_key);

        sha512_hex(&parts.join("|")).eq_ignore_ascii_case(&params.hash)
    }

    /// Look up the settled status of a transaction via verify_payment.
    pub async fn payment_status(&self, txnid: &str) -> Result<GatewayStatus, PayUError> {
        let command_hash = sha512_hex(&format!(
            "{}|verify_payment|{}|{}",
            self.options.merchant_key, txnid, self.options.merchant_salt
        ));

        let url = format!("{}/merchant/postservice?form=2", self.options.base_url);
        let form = [
            ("key", self.options.merchant_key.as_str()),
            ("command", "verify_payment"),
            ("var1", txnid),
            ("hash", command_hash.as_str()),
        ];

        let response = self.client.post(url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PayUError::Gateway(format!("HTTP {status}")));
        }

        let body: VerifyPaymentResponse = response.json().await?;
        if body.status != 1 {
            return Err(PayUError::Gateway(
                body.msg.unwrap_or_else(|| "verify_payment lookup failed".to_string()),
            ));
        }

        let detail = body
            .transaction_details
            .get(txnid)
            .ok_or_else(|| PayUError::Decode(format!("no transaction details for {txnid}")))?;

        Ok(match detail.status.as_str() {
            "success" => GatewayStatus::Success,
            "failure" | "failed" => GatewayStatus::Failure,
            _ => GatewayStatus::Pending,
        })
    }

    fn request_hash(&self, request: &PaymentRequest, amount: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(EMPTY_HASH_SLOTS + 7);
        parts.push(&self.options.merchant_key);
        parts.push(&request.txnid);
        parts.push(amount);
        parts.push(&request.productinfo);
        parts.push(&request.firstname);
        parts.push(&request.email);
        parts.extend(std::iter::repeat("").take(EMPTY_HASH_SLOTS));
        parts.push(&self.options.merchant_salt);

        sha512_hex(&parts.join("|"))
    }
}

fn format_amount(amount: i64) -> String {
    format!("{amount}.00")
}

fn sha512_hex(input: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PayUService {
        PayUService::new(PayUOptions {
            merchant_key: "gtKFFx".to_string(),
            merchant_salt: "eCwWELxi".to_string(),
            base_url: "https://test.payu.in".to_string(),
        })
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            txnid: "FEST-abc123".to_string(),
            amount: 199,
            productinfo: "all-events".to_string(),
            firstname: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            surl: "https://fest.example.com/payment/return".to_string(),
            furl: "https://fest.example.com/payment/return".to_string(),
        }
    }

    #[test]
    fn payment_request_carries_all_checkout_fields() {
        let prepared = service().payment_request(&request());
        assert_eq!(prepared.action, "https://test.payu.in/_payment");
        for field in ["key", "txnid", "amount", "productinfo", "firstname", "email", "surl", "furl", "hash"] {
            assert!(prepared.fields.contains_key(field), "missing {field}");
        }
        assert_eq!(prepared.fields["amount"], "199.00");
    }

    #[test]
    fn request_hash_matches_documented_sequence() {
        // Sequence written out literally, independent of the implementation:
        // key|txnid|amount|productinfo|firstname|email|udf1..udf5|x6 reserved|salt
        let expected = sha512_hex(
            "gtKFFx|FEST-abc123|199.00|all-events|Asha|asha@example.com||||||||||||eCwWELxi",
        );
        let prepared = service().payment_request(&request());
        assert_eq!(prepared.fields["hash"], expected);
    }

    #[test]
    fn response_hash_roundtrip() {
        // salt|status|reserved x6|udf5..udf1|email|firstname|productinfo|amount|txnid|key
        let hash = sha512_hex(
            "eCwWELxi|success||||||||||||asha@example.com|Asha|all-events|199.00|FEST-abc123|gtKFFx",
        );
        let params = CallbackParams {
            txnid: "FEST-abc123".to_string(),
            status: "success".to_string(),
            amount: 199,
            productinfo: "all-events".to_string(),
            firstname: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            hash,
        };
        assert!(service().verify_response_hash(&params));
    }

    #[test]
    fn tampered_status_fails_verification() {
        let hash = sha512_hex(
            "eCwWELxi|success||||||||||||asha@example.com|Asha|all-events|199.00|FEST-abc123|gtKFFx",
        );
        let params = CallbackParams {
            txnid: "FEST-abc123".to_string(),
            status: "failure".to_string(),
            amount: 199,
            productinfo: "all-events".to_string(),
            firstname: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            hash,
        };
        assert!(!service().verify_response_hash(&params));
    }

    #[test]
    fn hash_covers_submitted_name_not_a_reconstruction() {
        // The gateway hashes the firstname submitted with the checkout
        // form. Rebuilding the params from any other source (say a profile
        // that changed since) must fail, which is why callers keep the
        // submitted values alongside the transaction.
        let hash = sha512_hex(
            "eCwWELxi|success||||||||||||asha@example.com|Asha|all-events|199.00|FEST-abc123|gtKFFx",
        );
        let params = CallbackParams {
            txnid: "FEST-abc123".to_string(),
            status: "success".to_string(),
            amount: 199,
            productinfo: "all-events".to_string(),
            firstname: "Bela".to_string(),
            email: "asha@example.com".to_string(),
            hash,
        };
        assert!(!service().verify_response_hash(&params));
    }

    #[test]
    fn hash_verification_is_case_insensitive() {
        let hash = sha512_hex(
            "eCwWELxi|success||||||||||||asha@example.com|Asha|all-events|199.00|FEST-abc123|gtKFFx",
        )
        .to_uppercase();
        let params = CallbackParams {
            txnid: "FEST-abc123".to_string(),
            status: "success".to_string(),
            amount: 199,
            productinfo: "all-events".to_string(),
            firstname: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            hash,
        };
        assert!(service().verify_response_hash(&params));
    }
}
