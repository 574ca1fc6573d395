use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Details the merchant supplies when preparing a hosted-checkout payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Merchant transaction id, unique per order.
    pub txnid: String,
    /// Amount in whole rupees.
    pub amount: i64,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    /// Success return URL.
    pub surl: String,
    /// Failure return URL.
    pub furl: String,
}

/// Signed form fields ready to be POSTed to the gateway's checkout page.
///
/// The client renders these as a hidden form and submits it, handing the
/// browser over to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedPayment {
    /// Checkout form action URL.
    pub action: String,
    /// Form fields, including the request hash.
    pub fields: BTreeMap<String, String>,
}

/// Parameters needed to check the gateway's return-redirect hash.
///
/// `txnid`, `status` and `hash` come back on the redirect; the remaining
/// fields are reconstructed from the merchant's own order record.
#[derive(Debug, Clone)]
pub struct CallbackParams {
    pub txnid: String,
    pub status: String,
    pub amount: i64,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub hash: String,
}

/// Outcome of a verify_payment status lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Failure,
    /// Initiated but not yet settled on the gateway side.
    Pending,
}

/// Top-level verify_payment API response.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentResponse {
    /// 1 on success, 0 when the gateway rejected the lookup.
    pub status: i32,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub transaction_details: HashMap<String, TransactionDetail>,
}

/// Per-transaction entry in a verify_payment response.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDetail {
    pub status: String,
    #[serde(default)]
    pub mihpayid: Option<String>,
    #[serde(default)]
    pub amt: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}
