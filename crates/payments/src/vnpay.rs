//! VNPAY v2.1.0 payment URLs and IPN verification.
//!
//! Both directions sign the same canonical string: `vnp_*` parameters sorted
//! by key, each key and value form-urlencoded (space as `+`), joined with `&`,
//! then HMAC-SHA512 with the merchant hash secret, hex encoded.

use crate::config::VnpayConfig;
use crate::error::{PaymentError, PaymentResult};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha512;
use std::collections::BTreeMap;

type HmacSha512 = Hmac<Sha512>;

pub const VERSION: &str = "2.1.0";
const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
const SUCCESS_CODE: &str = "00";
/// VNPAY timestamps are Vietnam local time (UTC+7)
const VN_UTC_OFFSET_HOURS: i64 = 7;

/// Form-urlencode: unreserved `A-Za-z0-9-_.` kept, space as `+`, the rest `%XX`
pub fn form_urlencode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len() * 3);
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => encoded.push(byte as char),
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// `k1=v1&k2=v2...` over already-sorted parameters
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", form_urlencode(key), form_urlencode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex HMAC-SHA512 of `data`
pub fn sign(secret: &str, data: &str) -> PaymentResult<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::NotConfigured("VNP_HASH_SECRET".to_string()))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature, either letter case
pub fn verify(secret: &str, data: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// `YmdHis` in Vietnam local time
pub fn format_create_date(now: DateTime<Utc>) -> String {
    (now + Duration::hours(VN_UTC_OFFSET_HOURS))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// What the storefront is paying for
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Order code, echoed back as `vnp_TxnRef`
    pub txn_ref: String,
    pub amount_vnd: i64,
    pub order_info: String,
    pub ip_addr: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn for_order(order_code: &str, amount_vnd: i64, ip_addr: &str) -> Self {
        Self {
            txn_ref: order_code.to_string(),
            amount_vnd,
            order_info: format!("Thanh toan don hang #{}", order_code),
            ip_addr: ip_addr.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// `vnp_Amount` encoding: VND times 100
pub fn gateway_amount(amount_vnd: i64) -> PaymentResult<i64> {
    amount_vnd
        .checked_mul(100)
        .filter(|amount| *amount >= 0)
        .ok_or(PaymentError::AmountOutOfRange(amount_vnd))
}

/// Verified `vnp_*` parameters from an IPN or return redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VnpayCallback {
    pub txn_ref: Option<String>,
    pub response_code: Option<String>,
    pub transaction_status: Option<String>,
    /// `vnp_Amount` as sent: VND times 100; 0 when absent or malformed
    pub amount: i64,
    /// Gateway transaction number
    pub transaction_no: Option<String>,
}

impl VnpayCallback {
    fn from_params(params: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).cloned();
        Self {
            txn_ref: get("vnp_TxnRef").filter(|code| !code.is_empty()),
            response_code: get("vnp_ResponseCode"),
            transaction_status: get("vnp_TransactionStatus"),
            amount: params
                .get("vnp_Amount")
                .and_then(|amount| amount.trim().parse::<i64>().ok())
                .unwrap_or(0),
            transaction_no: get("vnp_TransactionNo").filter(|no| !no.is_empty()),
        }
    }

    /// Both the response code and the transaction status are `00`
    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(SUCCESS_CODE)
            && self.transaction_status.as_deref() == Some(SUCCESS_CODE)
    }

    /// `Payment failed: <responseCode>/<transactionStatus>`
    pub fn failure_message(&self) -> String {
        format!(
            "Payment failed: {}/{}",
            self.response_code.as_deref().unwrap_or_default(),
            self.transaction_status.as_deref().unwrap_or_default()
        )
    }

    /// True when the paid amount matches `amount_vnd`
    pub fn amount_matches(&self, amount_vnd: i64) -> bool {
        gateway_amount(amount_vnd).ok() == Some(self.amount)
    }
}

/// IPN acknowledgement body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpnReply {
    #[serde(rename = "RspCode")]
    pub rsp_code: &'static str,
    #[serde(rename = "Message")]
    pub message: &'static str,
}

impl IpnReply {
    const fn new(rsp_code: &'static str, message: &'static str) -> Self {
        Self { rsp_code, message }
    }

    pub const fn confirmed() -> Self {
        Self::new("00", "Confirm success")
    }

    pub const fn already_confirmed() -> Self {
        Self::new("00", "Order already confirmed")
    }

    pub const fn payment_failed() -> Self {
        Self::new("00", "Payment failed")
    }

    pub const fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub const fn invalid_amount() -> Self {
        Self::new("04", "Invalid amount")
    }

    pub const fn invalid_signature() -> Self {
        Self::new("97", "Invalid signature")
    }

    pub const fn unknown_error() -> Self {
        Self::new("99", "Unknown error")
    }
}

#[derive(Debug, Clone)]
pub struct VnpayGateway {
    config: VnpayConfig,
}

impl VnpayGateway {
    pub fn new(config: VnpayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VnpayConfig {
        &self.config
    }

    /// Parameters sent to VNPAY for `request`, before signing
    pub fn payment_params(&self, request: &PaymentRequest) -> PaymentResult<BTreeMap<String, String>> {
        let amount = gateway_amount(request.amount_vnd)?;
        let params = [
            ("vnp_Version", VERSION.to_string()),
            ("vnp_Command", "pay".to_string()),
            ("vnp_TmnCode", self.config.tmn_code.clone()),
            ("vnp_Amount", amount.to_string()),
            ("vnp_CreateDate", format_create_date(request.created_at)),
            ("vnp_CurrCode", "VND".to_string()),
            ("vnp_IpAddr", request.ip_addr.clone()),
            ("vnp_Locale", "vn".to_string()),
            ("vnp_OrderInfo", request.order_info.clone()),
            ("vnp_OrderType", "billpayment".to_string()),
            ("vnp_ReturnUrl", self.config.return_url.clone()),
            ("vnp_TxnRef", request.txn_ref.clone()),
        ];
        Ok(params
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect())
    }

    /// Signed redirect URL for the VNPAY checkout page
    pub fn payment_url(&self, request: &PaymentRequest) -> PaymentResult<String> {
        if let Some(missing) = self.config.missing_setting() {
            return Err(PaymentError::NotConfigured(missing.to_string()));
        }

        let query = canonical_query(&self.payment_params(request)?);
        let signature = sign(&self.config.hash_secret, &query)?;

        tracing::info!(
            target: "vnpay.create",
            txn_ref = %request.txn_ref,
            amount_vnd = request.amount_vnd,
            hash_len = self.config.hash_secret.len(),
            "VNPAY payment URL signed"
        );

        Ok(format!(
            "{}?{}&{}={}",
            self.config.pay_url, query, SECURE_HASH, signature
        ))
    }

    /// Check the signature of callback parameters. Non-`vnp_` keys are ignored.
    pub fn verify_callback<I, K, V>(&self, params: I) -> PaymentResult<VnpayCallback>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut signed: BTreeMap<String, String> = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, _)| key.starts_with("vnp_"))
            .collect();

        let received = signed.remove(SECURE_HASH);
        signed.remove(SECURE_HASH_TYPE);

        let data = canonical_query(&signed);
        let valid = !self.config.hash_secret.is_empty()
            && received
                .as_deref()
                .is_some_and(|hash| verify(&self.config.hash_secret, &data, hash));

        tracing::info!(
            target: "vnpay.ipn.verify",
            txn_ref = signed.get("vnp_TxnRef").map(String::as_str).unwrap_or_default(),
            valid,
            "VNPAY callback signature checked"
        );

        if !valid {
            return Err(PaymentError::InvalidSignature);
        }
        Ok(VnpayCallback::from_params(&signed))
    }
}
