//! # bookstore-payments
//!
//! VNPAY integration (signed payment URLs and IPN callback verification)
//! and the USD to VND conversion client used to price VNPAY orders.

pub mod config;
pub mod error;
pub mod fx;
pub mod vnpay;

pub use config::{FxConfig, VnpayConfig};
pub use error::{PaymentError, PaymentResult};
pub use fx::FxClient;
pub use vnpay::{IpnReply, PaymentRequest, VnpayCallback, VnpayGateway};
