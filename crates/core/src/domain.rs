//! Shared domain vocabulary: role names and order/payment states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),

    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),
}

/// Built-in roles. Stored in the `roles` table with the `ROLE_` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    Admin,
    Employee,
    User,
}

impl RoleName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ROLE_ADMIN",
            RoleName::Employee => "ROLE_EMPLOYEE",
            RoleName::User => "ROLE_USER",
        }
    }

    /// Match a stored or user-supplied role name, accepting the legacy aliases
    /// (`ADMIN`, `EMPLOYEE`, `EMPLOYEES`, `USER`) in any case.
    pub fn parse(raw: &str) -> Option<RoleName> {
        let upper = raw.trim().to_uppercase();
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match bare {
            "ADMIN" => Some(RoleName::Admin),
            "EMPLOYEE" | "EMPLOYEES" => Some(RoleName::Employee),
            "USER" => Some(RoleName::User),
            _ => None,
        }
    }

    /// Canonical stored name. Unknown roles are kept, upper-cased.
    pub fn canonical(raw: &str) -> String {
        match RoleName::parse(raw) {
            Some(role) => role.as_str().to_string(),
            None => raw.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when any of the given role names resolves to `role`
pub fn has_role<S: AsRef<str>>(roles: &[S], role: RoleName) -> bool {
    roles
        .iter()
        .any(|name| RoleName::parse(name.as_ref()) == Some(role))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Accepted,
    Shipping,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses staff may move an order to from the fulfilment screen
    pub const fn is_fulfilment_step(&self) -> bool {
        matches!(self, OrderStatus::Shipping | OrderStatus::Completed)
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACCEPTED" => Ok(OrderStatus::Accepted),
            "SHIPPING" => Ok(OrderStatus::Shipping),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::UnknownOrderStatus(s.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Success,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Success => "SUCCESS",
        }
    }

    /// Money has been received for the order
    pub const fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Success)
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "SUCCESS" => Ok(PaymentStatus::Success),
            _ => Err(DomainError::UnknownPaymentStatus(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
