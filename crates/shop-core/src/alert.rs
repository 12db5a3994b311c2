//! # Alerts
//!
//! The single user-visible result of the last orchestration step.

use serde::{Deserialize, Serialize};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Success,
    Error,
}

/// A user-visible alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == AlertKind::Error
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        };
        write!(f, "[{}] {}", label, self.message)
    }
}

/// Alert texts shown by the checkout flow
pub mod messages {
    pub const LOGIN_TO_PAY: &str = "Please log in to proceed with payment.";
    pub const COMPLETE_ADDRESS: &str = "Please fill in the delivery address to continue.";
    pub const SAVE_ADDRESS_FAILED: &str = "Could not save your delivery address. Please retry.";
    pub const PAYMENT_START_FAILED: &str = "Unable to start payment. Please try again.";
    pub const PAYMENT_CANCELLED: &str = "Payment was cancelled.";
    pub const RESTORE_FAILED: &str = "Failed to restore your address. Please retry.";
    pub const LOGIN_TO_REGISTER: &str = "Please log in to register your order.";
    pub const COMPLETE_FIELDS: &str = "Please fill out all required fields correctly.";
    pub const EMAIL_MISSING: &str = "User email not found. Please log in again.";
    pub const ORDER_PLACED: &str = "Order placed successfully!";
    pub const UNEXPECTED: &str = "An unexpected error occurred.";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
    pub const SIGNED_UP: &str = "Account created. Please log in.";
    pub const LOGGED_OUT: &str = "You have been logged out.";

    /// Message the order backend uses for a rejected token
    pub const AUTHORIZATION_FAILED: &str = "Authorization failed!";
}
