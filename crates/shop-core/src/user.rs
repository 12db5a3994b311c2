//! # User Types
//!
//! Cached user profile, login responses and signup payloads.

use crate::storage::keys;
use serde::{Deserialize, Serialize};

/// Lifetime applied when a login response carries no ttl
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Snapshot of the logged-in user's profile.
///
/// Every field defaults to an empty string when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pin: String,
    pub email: String,
}

impl UserProfile {
    /// "first last" when both names are present, otherwise empty
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return String::new();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// Profile fields paired with their persistent store keys
    pub fn stored_fields(&self) -> [(&'static str, &str); 7] {
        [
            (keys::FIRST_NAME, &self.first_name),
            (keys::LAST_NAME, &self.last_name),
            (keys::ADDRESS, &self.address),
            (keys::CITY, &self.city),
            (keys::STATE, &self.state),
            (keys::PIN, &self.pin),
            (keys::EMAIL, &self.email),
        ]
    }

    /// Rebuild a profile from per-field lookups; missing fields become "".
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let mut field = |key: &str| lookup(key).unwrap_or_default();
        Self {
            first_name: field(keys::FIRST_NAME),
            last_name: field(keys::LAST_NAME),
            address: field(keys::ADDRESS),
            city: field(keys::CITY),
            state: field(keys::STATE),
            pin: field(keys::PIN),
            email: field(keys::EMAIL),
        }
    }
}

/// Successful login response from the authentication backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginToken {
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl LoginToken {
    pub fn ttl_seconds(&self) -> u64 {
        self.expires_in_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECS)
    }
}

/// Signup payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub password: String,
}
