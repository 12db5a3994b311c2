//! # Delivery Form
//!
//! The delivery address form filled in on the cart page, and the partial
//! patch used to restore it from the pending checkout payload.

use crate::error::{ShopError, ShopResult};
use crate::order::DeliveryAddress;
use crate::user::UserProfile;
use serde::{Deserialize, Serialize};

/// Delivery form values. All fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pin: String,
}

impl DeliveryForm {
    /// Prefill from the session user
    pub fn from_user(user: &UserProfile) -> Self {
        Self {
            name: user.full_name(),
            address: user.address.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            pin: user.pin.clone(),
        }
    }

    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("pin", &self.pin),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn validate(&self) -> ShopResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShopError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Apply the fields present in `patch`, leaving the others untouched
    pub fn apply(&mut self, patch: &DeliveryFormPatch) {
        let fields = [
            (&mut self.name, &patch.name),
            (&mut self.address, &patch.address),
            (&mut self.city, &patch.city),
            (&mut self.state, &patch.state),
            (&mut self.pin, &patch.pin),
        ];
        for (slot, value) in fields {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
    }

    pub fn to_delivery_address(&self) -> DeliveryAddress {
        DeliveryAddress {
            user_name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pin: self.pin.clone(),
        }
    }
}

/// Partial form values, as read back from the pending checkout payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFormPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

impl From<&DeliveryForm> for DeliveryFormPatch {
    fn from(form: &DeliveryForm) -> Self {
        Self {
            name: Some(form.name.clone()),
            address: Some(form.address.clone()),
            city: Some(form.city.clone()),
            state: Some(form.state.clone()),
            pin: Some(form.pin.clone()),
        }
    }
}
