//! # Order Types
//!
//! Cart, provider line items, checkout sessions and the order submission
//! payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Convert a decimal dollar amount to cents
pub fn dollars_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Format cents for display (e.g., "$10.00")
pub fn format_cents(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

/// An entry in the shopping cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID
    pub product_id: String,

    /// Product name (denormalized for display)
    pub name: String,

    /// Unit price in cents
    pub unit_price_cents: i64,

    /// Quantity
    pub quantity: u32,
}

impl CartItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price_cents: i64,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price_cents,
            quantity,
        }
    }

    /// Calculate the total price for this entry in cents
    pub fn total_cents(&self) -> i64 {
        self.unit_price_cents.saturating_mul(i64::from(self.quantity))
    }
}

/// The shopping cart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, merging quantities when the product is already present
    pub fn add(&mut self, item: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all entries
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Calculate cart total in cents
    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.total_cents()))
    }

    /// One provider line item per cart entry
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(LineItem::from_cart_item).collect()
    }
}

/// A line item handed to the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product name shown on the hosted checkout page
    pub name: String,

    /// Unit amount in cents
    pub unit_amount_cents: i64,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            name: item.name.clone(),
            unit_amount_cents: item.unit_price_cents,
            quantity: item.quantity,
        }
    }
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect customer to for payment
    pub checkout_url: String,

    /// When the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(
        session_id: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check if session is still open for payment
    pub fn is_active(&self) -> bool {
        self.expires_at.map(|exp| exp > Utc::now()).unwrap_or(true)
    }
}

/// Delivery address submitted with an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub user_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pin: String,
}

/// Body of an order placement request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub delivery_address: DeliveryAddress,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_totals() {
        let mut cart = Cart::new();
        cart.add(CartItem::new("p1", "Product 1", 1000, 2)); // $20
        cart.add(CartItem::new("p2", "Product 2", 2500, 1)); // $25

        assert_eq!(cart.total_cents(), 4500);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(format_cents(cart.total_cents()), "$45.00");
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add(CartItem::new("p1", "Product 1", 1000, 1));
        cart.add(CartItem::new("p1", "Product 1", 1000, 2));

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[test]
    fn test_huge_cart_saturates() {
        let mut cart = Cart::new();
        cart.add(CartItem::new("x", "X", i64::MAX / 10, 100));
        cart.add(CartItem::new("x", "X", i64::MAX / 10, u32::MAX));
        cart.add(CartItem::new("y", "Y", i64::MAX, 1));

        assert_eq!(cart.items[0].quantity, u32::MAX);
        assert_eq!(cart.items[0].total_cents(), i64::MAX);
        assert_eq!(cart.total_cents(), i64::MAX);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_line_items_one_per_entry() {
        let mut cart = Cart::new();
        cart.add(CartItem::new("shirt", "Shirt", 1999, 2));
        cart.add(CartItem::new("mug", "Mug", 850, 1));

        let items = cart.line_items();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            LineItem {
                name: "Shirt".into(),
                unit_amount_cents: 1999,
                quantity: 2
            }
        );
    }

    #[test]
    fn test_dollars_to_cents() {
        assert_eq!(dollars_to_cents(10.99), 1099);
        assert_eq!(dollars_to_cents(0.1 + 0.2), 30);
    }

    #[test]
    fn test_order_request_wire_names() {
        let request = OrderRequest {
            delivery_address: DeliveryAddress {
                user_name: "Ada Lovelace".into(),
                address: "12 Analytical St".into(),
                city: "London".into(),
                state: "LDN".into(),
                pin: "10001".into(),
            },
            email: "ada@example.com".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["deliveryAddress"]["userName"], "Ada Lovelace");
        assert_eq!(json["email"], "ada@example.com");
    }
}
