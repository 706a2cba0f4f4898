//! Payment event wire types.
//!
//! The shapes are deliberately lenient: every field beyond the event id
//! and type is optional, so audit-only deliveries with sparse bodies
//! still parse. The reconciler, not the deserializer, decides what is
//! malformed.

use serde::Deserialize;

/// An inbound payment event.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    /// Provider-assigned event id.
    pub id: String,

    /// Event subtype, e.g. `order.paid`.
    pub event_type: String,

    /// The order or transaction the event describes.
    #[serde(default)]
    pub object: EventObject,
}

/// The order payload inside an event.
#[derive(Debug, Default, Deserialize)]
pub struct EventObject {
    /// Provider-assigned order id; the deduplication key.
    #[serde(default)]
    pub order_id: Option<String>,

    /// Payment status as reported by the provider.
    #[serde(default)]
    pub status: Option<String>,

    /// Checkout metadata echoed back by the provider.
    #[serde(default)]
    pub metadata: EventMetadata,

    /// The paying customer, when the provider shares it.
    #[serde(default)]
    pub customer: Option<EventCustomer>,
}

/// Metadata attached to the order at checkout time.
#[derive(Debug, Default, Deserialize)]
pub struct EventMetadata {
    /// The account to credit.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Credit quantity; a JSON number or a numeric string.
    #[serde(default)]
    pub credits: Option<serde_json::Value>,
}

/// Customer contact details.
#[derive(Debug, Deserialize)]
pub struct EventCustomer {
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
}

impl PaymentEvent {
    /// Whether this event subtype credits an account.
    ///
    /// An `order.paid` whose status disputes the type (anything other
    /// than `paid`) is demoted to audit-only.
    #[must_use]
    pub fn is_credit_bearing(&self) -> bool {
        match self.event_type.as_str() {
            "order.paid" => self.object.status.as_deref().unwrap_or("paid") == "paid",
            "transaction.completed" => true,
            _ => false,
        }
    }

    /// The deduplication key: the order id, falling back to the event id.
    #[must_use]
    pub fn order_reference(&self) -> &str {
        self.object.order_id.as_deref().unwrap_or(&self.id)
    }
}

/// Parse a credit quantity that may arrive as a number or numeric string.
#[must_use]
pub fn parse_credits(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
