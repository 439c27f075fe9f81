//! UCP data models.
//!
//! Request bodies are typed so that payload shape is checked at compile time.
//! Merchant responses stay as raw JSON: [`Checkout`] wraps the merchant's
//! checkout object and only offers read accessors, so the value handed back
//! to the agent is exactly what the merchant sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolkitError};

/// Merchant checkout session, as returned by the merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkout(Value);

/// Read-only view of one checkout line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemView<'a> {
    /// Merchant line item id.
    pub id: Option<&'a str>,
    /// Catalog item id.
    pub item_id: &'a str,
    /// Item title, when the merchant provides one.
    pub title: Option<&'a str>,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Quantity on the line.
    pub quantity: u64,
}

/// Read-only view of one checkout total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalView<'a> {
    /// Total type (e.g. `subtotal`, `tax`, `total`).
    pub kind: &'a str,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Merchant display label.
    pub display_text: Option<&'a str>,
}

impl Checkout {
    /// Wraps a merchant checkout object.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the checkout id, or an empty string if the merchant omitted it.
    #[must_use]
    pub fn id(&self) -> &str {
        self.str_field("id").unwrap_or_default()
    }

    /// Returns the merchant status (e.g. `incomplete`, `ready_for_complete`).
    #[must_use]
    pub fn status(&self) -> &str {
        self.str_field("status").unwrap_or("unknown")
    }

    /// Returns the checkout currency.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.str_field("currency")
    }

    /// Returns the line items in merchant order. Entries without an item id are skipped.
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItemView<'_>> {
        self.array("line_items")
            .iter()
            .filter_map(|line| {
                let item = line.get("item")?;
                Some(LineItemView {
                    id: line.get("id").and_then(Value::as_str),
                    item_id: item.get("id").and_then(Value::as_str)?,
                    title: item.get("title").and_then(Value::as_str),
                    price: item.get("price").and_then(Value::as_i64).unwrap_or(0),
                    quantity: line.get("quantity").and_then(Value::as_u64).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Returns every line item, failing on any line that cannot be re-sent.
    ///
    /// Line updates replace the whole list on the merchant, so a line without
    /// a string item id or an integer quantity would be lost or zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::InvalidResponse`] naming the first such line.
    pub fn editable_line_items(&self) -> Result<Vec<LineItemView<'_>>> {
        self.array("line_items")
            .iter()
            .enumerate()
            .map(|(position, line)| editable_line(position, line))
            .collect()
    }

    /// Returns the checkout totals.
    #[must_use]
    pub fn totals(&self) -> Vec<TotalView<'_>> {
        self.array("totals")
            .iter()
            .map(|total| TotalView {
                kind: total.get("type").and_then(Value::as_str).unwrap_or_default(),
                amount: total.get("amount").and_then(Value::as_i64).unwrap_or(0),
                display_text: total.get("display_text").and_then(Value::as_str),
            })
            .collect()
    }

    /// Returns true if the merchant recorded buyer details.
    #[must_use]
    pub fn has_buyer(&self) -> bool {
        self.0.get("buyer").is_some_and(is_present)
    }

    /// Returns true if the merchant recorded fulfillment details.
    #[must_use]
    pub fn has_fulfillment(&self) -> bool {
        self.0.get("fulfillment").is_some_and(is_present)
    }

    /// Returns the id of the first destination of the first fulfillment method.
    #[must_use]
    pub fn first_destination_id(&self) -> Option<&str> {
        self.first_method()?.get("destinations")?.get(0)?.get("id")?.as_str()
    }

    /// Returns the id of the first option in the first fulfillment group.
    #[must_use]
    pub fn first_option_id(&self) -> Option<&str> {
        self.first_method()?.get("groups")?.get(0)?.get("options")?.get(0)?.get("id")?.as_str()
    }

    /// Returns the order id once the checkout is completed.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.0.get("order")?.get("id")?.as_str()
    }

    /// Returns the order permalink once the checkout is completed.
    #[must_use]
    pub fn order_permalink(&self) -> Option<&str> {
        self.0.get("order")?.get("permalink_url")?.as_str()
    }

    /// Borrows the merchant JSON.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the merchant JSON unchanged.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    fn array(&self, key: &str) -> &[Value] {
        self.0.get(key).and_then(Value::as_array).map_or(&[][..], Vec::as_slice)
    }

    fn first_method(&self) -> Option<&Value> {
        self.0.get("fulfillment")?.get("methods")?.get(0)
    }
}

fn editable_line(position: usize, line: &Value) -> Result<LineItemView<'_>> {
    let malformed = |what: &str| {
        ToolkitError::InvalidResponse(format!("checkout line {position} has no {what}: {line}"))
    };
    let item = line.get("item").ok_or_else(|| malformed("item"))?;
    Ok(LineItemView {
        id: line.get("id").and_then(Value::as_str),
        item_id: item.get("id").and_then(Value::as_str).ok_or_else(|| malformed("string item id"))?,
        title: item.get("title").and_then(Value::as_str),
        price: item.get("price").and_then(Value::as_i64).unwrap_or(0),
        quantity: line
            .get("quantity")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("integer quantity"))?,
    })
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Reference to a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Catalog item id.
    pub id: String,
}

/// Line item in a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    /// Existing merchant line id; absent for new lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item being purchased.
    pub item: ItemRef,
    /// Quantity.
    pub quantity: u64,
}

impl LineItemRequest {
    /// Creates a new line for a catalog item.
    #[must_use]
    pub fn new(item_id: impl Into<String>, quantity: u64) -> Self {
        Self { id: None, item: ItemRef { id: item_id.into() }, quantity }
    }

    /// Copies an existing checkout line, optionally overriding its quantity.
    #[must_use]
    pub fn from_line(line: &LineItemView<'_>, quantity: Option<u64>) -> Self {
        Self {
            id: line.id.map(str::to_owned),
            item: ItemRef { id: line.item_id.to_owned() },
            quantity: quantity.unwrap_or(line.quantity),
        }
    }
}

/// Payment section of create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment instruments; empty until completion.
    pub instruments: Vec<Value>,
}

/// Body of `POST /checkout-sessions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutCreateRequest {
    /// ISO 4217 currency.
    pub currency: String,
    /// Initial line items.
    pub line_items: Vec<LineItemRequest>,
    /// Payment section.
    pub payment: Payment,
}

/// Body of `PUT /checkout-sessions/{id}`.
///
/// Updates replace the full line item list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutUpdateRequest {
    /// Checkout id.
    pub id: String,
    /// ISO 4217 currency.
    pub currency: String,
    /// Complete line item list.
    pub line_items: Vec<LineItemRequest>,
    /// Payment section.
    pub payment: Payment,
    /// Buyer details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Buyer>,
    /// Fulfillment selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<Value>,
}

/// Buyer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    /// Email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

/// Shipping destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// Client-generated destination id.
    pub id: String,
    /// Street line.
    pub street_address: String,
    /// Suite or apartment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_address: Option<String>,
    /// City.
    pub address_locality: String,
    /// State or region code.
    pub address_region: String,
    /// Postal code.
    pub postal_code: String,
    /// ISO 3166 country code.
    pub address_country: String,
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
}

/// Payment credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Credential type, always `token` here.
    #[serde(rename = "type")]
    pub kind: String,
    /// Handler-specific token.
    pub token: String,
}

/// Card payment instrument sent on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstrument {
    /// Client-generated instrument id.
    pub id: String,
    /// Payment handler id.
    pub handler_id: String,
    /// Payment handler name.
    pub handler_name: String,
    /// Instrument type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Card brand.
    pub brand: String,
    /// Last four card digits.
    pub last_digits: String,
    /// Credential for the handler.
    pub credential: Credential,
}

/// Body of `POST /checkout-sessions/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteCheckoutRequest {
    /// Payment instrument.
    pub payment_data: PaymentInstrument,
    /// Risk signals for the merchant.
    pub risk_signals: Map<String, Value>,
}

/// Capability advertised by a merchant or supported by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name (e.g. `dev.ucp.shopping.checkout`).
    pub name: String,
    /// Capability version date.
    pub version: String,
    /// Remaining capability fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Capability {
    /// Creates a capability with no extra fields.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), extra: Map::new() }
    }
}

/// `ucp` section of a discovery profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UcpMetadata {
    /// Protocol version date (`YYYY-MM-DD`).
    pub version: String,
    /// Capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Merchant profile served at `/.well-known/ucp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryProfile {
    /// Protocol metadata.
    pub ucp: UcpMetadata,
    /// Remaining profile sections (payment handlers, signing keys).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
