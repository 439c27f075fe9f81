//! Typed tool arguments.

use serde::Deserialize;

pub use crate::session::CustomerDetails as UpdateCustomerDetailsInput;
use crate::session::{DEFAULT_PAYMENT_HANDLER, DEFAULT_PAYMENT_TOKEN};

/// Arguments of `search_shopping_catalog`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchCatalogInput {
    /// Search query.
    pub query: String,
}

/// Arguments of `add_to_checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddToCheckoutInput {
    /// Catalog product id.
    pub product_id: String,
    /// Quantity to add.
    #[serde(default = "default_quantity")]
    pub quantity: u64,
}

/// Arguments of `remove_from_checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveFromCheckoutInput {
    /// Catalog product id.
    pub product_id: String,
}

/// Arguments of `update_checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateCheckoutInput {
    /// Catalog product id.
    pub product_id: String,
    /// New quantity; zero removes the product.
    pub quantity: u64,
}

/// Arguments of `complete_checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompleteCheckoutInput {
    /// Payment handler id.
    #[serde(default = "default_handler")]
    pub payment_handler_id: String,
    /// Payment token.
    #[serde(default = "default_token")]
    pub payment_token: String,
}

impl Default for CompleteCheckoutInput {
    fn default() -> Self {
        Self { payment_handler_id: default_handler(), payment_token: default_token() }
    }
}

/// Arguments of `get_order`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetOrderInput {
    /// Merchant order id.
    pub order_id: String,
}

const fn default_quantity() -> u64 {
    1
}

fn default_handler() -> String {
    DEFAULT_PAYMENT_HANDLER.to_owned()
}

fn default_token() -> String {
    DEFAULT_PAYMENT_TOKEN.to_owned()
}
