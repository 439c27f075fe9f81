//! Agent tool table.
//!
//! Ten tools with fixed names expose the checkout session to an agent
//! framework. Each tool has a description, a JSON Schema for its arguments
//! and a typed input in [`inputs`]. Dispatch lives in
//! [`Toolkit::call`](crate::Toolkit::call).
//!
//! # Available Tools
//!
//! ## Catalog
//! - `search_shopping_catalog`: keyword search over the local catalog
//!
//! ## Cart
//! - `add_to_checkout`, `remove_from_checkout`, `update_checkout`, `get_checkout`
//!
//! ## Checkout
//! - `update_customer_details`: shipping address, destination and option selection
//! - `start_payment`: reports what is still missing before payment
//! - `complete_checkout`: pays and places the order
//! - `cancel_checkout`
//!
//! ## Orders
//! - `get_order`

use std::{fmt, str::FromStr};

use serde::Serialize;
use serde_json::Value;

use crate::error::ToolkitError;

pub mod inputs;
mod schema;

/// Name of a toolkit tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// `search_shopping_catalog`
    SearchShoppingCatalog,
    /// `add_to_checkout`
    AddToCheckout,
    /// `remove_from_checkout`
    RemoveFromCheckout,
    /// `update_checkout`
    UpdateCheckout,
    /// `get_checkout`
    GetCheckout,
    /// `update_customer_details`
    UpdateCustomerDetails,
    /// `start_payment`
    StartPayment,
    /// `complete_checkout`
    CompleteCheckout,
    /// `cancel_checkout`
    CancelCheckout,
    /// `get_order`
    GetOrder,
}

impl ToolName {
    /// All tools in listing order.
    pub const ALL: [Self; 10] = [
        Self::SearchShoppingCatalog,
        Self::AddToCheckout,
        Self::RemoveFromCheckout,
        Self::UpdateCheckout,
        Self::GetCheckout,
        Self::UpdateCustomerDetails,
        Self::StartPayment,
        Self::CompleteCheckout,
        Self::CancelCheckout,
        Self::GetOrder,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchShoppingCatalog => "search_shopping_catalog",
            Self::AddToCheckout => "add_to_checkout",
            Self::RemoveFromCheckout => "remove_from_checkout",
            Self::UpdateCheckout => "update_checkout",
            Self::GetCheckout => "get_checkout",
            Self::UpdateCustomerDetails => "update_customer_details",
            Self::StartPayment => "start_payment",
            Self::CompleteCheckout => "complete_checkout",
            Self::CancelCheckout => "cancel_checkout",
            Self::GetOrder => "get_order",
        }
    }

    /// Returns the description shown to the agent.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SearchShoppingCatalog => {
                "Searches the product catalog for products that match the given query. \
                 Use this tool to find products before adding them to the cart. \
                 Returns matching products with their IDs and titles."
            }
            Self::AddToCheckout => {
                "Adds a product to the checkout session. \
                 Creates a new checkout if one doesn't exist. \
                 Use search_shopping_catalog first to find product IDs."
            }
            Self::RemoveFromCheckout => "Removes a product from the checkout session.",
            Self::UpdateCheckout => {
                "Updates the quantity of a product in the checkout session. \
                 Set quantity to 0 to remove the item."
            }
            Self::GetCheckout => {
                "Retrieves the current checkout session with all items and totals."
            }
            Self::UpdateCustomerDetails => {
                "Adds delivery address and buyer details to the checkout. \
                 Provide the recipient's name, full address, and optionally email. \
                 This prepares the checkout for payment."
            }
            Self::StartPayment => {
                "Prepares the checkout for payment. \
                 Call this after adding items and customer details. \
                 Returns the checkout status and any missing information."
            }
            Self::CompleteCheckout => {
                "Processes the payment and completes the checkout. \
                 Requires buyer info and shipping address to be set first. \
                 Use 'mock_payment_handler' with 'success_token' for testing."
            }
            Self::CancelCheckout => "Cancels the current checkout session and clears the cart.",
            Self::GetOrder => "Gets details of a placed order by ID.",
        }
    }

    /// Returns the tool's definition for listing.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str(),
            description: self.description(),
            input_schema: schema::input_schema(self),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolkitError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ToolkitError::UnknownTool(name.to_owned()))
    }
}

/// Tool definition as listed to agents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: &'static str,
    /// Agent-facing description.
    pub description: &'static str,
    /// JSON Schema of the arguments object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    /// Agent-readable summary.
    pub text: String,
    /// Merchant response, unmodified, when the tool made one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolOutput {
    /// Output with text only.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), data: None }
    }

    /// Output with text and structured data.
    #[must_use]
    pub fn with_data(text: impl Into<String>, data: Value) -> Self {
        Self { text: text.into(), data: Some(data) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn test_unknown_tool_name() {
        let result = "buy_everything".parse::<ToolName>();
        assert!(matches!(result, Err(ToolkitError::UnknownTool(name)) if name == "buy_everything"));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_definition_serializes_input_schema_key() {
        let value = serde_json::to_value(ToolName::GetOrder.definition()).unwrap();
        assert_eq!(value["name"], "get_order");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert_eq!(value["inputSchema"]["required"], serde_json::json!(["order_id"]));
    }

    #[test]
    fn test_output_omits_missing_data() {
        let value = serde_json::to_value(ToolOutput::text("hi")).unwrap();
        assert!(value.get("data").is_none());
    }
}
