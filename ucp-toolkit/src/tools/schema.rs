//! JSON Schemas for tool arguments.

use serde_json::{Value, json};

use super::ToolName;

pub(super) fn input_schema(tool: ToolName) -> Value {
    match tool {
        ToolName::SearchShoppingCatalog => object(
            json!({
                "query": {"type": "string", "description": "Search query for finding products"}
            }),
            &["query"],
        ),
        ToolName::AddToCheckout => object(
            json!({
                "product_id": {"type": "string", "description": "The product ID to add"},
                "quantity": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 1,
                    "description": "Quantity to add"
                }
            }),
            &["product_id"],
        ),
        ToolName::RemoveFromCheckout => object(
            json!({
                "product_id": {"type": "string", "description": "The product ID to remove"}
            }),
            &["product_id"],
        ),
        ToolName::UpdateCheckout => object(
            json!({
                "product_id": {"type": "string", "description": "The product ID to update"},
                "quantity": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "New quantity (0 to remove)"
                }
            }),
            &["product_id", "quantity"],
        ),
        ToolName::UpdateCustomerDetails => object(
            json!({
                "first_name": string("First name of the recipient"),
                "last_name": string("Last name of the recipient"),
                "street_address": string("Street address"),
                "address_locality": string("City/locality"),
                "address_region": string("State/region code"),
                "postal_code": string("Postal/ZIP code"),
                "address_country": {"type": "string", "default": "US", "description": "Country code"},
                "extended_address": string("Suite/apt number"),
                "email": string("Email address")
            }),
            &[
                "first_name",
                "last_name",
                "street_address",
                "address_locality",
                "address_region",
                "postal_code",
            ],
        ),
        ToolName::CompleteCheckout => object(
            json!({
                "payment_handler_id": {
                    "type": "string",
                    "default": "mock_payment_handler",
                    "description": "Payment handler ID"
                },
                "payment_token": {
                    "type": "string",
                    "default": "success_token",
                    "description": "Payment token"
                }
            }),
            &[],
        ),
        ToolName::GetOrder => object(
            json!({
                "order_id": {"type": "string", "description": "The order ID to look up"}
            }),
            &["order_id"],
        ),
        ToolName::GetCheckout | ToolName::StartPayment | ToolName::CancelCheckout => {
            object(json!({}), &[])
        }
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}
