//! Shopping flow example against a running UCP merchant.
//!
//! Walks the whole tool sequence an agent would use: search, add to cart,
//! customer details, payment readiness, completion and order lookup.
//!
//! # Running this example
//!
//! Start a UCP merchant (any server implementing the checkout REST binding),
//! then:
//! ```bash
//! export UCP_MERCHANT_URL=http://localhost:8182
//! cargo run --example shopping_flow
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::uninlined_format_args,
    reason = "examples are allowed to use println and simple formatting"
)]

use std::env;

use serde_json::json;
use ucp_toolkit::{Product, Toolkit};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("UCP Toolkit: Shopping Flow Example\n");

    let merchant_url =
        env::var("UCP_MERCHANT_URL").unwrap_or_else(|_| "http://localhost:8182".to_owned());

    // Step 1: Build the toolkit with a small local catalog
    println!("1. Connecting to {merchant_url}...");
    let toolkit = Toolkit::builder(&merchant_url)
        .agent_name("example-agent")
        .products([
            Product::new("bouquet_roses", "Bouquet of Red Roses"),
            Product::new("bouquet_sunflowers", "Sunflower Bundle"),
            Product::new("pot_ceramic", "Ceramic Pot"),
        ])
        .build()?;

    let profile = toolkit.session().client().discover().await?;
    println!("   ✓ Merchant speaks UCP {}", profile.ucp.version);

    // Step 2: Find and add products
    println!("\n2. Searching for roses...");
    let found = toolkit.call("search_shopping_catalog", json!({"query": "roses"})).await?;
    println!("{}", found.text);

    println!("\n3. Adding to cart...");
    let added =
        toolkit.call("add_to_checkout", json!({"product_id": "bouquet_roses", "quantity": 2})).await?;
    println!("{}", added.text);

    // Step 3: Shipping and buyer details
    println!("\n4. Adding customer details...");
    let details = toolkit
        .call(
            "update_customer_details",
            json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "street_address": "123 Main St",
                "address_locality": "Springfield",
                "address_region": "IL",
                "postal_code": "62701",
                "email": "jane.doe@example.com"
            }),
        )
        .await?;
    println!("{}", details.text);

    // Step 4: Pay
    println!("\n5. Checking payment readiness...");
    let readiness = toolkit.call("start_payment", json!({})).await?;
    println!("{}", readiness.text);

    println!("\n6. Completing checkout...");
    match toolkit.call("complete_checkout", json!({})).await {
        Ok(completed) => {
            println!("{}", completed.text);
            if let Some(order_id) =
                completed.data.as_ref().and_then(|d| d.pointer("/order/id")).and_then(|v| v.as_str())
            {
                let order = toolkit.call("get_order", json!({"order_id": order_id})).await?;
                println!("\n7. Order details:\n{}", order.text);
            }
        }
        Err(e) => eprintln!("   ✗ Checkout failed: {e}"),
    }

    Ok(())
}
