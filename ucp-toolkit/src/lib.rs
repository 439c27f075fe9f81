//! UCP Toolkit: Shopping Tools for AI Agents
//!
//! A Rust library that lets a language-model agent shop at any merchant
//! implementing the Universal Commerce Protocol (UCP). It wraps the merchant's
//! checkout REST API in a small set of named tools an agent framework can
//! list and call.
//!
//! # What is UCP Toolkit?
//!
//! - **Merchant Client**: UCP headers, discovery with version negotiation,
//!   checkout and order endpoints, merchant error mapping
//! - **Checkout Session**: cart merging, the three-step shipping flow, payment
//!   readiness and completion against the merchant's checkout
//! - **Tool Table**: ten tools with JSON Schemas and typed inputs, dispatched by name
//! - **Local Catalog**: keyword search over products the agent knows about
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   AI Agent      │  LLM agent loop (not part of this crate)
//! └────────┬────────┘
//!          │ tool name + JSON arguments
//!          │
//! ┌────────▼────────────────────────────────────────┐
//! │            UCP Toolkit (this crate)             │
//! │  ┌──────────────┐      ┌──────────────────┐    │
//! │  │   Toolkit    │──────│ CheckoutSession  │    │
//! │  │  (10 tools)  │      │ (catalog + ptr)  │    │
//! │  └──────────────┘      └────────┬─────────┘    │
//! │                        ┌────────▼─────────┐    │
//! │                        │    UcpClient     │    │
//! │                        └──────────────────┘    │
//! └────────┬───────────────────────────────────────┘
//!          │ HTTP + UCP headers
//!          │
//! ┌────────▼────────┐
//! │  UCP Merchant   │  checkout, fulfillment, payment, orders
//! └─────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use ucp_toolkit::{Product, Toolkit};
//!
//! # async fn example() -> ucp_toolkit::Result<()> {
//! let toolkit = Toolkit::builder("http://localhost:8182")
//!     .products([
//!         Product::new("bouquet_roses", "Bouquet of Red Roses"),
//!         Product::new("pot_ceramic", "Ceramic Pot"),
//!     ])
//!     .build()?;
//!
//! for tool in toolkit.definitions() {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//!
//! let output = toolkit.call("add_to_checkout", json!({"product_id": "bouquet_roses"})).await?;
//! println!("{}", output.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`catalog`]: local product catalog and keyword search
//! - [`client`]: UCP merchant client
//! - [`session`]: checkout session flows
//! - [`tools`]: tool names, descriptions, schemas and inputs
//! - [`format`]: agent-facing text rendering
//! - [`models`]: UCP request bodies and checkout accessors
//! - [`transport`]: transport abstraction (HTTP via reqwest)
//! - [`config`]: configuration and TOML loading
//! - [`error`]: error types
//!
//! # Error Handling
//!
//! All operations return [`Result<T, ToolkitError>`](error::Result). Merchant
//! errors are surfaced as-is; nothing is retried.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use ucp_toolkit::{Toolkit, ToolkitError};
//!
//! # async fn example(toolkit: Toolkit) {
//! match toolkit.call("complete_checkout", json!({})).await {
//!     Ok(output) => println!("{}", output.text),
//!     Err(ToolkitError::CheckoutNotReady { status }) => {
//!         eprintln!("Checkout is {status}; call update_customer_details first");
//!     }
//!     Err(ToolkitError::NoActiveCheckout) => eprintln!("Add items first"),
//!     Err(e) => eprintln!("Merchant error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and axum"
)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod tools;
pub mod transport;

mod toolkit;

pub use catalog::{Catalog, Product};
pub use config::ToolkitConfig;
pub use error::{Result, ToolkitError};
pub use toolkit::{Toolkit, ToolkitBuilder};
pub use tools::{ToolDefinition, ToolName, ToolOutput};
