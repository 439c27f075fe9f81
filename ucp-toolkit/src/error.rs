//! Error types for the UCP toolkit.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Network Errors** ([`ToolkitError::HttpError`]): HTTP communication failures
//! - **Merchant Errors** ([`ToolkitError::BadRequest`], [`ToolkitError::NotFound`],
//!   [`ToolkitError::ValidationError`], [`ToolkitError::MerchantError`]): non-success responses
//!   surfaced from the merchant without local recovery
//! - **Session Errors** ([`ToolkitError::NoActiveCheckout`],
//!   [`ToolkitError::CheckoutNotReady`]): the local session pointer does not allow the operation
//! - **Catalog Errors** ([`ToolkitError::DuplicateProductId`],
//!   [`ToolkitError::ProductNotFound`])
//! - **Dispatch Errors** ([`ToolkitError::UnknownTool`], [`ToolkitError::InvalidArguments`])
//!
//! # Examples
//!
//! ```
//! use ucp_toolkit::error::{Result, ToolkitError};
//!
//! fn require_checkout(checkout_id: Option<&str>) -> Result<&str> {
//!     checkout_id.ok_or(ToolkitError::NoActiveCheckout)
//! }
//!
//! assert!(require_checkout(None).is_err());
//! ```

use serde::Serialize;
use thiserror::Error;

/// Result type alias for toolkit operations.
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// A single field-level problem reported by a merchant validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `body.line_items.0.quantity`).
    pub field: String,
    /// Merchant-provided explanation.
    pub message: String,
}

/// Errors that can occur while talking to a merchant or dispatching tools.
///
/// Error messages are user-facing: the MCP adapter forwards them to the agent verbatim.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// HTTP request failed before a response was received.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Merchant rejected the request as malformed (HTTP 400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Merchant-provided message.
        message: String,
    },

    /// Merchant does not know the requested resource (HTTP 404).
    #[error("Not found: {message}")]
    NotFound {
        /// Merchant-provided message.
        message: String,
    },

    /// Merchant rejected the request payload (HTTP 422).
    #[error("{}", render_validation(.message, .field_errors))]
    ValidationError {
        /// Summary message.
        message: String,
        /// Per-field problems, when the merchant reported them.
        field_errors: Vec<FieldError>,
    },

    /// Any other non-success merchant response.
    #[error("Merchant returned status {status}: {message}")]
    MerchantError {
        /// HTTP status code.
        status: u16,
        /// Merchant-provided message.
        message: String,
        /// Full error body as returned by the merchant.
        details: serde_json::Value,
    },

    /// Merchant responded with success but the body could not be used.
    #[error("Invalid merchant response: {0}")]
    InvalidResponse(String),

    /// Merchant implements an older protocol version than this agent.
    #[error("UCP version {agent} is not supported. Merchant implements version {merchant}.")]
    VersionError {
        /// Protocol version spoken by this toolkit.
        agent: String,
        /// Protocol version advertised by the merchant.
        merchant: String,
    },

    /// Merchant URL failed validation.
    #[error("Invalid merchant URL: {0}")]
    InvalidMerchantUrl(String),

    /// Toolkit configuration is invalid or unreadable.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Two catalog entries share the same product id.
    #[error("Duplicate product id in catalog: {0}")]
    DuplicateProductId(String),

    /// The product is not part of the local catalog.
    #[error(
        "Product '{0}' not found in catalog. Use search_shopping_catalog to find available products."
    )]
    ProductNotFound(String),

    /// The operation needs a checkout session and none is active.
    #[error("No active checkout session. Add items first.")]
    NoActiveCheckout,

    /// Checkout cannot be completed in its current merchant status.
    #[error(
        "Checkout not ready. Status: {status}. Please add buyer info and shipping address first."
    )]
    CheckoutNotReady {
        /// Status reported by the merchant.
        status: String,
    },

    /// No tool with this name is registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments could not be decoded into the tool's input type.
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments {
        /// Tool name.
        tool: String,
        /// Decoder message.
        message: String,
    },

    /// JSON encoding of a request body failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolkitError {
    /// Returns the merchant HTTP status this error was built from, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::NotFound { .. } => Some(404),
            Self::ValidationError { .. } => Some(422),
            Self::MerchantError { status, .. } => Some(*status),
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn render_validation(message: &str, field_errors: &[FieldError]) -> String {
    if field_errors.is_empty() {
        return message.to_owned();
    }
    let joined = field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    format!("Validation error: {joined}")
}
