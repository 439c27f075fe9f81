//! MCP server exposing the UCP shopping tools over stdio.
//!
//! The binary reads newline-delimited JSON-RPC 2.0 requests from stdin and
//! answers on stdout. Logs go to stderr.
//!
//! ```text
//! agent ──stdin──▶ McpServer ──▶ ucp_toolkit::Toolkit ──HTTP──▶ merchant
//!       ◀─stdout──
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod observability;
pub mod rpc;

pub use rpc::McpServer;
