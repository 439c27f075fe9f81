//! Transport abstraction for merchant HTTP calls.
//!
//! The transport moves bytes; the [`UcpClient`](crate::client::UcpClient) owns
//! protocol headers, JSON encoding and error mapping. Non-success statuses are
//! returned as ordinary [`TransportResponse`]s so the client can read merchant
//! error bodies.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ucp_toolkit::transport::{HttpTransport, RequestContext, Transport};
//!
//! # async fn example() -> ucp_toolkit::error::Result<()> {
//! let transport = HttpTransport::new(Duration::from_secs(30), Duration::from_secs(10))?;
//!
//! let ctx = RequestContext {
//!     base_url: "https://merchant.example.com",
//!     path: "/.well-known/ucp",
//!     headers: vec![("Accept", "application/json")],
//! };
//!
//! let response = transport.get(ctx).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use crate::error::Result;

pub mod http;
#[cfg(test)]
pub(crate) mod recording;
pub(crate) mod sealed {
    /// Restricts [`Transport`](super::Transport) to the transports in this crate.
    pub trait Sealed {}
}

pub use http::HttpTransport;

/// HTTP method used by merchant operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
}

impl HttpMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context for transport operations.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Merchant base URL without trailing slash (e.g. <https://merchant.example.com>).
    pub base_url: &'a str,
    /// Request path beginning with `/`.
    pub path: &'a str,
    /// HTTP headers to send.
    pub headers: Vec<(&'a str, &'a str)>,
}

/// Raw merchant response.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport protocol abstraction.
///
/// This trait is sealed; only implementations within this crate are allowed.
pub trait Transport: sealed::Sealed + Send + Sync {
    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the body cannot be read.
    fn get<'a>(
        &'a self,
        ctx: RequestContext<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a POST request. An empty body is sent without a payload.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the body cannot be read.
    fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a PUT request.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or the body cannot be read.
    fn put<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
