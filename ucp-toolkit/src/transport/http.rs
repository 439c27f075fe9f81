//! HTTP transport implementation using reqwest.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

use crate::{
    config::ToolkitConfig,
    error::{Result, ToolkitError},
    transport::{HttpMethod, RequestContext, Transport, TransportResponse, sealed},
};

/// Rejects relative paths and paths with empty, `.` or `..` segments.
fn sanitize_path(path: &str) -> Result<&str> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(ToolkitError::InvalidMerchantUrl("Path must start with '/'".to_owned()));
    };
    if rest.split('/').any(|segment| matches!(segment, "" | "." | "..")) {
        return Err(ToolkitError::InvalidMerchantUrl(format!(
            "Invalid path: empty or dot segment in {path}"
        )));
    }
    Ok(path)
}

/// HTTP/1.1 and HTTP/2 transport with connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl sealed::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a transport with the given request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use ucp_toolkit::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new(Duration::from_secs(30), Duration::from_secs(10)).unwrap();
    /// ```
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ToolkitError::HttpError)?;

        Ok(Self { client })
    }

    /// Creates a transport using the timeouts from a toolkit configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &ToolkitConfig) -> Result<Self> {
        Self::new(config.timeout(), config.connect_timeout())
    }

    #[instrument(skip(self, ctx, body), fields(method = %method, path = ctx.path))]
    async fn execute(
        &self,
        method: HttpMethod,
        ctx: RequestContext<'_>,
        body: Option<&[u8]>,
    ) -> Result<TransportResponse> {
        let path = sanitize_path(ctx.path)?;
        let full_url = format!("{}{path}", ctx.base_url.trim_end_matches('/'));

        let mut request: RequestBuilder = match method {
            HttpMethod::Get => self.client.get(&full_url),
            HttpMethod::Post => self.client.post(&full_url),
            HttpMethod::Put => self.client.put(&full_url),
        };

        for (key, value) in ctx.headers {
            request = request.header(key, value);
        }

        if let Some(bytes) = body
            && !bytes.is_empty()
        {
            request = request.body(bytes.to_vec());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ToolkitError::HttpError)?.to_vec();

        debug!(status, bytes = body.len(), "merchant responded");

        Ok(TransportResponse { status, body })
    }
}

impl Transport for HttpTransport {
    async fn get<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.execute(HttpMethod::Get, ctx, None).await
    }

    async fn post<'a>(&'a self, ctx: RequestContext<'a>, body: &'a [u8]) -> Result<TransportResponse> {
        self.execute(HttpMethod::Post, ctx, Some(body)).await
    }

    async fn put<'a>(&'a self, ctx: RequestContext<'a>, body: &'a [u8]) -> Result<TransportResponse> {
        self.execute(HttpMethod::Put, ctx, Some(body)).await
    }

    fn protocol_name(&self) -> &'static str {
        "http"
    }
}
