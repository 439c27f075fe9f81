//! HTTP client for a single UCP merchant.
//!
//! [`UcpClient`] owns the protocol concerns: UCP headers, JSON encoding,
//! discovery with version negotiation, and mapping of merchant error bodies to
//! [`ToolkitError`] variants. Bytes move through a [`Transport`].

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    config::{ToolkitConfig, parse_merchant_url},
    error::{FieldError, Result, ToolkitError},
    models::{
        Capability, Checkout, CheckoutCreateRequest, CheckoutUpdateRequest,
        CompleteCheckoutRequest, DiscoveryProfile, UcpMetadata,
    },
    transport::{HttpMethod, HttpTransport, RequestContext, Transport, TransportResponse},
};

/// UCP protocol version spoken by this toolkit.
pub const UCP_VERSION: &str = "2026-01-11";

const VERSION_FORMAT: &str = "%Y-%m-%d";
const REQUEST_SIGNATURE: &str = "dummy-signature";
const JSON: &str = "application/json";

/// Async client for a UCP-compliant merchant.
///
/// # Examples
///
/// ```rust,no_run
/// use ucp_toolkit::{ToolkitConfig, client::UcpClient};
///
/// # async fn example() -> ucp_toolkit::Result<()> {
/// let client = UcpClient::new(&ToolkitConfig::new("https://flowers.example.com"))?;
/// let profile = client.discover().await?;
/// println!("merchant speaks UCP {}", profile.ucp.version);
///
/// let order = client.get_order("ord_123").await?;
/// println!("{order}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UcpClient<T: Transport = HttpTransport> {
    transport: T,
    base: Url,
    merchant_url: String,
    agent_header: String,
    validate_version: bool,
    agent_capabilities: Vec<Capability>,
    profile: RwLock<Option<DiscoveryProfile>>,
}

impl UcpClient<HttpTransport> {
    /// Creates a client over HTTP using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &ToolkitConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> UcpClient<T> {
    /// Creates a client over an explicit transport.
    pub(crate) fn with_transport(config: &ToolkitConfig, transport: T) -> Result<Self> {
        let merchant_url = config.merchant_url.trim_end_matches('/').to_owned();
        let base = parse_merchant_url(&merchant_url)?;

        Ok(Self {
            transport,
            base,
            merchant_url,
            agent_header: format!("{}; version=\"{UCP_VERSION}\"", config.agent_name),
            validate_version: config.validate_version,
            agent_capabilities: Vec::new(),
            profile: RwLock::new(None),
        })
    }

    /// Sets the capabilities this agent supports, used for negotiation.
    #[must_use]
    pub fn with_agent_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.agent_capabilities = capabilities;
        self
    }

    /// Returns the merchant base URL without trailing slash.
    #[must_use]
    pub fn merchant_url(&self) -> &str {
        &self.merchant_url
    }

    /// Returns the value sent in the `UCP-Agent` header.
    #[must_use]
    pub fn agent_header(&self) -> &str {
        &self.agent_header
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches the merchant discovery profile, caching it for later calls.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::VersionError`] if version validation is enabled and
    /// the merchant's protocol version predates [`UCP_VERSION`], or any request error.
    #[instrument(skip(self), fields(merchant = %self.merchant_url))]
    pub async fn discover(&self) -> Result<DiscoveryProfile> {
        if let Some(profile) = self.profile.read().await.as_ref() {
            debug!("using cached discovery profile");
            return Ok(profile.clone());
        }

        let value = self.get_json("/.well-known/ucp").await?;
        let profile: DiscoveryProfile = serde_json::from_value(value)
            .map_err(|e| ToolkitError::InvalidResponse(format!("discovery profile: {e}")))?;

        if self.validate_version {
            check_version(&profile.ucp.version)?;
        }

        info!(version = %profile.ucp.version, "discovered merchant profile");
        *self.profile.write().await = Some(profile.clone());
        Ok(profile)
    }

    /// Drops the cached discovery profile.
    pub async fn clear_profile_cache(&self) {
        *self.profile.write().await = None;
    }

    /// Returns merchant capabilities whose name and version the agent also supports.
    ///
    /// # Errors
    ///
    /// Returns any error from [`discover`](Self::discover).
    pub async fn common_capabilities(&self) -> Result<Vec<Capability>> {
        let profile = self.discover().await?;
        Ok(self.intersect(profile.ucp.capabilities))
    }

    /// Returns the merchant's protocol version with the negotiated capabilities.
    ///
    /// # Errors
    ///
    /// Returns any error from [`discover`](Self::discover).
    pub async fn negotiated_metadata(&self) -> Result<UcpMetadata> {
        let profile = self.discover().await?;
        Ok(UcpMetadata {
            version: profile.ucp.version,
            capabilities: self.intersect(profile.ucp.capabilities),
            extra: Map::new(),
        })
    }

    fn intersect(&self, merchant: Vec<Capability>) -> Vec<Capability> {
        merchant
            .into_iter()
            .filter(|cap| {
                self.agent_capabilities
                    .iter()
                    .any(|agent| agent.name == cap.name && agent.version == cap.version)
            })
            .collect()
    }

    /// Creates a checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the merchant rejects it.
    #[instrument(skip(self, request), fields(items = request.line_items.len()))]
    pub async fn create_checkout(&self, request: &CheckoutCreateRequest) -> Result<Checkout> {
        let value = self.send_json(HttpMethod::Post, "/checkout-sessions", Some(request)).await?;
        let checkout = Checkout::new(value);
        info!(checkout_id = checkout.id(), status = checkout.status(), "checkout created");
        Ok(checkout)
    }

    /// Fetches a checkout session.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotFound`] if the merchant does not know the id.
    #[instrument(skip(self))]
    pub async fn get_checkout(&self, checkout_id: &str) -> Result<Checkout> {
        let path = self.path(&["checkout-sessions", checkout_id])?;
        self.get_json(&path).await.map(Checkout::new)
    }

    /// Replaces a checkout session's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the merchant rejects it.
    #[instrument(skip(self, request), fields(items = request.line_items.len()))]
    pub async fn update_checkout(
        &self,
        checkout_id: &str,
        request: &CheckoutUpdateRequest,
    ) -> Result<Checkout> {
        let path = self.path(&["checkout-sessions", checkout_id])?;
        let checkout = Checkout::new(self.send_json(HttpMethod::Put, &path, Some(request)).await?);
        debug!(status = checkout.status(), "checkout updated");
        Ok(checkout)
    }

    /// Completes a checkout session with payment.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the merchant declines the payment.
    #[instrument(skip(self, request))]
    pub async fn complete_checkout(
        &self,
        checkout_id: &str,
        request: &CompleteCheckoutRequest,
    ) -> Result<Checkout> {
        let path = self.path(&["checkout-sessions", checkout_id, "complete"])?;
        let checkout = Checkout::new(self.send_json(HttpMethod::Post, &path, Some(request)).await?);
        info!(order_id = checkout.order_id(), "checkout completed");
        Ok(checkout)
    }

    /// Cancels a checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the merchant rejects it.
    #[instrument(skip(self))]
    pub async fn cancel_checkout(&self, checkout_id: &str) -> Result<Checkout> {
        let path = self.path(&["checkout-sessions", checkout_id, "cancel"])?;
        let checkout =
            Checkout::new(self.send_json::<Value>(HttpMethod::Post, &path, None).await?);
        info!(status = checkout.status(), "checkout cancelled");
        Ok(checkout)
    }

    /// Fetches an order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotFound`] if the merchant does not know the id.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> Result<Value> {
        let path = self.path(&["orders", order_id])?;
        self.get_json(&path).await
    }

    /// Builds a request path from percent-encoded segments.
    fn path(&self, segments: &[&str]) -> Result<String> {
        let mut url = self.base.clone();
        url.set_path("");
        url.path_segments_mut()
            .map_err(|()| ToolkitError::InvalidMerchantUrl(self.merchant_url.clone()))?
            .clear()
            .extend(segments);
        Ok(url.path().to_owned())
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let request_id = Uuid::new_v4().to_string();
        let ctx = self.context(path, &request_id, None);
        debug!(path, %request_id, "GET");
        let response = self.transport.get(ctx).await?;
        handle_response(response)
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let payload = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };
        let request_id = Uuid::new_v4().to_string();
        let idempotency_key = Uuid::new_v4().to_string();
        let ctx = self.context(path, &request_id, Some(&idempotency_key));

        debug!(
            %method,
            path,
            %request_id,
            payload = %String::from_utf8_lossy(&payload),
            "sending request"
        );

        let response = match method {
            HttpMethod::Get => self.transport.get(ctx).await?,
            HttpMethod::Post => self.transport.post(ctx, &payload).await?,
            HttpMethod::Put => self.transport.put(ctx, &payload).await?,
        };
        handle_response(response)
    }

    fn context<'a>(
        &'a self,
        path: &'a str,
        request_id: &'a str,
        idempotency_key: Option<&'a str>,
    ) -> RequestContext<'a> {
        let mut headers = vec![
            ("Content-Type", JSON),
            ("Accept", JSON),
            ("UCP-Agent", self.agent_header.as_str()),
            ("Request-Signature", REQUEST_SIGNATURE),
            ("Request-Id", request_id),
        ];
        if let Some(key) = idempotency_key {
            headers.push(("Idempotency-Key", key));
        }
        RequestContext { base_url: &self.merchant_url, path, headers }
    }
}

/// Decodes a success body or maps a failure to an error variant.
fn handle_response(response: TransportResponse) -> Result<Value> {
    if !response.is_success() {
        let error = parse_error(response.status, &response.body);
        warn!(status = response.status, error = %error, "merchant returned error");
        return Err(error);
    }

    serde_json::from_slice(&response.body).map_err(|e| {
        ToolkitError::InvalidResponse(format!("status {} with undecodable body: {e}", response.status))
    })
}

/// Maps a non-success merchant response to a [`ToolkitError`].
///
/// The message is the body's `message`, else its `detail` string, else the raw body.
pub(crate) fn parse_error(status: u16, body: &[u8]) -> ToolkitError {
    let text = String::from_utf8_lossy(body);
    let data = match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            let message = if text.trim().is_empty() { "Unknown error" } else { text.as_ref() };
            serde_json::json!({ "message": message })
        }
    };

    let non_empty = |key: &str| data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    let message = non_empty("message")
        .or_else(|| non_empty("detail"))
        .map_or_else(|| data.to_string(), str::to_owned);

    match status {
        422 => {
            let field_errors = validation_details(&data);
            let message = if field_errors.is_empty() {
                message
            } else {
                format!("Invalid request: {} field(s) have errors", field_errors.len())
            };
            ToolkitError::ValidationError { message, field_errors }
        }
        404 => ToolkitError::NotFound { message },
        400 => ToolkitError::BadRequest { message },
        _ => ToolkitError::MerchantError { status, message, details: data },
    }
}

fn validation_details(data: &Value) -> Vec<FieldError> {
    let Some(details) = data.get("detail").and_then(Value::as_array) else {
        return Vec::new();
    };

    details
        .iter()
        .map(|entry| {
            let field = entry
                .get("loc")
                .and_then(Value::as_array)
                .map(|loc| {
                    loc.iter()
                        .map(|part| match part {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_else(|| "unknown".to_owned());
            let message =
                entry.get("msg").and_then(Value::as_str).unwrap_or("invalid").to_owned();
            FieldError { field, message }
        })
        .collect()
}

/// Rejects merchants whose protocol date is older than [`UCP_VERSION`].
///
/// Unparseable dates are logged and accepted.
fn check_version(merchant_version: &str) -> Result<()> {
    let agent = NaiveDate::parse_from_str(UCP_VERSION, VERSION_FORMAT);
    let merchant = NaiveDate::parse_from_str(merchant_version, VERSION_FORMAT);

    match (agent, merchant) {
        (Ok(agent), Ok(merchant)) if agent > merchant => Err(ToolkitError::VersionError {
            agent: UCP_VERSION.to_owned(),
            merchant: merchant_version.to_owned(),
        }),
        (Ok(_), Ok(_)) => Ok(()),
        (Err(e), _) | (_, Err(e)) => {
            warn!(merchant_version, error = %e, "could not parse UCP version, skipping check");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        models::{LineItemRequest, Payment},
        transport::recording::RecordingTransport,
    };

    fn client() -> UcpClient<RecordingTransport> {
        let mut config = ToolkitConfig::new("https://flowers.example.com/");
        config.agent_name = "test-agent".to_owned();
        UcpClient::with_transport(&config, RecordingTransport::new()).unwrap()
    }

    fn profile(version: &str) -> Value {
        json!({
            "ucp": {
                "version": version,
                "capabilities": [
                    {"name": "dev.ucp.shopping.checkout", "version": "2026-01-11"},
                    {"name": "dev.ucp.shopping.discount", "version": "2026-01-11"}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_create_checkout_request_shape() {
        let client = client();
        let fixture = json!({"id": "chk_1", "status": "incomplete", "currency": "USD"});
        client.transport().push_json(201, &fixture);

        let request = CheckoutCreateRequest {
            currency: "USD".into(),
            line_items: vec![LineItemRequest::new("roses", 2)],
            payment: Payment::default(),
        };
        let checkout = client.create_checkout(&request).await.unwrap();

        assert_eq!(checkout.into_value(), fixture);

        let sent = client.transport().last_request();
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.path, "/checkout-sessions");
        assert_eq!(
            sent.body,
            Some(json!({
                "currency": "USD",
                "line_items": [{"item": {"id": "roses"}, "quantity": 2}],
                "payment": {"instruments": []}
            }))
        );
        assert_eq!(sent.header("UCP-Agent"), Some("test-agent; version=\"2026-01-11\""));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(sent.header("Request-Signature"), Some("dummy-signature"));
        assert!(sent.header("Idempotency-Key").is_some());
        assert!(Uuid::parse_str(sent.header("Request-Id").unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_each_mutation_gets_fresh_idempotency_key() {
        let client = client();
        client.transport().push_json(200, &json!({"id": "chk_1"}));
        client.transport().push_json(200, &json!({"id": "chk_1"}));

        client.cancel_checkout("chk_1").await.unwrap();
        client.cancel_checkout("chk_1").await.unwrap();

        let requests = client.transport().requests();
        assert_ne!(requests[0].header("Idempotency-Key"), requests[1].header("Idempotency-Key"));
        assert_eq!(requests[0].path, "/checkout-sessions/chk_1/cancel");
        assert_eq!(requests[0].body, None);
    }

    #[tokio::test]
    async fn test_get_order_returns_body_unchanged() {
        let client = client();
        let order = json!({"id": "ord_1", "line_items": [{"quantity": {"total": 2}}]});
        client.transport().push_json(200, &order);

        assert_eq!(client.get_order("ord_1").await.unwrap(), order);

        let sent = client.transport().last_request();
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(sent.path, "/orders/ord_1");
        assert!(sent.header("Idempotency-Key").is_none());
    }

    #[tokio::test]
    async fn test_path_segments_are_encoded() {
        let client = client();
        client.transport().push_json(200, &json!({}));

        client.get_order("a b/c").await.unwrap();
        assert_eq!(client.transport().last_request().path, "/orders/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_merchant_base_path_is_kept_out_of_request_path() {
        let config = ToolkitConfig::new("https://merchant.example.com/api/");
        let client = UcpClient::with_transport(&config, RecordingTransport::new()).unwrap();
        client.transport().push_json(200, &json!({"id": "chk_9"}));

        client.get_checkout("chk_9").await.unwrap();
        assert_eq!(client.merchant_url(), "https://merchant.example.com/api");
        assert_eq!(client.transport().last_request().path, "/checkout-sessions/chk_9");
    }

    #[tokio::test]
    async fn test_discover_caches_profile() {
        let client = client();
        client.transport().push_json(200, &profile("2026-01-11"));

        let first = client.discover().await.unwrap();
        let second = client.discover().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.transport().requests().len(), 1);
        assert_eq!(client.transport().last_request().path, "/.well-known/ucp");

        client.clear_profile_cache().await;
        client.transport().push_json(200, &profile("2026-02-01"));
        assert_eq!(client.discover().await.unwrap().ucp.version, "2026-02-01");
    }

    #[tokio::test]
    async fn test_discover_rejects_older_merchant() {
        let client = client();
        client.transport().push_json(200, &profile("2025-06-01"));

        let result = client.discover().await;
        assert!(matches!(
            result,
            Err(ToolkitError::VersionError { ref merchant, .. }) if merchant == "2025-06-01"
        ));
    }

    #[tokio::test]
    async fn test_discover_accepts_unparseable_version() {
        let client = client();
        client.transport().push_json(200, &profile("draft"));
        assert!(client.discover().await.is_ok());
    }

    #[tokio::test]
    async fn test_discover_without_validation() {
        let mut config = ToolkitConfig::new("https://flowers.example.com");
        config.validate_version = false;
        let client = UcpClient::with_transport(&config, RecordingTransport::new()).unwrap();
        client.transport().push_json(200, &profile("2020-01-01"));
        assert!(client.discover().await.is_ok());
    }

    #[tokio::test]
    async fn test_common_capabilities() {
        let client = client().with_agent_capabilities(vec![
            Capability::new("dev.ucp.shopping.checkout", "2026-01-11"),
            Capability::new("dev.ucp.shopping.discount", "2025-01-01"),
        ]);
        client.transport().push_json(200, &profile("2026-01-11"));

        let common = client.common_capabilities().await.unwrap();
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].name, "dev.ucp.shopping.checkout");

        let metadata = client.negotiated_metadata().await.unwrap();
        assert_eq!(metadata.version, "2026-01-11");
        assert_eq!(metadata.capabilities, common);
    }

    #[tokio::test]
    async fn test_success_with_invalid_body() {
        let client = client();
        client.transport().push_raw(200, b"<html>".to_vec());
        assert!(matches!(
            client.get_checkout("chk_1").await,
            Err(ToolkitError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_error_not_found() {
        let error = parse_error(404, br#"{"detail": "Checkout session not found"}"#);
        assert!(matches!(error, ToolkitError::NotFound { ref message } if message == "Checkout session not found"));
    }

    #[test]
    fn test_parse_error_bad_request_prefers_message() {
        let error = parse_error(400, br#"{"message": "currency required", "detail": "x"}"#);
        assert_eq!(error.to_string(), "Bad request: currency required");
    }

    #[test]
    fn test_parse_error_validation_fields() {
        let body = json!({"detail": [
            {"loc": ["body", "line_items", 0, "quantity"], "msg": "must be positive"},
            {"msg": "unexpected"},
            {"loc": ["body", "currency"]}
        ]});
        let error = parse_error(422, body.to_string().as_bytes());

        let ToolkitError::ValidationError { message, field_errors } = error else {
            panic!("expected validation error");
        };
        assert_eq!(message, "Invalid request: 3 field(s) have errors");
        assert_eq!(field_errors[0].field, "body.line_items.0.quantity");
        assert_eq!(field_errors[0].message, "must be positive");
        assert_eq!(field_errors[1].field, "unknown");
        assert_eq!(field_errors[2].message, "invalid");
    }

    #[test]
    fn test_parse_error_plain_text_body() {
        let error = parse_error(500, b"Internal Server Error");
        let ToolkitError::MerchantError { status, message, details } = error else {
            panic!("expected merchant error");
        };
        assert_eq!(status, 500);
        assert_eq!(message, "Internal Server Error");
        assert_eq!(details, json!({"message": "Internal Server Error"}));
    }

    #[test]
    fn test_parse_error_empty_body() {
        let error = parse_error(503, b"");
        assert_eq!(error.to_string(), "Merchant returned status 503: Unknown error");
    }

    #[test]
    fn test_parse_error_falls_back_to_body_text() {
        let error = parse_error(409, br#"{"code": "conflict"}"#);
        assert_eq!(error.to_string(), r#"Merchant returned status 409: {"code":"conflict"}"#);
    }

    #[test]
    fn test_check_version() {
        assert!(check_version("2026-01-11").is_ok());
        assert!(check_version("2027-01-01").is_ok());
        assert!(check_version("2026-01-10").is_err());
        assert!(check_version("not-a-date").is_ok());
    }
}
