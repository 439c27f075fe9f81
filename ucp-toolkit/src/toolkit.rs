//! Toolkit facade and tool dispatch.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::{
    catalog::{Catalog, Product},
    client::UcpClient,
    config::ToolkitConfig,
    error::{Result, ToolkitError},
    format::{format_checkout_summary, format_order_summary, format_search_results},
    models::Checkout,
    session::{CheckoutSession, CustomerDetails, PaymentReadiness},
    tools::{
        ToolDefinition, ToolName, ToolOutput,
        inputs::{
            AddToCheckoutInput, CompleteCheckoutInput, GetOrderInput, RemoveFromCheckoutInput,
            SearchCatalogInput, UpdateCheckoutInput,
        },
    },
    transport::{HttpTransport, Transport},
};

/// Shopping tools bound to one merchant and one checkout session.
///
/// # Examples
///
/// ```rust,no_run
/// use serde_json::json;
/// use ucp_toolkit::{Product, Toolkit};
///
/// # async fn example() -> ucp_toolkit::Result<()> {
/// let toolkit = Toolkit::builder("http://localhost:8182")
///     .agent_name("flower-agent")
///     .product(Product::new("roses", "Red Roses"))
///     .build()?;
///
/// let found = toolkit.call("search_shopping_catalog", json!({"query": "rose"})).await?;
/// println!("{}", found.text);
///
/// let added = toolkit.call("add_to_checkout", json!({"product_id": "roses"})).await?;
/// println!("{}", added.text);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Toolkit<T: Transport = HttpTransport> {
    session: CheckoutSession<T>,
}

impl Toolkit<HttpTransport> {
    /// Creates a toolkit talking HTTP to the configured merchant.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, the catalog has duplicate
    /// ids, or the HTTP client cannot be built.
    pub fn new(config: ToolkitConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, transport)
    }

    /// Loads a TOML configuration file and creates a toolkit from it.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is invalid.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ToolkitConfig::from_file(path)?)
    }

    /// Starts a builder for the given merchant URL.
    #[must_use]
    pub fn builder(merchant_url: impl Into<String>) -> ToolkitBuilder {
        ToolkitBuilder { config: ToolkitConfig::new(merchant_url) }
    }
}

impl<T: Transport> Toolkit<T> {
    pub(crate) fn with_transport(mut config: ToolkitConfig, transport: T) -> Result<Self> {
        config.normalize();
        let catalog = Catalog::new(std::mem::take(&mut config.products))?;
        let client = UcpClient::with_transport(&config, transport)?;

        info!(
            merchant = client.merchant_url(),
            products = catalog.len(),
            "toolkit ready"
        );

        Ok(Self {
            session: CheckoutSession::new(client, catalog, config.currency, config.agent_name),
        })
    }

    /// Returns the checkout session.
    #[must_use]
    pub const fn session(&self) -> &CheckoutSession<T> {
        &self.session
    }

    /// Returns the local catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.session.catalog()
    }

    /// Lists the definitions of all tools.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolName::ALL.into_iter().map(ToolName::definition).collect()
    }

    /// Forgets the active checkout.
    pub async fn clear_session(&self) {
        self.session.clear_session().await;
    }

    /// Invokes a tool by name with JSON arguments. `null` is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::UnknownTool`] for an unknown name,
    /// [`ToolkitError::InvalidArguments`] if the arguments do not decode, or
    /// any error of the tool itself.
    #[instrument(skip(self, arguments))]
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        let tool: ToolName = name.parse()?;
        let arguments = if arguments.is_null() { Value::Object(Map::new()) } else { arguments };

        match tool {
            ToolName::SearchShoppingCatalog => {
                let input: SearchCatalogInput = decode(tool, arguments)?;
                self.search_shopping_catalog(&input.query)
            }
            ToolName::AddToCheckout => {
                let input: AddToCheckoutInput = decode(tool, arguments)?;
                self.add_to_checkout(&input.product_id, input.quantity).await
            }
            ToolName::RemoveFromCheckout => {
                let input: RemoveFromCheckoutInput = decode(tool, arguments)?;
                self.remove_from_checkout(&input.product_id).await
            }
            ToolName::UpdateCheckout => {
                let input: UpdateCheckoutInput = decode(tool, arguments)?;
                self.update_checkout(&input.product_id, input.quantity).await
            }
            ToolName::GetCheckout => self.get_checkout().await,
            ToolName::UpdateCustomerDetails => {
                let input: CustomerDetails = decode(tool, arguments)?;
                self.update_customer_details(&input).await
            }
            ToolName::StartPayment => self.start_payment().await,
            ToolName::CompleteCheckout => {
                let input: CompleteCheckoutInput = decode(tool, arguments)?;
                self.complete_checkout(&input.payment_handler_id, &input.payment_token).await
            }
            ToolName::CancelCheckout => self.cancel_checkout().await,
            ToolName::GetOrder => {
                let input: GetOrderInput = decode(tool, arguments)?;
                self.get_order(&input.order_id).await
            }
        }
    }

    /// `search_shopping_catalog`: searches the local catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Serialization`] if the result cannot be encoded.
    pub fn search_shopping_catalog(&self, query: &str) -> Result<ToolOutput> {
        let result = self.catalog().search(query);
        let text = format_search_results(&result);
        Ok(ToolOutput::with_data(text, serde_json::to_value(&result)?))
    }

    /// `add_to_checkout`: adds a catalog product, creating a checkout if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ProductNotFound`] or any merchant error.
    pub async fn add_to_checkout(&self, product_id: &str, quantity: u64) -> Result<ToolOutput> {
        let title = self
            .catalog()
            .get(product_id)
            .map(|p: &Product| p.title.clone())
            .ok_or_else(|| ToolkitError::ProductNotFound(product_id.to_owned()))?;
        let checkout = self.session.add_to_checkout(product_id, quantity).await?;
        Ok(checkout_output(format!("Added {quantity}x {title} to cart."), checkout))
    }

    /// `remove_from_checkout`: removes a product from the checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] or any merchant error.
    pub async fn remove_from_checkout(&self, product_id: &str) -> Result<ToolOutput> {
        let checkout = self.session.remove_from_checkout(product_id).await?;
        Ok(checkout_output("Removed item from cart.", checkout))
    }

    /// `update_checkout`: sets a product's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] or any merchant error.
    pub async fn update_checkout(&self, product_id: &str, quantity: u64) -> Result<ToolOutput> {
        let checkout = self.session.update_checkout_quantity(product_id, quantity).await?;
        let action = if quantity == 0 { "removed from" } else { "updated in" };
        Ok(checkout_output(format!("Item {action} cart."), checkout))
    }

    /// `get_checkout`: shows the active checkout.
    ///
    /// # Errors
    ///
    /// Returns any merchant error.
    pub async fn get_checkout(&self) -> Result<ToolOutput> {
        Ok(match self.session.get_checkout().await? {
            Some(checkout) => {
                let text = format_checkout_summary(&checkout);
                ToolOutput::with_data(text, checkout.into_value())
            }
            None => ToolOutput::text(ToolkitError::NoActiveCheckout.to_string()),
        })
    }

    /// `update_customer_details`: records buyer and shipping details.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] or any merchant error.
    pub async fn update_customer_details(&self, details: &CustomerDetails) -> Result<ToolOutput> {
        let checkout = self.session.update_customer_details(details).await?;
        Ok(checkout_output("Updated customer details.", checkout))
    }

    /// `start_payment`: reports whether the checkout can be paid.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] or any merchant error.
    pub async fn start_payment(&self) -> Result<ToolOutput> {
        Ok(match self.session.start_payment().await? {
            PaymentReadiness::Ready(checkout) => {
                let text = format!(
                    "Checkout is ready for payment!\n\n{}\n\nUse complete_checkout to finalize the order.",
                    format_checkout_summary(&checkout)
                );
                ToolOutput::with_data(text, checkout.into_value())
            }
            PaymentReadiness::Missing { missing, checkout } => ToolOutput::with_data(
                format!("Checkout is not ready. Please provide: {}", missing.join(", ")),
                checkout.into_value(),
            ),
        })
    }

    /// `complete_checkout`: pays and places the order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::CheckoutNotReady`], [`ToolkitError::NoActiveCheckout`]
    /// or any merchant error.
    pub async fn complete_checkout(&self, handler_id: &str, token: &str) -> Result<ToolOutput> {
        let checkout = self.session.complete_checkout(handler_id, token).await?;
        Ok(checkout_output("Order placed successfully!", checkout))
    }

    /// `cancel_checkout`: cancels the active checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] or any merchant error.
    pub async fn cancel_checkout(&self) -> Result<ToolOutput> {
        let checkout = self.session.cancel_checkout().await?;
        Ok(checkout_output("Checkout cancelled.", checkout))
    }

    /// `get_order`: shows a placed order.
    ///
    /// # Errors
    ///
    /// Returns any merchant error.
    pub async fn get_order(&self, order_id: &str) -> Result<ToolOutput> {
        let order = self.session.get_order(order_id).await?;
        Ok(ToolOutput::with_data(format_order_summary(&order), order))
    }
}

fn checkout_output(headline: impl AsRef<str>, checkout: Checkout) -> ToolOutput {
    let text = format!("{}\n\n{}", headline.as_ref(), format_checkout_summary(&checkout));
    ToolOutput::with_data(text, checkout.into_value())
}

fn decode<I: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<I> {
    serde_json::from_value(arguments).map_err(|e| ToolkitError::InvalidArguments {
        tool: tool.as_str().to_owned(),
        message: e.to_string(),
    })
}

/// Builder for [`Toolkit`].
#[derive(Debug, Clone)]
pub struct ToolkitBuilder {
    config: ToolkitConfig,
}

impl ToolkitBuilder {
    /// Sets the agent name sent in the `UCP-Agent` header.
    #[must_use]
    pub fn agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.config.agent_name = agent_name.into();
        self
    }

    /// Sets the currency for new checkouts.
    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.config.currency = currency.into();
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Enables or disables merchant version validation during discovery.
    #[must_use]
    pub const fn validate_version(mut self, validate: bool) -> Self {
        self.config.validate_version = validate;
        self
    }

    /// Adds one product to the catalog.
    #[must_use]
    pub fn product(mut self, product: Product) -> Self {
        self.config.products.push(product);
        self
    }

    /// Adds products to the catalog.
    #[must_use]
    pub fn products(mut self, products: impl IntoIterator<Item = Product>) -> Self {
        self.config.products.extend(products);
        self
    }

    /// Builds the toolkit.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the catalog has duplicate ids.
    pub fn build(self) -> Result<Toolkit> {
        Toolkit::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::{HttpMethod, recording::RecordingTransport};

    fn toolkit() -> Toolkit<RecordingTransport> {
        let mut config = ToolkitConfig::new("https://flowers.example.com");
        config.agent_name = "flower-agent".to_owned();
        config.products = vec![
            Product::new("roses", "Red Roses"),
            Product::new("tulips", "Spring Tulips"),
        ];
        Toolkit::with_transport(config, RecordingTransport::new()).unwrap()
    }

    fn transport(toolkit: &Toolkit<RecordingTransport>) -> &RecordingTransport {
        toolkit.session().client().transport()
    }

    fn cart(status: &str) -> Value {
        json!({
            "id": "chk_1",
            "status": status,
            "currency": "USD",
            "line_items": [{"id": "li_1", "item": {"id": "roses", "title": "Red Roses", "price": 1299}, "quantity": 1}],
            "totals": [{"type": "total", "amount": 1299}]
        })
    }

    async fn open_checkout(toolkit: &Toolkit<RecordingTransport>) {
        transport(toolkit).push_json(201, &cart("incomplete"));
        toolkit.call("add_to_checkout", json!({"product_id": "roses"})).await.unwrap();
    }

    #[test]
    fn test_definitions_list_all_tools() {
        let definitions = toolkit().definitions();
        let names: Vec<&str> = definitions.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "search_shopping_catalog",
                "add_to_checkout",
                "remove_from_checkout",
                "update_checkout",
                "get_checkout",
                "update_customer_details",
                "start_payment",
                "complete_checkout",
                "cancel_checkout",
                "get_order",
            ]
        );
    }

    #[test]
    fn test_duplicate_catalog_rejected() {
        let mut config = ToolkitConfig::new("https://flowers.example.com");
        config.products = vec![Product::new("roses", "A"), Product::new("roses", "B")];
        let result = Toolkit::with_transport(config, RecordingTransport::new());
        assert!(matches!(result, Err(ToolkitError::DuplicateProductId(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = toolkit().call("buy_everything", json!({})).await;
        assert!(matches!(result, Err(ToolkitError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let result = toolkit().call("add_to_checkout", json!({"quantity": 2})).await;
        assert!(matches!(
            result,
            Err(ToolkitError::InvalidArguments { ref tool, .. }) if tool == "add_to_checkout"
        ));
    }

    #[tokio::test]
    async fn test_search_tool() {
        let output =
            toolkit().call("search_shopping_catalog", json!({"query": "rose"})).await.unwrap();
        assert!(output.text.contains("**Red Roses** (Product ID: `roses`)"));
        assert_eq!(output.data.unwrap()["total"], 1);
    }

    #[tokio::test]
    async fn test_add_tool_forwards_create_and_returns_fixture() {
        let toolkit = toolkit();
        let fixture = cart("incomplete");
        transport(&toolkit).push_json(201, &fixture);

        let output = toolkit
            .call("add_to_checkout", json!({"product_id": "roses", "quantity": 1}))
            .await
            .unwrap();

        assert!(output.text.starts_with("Added 1x Red Roses to cart.\n\n**Checkout ID:** chk_1"));
        assert!(output.text.contains("Red Roses x1 @ $12.99 each"));
        assert_eq!(output.data, Some(fixture));
        let sent = transport(&toolkit).last_request();
        assert_eq!((sent.method, sent.path.as_str()), (HttpMethod::Post, "/checkout-sessions"));
    }

    #[tokio::test]
    async fn test_add_tool_unknown_product() {
        let result = toolkit().call("add_to_checkout", json!({"product_id": "orchids"})).await;
        let error = result.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Product 'orchids' not found in catalog. Use search_shopping_catalog to find available products."
        );
    }

    #[tokio::test]
    async fn test_remove_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("incomplete"));
        let fixture = json!({"id": "chk_1", "status": "incomplete", "line_items": []});
        transport(&toolkit).push_json(200, &fixture);

        let output =
            toolkit.call("remove_from_checkout", json!({"product_id": "roses"})).await.unwrap();

        assert!(output.text.starts_with("Removed item from cart."));
        assert_eq!(output.data, Some(fixture));
        let sent = transport(&toolkit).last_request();
        assert_eq!((sent.method, sent.path.as_str()), (HttpMethod::Put, "/checkout-sessions/chk_1"));
        assert_eq!(sent.body.unwrap()["line_items"], json!([]));
    }

    #[tokio::test]
    async fn test_update_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("incomplete"));
        transport(&toolkit).push_json(200, &cart("incomplete"));

        let output = toolkit
            .call("update_checkout", json!({"product_id": "roses", "quantity": 4}))
            .await
            .unwrap();

        assert!(output.text.starts_with("Item updated in cart."));
        let body = transport(&toolkit).last_request().body.unwrap();
        assert_eq!(body["line_items"][0]["quantity"], 4);
    }

    #[tokio::test]
    async fn test_get_checkout_tool_without_session() {
        let output = toolkit().call("get_checkout", Value::Null).await.unwrap();
        assert_eq!(output.text, "No active checkout session. Add items first.");
        assert!(output.data.is_none());
    }

    #[tokio::test]
    async fn test_get_checkout_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        let fixture = cart("incomplete");
        transport(&toolkit).push_json(200, &fixture);

        let output = toolkit.call("get_checkout", json!({})).await.unwrap();

        assert!(output.text.contains("**Status:** incomplete"));
        assert_eq!(output.data, Some(fixture));
        assert_eq!(transport(&toolkit).last_request().method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn test_update_customer_details_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("incomplete"));
        let fixture = cart("incomplete");
        transport(&toolkit).push_json(200, &fixture);

        let output = toolkit
            .call(
                "update_customer_details",
                json!({
                    "first_name": "Jane",
                    "last_name": "Doe",
                    "street_address": "1 Main St",
                    "address_locality": "Springfield",
                    "address_region": "IL",
                    "postal_code": "62701",
                    "email": "jane@example.com"
                }),
            )
            .await
            .unwrap();

        assert!(output.text.starts_with("Updated customer details."));
        assert_eq!(output.data, Some(fixture));
        let body = transport(&toolkit).last_request().body.unwrap();
        assert_eq!(body["fulfillment"]["methods"][0]["destinations"][0]["address_country"], "US");
    }

    #[tokio::test]
    async fn test_start_payment_tool_missing() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("incomplete"));

        let output = toolkit.call("start_payment", json!({})).await.unwrap();
        assert_eq!(
            output.text,
            "Checkout is not ready. Please provide: buyer email address, shipping address"
        );
    }

    #[tokio::test]
    async fn test_start_payment_tool_ready() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        let mut ready = cart("ready_for_complete");
        ready["buyer"] = json!({"email": "jane@example.com"});
        ready["fulfillment"] = json!({"methods": [{"type": "shipping"}]});
        transport(&toolkit).push_json(200, &ready);

        let output = toolkit.call("start_payment", json!({})).await.unwrap();
        assert!(output.text.starts_with("Checkout is ready for payment!"));
        assert!(output.text.ends_with("Use complete_checkout to finalize the order."));
    }

    #[tokio::test]
    async fn test_complete_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("ready_for_complete"));
        let mut completed = cart("completed");
        completed["order"] = json!({"id": "ord_1", "permalink_url": "https://flowers.example.com/o/1"});
        transport(&toolkit).push_json(200, &completed);

        let output = toolkit.call("complete_checkout", json!({})).await.unwrap();

        assert!(output.text.starts_with("Order placed successfully!"));
        assert!(output.text.contains("  - Order ID: ord_1"));
        assert_eq!(output.data, Some(completed));
        let sent = transport(&toolkit).last_request();
        assert_eq!(sent.path, "/checkout-sessions/chk_1/complete");
        let body = sent.body.unwrap();
        assert_eq!(body["payment_data"]["handler_id"], "mock_payment_handler");
        assert_eq!(body["payment_data"]["credential"]["token"], "success_token");
        assert_eq!(body["risk_signals"]["device_id"], "flower-agent");
        assert!(toolkit.session().current_checkout_id().await.is_none());
    }

    #[tokio::test]
    async fn test_complete_tool_not_ready() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        transport(&toolkit).push_json(200, &cart("incomplete"));

        let result = toolkit.call("complete_checkout", json!({})).await;
        assert!(matches!(result, Err(ToolkitError::CheckoutNotReady { .. })));
    }

    #[tokio::test]
    async fn test_cancel_tool() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        let fixture = cart("canceled");
        transport(&toolkit).push_json(200, &fixture);

        let output = toolkit.call("cancel_checkout", Value::Null).await.unwrap();

        assert!(output.text.starts_with("Checkout cancelled."));
        assert_eq!(output.data, Some(fixture));
        assert!(toolkit.session().current_checkout_id().await.is_none());
    }

    #[tokio::test]
    async fn test_get_order_tool() {
        let toolkit = toolkit();
        let order = json!({
            "id": "ord_1",
            "checkout_id": "chk_1",
            "line_items": [{"item": {"title": "Red Roses"}, "quantity": {"total": 1}, "status": "processing"}]
        });
        transport(&toolkit).push_json(200, &order);

        let output = toolkit.call("get_order", json!({"order_id": "ord_1"})).await.unwrap();

        assert!(output.text.starts_with("**Order ID:** ord_1"));
        assert_eq!(output.data, Some(order));
        assert_eq!(transport(&toolkit).last_request().path, "/orders/ord_1");
    }

    #[tokio::test]
    async fn test_merchant_error_surfaces() {
        let toolkit = toolkit();
        transport(&toolkit).push_json(404, &json!({"detail": "Order not found"}));

        let result = toolkit.call("get_order", json!({"order_id": "missing"})).await;
        assert!(matches!(result, Err(ToolkitError::NotFound { ref message }) if message == "Order not found"));
    }

    #[tokio::test]
    async fn test_clear_session() {
        let toolkit = toolkit();
        open_checkout(&toolkit).await;
        toolkit.clear_session().await;
        assert!(toolkit.session().current_checkout_id().await.is_none());
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = Toolkit::builder("ftp://flowers.example.com").build();
        assert!(matches!(result, Err(ToolkitError::InvalidMerchantUrl(_))));
    }

    #[test]
    fn test_builder_collects_products() {
        let toolkit = Toolkit::builder("http://localhost:8182")
            .agent_name("agent")
            .currency("EUR")
            .timeout_secs(5)
            .validate_version(false)
            .product(Product::new("roses", "Red Roses"))
            .products([Product::new("tulips", "Spring Tulips")])
            .build()
            .unwrap();
        assert_eq!(toolkit.catalog().len(), 2);
    }
}
