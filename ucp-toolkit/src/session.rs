//! Checkout session flows.
//!
//! [`CheckoutSession`] pairs a [`UcpClient`] with the local [`Catalog`] and a
//! pointer to the merchant checkout currently being worked on. The checkout
//! itself lives on the merchant; every read goes back to it.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    catalog::{Catalog, Product},
    client::UcpClient,
    error::{Result, ToolkitError},
    models::{
        Buyer, Checkout, CheckoutCreateRequest, CheckoutUpdateRequest, CompleteCheckoutRequest,
        Credential, LineItemRequest, Payment, PaymentInstrument, PostalAddress,
    },
    transport::{HttpTransport, Transport},
};

/// Default payment handler for completion.
pub const DEFAULT_PAYMENT_HANDLER: &str = "mock_payment_handler";

/// Default payment token for completion.
pub const DEFAULT_PAYMENT_TOKEN: &str = "success_token";

const READY_FOR_COMPLETE: &str = "ready_for_complete";
const MISSING_BUYER: &str = "buyer email address";
const MISSING_SHIPPING: &str = "shipping address";

/// Recipient and shipping address supplied by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerDetails {
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
    /// Street line.
    pub street_address: String,
    /// City or locality.
    pub address_locality: String,
    /// State or region code.
    pub address_region: String,
    /// Postal or ZIP code.
    pub postal_code: String,
    /// ISO 3166 country code.
    #[serde(default = "default_country")]
    pub address_country: String,
    /// Suite or apartment.
    #[serde(default)]
    pub extended_address: Option<String>,
    /// Buyer email. Buyer details are only sent when present.
    #[serde(default)]
    pub email: Option<String>,
}

fn default_country() -> String {
    "US".to_owned()
}

impl CustomerDetails {
    fn buyer(&self) -> Option<Buyer> {
        self.email.as_deref().filter(|email| !email.trim().is_empty()).map(|email| Buyer {
            email: email.to_owned(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        })
    }

    fn address(&self) -> PostalAddress {
        PostalAddress {
            id: short_id("dest"),
            street_address: self.street_address.clone(),
            extended_address: self.extended_address.clone().filter(|s| !s.is_empty()),
            address_locality: self.address_locality.clone(),
            address_region: self.address_region.clone(),
            postal_code: self.postal_code.clone(),
            address_country: self.address_country.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Result of [`CheckoutSession::start_payment`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentReadiness {
    /// Buyer and fulfillment are present.
    Ready(Checkout),
    /// Details the agent still has to collect, with the checkout as fetched.
    Missing {
        /// Human-readable names of missing details.
        missing: Vec<&'static str>,
        /// Checkout as returned by the merchant.
        checkout: Checkout,
    },
}

/// Stateful checkout session for one agent conversation.
#[derive(Debug)]
pub struct CheckoutSession<T: Transport = HttpTransport> {
    client: UcpClient<T>,
    catalog: Catalog,
    currency: String,
    device_id: String,
    checkout_id: RwLock<Option<String>>,
}

impl<T: Transport> CheckoutSession<T> {
    /// Creates a session with no active checkout.
    pub fn new(
        client: UcpClient<T>,
        catalog: Catalog,
        currency: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            catalog,
            currency: currency.into(),
            device_id: device_id.into(),
            checkout_id: RwLock::new(None),
        }
    }

    /// Returns the merchant client.
    #[must_use]
    pub const fn client(&self) -> &UcpClient<T> {
        &self.client
    }

    /// Returns the local catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the id of the active checkout, if any.
    pub async fn current_checkout_id(&self) -> Option<String> {
        self.checkout_id.read().await.clone()
    }

    /// Forgets the active checkout.
    pub async fn clear_session(&self) {
        if let Some(id) = self.checkout_id.write().await.take() {
            debug!(checkout_id = %id, "session cleared");
        }
    }

    /// Adds a catalog product to the checkout, creating one if needed.
    ///
    /// An existing line for the product has `quantity` added to it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ProductNotFound`] if the product is not in the
    /// catalog, [`ToolkitError::InvalidArguments`] if the merged quantity
    /// overflows, [`ToolkitError::InvalidResponse`] if a merchant line cannot
    /// be re-sent, or any merchant error.
    #[instrument(skip(self))]
    pub async fn add_to_checkout(&self, product_id: &str, quantity: u64) -> Result<Checkout> {
        let product = self.product(product_id)?;

        let Some(checkout_id) = self.current_checkout_id().await else {
            return self.create_checkout(product, quantity).await;
        };

        let existing = match self.client.get_checkout(&checkout_id).await {
            Ok(existing) => existing,
            Err(ToolkitError::NotFound { message }) => {
                warn!(%checkout_id, %message, "active checkout no longer exists, starting a new one");
                self.clear_session().await;
                return self.create_checkout(product, quantity).await;
            }
            Err(e) => return Err(e),
        };

        let mut found = false;
        let mut line_items = Vec::new();
        for line in existing.editable_line_items()? {
            if line.item_id == product.id {
                found = true;
                let total = line.quantity.checked_add(quantity).ok_or_else(|| {
                    ToolkitError::InvalidArguments {
                        tool: "add_to_checkout".to_owned(),
                        message: format!(
                            "quantity {quantity} on top of {} overflows",
                            line.quantity
                        ),
                    }
                })?;
                line_items.push(LineItemRequest::from_line(&line, Some(total)));
            } else {
                line_items.push(LineItemRequest::from_line(&line, None));
            }
        }
        if !found {
            line_items.push(LineItemRequest::new(&product.id, quantity));
        }

        self.replace_items(&checkout_id, &existing, line_items).await
    }

    /// Removes every line for the product from the checkout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] without an active checkout, or
    /// any merchant error.
    #[instrument(skip(self))]
    pub async fn remove_from_checkout(&self, product_id: &str) -> Result<Checkout> {
        let checkout_id = self.require_checkout().await?;
        let existing = self.client.get_checkout(&checkout_id).await?;

        let line_items = existing
            .editable_line_items()?
            .iter()
            .filter(|line| line.item_id != product_id)
            .map(|line| LineItemRequest::from_line(line, None))
            .collect();

        self.replace_items(&checkout_id, &existing, line_items).await
    }

    /// Sets the quantity of the product's lines. Zero removes them.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] without an active checkout, or
    /// any merchant error.
    #[instrument(skip(self))]
    pub async fn update_checkout_quantity(
        &self,
        product_id: &str,
        quantity: u64,
    ) -> Result<Checkout> {
        if quantity == 0 {
            return self.remove_from_checkout(product_id).await;
        }

        let checkout_id = self.require_checkout().await?;
        let existing = self.client.get_checkout(&checkout_id).await?;

        let line_items = existing
            .editable_line_items()?
            .iter()
            .map(|line| {
                let override_quantity = (line.item_id == product_id).then_some(quantity);
                LineItemRequest::from_line(line, override_quantity)
            })
            .collect();

        self.replace_items(&checkout_id, &existing, line_items).await
    }

    /// Fetches the active checkout, or `None` without one.
    ///
    /// # Errors
    ///
    /// Returns any merchant error.
    #[instrument(skip(self))]
    pub async fn get_checkout(&self) -> Result<Option<Checkout>> {
        match self.current_checkout_id().await {
            Some(checkout_id) => self.client.get_checkout(&checkout_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Records buyer and shipping details, then selects the first destination
    /// and the first shipping option the merchant offers.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] without an active checkout, or
    /// any merchant error.
    #[instrument(skip(self, details), fields(locality = %details.address_locality))]
    pub async fn update_customer_details(&self, details: &CustomerDetails) -> Result<Checkout> {
        let checkout_id = self.require_checkout().await?;
        let existing = self.client.get_checkout(&checkout_id).await?;
        let line_items: Vec<LineItemRequest> = existing
            .editable_line_items()?
            .iter()
            .map(|line| LineItemRequest::from_line(line, None))
            .collect();
        let buyer = details.buyer();
        let address = details.address();

        let fulfillment = json!({
            "methods": [{"type": "shipping", "destinations": [address]}]
        });
        let checkout = self
            .put_fulfillment(&checkout_id, &existing, &line_items, buyer.clone(), fulfillment)
            .await?;
        debug!(status = checkout.status(), "shipping address added");

        let Some(destination_id) = checkout.first_destination_id().map(str::to_owned) else {
            debug!("merchant returned no destinations");
            return Ok(checkout);
        };
        let fulfillment = json!({
            "methods": [{"type": "shipping", "selected_destination_id": destination_id}]
        });
        let checkout = self
            .put_fulfillment(&checkout_id, &checkout, &line_items, buyer.clone(), fulfillment)
            .await?;
        debug!(%destination_id, status = checkout.status(), "destination selected");

        let Some(option_id) = checkout.first_option_id().map(str::to_owned) else {
            debug!("merchant returned no shipping options");
            return Ok(checkout);
        };
        let destination_id = checkout.first_destination_id().unwrap_or(destination_id.as_str()).to_owned();
        let fulfillment = json!({
            "methods": [{
                "type": "shipping",
                "selected_destination_id": destination_id,
                "groups": [{"selected_option_id": option_id}]
            }]
        });
        let checkout =
            self.put_fulfillment(&checkout_id, &checkout, &line_items, buyer, fulfillment).await?;

        info!(%option_id, status = checkout.status(), "customer details recorded");
        Ok(checkout)
    }

    /// Checks whether the checkout has the details payment needs.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] without an active checkout, or
    /// any merchant error.
    #[instrument(skip(self))]
    pub async fn start_payment(&self) -> Result<PaymentReadiness> {
        let checkout_id = self.require_checkout().await?;
        let checkout = self.client.get_checkout(&checkout_id).await?;

        let mut missing = Vec::new();
        if !checkout.has_buyer() {
            missing.push(MISSING_BUYER);
        }
        if !checkout.has_fulfillment() {
            missing.push(MISSING_SHIPPING);
        }

        if missing.is_empty() {
            Ok(PaymentReadiness::Ready(checkout))
        } else {
            debug!(?missing, "checkout not ready for payment");
            Ok(PaymentReadiness::Missing { missing, checkout })
        }
    }

    /// Pays for and completes the active checkout, then clears the session.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::CheckoutNotReady`] unless the merchant reports
    /// `ready_for_complete`, [`ToolkitError::NoActiveCheckout`] without an
    /// active checkout, or any merchant error.
    #[instrument(skip(self, token))]
    pub async fn complete_checkout(&self, handler_id: &str, token: &str) -> Result<Checkout> {
        let checkout_id = self.require_checkout().await?;
        let checkout = self.client.get_checkout(&checkout_id).await?;

        if checkout.status() != READY_FOR_COMPLETE {
            return Err(ToolkitError::CheckoutNotReady { status: checkout.status().to_owned() });
        }

        let mut risk_signals = Map::new();
        risk_signals.insert("device_id".to_owned(), Value::String(self.device_id.clone()));
        let request = CompleteCheckoutRequest {
            payment_data: PaymentInstrument {
                id: short_id("inst"),
                handler_id: handler_id.to_owned(),
                handler_name: handler_id.to_owned(),
                kind: "card".to_owned(),
                brand: "Visa".to_owned(),
                last_digits: "4242".to_owned(),
                credential: Credential { kind: "token".to_owned(), token: token.to_owned() },
            },
            risk_signals,
        };

        let completed = self.client.complete_checkout(&checkout_id, &request).await?;
        self.clear_session().await;
        Ok(completed)
    }

    /// Cancels the active checkout and clears the session.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NoActiveCheckout`] without an active checkout, or
    /// any merchant error.
    #[instrument(skip(self))]
    pub async fn cancel_checkout(&self) -> Result<Checkout> {
        let checkout_id = self.require_checkout().await?;
        let cancelled = self.client.cancel_checkout(&checkout_id).await?;
        self.clear_session().await;
        Ok(cancelled)
    }

    /// Fetches an order. Does not need an active checkout.
    ///
    /// # Errors
    ///
    /// Returns any merchant error.
    pub async fn get_order(&self, order_id: &str) -> Result<Value> {
        self.client.get_order(order_id).await
    }

    fn product(&self, product_id: &str) -> Result<&Product> {
        self.catalog.get(product_id).ok_or_else(|| ToolkitError::ProductNotFound(product_id.to_owned()))
    }

    async fn require_checkout(&self) -> Result<String> {
        self.current_checkout_id().await.ok_or(ToolkitError::NoActiveCheckout)
    }

    async fn create_checkout(&self, product: &Product, quantity: u64) -> Result<Checkout> {
        let request = CheckoutCreateRequest {
            currency: self.currency.clone(),
            line_items: vec![LineItemRequest::new(&product.id, quantity)],
            payment: Payment::default(),
        };
        let checkout = self.client.create_checkout(&request).await?;

        if checkout.id().is_empty() {
            return Err(ToolkitError::InvalidResponse("created checkout has no id".to_owned()));
        }
        *self.checkout_id.write().await = Some(checkout.id().to_owned());
        Ok(checkout)
    }

    async fn replace_items(
        &self,
        checkout_id: &str,
        existing: &Checkout,
        line_items: Vec<LineItemRequest>,
    ) -> Result<Checkout> {
        let request = CheckoutUpdateRequest {
            id: checkout_id.to_owned(),
            currency: self.checkout_currency(existing),
            line_items,
            payment: Payment::default(),
            buyer: None,
            fulfillment: None,
        };
        self.client.update_checkout(checkout_id, &request).await
    }

    async fn put_fulfillment(
        &self,
        checkout_id: &str,
        current: &Checkout,
        line_items: &[LineItemRequest],
        buyer: Option<Buyer>,
        fulfillment: Value,
    ) -> Result<Checkout> {
        let request = CheckoutUpdateRequest {
            id: checkout_id.to_owned(),
            currency: self.checkout_currency(current),
            line_items: line_items.to_vec(),
            payment: Payment::default(),
            buyer,
            fulfillment: Some(fulfillment),
        };
        self.client.update_checkout(checkout_id, &request).await
    }

    fn checkout_currency(&self, checkout: &Checkout) -> String {
        checkout.currency().unwrap_or(&self.currency).to_owned()
    }
}

/// Generates `{prefix}_` followed by eight hex characters.
fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..8])
}
