use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, Currency, Event, Webhook,
};

/// Result of a created Checkout session.
#[derive(Debug, Clone)]
pub struct StripeCheckout {
    pub session_id: String,
    pub url: String,
}

#[derive(Clone)]
pub struct StripeService {
    client: Client,
    config: StripeConfig,
}

impl StripeService {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            config,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_checkout_session(
        &self,
        amount: i64,
        currency: &str,
        description: &str,
        customer_email: Option<&str>,
        client_reference_id: &str,
        metadata: HashMap<String, String>,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<StripeCheckout> {
        let currency = parse_currency(currency)?;

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.customer_email = customer_email;
        params.client_reference_id = Some(client_reference_id);
        params.metadata = Some(metadata);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency,
                unit_amount: Some(amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: description.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = CheckoutSession::create(&self.client, params).await?;
        let url = session.url.clone().ok_or_else(|| {
            AppError::PaymentProviderError("Stripe returned a session without url".to_string())
        })?;

        log::info!("Stripe checkout session created: {}", session.id);
        Ok(StripeCheckout {
            session_id: session.id.to_string(),
            url,
        })
    }

    /// Verify the `Stripe-Signature` header and parse the event.
    pub fn verify_webhook_signature(&self, payload: &str, signature: &str) -> AppResult<Event> {
        if self.config.webhook_secret.is_empty() {
            return Err(AppError::ConfigError(
                "STRIPE_WEBHOOK_SECRET is not configured".to_string(),
            ));
        }
        Webhook::construct_event(payload, signature, &self.config.webhook_secret)
            .map_err(|e| AppError::AuthError(format!("Invalid webhook signature: {e}")))
    }
}

fn parse_currency(code: &str) -> AppResult<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_ascii_lowercase()))
        .map_err(|_| AppError::ConfigError(format!("Unsupported currency: {code}")))
}
