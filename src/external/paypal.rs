use crate::config::PayPalConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayPalLink {
    pub href: String,
    pub rel: String,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<PayPalLink>,
}

impl PayPalOrder {
    /// Link the payer must follow to approve the order.
    pub fn approve_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }
}

/// Cents to PayPal's decimal string (`2500` -> `"25.00"`).
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[derive(Clone)]
pub struct PayPalService {
    client: Client,
    config: PayPalConfig,
}

impl PayPalService {
    pub fn new(config: PayPalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn access_token(&self) -> AppResult<String> {
        let url = format!("{}/v1/oauth2/token", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if response.status().is_success() {
            let token: AccessTokenResponse = response.json().await?;
            Ok(token.access_token)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("PayPal authentication failed: {error_text}");
            Err(AppError::PaymentProviderError(format!(
                "PayPal authentication failed: {error_text}"
            )))
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        reference_id: &str,
        custom_id: &str,
        description: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> AppResult<PayPalOrder> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/checkout/orders", self.config.base_url);

        // PayPal caps description at 127 chars
        let description: String = description.chars().take(127).collect();
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference_id,
                "custom_id": custom_id,
                "description": description,
                "amount": {
                    "currency_code": currency.to_ascii_uppercase(),
                    "value": format_amount(amount),
                }
            }],
            "application_context": {
                "return_url": return_url,
                "cancel_url": cancel_url,
                "user_action": "PAY_NOW",
                "shipping_preference": "NO_SHIPPING",
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("PayPal-Request-Id", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            let order: PayPalOrder = response.json().await?;
            log::info!("PayPal order created: {} ({})", order.id, order.status);
            Ok(order)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::PaymentProviderError(format!(
                "PayPal order creation failed: {error_text}"
            )))
        }
    }

    pub async fn capture_order(&self, order_id: &str) -> AppResult<PayPalOrder> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.base_url, order_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;

        if response.status().is_success() {
            let order: PayPalOrder = response.json().await?;
            log::info!("PayPal order captured: {} ({})", order.id, order.status);
            Ok(order)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::PaymentProviderError(format!(
                "PayPal capture failed: {error_text}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2500), "25.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123_456), "1234.56");
    }

    #[test]
    fn test_approve_url() {
        let order: PayPalOrder = serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"href": "https://api.paypal.com/v2/checkout/orders/5O1", "rel": "self", "method": "GET"},
                {"href": "https://www.paypal.com/checkoutnow?token=5O1", "rel": "approve", "method": "GET"}
            ]
        }))
        .unwrap();
        assert_eq!(
            order.approve_url(),
            Some("https://www.paypal.com/checkoutnow?token=5O1")
        );
        assert!(!order.is_completed());
    }
}
