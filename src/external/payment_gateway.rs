use crate::config::{Config, PaymentConfig, PaymentProviderKind};
use crate::entities::{MethodePaiement, TypePaiement};
use crate::error::{AppError, AppResult};
use crate::external::{PayPalService, StripeService, VirementService};
use std::collections::HashMap;

/// What a provider needs to open a checkout for one payment.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount: i64,
    pub adherent_id: i64,
    pub type_paiement: TypePaiement,
    pub item_id: Option<i64>,
    pub description: String,
    pub metadata: HashMap<String, String>,
    pub payer_email: Option<String>,
}

/// Provider-side handle of a checkout: the id stored on the payment row and
/// the url the payer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Clone)]
pub enum PaymentGateway {
    Stripe(StripeService),
    PayPal(PayPalService),
    Virement(VirementService),
}

impl PaymentGateway {
    pub fn from_config(config: &Config) -> Self {
        match config.payment.provider {
            PaymentProviderKind::Stripe => {
                PaymentGateway::Stripe(StripeService::new(config.stripe.clone()))
            }
            PaymentProviderKind::Paypal => {
                PaymentGateway::PayPal(PayPalService::new(config.paypal.clone()))
            }
            PaymentProviderKind::Virement => {
                PaymentGateway::Virement(VirementService::new(config.virement.clone()))
            }
        }
    }

    pub fn methode(&self) -> MethodePaiement {
        match self {
            PaymentGateway::Stripe(_) => MethodePaiement::Stripe,
            PaymentGateway::PayPal(_) => MethodePaiement::PayPal,
            PaymentGateway::Virement(_) => MethodePaiement::Virement,
        }
    }

    pub async fn create_checkout_session(
        &self,
        payment: &PaymentConfig,
        request: &CheckoutRequest,
    ) -> AppResult<ProviderSession> {
        let metadata = provider_metadata(request);
        let reference = client_reference(request);

        match self {
            PaymentGateway::Stripe(stripe) => {
                let checkout = stripe
                    .create_checkout_session(
                        request.amount,
                        &payment.currency,
                        &request.description,
                        request.payer_email.as_deref(),
                        &reference,
                        metadata,
                        &payment.success_url,
                        &payment.cancel_url,
                    )
                    .await?;
                Ok(ProviderSession {
                    session_id: checkout.session_id,
                    url: checkout.url,
                })
            }
            PaymentGateway::PayPal(paypal) => {
                let custom_id = serde_json::to_string(&metadata)?;
                let order = paypal
                    .create_order(
                        request.amount,
                        &payment.currency,
                        &reference,
                        &custom_id,
                        &request.description,
                        &payment.success_url,
                        &payment.cancel_url,
                    )
                    .await?;
                let url = order.approve_url().map(str::to_string).ok_or_else(|| {
                    AppError::PaymentProviderError(
                        "PayPal order has no approve link".to_string(),
                    )
                })?;
                Ok(ProviderSession {
                    session_id: order.id,
                    url,
                })
            }
            PaymentGateway::Virement(virement) => {
                let transfer = virement.create_transfer();
                log::info!(
                    "Bank transfer reference issued: {} for adherent {}",
                    transfer.reference,
                    request.adherent_id
                );
                Ok(ProviderSession {
                    session_id: transfer.reference,
                    url: transfer.url,
                })
            }
        }
    }

    pub fn stripe(&self) -> Option<&StripeService> {
        match self {
            PaymentGateway::Stripe(s) => Some(s),
            _ => None,
        }
    }

    pub fn paypal(&self) -> Option<&PayPalService> {
        match self {
            PaymentGateway::PayPal(p) => Some(p),
            _ => None,
        }
    }
}

/// Caller metadata plus the keys reconciliation relies on. Ours win on clash.
pub fn provider_metadata(request: &CheckoutRequest) -> HashMap<String, String> {
    let mut metadata = request.metadata.clone();
    metadata.insert("adherent_id".to_string(), request.adherent_id.to_string());
    metadata.insert(
        "type_paiement".to_string(),
        request.type_paiement.to_string(),
    );
    if let Some(item_id) = request.item_id {
        metadata.insert("item_id".to_string(), item_id.to_string());
    } else {
        metadata.remove("item_id");
    }
    metadata
}

fn client_reference(request: &CheckoutRequest) -> String {
    match request.item_id {
        Some(item_id) => format!(
            "adherent-{}-{}-{}",
            request.adherent_id, request.type_paiement, item_id
        ),
        None => format!("adherent-{}-{}", request.adherent_id, request.type_paiement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VirementConfig;

    fn request(item_id: Option<i64>) -> CheckoutRequest {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "espace-membre".to_string());
        metadata.insert("adherent_id".to_string(), "999".to_string());
        metadata.insert("item_id".to_string(), "stale".to_string());
        CheckoutRequest {
            amount: 2500,
            adherent_id: 7,
            type_paiement: TypePaiement::CotisationMensuelle,
            item_id,
            description: "Cotisation mensuelle - 2025-03".to_string(),
            metadata,
            payer_email: Some("a@example.fr".to_string()),
        }
    }

    #[test]
    fn test_provider_metadata_merges_and_overrides() {
        let metadata = provider_metadata(&request(Some(12)));
        assert_eq!(metadata["source"], "espace-membre");
        assert_eq!(metadata["adherent_id"], "7");
        assert_eq!(metadata["type_paiement"], "cotisation_mensuelle");
        assert_eq!(metadata["item_id"], "12");
    }

    #[test]
    fn test_provider_metadata_without_item() {
        let metadata = provider_metadata(&request(None));
        assert!(!metadata.contains_key("item_id"));
    }

    #[test]
    fn test_client_reference() {
        assert_eq!(
            client_reference(&request(Some(12))),
            "adherent-7-cotisation_mensuelle-12"
        );
        assert_eq!(
            client_reference(&request(None)),
            "adherent-7-cotisation_mensuelle"
        );
    }

    #[actix_web::test]
    async fn test_virement_gateway_returns_reference() {
        let gateway = PaymentGateway::Virement(VirementService::new(VirementConfig {
            instructions_url: "https://asso.test/virement".to_string(),
            ..Default::default()
        }));
        let payment = PaymentConfig {
            provider: PaymentProviderKind::Virement,
            currency: "eur".to_string(),
            success_url: "https://asso.test/ok".to_string(),
            cancel_url: "https://asso.test/ko".to_string(),
        };
        let session = gateway
            .create_checkout_session(&payment, &request(Some(1)))
            .await
            .unwrap();
        assert_eq!(gateway.methode(), MethodePaiement::Virement);
        assert!(session.session_id.starts_with("VIR-"));
        assert!(session.url.ends_with(&session.session_id));
    }
}
