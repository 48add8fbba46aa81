use crate::entities::{
    MethodePaiement, StatutPaiement, StatutReglement, TypePaiement, paiement_entity,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentSessionRequest {
    /// Cents.
    #[schema(example = 2500)]
    pub montant: i64,
    pub adherent_id: i64,
    pub type_paiement: TypePaiement,
    pub item_id: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CreatePaymentSessionRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.montant <= 0 {
            return Err(AppError::validation("Le montant doit être positif"));
        }
        if self.type_paiement.references_item() && self.item_id.is_none() {
            return Err(AppError::validation(
                "L'élément à régler doit être précisé pour ce type de paiement",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentSessionResponse {
    pub paiement_id: i64,
    /// Provider session / order id, or the transfer reference.
    pub session_id: String,
    /// Where to send the payer next.
    pub url: String,
    pub methode: MethodePaiement,
    pub statut: StatutPaiement,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaiementResponse {
    pub id: i64,
    pub adherent_id: i64,
    pub montant: i64,
    pub methode: MethodePaiement,
    pub statut: StatutPaiement,
    pub type_paiement: TypePaiement,
    pub reference: Option<String>,
    pub cotisation_mensuelle_id: Option<i64>,
    pub assistance_id: Option<i64>,
    pub dette_initiale_id: Option<i64>,
    pub obligation_id: Option<i64>,
    pub description: Option<String>,
    pub date_paiement: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<paiement_entity::Model> for PaiementResponse {
    fn from(m: paiement_entity::Model) -> Self {
        let reference = match m.methode {
            MethodePaiement::Stripe => m.stripe_session_id,
            MethodePaiement::PayPal => m.paypal_order_id,
            MethodePaiement::Virement => m.reference_virement,
        };
        Self {
            id: m.id,
            adherent_id: m.adherent_id,
            montant: m.montant,
            methode: m.methode,
            statut: m.statut,
            type_paiement: m.type_paiement,
            reference,
            cotisation_mensuelle_id: m.cotisation_mensuelle_id,
            assistance_id: m.assistance_id,
            dette_initiale_id: m.dette_initiale_id,
            obligation_id: m.obligation_id,
            description: m.description,
            date_paiement: m.date_paiement,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct PaiementQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub statut: Option<StatutPaiement>,
    pub adherent_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CapturePayPalRequest {
    pub order_id: String,
}

/// A dues item that still has something left to pay.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OutstandingItem {
    pub type_paiement: TypePaiement,
    pub item_id: i64,
    pub description: String,
    pub montant: i64,
    pub montant_restant: i64,
    pub statut: StatutReglement,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(type_paiement: TypePaiement, item_id: Option<i64>) -> CreatePaymentSessionRequest {
        CreatePaymentSessionRequest {
            montant: 1500,
            adherent_id: 3,
            type_paiement,
            item_id,
            description: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_item_types_need_an_item_id() {
        assert!(request(TypePaiement::CotisationMensuelle, None).validate().is_err());
        assert!(request(TypePaiement::Obligation, Some(9)).validate().is_ok());
        assert!(request(TypePaiement::General, None).validate().is_ok());
        assert!(request(TypePaiement::Adhesion, None).validate().is_ok());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut req = request(TypePaiement::General, None);
        req.montant = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_type_tag_wire_format() {
        let req: CreatePaymentSessionRequest = serde_json::from_value(serde_json::json!({
            "montant": 1000,
            "adherent_id": 1,
            "type_paiement": "dette_initiale",
            "item_id": 4
        }))
        .unwrap();
        assert_eq!(req.type_paiement, TypePaiement::DetteInitiale);
        assert!(req.metadata.is_empty());
    }
}
