use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "methode_paiement")]
pub enum MethodePaiement {
    #[sea_orm(string_value = "Stripe")]
    Stripe,
    #[sea_orm(string_value = "PayPal")]
    PayPal,
    #[sea_orm(string_value = "Virement")]
    Virement,
}

impl std::fmt::Display for MethodePaiement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodePaiement::Stripe => write!(f, "Stripe"),
            MethodePaiement::PayPal => write!(f, "PayPal"),
            MethodePaiement::Virement => write!(f, "Virement"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "statut_paiement")]
pub enum StatutPaiement {
    #[sea_orm(string_value = "EnAttente")]
    EnAttente,
    #[sea_orm(string_value = "EnCours")]
    EnCours,
    #[sea_orm(string_value = "Valide")]
    Valide,
    #[sea_orm(string_value = "Refuse")]
    Refuse,
    #[sea_orm(string_value = "Annule")]
    Annule,
}

impl StatutPaiement {
    /// Final states are never left again.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            StatutPaiement::Valide | StatutPaiement::Refuse | StatutPaiement::Annule
        )
    }
}

/// What a payment settles.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "type_paiement")]
#[serde(rename_all = "snake_case")]
pub enum TypePaiement {
    #[sea_orm(string_value = "cotisation_mensuelle")]
    CotisationMensuelle,
    #[sea_orm(string_value = "assistance")]
    Assistance,
    #[sea_orm(string_value = "dette_initiale")]
    DetteInitiale,
    #[sea_orm(string_value = "obligation")]
    Obligation,
    #[sea_orm(string_value = "adhesion")]
    Adhesion,
    #[sea_orm(string_value = "general")]
    General,
}

impl TypePaiement {
    /// Types that point at a row in one of the dues tables.
    pub fn references_item(&self) -> bool {
        !matches!(self, TypePaiement::Adhesion | TypePaiement::General)
    }
}

impl std::fmt::Display for TypePaiement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypePaiement::CotisationMensuelle => write!(f, "cotisation_mensuelle"),
            TypePaiement::Assistance => write!(f, "assistance"),
            TypePaiement::DetteInitiale => write!(f, "dette_initiale"),
            TypePaiement::Obligation => write!(f, "obligation"),
            TypePaiement::Adhesion => write!(f, "adhesion"),
            TypePaiement::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for TypePaiement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cotisation_mensuelle" => Ok(TypePaiement::CotisationMensuelle),
            "assistance" => Ok(TypePaiement::Assistance),
            "dette_initiale" => Ok(TypePaiement::DetteInitiale),
            "obligation" => Ok(TypePaiement::Obligation),
            "adhesion" => Ok(TypePaiement::Adhesion),
            "general" => Ok(TypePaiement::General),
            other => Err(format!("unknown payment type: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "paiements_cotisations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub adherent_id: i64,
    pub montant: i64,
    pub methode: MethodePaiement,
    pub statut: StatutPaiement,
    pub type_paiement: TypePaiement,
    pub stripe_session_id: Option<String>,
    pub paypal_order_id: Option<String>,
    pub reference_virement: Option<String>,
    pub cotisation_mensuelle_id: Option<i64>,
    pub assistance_id: Option<i64>,
    pub dette_initiale_id: Option<i64>,
    pub obligation_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub metadata: Option<Json>,
    pub date_paiement: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
