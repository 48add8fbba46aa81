use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Settlement state shared by every payable item table.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "statut_reglement")]
pub enum StatutReglement {
    #[sea_orm(string_value = "EnAttente")]
    EnAttente,
    #[sea_orm(string_value = "PartiellementPaye")]
    PartiellementPaye,
    #[sea_orm(string_value = "Paye")]
    Paye,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cotisations_mensuelles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub adherent_id: i64,
    /// `YYYY-MM`
    pub periode: String,
    pub type_cotisation: String,
    pub montant: i64,
    pub montant_paye: i64,
    pub montant_restant: i64,
    pub statut: StatutReglement,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
