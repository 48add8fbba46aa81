use super::StatutReglement;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "dettes_initiales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub adherent_id: i64,
    pub annee: i32,
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
