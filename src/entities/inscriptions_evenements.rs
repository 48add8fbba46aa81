use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "inscription_statut")]
pub enum InscriptionStatut {
    #[sea_orm(string_value = "EnAttente")]
    EnAttente,
    #[sea_orm(string_value = "Confirme")]
    Confirme,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inscriptions_evenements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub evenement_id: i64,
    pub adherent_id: Option<i64>,
    pub visiteur_nom: Option<String>,
    pub visiteur_email: Option<String>,
    pub visiteur_telephone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub visiteur_adresse: Option<String>,
    pub nombre_personnes: i32,
    pub statut: InscriptionStatut,
    #[sea_orm(column_type = "Text", nullable)]
    pub commentaire: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
