use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "evenement_categorie")]
pub enum EvenementCategorie {
    #[sea_orm(string_value = "General")]
    General,
    #[sea_orm(string_value = "Formation")]
    Formation,
    #[sea_orm(string_value = "Social")]
    Social,
    #[sea_orm(string_value = "Sportif")]
    Sportif,
    #[sea_orm(string_value = "Culturel")]
    Culturel,
}

impl std::fmt::Display for EvenementCategorie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvenementCategorie::General => write!(f, "General"),
            EvenementCategorie::Formation => write!(f, "Formation"),
            EvenementCategorie::Social => write!(f, "Social"),
            EvenementCategorie::Sportif => write!(f, "Sportif"),
            EvenementCategorie::Culturel => write!(f, "Culturel"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "evenement_statut")]
pub enum EvenementStatut {
    #[sea_orm(string_value = "Brouillon")]
    Brouillon,
    #[sea_orm(string_value = "Publie")]
    Publie,
    #[sea_orm(string_value = "Archive")]
    Archive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "evenements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub titre: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub date_affichage: Option<DateTime<Utc>>,
    pub date_fin_affichage: Option<DateTime<Utc>>,
    pub lieu: Option<String>,
    pub categorie: EvenementCategorie,
    pub statut: EvenementStatut,
    pub public: bool,
    /// `None` means unlimited.
    pub places_disponibles: Option<i32>,
    pub places_reservees: i32,
    pub inscription_requise: bool,
    pub date_limite_inscription: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether the event sits inside its display window at `now`.
    /// Missing bounds are open.
    pub fn is_displayable_at(&self, now: DateTime<Utc>) -> bool {
        self.date_affichage.is_none_or(|start| start <= now)
            && self.date_fin_affichage.is_none_or(|end| now <= end)
    }

    pub fn places_restantes(&self) -> Option<i32> {
        self.places_disponibles
            .map(|capacity| (capacity - self.places_reservees).max(0))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
