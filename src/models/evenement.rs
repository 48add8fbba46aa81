use crate::entities::{EvenementCategorie, EvenementStatut, evenement_entity};
use crate::error::{AppError, AppResult};
use crate::utils::require_non_empty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn default_categorie() -> EvenementCategorie {
    EvenementCategorie::General
}

fn default_statut() -> EvenementStatut {
    EvenementStatut::Brouillon
}

fn default_true() -> bool {
    true
}

/// Body of both create and full update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvenementPayload {
    #[schema(example = "Assemblée générale")]
    pub titre: String,
    #[serde(default)]
    pub description: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub date_affichage: Option<DateTime<Utc>>,
    pub date_fin_affichage: Option<DateTime<Utc>>,
    pub lieu: Option<String>,
    #[serde(default = "default_categorie")]
    pub categorie: EvenementCategorie,
    #[serde(default = "default_statut")]
    pub statut: EvenementStatut,
    #[serde(default = "default_true")]
    pub public: bool,
    /// Absent means unlimited.
    pub places_disponibles: Option<i32>,
    #[serde(default)]
    pub inscription_requise: bool,
    pub date_limite_inscription: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl EvenementPayload {
    /// Reports the first rule that fails.
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty(&self.titre, "Le titre est obligatoire")?;
        if self.titre.chars().count() > 255 {
            return Err(AppError::validation(
                "Le titre ne doit pas dépasser 255 caractères",
            ));
        }
        if self.date_fin < self.date_debut {
            return Err(AppError::validation(
                "La date de fin doit être postérieure à la date de début",
            ));
        }
        if let (Some(start), Some(end)) = (self.date_affichage, self.date_fin_affichage)
            && end < start
        {
            return Err(AppError::validation(
                "La fin d'affichage doit être postérieure au début d'affichage",
            ));
        }
        if let Some(places) = self.places_disponibles
            && places < 1
        {
            return Err(AppError::validation(
                "Le nombre de places doit être au moins 1",
            ));
        }
        if let Some(deadline) = self.date_limite_inscription
            && deadline > self.date_fin
        {
            return Err(AppError::validation(
                "La date limite d'inscription doit précéder la fin de l'événement",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateEvenementStatutRequest {
    pub statut: EvenementStatut,
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct EvenementQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub statut: Option<EvenementStatut>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvenementResponse {
    pub id: i64,
    pub titre: String,
    pub description: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub date_affichage: Option<DateTime<Utc>>,
    pub date_fin_affichage: Option<DateTime<Utc>>,
    pub lieu: Option<String>,
    pub categorie: EvenementCategorie,
    pub statut: EvenementStatut,
    pub public: bool,
    pub places_disponibles: Option<i32>,
    pub places_reservees: i32,
    pub places_restantes: Option<i32>,
    pub complet: bool,
    pub inscription_requise: bool,
    pub date_limite_inscription: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<evenement_entity::Model> for EvenementResponse {
    fn from(m: evenement_entity::Model) -> Self {
        let places_restantes = m.places_restantes();
        Self {
            id: m.id,
            titre: m.titre,
            description: m.description,
            date_debut: m.date_debut,
            date_fin: m.date_fin,
            date_affichage: m.date_affichage,
            date_fin_affichage: m.date_fin_affichage,
            lieu: m.lieu,
            categorie: m.categorie,
            statut: m.statut,
            public: m.public,
            places_disponibles: m.places_disponibles,
            places_reservees: m.places_reservees,
            places_restantes,
            complet: places_restantes == Some(0),
            inscription_requise: m.inscription_requise,
            date_limite_inscription: m.date_limite_inscription,
            image_url: m.image_url,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn payload() -> EvenementPayload {
        let start = Utc.with_ymd_and_hms(2025, 9, 20, 14, 0, 0).unwrap();
        EvenementPayload {
            titre: "Pique-nique".to_string(),
            description: String::new(),
            date_debut: start,
            date_fin: start + Duration::hours(4),
            date_affichage: None,
            date_fin_affichage: None,
            lieu: None,
            categorie: EvenementCategorie::Social,
            statut: EvenementStatut::Publie,
            public: true,
            places_disponibles: Some(30),
            inscription_requise: true,
            date_limite_inscription: Some(start - Duration::days(2)),
            image_url: None,
        }
    }

    #[test]
    fn test_valid_payload() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_first_failing_rule_is_reported() {
        let mut p = payload();
        p.titre = "  ".to_string();
        p.places_disponibles = Some(0);
        match p.validate() {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "Le titre est obligatoire"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut p = payload();
        p.date_fin = p.date_debut - Duration::minutes(1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut p = payload();
        p.places_disponibles = Some(0);
        assert!(p.validate().is_err());
        p.places_disponibles = None;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_defaults_from_json() {
        let p: EvenementPayload = serde_json::from_value(serde_json::json!({
            "titre": "AG",
            "date_debut": "2025-10-01T18:00:00Z",
            "date_fin": "2025-10-01T20:00:00Z"
        }))
        .unwrap();
        assert_eq!(p.categorie, EvenementCategorie::General);
        assert_eq!(p.statut, EvenementStatut::Brouillon);
        assert!(p.public);
        assert!(!p.inscription_requise);
    }
}
