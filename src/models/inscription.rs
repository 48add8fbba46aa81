use crate::entities::{InscriptionStatut, adherent_entity, inscription_entity};
use crate::models::EvenementResponse;
use crate::error::{AppError, AppResult};
use crate::utils::{require_non_empty, validate_email, validate_phone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_nombre_personnes() -> i32 {
    1
}

/// Contact data for a registrant without a member account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisiteurInfo {
    #[schema(example = "Marie Martin")]
    pub nom: String,
    #[schema(example = "marie.martin@example.fr")]
    pub email: String,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
}

impl VisiteurInfo {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty(&self.nom, "Le nom est obligatoire")?;
        validate_email(&self.email)?;
        if let Some(phone) = self.telephone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default = "default_nombre_personnes")]
    pub nombre_personnes: i32,
    /// Required when the caller is not signed in as a member.
    pub visiteur: Option<VisiteurInfo>,
    pub commentaire: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_headcount(self.nombre_personnes)?;
        if let Some(visiteur) = &self.visiteur {
            visiteur.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    pub adherent_id: i64,
    #[serde(default = "default_nombre_personnes")]
    pub nombre_personnes: i32,
    pub commentaire: Option<String>,
}

impl AddParticipantRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_headcount(self.nombre_personnes)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateInscriptionStatutRequest {
    pub statut: InscriptionStatut,
}

/// Upper bound on seats taken by one registration.
pub const MAX_NOMBRE_PERSONNES: i32 = 1000;

pub fn validate_headcount(nombre_personnes: i32) -> AppResult<()> {
    if nombre_personnes < 1 {
        return Err(AppError::validation(
            "Le nombre de personnes doit être au moins 1",
        ));
    }
    if nombre_personnes > MAX_NOMBRE_PERSONNES {
        return Err(AppError::validation(format!(
            "Le nombre de personnes ne peut pas dépasser {MAX_NOMBRE_PERSONNES}"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InscriptionResponse {
    pub id: i64,
    pub evenement_id: i64,
    pub adherent_id: Option<i64>,
    /// Member's full name or the visitor's name.
    pub nom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub nombre_personnes: i32,
    pub statut: InscriptionStatut,
    pub commentaire: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<inscription_entity::Model> for InscriptionResponse {
    fn from(m: inscription_entity::Model) -> Self {
        Self {
            id: m.id,
            evenement_id: m.evenement_id,
            adherent_id: m.adherent_id,
            nom: m.visiteur_nom,
            email: m.visiteur_email,
            telephone: m.visiteur_telephone,
            nombre_personnes: m.nombre_personnes,
            statut: m.statut,
            commentaire: m.commentaire,
            created_at: m.created_at,
        }
    }
}

impl InscriptionResponse {
    /// Fill contact fields from the member record.
    pub fn with_adherent(mut self, adherent: &adherent_entity::Model) -> Self {
        self.nom = Some(adherent.full_name());
        self.email = adherent.email.clone();
        self.telephone = adherent.telephone.clone();
        self
    }
}

/// A member's registration together with its event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonInscriptionResponse {
    pub inscription: InscriptionResponse,
    pub evenement: EvenementResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResult {
    pub inscription: InscriptionResponse,
    pub places_reservees: i32,
    pub places_restantes: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headcount_defaults_to_one() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.nombre_personnes, 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_headcount_must_be_positive() {
        assert!(validate_headcount(0).is_err());
        assert!(validate_headcount(-2).is_err());
        assert!(validate_headcount(1).is_ok());
    }

    #[test]
    fn test_headcount_is_bounded() {
        assert!(validate_headcount(MAX_NOMBRE_PERSONNES).is_ok());
        assert!(validate_headcount(MAX_NOMBRE_PERSONNES + 1).is_err());

        let req: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "nombre_personnes": i32::MAX })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_visitor_validation() {
        let mut visiteur = VisiteurInfo {
            nom: "Marie".to_string(),
            email: "marie@example.fr".to_string(),
            telephone: Some(String::new()),
            adresse: None,
        };
        assert!(visiteur.validate().is_ok());
        visiteur.telephone = Some("abc".to_string());
        assert!(visiteur.validate().is_err());
        visiteur.telephone = None;
        visiteur.email = "marie".to_string();
        assert!(visiteur.validate().is_err());
    }
}
