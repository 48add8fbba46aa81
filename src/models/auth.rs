use crate::entities::{UserRole, adherent_entity, user_entity};
use crate::error::AppResult;
use crate::utils::{require_non_empty, validate_email};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "tresorier@association.fr")]
    pub email: String,
    #[schema(example = "motdepasse")]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        require_non_empty(&self.password, "Le mot de passe est obligatoire")
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Linked member record, if any.
    pub adherent_id: Option<i64>,
}

impl UserResponse {
    pub fn new(user: user_entity::Model, adherent: Option<&adherent_entity::Model>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            adherent_id: adherent.map(|a| a.id),
        }
    }
}
