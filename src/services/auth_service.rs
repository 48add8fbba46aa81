use crate::database::DbPool;
use crate::entities::{adherent_entity, user_entity};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, UserResponse};
use crate::utils::{JwtService, normalize_email, verify_password};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

const INVALID_CREDENTIALS: &str = "Adresse e-mail ou mot de passe incorrect";

/// Member record linked to a user account, if any.
pub async fn linked_adherent<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<Option<adherent_entity::Model>> {
    Ok(adherent_entity::Entity::find()
        .filter(adherent_entity::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let user = user_entity::Entity::find()
            .filter(user_entity::Column::Email.eq(normalize_email(&request.email)))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.email, user.role)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(user.id, &user.email, user.role)?;

        let adherent = linked_adherent(self.pool.as_ref(), user.id).await?;
        log::info!("User {} logged in", user.id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::new(user, adherent.as_ref()),
        })
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Jeton invalide".to_string()))?;

        let user = self.get_user_by_id(user_id).await?;

        // role may have changed since the refresh token was issued
        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.email, user.role)?;
        let adherent = linked_adherent(self.pool.as_ref(), user.id).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::new(user, adherent.as_ref()),
        })
    }

    pub async fn me(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = self.get_user_by_id(user_id).await?;
        let adherent = linked_adherent(self.pool.as_ref(), user.id).await?;
        Ok(UserResponse::new(user, adherent.as_ref()))
    }

    async fn get_user_by_id(&self, user_id: i64) -> AppResult<user_entity::Model> {
        user_entity::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Utilisateur introuvable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::utils::hash_password;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 7200)
    }

    fn user(password: &str) -> user_entity::Model {
        user_entity::Model {
            id: 5,
            email: "tresorier@association.fr".to_string(),
            password_hash: hash_password(password).unwrap(),
            name: "Trésorier".to_string(),
            role: UserRole::Admin,
            created_at: None,
            updated_at: None,
        }
    }

    #[actix_web::test]
    async fn test_login_with_wrong_password_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user("bon-mot-de-passe")]])
            .into_connection();
        let service = AuthService::new(Arc::new(db), jwt());

        let result = service
            .login(LoginRequest {
                email: "Tresorier@association.fr".to_string(),
                password: "mauvais".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[actix_web::test]
    async fn test_login_issues_tokens_with_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user("bon-mot-de-passe")]])
            .append_query_results([Vec::<adherent_entity::Model>::new()])
            .into_connection();
        let jwt_service = jwt();
        let service = AuthService::new(Arc::new(db), jwt_service.clone());

        let response = service
            .login(LoginRequest {
                email: "tresorier@association.fr".to_string(),
                password: "bon-mot-de-passe".to_string(),
            })
            .await
            .unwrap();
        let claims = jwt_service.verify_access_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, "5");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(response.user.adherent_id, None);
    }
}
