use actix_web::{HttpResponse, ResponseError};
use crate::models::ErrorResponse;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment provider error: {0}")]
    PaymentProviderError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Stripe error: {0}")]
    StripeError(#[from] stripe::StripeError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    /// Machine-readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden => "FORBIDDEN",
            AppError::PaymentProviderError(_) | AppError::StripeError(_) => "PAYMENT_PROVIDER_ERROR",
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::PaymentProviderError(_)
            | AppError::StripeError(_)
            | AppError::ExternalApiError(_)
            | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // client-facing messages are French; internals stay in the server log
        let message: String = match self {
            AppError::ValidationError(msg) | AppError::Conflict(msg) => {
                log::warn!("Rejected request: {msg}");
                msg.clone()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                "Session invalide ou expirée".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Accès refusé".to_string()
            }
            AppError::PaymentProviderError(msg) => {
                log::error!("Payment provider error: {msg}");
                "Le prestataire de paiement a refusé la demande".to_string()
            }
            AppError::StripeError(err) => {
                log::error!("Stripe error: {err}");
                "Le prestataire de paiement a refusé la demande".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Une erreur est survenue, veuillez réessayer".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Une erreur est survenue, veuillez réessayer".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse::new(message, self.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_validation_error_passes_message_through() {
        let resp = AppError::validation("Le titre est obligatoire").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Le titre est obligatoire");
        assert_eq!(value["code"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_database_error_is_generic() {
        let err = AppError::from(sea_orm::DbErr::Custom("relation missing".into()));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(!value["error"].as_str().unwrap().contains("relation"));
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Forbidden.code(), "FORBIDDEN");
    }
}
