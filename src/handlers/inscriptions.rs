use crate::middlewares::require_user;
use crate::models::*;
use crate::services::RegistrationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/inscriptions/me",
    tag = "inscriptions",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Inscriptions de l'adhérent connecté", body = [MonInscriptionResponse]),
        (status = 401, description = "Non authentifié", body = ErrorResponse)
    )
)]
pub async fn my_registrations(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service.my_registrations(&user).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/inscriptions/{id}",
    tag = "inscriptions",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'inscription")
    ),
    responses(
        (status = 200, description = "Inscription annulée"),
        (status = 403, description = "Inscription d'un autre adhérent", body = ErrorResponse),
        (status = 404, description = "Inscription introuvable", body = ErrorResponse)
    )
)]
pub async fn cancel_registration(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service.cancel(path.into_inner(), &user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Inscription annulée"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn inscriptions_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inscriptions")
            .route("/me", web::get().to(my_registrations))
            .route("/{id}", web::delete().to(cancel_registration)),
    );
}
