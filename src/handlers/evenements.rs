use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{EventService, RegistrationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/evenements",
    tag = "evenements",
    responses(
        (status = 200, description = "Événements publiés et affichables", body = [EvenementResponse])
    )
)]
pub async fn list_evenements(
    event_service: web::Data<EventService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let viewer = current_user(&req);
    match event_service.list_public(viewer.as_ref()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/evenements/{id}",
    tag = "evenements",
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    responses(
        (status = 200, description = "Détail de l'événement", body = EvenementResponse),
        (status = 404, description = "Événement introuvable", body = ErrorResponse)
    )
)]
pub async fn get_evenement(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let viewer = current_user(&req);
    match event_service.get(path.into_inner(), viewer.as_ref()).await {
        Ok(evenement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": evenement
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Members register with their token, visitors with contact data.
#[utoipa::path(
    post,
    path = "/evenements/{id}/inscriptions",
    tag = "evenements",
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Inscription enregistrée", body = RegistrationResult),
        (status = 400, description = "Inscription impossible", body = ErrorResponse),
        (status = 404, description = "Événement introuvable", body = ErrorResponse),
        (status = 409, description = "Déjà inscrit", body = ErrorResponse)
    )
)]
pub async fn register(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
    request: web::Json<RegisterRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let viewer = current_user(&req);
    match registration_service
        .register(path.into_inner(), viewer.as_ref(), request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result,
            "message": "Inscription enregistrée"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn evenements_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/evenements")
            .route("", web::get().to(list_evenements))
            .route("/{id}", web::get().to(get_evenement))
            .route("/{id}/inscriptions", web::post().to(register)),
    );
}
