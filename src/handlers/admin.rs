use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::{EventService, PaymentService, RegistrationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/evenements",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(EvenementQuery),
    responses(
        (status = 200, description = "Tous les événements, paginés"),
        (status = 403, description = "Réservé aux administrateurs", body = ErrorResponse)
    )
)]
pub async fn list_evenements(
    event_service: web::Data<EventService>,
    query: web::Query<EvenementQuery>,
) -> Result<HttpResponse> {
    match event_service.list_all(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/evenements",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    request_body = EvenementPayload,
    responses(
        (status = 200, description = "Événement créé", body = EvenementResponse),
        (status = 400, description = "Paramètres invalides", body = ErrorResponse)
    )
)]
pub async fn create_evenement(
    event_service: web::Data<EventService>,
    payload: web::Json<EvenementPayload>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let admin = match require_admin(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service
        .create(payload.into_inner(), admin.user_id)
        .await
    {
        Ok(evenement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": evenement,
            "message": "Événement créé"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/evenements/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    request_body = EvenementPayload,
    responses(
        (status = 200, description = "Événement mis à jour", body = EvenementResponse),
        (status = 400, description = "Capacité inférieure aux places réservées", body = ErrorResponse),
        (status = 404, description = "Événement introuvable", body = ErrorResponse)
    )
)]
pub async fn update_evenement(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
    payload: web::Json<EvenementPayload>,
) -> Result<HttpResponse> {
    match event_service
        .update(path.into_inner(), payload.into_inner())
        .await
    {
        Ok(evenement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": evenement
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/evenements/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    responses(
        (status = 200, description = "Événement supprimé"),
        (status = 404, description = "Événement introuvable", body = ErrorResponse)
    )
)]
pub async fn delete_evenement(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match event_service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Événement supprimé"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/evenements/{id}/statut",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    request_body = UpdateEvenementStatutRequest,
    responses(
        (status = 200, description = "Statut modifié", body = EvenementResponse),
        (status = 404, description = "Événement introuvable", body = ErrorResponse)
    )
)]
pub async fn set_evenement_statut(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
    request: web::Json<UpdateEvenementStatutRequest>,
) -> Result<HttpResponse> {
    match event_service
        .set_status(path.into_inner(), request.statut)
        .await
    {
        Ok(evenement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": evenement
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/evenements/{id}/inscriptions",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    responses(
        (status = 200, description = "Participants de l'événement", body = [InscriptionResponse]),
        (status = 404, description = "Événement introuvable", body = ErrorResponse)
    )
)]
pub async fn list_participants(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match registration_service
        .list_participants(path.into_inner())
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/evenements/{id}/inscriptions",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'événement")
    ),
    request_body = AddParticipantRequest,
    responses(
        (status = 200, description = "Participant ajouté", body = RegistrationResult),
        (status = 400, description = "Plus assez de places", body = ErrorResponse),
        (status = 409, description = "Adhérent déjà inscrit", body = ErrorResponse)
    )
)]
pub async fn add_participant(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
    request: web::Json<AddParticipantRequest>,
) -> Result<HttpResponse> {
    match registration_service
        .add_participant(path.into_inner(), request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result,
            "message": "Participant ajouté"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/inscriptions/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'inscription")
    ),
    responses(
        (status = 200, description = "Participant retiré"),
        (status = 404, description = "Inscription introuvable", body = ErrorResponse)
    )
)]
pub async fn remove_participant(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match registration_service
        .remove_participant(path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Participant retiré"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/inscriptions/{id}/statut",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant de l'inscription")
    ),
    request_body = UpdateInscriptionStatutRequest,
    responses(
        (status = 200, description = "Statut modifié", body = InscriptionResponse),
        (status = 404, description = "Inscription introuvable", body = ErrorResponse)
    )
)]
pub async fn set_inscription_statut(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
    request: web::Json<UpdateInscriptionStatutRequest>,
) -> Result<HttpResponse> {
    match registration_service
        .set_registration_status(path.into_inner(), request.statut)
        .await
    {
        Ok(inscription) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": inscription
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(PaiementQuery),
    responses(
        (status = 200, description = "Paiements, paginés")
    )
)]
pub async fn list_payments(
    payment_service: web::Data<PaymentService>,
    query: web::Query<PaiementQuery>,
) -> Result<HttpResponse> {
    match payment_service.list_payments(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/payments/{id}/validate",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant du paiement")
    ),
    responses(
        (status = 200, description = "Virement reçu", body = PaiementResponse),
        (status = 400, description = "Le paiement n'est pas un virement", body = ErrorResponse),
        (status = 409, description = "Paiement déjà finalisé", body = ErrorResponse)
    )
)]
pub async fn validate_transfer(
    payment_service: web::Data<PaymentService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service.settle_transfer(path.into_inner(), true).await {
        Ok(paiement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": paiement,
            "message": "Virement validé"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/payments/{id}/reject",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Identifiant du paiement")
    ),
    responses(
        (status = 200, description = "Virement refusé", body = PaiementResponse),
        (status = 409, description = "Paiement déjà finalisé", body = ErrorResponse)
    )
)]
pub async fn reject_transfer(
    payment_service: web::Data<PaymentService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service.settle_transfer(path.into_inner(), false).await {
        Ok(paiement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": paiement,
            "message": "Virement refusé"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/evenements", web::get().to(list_evenements))
            .route("/evenements", web::post().to(create_evenement))
            .route("/evenements/{id}", web::put().to(update_evenement))
            .route("/evenements/{id}", web::delete().to(delete_evenement))
            .route("/evenements/{id}/statut", web::patch().to(set_evenement_statut))
            .route("/evenements/{id}/inscriptions", web::get().to(list_participants))
            .route("/evenements/{id}/inscriptions", web::post().to(add_participant))
            .route("/inscriptions/{id}", web::delete().to(remove_participant))
            .route("/inscriptions/{id}/statut", web::patch().to(set_inscription_statut))
            .route("/payments", web::get().to(list_payments))
            .route("/payments/{id}/validate", web::post().to(validate_transfer))
            .route("/payments/{id}/reject", web::post().to(reject_transfer)),
    );
}
