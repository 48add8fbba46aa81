use crate::middlewares::require_user;
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/payments/session",
    tag = "payments",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePaymentSessionRequest,
    responses(
        (status = 200, description = "Session de paiement créée", body = PaymentSessionResponse),
        (status = 400, description = "Paramètres invalides", body = ErrorResponse),
        (status = 403, description = "Paiement pour un autre adhérent", body = ErrorResponse),
        (status = 502, description = "Erreur du prestataire de paiement", body = ErrorResponse)
    )
)]
pub async fn create_session(
    payment_service: web::Data<PaymentService>,
    request: web::Json<CreatePaymentSessionRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .create_payment_session(&user, request.into_inner())
        .await
    {
        Ok(session) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": session
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payments/me",
    tag = "payments",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paiements de l'adhérent connecté", body = [PaiementResponse])
    )
)]
pub async fn my_payments(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.my_payments(&user).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/payments/me/outstanding",
    tag = "payments",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Éléments restant à régler", body = [OutstandingItem])
    )
)]
pub async fn outstanding_items(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.outstanding_items(&user).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payments/paypal/capture",
    tag = "payments",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CapturePayPalRequest,
    responses(
        (status = 200, description = "Commande PayPal capturée", body = PaiementResponse),
        (status = 404, description = "Paiement introuvable", body = ErrorResponse)
    )
)]
pub async fn capture_paypal(
    payment_service: web::Data<PaymentService>,
    request: web::Json<CapturePayPalRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match require_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.capture_paypal(&user, &request.order_id).await {
        Ok(paiement) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": paiement
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn paiements_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/session", web::post().to(create_session))
            .route("/me", web::get().to(my_payments))
            .route("/me/outstanding", web::get().to(outstanding_items))
            .route("/paypal/capture", web::post().to(capture_paypal)),
    );
}
