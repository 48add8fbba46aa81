use crate::entities::StatutPaiement;
use crate::error::{AppError, AppResult};
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use log::{error, info, warn};
use stripe::{Event, EventObject, EventType};

/// Stripe webhook: Checkout sessions completing or expiring finalize the
/// matching payment.
pub async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    payment_service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let Some(stripe_service) = payment_service.gateway().stripe() else {
        warn!("Stripe webhook received but Stripe is not the configured payment method");
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Stripe is not enabled"
        })));
    };

    let signature = match req.headers().get("stripe-signature") {
        Some(sig) => sig.to_str().unwrap_or(""),
        None => {
            warn!("Missing Stripe-Signature header");
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Missing Stripe-Signature header"
            })));
        }
    };

    let payload = std::str::from_utf8(&body).map_err(|_| {
        error!("Invalid UTF-8 in webhook payload");
        actix_web::error::ErrorBadRequest("Invalid payload encoding")
    })?;

    let event = match stripe_service.verify_webhook_signature(payload, signature) {
        Ok(event) => event,
        Err(e) => {
            error!("Webhook signature verification failed: {e}");
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid signature"
            })));
        }
    };

    info!(
        "Received Stripe webhook event: {} ({})",
        event.type_, event.id
    );

    match handle_stripe_event(event, &payment_service).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "received": true
        }))),
        Err(e) => {
            // 200 so Stripe does not retry, the failure stays in the logs
            error!("Failed to process webhook event: {e}");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "received": true,
                "error": format!("Processing failed: {}", e)
            })))
        }
    }
}

fn session_outcome(event_type: &EventType) -> Option<StatutPaiement> {
    match event_type {
        EventType::CheckoutSessionCompleted => Some(StatutPaiement::Valide),
        EventType::CheckoutSessionExpired => Some(StatutPaiement::Annule),
        _ => None,
    }
}

async fn handle_stripe_event(event: Event, payment_service: &PaymentService) -> AppResult<()> {
    let Some(statut) = session_outcome(&event.type_) else {
        info!("Unhandled event type: {:?}", event.type_);
        return Ok(());
    };

    let EventObject::CheckoutSession(session) = event.data.object else {
        return Err(AppError::ValidationError(
            "Checkout event without a session object".to_string(),
        ));
    };

    let session_id = session.id.to_string();
    match payment_service
        .reconcile_stripe_session(&session_id, statut)
        .await?
    {
        Some(paiement) => info!(
            "Stripe session {} reconciled, payment {} is now {:?}",
            session_id, paiement.id, paiement.statut
        ),
        None => warn!("Stripe session {session_id} ignored"),
    }
    Ok(())
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/stripe", web::post().to(stripe_webhook)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_outcome() {
        assert_eq!(
            session_outcome(&EventType::CheckoutSessionCompleted),
            Some(StatutPaiement::Valide)
        );
        assert_eq!(
            session_outcome(&EventType::CheckoutSessionExpired),
            Some(StatutPaiement::Annule)
        );
        assert_eq!(session_outcome(&EventType::PaymentIntentSucceeded), None);
    }
}
