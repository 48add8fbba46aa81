use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    EvenementCategorie, EvenementStatut, InscriptionStatut, MethodePaiement, StatutPaiement,
    StatutReglement, TypePaiement, UserRole,
};
use crate::handlers;
use crate::models::*;
use crate::utils::pagination::PaginationInfo;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::evenements::list_evenements,
        handlers::evenements::get_evenement,
        handlers::evenements::register,
        handlers::inscriptions::my_registrations,
        handlers::inscriptions::cancel_registration,
        handlers::paiements::create_session,
        handlers::paiements::my_payments,
        handlers::paiements::outstanding_items,
        handlers::paiements::capture_paypal,
        handlers::admin::list_evenements,
        handlers::admin::create_evenement,
        handlers::admin::update_evenement,
        handlers::admin::delete_evenement,
        handlers::admin::set_evenement_statut,
        handlers::admin::list_participants,
        handlers::admin::add_participant,
        handlers::admin::remove_participant,
        handlers::admin::set_inscription_statut,
        handlers::admin::list_payments,
        handlers::admin::validate_transfer,
        handlers::admin::reject_transfer,
    ),
    components(
        schemas(
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            UserResponse,
            UserRole,
            EvenementPayload,
            EvenementResponse,
            UpdateEvenementStatutRequest,
            EvenementCategorie,
            EvenementStatut,
            VisiteurInfo,
            RegisterRequest,
            AddParticipantRequest,
            UpdateInscriptionStatutRequest,
            InscriptionResponse,
            MonInscriptionResponse,
            RegistrationResult,
            InscriptionStatut,
            CreatePaymentSessionRequest,
            PaymentSessionResponse,
            PaiementResponse,
            CapturePayPalRequest,
            OutstandingItem,
            MethodePaiement,
            StatutPaiement,
            StatutReglement,
            TypePaiement,
            PaginationInfo,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentification"),
        (name = "evenements", description = "Agenda public et inscriptions"),
        (name = "inscriptions", description = "Inscriptions de l'adhérent"),
        (name = "payments", description = "Paiement des cotisations"),
        (name = "admin", description = "Administration des événements et des paiements"),
    ),
    info(
        title = "Association Backend API",
        version = "1.0.0",
        description = "Événements, inscriptions et paiements de l'association"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
