use crate::config::PaymentConfig;
use crate::database::DbPool;
use crate::entities::{
    MethodePaiement, StatutPaiement, TypePaiement, adherent_entity, paiement_entity as paiement,
};
use crate::error::{AppError, AppResult};
use crate::external::payment_gateway::provider_metadata;
use crate::external::{CheckoutRequest, PaymentGateway, RevalidationService};
use crate::middlewares::AuthUser;
use crate::models::{
    CreatePaymentSessionRequest, OutstandingItem, PaiementQuery, PaiementResponse,
    PaymentSessionResponse,
};
use crate::services::{DuesItem, linked_adherent};
use crate::utils::{PaginatedResponse, PaginationParams};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// Callers pay for their own adherent record; admins for anyone.
pub fn authorize_payer(
    caller: &AuthUser,
    caller_adherent_id: Option<i64>,
    payer_adherent_id: i64,
) -> AppResult<()> {
    if caller.is_admin() || caller_adherent_id == Some(payer_adherent_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Bank transfers wait on the treasurer; provider checkouts are in flight.
pub fn initial_status(methode: MethodePaiement) -> StatutPaiement {
    match methode {
        MethodePaiement::Virement => StatutPaiement::EnAttente,
        MethodePaiement::Stripe | MethodePaiement::PayPal => StatutPaiement::EnCours,
    }
}

pub fn default_description(type_paiement: TypePaiement, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => d.to_string(),
        None if type_paiement == TypePaiement::Adhesion => "Frais d'adhésion".to_string(),
        None => "Paiement de cotisation".to_string(),
    }
}

/// Sets the one foreign key matching the type tag, none for untargeted payments.
pub fn apply_item_fk(am: &mut paiement::ActiveModel, type_paiement: TypePaiement, item_id: Option<i64>) {
    match type_paiement {
        TypePaiement::CotisationMensuelle => am.cotisation_mensuelle_id = Set(item_id),
        TypePaiement::Assistance => am.assistance_id = Set(item_id),
        TypePaiement::DetteInitiale => am.dette_initiale_id = Set(item_id),
        TypePaiement::Obligation => am.obligation_id = Set(item_id),
        TypePaiement::Adhesion | TypePaiement::General => {}
    }
}

pub fn apply_provider_reference(am: &mut paiement::ActiveModel, methode: MethodePaiement, session_id: &str) {
    let reference = Set(Some(session_id.to_string()));
    match methode {
        MethodePaiement::Stripe => am.stripe_session_id = reference,
        MethodePaiement::PayPal => am.paypal_order_id = reference,
        MethodePaiement::Virement => am.reference_virement = reference,
    }
}

/// The dues item a payment points at, if any.
pub fn linked_item_id(p: &paiement::Model) -> Option<i64> {
    match p.type_paiement {
        TypePaiement::CotisationMensuelle => p.cotisation_mensuelle_id,
        TypePaiement::Assistance => p.assistance_id,
        TypePaiement::DetteInitiale => p.dette_initiale_id,
        TypePaiement::Obligation => p.obligation_id,
        TypePaiement::Adhesion | TypePaiement::General => None,
    }
}

pub fn payment_paths() -> [&'static str; 3] {
    ["/admin/paiements", "/profil", "/profil/paiements"]
}

fn payment_not_found() -> AppError {
    AppError::NotFound("Paiement introuvable".to_string())
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DbPool,
    gateway: PaymentGateway,
    payment_config: PaymentConfig,
    revalidator: RevalidationService,
}

impl PaymentService {
    pub fn new(
        pool: DbPool,
        gateway: PaymentGateway,
        payment_config: PaymentConfig,
        revalidator: RevalidationService,
    ) -> Self {
        Self {
            pool,
            gateway,
            payment_config,
            revalidator,
        }
    }

    pub fn gateway(&self) -> &PaymentGateway {
        &self.gateway
    }

    /// Opens a checkout with the configured provider and records the pending payment.
    pub async fn create_payment_session(
        &self,
        caller: &AuthUser,
        request: CreatePaymentSessionRequest,
    ) -> AppResult<PaymentSessionResponse> {
        request.validate()?;

        let caller_adherent = linked_adherent(self.pool.as_ref(), caller.user_id).await?;
        if let Err(e) = authorize_payer(caller, caller_adherent.map(|a| a.id), request.adherent_id) {
            log::warn!(
                "User {} tried to pay for adherent {}",
                caller.user_id,
                request.adherent_id
            );
            return Err(e);
        }

        let result = self.open_session(request).await;
        self.revalidator.spawn_revalidate(payment_paths());
        result
    }

    async fn open_session(
        &self,
        request: CreatePaymentSessionRequest,
    ) -> AppResult<PaymentSessionResponse> {
        let payer = adherent_entity::Entity::find_by_id(request.adherent_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Adhérent introuvable".to_string()))?;

        let description = self.resolve_description(&request).await?;
        let checkout = CheckoutRequest {
            amount: request.montant,
            adherent_id: payer.id,
            type_paiement: request.type_paiement,
            item_id: request.item_id,
            description: description.clone(),
            metadata: request.metadata,
            payer_email: payer.email.clone(),
        };

        let session = self
            .gateway
            .create_checkout_session(&self.payment_config, &checkout)
            .await?;

        let methode = self.gateway.methode();
        let statut = initial_status(methode);
        let now = Utc::now();
        let mut am = paiement::ActiveModel {
            adherent_id: Set(payer.id),
            montant: Set(request.montant),
            methode: Set(methode),
            statut: Set(statut),
            type_paiement: Set(request.type_paiement),
            description: Set(Some(description)),
            metadata: Set(Some(serde_json::to_value(provider_metadata(&checkout))?)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        apply_provider_reference(&mut am, methode, &session.session_id);
        apply_item_fk(&mut am, request.type_paiement, request.item_id);
        let paiement = am.insert(self.pool.as_ref()).await?;

        log::info!(
            "Payment {} opened: {} {} cents for adherent {} ({})",
            paiement.id,
            methode,
            paiement.montant,
            payer.id,
            session.session_id
        );

        Ok(PaymentSessionResponse {
            paiement_id: paiement.id,
            session_id: session.session_id,
            url: session.url,
            methode,
            statut,
        })
    }

    async fn resolve_description(&self, request: &CreatePaymentSessionRequest) -> AppResult<String> {
        let Some(item_id) = request.item_id.filter(|_| request.type_paiement.references_item())
        else {
            return Ok(default_description(
                request.type_paiement,
                request.description.as_deref(),
            ));
        };

        let item = DuesItem::load(self.pool.as_ref(), request.type_paiement, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Élément à régler introuvable".to_string()))?;
        if item.adherent_id() != request.adherent_id {
            return Err(AppError::validation(
                "Cet élément n'appartient pas à cet adhérent",
            ));
        }
        Ok(item.description())
    }

    /// Moves a pending payment to a final status. A payment already final is
    /// returned untouched with `false`.
    async fn finalize(
        &self,
        current: paiement::Model,
        statut: StatutPaiement,
    ) -> AppResult<(paiement::Model, bool)> {
        if current.statut.is_final() {
            log::info!(
                "Payment {} already {:?}, {:?} ignored",
                current.id,
                current.statut,
                statut
            );
            return Ok((current, false));
        }

        let txn = self.pool.begin().await?;
        let now = Utc::now();
        let mut changes = paiement::ActiveModel {
            statut: Set(statut),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        if statut == StatutPaiement::Valide {
            changes.date_paiement = Set(Some(now));
        }

        // guarded on the pending states so concurrent deliveries apply once
        let result = paiement::Entity::update_many()
            .set(changes)
            .filter(paiement::Column::Id.eq(current.id))
            .filter(
                Condition::any()
                    .add(paiement::Column::Statut.eq(StatutPaiement::EnAttente))
                    .add(paiement::Column::Statut.eq(StatutPaiement::EnCours)),
            )
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok((current, false));
        }

        let updated = paiement::Entity::find_by_id(current.id)
            .one(&txn)
            .await?
            .ok_or_else(payment_not_found)?;
        if statut == StatutPaiement::Valide {
            Self::apply_to_item(&txn, &updated).await?;
        }
        txn.commit().await?;

        log::info!("Payment {} is now {:?}", updated.id, updated.statut);
        self.revalidator.spawn_revalidate(payment_paths());
        Ok((updated, true))
    }

    async fn apply_to_item<C: ConnectionTrait>(db: &C, p: &paiement::Model) -> AppResult<()> {
        let Some(item_id) = linked_item_id(p) else {
            return Ok(());
        };
        match DuesItem::apply_payment(db, p.type_paiement, item_id, p.montant).await? {
            Some(s) => {
                log::info!(
                    "{} {} settled by payment {}: {} paid, {} left",
                    p.type_paiement,
                    item_id,
                    p.id,
                    s.montant_paye,
                    s.montant_restant
                );
            }
            None => log::warn!(
                "Payment {} points at missing {} {}",
                p.id,
                p.type_paiement,
                item_id
            ),
        }
        Ok(())
    }

    async fn find_by_stripe_session(&self, session_id: &str) -> AppResult<Option<paiement::Model>> {
        Ok(paiement::Entity::find()
            .filter(paiement::Column::StripeSessionId.eq(session_id))
            .one(self.pool.as_ref())
            .await?)
    }

    /// `checkout.session.completed` / `checkout.session.expired`.
    pub async fn reconcile_stripe_session(
        &self,
        session_id: &str,
        statut: StatutPaiement,
    ) -> AppResult<Option<PaiementResponse>> {
        let Some(current) = self.find_by_stripe_session(session_id).await? else {
            log::warn!("Stripe session {session_id} matches no payment");
            return Ok(None);
        };
        let (updated, _) = self.finalize(current, statut).await?;
        Ok(Some(updated.into()))
    }

    /// Capture after the payer approved the PayPal order.
    pub async fn capture_paypal(&self, caller: &AuthUser, order_id: &str) -> AppResult<PaiementResponse> {
        let current = paiement::Entity::find()
            .filter(paiement::Column::PaypalOrderId.eq(order_id))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(payment_not_found)?;

        let caller_adherent = linked_adherent(self.pool.as_ref(), caller.user_id).await?;
        authorize_payer(caller, caller_adherent.map(|a| a.id), current.adherent_id)?;

        if current.statut.is_final() {
            return Ok(current.into());
        }

        let paypal = self.gateway.paypal().ok_or_else(|| {
            AppError::validation("Le paiement PayPal n'est pas activé")
        })?;
        let order = paypal.capture_order(order_id).await?;
        let statut = if order.is_completed() {
            StatutPaiement::Valide
        } else {
            log::warn!("PayPal order {order_id} captured as {}", order.status);
            StatutPaiement::Refuse
        };

        let (updated, _) = self.finalize(current, statut).await?;
        Ok(updated.into())
    }

    /// Treasurer confirms (`true`) or rejects a bank transfer.
    pub async fn settle_transfer(&self, paiement_id: i64, received: bool) -> AppResult<PaiementResponse> {
        let current = paiement::Entity::find_by_id(paiement_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(payment_not_found)?;

        if current.methode != MethodePaiement::Virement {
            return Err(AppError::validation("Ce paiement n'est pas un virement"));
        }

        let statut = if received {
            StatutPaiement::Valide
        } else {
            StatutPaiement::Refuse
        };
        let (updated, changed) = self.finalize(current, statut).await?;
        if !changed {
            return Err(AppError::Conflict(
                "Ce paiement a déjà été traité".to_string(),
            ));
        }
        Ok(updated.into())
    }

    pub async fn my_payments(&self, user: &AuthUser) -> AppResult<Vec<PaiementResponse>> {
        let Some(adherent) = linked_adherent(self.pool.as_ref(), user.user_id).await? else {
            return Ok(Vec::new());
        };
        let list = paiement::Entity::find()
            .filter(paiement::Column::AdherentId.eq(adherent.id))
            .order_by_desc(paiement::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn list_payments(
        &self,
        query: &PaiementQuery,
    ) -> AppResult<PaginatedResponse<PaiementResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = paiement::Entity::find();
        if let Some(statut) = query.statut {
            select = select.filter(paiement::Column::Statut.eq(statut));
        }
        if let Some(adherent_id) = query.adherent_id {
            select = select.filter(paiement::Column::AdherentId.eq(adherent_id));
        }

        let paginator = select
            .order_by_desc(paiement::Column::CreatedAt)
            .paginate(self.pool.as_ref(), params.get_per_page());
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(params.page_index()).await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn outstanding_items(&self, user: &AuthUser) -> AppResult<Vec<OutstandingItem>> {
        let Some(adherent) = linked_adherent(self.pool.as_ref(), user.user_id).await? else {
            return Ok(Vec::new());
        };
        let items = DuesItem::outstanding_for(self.pool.as_ref(), adherent.id).await?;
        Ok(items.iter().map(DuesItem::to_outstanding).collect())
    }
}
