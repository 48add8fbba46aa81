use crate::database::DbPool;
use crate::entities::{
    EvenementStatut, InscriptionStatut, adherent_entity, evenement_entity as ev,
    inscription_entity as ins,
};
use crate::error::{AppError, AppResult};
use crate::external::RevalidationService;
use crate::middlewares::AuthUser;
use crate::models::{
    AddParticipantRequest, EvenementResponse, InscriptionResponse, MonInscriptionResponse,
    RegisterRequest, RegistrationResult, VisiteurInfo,
};
use crate::services::{NotificationService, linked_adherent};
use crate::utils::normalize_email;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::collections::HashMap;

const NO_SEATS: &str = "Plus assez de places disponibles";
const ALREADY_REGISTERED: &str = "Déjà inscrit à cet événement";

/// Who takes the seats.
#[derive(Debug, Clone)]
pub enum Registrant {
    Adherent(adherent_entity::Model),
    Visiteur(VisiteurInfo),
}

impl Registrant {
    fn is_visitor(&self) -> bool {
        matches!(self, Registrant::Visiteur(_))
    }
}

/// `reserved + n` must fit in the capacity; no capacity means unlimited.
pub fn check_capacity(places_reservees: i32, places_disponibles: Option<i32>, n: i32) -> AppResult<()> {
    let Some(capacity) = places_disponibles else {
        return Ok(());
    };
    match places_reservees.checked_add(n) {
        Some(total) if total <= capacity => Ok(()),
        _ => Err(AppError::validation(NO_SEATS)),
    }
}

pub fn ensure_registration_open(evenement: &ev::Model, now: DateTime<Utc>) -> AppResult<()> {
    if !evenement.inscription_requise {
        return Err(AppError::validation(
            "Cet événement ne nécessite pas d'inscription",
        ));
    }
    if let Some(deadline) = evenement.date_limite_inscription
        && now > deadline
    {
        return Err(AppError::validation(
            "La date limite d'inscription est dépassée",
        ));
    }
    Ok(())
}

/// Checks run in this order; the first failure is reported.
pub fn check_registration_preconditions(
    evenement: &ev::Model,
    is_visitor: bool,
    n: i32,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if evenement.statut != EvenementStatut::Publie {
        return Err(not_found());
    }
    if is_visitor && !evenement.public {
        return Err(AppError::validation(
            "Cet événement est réservé aux adhérents",
        ));
    }
    ensure_registration_open(evenement, now)?;
    check_capacity(evenement.places_reservees, evenement.places_disponibles, n)
}

pub fn registration_paths(evenement_id: i64) -> [String; 4] {
    [
        "/admin/evenements".to_string(),
        "/evenements".to_string(),
        format!("/evenements/{evenement_id}"),
        "/profil".to_string(),
    ]
}

fn not_found() -> AppError {
    AppError::NotFound("Événement introuvable".to_string())
}

fn inscription_not_found() -> AppError {
    AppError::NotFound("Inscription introuvable".to_string())
}

fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(ALREADY_REGISTERED.to_string())
        }
        _ => err.into(),
    }
}

/// Conditional increment: zero rows touched means the seats are gone.
async fn reserve_seats<C: ConnectionTrait>(db: &C, evenement_id: i64, n: i32) -> AppResult<()> {
    let result = ev::Entity::update_many()
        .col_expr(
            ev::Column::PlacesReservees,
            Expr::col(ev::Column::PlacesReservees).add(n),
        )
        .col_expr(ev::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(ev::Column::Id.eq(evenement_id))
        .filter(
            Condition::any()
                .add(ev::Column::PlacesDisponibles.is_null())
                .add(
                    Expr::expr(Expr::col(ev::Column::PlacesReservees).add(n))
                        .lte(Expr::col(ev::Column::PlacesDisponibles)),
                ),
        )
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        log::warn!("No seats left on event {evenement_id} for {n} more");
        return Err(AppError::validation(NO_SEATS));
    }
    Ok(())
}

async fn release_seats<C: ConnectionTrait>(db: &C, evenement_id: i64, n: i32) -> AppResult<()> {
    ev::Entity::update_many()
        .col_expr(
            ev::Column::PlacesReservees,
            Func::cust(Alias::new("GREATEST"))
                .arg(Expr::col(ev::Column::PlacesReservees).sub(n))
                .arg(0)
                .into(),
        )
        .col_expr(ev::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(ev::Column::Id.eq(evenement_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn find_existing<C: ConnectionTrait>(
    db: &C,
    evenement_id: i64,
    registrant: &Registrant,
) -> AppResult<Option<ins::Model>> {
    let query = ins::Entity::find().filter(ins::Column::EvenementId.eq(evenement_id));
    let query = match registrant {
        Registrant::Adherent(adherent) => query.filter(ins::Column::AdherentId.eq(adherent.id)),
        Registrant::Visiteur(visiteur) => query
            .filter(ins::Column::AdherentId.is_null())
            .filter(
                Expr::expr(Func::lower(Expr::col(ins::Column::VisiteurEmail)))
                    .eq(normalize_email(&visiteur.email)),
            ),
    };
    Ok(query.one(db).await?)
}

#[derive(Clone)]
pub struct RegistrationService {
    pool: DbPool,
    notifications: NotificationService,
    revalidator: RevalidationService,
}

impl RegistrationService {
    pub fn new(
        pool: DbPool,
        notifications: NotificationService,
        revalidator: RevalidationService,
    ) -> Self {
        Self {
            pool,
            notifications,
            revalidator,
        }
    }

    async fn resolve_registrant(
        &self,
        viewer: Option<&AuthUser>,
        visiteur: Option<VisiteurInfo>,
    ) -> AppResult<Registrant> {
        if let Some(user) = viewer
            && let Some(adherent) = linked_adherent(self.pool.as_ref(), user.user_id).await?
        {
            return Ok(Registrant::Adherent(adherent));
        }
        visiteur.map(Registrant::Visiteur).ok_or_else(|| {
            AppError::validation("Les coordonnées du visiteur sont obligatoires")
        })
    }

    /// Reserve `nombre_personnes` seats for a member or a visitor.
    pub async fn register(
        &self,
        evenement_id: i64,
        viewer: Option<&AuthUser>,
        request: RegisterRequest,
    ) -> AppResult<RegistrationResult> {
        request.validate()?;
        let registrant = self.resolve_registrant(viewer, request.visiteur.clone()).await?;
        let n = request.nombre_personnes;

        let txn = self.pool.begin().await?;

        let evenement = ev::Entity::find_by_id(evenement_id)
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;
        if let Err(e) =
            check_registration_preconditions(&evenement, registrant.is_visitor(), n, Utc::now())
        {
            log::warn!("Registration to event {evenement_id} refused: {e}");
            return Err(e);
        }

        if find_existing(&txn, evenement_id, &registrant).await?.is_some() {
            return Err(AppError::Conflict(ALREADY_REGISTERED.to_string()));
        }

        let now = Utc::now();
        let mut am = ins::ActiveModel {
            evenement_id: Set(evenement_id),
            nombre_personnes: Set(n),
            statut: Set(InscriptionStatut::EnAttente),
            commentaire: Set(request.commentaire),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        match &registrant {
            Registrant::Adherent(adherent) => {
                am.adherent_id = Set(Some(adherent.id));
            }
            Registrant::Visiteur(visiteur) => {
                am.visiteur_nom = Set(Some(visiteur.nom.trim().to_string()));
                am.visiteur_email = Set(Some(visiteur.email.trim().to_string()));
                am.visiteur_telephone = Set(visiteur.telephone.clone());
                am.visiteur_adresse = Set(visiteur.adresse.clone());
            }
        }
        let inscription = am.insert(&txn).await.map_err(map_insert_error)?;

        reserve_seats(&txn, evenement_id, n).await?;
        let evenement = ev::Entity::find_by_id(evenement_id)
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;

        txn.commit().await?;

        log::info!(
            "Registration {} on event {} for {} seat(s), {} reserved",
            inscription.id,
            evenement_id,
            n,
            evenement.places_reservees
        );

        let response = match &registrant {
            Registrant::Adherent(adherent) => {
                self.notifications.member_registered(&evenement, adherent, n);
                InscriptionResponse::from(inscription).with_adherent(adherent)
            }
            Registrant::Visiteur(_) => {
                self.notifications.visitor_registered(&evenement, &inscription);
                InscriptionResponse::from(inscription)
            }
        };
        self.revalidator.spawn_revalidate(registration_paths(evenement_id));

        Ok(RegistrationResult {
            inscription: response,
            places_reservees: evenement.places_reservees,
            places_restantes: evenement.places_restantes(),
        })
    }

    /// A member withdraws their own registration.
    pub async fn cancel(&self, inscription_id: i64, user: &AuthUser) -> AppResult<()> {
        let adherent = linked_adherent(self.pool.as_ref(), user.user_id)
            .await?
            .ok_or(AppError::Forbidden)?;

        let txn = self.pool.begin().await?;
        let inscription = ins::Entity::find_by_id(inscription_id)
            .one(&txn)
            .await?
            .ok_or_else(inscription_not_found)?;

        if inscription.adherent_id != Some(adherent.id) {
            log::warn!(
                "Adherent {} tried to cancel registration {} they do not own",
                adherent.id,
                inscription_id
            );
            return Err(AppError::Forbidden);
        }

        Self::delete_and_release(&txn, &inscription).await?;
        txn.commit().await?;

        log::info!("Registration {inscription_id} cancelled by adherent {}", adherent.id);
        self.revalidator
            .spawn_revalidate(registration_paths(inscription.evenement_id));
        Ok(())
    }

    /// Admin registration of a member, confirmed straight away.
    pub async fn add_participant(
        &self,
        evenement_id: i64,
        request: AddParticipantRequest,
    ) -> AppResult<RegistrationResult> {
        request.validate()?;
        let n = request.nombre_personnes;

        let txn = self.pool.begin().await?;
        let evenement = ev::Entity::find_by_id(evenement_id)
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;
        let adherent = adherent_entity::Entity::find_by_id(request.adherent_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Adhérent introuvable".to_string()))?;

        check_capacity(evenement.places_reservees, evenement.places_disponibles, n)?;
        let registrant = Registrant::Adherent(adherent.clone());
        if find_existing(&txn, evenement_id, &registrant).await?.is_some() {
            return Err(AppError::Conflict(ALREADY_REGISTERED.to_string()));
        }

        let now = Utc::now();
        let inscription = ins::ActiveModel {
            evenement_id: Set(evenement_id),
            adherent_id: Set(Some(adherent.id)),
            nombre_personnes: Set(n),
            statut: Set(InscriptionStatut::Confirme),
            commentaire: Set(request.commentaire),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_insert_error)?;

        reserve_seats(&txn, evenement_id, n).await?;
        let evenement = ev::Entity::find_by_id(evenement_id)
            .one(&txn)
            .await?
            .ok_or_else(not_found)?;
        txn.commit().await?;

        log::info!(
            "Adherent {} added to event {} ({} seat(s))",
            adherent.id,
            evenement_id,
            n
        );
        self.notifications.member_registered(&evenement, &adherent, n);
        self.revalidator.spawn_revalidate(registration_paths(evenement_id));

        Ok(RegistrationResult {
            inscription: InscriptionResponse::from(inscription).with_adherent(&adherent),
            places_reservees: evenement.places_reservees,
            places_restantes: evenement.places_restantes(),
        })
    }

    pub async fn remove_participant(&self, inscription_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let inscription = ins::Entity::find_by_id(inscription_id)
            .one(&txn)
            .await?
            .ok_or_else(inscription_not_found)?;

        Self::delete_and_release(&txn, &inscription).await?;
        txn.commit().await?;

        log::info!("Registration {inscription_id} removed by an admin");
        self.revalidator
            .spawn_revalidate(registration_paths(inscription.evenement_id));
        Ok(())
    }

    pub async fn list_participants(&self, evenement_id: i64) -> AppResult<Vec<InscriptionResponse>> {
        if ev::Entity::find_by_id(evenement_id)
            .one(self.pool.as_ref())
            .await?
            .is_none()
        {
            return Err(not_found());
        }

        let inscriptions = ins::Entity::find()
            .filter(ins::Column::EvenementId.eq(evenement_id))
            .order_by_asc(ins::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;
        let adherents = self.adherents_by_id(&inscriptions).await?;

        Ok(inscriptions
            .into_iter()
            .map(|i| {
                let adherent = i.adherent_id.and_then(|id| adherents.get(&id));
                let response = InscriptionResponse::from(i);
                match adherent {
                    Some(a) => response.with_adherent(a),
                    None => response,
                }
            })
            .collect())
    }

    pub async fn set_registration_status(
        &self,
        inscription_id: i64,
        statut: InscriptionStatut,
    ) -> AppResult<InscriptionResponse> {
        let inscription = ins::Entity::find_by_id(inscription_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(inscription_not_found)?;

        let mut am = inscription.into_active_model();
        am.statut = Set(statut);
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(self.pool.as_ref()).await?;

        self.revalidator
            .spawn_revalidate(registration_paths(updated.evenement_id));

        let adherent = match updated.adherent_id {
            Some(id) => adherent_entity::Entity::find_by_id(id).one(self.pool.as_ref()).await?,
            None => None,
        };
        let response = InscriptionResponse::from(updated);
        Ok(match adherent {
            Some(a) => response.with_adherent(&a),
            None => response,
        })
    }

    pub async fn my_registrations(&self, user: &AuthUser) -> AppResult<Vec<MonInscriptionResponse>> {
        let Some(adherent) = linked_adherent(self.pool.as_ref(), user.user_id).await? else {
            return Ok(Vec::new());
        };

        let inscriptions = ins::Entity::find()
            .filter(ins::Column::AdherentId.eq(adherent.id))
            .all(self.pool.as_ref())
            .await?;
        let evenement_ids: Vec<i64> = inscriptions.iter().map(|i| i.evenement_id).collect();
        let evenements: HashMap<i64, ev::Model> = ev::Entity::find()
            .filter(ev::Column::Id.is_in(evenement_ids))
            .order_by_asc(ev::Column::DateDebut)
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut list: Vec<MonInscriptionResponse> = inscriptions
            .into_iter()
            .filter_map(|i| {
                let evenement = evenements.get(&i.evenement_id)?.clone();
                Some(MonInscriptionResponse {
                    inscription: InscriptionResponse::from(i).with_adherent(&adherent),
                    evenement: EvenementResponse::from(evenement),
                })
            })
            .collect();
        list.sort_by_key(|m| m.evenement.date_debut);
        Ok(list)
    }

    async fn delete_and_release<C: ConnectionTrait>(db: &C, inscription: &ins::Model) -> AppResult<()> {
        ins::Entity::delete_by_id(inscription.id).exec(db).await?;
        release_seats(db, inscription.evenement_id, inscription.nombre_personnes).await
    }

    async fn adherents_by_id(
        &self,
        inscriptions: &[ins::Model],
    ) -> AppResult<HashMap<i64, adherent_entity::Model>> {
        let ids: Vec<i64> = inscriptions.iter().filter_map(|i| i.adherent_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(adherent_entity::Entity::find()
            .filter(adherent_entity::Column::Id.is_in(ids))
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MailConfig, RevalidateConfig};
    use crate::entities::{EvenementCategorie, UserRole};
    use crate::external::MailService;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Transaction};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn evenement(capacity: Option<i32>, reserved: i32) -> ev::Model {
        let start = now() + Duration::days(14);
        ev::Model {
            id: 21,
            titre: "Atelier couture".to_string(),
            description: String::new(),
            date_debut: start,
            date_fin: start + Duration::hours(2),
            date_affichage: None,
            date_fin_affichage: None,
            lieu: Some("Local associatif".to_string()),
            categorie: EvenementCategorie::Formation,
            statut: EvenementStatut::Publie,
            public: true,
            places_disponibles: capacity,
            places_reservees: reserved,
            inscription_requise: true,
            date_limite_inscription: Some(start - Duration::days(2)),
            image_url: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Same event with the deadline lifted so the wall clock never matters.
    fn open_evenement(capacity: Option<i32>, reserved: i32) -> ev::Model {
        let mut e = evenement(capacity, reserved);
        e.date_limite_inscription = None;
        e
    }

    fn visitor_request(n: i32) -> RegisterRequest {
        RegisterRequest {
            nombre_personnes: n,
            visiteur: Some(VisiteurInfo {
                nom: "Marie Martin".to_string(),
                email: "Marie.Martin@example.fr".to_string(),
                telephone: None,
                adresse: None,
            }),
            commentaire: None,
        }
    }

    fn inscription() -> ins::Model {
        ins::Model {
            id: 90,
            evenement_id: 21,
            adherent_id: None,
            visiteur_nom: Some("Marie Martin".to_string()),
            visiteur_email: Some("marie.martin@example.fr".to_string()),
            visiteur_telephone: None,
            visiteur_adresse: None,
            nombre_personnes: 2,
            statut: InscriptionStatut::EnAttente,
            commentaire: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn adherent() -> adherent_entity::Model {
        adherent_entity::Model {
            id: 4,
            user_id: Some(30),
            prenom: "Paul".to_string(),
            nom: "Durand".to_string(),
            email: None,
            telephone: None,
            adresse: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn adherent_inscription(adherent_id: i64) -> ins::Model {
        ins::Model {
            adherent_id: Some(adherent_id),
            visiteur_nom: None,
            visiteur_email: None,
            ..inscription()
        }
    }

    fn member() -> AuthUser {
        AuthUser {
            user_id: 30,
            role: UserRole::Membre,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> RegistrationService {
        RegistrationService::new(
            db,
            NotificationService::new(MailService::new(MailConfig::default()), Tz::Europe__Paris),
            RevalidationService::new(RevalidateConfig::default()),
        )
    }

    /// The service handle must be gone before the log can be taken.
    fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
        Arc::try_unwrap(db)
            .ok()
            .expect("connection still shared")
            .into_transaction_log()
    }

    #[test]
    fn test_capacity_ten_with_eight_reserved() {
        assert!(check_capacity(8, Some(10), 3).is_err());
        assert!(check_capacity(8, Some(10), 2).is_ok());
        assert!(check_capacity(10, Some(10), 1).is_err());
        assert!(check_capacity(500, None, 40).is_ok());
    }

    #[test]
    fn test_capacity_overflow_means_no_seats() {
        match check_capacity(8, Some(10), i32::MAX) {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, NO_SEATS),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(check_capacity(i32::MAX, Some(i32::MAX), 1).is_err());
    }

    #[test]
    fn test_deadline() {
        let mut e = evenement(Some(10), 0);
        assert!(ensure_registration_open(&e, now()).is_ok());

        let deadline = e.date_limite_inscription.unwrap();
        assert!(ensure_registration_open(&e, deadline).is_ok());
        assert!(ensure_registration_open(&e, deadline + Duration::seconds(1)).is_err());

        e.date_limite_inscription = None;
        e.inscription_requise = false;
        assert!(ensure_registration_open(&e, now()).is_err());
    }

    #[test]
    fn test_preconditions_order() {
        // full and past deadline: the deadline is reported
        let mut e = evenement(Some(10), 10);
        let late = e.date_limite_inscription.unwrap() + Duration::days(1);
        match check_registration_preconditions(&e, false, 1, late) {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "La date limite d'inscription est dépassée")
            }
            other => panic!("unexpected: {other:?}"),
        }

        e.public = false;
        assert!(check_registration_preconditions(&e, true, 1, now()).is_err());
        e.places_reservees = 0;
        assert!(check_registration_preconditions(&e, false, 1, now()).is_ok());

        e.statut = EvenementStatut::Brouillon;
        assert!(matches!(
            check_registration_preconditions(&e, false, 1, now()),
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_register_fills_the_last_two_seats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![open_evenement(Some(10), 8)]])
                .append_query_results([Vec::<ins::Model>::new()])
                .append_query_results([vec![inscription()]])
                .append_exec_results([exec(1)])
                .append_query_results([vec![open_evenement(Some(10), 10)]])
                .into_connection(),
        );

        let result = service(db.clone())
            .register(21, None, visitor_request(2))
            .await
            .unwrap();
        assert_eq!(result.places_reservees, 10);
        assert_eq!(result.places_restantes, Some(0));
        assert_eq!(result.inscription.nombre_personnes, 2);

        let log = format!("{:?}", transaction_log(db));
        assert!(log.contains("UPDATE"));
        assert!(log.contains("places_disponibles"));
        assert!(log.contains("Int(Some(2))"));
    }

    #[actix_web::test]
    async fn test_register_fails_when_conditional_increment_touches_nothing() {
        // the pre-check passes (8 + 2 <= 10) but another registration won the race
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open_evenement(Some(10), 8)]])
            .append_query_results([Vec::<ins::Model>::new()])
            .append_query_results([vec![inscription()]])
            .append_exec_results([exec(0)])
            .into_connection();

        match service(Arc::new(db)).register(21, None, visitor_request(2)).await {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, NO_SEATS),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicate_visitor_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open_evenement(Some(10), 2)]])
            .append_query_results([vec![inscription()]])
            .into_connection();

        assert!(matches!(
            service(Arc::new(db)).register(21, None, visitor_request(1)).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_web::test]
    async fn test_member_registering_twice_is_rejected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![adherent()]])
                .append_query_results([vec![open_evenement(Some(10), 2)]])
                .append_query_results([vec![adherent_inscription(4)]])
                .into_connection(),
        );
        let request = RegisterRequest {
            nombre_personnes: 1,
            visiteur: None,
            commentaire: None,
        };

        match service(db.clone()).register(21, Some(&member()), request).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, ALREADY_REGISTERED),
            other => panic!("unexpected: {other:?}"),
        }
        // nothing inserted, no seat taken
        let log = format!("{:?}", transaction_log(db));
        assert!(!log.contains("INSERT"));
        assert!(!log.contains("UPDATE"));
    }

    #[actix_web::test]
    async fn test_register_over_capacity_is_rejected_before_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open_evenement(Some(10), 8)]])
            .into_connection();

        match service(Arc::new(db)).register(21, None, visitor_request(3)).await {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, NO_SEATS),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_huge_headcount_is_rejected_before_any_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        assert!(matches!(
            service(db.clone()).register(21, None, visitor_request(i32::MAX)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(transaction_log(db).is_empty());
    }

    #[actix_web::test]
    async fn test_anonymous_without_visitor_info() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let request = RegisterRequest {
            nombre_personnes: 1,
            visiteur: None,
            commentaire: None,
        };
        assert!(matches!(
            service(Arc::new(db)).register(21, None, request).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[actix_web::test]
    async fn test_cancel_releases_exactly_the_registered_seats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![adherent()]])
                .append_query_results([vec![adherent_inscription(4)]])
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        service(db.clone()).cancel(90, &member()).await.unwrap();

        let log = format!("{:?}", transaction_log(db));
        assert!(log.contains("DELETE FROM"));
        // clamped at zero, decremented by nombre_personnes
        assert!(log.contains("GREATEST"));
        assert!(log.contains("Int(Some(2))"));
        assert!(log.contains("Int(Some(0))"));
    }

    #[actix_web::test]
    async fn test_remove_participant_releases_seats() {
        let mut registered = inscription();
        registered.nombre_personnes = 3;
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![registered]])
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        service(db.clone()).remove_participant(90).await.unwrap();

        let log = format!("{:?}", transaction_log(db));
        assert!(log.contains("GREATEST"));
        assert!(log.contains("Int(Some(3))"));
        assert!(log.contains("BigInt(Some(21))"));
    }

    #[actix_web::test]
    async fn test_cancel_someone_elses_registration_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![adherent()]])
                .append_query_results([vec![adherent_inscription(5)]])
                .into_connection(),
        );

        assert!(matches!(
            service(db.clone()).cancel(90, &member()).await,
            Err(AppError::Forbidden)
        ));
        assert!(!format!("{:?}", transaction_log(db)).contains("DELETE"));
    }
}
