use crate::database::DbPool;
use crate::entities::{EvenementStatut, evenement_entity as ev};
use crate::error::{AppError, AppResult};
use crate::external::RevalidationService;
use crate::middlewares::AuthUser;
use crate::models::{EvenementPayload, EvenementQuery, EvenementResponse};
use crate::utils::{PaginatedResponse, PaginationParams};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

/// Published, inside its display window, and members-only events only for
/// signed-in viewers.
pub fn is_visible_to(evenement: &ev::Model, viewer: Option<&AuthUser>, now: DateTime<Utc>) -> bool {
    evenement.statut == EvenementStatut::Publie
        && evenement.is_displayable_at(now)
        && (evenement.public || viewer.is_some())
}

fn capacity_below_reserved(places_reservees: i32) -> AppError {
    AppError::validation(format!(
        "La capacité ne peut pas être inférieure aux {places_reservees} places déjà réservées"
    ))
}

/// Capacity cannot drop under seats already handed out.
pub fn check_capacity_update(places_disponibles: Option<i32>, places_reservees: i32) -> AppResult<()> {
    if let Some(capacity) = places_disponibles
        && capacity < places_reservees
    {
        return Err(capacity_below_reserved(places_reservees));
    }
    Ok(())
}

pub fn event_paths(id: i64) -> [String; 3] {
    [
        "/admin/evenements".to_string(),
        "/evenements".to_string(),
        format!("/evenements/{id}"),
    ]
}

fn not_found() -> AppError {
    AppError::NotFound("Événement introuvable".to_string())
}

#[derive(Clone)]
pub struct EventService {
    pool: DbPool,
    revalidator: RevalidationService,
}

impl EventService {
    pub fn new(pool: DbPool, revalidator: RevalidationService) -> Self {
        Self { pool, revalidator }
    }

    pub async fn list_public(&self, viewer: Option<&AuthUser>) -> AppResult<Vec<EvenementResponse>> {
        let mut query = ev::Entity::find().filter(ev::Column::Statut.eq(EvenementStatut::Publie));
        if viewer.is_none() {
            query = query.filter(ev::Column::Public.eq(true));
        }

        let now = Utc::now();
        let list = query
            .order_by_asc(ev::Column::DateDebut)
            .all(self.pool.as_ref())
            .await?;

        Ok(list
            .into_iter()
            .filter(|e| is_visible_to(e, viewer, now))
            .map(Into::into)
            .collect())
    }

    pub async fn get(&self, id: i64, viewer: Option<&AuthUser>) -> AppResult<EvenementResponse> {
        let evenement = ev::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(not_found)?;

        // admins preview drafts through the same route
        let is_admin = viewer.is_some_and(|v| v.is_admin());
        if !is_admin && !is_visible_to(&evenement, viewer, Utc::now()) {
            return Err(not_found());
        }
        Ok(evenement.into())
    }

    pub async fn list_all(
        &self,
        query: &EvenementQuery,
    ) -> AppResult<PaginatedResponse<EvenementResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = ev::Entity::find();
        if let Some(statut) = query.statut {
            select = select.filter(ev::Column::Statut.eq(statut));
        }

        let paginator = select
            .order_by_desc(ev::Column::DateDebut)
            .paginate(self.pool.as_ref(), params.get_per_page());
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(params.page_index()).await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn create(
        &self,
        payload: EvenementPayload,
        created_by: i64,
    ) -> AppResult<EvenementResponse> {
        payload.validate()?;

        let now = Utc::now();
        let evenement = ev::ActiveModel {
            titre: Set(payload.titre.trim().to_string()),
            description: Set(payload.description),
            date_debut: Set(payload.date_debut),
            date_fin: Set(payload.date_fin),
            date_affichage: Set(payload.date_affichage),
            date_fin_affichage: Set(payload.date_fin_affichage),
            lieu: Set(payload.lieu),
            categorie: Set(payload.categorie),
            statut: Set(payload.statut),
            public: Set(payload.public),
            places_disponibles: Set(payload.places_disponibles),
            places_reservees: Set(0),
            inscription_requise: Set(payload.inscription_requise),
            date_limite_inscription: Set(payload.date_limite_inscription),
            image_url: Set(payload.image_url),
            created_by: Set(Some(created_by)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Event {} created by user {}", evenement.id, created_by);
        self.revalidator.spawn_revalidate(event_paths(evenement.id));
        Ok(evenement.into())
    }

    pub async fn update(&self, id: i64, payload: EvenementPayload) -> AppResult<EvenementResponse> {
        payload.validate()?;

        let existing = ev::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(not_found)?;
        check_capacity_update(payload.places_disponibles, existing.places_reservees)?;

        let changes = ev::ActiveModel {
            titre: Set(payload.titre.trim().to_string()),
            description: Set(payload.description),
            date_debut: Set(payload.date_debut),
            date_fin: Set(payload.date_fin),
            date_affichage: Set(payload.date_affichage),
            date_fin_affichage: Set(payload.date_fin_affichage),
            lieu: Set(payload.lieu),
            categorie: Set(payload.categorie),
            statut: Set(payload.statut),
            public: Set(payload.public),
            places_disponibles: Set(payload.places_disponibles),
            inscription_requise: Set(payload.inscription_requise),
            date_limite_inscription: Set(payload.date_limite_inscription),
            image_url: Set(payload.image_url),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        // registrations may have landed since the read
        let mut update = ev::Entity::update_many()
            .set(changes)
            .filter(ev::Column::Id.eq(id));
        if let Some(capacity) = payload.places_disponibles {
            update = update.filter(ev::Column::PlacesReservees.lte(capacity));
        }
        let result = update.exec(self.pool.as_ref()).await?;

        let current = ev::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(not_found)?;
        if result.rows_affected == 0 {
            log::warn!(
                "Capacity of event {id} not lowered, {} seats reserved meanwhile",
                current.places_reservees
            );
            return Err(capacity_below_reserved(current.places_reservees));
        }

        self.revalidator.spawn_revalidate(event_paths(id));
        Ok(current.into())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        // registrations go with it (ON DELETE CASCADE)
        let result = ev::Entity::delete_by_id(id).exec(self.pool.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(not_found());
        }

        log::info!("Event {id} deleted");
        self.revalidator.spawn_revalidate(event_paths(id));
        Ok(())
    }

    pub async fn set_status(&self, id: i64, statut: EvenementStatut) -> AppResult<EvenementResponse> {
        let existing = ev::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(not_found)?;

        let mut am = existing.into_active_model();
        am.statut = Set(statut);
        am.updated_at = Set(Some(Utc::now()));
        let updated = am.update(self.pool.as_ref()).await?;

        self.revalidator.spawn_revalidate(event_paths(id));
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RevalidateConfig;
    use crate::entities::{EvenementCategorie, UserRole};
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn evenement(now: DateTime<Utc>) -> ev::Model {
        ev::Model {
            id: 8,
            titre: "Sortie vélo".to_string(),
            description: String::new(),
            date_debut: now + Duration::days(10),
            date_fin: now + Duration::days(10) + Duration::hours(3),
            date_affichage: Some(now - Duration::days(1)),
            date_fin_affichage: None,
            lieu: None,
            categorie: EvenementCategorie::Sportif,
            statut: EvenementStatut::Publie,
            public: true,
            places_disponibles: None,
            places_reservees: 0,
            inscription_requise: false,
            date_limite_inscription: None,
            image_url: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_visibility_rules() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let member = AuthUser {
            user_id: 1,
            role: UserRole::Membre,
        };

        let mut e = evenement(now);
        assert!(is_visible_to(&e, None, now));

        e.public = false;
        assert!(!is_visible_to(&e, None, now));
        assert!(is_visible_to(&e, Some(&member), now));

        e.public = true;
        e.statut = EvenementStatut::Brouillon;
        assert!(!is_visible_to(&e, Some(&member), now));

        e.statut = EvenementStatut::Publie;
        e.date_affichage = Some(now + Duration::hours(1));
        assert!(!is_visible_to(&e, None, now));
    }

    #[test]
    fn test_capacity_update_not_below_reserved() {
        assert!(check_capacity_update(Some(10), 8).is_ok());
        assert!(check_capacity_update(Some(8), 8).is_ok());
        assert!(check_capacity_update(Some(7), 8).is_err());
        assert!(check_capacity_update(None, 50).is_ok());
    }

    #[test]
    fn test_event_paths() {
        assert_eq!(
            event_paths(3),
            [
                "/admin/evenements".to_string(),
                "/evenements".to_string(),
                "/evenements/3".to_string()
            ]
        );
    }

    fn payload(places_disponibles: Option<i32>) -> EvenementPayload {
        let start = Utc.with_ymd_and_hms(2030, 9, 12, 9, 0, 0).unwrap();
        EvenementPayload {
            titre: "Sortie vélo".to_string(),
            description: String::new(),
            date_debut: start,
            date_fin: start + Duration::hours(3),
            date_affichage: None,
            date_fin_affichage: None,
            lieu: None,
            categorie: EvenementCategorie::Sportif,
            statut: EvenementStatut::Publie,
            public: true,
            places_disponibles,
            inscription_requise: true,
            date_limite_inscription: None,
            image_url: None,
        }
    }

    fn with_seats(capacity: Option<i32>, reserved: i32) -> ev::Model {
        ev::Model {
            places_disponibles: capacity,
            places_reservees: reserved,
            ..evenement(Utc::now())
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> EventService {
        EventService::new(db, RevalidationService::new(RevalidateConfig::default()))
    }

    #[actix_web::test]
    async fn test_capacity_update_guarded_in_sql() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![with_seats(Some(20), 8)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![with_seats(Some(8), 8)]])
            .into_connection();
        let db = Arc::new(db);

        let updated = service(db.clone())
            .update(8, payload(Some(8)))
            .await
            .unwrap();
        assert_eq!(updated.places_disponibles, Some(8));

        let log = format!(
            "{:?}",
            Arc::try_unwrap(db).ok().expect("connection still shared").into_transaction_log()
        );
        assert!(log.contains("\\\"places_reservees\\\" <= $"));
    }

    #[actix_web::test]
    async fn test_capacity_update_loses_to_a_concurrent_registration() {
        // 8 reserved when read, 9 by the time the UPDATE runs
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![with_seats(Some(20), 8)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([vec![with_seats(Some(20), 9)]])
            .into_connection();

        match service(Arc::new(db)).update(8, payload(Some(8))).await {
            Err(AppError::ValidationError(msg)) => assert!(msg.contains("9 places")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_update_of_missing_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ev::Model>::new()])
            .into_connection();
        assert!(matches!(
            service(Arc::new(db)).update(8, payload(None)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
