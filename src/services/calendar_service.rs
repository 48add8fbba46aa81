use crate::config::CalendarConfig;
use crate::database::DbPool;
use crate::entities::{EvenementStatut, evenement_entity as ev};
use crate::error::AppResult;
use crate::utils::ical::{CalendarEvent, render_calendar};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

pub fn to_calendar_event(evenement: &ev::Model, config: &CalendarConfig) -> CalendarEvent {
    CalendarEvent {
        uid: format!("evenement-{}@{}", evenement.id, config.domain),
        start: evenement.date_debut,
        end: evenement.date_fin,
        summary: evenement.titre.clone(),
        description: evenement.description.clone(),
        location: evenement.lieu.clone(),
        url: Some(format!(
            "{}/evenements/{}",
            config.site_url.trim_end_matches('/'),
            evenement.id
        )),
        category: Some(evenement.categorie.to_string()),
        last_modified: evenement.updated_at,
    }
}

#[derive(Clone)]
pub struct CalendarService {
    pool: DbPool,
    config: CalendarConfig,
}

impl CalendarService {
    pub fn new(pool: DbPool, config: CalendarConfig) -> Self {
        Self { pool, config }
    }

    /// iCalendar feed of public, published, currently displayed events.
    pub async fn export_ics(&self) -> AppResult<String> {
        let now = Utc::now();
        let evenements = ev::Entity::find()
            .filter(ev::Column::Statut.eq(EvenementStatut::Publie))
            .filter(ev::Column::Public.eq(true))
            .order_by_asc(ev::Column::DateDebut)
            .all(self.pool.as_ref())
            .await?;

        let events: Vec<CalendarEvent> = evenements
            .iter()
            .filter(|e| e.is_displayable_at(now))
            .map(|e| to_calendar_event(e, &self.config))
            .collect();

        log::debug!("Calendar export with {} event(s)", events.len());
        Ok(render_calendar(&self.config.name, &events, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EvenementCategorie;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn config() -> CalendarConfig {
        CalendarConfig {
            name: "Agenda".to_string(),
            domain: "asso.test".to_string(),
            site_url: "https://asso.test/".to_string(),
        }
    }

    fn evenement(id: i64, display_from: Option<chrono::DateTime<Utc>>) -> ev::Model {
        let start = Utc.with_ymd_and_hms(2030, 4, 5, 18, 0, 0).unwrap();
        ev::Model {
            id,
            titre: format!("Soirée {id}"),
            description: "Entrée libre, buffet; boissons".to_string(),
            date_debut: start,
            date_fin: start + Duration::hours(3),
            date_affichage: display_from,
            date_fin_affichage: None,
            lieu: Some("Salle Jean Moulin".to_string()),
            categorie: EvenementCategorie::Culturel,
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
    fn test_to_calendar_event() {
        let event = to_calendar_event(&evenement(12, None), &config());
        assert_eq!(event.uid, "evenement-12@asso.test");
        assert_eq!(event.url.as_deref(), Some("https://asso.test/evenements/12"));
        assert_eq!(event.category.as_deref(), Some("Culturel"));
    }

    #[actix_web::test]
    async fn test_export_skips_events_not_yet_displayed() {
        let later = Utc::now() + Duration::days(30);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![evenement(1, None), evenement(2, Some(later))]])
            .into_connection();

        let ics = CalendarService::new(Arc::new(db), config()).export_ics().await.unwrap();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("UID:evenement-1@asso.test\r\n"));
        assert!(!ics.contains("evenement-2@"));
        assert!(ics.contains("DTSTART:20300405T180000Z\r\n"));
        assert!(ics.contains("DESCRIPTION:Entrée libre\\, buffet\\; boissons\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }
}
