use crate::entities::{adherent_entity, evenement_entity, inscription_entity};
use crate::external::{EmailMessage, MailService};
use chrono_tz::Tz;

/// Registration e-mails. Every send is spawned; failures only reach the log.
#[derive(Clone)]
pub struct NotificationService {
    mailer: MailService,
    timezone: Tz,
}

/// Anything user-supplied goes through this before landing in a mail body.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Start of the event in the association's local time.
fn event_date(evenement: &evenement_entity::Model, timezone: Tz) -> String {
    evenement
        .date_debut
        .with_timezone(&timezone)
        .format("%d/%m/%Y à %H:%M")
        .to_string()
}

fn places_label(n: i32) -> String {
    if n > 1 {
        format!("{n} places")
    } else {
        "1 place".to_string()
    }
}

pub fn visitor_confirmation_message(
    evenement: &evenement_entity::Model,
    inscription: &inscription_entity::Model,
    timezone: Tz,
) -> Option<EmailMessage> {
    let to = inscription.visiteur_email.clone()?;
    let nom = escape_html(inscription.visiteur_nom.as_deref().unwrap_or(""));
    Some(EmailMessage {
        to,
        subject: format!("Inscription enregistrée : {}", evenement.titre),
        html: format!(
            "<p>Bonjour {nom},</p>\
             <p>Votre inscription à <strong>{}</strong> le {} ({}) a bien été enregistrée.</p>\
             <p>Elle sera confirmée par l'association.</p>",
            escape_html(&evenement.titre),
            event_date(evenement, timezone),
            places_label(inscription.nombre_personnes),
        ),
    })
}

pub fn member_confirmation_message(
    evenement: &evenement_entity::Model,
    adherent: &adherent_entity::Model,
    nombre_personnes: i32,
    timezone: Tz,
) -> Option<EmailMessage> {
    let to = adherent.email.clone()?;
    Some(EmailMessage {
        to,
        subject: format!("Inscription enregistrée : {}", evenement.titre),
        html: format!(
            "<p>Bonjour {},</p>\
             <p>Votre inscription à <strong>{}</strong> le {} ({}) est enregistrée.</p>",
            escape_html(&adherent.prenom),
            escape_html(&evenement.titre),
            event_date(evenement, timezone),
            places_label(nombre_personnes),
        ),
    })
}

pub fn admin_notice_message(
    admin_email: &str,
    evenement: &evenement_entity::Model,
    registrant: &str,
    nombre_personnes: i32,
) -> EmailMessage {
    let remaining = match evenement.places_restantes() {
        Some(n) => format!("{n} place(s) restante(s)"),
        None => "places illimitées".to_string(),
    };
    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("Nouvelle inscription : {}", evenement.titre),
        html: format!(
            "<p>{} s'est inscrit(e) à <strong>{}</strong> ({}).</p><p>{remaining}</p>",
            escape_html(registrant),
            escape_html(&evenement.titre),
            places_label(nombre_personnes),
        ),
    }
}

impl NotificationService {
    pub fn new(mailer: MailService, timezone: Tz) -> Self {
        Self { mailer, timezone }
    }

    fn spawn_send(&self, message: EmailMessage) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&message).await {
                log::error!("Notification \"{}\" to {} failed: {e}", message.subject, message.to);
            }
        });
    }

    pub fn visitor_registered(
        &self,
        evenement: &evenement_entity::Model,
        inscription: &inscription_entity::Model,
    ) {
        if let Some(message) = visitor_confirmation_message(evenement, inscription, self.timezone) {
            self.spawn_send(message);
        }
        let registrant = inscription.visiteur_nom.as_deref().unwrap_or("Un visiteur");
        self.notify_admin(evenement, registrant, inscription.nombre_personnes);
    }

    pub fn member_registered(
        &self,
        evenement: &evenement_entity::Model,
        adherent: &adherent_entity::Model,
        nombre_personnes: i32,
    ) {
        match member_confirmation_message(evenement, adherent, nombre_personnes, self.timezone) {
            Some(message) => self.spawn_send(message),
            None => log::debug!("Adherent {} has no e-mail, confirmation skipped", adherent.id),
        }
        self.notify_admin(evenement, &adherent.full_name(), nombre_personnes);
    }

    fn notify_admin(&self, evenement: &evenement_entity::Model, registrant: &str, n: i32) {
        if let Some(admin_email) = self.mailer.admin_email() {
            self.spawn_send(admin_notice_message(admin_email, evenement, registrant, n));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EvenementCategorie, EvenementStatut, InscriptionStatut};
    use chrono::{TimeZone, Utc};

    fn evenement() -> evenement_entity::Model {
        let start = Utc.with_ymd_and_hms(2025, 12, 13, 19, 0, 0).unwrap();
        evenement_entity::Model {
            id: 1,
            titre: "Repas de fin d'année".to_string(),
            description: String::new(),
            date_debut: start,
            date_fin: start,
            date_affichage: None,
            date_fin_affichage: None,
            lieu: None,
            categorie: EvenementCategorie::Social,
            statut: EvenementStatut::Publie,
            public: true,
            places_disponibles: Some(40),
            places_reservees: 12,
            inscription_requise: true,
            date_limite_inscription: None,
            image_url: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn visitor(nom: &str) -> inscription_entity::Model {
        inscription_entity::Model {
            id: 2,
            evenement_id: 1,
            adherent_id: None,
            visiteur_nom: Some(nom.to_string()),
            visiteur_email: Some("marie@example.fr".to_string()),
            visiteur_telephone: None,
            visiteur_adresse: None,
            nombre_personnes: 3,
            statut: InscriptionStatut::EnAttente,
            commentaire: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_visitor_message() {
        let message =
            visitor_confirmation_message(&evenement(), &visitor("Marie"), Tz::Europe__Paris)
                .unwrap();
        assert_eq!(message.to, "marie@example.fr");
        assert!(message.subject.contains("Repas de fin d'année"));
        assert!(message.html.contains("3 places"));
    }

    #[test]
    fn test_event_time_is_local() {
        // 19:00 UTC in December is 20:00 in Paris, 18:00 UTC in June is 20:00 too
        let message =
            visitor_confirmation_message(&evenement(), &visitor("Marie"), Tz::Europe__Paris)
                .unwrap();
        assert!(message.html.contains("13/12/2025 à 20:00"));

        let mut summer = evenement();
        summer.date_debut = Utc.with_ymd_and_hms(2025, 6, 21, 18, 0, 0).unwrap();
        assert_eq!(event_date(&summer, Tz::Europe__Paris), "21/06/2025 à 20:00");
        assert_eq!(event_date(&summer, Tz::UTC), "21/06/2025 à 18:00");

        // late evening UTC rolls over to the next local day
        summer.date_debut = Utc.with_ymd_and_hms(2025, 6, 21, 22, 30, 0).unwrap();
        assert_eq!(event_date(&summer, Tz::Europe__Paris), "22/06/2025 à 00:30");
    }

    #[test]
    fn test_user_input_is_escaped() {
        let nom = "<a href=\"https://evil.test\">Gagnez</a> & co";
        let mut e = evenement();
        e.titre = "Soirée <script>alert('x')</script>".to_string();

        let notice = admin_notice_message("admin@asso.fr", &e, nom, 1);
        assert!(!notice.html.contains("<a href"));
        assert!(!notice.html.contains("<script>"));
        assert!(notice.html.contains(
            "&lt;a href=&quot;https://evil.test&quot;&gt;Gagnez&lt;/a&gt; &amp; co"
        ));
        assert!(notice.html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));

        let message = visitor_confirmation_message(&e, &visitor(nom), Tz::UTC).unwrap();
        assert!(message.html.starts_with("<p>Bonjour &lt;a href="));
        assert!(!message.html.contains("<script>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Marie-Thérèse"), "Marie-Thérèse");
        assert_eq!(escape_html("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }

    #[test]
    fn test_member_without_email_gets_no_message() {
        let adherent = adherent_entity::Model {
            id: 4,
            user_id: Some(9),
            prenom: "Paul".to_string(),
            nom: "Durand".to_string(),
            email: None,
            telephone: None,
            adresse: None,
            created_at: None,
            updated_at: None,
        };
        assert!(member_confirmation_message(&evenement(), &adherent, 1, Tz::UTC).is_none());
    }

    #[test]
    fn test_admin_notice_shows_remaining_seats() {
        let message = admin_notice_message("admin@asso.fr", &evenement(), "Paul Durand", 1);
        assert!(message.html.contains("28 place(s) restante(s)"));
        assert!(message.html.contains("1 place)"));
    }
}
