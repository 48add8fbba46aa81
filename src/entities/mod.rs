pub mod adherents;
pub mod assistances;
pub mod cotisations_mensuelles;
pub mod dettes_initiales;
pub mod evenements;
pub mod inscriptions_evenements;
pub mod obligations_cotisations;
pub mod paiements_cotisations;
pub mod users;

pub use adherents as adherent_entity;
pub use assistances as assistance_entity;
pub use cotisations_mensuelles as cotisation_mensuelle_entity;
pub use dettes_initiales as dette_initiale_entity;
pub use evenements as evenement_entity;
pub use inscriptions_evenements as inscription_entity;
pub use obligations_cotisations as obligation_entity;
pub use paiements_cotisations as paiement_entity;
pub use users as user_entity;

pub use cotisations_mensuelles::StatutReglement;
pub use evenements::{EvenementCategorie, EvenementStatut};
pub use inscriptions_evenements::InscriptionStatut;
pub use paiements_cotisations::{MethodePaiement, StatutPaiement, TypePaiement};
pub use users::UserRole;
