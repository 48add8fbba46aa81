pub mod admin;
pub mod auth;
pub mod calendar;
pub mod evenements;
pub mod inscriptions;
pub mod paiements;
pub mod webhook;

pub use admin::admin_config;
pub use auth::auth_config;
pub use calendar::calendar_config;
pub use evenements::evenements_config;
pub use inscriptions::inscriptions_config;
pub use paiements::paiements_config;
pub use webhook::webhook_config;
