pub mod auth_service;
pub mod calendar_service;
pub mod dues_item;
pub mod event_service;
pub mod notification_service;
pub mod payment_service;
pub mod registration_service;

pub use auth_service::{AuthService, linked_adherent};
pub use calendar_service::CalendarService;
pub use dues_item::{DuesItem, Settlement};
pub use event_service::EventService;
pub use notification_service::NotificationService;
pub use payment_service::PaymentService;
pub use registration_service::{Registrant, RegistrationService};
