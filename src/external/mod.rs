pub mod mailer;
pub mod payment_gateway;
pub mod paypal;
pub mod revalidator;
pub mod stripe;
pub mod virement;

pub use mailer::{EmailMessage, MailService};
pub use payment_gateway::{CheckoutRequest, PaymentGateway, ProviderSession};
pub use paypal::PayPalService;
pub use revalidator::RevalidationService;
pub use stripe::StripeService;
pub use virement::VirementService;
