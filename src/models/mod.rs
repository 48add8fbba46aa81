pub mod auth;
pub mod common;
pub mod evenement;
pub mod inscription;
pub mod paiement;

pub use auth::*;
pub use common::*;
pub use evenement::*;
pub use inscription::*;
pub use paiement::*;
