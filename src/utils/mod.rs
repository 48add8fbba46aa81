pub mod code_generator;
pub mod ical;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;

pub use code_generator::generate_transfer_reference;
pub use jwt::*;
pub use pagination::*;
pub use password::*;
pub use validation::*;
