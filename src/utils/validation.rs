use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// French numbers, national or +33 form, separators allowed
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+33\s?|0)[1-9](?:[\s.-]?\d{2}){4}$").expect("valid phone regex")
});

pub fn validate_email(email: &str) -> AppResult<()> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(AppError::validation("Adresse e-mail invalide"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_REGEX.is_match(phone.trim()) {
        return Err(AppError::validation("Numéro de téléphone invalide"));
    }
    Ok(())
}

pub fn require_non_empty(value: &str, message: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

/// Lowercased, trimmed e-mail used for duplicate checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jean.dupont@example.fr").is_ok());
        assert!(validate_email(" jean@example.fr ").is_ok());
        assert!(validate_email("jean@example").is_err());
        assert!(validate_email("jean example.fr").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0612345678").is_ok());
        assert!(validate_phone("06 12 34 56 78").is_ok());
        assert!(validate_phone("+33 6 12 34 56 78").is_ok());
        assert!(validate_phone("06.12.34.56.78").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("0012345678").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jean@Example.FR "), "jean@example.fr");
    }
}
