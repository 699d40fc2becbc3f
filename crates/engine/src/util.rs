//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! normalization so every entry point enforces the same rules.

use sea_orm::DbErr;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

const MAX_EMAIL_LEN: usize = 254;

/// Parse a UUID read back from storage.
///
/// A malformed stored id is a storage fault, not a client error.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| stored_value_fault(&format!("{label} id"), value))
}

/// Error for a row value the store should never have accepted.
pub(crate) fn stored_value_fault(label: &str, value: &str) -> EngineError {
    EngineError::Database(DbErr::Type(format!("invalid {label}: {value}")))
}

/// Parse a currency code read back from storage.
pub(crate) fn stored_currency(code: &str) -> ResultEngine<Currency> {
    Currency::try_from(code).map_err(|_| stored_value_fault("currency", code))
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trim and lower-case an email, rejecting anything that is not
/// `local@domain` without whitespace.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let invalid = || EngineError::InvalidRequest(format!("invalid email address: {email}"));

    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  X@Y.com ").unwrap(), "x@y.com");
    }

    #[test]
    fn normalize_email_rejects_malformed() {
        for input in ["", "x", "@y.com", "x@", "x@@y.com", "x y@z.com", "x@y.", "x@.y"] {
            assert!(normalize_email(input).is_err(), "{input:?}");
        }
    }

    #[test]
    fn bad_stored_values_are_storage_faults() {
        assert!(matches!(
            parse_uuid("nope", "account"),
            Err(EngineError::Database(DbErr::Type(_)))
        ));
        assert!(matches!(
            stored_currency("XXX"),
            Err(EngineError::Database(DbErr::Type(_)))
        ));
        assert_eq!(stored_currency("JPY").unwrap(), Currency::Jpy);
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(normalize_optional_text(Some(" rent ")), Some("rent".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }
}
