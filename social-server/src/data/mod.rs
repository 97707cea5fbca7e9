pub mod comment_repository;
pub mod follow_repository;
pub mod post_repository;
pub mod user_repository;

#[cfg(test)]
pub mod memory;

use tracing::{error, warn};

use crate::domain::error::DomainError;

/// What a failed statement means for the caller.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DbFailure {
    UniqueViolation(Option<String>),
    ForeignKeyViolation(Option<String>),
    CheckViolation,
    ValueTooLong,
    Other,
}

// SQLSTATE string_data_right_truncation
const VALUE_TOO_LONG: &str = "22001";

pub(crate) fn classify(err: &sqlx::Error) -> DbFailure {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            DbFailure::UniqueViolation(db.constraint().map(str::to_owned))
        }
        Some(db) if db.is_foreign_key_violation() => {
            DbFailure::ForeignKeyViolation(db.constraint().map(str::to_owned))
        }
        Some(db) if db.is_check_violation() => DbFailure::CheckViolation,
        Some(db) if db.code().as_deref() == Some(VALUE_TOO_LONG) => DbFailure::ValueTooLong,
        _ => DbFailure::Other,
    }
}

/// Logs the raw error and hides it behind `Internal`.
pub(crate) fn internal(context: &str, err: sqlx::Error) -> DomainError {
    error!(context, error = %err, "database error");
    DomainError::Internal(format!("{context}: {err}"))
}

/// Fallback for statements that write client-supplied text.
pub(crate) fn write_error(context: &str, err: sqlx::Error) -> DomainError {
    match classify(&err) {
        DbFailure::ValueTooLong => {
            warn!(context, error = %err, "value rejected by column width");
            DomainError::bad_input("a field exceeds its maximum length")
        }
        _ => internal(context, err),
    }
}

/// Whether a foreign key failure came from `column`, going by Postgres'
/// default `<table>_<column>_fkey` constraint names.
pub(crate) fn references(constraint: Option<&str>, column: &str) -> bool {
    constraint.is_some_and(|name| {
        name.strip_suffix("_fkey")
            .is_some_and(|rest| rest.ends_with(&format!("_{column}")))
    })
}

/// Escapes `LIKE` wildcards so user input is matched literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
