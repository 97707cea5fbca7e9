pub mod comment;
pub mod error;
pub mod post;
pub mod user;

use crate::domain::error::DomainError;

/// Rejects values wider than their column, counted in characters like `VARCHAR(n)`.
pub(crate) fn ensure_max_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::bad_input(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}
