//! Error types for planner operations.

use thiserror::Error;

/// Recoverable failures surfaced by the planner stores.
///
/// None of these are fatal; the caller turns them into a user-facing prompt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown category: {0}")]
    InvalidCategory(String),
}

/// Result alias for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Trims `raw` and checks it against the non-empty and length rules shared by
/// event titles, timetable subjects and memos.
pub(crate) fn validate_text(field: &str, raw: &str, max_chars: usize) -> PlannerResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::Validation(format!("{field} must not be empty")));
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(PlannerError::Validation(format!(
            "{field} is {len} characters, limit is {max_chars}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_not_bytes() {
        // 5 Hangul syllables are 15 bytes in UTF-8
        assert_eq!(validate_text("title", "  엄마 생신 ", 5), Ok("엄마 생신".to_string()));
        assert!(matches!(
            validate_text("title", "   ", 5),
            Err(PlannerError::Validation(_))
        ));
        assert!(matches!(
            validate_text("title", "abcdef", 5),
            Err(PlannerError::Validation(_))
        ));
    }
}
