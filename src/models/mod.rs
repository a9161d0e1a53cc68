mod board;
mod guestbook;
mod post;
mod remote;

pub use board::*;
pub use guestbook::*;
pub use post::*;
pub use remote::*;

use chrono::Utc;

use crate::error::AppError;

/// Next creation-timestamp identifier for a collection.
///
/// Ids are milliseconds since the epoch, bumped past the largest id already
/// present so that two records created within the same millisecond stay
/// distinct.
pub fn next_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    match existing.into_iter().max() {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}

/// Trim a submitted field and reject it when nothing is left
pub fn require_field(name: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}
