use serde::Serialize;

/// A board (topic) listed by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    /// URL-safe board name (e.g., "algorithm", "coding-test")
    pub name: String,
    pub post_count: usize,
}

/// Storage key holding every post of a board
pub fn posts_key(board: &str) -> String {
    format!("posts_{}", board)
}

/// Label attached to issues that belong to a board on the remote tracker
pub fn board_label(board: &str) -> String {
    format!("board:{}", board)
}

/// Validate board name format
pub fn validate_board_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Board name cannot be empty");
    }
    if name.len() > 32 {
        return Err("Board name must be 32 characters or less");
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
        return Err("Board name must contain only lowercase letters, numbers, hyphens, and underscores");
    }
    Ok(())
}
