use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage key holding all guestbook messages
pub const GUESTBOOK_KEY: &str = "guestbook_messages";

/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 200;

/// A guestbook message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Request to leave a guestbook message
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub message: String,
}

/// Check message length in characters (not bytes)
pub fn validate_message_length(message: &str) -> Result<(), String> {
    let len = message.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message too long ({} characters, max {})",
            len, MAX_MESSAGE_CHARS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_characters() {
        // 200 Hangul syllables are 600 bytes but still fit
        let korean: String = std::iter::repeat('안').take(200).collect();
        assert!(validate_message_length(&korean).is_ok());

        let too_long: String = std::iter::repeat('a').take(201).collect();
        assert!(validate_message_length(&too_long).is_err());
    }
}
