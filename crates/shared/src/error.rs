use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Error body returned by the backend. Only `message` is read; any other
/// keys (`code`, `success`, ...) are ignored whatever their type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(
        default,
        deserialize_with = "message_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
}

impl ApiError {
    /// Decodes an error response body, or `None` when it is not a JSON object.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Server-supplied message, ignoring blank strings.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}

fn message_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(message) => Some(message),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(body: &str) -> Option<String> {
        ApiError::from_body(body).and_then(|error| error.message().map(str::to_string))
    }

    #[test]
    fn message_is_read_whatever_the_code_looks_like() {
        for body in [
            r#"{"code":409,"message":"Title already exists"}"#,
            r#"{"code":"DUPLICATE","message":"Title already exists"}"#,
            r#"{"success":false,"message":"Title already exists"}"#,
            r#"{"message":"  Title already exists "}"#,
        ] {
            assert_eq!(message_of(body).as_deref(), Some("Title already exists"), "{body}");
        }
    }

    #[test]
    fn blank_or_non_text_messages_are_absent() {
        assert_eq!(message_of(r#"{"message":"   "}"#), None);
        assert_eq!(message_of(r#"{"message":{"detail":"nested"}}"#), None);
        assert_eq!(message_of(r#"{"message":null}"#), None);
        assert_eq!(message_of("Internal Server Error"), None);
    }
}
