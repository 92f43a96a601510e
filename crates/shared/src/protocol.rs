use serde::{Deserialize, Serialize};

use crate::domain::AuthUser;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Body for quiz create/update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

/// List endpoints answer either with a bare array or with the array wrapped
/// in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(
            alias = "items",
            alias = "users",
            alias = "quizzes",
            alias = "questions",
            alias = "assessments",
            alias = "resources"
        )]
        data: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// Detail endpoints answer either with the record itself or with the record
/// wrapped under `user`/`data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DetailEnvelope<T> {
    Wrapped {
        #[serde(alias = "user", alias = "quiz")]
        data: T,
    },
    Bare(T),
}

impl<T> DetailEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Resource, UserDetails};

    #[test]
    fn list_envelope_accepts_bare_and_wrapped_arrays() {
        let bare: ListEnvelope<Resource> =
            serde_json::from_str(r#"[{"id":"r1"},{"id":"r2"}]"#).expect("bare");
        assert_eq!(bare.into_items().len(), 2);

        let wrapped: ListEnvelope<Resource> =
            serde_json::from_str(r#"{"resources":[{"id":"r1"}],"total":1}"#).expect("wrapped");
        assert_eq!(wrapped.into_items().len(), 1);
    }

    #[test]
    fn detail_envelope_unwraps_user_key() {
        let wrapped: DetailEnvelope<UserDetails> =
            serde_json::from_str(r#"{"user":{"id":"7","name":"Pinnacle"}}"#).expect("wrapped");
        assert_eq!(wrapped.into_inner().name.as_deref(), Some("Pinnacle"));

        let bare: DetailEnvelope<UserDetails> =
            serde_json::from_str(r#"{"id":"7","name":"Pinnacle"}"#).expect("bare");
        assert_eq!(bare.into_inner().id.as_str(), "7");
    }
}
