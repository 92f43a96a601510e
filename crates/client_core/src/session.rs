//! Typed view over the two persisted session entries.

use anyhow::Context;
use shared::domain::AuthUser;
use storage::{SessionStore, AUTH_TOKEN_KEY, USER_KEY};
use tracing::warn;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

/// True when both the token and the user entry are present and non-empty.
pub async fn is_signed_in(store: &dyn SessionStore) -> Result<bool, ClientError> {
    let token = store.get(AUTH_TOKEN_KEY).await?;
    let user = store.get(USER_KEY).await?;
    Ok(non_empty(token.as_deref()) && non_empty(user.as_deref()))
}

pub async fn stored_token(store: &dyn SessionStore) -> Result<Option<String>, ClientError> {
    Ok(store
        .get(AUTH_TOKEN_KEY)
        .await?
        .filter(|token| non_empty(Some(token.as_str()))))
}

pub async fn load(store: &dyn SessionStore) -> Result<Option<AuthSession>, ClientError> {
    let Some(token) = stored_token(store).await? else {
        return Ok(None);
    };
    let Some(raw_user) = store.get(USER_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<AuthUser>(&raw_user) {
        Ok(user) => Ok(Some(AuthSession { token, user })),
        Err(err) => {
            warn!(error = %err, "session: stored user profile is unreadable");
            Ok(None)
        }
    }
}

pub async fn persist(store: &dyn SessionStore, session: &AuthSession) -> Result<(), ClientError> {
    let raw_user = serde_json::to_string(&session.user).context("failed to serialize user profile")?;
    store.set(AUTH_TOKEN_KEY, &session.token).await?;
    store.set(USER_KEY, &raw_user).await?;
    Ok(())
}

pub async fn clear(store: &dyn SessionStore) -> Result<(), ClientError> {
    store.remove(AUTH_TOKEN_KEY).await?;
    store.remove(USER_KEY).await?;
    Ok(())
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}
