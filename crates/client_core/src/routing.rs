//! Route table and the sign-in gate in front of protected screens.

use std::{fmt, sync::Arc};

use shared::domain::{QuizId, UserId};
use storage::SessionStore;
use tracing::debug;
use url::form_urlencoded;

use crate::{error::ClientError, session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Users,
    UserDetails { user_id: Option<UserId> },
    Quizzes,
    QuizDetails { quiz_id: Option<QuizId> },
    Assessments,
    Resources,
    NotFound,
}

impl Route {
    /// Resolves a `path?query` location. Unknown paths resolve to
    /// [`Route::NotFound`].
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        let path = path.trim_end_matches('/');
        let lower = path.to_ascii_lowercase();

        if let Some(user_id) = detail_segment(path, &lower, "/users/") {
            return Self::UserDetails {
                user_id: Some(UserId(user_id)),
            };
        }
        if let Some(quiz_id) = detail_segment(path, &lower, "/quizzes/") {
            return Self::QuizDetails {
                quiz_id: Some(QuizId(quiz_id)),
            };
        }

        match lower.as_str() {
            "" | "/dashboard" => Self::Dashboard,
            "/login" => Self::Login,
            "/users" => Self::Users,
            "/userdetails" => Self::UserDetails {
                user_id: query_param(query, "userId").map(UserId),
            },
            "/quizzes" => Self::Quizzes,
            "/quizdetails" => Self::QuizDetails {
                quiz_id: query_param(query, "quizId").map(QuizId),
            },
            "/assessments" => Self::Assessments,
            "/resources" => Self::Resources,
            _ => Self::NotFound,
        }
    }

    pub fn location(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Users => "/users".to_string(),
            Self::UserDetails { user_id } => {
                with_param("/userdetails", "userId", user_id.as_ref().map(UserId::as_str))
            }
            Self::Quizzes => "/quizzes".to_string(),
            Self::QuizDetails { quiz_id } => {
                with_param("/quizdetails", "quizId", quiz_id.as_ref().map(QuizId::as_str))
            }
            Self::Assessments => "/assessments".to_string(),
            Self::Resources => "/resources".to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login | Self::NotFound)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}

/// `/users/<id>` style links carry the id in the path instead of the query.
fn detail_segment(path: &str, lower: &str, prefix: &str) -> Option<String> {
    if !lower.starts_with(prefix) {
        return None;
    }
    let segment = &path[prefix.len()..];
    (!segment.is_empty() && !segment.contains('/')).then(|| segment.to_string())
}

fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn with_param(path: &str, name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair(name, value)
                .finish();
            format!("{path}?{query}")
        }
        None => path.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect { to: Route, from: Route },
}

/// Allows protected routes only while a session is stored. The store is read
/// on every check.
#[derive(Clone)]
pub struct AuthGate {
    session: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }

    pub async fn check(&self, route: Route) -> Result<Navigation, ClientError> {
        if !route.requires_auth() || session::is_signed_in(self.session.as_ref()).await? {
            return Ok(Navigation::Render(route));
        }
        debug!(route = %route, "routing: no session, redirecting to login");
        Ok(Navigation::Redirect {
            to: Route::Login,
            from: route,
        })
    }
}

/// Tracks the current route and the protected route a sign-in interrupted.
pub struct Navigator {
    gate: AuthGate,
    current: Route,
    return_to: Option<Route>,
}

impl Navigator {
    pub fn new(gate: AuthGate) -> Self {
        Self {
            gate,
            current: Route::Login,
            return_to: None,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn return_to(&self) -> Option<&Route> {
        self.return_to.as_ref()
    }

    pub async fn navigate(&mut self, location: &str) -> Result<&Route, ClientError> {
        match self.gate.check(Route::parse(location)).await? {
            Navigation::Render(route) => self.current = route,
            Navigation::Redirect { to, from } => {
                self.return_to = Some(from);
                self.current = to;
            }
        }
        Ok(&self.current)
    }

    /// Called after a successful sign-in: resumes the interrupted route, or
    /// the dashboard when there is none.
    pub async fn complete_login(&mut self) -> Result<&Route, ClientError> {
        let target = self.return_to.take().unwrap_or(Route::Dashboard);
        let location = target.location();
        self.navigate(&location).await
    }
}

#[cfg(test)]
#[path = "tests/routing_tests.rs"]
mod tests;
