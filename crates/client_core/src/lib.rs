use std::sync::Arc;

use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        Assessment, DashboardStats, Quiz, QuizId, QuizQuestion, Resource, UserDetails, UserId,
        UserSummary,
    },
    error::ApiError,
    protocol::{DetailEnvelope, ListEnvelope, LoginRequest, LoginResponse, QuizDraft, ResourceDraft},
};
use storage::SessionStore;
use tracing::{debug, info};
use url::Url;

pub mod catalog;
pub mod error;
pub mod listing;
pub mod request_tracker;
pub mod routing;
pub mod screens;
pub mod session;

pub use error::{ClientError, GENERIC_ERROR_MESSAGE};
pub use request_tracker::{ClientEvent, ErrorReporting, RequestState, RequestTracker};
pub use session::AuthSession;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/";

const NO_BODY: Option<&()> = None;

/// REST client for the admin backend. Every call runs through the shared
/// [`RequestTracker`] and carries the stored bearer token when one exists.
#[derive(Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
    tracker: Arc<RequestTracker>,
}

impl AdminClient {
    pub fn new(
        base_url: &str,
        session: Arc<dyn SessionStore>,
        tracker: Arc<RequestTracker>,
    ) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), base_url, session, tracker)
    }

    pub fn with_http_client(
        http: Client,
        base_url: &str,
        session: Arc<dyn SessionStore>,
        tracker: Arc<RequestTracker>,
    ) -> Result<Self, ClientError> {
        let mut parsed = Url::parse(base_url.trim())
            .map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        Ok(Self {
            http,
            base_url: parsed,
            session,
            tracker,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Exchanges credentials for a token and persists the returned session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "Email and password are required.".to_string(),
            ));
        }
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let session = self
            .tracker
            .track(ErrorReporting::Global, async {
                let response = self
                    .dispatch(Method::POST, &["auth", "login"], Some(&request))
                    .await?;
                let body: LoginResponse = decode(response).await?;
                match (body.token, body.user) {
                    (Some(token), Some(user)) if !token.trim().is_empty() => {
                        let session = AuthSession { token, user };
                        session::persist(self.session.as_ref(), &session).await?;
                        Ok(session)
                    }
                    _ => Err(ClientError::Decode(
                        "login response did not include a token and user".to_string(),
                    )),
                }
            })
            .await?;

        info!(user_id = %session.user.id, "auth: signed in");
        Ok(session)
    }

    /// Forgets the stored token and user profile.
    pub async fn logout(&self) -> Result<(), ClientError> {
        session::clear(self.session.as_ref()).await?;
        info!("auth: signed out");
        Ok(())
    }

    pub async fn current_session(&self) -> Result<Option<AuthSession>, ClientError> {
        session::load(self.session.as_ref()).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.fetch(ErrorReporting::Global, Method::GET, &["admin", "dashboard"], NO_BODY)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        self.fetch_list(&["admin", "users"]).await
    }

    pub async fn user_details(&self, user_id: &UserId) -> Result<UserDetails, ClientError> {
        require_id(user_id.as_str(), "User")?;
        let envelope: DetailEnvelope<UserDetails> = self
            .fetch(
                ErrorReporting::Global,
                Method::GET,
                &["admin", "users", user_id.as_str()],
                NO_BODY,
            )
            .await?;
        Ok(envelope.into_inner())
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), ClientError> {
        require_id(user_id.as_str(), "User")?;
        self.execute(
            ErrorReporting::SkipGlobal,
            Method::DELETE,
            &["admin", "users", user_id.as_str()],
            NO_BODY,
        )
        .await?;
        info!(user_id = %user_id, "users: deleted");
        Ok(())
    }

    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, ClientError> {
        self.fetch_list(&["quizzes"]).await
    }

    pub async fn create_quiz(&self, draft: &QuizDraft) -> Result<Option<Quiz>, ClientError> {
        let draft = validated_quiz(draft)?;
        let created: Option<DetailEnvelope<Quiz>> = self
            .fetch_lenient(ErrorReporting::SkipGlobal, Method::POST, &["quizzes"], Some(&draft))
            .await?;
        info!(title = %draft.title, "quizzes: created");
        Ok(created.map(DetailEnvelope::into_inner))
    }

    pub async fn update_quiz(
        &self,
        quiz_id: &QuizId,
        draft: &QuizDraft,
    ) -> Result<Option<Quiz>, ClientError> {
        require_id(quiz_id.as_str(), "Quiz")?;
        let draft = validated_quiz(draft)?;
        let updated: Option<DetailEnvelope<Quiz>> = self
            .fetch_lenient(
                ErrorReporting::SkipGlobal,
                Method::PUT,
                &["quizzes", quiz_id.as_str()],
                Some(&draft),
            )
            .await?;
        info!(quiz_id = %quiz_id, "quizzes: updated");
        Ok(updated.map(DetailEnvelope::into_inner))
    }

    pub async fn delete_quiz(&self, quiz_id: &QuizId) -> Result<(), ClientError> {
        require_id(quiz_id.as_str(), "Quiz")?;
        self.execute(
            ErrorReporting::SkipGlobal,
            Method::DELETE,
            &["quizzes", quiz_id.as_str()],
            NO_BODY,
        )
        .await?;
        info!(quiz_id = %quiz_id, "quizzes: deleted");
        Ok(())
    }

    pub async fn list_quiz_questions(&self, quiz_id: &QuizId) -> Result<Vec<QuizQuestion>, ClientError> {
        require_id(quiz_id.as_str(), "Quiz")?;
        self.fetch_list(&["quizzes", quiz_id.as_str(), "questions"]).await
    }

    pub async fn list_assessments(&self) -> Result<Vec<Assessment>, ClientError> {
        self.fetch_list(&["assessments"]).await
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, ClientError> {
        self.fetch_list(&["resources"]).await
    }

    pub async fn create_resource(&self, draft: &ResourceDraft) -> Result<Option<Resource>, ClientError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation(
                "Resource title is required.".to_string(),
            ));
        }
        let draft = ResourceDraft {
            title: title.to_string(),
            ..draft.clone()
        };
        let created: Option<DetailEnvelope<Resource>> = self
            .fetch_lenient(ErrorReporting::SkipGlobal, Method::POST, &["resources"], Some(&draft))
            .await?;
        info!(title = %draft.title, "resources: created");
        Ok(created.map(DetailEnvelope::into_inner))
    }

    async fn fetch_list<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>, ClientError> {
        let envelope: ListEnvelope<T> = self
            .fetch(ErrorReporting::Global, Method::GET, segments, NO_BODY)
            .await?;
        let items = envelope.into_items();
        debug!(path = %segments.join("/"), count = items.len(), "fetched list");
        Ok(items)
    }

    async fn fetch<T, B>(
        &self,
        reporting: ErrorReporting,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.tracker
            .track(reporting, async {
                let response = self.dispatch(method, segments, body).await?;
                decode(response).await
            })
            .await
    }

    /// Like `fetch`, but a success body that does not decode yields `None`
    /// instead of an error.
    async fn fetch_lenient<T, B>(
        &self,
        reporting: ErrorReporting,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Option<T>, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.tracker
            .track(reporting, async {
                let response = self.dispatch(method, segments, body).await?;
                let text = response.text().await.map_err(ClientError::Transport)?;
                Ok(serde_json::from_str(&text).ok())
            })
            .await
    }

    async fn execute<B>(
        &self,
        reporting: ErrorReporting,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.tracker
            .track(reporting, async {
                self.dispatch(method, segments, body).await?;
                Ok(())
            })
            .await
    }

    async fn dispatch<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "dispatching request");
        let mut request = self.http.request(method, url);
        if let Some(token) = session::stored_token(self.session.as_ref()).await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(ClientError::Transport)?;
        check_status(response).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = ApiError::from_body(&body)
        .and_then(|error| error.message().map(str::to_string));
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let text = response.text().await.map_err(ClientError::Transport)?;
    serde_json::from_str(&text).map_err(|err| ClientError::Decode(err.to_string()))
}

fn require_id(id: &str, what: &str) -> Result<(), ClientError> {
    if id.trim().is_empty() {
        return Err(ClientError::Validation(format!("No {what} ID provided")));
    }
    Ok(())
}

fn validated_quiz(draft: &QuizDraft) -> Result<QuizDraft, ClientError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(ClientError::Validation(
            "Quiz title is required.".to_string(),
        ));
    }
    Ok(QuizDraft {
        title: title.to_string(),
        ..draft.clone()
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
