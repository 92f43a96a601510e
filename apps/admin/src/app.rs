use std::{fmt::Write, future::Future, sync::Arc};

use anyhow::{bail, Context, Result};
use client_core::{
    catalog::{ListEntity, CATEGORY_FILTER, STATUS_FILTER, TYPE_FILTER},
    listing::{FilterSelection, SortDirection},
    routing::{AuthGate, Navigation, Navigator, Route},
    screens::{refresh, run_mutation, ListScreen, MutationOutcome, ScreenStatus},
    AdminClient, ClientError, RequestTracker,
};
use shared::{
    domain::{QuizId, UserId},
    protocol::{QuizDraft, ResourceDraft},
};
use storage::{SessionStore, Storage};
use tracing::{error, info, warn};

use crate::{
    cli::{AssessmentsCommand, Command, ListArgs, QuizFields, QuizzesCommand, ResourcesCommand, UsersCommand},
    config::Settings,
    render::{self, TableRow},
};

pub struct App {
    client: AdminClient,
    gate: AuthGate,
    page_size: usize,
}

impl App {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let database_url = &settings.session_database_url;
        let storage = Storage::new(database_url).await.map_err(|error| {
            error!(
                %database_url,
                %error,
                "failed to open session database; verify the directory is writable"
            );
            error
        })?;
        if let Err(error) = storage.health_check().await {
            error!(%database_url, %error, "session database health check failed");
            return Err(error);
        }
        let session: Arc<dyn SessionStore> = Arc::new(storage);
        let client = AdminClient::new(
            &settings.api_base_url,
            session,
            Arc::new(RequestTracker::new()),
        )
        .context("failed to configure API client")?;
        Ok(Self::with_client(client, settings.page_size))
    }

    pub fn with_client(client: AdminClient, page_size: usize) -> Self {
        let gate = AuthGate::new(client.session_store().clone());
        Self {
            client,
            gate,
            page_size,
        }
    }

    /// Runs one command, appending everything it renders to `out`.
    pub async fn run(&self, command: Command, out: &mut String) -> Result<()> {
        match command {
            Command::Login {
                email,
                password,
                open,
            } => self.login(&email, &password, open.as_deref(), out).await,
            Command::Logout => {
                self.client.logout().await?;
                out.push_str("Signed out.\n");
                Ok(())
            }
            Command::Whoami => {
                match self.client.current_session().await? {
                    Some(session) => {
                        let _ = writeln!(out, "{}", render::session(&session));
                    }
                    None => out.push_str("Not signed in.\n"),
                }
                Ok(())
            }
            Command::Dashboard => {
                self.require(Route::Dashboard).await?;
                self.dashboard(out).await
            }
            Command::Users(command) => self.users(command, out).await,
            Command::Quizzes(command) => self.quizzes(command, out).await,
            Command::Assessments(command) => self.assessments(command, out).await,
            Command::Resources(command) => self.resources(command, out).await,
            Command::Open { location } => self.open(&location, out).await,
        }
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        open: Option<&str>,
        out: &mut String,
    ) -> Result<()> {
        let mut navigator = Navigator::new(self.gate.clone());
        if let Some(location) = open {
            navigator.navigate(location).await?;
        }

        let session = self.client.login(email, password).await?;
        let _ = writeln!(out, "{}", render::session(&session));

        if open.is_none() {
            return Ok(());
        }
        let route = if navigator.return_to().is_some() {
            navigator.complete_login().await?.clone()
        } else {
            navigator.current().clone()
        };
        out.push('\n');
        self.render_route(route, out).await
    }

    async fn open(&self, location: &str, out: &mut String) -> Result<()> {
        let mut navigator = Navigator::new(self.gate.clone());
        let route = navigator.navigate(location).await?.clone();
        if let Some(origin) = navigator.return_to() {
            return Err(sign_in_required(origin));
        }
        self.render_route(route, out).await
    }

    async fn render_route(&self, route: Route, out: &mut String) -> Result<()> {
        info!(route = %route, "routing: rendering");
        match route {
            Route::Login => {
                out.push_str("Sign in with `quizadmin login --email <email> --password <password>`.\n");
                Ok(())
            }
            Route::NotFound => bail!("page not found"),
            Route::Dashboard => self.dashboard(out).await,
            Route::Users => self.list_users(&ListArgs::default(), None, false, out).await,
            Route::UserDetails { user_id } => match user_id {
                Some(user_id) => self.show_user(&user_id, out).await,
                None => bail!("No User ID provided"),
            },
            Route::Quizzes => self.list_quizzes(&ListArgs::default(), None, out).await,
            Route::QuizDetails { quiz_id } => match quiz_id {
                Some(quiz_id) => {
                    self.list_questions(&quiz_id, &ListArgs::default(), None, out)
                        .await
                }
                None => bail!("No Quiz ID provided"),
            },
            Route::Assessments => {
                self.list_assessments(&ListArgs::default(), None, None, out)
                    .await
            }
            Route::Resources => {
                self.list_resources(&ListArgs::default(), None, None, out)
                    .await
            }
        }
    }

    async fn require(&self, route: Route) -> Result<()> {
        match self.gate.check(route).await? {
            Navigation::Render(_) => Ok(()),
            Navigation::Redirect { from, .. } => Err(sign_in_required(&from)),
        }
    }

    async fn dashboard(&self, out: &mut String) -> Result<()> {
        let stats = self.client.dashboard_stats().await?;
        out.push_str(&render::dashboard(&stats));
        Ok(())
    }

    async fn users(&self, command: UsersCommand, out: &mut String) -> Result<()> {
        self.require(Route::Users).await?;
        match command {
            UsersCommand::List {
                list,
                status,
                oldest,
            } => self.list_users(&list, status.as_deref(), oldest, out).await,
            UsersCommand::Show { id } => self.show_user(&UserId::new(id), out).await,
            UsersCommand::Delete { id } => {
                let user_id = UserId::new(id);
                self.mutate(
                    self.client.delete_user(&user_id),
                    || self.client.list_users(),
                    "User deleted successfully",
                    out,
                )
                .await
            }
        }
    }

    async fn show_user(&self, user_id: &UserId, out: &mut String) -> Result<()> {
        let details = self.client.user_details(user_id).await?;
        out.push_str(&render::user_details(&details));
        Ok(())
    }

    async fn list_users(
        &self,
        list: &ListArgs,
        status: Option<&str>,
        oldest: bool,
        out: &mut String,
    ) -> Result<()> {
        let direction = if oldest {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        self.show_list(
            list,
            &[(STATUS_FILTER, status)],
            direction,
            || self.client.list_users(),
            out,
        )
        .await
    }

    async fn quizzes(&self, command: QuizzesCommand, out: &mut String) -> Result<()> {
        self.require(Route::Quizzes).await?;
        match command {
            QuizzesCommand::List { list, status } => {
                self.list_quizzes(&list, status.as_deref(), out).await
            }
            QuizzesCommand::Create { fields } => {
                let draft = quiz_draft(fields);
                self.mutate(
                    self.client.create_quiz(&draft),
                    || self.client.list_quizzes(),
                    "Quiz created successfully",
                    out,
                )
                .await
            }
            QuizzesCommand::Update { id, fields } => {
                let quiz_id = QuizId::new(id);
                let draft = quiz_draft(fields);
                self.mutate(
                    self.client.update_quiz(&quiz_id, &draft),
                    || self.client.list_quizzes(),
                    "Quiz updated successfully",
                    out,
                )
                .await
            }
            QuizzesCommand::Delete { id } => {
                let quiz_id = QuizId::new(id);
                self.mutate(
                    self.client.delete_quiz(&quiz_id),
                    || self.client.list_quizzes(),
                    "Quiz deleted successfully",
                    out,
                )
                .await
            }
            QuizzesCommand::Questions {
                quiz_id,
                list,
                question_type,
            } => {
                self.list_questions(&QuizId::new(quiz_id), &list, question_type.as_deref(), out)
                    .await
            }
        }
    }

    async fn list_quizzes(&self, list: &ListArgs, status: Option<&str>, out: &mut String) -> Result<()> {
        self.show_list(
            list,
            &[(STATUS_FILTER, status)],
            SortDirection::Descending,
            || self.client.list_quizzes(),
            out,
        )
        .await
    }

    async fn list_questions(
        &self,
        quiz_id: &QuizId,
        list: &ListArgs,
        question_type: Option<&str>,
        out: &mut String,
    ) -> Result<()> {
        self.show_list(
            list,
            &[(TYPE_FILTER, question_type)],
            SortDirection::Descending,
            || self.client.list_quiz_questions(quiz_id),
            out,
        )
        .await
    }

    async fn assessments(&self, command: AssessmentsCommand, out: &mut String) -> Result<()> {
        self.require(Route::Assessments).await?;
        match command {
            AssessmentsCommand::List {
                list,
                status,
                assessment_type,
            } => {
                self.list_assessments(&list, status.as_deref(), assessment_type.as_deref(), out)
                    .await
            }
        }
    }

    async fn list_assessments(
        &self,
        list: &ListArgs,
        status: Option<&str>,
        assessment_type: Option<&str>,
        out: &mut String,
    ) -> Result<()> {
        self.show_list(
            list,
            &[(STATUS_FILTER, status), (TYPE_FILTER, assessment_type)],
            SortDirection::Descending,
            || self.client.list_assessments(),
            out,
        )
        .await
    }

    async fn resources(&self, command: ResourcesCommand, out: &mut String) -> Result<()> {
        self.require(Route::Resources).await?;
        match command {
            ResourcesCommand::List {
                list,
                category,
                status,
            } => {
                self.list_resources(&list, category.as_deref(), status.as_deref(), out)
                    .await
            }
            ResourcesCommand::Create {
                title,
                category,
                resource_type,
            } => {
                let draft = ResourceDraft {
                    title,
                    category,
                    resource_type,
                };
                self.mutate(
                    self.client.create_resource(&draft),
                    || self.client.list_resources(),
                    "Resource created successfully",
                    out,
                )
                .await
            }
        }
    }

    async fn list_resources(
        &self,
        list: &ListArgs,
        category: Option<&str>,
        status: Option<&str>,
        out: &mut String,
    ) -> Result<()> {
        self.show_list(
            list,
            &[(CATEGORY_FILTER, category), (STATUS_FILTER, status)],
            SortDirection::Descending,
            || self.client.list_resources(),
            out,
        )
        .await
    }

    async fn show_list<T, F, Fut>(
        &self,
        list: &ListArgs,
        filters: &[(&str, Option<&str>)],
        direction: SortDirection,
        fetch: F,
        out: &mut String,
    ) -> Result<()>
    where
        T: ListEntity + TableRow,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let screen = ListScreen::<T>::handle(self.page_size);
        {
            let mut guard = screen.lock().await;
            if let Some(term) = list.search.as_deref() {
                guard.set_search_term(term);
            }
            for (name, value) in filters {
                if let Some(value) = value {
                    guard.set_filter(name, filter_selection::<T>(name, value)?);
                }
            }
            guard.set_sort_direction(direction);
        }

        refresh(&Arc::downgrade(&screen), fetch()).await;

        let mut guard = screen.lock().await;
        if let ScreenStatus::Failed(_) = guard.status() {
            out.push_str(&render::screen(&guard));
            bail!("failed to load {}", T::PLURAL);
        }
        let requested = list.page.max(1);
        let shown = guard.show_page(requested);
        out.push_str(&render::screen(&guard));
        if shown != requested {
            warn!(page = requested, shown, entity = T::PLURAL, "list: page out of range");
            let _ = writeln!(out, "Page {requested} does not exist; showing page {shown}.");
        }
        Ok(())
    }

    async fn mutate<T, M, V, R, Fut>(
        &self,
        mutation: M,
        refetch: R,
        success_message: &str,
        out: &mut String,
    ) -> Result<()>
    where
        T: ListEntity + TableRow,
        M: Future<Output = Result<V, ClientError>>,
        R: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let screen = ListScreen::<T>::handle(self.page_size);
        let outcome = run_mutation(&Arc::downgrade(&screen), mutation, refetch, success_message).await;
        out.push_str(&render::screen(&*screen.lock().await));
        match outcome {
            MutationOutcome::Completed => Ok(()),
            MutationOutcome::Failed(message) => bail!(message),
            MutationOutcome::Suppressed | MutationOutcome::Discarded => {
                bail!("{} change was not applied", T::PLURAL)
            }
        }
    }
}

/// Parses a filter flag, accepting any letter case for values from the
/// entity's fixed vocabulary.
fn filter_selection<T: ListEntity>(name: &str, raw: &str) -> Result<FilterSelection> {
    let selection = FilterSelection::parse(raw);
    let FilterSelection::Only(value) = &selection else {
        return Ok(selection);
    };
    let Some((_, allowed)) = T::filter_options().iter().find(|(filter, _)| *filter == name) else {
        return Ok(selection);
    };
    match allowed.iter().find(|option| option.eq_ignore_ascii_case(value)) {
        Some(option) => Ok(FilterSelection::Only(option.to_string())),
        None => bail!(
            "unknown {name} '{value}'; expected one of: All, {}",
            allowed.join(", ")
        ),
    }
}

fn sign_in_required(origin: &Route) -> anyhow::Error {
    anyhow::Error::new(ClientError::Unauthenticated)
        .context(format!("run `quizadmin login --open '{origin}'` to continue"))
}

fn quiz_draft(fields: QuizFields) -> QuizDraft {
    QuizDraft {
        title: fields.title,
        description: fields.description,
        client: fields.client,
        status: fields.status,
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
