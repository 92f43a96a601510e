//! State behind one list screen, and the two async flows that feed it.
//!
//! Screens are shared as [`ScreenHandle`]s. In-flight work only holds a
//! [`Weak`] reference, so a result that arrives after the screen was closed is
//! dropped instead of being applied.

use std::{
    future::Future,
    sync::{Arc, Weak},
};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    catalog::ListEntity,
    error::ClientError,
    listing::{compute_view, total_pages, FilterSelection, ListFields, ListQuery, ListView, SortDirection},
};

pub type ScreenHandle<T> = Arc<Mutex<ListScreen<T>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Result of the last create/update/delete, shown only on this screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationNotice {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Completed,
    Failed(String),
    /// Another mutation on the same screen was still outstanding.
    Suppressed,
    /// The screen was closed before the mutation settled.
    Discarded,
}

pub struct ListScreen<T: ListEntity> {
    query: ListQuery,
    records: Vec<T>,
    status: ScreenStatus,
    fields: ListFields<T>,
    notice: Option<MutationNotice>,
    mutation_in_flight: bool,
}

impl<T: ListEntity> ListScreen<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: ListQuery::new(page_size),
            records: Vec::new(),
            status: ScreenStatus::Loading,
            fields: T::list_fields(),
            notice: None,
            mutation_in_flight: false,
        }
    }

    pub fn handle(page_size: usize) -> ScreenHandle<T> {
        Arc::new(Mutex::new(Self::new(page_size)))
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn status(&self) -> &ScreenStatus {
        &self.status
    }

    pub fn notice(&self) -> Option<&MutationNotice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_mutating(&self) -> bool {
        self.mutation_in_flight
    }

    pub fn view(&self) -> ListView<T> {
        compute_view(&self.records, &self.query, &self.fields)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.query.set_search_term(term);
    }

    pub fn set_filter(&mut self, name: &str, selection: FilterSelection) {
        self.query.set_filter(name, selection);
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.query.set_sort_direction(direction);
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total = total_pages(self.view().filtered_count, self.query.page_size());
        self.query.go_to_page(page, total)
    }

    /// Jumps to `page`, or to the nearest page in range, and returns the page
    /// now shown.
    pub fn show_page(&mut self, page: usize) -> usize {
        let total = total_pages(self.view().filtered_count, self.query.page_size());
        self.query.go_to_page(page.clamp(1, total), total);
        self.query.page()
    }

    /// A successful fetch replaces the cached records. A failed one keeps
    /// whatever was shown before and marks the screen as failed.
    pub fn apply_fetch(&mut self, result: Result<Vec<T>, ClientError>) {
        match result {
            Ok(records) => {
                self.records = records;
                self.status = ScreenStatus::Ready;
                let total = total_pages(self.view().filtered_count, self.query.page_size());
                self.query.clamp_page(total);
            }
            Err(err) => self.status = ScreenStatus::Failed(err.user_message()),
        }
    }

    /// Claims the mutation slot. Returns false while another mutation is
    /// outstanding.
    pub fn begin_mutation(&mut self) -> bool {
        if self.mutation_in_flight {
            return false;
        }
        self.mutation_in_flight = true;
        self.notice = None;
        true
    }

    pub fn finish_mutation(&mut self, notice: MutationNotice) {
        self.mutation_in_flight = false;
        self.notice = Some(notice);
    }
}

/// Fetches the collection and applies it if the screen still exists.
/// Returns whether the result was applied.
pub async fn refresh<T, F>(screen: &Weak<Mutex<ListScreen<T>>>, fetch: F) -> bool
where
    T: ListEntity,
    F: Future<Output = Result<Vec<T>, ClientError>>,
{
    {
        let Some(handle) = screen.upgrade() else {
            return false;
        };
        let mut guard = handle.lock().await;
        guard.status = ScreenStatus::Loading;
    }

    let result = fetch.await;

    let Some(handle) = screen.upgrade() else {
        debug!(entity = T::PLURAL, "screen closed; discarding fetched list");
        return false;
    };
    handle.lock().await.apply_fetch(result);
    true
}

/// Runs one create/update/delete for the screen and re-fetches the list
/// afterwards, unless the mutation was rejected before dispatch.
pub async fn run_mutation<T, M, V, R, F>(
    screen: &Weak<Mutex<ListScreen<T>>>,
    mutate: M,
    refetch: R,
    success_message: impl Into<String>,
) -> MutationOutcome
where
    T: ListEntity,
    M: Future<Output = Result<V, ClientError>>,
    R: FnOnce() -> F,
    F: Future<Output = Result<Vec<T>, ClientError>>,
{
    {
        let Some(handle) = screen.upgrade() else {
            return MutationOutcome::Discarded;
        };
        let mut guard = handle.lock().await;
        if !guard.begin_mutation() {
            debug!(entity = T::PLURAL, "mutation already in flight; ignoring submit");
            return MutationOutcome::Suppressed;
        }
    }

    let result = mutate.await;

    let (outcome, notice, should_refetch) = match result {
        Ok(_) => {
            let message = success_message.into();
            (
                MutationOutcome::Completed,
                MutationNotice::Success(message),
                true,
            )
        }
        Err(err) => {
            let message = err.user_message();
            (
                MutationOutcome::Failed(message.clone()),
                MutationNotice::Failure(message),
                !err.is_validation(),
            )
        }
    };

    {
        let Some(handle) = screen.upgrade() else {
            debug!(entity = T::PLURAL, "screen closed; discarding mutation result");
            return MutationOutcome::Discarded;
        };
        handle.lock().await.finish_mutation(notice);
    }

    if should_refetch {
        refresh(screen, refetch()).await;
    }
    outcome
}

#[cfg(test)]
#[path = "tests/screens_tests.rs"]
mod tests;
