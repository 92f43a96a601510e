//! Shared loading/error state for every request issued by the admin client.
//!
//! The tracker is an explicit object handed to whoever needs it. Loading is
//! derived from a count of outstanding requests, so overlapping calls keep
//! the indicator up until the last one settles.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::ClientError;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub is_loading: bool,
    pub is_error: bool,
    pub error_message: String,
}

/// Whether a failed call lands in the shared error state or is left entirely
/// to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorReporting {
    #[default]
    Global,
    SkipGlobal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    RequestStateChanged(RequestState),
    /// Transient notification for a globally reported failure.
    ErrorNotification { message: String },
}

#[derive(Default)]
struct TrackerState {
    in_flight: usize,
    is_error: bool,
    error_message: String,
}

impl TrackerState {
    fn snapshot(&self) -> RequestState {
        RequestState {
            is_loading: self.in_flight > 0,
            is_error: self.is_error,
            error_message: self.error_message.clone(),
        }
    }
}

pub struct RequestTracker {
    state: Mutex<TrackerState>,
    events: broadcast::Sender<ClientEvent>,
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(TrackerState::default()),
            events,
        }
    }

    pub fn state(&self) -> RequestState {
        self.lock().snapshot()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Marks one request as dispatched. The returned ticket releases it when
    /// dropped, including when the owning future is abandoned mid-flight.
    pub fn begin(&self) -> RequestTicket<'_> {
        let snapshot = {
            let mut state = self.lock();
            state.in_flight += 1;
            state.is_error = false;
            state.error_message.clear();
            state.snapshot()
        };
        self.publish(snapshot);
        RequestTicket {
            tracker: self,
            failure: None,
        }
    }

    /// Runs `request` between a dispatch and a completion transition and
    /// reports its failure according to `reporting`. The result is always
    /// handed back to the caller unchanged.
    pub async fn track<T, F>(&self, reporting: ErrorReporting, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let mut ticket = self.begin();
        let result = request.await;

        if let Err(err) = &result {
            match reporting {
                ErrorReporting::Global => {
                    let message = err.user_message();
                    warn!(error = %err, %message, "request failed");
                    ticket.fail(message);
                }
                ErrorReporting::SkipGlobal => {
                    debug!(error = %err, "request failed; left to caller")
                }
            }
        }
        drop(ticket);
        result
    }

    /// Clears a displayed error without touching the in-flight count.
    pub fn dismiss_error(&self) {
        let snapshot = {
            let mut state = self.lock();
            state.is_error = false;
            state.error_message.clear();
            state.snapshot()
        };
        self.publish(snapshot);
    }

    /// Ends one request. A failure is recorded under the same lock as the
    /// count change, so subscribers see a single settled snapshot.
    fn release(&self, failure: Option<String>) {
        let snapshot = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            if let Some(message) = &failure {
                state.is_error = true;
                state.error_message = message.clone();
            }
            state.snapshot()
        };
        self.publish(snapshot);
        if let Some(message) = failure {
            let _ = self.events.send(ClientEvent::ErrorNotification { message });
        }
    }

    fn publish(&self, snapshot: RequestState) {
        let _ = self.events.send(ClientEvent::RequestStateChanged(snapshot));
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One outstanding request.
#[must_use = "dropping the ticket immediately ends the request"]
pub struct RequestTicket<'a> {
    tracker: &'a RequestTracker,
    failure: Option<String>,
}

impl RequestTicket<'_> {
    /// Reports `message` globally when the ticket is released.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }
}

impl Drop for RequestTicket<'_> {
    fn drop(&mut self) {
        self.tracker.release(self.failure.take());
    }
}

#[cfg(test)]
#[path = "tests/request_tracker_tests.rs"]
mod tests;
