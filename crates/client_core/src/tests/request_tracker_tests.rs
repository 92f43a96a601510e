use std::sync::Arc;

use tokio::sync::oneshot;

use super::*;
use crate::error::GENERIC_ERROR_MESSAGE;

fn server_error(message: Option<&str>) -> ClientError {
    ClientError::Server {
        status: 400,
        message: message.map(str::to_string),
    }
}

async fn wait_for_in_flight(tracker: &RequestTracker, expected: usize) {
    while tracker.in_flight() != expected {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn successful_request_toggles_loading_and_leaves_error_clear() {
    let tracker = RequestTracker::new();
    let value = tracker
        .track(ErrorReporting::Global, async { Ok::<_, ClientError>(7) })
        .await
        .expect("request");
    assert_eq!(value, 7);
    assert_eq!(tracker.state(), RequestState::default());
}

#[tokio::test]
async fn global_failure_uses_server_message_and_notifies() {
    let tracker = RequestTracker::new();
    let mut events = tracker.subscribe();

    let err = tracker
        .track(ErrorReporting::Global, async {
            Err::<(), _>(server_error(Some("Quiz not found")))
        })
        .await
        .expect_err("request should fail");
    assert!(matches!(err, ClientError::Server { status: 400, .. }));

    let state = tracker.state();
    assert!(!state.is_loading);
    assert!(state.is_error);
    assert_eq!(state.error_message, "Quiz not found");

    let mut notified = None;
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::ErrorNotification { message } = event {
            notified = Some(message);
        }
    }
    assert_eq!(notified.as_deref(), Some("Quiz not found"));
}

#[tokio::test]
async fn global_failure_settles_in_one_state_change() {
    let tracker = RequestTracker::new();
    let mut events = tracker.subscribe();

    let _ = tracker
        .track(ErrorReporting::Global, async {
            Err::<(), _>(server_error(Some("Title already exists")))
        })
        .await;

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::RequestStateChanged(state) = event {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![
            RequestState {
                is_loading: true,
                is_error: false,
                error_message: String::new(),
            },
            RequestState {
                is_loading: false,
                is_error: true,
                error_message: "Title already exists".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn global_failure_without_message_uses_generic_fallback() {
    let tracker = RequestTracker::new();
    let _ = tracker
        .track(ErrorReporting::Global, async {
            Err::<(), _>(server_error(None))
        })
        .await;
    assert_eq!(tracker.state().error_message, GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn skip_global_failure_propagates_without_touching_error_state() {
    let tracker = RequestTracker::new();
    let mut events = tracker.subscribe();

    let err = tracker
        .track(ErrorReporting::SkipGlobal, async {
            Err::<(), _>(server_error(Some("Title already exists")))
        })
        .await
        .expect_err("request should fail");
    assert_eq!(err.user_message(), "Title already exists");

    let state = tracker.state();
    assert!(!state.is_loading);
    assert!(!state.is_error);
    assert!(state.error_message.is_empty());
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, ClientEvent::ErrorNotification { .. }));
    }
}

#[tokio::test]
async fn dispatch_clears_previous_error() {
    let tracker = RequestTracker::new();
    let _ = tracker
        .track(ErrorReporting::Global, async {
            Err::<(), _>(server_error(Some("boom")))
        })
        .await;
    assert!(tracker.state().is_error);

    let ticket = tracker.begin();
    let state = tracker.state();
    assert!(state.is_loading);
    assert!(!state.is_error);
    assert!(state.error_message.is_empty());
    drop(ticket);
    assert!(!tracker.state().is_loading);
}

#[tokio::test]
async fn loading_stays_up_until_last_concurrent_request_finishes() {
    let tracker = Arc::new(RequestTracker::new());
    let (first_tx, first_rx) = oneshot::channel::<()>();
    let (second_tx, second_rx) = oneshot::channel::<()>();

    let first = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            tracker
                .track(ErrorReporting::Global, async {
                    let _ = first_rx.await;
                    Ok::<_, ClientError>("first")
                })
                .await
        })
    };
    let second = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            tracker
                .track(ErrorReporting::Global, async {
                    let _ = second_rx.await;
                    Ok::<_, ClientError>("second")
                })
                .await
        })
    };

    wait_for_in_flight(&tracker, 2).await;

    second_tx.send(()).expect("release second");
    assert_eq!(second.await.expect("join").expect("second"), "second");
    assert_eq!(tracker.in_flight(), 1);
    assert!(tracker.state().is_loading);

    first_tx.send(()).expect("release first");
    assert_eq!(first.await.expect("join").expect("first"), "first");
    assert_eq!(tracker.in_flight(), 0);
    assert!(!tracker.state().is_loading);
}

#[tokio::test]
async fn abandoned_request_releases_its_count() {
    let tracker = Arc::new(RequestTracker::new());
    let (_never_tx, never_rx) = oneshot::channel::<()>();

    let pending = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move {
            tracker
                .track(ErrorReporting::Global, async {
                    let _ = never_rx.await;
                    Ok::<_, ClientError>(())
                })
                .await
        })
    };

    wait_for_in_flight(&tracker, 1).await;
    pending.abort();
    let _ = pending.await;

    assert_eq!(tracker.in_flight(), 0);
    assert!(!tracker.state().is_loading);
}

#[tokio::test]
async fn dismiss_error_keeps_loading_count() {
    let tracker = RequestTracker::new();
    let _ = tracker
        .track(ErrorReporting::Global, async {
            Err::<(), _>(server_error(Some("boom")))
        })
        .await;
    let ticket = tracker.begin();
    tracker.dismiss_error();
    assert!(tracker.state().is_loading);
    drop(ticket);
}
