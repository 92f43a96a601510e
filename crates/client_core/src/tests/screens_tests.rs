use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use shared::domain::Resource;
use tokio::sync::oneshot;

use super::*;
use crate::catalog::CATEGORY_FILTER;

fn resource(id: &str, category: &str, date: &str) -> Resource {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": format!("Resource {id}"),
        "category": category,
        "date": date,
        "status": "Active",
    }))
    .expect("resource")
}

fn catalog() -> Vec<Resource> {
    vec![
        resource("r1", "Documents", "2024-01-15"),
        resource("r2", "Videos", "2024-01-10"),
        resource("r3", "Guides", "2024-01-08"),
        resource("r4", "Links", "2024-01-05"),
        resource("r5", "Documents", "2023-12-20"),
        resource("r6", "Videos", "2023-12-15"),
        resource("r7", "Guides", "2023-12-10"),
    ]
}

fn ids(view: &ListView<Resource>) -> Vec<&str> {
    view.records.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn refresh_populates_a_live_screen() {
    let screen = ListScreen::<Resource>::handle(5);
    assert_eq!(*screen.lock().await.status(), ScreenStatus::Loading);

    let applied = refresh(&Arc::downgrade(&screen), async { Ok(catalog()) }).await;
    assert!(applied);

    let guard = screen.lock().await;
    assert_eq!(*guard.status(), ScreenStatus::Ready);
    let view = guard.view();
    assert_eq!(ids(&view), vec!["r1", "r2", "r3", "r4", "r5"]);
    assert_eq!(view.total_pages, 2);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_records() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    refresh(&weak, async { Ok(catalog()) }).await;

    refresh(&weak, async {
        Err(ClientError::Server {
            status: 500,
            message: None,
        })
    })
    .await;

    let guard = screen.lock().await;
    assert_eq!(
        *guard.status(),
        ScreenStatus::Failed(crate::GENERIC_ERROR_MESSAGE.to_string())
    );
    assert_eq!(guard.records().len(), 7);
}

#[tokio::test]
async fn late_result_for_closed_screen_is_discarded() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    let (release, pending) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        refresh(&weak, async move {
            let _ = pending.await;
            Ok(catalog())
        })
        .await
    });

    tokio::task::yield_now().await;
    drop(screen);
    let _ = release.send(());

    assert!(!task.await.expect("join"));
}

#[tokio::test]
async fn query_changes_reset_page_and_refetch_clamps_it() {
    let screen = ListScreen::<Resource>::handle(2);
    let weak = Arc::downgrade(&screen);
    refresh(&weak, async { Ok(catalog()) }).await;

    {
        let mut guard = screen.lock().await;
        assert!(guard.go_to_page(4));
        assert!(!guard.go_to_page(5));
        assert_eq!(guard.view().page, 4);

        guard.set_search_term("resource");
        assert_eq!(guard.query().page(), 1);
        assert!(guard.go_to_page(3));
    }

    refresh(&weak, async { Ok(catalog().into_iter().take(3).collect()) }).await;

    let mut guard = screen.lock().await;
    assert_eq!(guard.query().page(), 2);
    assert_eq!(ids(&guard.view()), vec!["r3"]);

    guard.set_filter(CATEGORY_FILTER, FilterSelection::parse("Videos"));
    guard.set_sort_direction(SortDirection::Ascending);
    assert_eq!(guard.query().page(), 1);
    assert_eq!(ids(&guard.view()), vec!["r2"]);
}

#[tokio::test]
async fn show_page_lands_on_nearest_page_in_range() {
    let screen = ListScreen::<Resource>::handle(5);
    refresh(&Arc::downgrade(&screen), async { Ok(catalog()) }).await;

    let mut guard = screen.lock().await;
    assert_eq!(guard.show_page(9), 2);
    assert_eq!(guard.view().page, 2);
    assert_eq!(guard.show_page(0), 1);
    assert_eq!(guard.show_page(2), 2);
}

#[tokio::test]
async fn successful_mutation_sets_notice_and_refetches() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    let fetches = Arc::new(AtomicUsize::new(0));

    let counter = fetches.clone();
    let outcome = run_mutation(
        &weak,
        async { Ok::<_, ClientError>(()) },
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(catalog())
        },
        "Resource created",
    )
    .await;

    assert_eq!(outcome, MutationOutcome::Completed);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    let guard = screen.lock().await;
    assert_eq!(
        guard.notice(),
        Some(&MutationNotice::Success("Resource created".to_string()))
    );
    assert!(!guard.is_mutating());
    assert_eq!(guard.records().len(), 7);
}

#[tokio::test]
async fn server_rejection_stays_local_and_still_refetches() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    let fetches = Arc::new(AtomicUsize::new(0));

    let counter = fetches.clone();
    let outcome = run_mutation(
        &weak,
        async {
            Err::<(), _>(ClientError::Server {
                status: 409,
                message: Some("Title already exists".to_string()),
            })
        },
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(catalog())
        },
        "Resource created",
    )
    .await;

    assert_eq!(
        outcome,
        MutationOutcome::Failed("Title already exists".to_string())
    );
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(
        screen.lock().await.notice(),
        Some(&MutationNotice::Failure("Title already exists".to_string()))
    );
}

#[tokio::test]
async fn validation_failure_skips_refetch() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    let fetches = Arc::new(AtomicUsize::new(0));

    let counter = fetches.clone();
    let outcome = run_mutation(
        &weak,
        async { Err::<(), _>(ClientError::Validation("Resource title is required.".into())) },
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        },
        "Resource created",
    )
    .await;

    assert_eq!(
        outcome,
        MutationOutcome::Failed("Resource title is required.".to_string())
    );
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_submit_is_suppressed_while_first_is_outstanding() {
    let screen = ListScreen::<Resource>::handle(5);
    let weak = Arc::downgrade(&screen);
    let (release, pending) = oneshot::channel::<()>();

    let first_weak = weak.clone();
    let first = tokio::spawn(async move {
        run_mutation(
            &first_weak,
            async move {
                let _ = pending.await;
                Ok::<_, ClientError>(())
            },
            || async { Ok(catalog()) },
            "Quiz deleted",
        )
        .await
    });

    while !screen.lock().await.is_mutating() {
        tokio::task::yield_now().await;
    }

    let second = run_mutation(
        &weak,
        async { Ok::<_, ClientError>(()) },
        || async { Ok(Vec::new()) },
        "Quiz deleted",
    )
    .await;
    assert_eq!(second, MutationOutcome::Suppressed);

    let _ = release.send(());
    assert_eq!(first.await.expect("join"), MutationOutcome::Completed);
    assert!(!screen.lock().await.is_mutating());
}
