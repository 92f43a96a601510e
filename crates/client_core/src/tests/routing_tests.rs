use std::sync::Arc;

use storage::{MemorySessionStore, AUTH_TOKEN_KEY, USER_KEY};

use super::*;

async fn signed_in_store() -> Arc<MemorySessionStore> {
    let store = Arc::new(MemorySessionStore::new());
    store.set(AUTH_TOKEN_KEY, "token").await.expect("token");
    store
        .set(USER_KEY, r#"{"id":"u1","name":"Alex Harper"}"#)
        .await
        .expect("user");
    store
}

#[test]
fn parses_known_routes_and_detail_ids() {
    assert_eq!(Route::parse("/"), Route::Dashboard);
    assert_eq!(Route::parse("/dashboard/"), Route::Dashboard);
    assert_eq!(Route::parse("/login"), Route::Login);
    assert_eq!(
        Route::parse("/userdetails?userId=42"),
        Route::UserDetails {
            user_id: Some(UserId::new("42"))
        }
    );
    assert_eq!(
        Route::parse("/quizdetails?quizId=abc%20123"),
        Route::QuizDetails {
            quiz_id: Some(QuizId::new("abc 123"))
        }
    );
    assert_eq!(
        Route::parse("/users/Quiz-7"),
        Route::UserDetails {
            user_id: Some(UserId::new("Quiz-7"))
        }
    );
    assert_eq!(
        Route::parse("/userdetails"),
        Route::UserDetails { user_id: None }
    );
}

#[test]
fn unknown_paths_resolve_to_not_found() {
    assert_eq!(Route::parse("/settings"), Route::NotFound);
    assert_eq!(Route::parse("/users/1/extra"), Route::NotFound);
    assert_eq!(Route::parse("/404"), Route::NotFound);
}

#[test]
fn locations_round_trip_through_parse() {
    let routes = [
        Route::Dashboard,
        Route::Users,
        Route::UserDetails {
            user_id: Some(UserId::new("a&b")),
        },
        Route::Quizzes,
        Route::QuizDetails {
            quiz_id: Some(QuizId::new("quiz-1")),
        },
        Route::Assessments,
        Route::Resources,
        Route::Login,
    ];
    for route in routes {
        assert_eq!(Route::parse(&route.location()), route);
    }
}

#[tokio::test]
async fn protected_route_without_session_redirects_to_login() {
    let gate = AuthGate::new(Arc::new(MemorySessionStore::new()));
    let navigation = gate.check(Route::Users).await.expect("check");
    assert_eq!(
        navigation,
        Navigation::Redirect {
            to: Route::Login,
            from: Route::Users
        }
    );
}

#[tokio::test]
async fn token_without_user_is_not_a_session() {
    let store = Arc::new(MemorySessionStore::new());
    store.set(AUTH_TOKEN_KEY, "token").await.expect("token");
    let gate = AuthGate::new(store);
    assert!(matches!(
        gate.check(Route::Dashboard).await.expect("check"),
        Navigation::Redirect { .. }
    ));
}

#[tokio::test]
async fn public_routes_render_without_session() {
    let gate = AuthGate::new(Arc::new(MemorySessionStore::new()));
    assert_eq!(
        gate.check(Route::Login).await.expect("check"),
        Navigation::Render(Route::Login)
    );
    assert_eq!(
        gate.check(Route::NotFound).await.expect("check"),
        Navigation::Render(Route::NotFound)
    );
}

#[tokio::test]
async fn gate_re_reads_session_on_every_check() {
    let store = signed_in_store().await;
    let gate = AuthGate::new(store.clone());
    assert_eq!(
        gate.check(Route::Quizzes).await.expect("check"),
        Navigation::Render(Route::Quizzes)
    );

    session::clear(&*store).await.expect("sign out");
    assert!(matches!(
        gate.check(Route::Quizzes).await.expect("check"),
        Navigation::Redirect { .. }
    ));
}

#[tokio::test]
async fn navigator_returns_to_interrupted_route_after_login() {
    let store = Arc::new(MemorySessionStore::new());
    let mut navigator = Navigator::new(AuthGate::new(store.clone()));

    let current = navigator
        .navigate("/userdetails?userId=9")
        .await
        .expect("navigate")
        .clone();
    assert_eq!(current, Route::Login);
    assert_eq!(
        navigator.return_to(),
        Some(&Route::UserDetails {
            user_id: Some(UserId::new("9"))
        })
    );

    store.set(AUTH_TOKEN_KEY, "token").await.expect("token");
    store.set(USER_KEY, r#"{"id":"u1"}"#).await.expect("user");

    let resumed = navigator.complete_login().await.expect("login").clone();
    assert_eq!(
        resumed,
        Route::UserDetails {
            user_id: Some(UserId::new("9"))
        }
    );
    assert!(navigator.return_to().is_none());
}

#[tokio::test]
async fn navigator_defaults_to_dashboard_after_login() {
    let store = signed_in_store().await;
    let mut navigator = Navigator::new(AuthGate::new(store));
    let route = navigator.complete_login().await.expect("login").clone();
    assert_eq!(route, Route::Dashboard);
}
