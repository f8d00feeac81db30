//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;
use synth_pipeline::testing::{FakeStore, ScriptedGenerator};

fn state_with_pool(pool: PgPool) -> synth_api::state::AppState {
    common::test_state(
        pool,
        Arc::new(FakeStore::new()),
        Arc::new(ScriptedGenerator::new()),
    )
}

#[tokio::test]
async fn unreachable_database_reports_degraded() {
    let app = common::build_test_app(state_with_pool(common::unreachable_pool()));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["active_runs"], 0);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(state_with_pool(common::unreachable_pool()));
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn health_check_returns_ok_with_database(pool: PgPool) {
    let app = common::build_test_app(state_with_pool(pool));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}
