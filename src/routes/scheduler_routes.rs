use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::repositories::booking_repository::SweepSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_scheduler_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(scheduler_status))
        .route("/start", post(start_scheduler))
        .route("/stop", post(stop_scheduler))
        .route("/run-check", post(run_check))
}

async fn scheduler_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let running = state.scheduler.is_running().await;
    let next_check = state.scheduler.next_check_time().await;

    Json(json!({
        "running": running,
        "next_check": next_check.map(|t| t.to_rfc3339()),
    }))
}

async fn start_scheduler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.scheduler.start().await;
    Json(json!({
        "success": true,
        "message": "Scheduler arrancado",
        "running": true
    }))
}

async fn stop_scheduler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.scheduler.stop().await;
    Json(json!({
        "success": true,
        "message": "Scheduler parado",
        "running": false
    }))
}

/// Sweep manual: ejecuta una pasada del sweeper y devuelve el resumen
async fn run_check(State(state): State<AppState>) -> Result<Json<SweepSummary>, AppError> {
    let summary = state.scheduler.run_sweep_now().await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::database::DatabaseConfig;
    use crate::config::environment::EnvironmentConfig;
    use crate::services::booking_scheduler::BookingScheduler;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    // Estado de test con pool perezoso: el ciclo de vida del scheduler no
    // toca la base de datos
    fn test_state() -> AppState {
        let pool =
            DatabaseConfig::create_test_pool("postgres://postgres@localhost/car_rental_test")
                .unwrap();
        let config = EnvironmentConfig {
            environment: "test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            scheduler_interval_secs: 3600,
        };
        let scheduler = Arc::new(BookingScheduler::new(
            pool.clone(),
            Duration::from_secs(3600),
        ));
        AppState::new(pool, config, scheduler)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_stopped_scheduler() {
        let app = create_scheduler_router().with_state(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["running"], false);
        assert_eq!(body["next_check"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_start_then_stop_via_http() {
        let state = test_state();

        let start = create_scheduler_router()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(start.status(), StatusCode::OK);
        assert!(state.scheduler.is_running().await);

        let status = create_scheduler_router()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(status).await;
        assert_eq!(body["running"], true);
        assert!(body["next_check"].is_string());

        let stop = create_scheduler_router()
            .with_state(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/stop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(stop.status(), StatusCode::OK);
        assert!(!state.scheduler.is_running().await);
    }
}
