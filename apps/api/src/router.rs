use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
use appointment_cell::{appointment_routes, health_routes, AppointmentState};
use shared_config::AppConfig;
use tracing::info;

/// Picks the Supabase store when it is configured, the in-memory one otherwise.
pub fn create_store(config: &AppConfig) -> Arc<dyn AppointmentStore> {
    if config.is_configured() {
        info!("Using Supabase appointment store at {}", config.supabase_url);
        Arc::new(SupabaseAppointmentStore::new(config))
    } else {
        info!("Using in-memory appointment store");
        Arc::new(InMemoryAppointmentStore::new())
    }
}

pub fn create_router(config: Arc<AppConfig>, store: Arc<dyn AppointmentStore>) -> Router {
    let state = AppointmentState::new(config, store);

    Router::new()
        .route("/", get(|| async { "Veterinary Clinic API is running!" }))
        .merge(health_routes(state.clone()))
        .nest("/v1/appointments", appointment_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Arc::new(AppConfig::default());
        let store = create_store(&config);
        create_router(config, store)
    }

    #[tokio::test]
    async fn test_root_is_alive() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_memory_store_when_unconfigured() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["store"], "memory");
    }

    #[tokio::test]
    async fn test_appointments_are_nested_under_v1() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/appointments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
