// libs/appointment-cell/src/router.rs
use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppointmentState;

/// Routes mounted under `/v1/appointments`.
pub fn appointment_routes(state: AppointmentState) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::book_appointment)
                .get(handlers::list_appointments)
                .put(handlers::update_appointment),
        )
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).delete(handlers::delete_appointment),
        )
        .route("/filter/dateANDdoctor/appointments", get(handlers::get_appointments_by_date_and_doctor))
        .route("/filter/dateANDanimal/appointments", get(handlers::get_appointments_by_date_and_animal))
        .with_state(state)
}

/// Store reachability probe, mounted at the service root.
pub fn health_routes(state: AppointmentState) -> Router {
    Router::new()
        .route("/health", get(handlers::store_health))
        .with_state(state)
}
