// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use shared_models::error::AppError;
use shared_models::response::{ApiResponse, CursorResponse};
use shared_utils::extractor::{ValidatedJson, ValidatedPath, ValidatedQuery};

use crate::models::{
    Appointment, AppointmentResponse, AnimalRangeQuery, BookAppointmentRequest, DoctorRangeQuery,
    NewAppointment, PageQuery, UpdateAppointmentRequest,
};
use crate::state::AppointmentState;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    ValidatedJson(request): ValidatedJson<BookAppointmentRequest>,
) -> Result<ApiResponse<AppointmentResponse>, AppError> {
    let new = NewAppointment::try_from(request)?;
    let appointment = state.booking().book_appointment(new).await?;

    Ok(ApiResponse::created(appointment.into()))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    ValidatedPath(appointment_id): ValidatedPath<i64>,
) -> Result<ApiResponse<AppointmentResponse>, AppError> {
    let appointment = state.queries().get_appointment(appointment_id).await?;

    Ok(ApiResponse::success(appointment.into()))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<ApiResponse<CursorResponse<AppointmentResponse>>, AppError> {
    let request = query.resolve(state.config.default_page_size);
    let page = state.queries().list_appointments(request).await?;

    Ok(ApiResponse::success(page.map(AppointmentResponse::from)))
}

#[axum::debug_handler]
pub async fn get_appointments_by_date_and_doctor(
    State(state): State<AppointmentState>,
    ValidatedQuery(query): ValidatedQuery<DoctorRangeQuery>,
) -> Result<ApiResponse<Vec<AppointmentResponse>>, AppError> {
    let appointments = state
        .queries()
        .appointments_by_date_and_doctor(query.range()?, query.doctor_id)
        .await?;

    Ok(ApiResponse::success(to_responses(appointments)))
}

#[axum::debug_handler]
pub async fn get_appointments_by_date_and_animal(
    State(state): State<AppointmentState>,
    ValidatedQuery(query): ValidatedQuery<AnimalRangeQuery>,
) -> Result<ApiResponse<Vec<AppointmentResponse>>, AppError> {
    let appointments = state
        .queries()
        .appointments_by_date_and_animal(query.range()?, query.animal()?)
        .await?;

    Ok(ApiResponse::success(to_responses(appointments)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    ValidatedJson(request): ValidatedJson<UpdateAppointmentRequest>,
) -> Result<ApiResponse<AppointmentResponse>, AppError> {
    let appointment = Appointment::try_from(request)?;
    let updated = state.booking().update_appointment(appointment).await?;

    Ok(ApiResponse::success(updated.into()))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppointmentState>,
    ValidatedPath(appointment_id): ValidatedPath<i64>,
) -> Result<ApiResponse<()>, AppError> {
    state.booking().delete_appointment(appointment_id).await?;

    Ok(ApiResponse::ok())
}

/// Reports whether the appointment store answers.
#[axum::debug_handler]
pub async fn store_health(
    State(state): State<AppointmentState>,
) -> (StatusCode, Json<Value>) {
    let backend = state.store.backend_name();

    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({
            "status": "ok",
            "store": backend
        }))),
        Err(e) => {
            error!("Appointment store unreachable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({
                "status": "unavailable",
                "store": backend
            })))
        }
    }
}

fn to_responses(appointments: Vec<Appointment>) -> Vec<AppointmentResponse> {
    appointments.into_iter().map(AppointmentResponse::from).collect()
}
