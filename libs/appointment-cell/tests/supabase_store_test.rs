use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::services::{AppointmentBookingService, AppointmentQueryService};
use appointment_cell::store::{AppointmentStore, Reference, StoreError, SupabaseAppointmentStore};
use appointment_cell::{Appointment, AppointmentError, DateRange, NewAppointment, PageRequest};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn nine_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn ten_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn moved_to_ten(id: i64) -> Appointment {
    Appointment { id, doctor_id: 1, animal_id: 2, appointment_date_time: ten_am() }
}

/// Mounts the reads `update_appointment` makes before writing: the record
/// exists and the target slot looks free.
async fn mount_update_preconditions(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(id, 1, 2, "2024-03-01T09:00:00")
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.1"))
        .and(query_param("appointment_date_time", "eq.2024-03-01T10:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

fn store_for(server: &MockServer) -> SupabaseAppointmentStore {
    SupabaseAppointmentStore::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

#[tokio::test]
async fn test_insert_posts_row_and_returns_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .and(header("apikey", "test-anon-key"))
        .and(body_json(json!({
            "doctor_id": 1,
            "animal_id": 2,
            "appointment_date_time": "2024-03-01T09:00:00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_row(11, 1, 2, "2024-03-01T09:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let created = store
        .insert(NewAppointment { doctor_id: 1, animal_id: 2, appointment_date_time: nine_am() })
        .await
        .unwrap();

    assert_eq!(created.id, 11);
    assert_eq!(created.appointment_date_time, nine_am());
}

#[tokio::test]
async fn test_unique_violation_becomes_slot_conflict() {
    let mock_server = MockServer::start().await;

    // Fast path sees nothing, the constraint catches the race
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.1"))
        .and(query_param("appointment_date_time", "eq.2024-03-01T09:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::unique_violation()))
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(Arc::new(store_for(&mock_server)));
    let result = booking
        .book_appointment(NewAppointment { doctor_id: 1, animal_id: 3, appointment_date_time: nine_am() })
        .await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { doctor_id: 1, .. }));
}

#[tokio::test]
async fn test_existing_slot_short_circuits_insert() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(4, 1, 2, "2024-03-01T09:00:00")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(Arc::new(store_for(&mock_server)));
    let result = booking
        .book_appointment(NewAppointment { doctor_id: 1, animal_id: 3, appointment_date_time: nine_am() })
        .await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { .. }));
}

#[tokio::test]
async fn test_foreign_key_violation_names_missing_animal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::foreign_key_violation("animal_id", 77, "animals"),
        ))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let result = store
        .insert(NewAppointment { doctor_id: 1, animal_id: 77, appointment_date_time: nine_am() })
        .await;

    assert_eq!(result, Err(StoreError::MissingReference(Reference::Animal(77))));
}

#[tokio::test]
async fn test_page_reads_total_from_content_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("order", "id.asc"))
        .and(query_param("limit", "7"))
        .and(query_param("offset", "7"))
        .and(header("Prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "7-9/10")
                .set_body_json(json!([
                    MockSupabaseResponses::appointment_row(8, 1, 1, "2024-03-01T15:00:00"),
                    MockSupabaseResponses::appointment_row(9, 1, 1, "2024-03-01T16:00:00"),
                    MockSupabaseResponses::appointment_row(10, 1, 1, "2024-03-01T17:00:00")
                ])),
        )
        .mount(&mock_server)
        .await;

    let queries = AppointmentQueryService::new(Arc::new(store_for(&mock_server)));
    let page = queries.list_appointments(PageRequest { page: 1, page_size: 7 }).await.unwrap();

    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total_elements, 10);
    assert_eq!(page.page_number, 1);
}

#[tokio::test]
async fn test_range_filter_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("animal_id", "eq.9"))
        .and(query_param("order", "appointment_date_time.asc,id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(2, 3, 9, "2024-01-05T10:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let queries = AppointmentQueryService::new(Arc::new(store_for(&mock_server)));
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap();

    let found = queries.appointments_by_date_and_animal(range, 9).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].doctor_id, 3);
}

#[tokio::test]
async fn test_delete_with_no_rows_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(Arc::new(store_for(&mock_server)));
    assert_matches!(booking.delete_appointment(5).await, Err(AppointmentError::NotFound(5)));
}

#[tokio::test]
async fn test_backend_failure_is_store_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    assert_matches!(store.get(1).await, Err(StoreError::Backend(_)));
    assert!(store.ping().await.is_err());
}

#[tokio::test]
async fn test_update_patches_row_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.5"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({
            "doctor_id": 1,
            "animal_id": 2,
            "appointment_date_time": "2024-03-01T10:00:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(5, 1, 2, "2024-03-01T10:00:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    let updated = store.update(moved_to_ten(5)).await.unwrap();

    assert_eq!(updated, Some(moved_to_ten(5)));
}

#[tokio::test]
async fn test_update_with_empty_representation_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server);
    assert_eq!(store.update(moved_to_ten(5)).await, Ok(None));
}

#[tokio::test]
async fn test_update_unique_violation_becomes_slot_conflict() {
    let mock_server = MockServer::start().await;
    mount_update_preconditions(&mock_server, 5).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::unique_violation()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(Arc::new(store_for(&mock_server)));
    let result = booking.update_appointment(moved_to_ten(5)).await;

    assert_matches!(result, Err(AppointmentError::SlotConflict { doctor_id: 1, .. }));
}

#[tokio::test]
async fn test_update_of_row_deleted_meanwhile_is_not_found() {
    let mock_server = MockServer::start().await;
    mount_update_preconditions(&mock_server, 5).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(Arc::new(store_for(&mock_server)));
    let result = booking.update_appointment(moved_to_ten(5)).await;

    assert_matches!(result, Err(AppointmentError::NotFound(5)));
}
