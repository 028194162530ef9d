use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, NewAppointment, PageRequest, RangeFilter, Subject};
use crate::store::{AppointmentStore, Reference, StoreError};

const APPOINTMENTS_PATH: &str = "/rest/v1/appointments";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Appointments kept in the `appointments` table behind PostgREST.
///
/// The table's `unique (doctor_id, appointment_date_time)` constraint is the
/// authoritative double-booking guard; foreign keys to `doctors` and
/// `animals` check the references.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
    auth_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: config.store_token().to_string(),
        }
    }

    fn token(&self) -> Option<&str> {
        if self.auth_token.is_empty() {
            None
        } else {
            Some(&self.auth_token)
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, StoreError> {
        self.supabase
            .request(Method::GET, path, self.token(), None)
            .await
            .map_err(backend)
    }

    async fn write(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Appointment>, DatabaseError> {
        self.supabase
            .request_with_headers(method, path, self.token(), body, Some(return_representation()))
            .await
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn encode_timestamp(date_time: &NaiveDateTime) -> String {
    urlencoding::encode(&date_time.format(TIMESTAMP_FORMAT).to_string()).into_owned()
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

fn backend(err: DatabaseError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Translates constraint violations raised by a write of `doctor_id`/`animal_id`
/// at `date_time`.
fn classify_write_error(err: DatabaseError, doctor_id: i64, animal_id: i64, date_time: NaiveDateTime) -> StoreError {
    if err.is_unique_violation() {
        return StoreError::Conflict { doctor_id, date_time };
    }
    if err.is_foreign_key_violation() {
        let details = err.constraint_details().unwrap_or_default();
        let reference = if details.contains("animal_id") {
            Reference::Animal(animal_id)
        } else {
            Reference::Doctor(doctor_id)
        };
        return StoreError::MissingReference(reference);
    }
    backend(err)
}

pub fn range_query(filter: &RangeFilter) -> String {
    let mut query_parts = vec![format!(
        "appointment_date_time=gte.{}",
        encode_timestamp(&start_of(filter.range.start))
    )];

    match filter.range.end.succ_opt() {
        Some(next_day) => query_parts.push(format!(
            "appointment_date_time=lt.{}",
            encode_timestamp(&start_of(next_day))
        )),
        None => query_parts.push(format!(
            "appointment_date_time=lte.{}",
            encode_timestamp(&filter.range.end.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of(filter.range.end)))
        )),
    }

    match filter.subject {
        Some(Subject::Doctor(id)) => query_parts.push(format!("doctor_id=eq.{}", id)),
        Some(Subject::Animal(id)) => query_parts.push(format!("animal_id=eq.{}", id)),
        None => {}
    }

    query_parts.push("order=appointment_date_time.asc,id.asc".to_string());
    query_parts.join("&")
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        debug!("Inserting appointment for doctor {} at {}", new.doctor_id, new.appointment_date_time);

        let body = json!({
            "doctor_id": new.doctor_id,
            "animal_id": new.animal_id,
            "appointment_date_time": new.appointment_date_time.format(TIMESTAMP_FORMAT).to_string(),
        });

        let created = self
            .write(Method::POST, APPOINTMENTS_PATH, Some(body))
            .await
            .map_err(|e| classify_write_error(e, new.doctor_id, new.animal_id, new.appointment_date_time))?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Failed to create appointment".to_string()))
    }

    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>, StoreError> {
        debug!("Updating appointment {}", appointment.id);

        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, appointment.id);
        let body = json!({
            "doctor_id": appointment.doctor_id,
            "animal_id": appointment.animal_id,
            "appointment_date_time": appointment.appointment_date_time.format(TIMESTAMP_FORMAT).to_string(),
        });

        let updated = self
            .write(Method::PATCH, &path, Some(body))
            .await
            .map_err(|e| {
                classify_write_error(e, appointment.doctor_id, appointment.animal_id, appointment.appointment_date_time)
            })?;

        Ok(updated.into_iter().next())
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>, StoreError> {
        debug!("Fetching appointment: {}", id);
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn find_by_doctor_at(
        &self,
        doctor_id: i64,
        date_time: NaiveDateTime,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!(
            "{}?doctor_id=eq.{}&appointment_date_time=eq.{}&limit=1",
            APPOINTMENTS_PATH,
            doctor_id,
            encode_timestamp(&date_time)
        );
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn find_in_range(&self, filter: RangeFilter) -> Result<Vec<Appointment>, StoreError> {
        debug!("Searching appointments with filter: {:?}", filter);
        let path = format!("{}?{}", APPOINTMENTS_PATH, range_query(&filter));
        self.fetch(&path).await
    }

    async fn page(&self, request: PageRequest) -> Result<(Vec<Appointment>, u64), StoreError> {
        let offset = request.offset();
        let path = format!(
            "{}?order=id.asc&limit={}&offset={}",
            APPOINTMENTS_PATH, request.page_size, offset
        );

        let (items, total): (Vec<Appointment>, Option<u64>) = self
            .supabase
            .request_with_count(&path, self.token())
            .await
            .map_err(backend)?;

        // Without a count header the page itself is the best lower bound
        let total = total.unwrap_or(offset + items.len() as u64);
        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        debug!("Deleting appointment: {}", id);
        let path = format!("{}?id=eq.{}", APPOINTMENTS_PATH, id);
        let deleted = self.write(Method::DELETE, &path, None).await.map_err(backend)?;
        Ok(!deleted.is_empty())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let path = format!("{}?select=id&limit=1", APPOINTMENTS_PATH);
        let _: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, self.token(), None)
            .await
            .map_err(backend)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
