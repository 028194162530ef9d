// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use shared_utils::extractor::Validate;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A stored appointment. Field names follow the `appointments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub animal_id: i64,
    pub appointment_date_time: NaiveDateTime,
}

impl Appointment {
    pub fn from_new(id: i64, new: NewAppointment) -> Self {
        Self {
            id,
            doctor_id: new.doctor_id,
            animal_id: new.animal_id,
            appointment_date_time: new.appointment_date_time,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.appointment_date_time.date()
    }
}

/// An appointment that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub animal_id: i64,
    pub appointment_date_time: NaiveDateTime,
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppointmentError> {
        if start > end {
            return Err(AppointmentError::Validation(vec![
                "startDate must not be after endDate".to_string(),
            ]));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Doctor(i64),
    Animal(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter {
    pub range: DateRange,
    pub subject: Option<Subject>,
}

impl RangeFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        let subject_matches = match self.subject {
            Some(Subject::Doctor(id)) => appointment.doctor_id == id,
            Some(Subject::Animal(id)) => appointment.animal_id == id,
            None => true,
        };
        subject_matches && self.range.contains(appointment.date())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: i64,
    pub doctor_id: i64,
    pub animal_id: i64,
    pub appointment_date_time: NaiveDateTime,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            doctor_id: appointment.doctor_id,
            animal_id: appointment.animal_id,
            appointment_date_time: appointment.appointment_date_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<i64>,
    pub animal_id: Option<i64>,
    pub appointment_date_time: Option<NaiveDateTime>,
}

impl Validate for BookAppointmentRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        require_id(&mut errors, "doctorId", self.doctor_id);
        require_id(&mut errors, "animalId", self.animal_id);
        if self.appointment_date_time.is_none() {
            errors.push("appointmentDateTime is required".to_string());
        }
        into_result(errors)
    }
}

impl TryFrom<BookAppointmentRequest> for NewAppointment {
    type Error = AppointmentError;

    fn try_from(request: BookAppointmentRequest) -> Result<Self, Self::Error> {
        request.validate().map_err(AppointmentError::Validation)?;
        match (request.doctor_id, request.animal_id, request.appointment_date_time) {
            (Some(doctor_id), Some(animal_id), Some(appointment_date_time)) => Ok(NewAppointment {
                doctor_id,
                animal_id,
                appointment_date_time,
            }),
            _ => Err(AppointmentError::Validation(vec!["incomplete appointment".to_string()])),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub animal_id: Option<i64>,
    pub appointment_date_time: Option<NaiveDateTime>,
}

impl Validate for UpdateAppointmentRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        require_id(&mut errors, "id", self.id);
        require_id(&mut errors, "doctorId", self.doctor_id);
        require_id(&mut errors, "animalId", self.animal_id);
        if self.appointment_date_time.is_none() {
            errors.push("appointmentDateTime is required".to_string());
        }
        into_result(errors)
    }
}

impl TryFrom<UpdateAppointmentRequest> for Appointment {
    type Error = AppointmentError;

    fn try_from(request: UpdateAppointmentRequest) -> Result<Self, Self::Error> {
        request.validate().map_err(AppointmentError::Validation)?;
        match (request.id, request.doctor_id, request.animal_id, request.appointment_date_time) {
            (Some(id), Some(doctor_id), Some(animal_id), Some(appointment_date_time)) => Ok(Appointment {
                id,
                doctor_id,
                animal_id,
                appointment_date_time,
            }),
            _ => Err(AppointmentError::Validation(vec!["incomplete appointment".to_string()])),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Validate for PageQuery {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(page) = self.page {
            if page < 0 {
                errors.push("page must be zero or greater".to_string());
            } else if u32::try_from(page).is_err() {
                errors.push("page is out of range".to_string());
            }
        }
        if let Some(page_size) = self.page_size {
            if page_size <= 0 {
                errors.push("pageSize must be greater than zero".to_string());
            } else if u32::try_from(page_size).is_err() {
                errors.push("pageSize is out of range".to_string());
            }
        }
        into_result(errors)
    }
}

impl PageQuery {
    /// Resolves missing values against the defaults. Out-of-range values
    /// fall back too; `validate` reports them first.
    pub fn resolve(&self, default_page_size: u32) -> PageRequest {
        let page = self.page.and_then(|p| u32::try_from(p).ok()).unwrap_or(0);
        let page_size = self
            .page_size
            .and_then(|s| u32::try_from(s).ok())
            .filter(|s| *s > 0)
            .unwrap_or(default_page_size.max(1));
        PageRequest { page, page_size }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub doctor_id: Option<i64>,
}

impl Validate for DoctorRangeQuery {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = validate_dates(self.start_date, self.end_date);
        if let Some(doctor_id) = self.doctor_id {
            if doctor_id <= 0 {
                errors.push("doctorId must be a positive number".to_string());
            }
        }
        into_result(errors)
    }
}

impl DoctorRangeQuery {
    pub fn range(&self) -> Result<DateRange, AppointmentError> {
        range_of(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub animal_id: Option<i64>,
}

impl Validate for AnimalRangeQuery {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = validate_dates(self.start_date, self.end_date);
        require_id(&mut errors, "animalId", self.animal_id);
        into_result(errors)
    }
}

impl AnimalRangeQuery {
    pub fn range(&self) -> Result<DateRange, AppointmentError> {
        range_of(self.start_date, self.end_date)
    }

    pub fn animal(&self) -> Result<i64, AppointmentError> {
        self.animal_id
            .ok_or_else(|| AppointmentError::Validation(vec!["animalId is required".to_string()]))
    }
}

fn require_id(errors: &mut Vec<String>, field: &str, value: Option<i64>) {
    match value {
        None => errors.push(format!("{} is required", field)),
        Some(id) if id <= 0 => errors.push(format!("{} must be a positive number", field)),
        Some(_) => {}
    }
}

fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<String> {
    let mut errors = Vec::new();
    if start.is_none() {
        errors.push("startDate is required".to_string());
    }
    if end.is_none() {
        errors.push("endDate is required".to_string());
    }
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push("startDate must not be after endDate".to_string());
        }
    }
    errors
}

fn range_of(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange, AppointmentError> {
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        _ => Err(AppointmentError::Validation(validate_dates(start, end))),
    }
}

fn into_result(errors: Vec<String>) -> Result<(), Vec<String>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointments may only be booked on the hour (got {0})")]
    InvalidSlot(NaiveDateTime),

    #[error("Doctor {doctor_id} already has an appointment at {date_time}")]
    SlotConflict { doctor_id: i64, date_time: NaiveDateTime },

    #[error("Appointment {0} not found")]
    NotFound(i64),

    #[error("No appointments found for the given filter")]
    NoMatches,

    #[error("Doctor {0} not found")]
    DoctorNotFound(i64),

    #[error("Animal {0} not found")]
    AnimalNotFound(i64),

    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Store error: {0}")]
    Store(String),
}
