use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{Appointment, AppointmentError, NewAppointment, PageRequest, RangeFilter};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Doctor(i64),
    Animal(i64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The `(doctor, date-time)` uniqueness guard rejected the write.
    #[error("doctor {doctor_id} already has an appointment at {date_time}")]
    Conflict { doctor_id: i64, date_time: NaiveDateTime },

    #[error("referenced record does not exist: {0:?}")]
    MissingReference(Reference),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { doctor_id, date_time } => {
                AppointmentError::SlotConflict { doctor_id, date_time }
            }
            StoreError::MissingReference(Reference::Doctor(id)) => AppointmentError::DoctorNotFound(id),
            StoreError::MissingReference(Reference::Animal(id)) => AppointmentError::AnimalNotFound(id),
            StoreError::Backend(msg) => AppointmentError::Store(msg),
        }
    }
}

/// Durable storage for appointments.
///
/// Implementations must enforce uniqueness of `(doctor_id, appointment_date_time)`
/// atomically with `insert` and `update`, reporting violations as
/// [`StoreError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    /// Replaces the stored record with the same id. `None` when it does not exist.
    async fn update(&self, appointment: Appointment) -> Result<Option<Appointment>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Appointment>, StoreError>;

    async fn find_by_doctor_at(
        &self,
        doctor_id: i64,
        date_time: NaiveDateTime,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Matches ordered by date-time, then id.
    async fn find_in_range(&self, filter: RangeFilter) -> Result<Vec<Appointment>, StoreError>;

    /// One page ordered by id, plus the total number of appointments.
    async fn page(&self, request: PageRequest) -> Result<(Vec<Appointment>, u64), StoreError>;

    /// `false` when nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
