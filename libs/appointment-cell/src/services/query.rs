use std::sync::Arc;

use tracing::debug;

use shared_models::response::CursorResponse;

use crate::models::{Appointment, AppointmentError, DateRange, PageRequest, RangeFilter, Subject};
use crate::store::AppointmentStore;

/// Read side of the appointment book.
pub struct AppointmentQueryService {
    store: Arc<dyn AppointmentStore>,
    empty_filter_is_not_found: bool,
}

impl AppointmentQueryService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            store,
            empty_filter_is_not_found: false,
        }
    }

    /// Makes date-range filters answer [`AppointmentError::NoMatches`] instead
    /// of an empty list.
    pub fn with_empty_filter_as_not_found(mut self, enabled: bool) -> Self {
        self.empty_filter_is_not_found = enabled;
        self
    }

    pub async fn get_appointment(&self, id: i64) -> Result<Appointment, AppointmentError> {
        self.store
            .get(id)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }

    pub async fn list_appointments(&self, request: PageRequest) -> Result<CursorResponse<Appointment>, AppointmentError> {
        debug!("Listing appointments page {} (size {})", request.page, request.page_size);

        let (items, total_elements) = self.store.page(request).await?;
        Ok(CursorResponse {
            items,
            page_number: request.page,
            page_size: request.page_size,
            total_elements,
        })
    }

    /// Appointments whose date falls in `range`, for one doctor or all of them.
    pub async fn appointments_by_date_and_doctor(
        &self,
        range: DateRange,
        doctor_id: Option<i64>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.filter(RangeFilter {
            range,
            subject: doctor_id.map(Subject::Doctor),
        })
        .await
    }

    pub async fn appointments_by_date_and_animal(
        &self,
        range: DateRange,
        animal_id: i64,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.filter(RangeFilter {
            range,
            subject: Some(Subject::Animal(animal_id)),
        })
        .await
    }

    async fn filter(&self, filter: RangeFilter) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Filtering appointments: {:?}", filter);

        let appointments = self.store.find_in_range(filter).await?;
        if appointments.is_empty() && self.empty_filter_is_not_found {
            return Err(AppointmentError::NoMatches);
        }
        Ok(appointments)
    }
}
