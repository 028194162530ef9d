// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{Appointment, AppointmentError, NewAppointment};
use crate::services::rules::{ensure_on_the_hour, ensure_slot_free};
use crate::store::AppointmentStore;

/// Write side of the appointment book: guards the slot rules before
/// anything reaches the store.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn book_appointment(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for animal {} with doctor {} at {}",
              new.animal_id, new.doctor_id, new.appointment_date_time);

        // **Step 1: Slot alignment**
        if let Err(e) = ensure_on_the_hour(new.appointment_date_time) {
            warn!("Rejected off-hour booking for doctor {} at {}", new.doctor_id, new.appointment_date_time);
            return Err(e);
        }

        // **Step 2: Conflict fast path**
        let existing = self.store
            .find_by_doctor_at(new.doctor_id, new.appointment_date_time)
            .await?;
        if let Err(e) = ensure_slot_free(existing.as_ref(), new.doctor_id, new.appointment_date_time, None) {
            warn!("Doctor {} already booked at {}", new.doctor_id, new.appointment_date_time);
            return Err(e);
        }

        // **Step 3: Insert; the store's uniqueness guard settles races**
        let appointment = self.store.insert(new).await.map_err(|e| {
            let err = AppointmentError::from(e);
            if matches!(err, AppointmentError::SlotConflict { .. }) {
                warn!("Slot taken concurrently: {}", err);
            }
            err
        })?;

        info!("Appointment {} booked successfully with doctor {}", appointment.id, appointment.doctor_id);
        Ok(appointment)
    }

    /// Replaces an existing appointment, enforcing the same slot rules as booking.
    pub async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment.id);

        if self.store.get(appointment.id).await?.is_none() {
            return Err(AppointmentError::NotFound(appointment.id));
        }

        ensure_on_the_hour(appointment.appointment_date_time)?;

        let existing = self.store
            .find_by_doctor_at(appointment.doctor_id, appointment.appointment_date_time)
            .await?;
        ensure_slot_free(
            existing.as_ref(),
            appointment.doctor_id,
            appointment.appointment_date_time,
            Some(appointment.id),
        )?;

        let id = appointment.id;
        let updated = self.store
            .update(appointment)
            .await?
            .ok_or(AppointmentError::NotFound(id))?;

        info!("Appointment {} updated successfully", id);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: i64) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", id);

        if !self.store.delete(id).await? {
            return Err(AppointmentError::NotFound(id));
        }

        info!("Appointment {} deleted", id);
        Ok(())
    }
}
