use shared_models::error::AppError;

use crate::models::AppointmentError;

/// The one place appointment failures become HTTP errors.
impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::InvalidSlot(_) | AppointmentError::SlotConflict { .. } => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::NotFound(_)
            | AppointmentError::NoMatches
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::AnimalNotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::Validation(errors) => AppError::ValidationError(errors),
            AppointmentError::Store(msg) => AppError::Database(msg),
        }
    }
}
