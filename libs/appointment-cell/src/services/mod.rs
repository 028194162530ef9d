pub mod booking;
pub mod query;
pub mod rules;

pub use booking::AppointmentBookingService;
pub use query::AppointmentQueryService;
