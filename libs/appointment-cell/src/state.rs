use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::{AppointmentBookingService, AppointmentQueryService};
use crate::store::AppointmentStore;

/// Dependencies shared by every appointment handler.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AppointmentStore>,
}

impl AppointmentState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn AppointmentStore>) -> Self {
        Self { config, store }
    }

    pub fn booking(&self) -> AppointmentBookingService {
        AppointmentBookingService::new(Arc::clone(&self.store))
    }

    pub fn queries(&self) -> AppointmentQueryService {
        AppointmentQueryService::new(Arc::clone(&self.store))
            .with_empty_filter_as_not_found(self.config.empty_filter_is_not_found)
    }
}
