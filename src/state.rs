use crate::config::AppConfig;
use crate::db::{BookingRepository, ProviderRepository};

pub struct AppState {
    pub providers: Box<dyn ProviderRepository>,
    pub bookings: Box<dyn BookingRepository>,
    pub config: AppConfig,
}
