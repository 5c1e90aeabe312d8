pub mod audience;
pub mod availability;
pub mod booking;
pub mod day;
pub mod provider;
pub mod time_slot;

pub use audience::AudienceFilter;
pub use availability::WeeklyAvailability;
pub use booking::{Booking, BookingStatus, SelectedSlot};
pub use day::DayOfWeek;
pub use provider::{AgeGroup, Gender, Provider, ProviderStatus};
pub use time_slot::TimeOfDay;
