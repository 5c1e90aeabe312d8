use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{DayOfWeek, Gender, TimeOfDay};

/// One slot chosen at checkout. `day` and `time` are the slot's UTC
/// identity; `display_time` and `timezone` record what the customer saw and
/// are never used to re-derive anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSlot {
    pub day: DayOfWeek,
    pub time: TimeOfDay,
    pub display_time: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => BookingStatus::Approved,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    pub fn parse_exact(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A customer's booking, created once at checkout. The stored slot list is
/// historical data: it keeps its UTC identities verbatim and is never
/// re-derived from live availability, even if providers change later.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: String,
    pub provider_id: Option<String>,
    pub customer_gender: Gender,
    pub customer_age: u32,
    pub selected_slots: Vec<SelectedSlot>,
    pub timezone: String,
    pub booking_date: NaiveDateTime,
    pub renewal_date: Option<NaiveDate>,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
