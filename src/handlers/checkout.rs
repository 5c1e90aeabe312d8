use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    AudienceFilter, Booking, BookingStatus, DayOfWeek, Gender, SelectedSlot, TimeOfDay,
};
use crate::services::aggregation::aggregate;
use crate::services::timezone::resolve_timezone;
use crate::services::validation::{validate_selection, SlotKey, SlotSelection};
use crate::state::AppState;

// POST /api/checkout
#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub customer_gender: Gender,
    pub customer_age: u32,
    pub timezone: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotSelection>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub booking_id: String,
    pub accepted: Vec<SlotKey>,
    pub rejected: Vec<SlotSelection>,
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if body.slots.is_empty() {
        return Err(AppError::InvalidInput("no slots selected".to_string()));
    }

    let audience = AudienceFilter::for_customer(body.customer_gender, body.customer_age);

    // Availability is re-read and re-validated at submission time; whatever
    // the checkout page showed earlier carries no authority.
    let providers = state.providers.list().await?;
    let live = aggregate(&providers, &audience);
    let outcome = validate_selection(&body.slots, &live);

    if outcome.accepted.is_empty() {
        return Err(AppError::StaleSelection);
    }
    if !outcome.rejected.is_empty() {
        tracing::warn!(
            "checkout proceeding with {} of {} slots; rest went stale",
            outcome.accepted.len(),
            body.slots.len()
        );
    }

    let tz = resolve_timezone([
        body.timezone.as_deref(),
        Some(state.config.default_timezone.as_str()),
    ]);

    let selected_slots: Vec<SelectedSlot> = outcome
        .accepted
        .iter()
        .map(|key| {
            let submitted = body
                .slots
                .iter()
                .find(|s| {
                    DayOfWeek::parse(&s.day) == Some(key.day)
                        && TimeOfDay::parse(&s.time) == Some(key.time)
                })
                .and_then(|s| s.display_time.clone());
            SelectedSlot {
                day: key.day,
                time: key.time,
                display_time: submitted.unwrap_or_else(|| key.time.display()),
                timezone: tz.name().to_string(),
            }
        })
        .collect();

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        provider_id: None,
        customer_gender: body.customer_gender,
        customer_age: body.customer_age,
        selected_slots,
        timezone: tz.name().to_string(),
        booking_date: now,
        renewal_date: None,
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.bookings.create(&booking).await?;
    tracing::info!("created booking {} with {} slots", booking.id, booking.selected_slots.len());

    Ok(Json(CheckoutResponse {
        booking_id: booking.id,
        accepted: outcome.accepted,
        rejected: outcome.rejected,
    }))
}
