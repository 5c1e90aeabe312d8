use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    AgeGroup, Booking, BookingStatus, Gender, Provider, ProviderStatus, SelectedSlot,
    WeeklyAvailability,
};
use crate::services::timezone::{grid_to_utc, parse_zone};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// ── Providers ──

#[derive(Serialize)]
pub struct ProviderResponse {
    id: String,
    display_name: String,
    gender: String,
    age_group: Option<String>,
    status: String,
    timezone: String,
    availability: serde_json::Value,
    created_at: String,
    updated_at: String,
}

impl ProviderResponse {
    fn from_provider(p: Provider) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            gender: p.gender.as_str().to_string(),
            age_group: p.age_group.map(|g| g.as_str().to_string()),
            status: p.status.as_str().to_string(),
            timezone: p.timezone,
            availability: p.availability.to_value(),
            created_at: p.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: p.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ProviderRequest {
    pub display_name: String,
    pub gender: String,
    pub age_group: Option<String>,
    pub status: Option<String>,
    pub timezone: String,
    /// Availability in the persisted shape: day name -> array of times.
    /// Times are UTC unless `availability_timezone` is set.
    pub availability: serde_json::Value,
    /// When set, `availability` is read as wall-clock times in this zone
    /// and converted to UTC for storage.
    pub availability_timezone: Option<String>,
}

/// Admin writes go through the strict parsers: a bad timezone or an
/// off-grid slot is rejected here rather than tolerated the way the read
/// path tolerates old data.
fn provider_from_request(body: &ProviderRequest) -> Result<(Gender, Option<AgeGroup>, ProviderStatus, WeeklyAvailability), AppError> {
    let gender = Gender::parse(&body.gender)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid gender: {}", body.gender)))?;

    let age_group = match body.age_group.as_deref() {
        Some(s) => Some(
            AgeGroup::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("invalid age group: {s}")))?,
        ),
        None => None,
    };

    let status = match body.status.as_deref() {
        Some("active") | None => ProviderStatus::Active,
        Some("inactive") => ProviderStatus::Inactive,
        Some(s) => return Err(AppError::InvalidInput(format!("invalid status: {s}"))),
    };

    parse_zone(&body.timezone).map_err(|_| AppError::InvalidTimezone(body.timezone.clone()))?;

    let mut availability = WeeklyAvailability::parse_strict(&body.availability)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    if let Some(zone) = body.availability_timezone.as_deref() {
        let tz = parse_zone(zone).map_err(|_| AppError::InvalidTimezone(zone.to_string()))?;
        availability = grid_to_utc(&availability, tz);
        // A zone with a fractional-hour offset would push slots off the
        // 24-per-day grid.
        if availability.iter().any(|(_, times)| times.iter().any(|t| !t.on_hour())) {
            return Err(AppError::InvalidInput(format!(
                "{zone} is offset by a fraction of an hour; enter availability in UTC instead"
            )));
        }
    }

    Ok((gender, age_group, status, availability))
}

// GET /api/admin/providers
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProviderResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let providers = state.providers.list().await?;
    Ok(Json(
        providers.into_iter().map(ProviderResponse::from_provider).collect(),
    ))
}

// GET /api/admin/providers/:id
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ProviderResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let provider = state
        .providers
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("provider {id}")))?;
    Ok(Json(ProviderResponse::from_provider(provider)))
}

// POST /api/admin/providers
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ProviderRequest>,
) -> Result<Json<ProviderResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (gender, age_group, status, availability) = provider_from_request(&body)?;

    let now = Utc::now().naive_utc();
    let provider = Provider {
        id: uuid::Uuid::new_v4().to_string(),
        display_name: body.display_name,
        gender,
        age_group,
        status,
        timezone: body.timezone,
        availability,
        created_at: now,
        updated_at: now,
    };

    state.providers.upsert(&provider).await?;
    tracing::info!("created provider {} ({})", provider.id, provider.display_name);
    Ok(Json(ProviderResponse::from_provider(provider)))
}

// PUT /api/admin/providers/:id
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ProviderRequest>,
) -> Result<Json<ProviderResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let existing = state
        .providers
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("provider {id}")))?;

    let (gender, age_group, status, availability) = provider_from_request(&body)?;

    let provider = Provider {
        id: existing.id,
        display_name: body.display_name,
        gender,
        age_group,
        status,
        timezone: body.timezone,
        availability,
        created_at: existing.created_at,
        updated_at: Utc::now().naive_utc(),
    };

    state.providers.upsert(&provider).await?;
    Ok(Json(ProviderResponse::from_provider(provider)))
}

// DELETE /api/admin/providers/:id
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let removed = state.providers.delete(&id).await?;
    if removed {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("provider {id}")))
    }
}

// ── Bookings ──

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    provider_id: Option<String>,
    customer_gender: String,
    customer_age: u32,
    selected_slots: Vec<SelectedSlot>,
    timezone: String,
    booking_date: String,
    renewal_date: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl BookingResponse {
    fn from_booking(b: Booking) -> Self {
        Self {
            id: b.id,
            provider_id: b.provider_id,
            customer_gender: b.customer_gender.as_str().to_string(),
            customer_age: b.customer_age,
            selected_slots: b.selected_slots,
            timezone: b.timezone,
            booking_date: b.booking_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            renewal_date: b.renewal_date.map(|d| d.format("%Y-%m-%d").to_string()),
            status: b.status.as_str().to_string(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/admin/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if let Some(status) = query.status.as_deref() {
        if BookingStatus::parse_exact(status).is_none() {
            return Err(AppError::InvalidInput(format!("invalid status: {status}")));
        }
    }

    let limit = query.limit.unwrap_or(50);
    let bookings = state.bookings.list(query.status.as_deref(), limit).await?;
    Ok(Json(
        bookings.into_iter().map(BookingResponse::from_booking).collect(),
    ))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn set_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = BookingStatus::parse_exact(&body.status)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid status: {}", body.status)))?;

    let updated = state.bookings.set_status(&id, &status).await?;
    if updated {
        Ok(Json(serde_json::json!({"ok": true, "status": status.as_str()})))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// PUT /api/admin/bookings/:id
//
// Partial edit of the admin-mutable fields. Stored slots are replaced
// verbatim when given; they are historical data and are never re-derived
// from live availability.
#[derive(Deserialize)]
pub struct BookingEditRequest {
    pub provider_id: Option<String>,
    pub renewal_date: Option<String>,
    pub status: Option<String>,
    pub slots: Option<Vec<SelectedSlot>>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<BookingEditRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let mut booking = state
        .bookings
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if let Some(provider_id) = body.provider_id {
        let provider = state
            .providers
            .get(&provider_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("provider {provider_id}")))?;
        booking.provider_id = Some(provider.id);
    }
    if let Some(renewal) = body.renewal_date.as_deref() {
        let date = NaiveDate::parse_from_str(renewal, "%Y-%m-%d")
            .map_err(|_| AppError::InvalidInput(format!("invalid renewal date: {renewal}")))?;
        booking.renewal_date = Some(date);
    }
    if let Some(status) = body.status.as_deref() {
        booking.status = BookingStatus::parse_exact(status)
            .ok_or_else(|| AppError::InvalidInput(format!("invalid status: {status}")))?;
    }
    if let Some(slots) = body.slots {
        booking.selected_slots = slots;
    }
    booking.updated_at = Utc::now().naive_utc();

    let updated = state.bookings.update(&booking).await?;
    if !updated {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    Ok(Json(BookingResponse::from_booking(booking)))
}
