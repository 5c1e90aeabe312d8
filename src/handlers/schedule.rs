use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{AgeGroup, AudienceFilter, Gender};
use crate::services::aggregation::aggregate;
use crate::services::projection::project;
use crate::services::timezone::resolve_timezone;
use crate::services::validation::{validate_selection, SlotKey, SlotSelection};
use crate::state::AppState;

// GET /api/schedule
#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Serialize)]
pub struct SlotResponse {
    original: String,
    display: String,
    display_12h: String,
    timezone: String,
}

#[derive(Serialize)]
pub struct DayResponse {
    day_key: &'static str,
    day_name: &'static str,
    has_slots: bool,
    slots: Vec<SlotResponse>,
}

fn parse_audience(
    gender: Option<&str>,
    age_group: Option<&str>,
) -> Result<AudienceFilter, AppError> {
    let gender = match gender {
        Some(s) => Some(
            Gender::parse(s).ok_or_else(|| AppError::InvalidInput(format!("invalid gender: {s}")))?,
        ),
        None => None,
    };
    let age_group = match age_group {
        Some(s) => Some(
            AgeGroup::parse(s)
                .ok_or_else(|| AppError::InvalidInput(format!("invalid age group: {s}")))?,
        ),
        None => None,
    };
    Ok(AudienceFilter { gender, age_group })
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<DayResponse>>, AppError> {
    let audience = parse_audience(query.gender.as_deref(), query.age_group.as_deref())?;

    let providers = state.providers.list().await?;
    let aggregated = aggregate(&providers, &audience);

    let tz = resolve_timezone([
        query.timezone.as_deref(),
        Some(state.config.default_timezone.as_str()),
    ]);
    let schedule = project(&aggregated, tz.name());

    let response = schedule
        .into_iter()
        .map(|day| DayResponse {
            day_key: day.day.key(),
            day_name: day.day_name,
            has_slots: day.has_slots,
            slots: day
                .slots
                .into_iter()
                .map(|slot| SlotResponse {
                    original: slot.utc.storage(),
                    display: slot.local.display(),
                    display_12h: slot.local.display_12h(),
                    timezone: slot.timezone,
                })
                .collect(),
        })
        .collect();

    Ok(Json(response))
}

// POST /api/schedule/validate
#[derive(Deserialize)]
pub struct ValidateRequest {
    pub gender: Option<String>,
    pub age_group: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotSelection>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub accepted: Vec<SlotKey>,
    pub rejected: Vec<SlotSelection>,
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    let audience = parse_audience(body.gender.as_deref(), body.age_group.as_deref())?;

    // Aggregation runs fresh here; the grid the page was rendered from may
    // already be stale.
    let providers = state.providers.list().await?;
    let live = aggregate(&providers, &audience);

    let outcome = validate_selection(&body.slots, &live);
    Ok(Json(ValidateResponse {
        accepted: outcome.accepted,
        rejected: outcome.rejected,
    }))
}
