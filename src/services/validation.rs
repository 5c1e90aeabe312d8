use serde::{Deserialize, Serialize};

use crate::models::{DayOfWeek, TimeOfDay};
use crate::services::aggregation::AggregatedAvailability;

/// One slot as submitted from a checkout form. `day` + `time` (original
/// UTC) are the identity; `display_time` and `timezone` are whatever the
/// page rendered and carry no authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSelection {
    pub day: String,
    pub time: String,
    #[serde(default)]
    pub display_time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A slot identity the validator settled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotKey {
    pub day: DayOfWeek,
    pub time: TimeOfDay,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<SlotKey>,
    pub rejected: Vec<SlotSelection>,
}

impl ValidationOutcome {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Check each submitted slot against the live aggregate, recomputed by the
/// caller just before this call. Availability can change between page load
/// and submission; anything that no longer exists is rejected individually
/// and the boundary decides whether a partial acceptance proceeds.
pub fn validate_selection(
    selection: &[SlotSelection],
    live: &AggregatedAvailability,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for slot in selection {
        let parsed = DayOfWeek::parse(&slot.day).zip(TimeOfDay::parse(&slot.time));
        match parsed {
            Some((day, time)) if live.contains(day, time) => {
                let key = SlotKey { day, time };
                if !outcome.accepted.contains(&key) {
                    outcome.accepted.push(key);
                }
            }
            _ => outcome.rejected.push(slot.clone()),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgeGroup, AudienceFilter, Gender, Provider, ProviderStatus, WeeklyAvailability,
    };
    use crate::services::aggregation::aggregate;

    fn live(availability_json: &str) -> AggregatedAvailability {
        let now = chrono::Utc::now().naive_utc();
        let provider = Provider {
            id: "p1".to_string(),
            display_name: "Provider".to_string(),
            gender: Gender::Male,
            age_group: Some(AgeGroup::Adult),
            status: ProviderStatus::Active,
            timezone: "UTC".to_string(),
            availability: WeeklyAvailability::from_json(availability_json),
            created_at: now,
            updated_at: now,
        };
        aggregate(&[provider], &AudienceFilter::any())
    }

    fn slot(day: &str, time: &str) -> SlotSelection {
        SlotSelection {
            day: day.to_string(),
            time: time.to_string(),
            display_time: None,
            timezone: None,
        }
    }

    #[test]
    fn test_accepts_live_slots() {
        let live = live(r#"{"sunday":["09:00:00","10:00:00"]}"#);
        let outcome = validate_selection(
            &[slot("sunday", "09:00:00"), slot("sunday", "10:00:00")],
            &live,
        );
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome.all_accepted());
    }

    #[test]
    fn test_rejects_stale_slot_individually() {
        let live = live(r#"{"sunday":["09:00:00"]}"#);
        let outcome = validate_selection(
            &[slot("sunday", "09:00:00"), slot("sunday", "11:00:00")],
            &live,
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].time, "11:00:00");
    }

    #[test]
    fn test_identity_ignores_display_fields() {
        let live = live(r#"{"sunday":["09:00:00"]}"#);
        let tampered = SlotSelection {
            day: "sunday".to_string(),
            time: "09:00:00".to_string(),
            display_time: Some("99:99 nonsense".to_string()),
            timezone: Some("Not/AZone".to_string()),
        };
        let outcome = validate_selection(&[tampered], &live);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.accepted[0],
            SlotKey {
                day: DayOfWeek::Sunday,
                time: TimeOfDay::parse("09:00").unwrap(),
            }
        );
    }

    #[test]
    fn test_time_forms_are_equivalent() {
        // HH:MM and HH:MM:SS name the same slot.
        let live = live(r#"{"monday":["14:00:00"]}"#);
        let outcome = validate_selection(&[slot("monday", "14:00")], &live);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_unparseable_inputs_are_rejected() {
        let live = live(r#"{"sunday":["09:00:00"]}"#);
        let outcome = validate_selection(
            &[slot("blursday", "09:00:00"), slot("sunday", "quarter past")],
            &live,
        );
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
    }

    #[test]
    fn test_duplicate_submissions_collapse() {
        let live = live(r#"{"sunday":["09:00:00"]}"#);
        let outcome = validate_selection(
            &[slot("sunday", "09:00:00"), slot("sunday", "09:00")],
            &live,
        );
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_empty_selection() {
        let live = live(r#"{"sunday":["09:00:00"]}"#);
        let outcome = validate_selection(&[], &live);
        assert!(outcome.accepted.is_empty());
        assert!(outcome.all_accepted());
    }
}
