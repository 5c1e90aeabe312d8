use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AudienceFilter, DayOfWeek, Provider, TimeOfDay};

/// Union of the matching providers' weekly grids, built fresh per query and
/// never persisted. BTree containers make each day's slot set deduplicated
/// and ascending by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedAvailability {
    days: BTreeMap<DayOfWeek, BTreeSet<TimeOfDay>>,
}

impl AggregatedAvailability {
    pub fn slots_for(&self, day: DayOfWeek) -> Option<&BTreeSet<TimeOfDay>> {
        self.days.get(&day)
    }

    pub fn contains(&self, day: DayOfWeek, time: TimeOfDay) -> bool {
        self.days.get(&day).map(|s| s.contains(&time)).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|s| s.is_empty())
    }

    pub fn total_slots(&self) -> usize {
        self.days.values().map(|s| s.len()).sum()
    }
}

/// Merge the availability of every active provider matching the audience.
///
/// An empty result is the normal "no availability" state, not an error —
/// callers render it as a week of empty days.
pub fn aggregate(providers: &[Provider], audience: &AudienceFilter) -> AggregatedAvailability {
    let mut days: BTreeMap<DayOfWeek, BTreeSet<TimeOfDay>> = BTreeMap::new();

    for provider in providers {
        if !provider.is_active() || !audience.matches(provider) {
            continue;
        }
        for (day, times) in provider.availability.iter() {
            if times.is_empty() {
                continue;
            }
            days.entry(day).or_default().extend(times.iter().copied());
        }
    }

    AggregatedAvailability { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeGroup, Gender, ProviderStatus, WeeklyAvailability};

    fn provider(
        id: &str,
        gender: Gender,
        status: ProviderStatus,
        availability_json: &str,
    ) -> Provider {
        let now = chrono::Utc::now().naive_utc();
        Provider {
            id: id.to_string(),
            display_name: format!("Provider {id}"),
            gender,
            age_group: Some(AgeGroup::Adult),
            status,
            timezone: "UTC".to_string(),
            availability: WeeklyAvailability::from_json(availability_json),
            created_at: now,
            updated_at: now,
        }
    }

    fn male_filter() -> AudienceFilter {
        AudienceFilter {
            gender: Some(Gender::Male),
            age_group: None,
        }
    }

    fn sunday_times(agg: &AggregatedAvailability) -> Vec<String> {
        agg.slots_for(DayOfWeek::Sunday)
            .map(|s| s.iter().map(|t| t.display()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_union_of_two_providers() {
        let providers = vec![
            provider(
                "a",
                Gender::Male,
                ProviderStatus::Active,
                r#"{"sunday":["09:00:00","10:00:00"]}"#,
            ),
            provider(
                "b",
                Gender::Male,
                ProviderStatus::Active,
                r#"{"sunday":["10:00:00","11:00:00"]}"#,
            ),
        ];
        let agg = aggregate(&providers, &male_filter());
        assert_eq!(sunday_times(&agg), vec!["09:00", "10:00", "11:00"]);
    }

    #[test]
    fn test_inactive_provider_contributes_nothing() {
        let providers = vec![provider(
            "a",
            Gender::Male,
            ProviderStatus::Inactive,
            r#"{"sunday":["09:00:00"]}"#,
        )];
        let agg = aggregate(&providers, &male_filter());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_audience_filter_excludes_other_gender() {
        let providers = vec![
            provider(
                "a",
                Gender::Male,
                ProviderStatus::Active,
                r#"{"monday":["09:00:00"]}"#,
            ),
            provider(
                "b",
                Gender::Female,
                ProviderStatus::Active,
                r#"{"monday":["10:00:00"]}"#,
            ),
        ];
        let agg = aggregate(&providers, &male_filter());
        let monday = agg.slots_for(DayOfWeek::Monday).unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday.iter().next().unwrap().display(), "09:00");
    }

    #[test]
    fn test_no_match_yields_empty_mapping() {
        let providers = vec![provider(
            "a",
            Gender::Female,
            ProviderStatus::Active,
            r#"{"sunday":["09:00:00"]}"#,
        )];
        let agg = aggregate(&providers, &male_filter());
        assert!(agg.is_empty());
        assert!(agg.slots_for(DayOfWeek::Sunday).is_none());
    }

    #[test]
    fn test_empty_input_yields_empty_mapping() {
        let agg = aggregate(&[], &AudienceFilter::any());
        assert!(agg.is_empty());
        assert_eq!(agg.total_slots(), 0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let providers = vec![
            provider(
                "a",
                Gender::Male,
                ProviderStatus::Active,
                r#"{"sunday":["09:00:00"],"friday":["23:00:00"]}"#,
            ),
            provider(
                "b",
                Gender::Male,
                ProviderStatus::Active,
                r#"{"sunday":["11:00:00"]}"#,
            ),
        ];
        let first = aggregate(&providers, &male_filter());
        let second = aggregate(&providers, &male_filter());
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_values_already_dropped_at_ingestion() {
        let providers = vec![provider(
            "a",
            Gender::Male,
            ProviderStatus::Active,
            r#"{"sunday":["09:00:00","whenever"],"monday":"corrupt"}"#,
        )];
        let agg = aggregate(&providers, &male_filter());
        assert_eq!(agg.total_slots(), 1);
        assert!(agg.contains(DayOfWeek::Sunday, TimeOfDay::parse("09:00").unwrap()));
    }

    #[test]
    fn test_contains_identity() {
        let providers = vec![provider(
            "a",
            Gender::Male,
            ProviderStatus::Active,
            r#"{"tuesday":["14:00:00"]}"#,
        )];
        let agg = aggregate(&providers, &male_filter());
        assert!(agg.contains(DayOfWeek::Tuesday, TimeOfDay::parse("14:00:00").unwrap()));
        assert!(!agg.contains(DayOfWeek::Tuesday, TimeOfDay::parse("15:00:00").unwrap()));
        assert!(!agg.contains(DayOfWeek::Wednesday, TimeOfDay::parse("14:00:00").unwrap()));
    }
}
