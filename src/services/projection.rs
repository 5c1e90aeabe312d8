use crate::models::{DayOfWeek, TimeOfDay};
use crate::services::aggregation::AggregatedAvailability;
use crate::services::timezone::{from_utc_exact, parse_zone};

/// One bookable slot as shown to a customer. `(day_utc, utc)` is the slot's
/// identity and what a checkout submits back; `local` and `timezone` are
/// presentation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedSlot {
    pub day_utc: DayOfWeek,
    pub utc: TimeOfDay,
    pub local: TimeOfDay,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub day: DayOfWeek,
    pub day_name: &'static str,
    pub has_slots: bool,
    pub slots: Vec<ProjectedSlot>,
}

/// Render the aggregated UTC grid in a display timezone.
///
/// Always returns exactly 7 entries in Sunday-first order; days without
/// slots are kept with `has_slots = false` so the caller can render them
/// disabled. Slots whose conversion crosses midnight move to the adjacent
/// day's bucket, and each bucket is re-sorted by local time afterwards.
pub fn project(agg: &AggregatedAvailability, display_zone: &str) -> Vec<DaySchedule> {
    // The UTC fast path skips the converter entirely, so the output is
    // identical whether or not the tz database resolves anything.
    if display_zone.eq_ignore_ascii_case("UTC") {
        return project_utc(agg);
    }

    let tz = match parse_zone(display_zone) {
        Ok(tz) => tz,
        Err(err) => {
            tracing::warn!("{err}, projecting schedule in UTC");
            return project_utc(agg);
        }
    };

    let mut buckets: [Vec<ProjectedSlot>; 7] = Default::default();

    for day in DayOfWeek::ALL {
        let Some(times) = agg.slots_for(day) else {
            continue;
        };
        for time in times {
            let (local_day, local_time) = from_utc_exact(day, *time, tz);
            buckets[local_day.index()].push(ProjectedSlot {
                day_utc: day,
                utc: *time,
                local: local_time,
                timezone: display_zone.to_string(),
            });
        }
    }

    DayOfWeek::ALL
        .into_iter()
        .zip(buckets)
        .map(|(day, mut slots)| {
            slots.sort_by_key(|s| (s.local, s.day_utc, s.utc));
            DaySchedule {
                day,
                day_name: day.name(),
                has_slots: !slots.is_empty(),
                slots,
            }
        })
        .collect()
}

fn project_utc(agg: &AggregatedAvailability) -> Vec<DaySchedule> {
    DayOfWeek::ALL
        .into_iter()
        .map(|day| {
            let slots: Vec<ProjectedSlot> = agg
                .slots_for(day)
                .map(|times| {
                    times
                        .iter()
                        .map(|time| ProjectedSlot {
                            day_utc: day,
                            utc: *time,
                            local: *time,
                            timezone: "UTC".to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            DaySchedule {
                day,
                day_name: day.name(),
                has_slots: !slots.is_empty(),
                slots,
            }
        })
        .collect()
}
