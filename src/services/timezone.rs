use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::{DayOfWeek, TimeOfDay, WeeklyAvailability};

#[derive(Debug, thiserror::Error)]
pub enum TimezoneError {
    #[error("unrecognized timezone: {0}")]
    InvalidTimezone(String),
}

/// Validate an IANA zone identifier against the tz database.
pub fn parse_zone(zone: &str) -> Result<Tz, TimezoneError> {
    Tz::from_str(zone).map_err(|_| TimezoneError::InvalidTimezone(zone.to_string()))
}

/// First candidate that names a valid IANA zone wins; UTC if none does.
///
/// Callers pass the fallback chain in order (request parameter, configured
/// default, ...) instead of scattering the policy across conditionals.
pub fn resolve_timezone<'a, I>(candidates: I) -> Tz
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    for candidate in candidates.into_iter().flatten() {
        match parse_zone(candidate) {
            Ok(tz) => return tz,
            Err(_) => {
                tracing::warn!("ignoring invalid timezone candidate: {candidate}");
            }
        }
    }
    Tz::UTC
}

/// Reference date for each weekday. Weekly slots have no calendar date, so
/// conversions anchor to a fixed week (Sunday 2024-01-07 through Saturday
/// 2024-01-13); only the wall-clock offset and the day-of-week delta of the
/// shifted instant are kept. Zone offsets are the ones in force on those
/// January dates.
fn anchor_date(day: DayOfWeek) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 7 + day.index() as u32).expect("anchor week date")
}

fn day_shift(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Convert a UTC slot to the given zone. Infallible once the zone is known:
/// every UTC instant has exactly one local representation.
pub fn from_utc_exact(day: DayOfWeek, time: TimeOfDay, tz: Tz) -> (DayOfWeek, TimeOfDay) {
    let date = anchor_date(day);
    let utc = Utc.from_utc_datetime(&date.and_time(time.to_naive()));
    let local = utc.with_timezone(&tz);
    let shift = day_shift(date, local.date_naive());
    (day.offset(shift), TimeOfDay::from_naive(local.time()))
}

/// Convert a local slot in the given zone to UTC. Returns `None` for local
/// times that do not exist in the zone (spring-forward gap); ambiguous
/// times (fall-back) resolve to the earlier instant.
pub fn to_utc_exact(day: DayOfWeek, time: TimeOfDay, tz: Tz) -> Option<(DayOfWeek, TimeOfDay)> {
    let date = anchor_date(day);
    let local = tz.from_local_datetime(&date.and_time(time.to_naive())).earliest()?;
    let utc = local.naive_utc();
    let shift = day_shift(date, utc.date());
    Some((day.offset(shift), TimeOfDay::from_naive(utc.time())))
}

/// String-level conversion from UTC storage to a display zone.
///
/// Output time is display-normalized (`HH:MM`). A malformed time or unknown
/// zone never fails the caller: the input comes back unconverted (the slot
/// is shown in UTC) and a warning is logged.
pub fn from_utc(day: DayOfWeek, time: &str, zone: &str) -> (DayOfWeek, String) {
    let Some(parsed) = TimeOfDay::parse(time) else {
        tracing::warn!("unparseable slot time {time:?}, leaving unconverted");
        return (day, time.to_string());
    };
    match parse_zone(zone) {
        Ok(tz) => {
            let (local_day, local_time) = from_utc_exact(day, parsed, tz);
            (local_day, local_time.display())
        }
        Err(err) => {
            tracing::warn!("{err}, showing slot in UTC");
            (day, parsed.display())
        }
    }
}

/// String-level conversion from a local zone to UTC storage form
/// (`HH:MM:SS`). Same degrade-to-passthrough policy as `from_utc`.
pub fn to_utc(day: DayOfWeek, time: &str, zone: &str) -> (DayOfWeek, String) {
    let Some(parsed) = TimeOfDay::parse(time) else {
        tracing::warn!("unparseable slot time {time:?}, leaving unconverted");
        return (day, time.to_string());
    };
    match parse_zone(zone) {
        Ok(tz) => match to_utc_exact(day, parsed, tz) {
            Some((utc_day, utc_time)) => (utc_day, utc_time.storage()),
            None => {
                tracing::warn!(
                    "local time {time} does not exist in {zone} on the anchor week, storing as-is"
                );
                (day, parsed.storage())
            }
        },
        Err(err) => {
            tracing::warn!("{err}, storing slot time as-is");
            (day, parsed.storage())
        }
    }
}

/// Convert a whole weekly grid from a local zone to UTC storage, slot by
/// slot. A slot whose conversion crosses midnight moves into the adjacent
/// day's set; a nonexistent local time is kept as-is (same passthrough
/// policy as `to_utc`).
pub fn grid_to_utc(avail: &WeeklyAvailability, tz: Tz) -> WeeklyAvailability {
    let mut out = WeeklyAvailability::new();
    for (day, times) in avail.iter() {
        for time in times {
            match to_utc_exact(day, *time, tz) {
                Some((utc_day, utc_time)) => out.insert(utc_day, utc_time),
                None => {
                    tracing::warn!(
                        "local time {} does not exist in {}, keeping unconverted",
                        time.display(),
                        tz.name()
                    );
                    out.insert(day, *time);
                }
            }
        }
    }
    out
}
