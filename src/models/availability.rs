use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::models::{DayOfWeek, TimeOfDay};

/// A provider's recurring weekly availability: for each day of the week, the
/// set of UTC times the provider is bookable. Sparse — days with no slots
/// carry no entry. BTree containers keep days and times in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyAvailability {
    days: BTreeMap<DayOfWeek, BTreeSet<TimeOfDay>>,
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerant ingestion of the persisted JSON shape: an object keyed by
    /// lowercase day name, each value an array of UTC time strings.
    ///
    /// Missing days are empty, non-array values are dropped, non-string
    /// elements are dropped, malformed time strings are dropped. One bad
    /// value never fails the whole record.
    pub fn from_value(value: &Value) -> Self {
        let mut days: BTreeMap<DayOfWeek, BTreeSet<TimeOfDay>> = BTreeMap::new();

        let Some(obj) = value.as_object() else {
            return Self { days };
        };

        for (key, entry) in obj {
            let Some(day) = DayOfWeek::parse(key) else {
                continue;
            };
            let Some(items) = entry.as_array() else {
                continue;
            };
            let times: BTreeSet<TimeOfDay> = items
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(TimeOfDay::parse)
                .collect();
            if !times.is_empty() {
                days.entry(day).or_default().extend(times);
            }
        }

        Self { days }
    }

    pub fn from_json(s: &str) -> Self {
        let value: Value = serde_json::from_str(s).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    /// Strict parse for the admin write path. Unlike `from_value`, every
    /// defect is an error naming the offending value: unknown day keys,
    /// non-array values, malformed time strings, and times off the hourly
    /// grid are all rejected.
    pub fn parse_strict(value: &Value) -> anyhow::Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("availability must be a JSON object"))?;

        let mut days: BTreeMap<DayOfWeek, BTreeSet<TimeOfDay>> = BTreeMap::new();

        for (key, entry) in obj {
            let day = DayOfWeek::parse(key)
                .ok_or_else(|| anyhow::anyhow!("unknown day key: {key}"))?;
            let items = entry
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("{key}: expected an array of times"))?;

            let mut times = BTreeSet::new();
            for item in items {
                let s = item
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("{key}: expected a time string, got {item}"))?;
                let time = TimeOfDay::parse(s)
                    .ok_or_else(|| anyhow::anyhow!("{key}: invalid time: {s}"))?;
                if !time.on_hour() {
                    anyhow::bail!("{key}: time not on the hourly grid: {s}");
                }
                times.insert(time);
            }
            if !times.is_empty() {
                days.insert(day, times);
            }
        }

        Ok(Self { days })
    }

    /// Serialize to the persisted JSON shape, times in `HH:MM:SS` storage
    /// form, days in canonical order (BTreeMap iterates Sunday-first).
    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (day, times) in &self.days {
            let arr: Vec<Value> = times.iter().map(|t| Value::String(t.storage())).collect();
            obj.insert(day.key().to_string(), Value::Array(arr));
        }
        Value::Object(obj)
    }

    pub fn slots_for(&self, day: DayOfWeek) -> Option<&BTreeSet<TimeOfDay>> {
        self.days.get(&day)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &BTreeSet<TimeOfDay>)> {
        self.days.iter().map(|(d, t)| (*d, t))
    }

    pub fn insert(&mut self, day: DayOfWeek, time: TimeOfDay) {
        self.days.entry(day).or_default().insert(time);
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|t| t.is_empty())
    }

    pub fn total_slots(&self) -> usize {
        self.days.values().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_valid() {
        let avail = WeeklyAvailability::from_json(
            r#"{"sunday":["09:00:00","10:00:00"],"monday":["14:00"]}"#,
        );
        assert_eq!(avail.slots_for(DayOfWeek::Sunday).unwrap().len(), 2);
        assert_eq!(avail.slots_for(DayOfWeek::Monday).unwrap().len(), 1);
        assert!(avail.slots_for(DayOfWeek::Tuesday).is_none());
    }

    #[test]
    fn test_from_json_drops_malformed_times() {
        let avail = WeeklyAvailability::from_json(
            r#"{"sunday":["09:00:00","nonsense","25:00","10:00:00"]}"#,
        );
        let sunday = avail.slots_for(DayOfWeek::Sunday).unwrap();
        assert_eq!(sunday.len(), 2);
    }

    #[test]
    fn test_from_json_drops_non_array_days() {
        let avail =
            WeeklyAvailability::from_json(r#"{"sunday":"09:00:00","monday":["10:00:00"]}"#);
        assert!(avail.slots_for(DayOfWeek::Sunday).is_none());
        assert_eq!(avail.slots_for(DayOfWeek::Monday).unwrap().len(), 1);
    }

    #[test]
    fn test_from_json_ignores_unknown_keys_and_non_strings() {
        let avail = WeeklyAvailability::from_json(
            r#"{"someday":["09:00:00"],"friday":[42,null,"11:00:00"]}"#,
        );
        assert_eq!(avail.total_slots(), 1);
        assert_eq!(
            avail
                .slots_for(DayOfWeek::Friday)
                .unwrap()
                .iter()
                .next()
                .unwrap()
                .display(),
            "11:00"
        );
    }

    #[test]
    fn test_from_json_not_an_object() {
        assert!(WeeklyAvailability::from_json("not json").is_empty());
        assert!(WeeklyAvailability::from_json(r#"["09:00:00"]"#).is_empty());
        assert!(WeeklyAvailability::from_json("null").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let avail =
            WeeklyAvailability::from_json(r#"{"sunday":["09:00:00","09:00","09:00:00"]}"#);
        assert_eq!(avail.slots_for(DayOfWeek::Sunday).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_strict_rejects_off_hour() {
        let value: Value = serde_json::from_str(r#"{"sunday":["09:30:00"]}"#).unwrap();
        let err = WeeklyAvailability::parse_strict(&value).unwrap_err();
        assert!(err.to_string().contains("hourly grid"));
    }

    #[test]
    fn test_parse_strict_rejects_bad_day_and_bad_time() {
        let bad_day: Value = serde_json::from_str(r#"{"funday":["09:00:00"]}"#).unwrap();
        assert!(WeeklyAvailability::parse_strict(&bad_day).is_err());

        let bad_time: Value = serde_json::from_str(r#"{"sunday":["late"]}"#).unwrap();
        assert!(WeeklyAvailability::parse_strict(&bad_time).is_err());

        let non_array: Value = serde_json::from_str(r#"{"sunday":"09:00:00"}"#).unwrap();
        assert!(WeeklyAvailability::parse_strict(&non_array).is_err());
    }

    #[test]
    fn test_parse_strict_accepts_valid_grid() {
        let value: Value =
            serde_json::from_str(r#"{"sunday":["09:00","10:00:00"],"saturday":["23:00"]}"#)
                .unwrap();
        let avail = WeeklyAvailability::parse_strict(&value).unwrap();
        assert_eq!(avail.total_slots(), 3);
    }

    #[test]
    fn test_to_value_normalizes_storage_form() {
        let avail = WeeklyAvailability::from_json(r#"{"monday":["14:00","09:00"]}"#);
        let value = avail.to_value();
        let monday = value.get("monday").unwrap().as_array().unwrap();
        assert_eq!(monday[0], "09:00:00");
        assert_eq!(monday[1], "14:00:00");
    }
}
