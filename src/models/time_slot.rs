use std::fmt;

use chrono::NaiveTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A time of day at minute precision. Seconds in the input are discarded;
/// storage form is `HH:MM:SS`, display form is `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Accepts `HH:MM` or `HH:MM:SS`; anything else is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return None;
        }
        let hour: u8 = parts[0].parse().ok()?;
        let minute: u8 = parts[1].parse().ok()?;
        if parts.len() == 3 {
            let seconds: u8 = parts[2].parse().ok()?;
            if seconds > 59 {
                return None;
            }
        }
        TimeOfDay::new(hour, minute)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// True when the time sits on the hourly grid (minute == 0).
    pub fn on_hour(&self) -> bool {
        self.minute == 0
    }

    /// UTC storage normal form, `HH:MM:SS`.
    pub fn storage(&self) -> String {
        format!("{:02}:{:02}:00", self.hour, self.minute)
    }

    /// Display form, `HH:MM`.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// Human-readable 12-hour form, e.g. `9:00 AM`, `12:30 PM`.
    pub fn display_12h(&self) -> String {
        let (hour, meridiem) = match self.hour {
            0 => (12, "AM"),
            1..=11 => (self.hour, "AM"),
            12 => (12, "PM"),
            _ => (self.hour - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute, meridiem)
    }

    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn from_naive(t: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.storage())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid time of day: {s}")))
    }
}
