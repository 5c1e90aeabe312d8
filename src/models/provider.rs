use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::WeeklyAvailability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Adult,
    Child,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Adult => "adult",
            AgeGroup::Child => "child",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "adult" => Some(AgeGroup::Adult),
            "child" => Some(AgeGroup::Child),
            _ => None,
        }
    }

    /// Category for a customer of the given age in years.
    pub fn for_age(age: u32) -> Self {
        if age >= 18 {
            AgeGroup::Adult
        } else {
            AgeGroup::Child
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Active,
    Inactive,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Active => "active",
            ProviderStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "active" => ProviderStatus::Active,
            _ => ProviderStatus::Inactive,
        }
    }
}

/// A teacher/instructor offering recurring weekly availability.
///
/// `availability` is stored in UTC; `timezone` is only the zone the admin
/// uses when editing this provider's hours.
#[derive(Debug, Clone)]
pub struct Provider {
    pub id: String,
    pub display_name: String,
    pub gender: Gender,
    pub age_group: Option<AgeGroup>,
    pub status: ProviderStatus,
    pub timezone: String,
    pub availability: WeeklyAvailability,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Provider {
    pub fn is_active(&self) -> bool {
        self.status == ProviderStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("male"), Some(Gender::Male));
        assert_eq!(Gender::parse("Female"), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
    }

    #[test]
    fn test_age_group_for_age() {
        assert_eq!(AgeGroup::for_age(18), AgeGroup::Adult);
        assert_eq!(AgeGroup::for_age(65), AgeGroup::Adult);
        assert_eq!(AgeGroup::for_age(17), AgeGroup::Child);
        assert_eq!(AgeGroup::for_age(0), AgeGroup::Child);
    }

    #[test]
    fn test_status_parse_defaults_inactive() {
        assert_eq!(ProviderStatus::parse("active"), ProviderStatus::Active);
        assert_eq!(ProviderStatus::parse("inactive"), ProviderStatus::Inactive);
        assert_eq!(ProviderStatus::parse("garbage"), ProviderStatus::Inactive);
    }
}
