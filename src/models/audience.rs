use crate::models::{AgeGroup, Gender, Provider};

/// Audience selection for an aggregation query: which providers should
/// contribute slots. `None` on a field matches any provider; a `Some`
/// field must equal the provider's value. A provider with no age group
/// does not match an age-constrained filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudienceFilter {
    pub gender: Option<Gender>,
    pub age_group: Option<AgeGroup>,
}

impl AudienceFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn for_customer(gender: Gender, age: u32) -> Self {
        Self {
            gender: Some(gender),
            age_group: Some(AgeGroup::for_age(age)),
        }
    }

    pub fn matches(&self, provider: &Provider) -> bool {
        if let Some(gender) = self.gender {
            if provider.gender != gender {
                return false;
            }
        }
        if let Some(age_group) = self.age_group {
            if provider.age_group != Some(age_group) {
                return false;
            }
        }
        true
    }
}
