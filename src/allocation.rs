//! Daily time allocation and the 24-hour budget invariant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::MAX_DAILY_HOURS;
use crate::error::AllocationError;

/// One day's distribution of hours across skills and rest.
///
/// The invariant `rest_hours + Σ skill_hours <= 24` is checked by
/// [`TimeAllocation::new`] and re-checked by the engine before day 1, so a
/// hand-built or deserialized allocation cannot sneak past it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAllocation {
    /// Training hours per skill name. BTreeMap keeps iteration deterministic.
    pub skill_hours: BTreeMap<String, f64>,
    pub rest_hours: f64,
}

impl TimeAllocation {
    /// Build a validated allocation.
    pub fn new(
        skill_hours: BTreeMap<String, f64>,
        rest_hours: f64,
    ) -> Result<Self, AllocationError> {
        let alloc = Self {
            skill_hours,
            rest_hours,
        };
        alloc.validate()?;
        Ok(alloc)
    }

    /// Check the budget invariant and hour signs.
    pub fn validate(&self) -> Result<(), AllocationError> {
        for (name, &hours) in &self.skill_hours {
            if hours < 0.0 {
                return Err(AllocationError::NegativeHours {
                    name: name.clone(),
                    hours,
                });
            }
        }
        if self.rest_hours < 0.0 {
            return Err(AllocationError::NegativeRest(self.rest_hours));
        }
        let total = self.total_hours();
        if total > MAX_DAILY_HOURS {
            return Err(AllocationError::BudgetExceeded {
                total,
                max: MAX_DAILY_HOURS,
            });
        }
        Ok(())
    }

    /// Hours allocated to a skill; zero for skills not mentioned.
    pub fn hours_for(&self, skill_name: &str) -> f64 {
        self.skill_hours.get(skill_name).copied().unwrap_or(0.0)
    }

    /// Total training hours across all skills.
    pub fn training_hours(&self) -> f64 {
        self.skill_hours.values().sum()
    }

    /// Training plus rest.
    pub fn total_hours(&self) -> f64 {
        self.training_hours() + self.rest_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(name, h)| (name.to_string(), *h))
            .collect()
    }

    #[test]
    fn test_valid_allocation() {
        let alloc = TimeAllocation::new(hours(&[("剑法", 6.0), ("炼丹", 2.0)]), 8.0).unwrap();
        assert_eq!(alloc.hours_for("剑法"), 6.0);
        assert_eq!(alloc.hours_for("没练的"), 0.0);
        assert_eq!(alloc.training_hours(), 8.0);
        assert_eq!(alloc.total_hours(), 16.0);
    }

    #[test]
    fn test_exact_24_hours_is_allowed() {
        assert!(TimeAllocation::new(hours(&[("剑法", 16.0)]), 8.0).is_ok());
    }

    #[test]
    fn test_budget_exceeded_rejected() {
        let result = TimeAllocation::new(hours(&[("剑法", 20.0)]), 8.0);
        assert!(matches!(
            result,
            Err(AllocationError::BudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_negative_hours_rejected() {
        assert!(matches!(
            TimeAllocation::new(hours(&[("剑法", -1.0)]), 8.0),
            Err(AllocationError::NegativeHours { .. })
        ));
        assert!(matches!(
            TimeAllocation::new(hours(&[]), -0.5),
            Err(AllocationError::NegativeRest(_))
        ));
    }
}
