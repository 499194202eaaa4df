//! Error taxonomy for catalog construction, allocations, and runs.

use thiserror::Error;

/// Structural problems that make a catalog unusable.
///
/// Broken `previous` links are deliberately *not* here: those are recorded as
/// [`crate::catalog::ValidationIssue`] warnings and construction still
/// succeeds. Hard errors are reserved for input the engine cannot reason
/// about at all.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate skill stage '{0}'")]
    DuplicateSkillStage(String),

    #[error("duplicate cultivation stage '{0}'")]
    DuplicateCultivationStage(String),

    #[error("cultivation stages '{first}' and '{second}' share order {order}")]
    DuplicateOrder {
        order: i32,
        first: String,
        second: String,
    },

    #[error("skill stage '{name}' requires a positive stage_max_exp, got {value}")]
    NonPositiveStageMax { name: String, value: i64 },

    #[error("cultivation stage '{name}' requires a positive exp_required, got {value}")]
    NonPositiveExpRequired { name: String, value: i64 },

    #[error("negative rate {value} for stage '{name}'")]
    NegativeRate { name: String, value: f64 },

    #[error("multiplier for stage '{name}' must be positive, got {value}")]
    NonPositiveMultiplier { name: String, value: f64 },
}

/// Problems with a daily time allocation, raised before any day is simulated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    #[error("negative hours {hours} allocated to '{name}'")]
    NegativeHours { name: String, hours: f64 },

    #[error("negative rest hours {0}")]
    NegativeRest(f64),

    #[error("daily budget exceeded: {total:.1}h allocated, {max:.0}h in a day")]
    BudgetExceeded { total: f64, max: f64 },
}

/// Failures that abort a simulation run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// The character's cultivation level names a stage the catalog does not
    /// know. Fatal: advancing it anyway would corrupt min_exp accounting.
    /// Skill-side lookup misses, by contrast, degrade to "no gain today".
    #[error("unknown cultivation stage '{0}'")]
    UnknownStage(String),

    #[error("day count {0} must be between 1 and 365")]
    InvalidDays(u32),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}
