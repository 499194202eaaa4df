//! Shared balance constants used by the engine and its callers.
//!
//! All tuning numbers and fixed sequences live here.
//! Change once, test everywhere.

// =============================================================================
// DAILY TIME BUDGET
// =============================================================================

/// Maximum hours a daily allocation may spend (training + rest combined).
pub const MAX_DAILY_HOURS: f64 = 24.0;

// =============================================================================
// RUN BOUNDS
// =============================================================================

/// Minimum number of days a run may simulate.
pub const MIN_SIMULATION_DAYS: u32 = 1;

/// Maximum number of days a run may simulate.
pub const MAX_SIMULATION_DAYS: u32 = 365;

/// Default checkpoint cadence for run traces (day 1, every 5th day, final day).
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 5;

// =============================================================================
// SKILL STAGES
// =============================================================================

/// Canonical six-rank skill-stage promotion order.
///
/// The catalog takes the ordering as an explicit build argument rather than
/// reading a global; this is the sequence the stock catalogs use.
pub const DEFAULT_SKILL_STAGE_ORDER: [&str; 6] =
    ["入门", "熟练", "精通", "专家", "大师", "宗师"];

/// Owned copy of [`DEFAULT_SKILL_STAGE_ORDER`] for catalog construction.
pub fn default_skill_stage_order() -> Vec<String> {
    DEFAULT_SKILL_STAGE_ORDER
        .iter()
        .map(|s| s.to_string())
        .collect()
}
