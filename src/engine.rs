//! The progression engine: daily training step, promotion state machines,
//! and the multi-day run loop.
//!
//! The engine mutates a borrowed [`Character`] in place against immutable
//! catalogs. Day *n* depends on day *n-1*, so days execute strictly in
//! sequence; different characters can be advanced concurrently against the
//! same shared catalog.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::allocation::TimeAllocation;
use crate::catalog::StageCatalog;
use crate::character::{Character, Skill};
use crate::constants::{MAX_SIMULATION_DAYS, MIN_SIMULATION_DAYS};
use crate::error::SimulationError;

/// How promotion handles a gain that overshoots a whole stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPolicy {
    /// One promotion check per day. An oversized gain can leave exp sitting
    /// above the stage requirement until the next day's check (legacy
    /// behavior).
    Single,
    /// Promote repeatedly until the remaining exp fits the current stage.
    #[default]
    Cascade,
}

/// Knobs for a multi-day run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub policy: PromotionPolicy,
    /// When set, the trace records day 1, every Nth day, and the final day.
    pub checkpoint_interval: Option<u32>,
}

/// Character state captured at the end of a checkpointed day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCheckpoint {
    pub day: u32,
    pub cultivation_level: String,
    pub cultivation_progress: String,
    pub cultivation_total_exp: i64,
    pub skills: Vec<SkillSnapshot>,
}

/// Per-skill slice of a [`DayCheckpoint`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSnapshot {
    pub name: String,
    pub stage: String,
    pub current_exp: i64,
    pub max_stage_exp: i64,
}

impl DayCheckpoint {
    fn capture(day: u32, character: &Character) -> Self {
        Self {
            day,
            cultivation_level: character.cultivation_level.clone(),
            cultivation_progress: character.cultivation_progress.clone(),
            cultivation_total_exp: character.cultivation_total_exp,
            skills: character
                .skills
                .iter()
                .map(|skill| SkillSnapshot {
                    name: skill.name.clone(),
                    stage: skill.stage.clone(),
                    current_exp: skill.current_exp,
                    max_stage_exp: skill.max_stage_exp,
                })
                .collect(),
        }
    }
}

/// Checkpoints collected across a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunTrace {
    pub days: u32,
    pub checkpoints: Vec<DayCheckpoint>,
}

/// Round half away from zero, matching the legacy exp arithmetic.
/// (`f64::round` ties away from zero, which is exactly that rule.)
fn round_gain(value: f64) -> i64 {
    value.round() as i64
}

/// Advance the character by one training day.
///
/// Never fails for valid inputs. Allocation entries naming skills the
/// character lacks, and skills whose stage is missing from the skill-stage
/// table, accrue nothing and are logged at debug level rather than raised.
/// The one hard failure is an unknown `cultivation_level` reached while the
/// cultivation skill actually trains: that would corrupt min_exp accounting,
/// so it surfaces as [`SimulationError::UnknownStage`].
pub fn step(
    character: &mut Character,
    catalog: &StageCatalog,
    allocation: &TimeAllocation,
    policy: PromotionPolicy,
) -> Result<(), SimulationError> {
    for idx in 0..character.skills.len() {
        let hours = allocation.hours_for(&character.skills[idx].name);
        if hours <= 0.0 {
            continue;
        }

        let Some(stage_def) = catalog.skill_stage(&character.skills[idx].stage) else {
            debug!(
                "skill '{}' is at unknown stage '{}', no gain today",
                character.skills[idx].name, character.skills[idx].stage
            );
            continue;
        };
        let gain = round_gain(hours * stage_def.avg_rate);

        let skill = &mut character.skills[idx];
        skill.current_exp += gain;
        promote_skill(skill, catalog, policy);

        // Cultivation coupling. The multiplier reads the *post-promotion*
        // stage, matching the order of operations the tables were tuned for.
        if character.has_cultivation_track()
            && character.skills[idx].name == character.cultivation_skill
        {
            let stage = catalog
                .cultivation_stage(&character.cultivation_level)
                .ok_or_else(|| {
                    SimulationError::UnknownStage(character.cultivation_level.clone())
                })?;
            let multiplier = catalog.multiplier_for(&character.skills[idx].stage);
            let cult_gain = round_gain(hours * stage.base_rate * multiplier);
            character.cultivation_total_exp += cult_gain;
            promote_cultivation(character, catalog, policy)?;
        }
    }

    for name in allocation.skill_hours.keys() {
        if character.skill(name).is_none() {
            debug!("allocation names unknown skill '{name}', hours dropped");
        }
    }
    Ok(())
}

/// Promote a skill while its exp meets the stage requirement.
///
/// Overflow carries into the next stage. At the terminal stage (or when the
/// promotion order runs past the loaded table) exp clamps to the stage
/// requirement. Under [`PromotionPolicy::Single`] at most one promotion
/// happens per call.
fn promote_skill(skill: &mut Skill, catalog: &StageCatalog, policy: PromotionPolicy) {
    while skill.current_exp >= skill.max_stage_exp {
        let overflow = skill.current_exp - skill.max_stage_exp;
        let Some(next) = catalog.next_skill_stage(&skill.stage) else {
            skill.current_exp = skill.max_stage_exp;
            return;
        };
        let Some(next_def) = catalog.skill_stage(next) else {
            skill.current_exp = skill.max_stage_exp;
            return;
        };
        skill.stage = next.to_string();
        skill.max_stage_exp = next_def.stage_max_exp;
        skill.current_exp = overflow;
        if policy == PromotionPolicy::Single {
            return;
        }
    }
}

/// Run the cultivation promotion check and refresh the progress string.
///
/// An unknown `cultivation_level` is a hard failure. When the stage
/// requirement is met, the next stage is found through the catalog's
/// successor index (value-match on `min_exp`); a missing successor marks the
/// terminal stage, where total exp clamps to the top of that stage.
pub fn promote_cultivation(
    character: &mut Character,
    catalog: &StageCatalog,
    policy: PromotionPolicy,
) -> Result<(), SimulationError> {
    loop {
        let stage = catalog
            .cultivation_stage(&character.cultivation_level)
            .ok_or_else(|| SimulationError::UnknownStage(character.cultivation_level.clone()))?;
        let in_stage = character.cultivation_total_exp - stage.min_exp;
        if in_stage < stage.exp_required {
            break;
        }
        match catalog.next_cultivation_stage(&character.cultivation_level) {
            Some(next) => {
                character.cultivation_level = next.level.clone();
            }
            None => {
                // No stage starts where this one ends: final known stage.
                character.cultivation_total_exp = stage.min_exp + stage.exp_required;
                break;
            }
        }
        if policy == PromotionPolicy::Single {
            break;
        }
    }
    character.refresh_cultivation_progress(catalog)
}

/// Whether a run would actually feed the cultivation track: the cultivation
/// skill must exist, have hours allocated, and sit at a known skill stage.
fn trains_cultivation(
    character: &Character,
    catalog: &StageCatalog,
    allocation: &TimeAllocation,
) -> bool {
    if !character.has_cultivation_track() {
        return false;
    }
    if allocation.hours_for(&character.cultivation_skill) <= 0.0 {
        return false;
    }
    character
        .skill(&character.cultivation_skill)
        .is_some_and(|skill| catalog.skill_stage(&skill.stage).is_some())
}

/// Run `days` training days in sequence.
///
/// Day count and allocation budget are validated before any mutation, and an
/// unknown cultivation level is caught up front when the allocation would
/// train the cultivation track. Promotions only ever move the level to names
/// the catalog owns, so a run that passes these checks cannot fail mid-way:
/// on error the character is untouched, otherwise it holds the final state.
pub fn run(
    character: &mut Character,
    catalog: &StageCatalog,
    allocation: &TimeAllocation,
    days: u32,
    options: &RunOptions,
) -> Result<RunTrace, SimulationError> {
    if !(MIN_SIMULATION_DAYS..=MAX_SIMULATION_DAYS).contains(&days) {
        return Err(SimulationError::InvalidDays(days));
    }
    allocation.validate()?;
    if trains_cultivation(character, catalog, allocation)
        && catalog.cultivation_stage(&character.cultivation_level).is_none()
    {
        return Err(SimulationError::UnknownStage(
            character.cultivation_level.clone(),
        ));
    }

    let mut trace = RunTrace {
        days,
        checkpoints: Vec::new(),
    };
    for day in 1..=days {
        step(character, catalog, allocation, options.policy)?;
        if let Some(interval) = options.checkpoint_interval {
            let due = day == 1 || day == days || (interval > 0 && day % interval == 0);
            if due {
                trace.checkpoints.push(DayCheckpoint::capture(day, character));
            }
        }
    }
    Ok(trace)
}
