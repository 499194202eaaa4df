//! Character state: skills and the cultivation track.

use serde::{Deserialize, Serialize};

use crate::catalog::StageCatalog;
use crate::error::SimulationError;

/// One learned skill and its position in the stage ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique per character.
    pub name: String,
    /// Current stage name. Must exist in the skill-stage table for training
    /// to have any effect.
    pub stage: String,
    pub current_exp: i64,
    pub max_stage_exp: i64,
}

impl Skill {
    /// Display string for the skill's in-stage progress.
    pub fn progress(&self) -> String {
        format!("{}/{}", self.current_exp, self.max_stage_exp)
    }
}

/// A simulated character.
///
/// `cultivation_total_exp` is the single source of truth for cultivation
/// progress; `cultivation_progress` is a derived display string and is never
/// read back (the legacy habit of reconstructing total exp from the display
/// string is gone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub race: String,
    pub age: i32,
    pub power_level: String,
    /// Current cultivation stage name.
    pub cultivation_level: String,
    /// Display-only "current/required" string for the active stage.
    #[serde(default)]
    pub cultivation_progress: String,
    #[serde(default)]
    pub cultivation_total_exp: i64,
    /// Name of the skill that feeds the cultivation track. Empty means the
    /// character has no cultivation track.
    #[serde(default)]
    pub cultivation_skill: String,
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub talent: String,
    #[serde(default)]
    pub comment: String,
}

impl Character {
    /// Look up a skill by name.
    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.name == name)
    }

    /// Mutable skill lookup by name.
    pub fn skill_mut(&mut self, name: &str) -> Option<&mut Skill> {
        self.skills.iter_mut().find(|skill| skill.name == name)
    }

    /// Whether the character has a cultivation track at all.
    pub fn has_cultivation_track(&self) -> bool {
        !self.cultivation_skill.is_empty()
    }

    /// Recompute `cultivation_progress` from the total-exp source of truth.
    ///
    /// The in-stage value is clamped to `[0, exp_required]` so the display
    /// string is sane even around promotion boundaries.
    pub fn refresh_cultivation_progress(
        &mut self,
        catalog: &StageCatalog,
    ) -> Result<(), SimulationError> {
        let stage = catalog
            .cultivation_stage(&self.cultivation_level)
            .ok_or_else(|| SimulationError::UnknownStage(self.cultivation_level.clone()))?;
        let in_stage = (self.cultivation_total_exp - stage.min_exp).clamp(0, stage.exp_required);
        self.cultivation_progress = format!("{}/{}", in_stage, stage.exp_required);
        Ok(())
    }
}
