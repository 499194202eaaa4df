//! Before/after progression reports.
//!
//! Pure diff computation over two character states plus rendering helpers.
//! The report is plain data; where it ends up (console, JSON file, HTTP
//! response) is the caller's business.

use serde::Serialize;

use crate::allocation::TimeAllocation;
use crate::character::Character;

/// Cultivation-track delta across a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultivationDelta {
    pub level_before: String,
    pub level_after: String,
    pub progress_before: String,
    pub progress_after: String,
    pub total_exp_before: i64,
    pub total_exp_after: i64,
}

impl CultivationDelta {
    pub fn exp_gained(&self) -> i64 {
        self.total_exp_after - self.total_exp_before
    }

    pub fn broke_through(&self) -> bool {
        self.level_before != self.level_after
    }
}

/// One skill's delta across a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDelta {
    pub name: String,
    pub stage_before: String,
    pub stage_after: String,
    pub progress_before: String,
    pub progress_after: String,
}

impl SkillDelta {
    pub fn promoted(&self) -> bool {
        self.stage_before != self.stage_after
    }
}

/// Structured diff between a character's state before and after a run.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressionReport {
    pub days: u32,
    pub training_hours_per_day: f64,
    pub rest_hours_per_day: f64,
    pub cultivation: CultivationDelta,
    /// Per-skill deltas, in the character's original skill order.
    pub skills: Vec<SkillDelta>,
}

impl ProgressionReport {
    /// Compute the diff. `before` and `after` are the same character pre-
    /// and post-run; the engine never reorders skills, so deltas pair up by
    /// position.
    pub fn diff(
        before: &Character,
        after: &Character,
        days: u32,
        allocation: &TimeAllocation,
    ) -> Self {
        let skills = before
            .skills
            .iter()
            .zip(after.skills.iter())
            .map(|(b, a)| SkillDelta {
                name: b.name.clone(),
                stage_before: b.stage.clone(),
                stage_after: a.stage.clone(),
                progress_before: b.progress(),
                progress_after: a.progress(),
            })
            .collect();

        Self {
            days,
            training_hours_per_day: allocation.training_hours(),
            rest_hours_per_day: allocation.rest_hours,
            cultivation: CultivationDelta {
                level_before: before.cultivation_level.clone(),
                level_after: after.cultivation_level.clone(),
                progress_before: before.cultivation_progress.clone(),
                progress_after: after.cultivation_progress.clone(),
                total_exp_before: before.cultivation_total_exp,
                total_exp_after: after.cultivation_total_exp,
            },
            skills,
        }
    }

    /// Render a console report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════\n");
        report.push_str("                  PROGRESSION REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════\n\n");

        report.push_str(&format!(
            "Days simulated: {} ({:.1}h training / {:.1}h rest per day)\n\n",
            self.days, self.training_hours_per_day, self.rest_hours_per_day
        ));

        report.push_str("── CULTIVATION ────────────────────────────────────────\n");
        if self.cultivation.broke_through() {
            report.push_str(&format!(
                "  Level:    {} → {}  (breakthrough!)\n",
                self.cultivation.level_before, self.cultivation.level_after
            ));
        } else {
            report.push_str(&format!("  Level:    {}\n", self.cultivation.level_after));
        }
        report.push_str(&format!(
            "  Progress: {} → {}\n",
            self.cultivation.progress_before, self.cultivation.progress_after
        ));
        report.push_str(&format!(
            "  Total exp: {} → {} (+{})\n\n",
            self.cultivation.total_exp_before,
            self.cultivation.total_exp_after,
            self.cultivation.exp_gained()
        ));

        report.push_str("── SKILLS ─────────────────────────────────────────────\n");
        for skill in &self.skills {
            if skill.promoted() {
                report.push_str(&format!(
                    "  {}: {} {} → {} {}\n",
                    skill.name,
                    skill.stage_before,
                    skill.progress_before,
                    skill.stage_after,
                    skill.progress_after
                ));
            } else {
                report.push_str(&format!(
                    "  {}: {} {} → {}\n",
                    skill.name, skill.stage_after, skill.progress_before, skill.progress_after
                ));
            }
        }

        report.push_str("\n═══════════════════════════════════════════════════════\n");
        report
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Timestamped before/after snapshot suitable for archival by a storage
/// collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationArchive {
    pub timestamp: String,
    pub before: Character,
    pub after: Character,
    pub changes: ProgressionReport,
}

impl SimulationArchive {
    pub fn new(before: Character, after: Character, changes: ProgressionReport) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            before,
            after,
            changes,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Render a character sheet in the archival text format:
///
/// ```text
/// 【姓名】：韩江（鳄族）
/// 【年龄】：19岁
/// 【实力】：黑铁
/// 【修为】：练气一层(171/1000)
/// 【技能】：微光星幕阵（精通 125/400），阵星引气决（精通 116/400）
/// 【天赋】：共生 Lv.1
/// 【评论】：籍籍无名的虫豸！
/// ```
pub fn character_sheet(character: &Character) -> String {
    let mut sheet = String::new();
    sheet.push_str(&format!(
        "【姓名】：{}（{}）\n",
        character.name, character.race
    ));
    sheet.push_str(&format!("【年龄】：{}岁\n", character.age));
    sheet.push_str(&format!("【实力】：{}\n", character.power_level));
    sheet.push_str(&format!(
        "【修为】：{}({})\n",
        character.cultivation_level, character.cultivation_progress
    ));

    let skills: Vec<String> = character
        .skills
        .iter()
        .map(|skill| format!("{}（{} {}）", skill.name, skill.stage, skill.progress()))
        .collect();
    sheet.push_str(&format!("【技能】：{}\n", skills.join("，")));

    sheet.push_str(&format!("【天赋】：{}\n", character.talent));
    sheet.push_str(&format!("【评论】：{}\n", character.comment));
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Skill;
    use std::collections::BTreeMap;

    fn character(level: &str, progress: &str, total: i64, stage: &str, exp: i64) -> Character {
        Character {
            id: 7,
            name: "韩江".to_string(),
            race: "鳄族".to_string(),
            age: 19,
            power_level: "黑铁".to_string(),
            cultivation_level: level.to_string(),
            cultivation_progress: progress.to_string(),
            cultivation_total_exp: total,
            cultivation_skill: "阵星引气决".to_string(),
            skills: vec![Skill {
                name: "阵星引气决".to_string(),
                stage: stage.to_string(),
                current_exp: exp,
                max_stage_exp: 400,
            }],
            talent: "共生 Lv.1".to_string(),
            comment: "籍籍无名的虫豸！".to_string(),
        }
    }

    fn allocation() -> TimeAllocation {
        let mut hours = BTreeMap::new();
        hours.insert("阵星引气决".to_string(), 6.0);
        TimeAllocation::new(hours, 8.0).unwrap()
    }

    #[test]
    fn test_diff_captures_deltas_in_skill_order() {
        let before = character("练气一层", "95/100", 95, "入门", 48);
        let after = character("练气二层", "5/200", 105, "熟练", 3);
        let report = ProgressionReport::diff(&before, &after, 1, &allocation());

        assert!(report.cultivation.broke_through());
        assert_eq!(report.cultivation.exp_gained(), 10);
        assert_eq!(report.skills.len(), 1);
        assert!(report.skills[0].promoted());
        assert_eq!(report.skills[0].progress_after, "3/400");
        assert_eq!(report.days, 1);
        assert_eq!(report.training_hours_per_day, 6.0);
    }

    #[test]
    fn test_no_change_reports_no_promotion() {
        let before = character("练气一层", "95/100", 95, "入门", 48);
        let report = ProgressionReport::diff(&before, &before, 5, &allocation());
        assert!(!report.cultivation.broke_through());
        assert!(!report.skills[0].promoted());
        assert_eq!(report.cultivation.exp_gained(), 0);
    }

    #[test]
    fn test_text_report_mentions_breakthrough() {
        let before = character("练气一层", "95/100", 95, "入门", 48);
        let after = character("练气二层", "5/200", 105, "熟练", 3);
        let text = ProgressionReport::diff(&before, &after, 1, &allocation()).to_text();
        assert!(text.contains("breakthrough"));
        assert!(text.contains("练气二层"));
        assert!(text.contains("阵星引气决"));
    }

    #[test]
    fn test_character_sheet_format() {
        let ch = character("练气一层", "95/100", 95, "精通", 116);
        let sheet = character_sheet(&ch);
        assert!(sheet.starts_with("【姓名】：韩江（鳄族）\n"));
        assert!(sheet.contains("【年龄】：19岁\n"));
        assert!(sheet.contains("【修为】：练气一层(95/100)\n"));
        assert!(sheet.contains("【技能】：阵星引气决（精通 116/400）\n"));
        assert!(sheet.contains("【评论】：籍籍无名的虫豸！\n"));
    }

    #[test]
    fn test_archive_serializes_with_timestamp() {
        let before = character("练气一层", "95/100", 95, "入门", 48);
        let after = character("练气二层", "5/200", 105, "熟练", 3);
        let report = ProgressionReport::diff(&before, &after, 1, &allocation());
        let archive = SimulationArchive::new(before, after, report);
        let json = archive.to_json();
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"before\""));
        assert!(json.contains("\"changes\""));
    }
}
