//! Stage catalogs: skill stages, cultivation stages, and rate multipliers.
//!
//! Catalogs are built once from rows supplied by a collaborator (storage
//! layer, config file, test fixture) and are immutable for the lifetime of a
//! simulation run. Construction derives the cumulative `min_exp` thresholds
//! and precomputes the cultivation successor index so promotion checks never
//! scan the table.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::error::CatalogError;

/// One rank in the skill-stage table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillStageDef {
    pub name: String,
    /// Experience needed to clear this stage.
    pub stage_max_exp: i64,
    /// Experience gained per training hour at this stage.
    pub avg_rate: f64,
}

/// Input row for one cultivation stage, as supplied by a collaborator.
///
/// `min_exp` is not part of the row; the catalog derives it at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultivationStageRow {
    pub level: String,
    /// Experience needed to clear this stage.
    pub exp_required: i64,
    /// Cultivation experience gained per training hour, before multipliers.
    pub base_rate: f64,
    /// Nominal days expected at this stage. Informational only.
    #[serde(default)]
    pub time_required: i64,
    /// Position in the stage ladder. Contiguous, ascending.
    pub order: i32,
    /// Name of the stage one rung below, if any.
    #[serde(default)]
    pub previous: Option<String>,
}

/// A cultivation stage with its derived cumulative threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct CultivationStageDef {
    pub level: String,
    pub exp_required: i64,
    pub base_rate: f64,
    pub time_required: i64,
    pub order: i32,
    pub previous: Option<String>,
    /// Total experience needed to *enter* this stage: the prefix sum of
    /// `exp_required` over all stages with smaller `order`. Computed once at
    /// build time, never mutated.
    pub min_exp: i64,
}

/// Non-fatal problems found while building a catalog.
///
/// The catalog is still usable when these are present; they are logged and
/// kept on the catalog for callers that want to surface them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationIssue {
    #[error("cultivation stage '{stage}' references unknown previous stage '{previous}'")]
    MissingPrevious { stage: String, previous: String },

    #[error(
        "cultivation stage '{stage}' (order {order}) has previous '{previous}' \
         with order {previous_order}, expected {expected}"
    )]
    BrokenOrderLink {
        stage: String,
        order: i32,
        previous: String,
        previous_order: i32,
        expected: i32,
    },
}

/// Maps a skill-stage name to the cultivation-rate bonus it grants.
/// Stages absent from the table get a neutral 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiplierTable {
    entries: BTreeMap<String, f64>,
}

impl MultiplierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw entries, rejecting non-positive multipliers.
    pub fn from_entries(entries: BTreeMap<String, f64>) -> Result<Self, CatalogError> {
        for (name, &multiplier) in &entries {
            if multiplier <= 0.0 {
                return Err(CatalogError::NonPositiveMultiplier {
                    name: name.clone(),
                    value: multiplier,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Multiplier for a skill stage, defaulting to 1.0 when unmapped.
    pub fn multiplier_for(&self, stage: &str) -> f64 {
        self.entries.get(stage).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable lookup tables for skill and cultivation stages.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    skill_stages: HashMap<String, SkillStageDef>,
    /// Fixed promotion order for skill stages, supplied at build time.
    skill_stage_order: Vec<String>,
    cultivation_stages: HashMap<String, CultivationStageDef>,
    /// Precomputed successor index: stage name -> name of the stage whose
    /// `min_exp` equals this stage's `min_exp + exp_required`. A missing
    /// entry marks the terminal stage.
    cultivation_successors: HashMap<String, String>,
    multipliers: MultiplierTable,
    issues: Vec<ValidationIssue>,
}

impl StageCatalog {
    /// Build a catalog from collaborator-supplied rows.
    ///
    /// Derives `min_exp` prefix sums by ascending `order` and precomputes
    /// the cultivation successor index. Broken `previous` links are recorded
    /// as [`ValidationIssue`]s and logged, but do not fail the build; hard
    /// [`CatalogError`]s are reserved for structurally unusable input
    /// (duplicates, non-positive requirements, negative rates).
    pub fn build(
        skill_rows: Vec<SkillStageDef>,
        cultivation_rows: Vec<CultivationStageRow>,
        multipliers: MultiplierTable,
        skill_stage_order: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let mut skill_stages = HashMap::with_capacity(skill_rows.len());
        for row in skill_rows {
            if row.stage_max_exp <= 0 {
                return Err(CatalogError::NonPositiveStageMax {
                    name: row.name,
                    value: row.stage_max_exp,
                });
            }
            if row.avg_rate < 0.0 {
                return Err(CatalogError::NegativeRate {
                    name: row.name,
                    value: row.avg_rate,
                });
            }
            if skill_stages.insert(row.name.clone(), row.clone()).is_some() {
                return Err(CatalogError::DuplicateSkillStage(row.name));
            }
        }

        let mut rows = cultivation_rows;
        rows.sort_by_key(|row| row.order);

        let mut seen_orders: HashMap<i32, String> = HashMap::new();
        let mut cultivation_stages = HashMap::with_capacity(rows.len());
        let mut running_total: i64 = 0;
        for row in rows {
            if row.exp_required <= 0 {
                return Err(CatalogError::NonPositiveExpRequired {
                    name: row.level,
                    value: row.exp_required,
                });
            }
            if row.base_rate < 0.0 {
                return Err(CatalogError::NegativeRate {
                    name: row.level,
                    value: row.base_rate,
                });
            }
            if let Some(first) = seen_orders.insert(row.order, row.level.clone()) {
                return Err(CatalogError::DuplicateOrder {
                    order: row.order,
                    first,
                    second: row.level,
                });
            }

            let def = CultivationStageDef {
                min_exp: running_total,
                level: row.level.clone(),
                exp_required: row.exp_required,
                base_rate: row.base_rate,
                time_required: row.time_required,
                order: row.order,
                previous: row.previous,
            };
            running_total += def.exp_required;
            if cultivation_stages.insert(row.level.clone(), def).is_some() {
                return Err(CatalogError::DuplicateCultivationStage(row.level));
            }
        }

        let issues = validate_links(&cultivation_stages);
        for issue in &issues {
            warn!("catalog: {issue}");
        }

        // Successor index by value-match on min_exp. With contiguous prefix
        // sums this lands on the next rung; if no stage's min_exp matches,
        // the stage is terminal and promotion clamps there.
        let by_min_exp: HashMap<i64, &str> = cultivation_stages
            .values()
            .map(|def| (def.min_exp, def.level.as_str()))
            .collect();
        let cultivation_successors = cultivation_stages
            .values()
            .filter_map(|def| {
                by_min_exp
                    .get(&(def.min_exp + def.exp_required))
                    .map(|next| (def.level.clone(), next.to_string()))
            })
            .collect();

        Ok(Self {
            skill_stages,
            skill_stage_order,
            cultivation_stages,
            cultivation_successors,
            multipliers,
            issues,
        })
    }

    /// Skill-stage definition by name, if the table knows it.
    pub fn skill_stage(&self, name: &str) -> Option<&SkillStageDef> {
        self.skill_stages.get(name)
    }

    /// Cultivation-stage definition by level name, if the table knows it.
    pub fn cultivation_stage(&self, level: &str) -> Option<&CultivationStageDef> {
        self.cultivation_stages.get(level)
    }

    /// Next cultivation stage above `level`, or `None` at the terminal stage.
    pub fn next_cultivation_stage(&self, level: &str) -> Option<&CultivationStageDef> {
        let next = self.cultivation_successors.get(level)?;
        self.cultivation_stages.get(next)
    }

    /// Next skill stage after `current` in the fixed promotion order.
    ///
    /// Walks the order list and returns the first later name that also
    /// exists in the skill-stage table; gaps in the table are skipped.
    pub fn next_skill_stage(&self, current: &str) -> Option<&str> {
        let position = self
            .skill_stage_order
            .iter()
            .position(|name| name == current)?;
        self.skill_stage_order[position + 1..]
            .iter()
            .map(String::as_str)
            .find(|name| self.skill_stages.contains_key(*name))
    }

    /// The fixed skill-stage promotion order this catalog was built with.
    pub fn skill_stage_order(&self) -> &[String] {
        &self.skill_stage_order
    }

    /// Multiplier for a skill stage, defaulting to 1.0.
    pub fn multiplier_for(&self, stage: &str) -> f64 {
        self.multipliers.multiplier_for(stage)
    }

    /// Non-fatal problems recorded during construction.
    pub fn validation_issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

/// Check every `previous` link: the named stage must exist and sit exactly
/// one rung below. Violations are warnings, matching the legacy loader.
fn validate_links(stages: &HashMap<String, CultivationStageDef>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut ordered: Vec<&CultivationStageDef> = stages.values().collect();
    ordered.sort_by_key(|def| def.order);

    for def in ordered {
        let Some(previous) = def.previous.as_deref() else {
            continue;
        };
        match stages.get(previous) {
            None => issues.push(ValidationIssue::MissingPrevious {
                stage: def.level.clone(),
                previous: previous.to_string(),
            }),
            Some(prev) if prev.order != def.order - 1 => {
                issues.push(ValidationIssue::BrokenOrderLink {
                    stage: def.level.clone(),
                    order: def.order,
                    previous: previous.to_string(),
                    previous_order: prev.order,
                    expected: def.order - 1,
                })
            }
            Some(_) => {}
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::default_skill_stage_order;

    fn skill_rows() -> Vec<SkillStageDef> {
        vec![
            SkillStageDef {
                name: "入门".to_string(),
                stage_max_exp: 50,
                avg_rate: 1.0,
            },
            SkillStageDef {
                name: "熟练".to_string(),
                stage_max_exp: 200,
                avg_rate: 0.8,
            },
            SkillStageDef {
                name: "精通".to_string(),
                stage_max_exp: 400,
                avg_rate: 0.5,
            },
        ]
    }

    fn cultivation_rows() -> Vec<CultivationStageRow> {
        vec![
            CultivationStageRow {
                level: "练气一层".to_string(),
                exp_required: 100,
                base_rate: 1.0,
                time_required: 30,
                order: 1,
                previous: None,
            },
            CultivationStageRow {
                level: "练气二层".to_string(),
                exp_required: 200,
                base_rate: 1.2,
                time_required: 60,
                order: 2,
                previous: Some("练气一层".to_string()),
            },
            CultivationStageRow {
                level: "练气三层".to_string(),
                exp_required: 400,
                base_rate: 1.5,
                time_required: 90,
                order: 3,
                previous: Some("练气二层".to_string()),
            },
        ]
    }

    fn build_catalog() -> StageCatalog {
        StageCatalog::build(
            skill_rows(),
            cultivation_rows(),
            MultiplierTable::new(),
            default_skill_stage_order(),
        )
        .expect("catalog should build")
    }

    #[test]
    fn test_min_exp_prefix_sums() {
        let catalog = build_catalog();
        assert_eq!(catalog.cultivation_stage("练气一层").unwrap().min_exp, 0);
        assert_eq!(catalog.cultivation_stage("练气二层").unwrap().min_exp, 100);
        assert_eq!(catalog.cultivation_stage("练气三层").unwrap().min_exp, 300);
    }

    #[test]
    fn test_successor_index_by_value_match() {
        let catalog = build_catalog();
        assert_eq!(
            catalog.next_cultivation_stage("练气一层").unwrap().level,
            "练气二层"
        );
        assert_eq!(
            catalog.next_cultivation_stage("练气二层").unwrap().level,
            "练气三层"
        );
    }

    #[test]
    fn test_terminal_stage_has_no_successor() {
        let catalog = build_catalog();
        assert!(catalog.next_cultivation_stage("练气三层").is_none());
        assert!(catalog.next_cultivation_stage("不存在").is_none());
    }

    #[test]
    fn test_next_skill_stage_walks_fixed_order() {
        let catalog = build_catalog();
        assert_eq!(catalog.next_skill_stage("入门"), Some("熟练"));
        assert_eq!(catalog.next_skill_stage("熟练"), Some("精通"));
        // 精通 is the last stage present in the table; 专家/大师/宗师 are
        // in the order list but not loaded, so there is nowhere to go.
        assert_eq!(catalog.next_skill_stage("精通"), None);
        assert_eq!(catalog.next_skill_stage("未知阶段"), None);
    }

    #[test]
    fn test_next_skill_stage_skips_gaps_in_table() {
        let mut rows = skill_rows();
        rows.remove(1); // drop 熟练 from the table, keep it in the order
        let catalog = StageCatalog::build(
            rows,
            cultivation_rows(),
            MultiplierTable::new(),
            default_skill_stage_order(),
        )
        .unwrap();
        assert_eq!(catalog.next_skill_stage("入门"), Some("精通"));
    }

    #[test]
    fn test_broken_links_are_warnings_not_errors() {
        let mut rows = cultivation_rows();
        rows[1].previous = Some("筑基".to_string()); // unknown stage
        rows[2].previous = Some("练气一层".to_string()); // wrong rung
        let catalog = StageCatalog::build(
            skill_rows(),
            rows,
            MultiplierTable::new(),
            default_skill_stage_order(),
        )
        .expect("broken links must not fail the build");

        assert_eq!(catalog.validation_issues().len(), 2);
        assert!(matches!(
            catalog.validation_issues()[0],
            ValidationIssue::MissingPrevious { .. }
        ));
        assert!(matches!(
            catalog.validation_issues()[1],
            ValidationIssue::BrokenOrderLink { expected: 2, .. }
        ));
        // Still fully usable.
        assert_eq!(
            catalog.next_cultivation_stage("练气一层").unwrap().level,
            "练气二层"
        );
    }

    #[test]
    fn test_duplicate_order_is_hard_error() {
        let mut rows = cultivation_rows();
        rows[2].order = 2;
        let result = StageCatalog::build(
            skill_rows(),
            rows,
            MultiplierTable::new(),
            default_skill_stage_order(),
        );
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateOrder { order: 2, .. })
        ));
    }

    #[test]
    fn test_non_positive_requirements_are_hard_errors() {
        let mut rows = skill_rows();
        rows[0].stage_max_exp = 0;
        assert!(matches!(
            StageCatalog::build(
                rows,
                cultivation_rows(),
                MultiplierTable::new(),
                default_skill_stage_order(),
            ),
            Err(CatalogError::NonPositiveStageMax { .. })
        ));

        let mut rows = cultivation_rows();
        rows[0].exp_required = -10;
        assert!(matches!(
            StageCatalog::build(
                skill_rows(),
                rows,
                MultiplierTable::new(),
                default_skill_stage_order(),
            ),
            Err(CatalogError::NonPositiveExpRequired { .. })
        ));
    }

    #[test]
    fn test_multiplier_defaults_to_one() {
        let mut entries = BTreeMap::new();
        entries.insert("精通".to_string(), 1.5);
        let table = MultiplierTable::from_entries(entries).unwrap();
        assert_eq!(table.multiplier_for("精通"), 1.5);
        assert_eq!(table.multiplier_for("入门"), 1.0);
    }

    #[test]
    fn test_multiplier_rejects_non_positive() {
        let mut entries = BTreeMap::new();
        entries.insert("入门".to_string(), 0.0);
        assert!(matches!(
            MultiplierTable::from_entries(entries),
            Err(CatalogError::NonPositiveMultiplier { .. })
        ));
    }
}
