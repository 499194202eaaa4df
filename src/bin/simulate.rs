//! Cultivation progression simulator CLI.
//!
//! Loads a stage catalog and a character from JSON, runs the training
//! simulation, and prints a before/after report.
//!
//! Usage:
//!   cargo run --bin simulate -- --catalog catalog.json --character hero.json \
//!       --days 30 --hours 阵星引气决=6 --rest 8
//!
//! Options:
//!   --policy single|cascade   promotion policy (default: cascade)
//!   --checkpoint N            record a trace checkpoint every N days
//!   --json                    save a timestamped archive next to the report
//!   --sheet                   also print the character sheet

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process;

use serde::Deserialize;

use cultsim::allocation::TimeAllocation;
use cultsim::catalog::{CultivationStageRow, MultiplierTable, SkillStageDef, StageCatalog};
use cultsim::character::Character;
use cultsim::constants::default_skill_stage_order;
use cultsim::engine::{run, PromotionPolicy, RunOptions};
use cultsim::report::{character_sheet, ProgressionReport, SimulationArchive};

/// On-disk catalog layout: the three row tables plus an optional custom
/// skill-stage promotion order.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    skill_stages: Vec<SkillStageDef>,
    cultivation_stages: Vec<CultivationStageRow>,
    #[serde(default)]
    multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    skill_stage_order: Option<Vec<String>>,
}

#[derive(Debug)]
struct Args {
    catalog_path: String,
    character_path: String,
    days: u32,
    skill_hours: BTreeMap<String, f64>,
    rest_hours: f64,
    policy: PromotionPolicy,
    checkpoint_interval: Option<u32>,
    save_json: bool,
    print_sheet: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run_simulation() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run_simulation() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args(&env::args().collect::<Vec<_>>())?;

    let catalog_file: CatalogFile = serde_json::from_str(&fs::read_to_string(&args.catalog_path)?)?;
    let order = catalog_file
        .skill_stage_order
        .unwrap_or_else(default_skill_stage_order);
    let multipliers = MultiplierTable::from_entries(catalog_file.multipliers)?;
    let catalog = StageCatalog::build(
        catalog_file.skill_stages,
        catalog_file.cultivation_stages,
        multipliers,
        order,
    )?;
    for issue in catalog.validation_issues() {
        eprintln!("warning: {issue}");
    }

    let mut character: Character =
        serde_json::from_str(&fs::read_to_string(&args.character_path)?)?;
    let allocation = TimeAllocation::new(args.skill_hours, args.rest_hours)?;

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║            CULTIVATION PROGRESSION SIMULATOR          ║");
    println!("╚═══════════════════════════════════════════════════════╝");
    println!();
    println!("Character:  {} ({})", character.name, character.race);
    println!("Days:       {}", args.days);
    println!(
        "Allocation: {:.1}h training, {:.1}h rest",
        allocation.training_hours(),
        allocation.rest_hours
    );
    println!();

    let before = character.clone();
    let options = RunOptions {
        policy: args.policy,
        checkpoint_interval: args.checkpoint_interval,
    };
    let trace = run(&mut character, &catalog, &allocation, args.days, &options)?;

    for checkpoint in &trace.checkpoints {
        println!(
            "day {:>3}: {} ({}) total exp {}",
            checkpoint.day,
            checkpoint.cultivation_level,
            checkpoint.cultivation_progress,
            checkpoint.cultivation_total_exp
        );
    }
    if !trace.checkpoints.is_empty() {
        println!();
    }

    let report = ProgressionReport::diff(&before, &character, args.days, &allocation);
    println!("{}", report.to_text());

    if args.print_sheet {
        println!("{}", character_sheet(&character));
    }

    if args.save_json {
        let archive = SimulationArchive::new(before, character, report);
        let filename = format!(
            "simulation_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        fs::write(&filename, archive.to_json())?;
        println!("JSON archive saved to: {filename}");
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut catalog_path = None;
    let mut character_path = None;
    let mut days = None;
    let mut skill_hours = BTreeMap::new();
    let mut rest_hours = 0.0;
    let mut policy = PromotionPolicy::default();
    let mut checkpoint_interval = None;
    let mut save_json = false;
    let mut print_sheet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" => {
                catalog_path = Some(take_value(args, &mut i)?);
            }
            "--character" => {
                character_path = Some(take_value(args, &mut i)?);
            }
            "--days" => {
                let value = take_value(args, &mut i)?;
                days = Some(value.parse().map_err(|_| format!("bad day count '{value}'"))?);
            }
            "--hours" => {
                let value = take_value(args, &mut i)?;
                let (name, hours) = value
                    .split_once('=')
                    .ok_or_else(|| format!("expected skill=hours, got '{value}'"))?;
                let hours: f64 = hours
                    .parse()
                    .map_err(|_| format!("bad hours for '{name}'"))?;
                skill_hours.insert(name.to_string(), hours);
            }
            "--rest" => {
                let value = take_value(args, &mut i)?;
                rest_hours = value.parse().map_err(|_| format!("bad rest hours '{value}'"))?;
            }
            "--policy" => {
                policy = match take_value(args, &mut i)?.as_str() {
                    "single" => PromotionPolicy::Single,
                    "cascade" => PromotionPolicy::Cascade,
                    other => return Err(format!("unknown policy '{other}'")),
                };
            }
            "--checkpoint" => {
                let value = take_value(args, &mut i)?;
                checkpoint_interval =
                    Some(value.parse().map_err(|_| format!("bad interval '{value}'"))?);
            }
            "--json" => save_json = true,
            "--sheet" => print_sheet = true,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
        i += 1;
    }

    Ok(Args {
        catalog_path: catalog_path.ok_or("--catalog is required")?,
        character_path: character_path.ok_or("--character is required")?,
        days: days.ok_or("--days is required")?,
        skill_hours,
        rest_hours,
        policy,
        checkpoint_interval,
        save_json,
        print_sheet,
    })
}

fn take_value(args: &[String], i: &mut usize) -> Result<String, String> {
    if *i + 1 >= args.len() {
        return Err(format!("{} needs a value", args[*i]));
    }
    *i += 1;
    Ok(args[*i].clone())
}

fn print_usage() {
    println!("Usage: simulate --catalog FILE --character FILE --days N");
    println!("                [--hours SKILL=H]... [--rest H]");
    println!("                [--policy single|cascade] [--checkpoint N]");
    println!("                [--json] [--sheet]");
}
