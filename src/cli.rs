use std::path::Path;

use crate::export::export_aggregate;
use crate::monte_carlo::aggregate;
use crate::parallel::{run_enhancement_batches, Progress, WorkerPool};
use crate::sim::{
    load_rate_table, run_recorded, EnhanceConfig, RateTable, ResourceLimits, PATH_ORIGINS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Analyze,
    Validate,
    Rates,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("analyze") => Some(Command::Analyze),
        Some("validate") => Some(Command::Validate),
        Some("rates") => Some(Command::Rates),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Analyze) => handle_analyze(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Rates) => handle_rates(),
        None => {
            eprintln!("usage: awaken <simulate|analyze|validate|rates>");
            2
        }
    }
}

/// Shared config flags: `--blessings=t1,t2,t3 --ward=N --path-a --path-b`.
fn config_from_flags(args: &[String], start_tier: u8, target_tier: u8) -> EnhanceConfig {
    let mut config = EnhanceConfig::for_tiers(start_tier, target_tier);
    if let Some(raw) = flag_value(args, "--blessings") {
        let mut tiers = raw.split(',').map(|part| part.trim().parse::<u8>());
        for slot in 0..3 {
            if let Some(Ok(tier)) = tiers.next() {
                config.blessing_tiers[slot] = tier;
            }
        }
    }
    if let Some(raw) = flag_value(args, "--ward") {
        config.ward_tier = parse_or_default(raw, "ward", 0);
    }
    config.use_path_a = has_flag(args, "--path-a");
    config.use_path_b = has_flag(args, "--path-b");
    config
}

fn handle_simulate(args: &[String]) -> i32 {
    let positionals = positionals(args);
    let start = parse_or_default(positionals.first().copied().unwrap_or(""), "start", 0u8);
    let target = parse_or_default(positionals.get(1).copied().unwrap_or(""), "target", 10u8);
    let seed = parse_or_default(positionals.get(2).copied().unwrap_or(""), "seed", 7u64);
    let as_table = has_flag(args, "--table");

    let config = config_from_flags(args, start, target);
    let table = RateTable::default();

    let record = match run_recorded(&config, &table, Some(seed)) {
        Ok(record) => record,
        Err(err) => {
            eprintln!("simulate failed: {err}");
            return 1;
        }
    };

    if as_table {
        println!("start\ttarget\tseed\tattempts\tcost\tfinal_tier");
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            start,
            target,
            seed,
            record.totals.attempts,
            record.totals.cost,
            record.totals.final_tier
        );
    } else {
        match serde_json::to_string_pretty(&record) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize run record: {err}");
                return 1;
            }
        }
    }

    0
}

fn handle_analyze(args: &[String]) -> i32 {
    let positionals = positionals(args);
    let runs = parse_or_default(positionals.first().copied().unwrap_or(""), "runs", 5000usize);
    let seed = parse_or_default(positionals.get(1).copied().unwrap_or(""), "seed", 7u64);
    let start = flag_value(args, "--start")
        .map(|raw| parse_or_default(raw, "start", 0u8))
        .unwrap_or(0);
    let target = flag_value(args, "--target")
        .map(|raw| parse_or_default(raw, "target", 10u8))
        .unwrap_or(10);
    let workers = flag_value(args, "--workers")
        .map(|raw| parse_or_default(raw, "workers", 0usize))
        .unwrap_or(0);

    let config = config_from_flags(args, start, target);
    let table = RateTable::default();
    let limits = ResourceLimits {
        stones: flag_value(args, "--stones").map(|raw| parse_or_default(raw, "stones", u64::MAX)),
        blessings: [None; 3],
        wards: flag_value(args, "--wards").map(|raw| parse_or_default(raw, "wards", u64::MAX)),
        cores: flag_value(args, "--cores").map(|raw| parse_or_default(raw, "cores", u64::MAX)),
    };

    let pool = WorkerPool::with_workers(workers);
    let progress = Progress::new(runs);
    let totals =
        match run_enhancement_batches(&config, &table, runs, seed, &limits, &pool, &progress) {
            Ok(totals) => totals,
            Err(err) => {
                eprintln!("analyze failed: {err}");
                return 1;
            }
        };
    let result = aggregate(&totals);

    if let Some(dir) = flag_value(args, "--csv") {
        match export_aggregate(Path::new(dir), &result) {
            Ok(written) => {
                for path in written {
                    eprintln!("wrote {}", path.display());
                }
            }
            Err(err) => {
                eprintln!("csv export failed: {err}");
                return 1;
            }
        }
    }

    match serde_json::to_string_pretty(&result) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize aggregate: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = positionals(args).first().copied() else {
        eprintln!("usage: awaken validate <rate-table.json>");
        return 2;
    };

    let table = match load_rate_table(Path::new(path)) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let issues = table.validate();
    if issues.is_empty() {
        println!("validation passed: {path}");
        0
    } else {
        eprintln!("validation failed: {} issue(s)", issues.len());
        for issue in issues {
            eprintln!("- {issue}");
        }
        1
    }
}

fn handle_rates() -> i32 {
    let table = RateTable::default();
    match serde_json::to_string_pretty(&table) {
        Ok(payload) => println!("{payload}"),
        Err(err) => {
            eprintln!("failed to serialize rate table: {err}");
            return 1;
        }
    }
    for (index, path) in table.paths.iter().enumerate() {
        let origin = PATH_ORIGINS[index];
        println!(
            "path {} ({} -> {}): expected {:.1} sub-attempts",
            if index == 0 { "A" } else { "B" },
            origin,
            origin + 1,
            path.expected_total_attempts()
        );
    }
    0
}

/// Positional arguments after the command, flags excluded.
fn positionals(args: &[String]) -> Vec<&str> {
    args.iter()
        .skip(2)
        .filter(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .collect()
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

/// Value of a `--name=value` flag.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter().find_map(|arg| {
        arg.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display + Copy>(
    raw: &str,
    name: &str,
    default: T,
) -> T {
    if raw.is_empty() {
        return default;
    }
    raw.parse::<T>().unwrap_or_else(|_| {
        eprintln!("invalid {name} '{raw}', defaulting to {default}");
        default
    })
}
