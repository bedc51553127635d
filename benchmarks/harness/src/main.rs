//! explan-bench-harness
//!
//! Time the emission hot path in three configurations (active, inactive,
//! threshold-suppressed with lazy arguments) and append CSV rows into
//! `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p explan-bench-harness -- --profile benchmarks/configs/profiles/small.toml
//!   cargo run -p explan-bench-harness -- --profile benchmarks/configs/profiles/medium.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use explan_core::{lazy, objects, Logger, WriterHandler};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Leaf records emitted per repeat
    events: u64,
    /// Blocks enclosing the leaves
    depth: u32,
    /// Threshold used by the suppressed configuration
    threshold: f64,
    /// Repetitions of the whole emission
    repeats: u32,
}

#[derive(Clone, Copy, Debug)]
enum Config {
    /// Everything passes; records render into a discarding sink.
    Active,
    /// Whole-logger switch off; lazy arguments must never run.
    Inactive,
    /// Active but gated out by the threshold; lazy arguments must never run.
    Suppressed,
}

impl Config {
    fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suppressed => "suppressed",
        }
    }
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag(
        "profile",
        "benchmarks/configs/profiles/small.toml",
    ));
    let raw = fs::read_to_string(&profile_path)
        .with_context(|| format!("reading profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&raw)
        .with_context(|| format!("parsing profile {}", profile_path.display()))?;

    println!(
        "profile: events={} depth={} threshold={} repeats={}",
        profile.events, profile.depth, profile.threshold, profile.repeats
    );

    let mut rows = Vec::new();
    for config in [Config::Active, Config::Inactive, Config::Suppressed] {
        let elapsed = run_config(config, &profile)?;
        let emitted = profile.events * u64::from(profile.repeats);
        let ns_per_event = if emitted == 0 {
            0
        } else {
            elapsed.as_nanos() / u128::from(emitted)
        };
        println!(
            "{:<10} total={} ms  {} ns/event",
            config.label(),
            dur_ms(elapsed),
            ns_per_event
        );
        rows.push(format!(
            "{},{},{},{},{},{}",
            config.label(),
            profile.events,
            profile.depth,
            profile.repeats,
            dur_ms(elapsed),
            ns_per_event
        ));
    }

    append_report(&rows)?;
    Ok(())
}

fn run_config(config: Config, profile: &Profile) -> Result<Duration> {
    let mut total = Duration::ZERO;
    for _ in 0..profile.repeats {
        let mut logger = Logger::new();
        logger.add_handler(WriterHandler::new(std::io::sink()));
        match config {
            Config::Active => logger.set_active(true),
            Config::Inactive => logger.set_active(false),
            Config::Suppressed => {
                logger.set_active(true);
                logger.set_importance_threshold(profile.threshold);
            }
        }

        let started = Instant::now();
        emit_narration(&mut logger, profile.events, profile.depth)
            .context("emission failed mid-benchmark")?;
        total += started.elapsed();
    }
    Ok(total)
}

/// One repeat: open `depth` nested blocks, emit `events` leaves carrying a
/// lazy argument, close everything.
fn emit_narration(
    logger: &mut Logger,
    events: u64,
    depth: u32,
) -> Result<(), explan_core::Error> {
    for level in 0..depth {
        logger.start(objects!["level ", level])?;
    }
    for event in 0..events {
        logger.explain_at(
            1.0,
            objects!["event ", event, lazy(move || format!(" (#{event})"))],
        )?;
    }
    for _ in 0..depth {
        logger.end(objects!["level done"])?;
    }
    Ok(())
}

fn append_report(rows: &[String]) -> Result<()> {
    let reports = PathBuf::from("benchmarks/reports");
    fs::create_dir_all(&reports)
        .with_context(|| format!("creating {}", reports.display()))?;

    let unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = reports.join(format!("bench-{unix}.csv"));

    let mut file = fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "config,events,depth,repeats,total_ms,ns_per_event")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    println!("wrote {}", path.display());
    Ok(())
}
