// crates/explan-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use explan_core::{
    lazy, objects, FileHandler, JsonlHandler, Logger, StringHandler, WriterHandler, RESULT,
};
use rand::{rngs::StdRng, Rng as _, SeedableRng};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "explan",
    about = "explan reference CLI",
    long_about = "explan reference CLI.\n\nRender synthetic or scripted narrations through the hierarchical explanation logger, to stdout, a text file, or an NDJSON feed.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Render a deterministic pseudo-random nested narration.
    /// If --out ends with `.jsonl`, writes the NDJSON feed instead of text.
    Simulate {
        /// Maximum block nesting depth
        #[arg(long, default_value_t = 3)]
        depth: u32,

        /// Children explored per block (>0)
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
        fanout: u32,

        /// Seed for the narration generator
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Drop records with effective importance below this weight
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,

        /// Nesting marker repeated once per level
        #[arg(long, default_value = "*")]
        marker: String,

        /// Append wall-clock timestamps to every line
        #[arg(long, default_value_t = false)]
        timestamps: bool,

        /// Output path (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fixed narration scenarios, including a failing block.
    Demo,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Simulate {
            depth,
            fanout,
            seed,
            threshold,
            marker,
            timestamps,
            out,
        } => simulate(depth, fanout, seed, threshold, &marker, timestamps, out),

        Cmd::Demo => demo(),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
        == Some("jsonl")
}

fn simulate(
    depth: u32,
    fanout: u32,
    seed: u64,
    threshold: f64,
    marker: &str,
    timestamps: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    info!(depth, fanout, seed, threshold, "generating synthetic narration");

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.set_importance_threshold(threshold);

    match &out {
        Some(path) if is_jsonl(path) => {
            ensure_parent_dir(path)?;
            logger.add_handler(JsonlHandler::create(path.clone()));
        }
        Some(path) => {
            ensure_parent_dir(path)?;
            let mut handler = FileHandler::create(path.clone());
            handler.set_nesting_string(marker);
            handler.set_include_timestamp(timestamps);
            logger.add_handler(handler);
        }
        None => {
            let mut handler = WriterHandler::new(io::stdout());
            handler.set_nesting_string(marker);
            handler.set_include_timestamp(timestamps);
            logger.add_handler(handler);
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let units = narrate(&mut logger, &mut rng, depth, fanout, "task 1".to_owned())
        .context("narration failed")?;
    logger.close().context("closing sinks")?;

    match out {
        Some(path) => println!(
            "Narrated {units} work units (depth={depth}, fanout={fanout}) → {}",
            path.display()
        ),
        None => info!(units, "narration complete"),
    }
    Ok(())
}

/// Walk a random task tree, narrating each subtree as one block whose close
/// line reports the accumulated work through the `RESULT` placeholder.
fn narrate(
    logger: &mut Logger,
    rng: &mut StdRng,
    depth: u32,
    fanout: u32,
    label: String,
) -> Result<u64, explan_core::Error> {
    let importance = match rng.random_range(0..=2) {
        0 => 0.5,
        1 => 1.0,
        _ => 2.0,
    };
    let body_label = label.clone();
    logger.block_at(
        importance,
        objects!["Exploring ", label.clone()],
        |logger| {
            let mut units = 0u64;
            for child in 1..=fanout {
                let child_label = format!("{body_label}.{child}");
                if depth == 0 || rng.random_bool(0.4) {
                    let cost = rng.random_range(1u64..=5);
                    units += cost;
                    logger.explain(objects![
                        "Visited ",
                        child_label,
                        " costing ",
                        cost,
                        lazy(move || format!(" (running total {units})"))
                    ])?;
                } else {
                    units += narrate(logger, rng, depth - 1, fanout, child_label)?;
                }
            }
            Ok(units)
        },
        objects!["Finished ", label, ": ", RESULT, " work units"],
    )
}

fn demo() -> Result<()> {
    let capture = StringHandler::new();
    let view = capture.buffer();

    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(WriterHandler::new(io::stdout()));
    logger.add_handler(capture);

    let answer: Result<i32, explan_core::Error> = logger.block(
        objects!["Going to solve the universe"],
        |logger| {
            logger.explain(objects!["Thanks for all the fish"])?;
            Ok(42)
        },
        objects!["The answer is ", RESULT],
    );
    let answer = answer.context("solving the universe")?;
    info!(answer, "scripted block finished");

    let doomed: Result<i32, anyhow::Error> = logger.block(
        objects!["Attempting the impossible"],
        |logger| {
            logger.explain(objects!["Engaging the improbability drive"])?;
            Err(anyhow!("the improbability drive is offline"))
        },
        objects!["Reached ", RESULT],
    );
    match doomed {
        Err(error) => info!(%error, "failing block annotated and re-raised, as scripted"),
        Ok(_) => return Err(anyhow!("the doomed block was supposed to fail")),
    }

    logger.close().context("closing sinks")?;
    println!("Rendered {} demo lines", view.contents().lines().count());
    Ok(())
}
