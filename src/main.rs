use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

mod artifacts;
mod chart;
mod cohort;
mod config;
mod error;
mod generate;
mod ingest;
mod logging;
mod models;
mod pipeline;
mod report;
mod retention;
mod stats;

use config::{AnalysisConfig, DuplicateSignupPolicy};
use retention::{CohortFilter, RetentionEngine};

#[derive(Parser)]
#[command(name = "retention-lift")]
#[command(about = "Signup-cohort retention and A/B significance reporting", long_about = None)]
struct Cli {
    /// Log progress at info level
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, default_value = "data/events.csv")]
    input: PathBuf,
    #[arg(long, default_value = "A")]
    control: String,
    #[arg(long, default_value = "B")]
    treatment: String,
    /// Fail when a user has more than one signup row
    #[arg(long)]
    strict_signups: bool,
}

impl EngineArgs {
    fn duplicate_policy(&self) -> DuplicateSignupPolicy {
        if self.strict_signups {
            DuplicateSignupPolicy::Strict
        } else {
            DuplicateSignupPolicy::LastWins
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic event log
    Generate {
        #[arg(long, default_value = "data/events.csv")]
        out: PathBuf,
        #[arg(long, default_value_t = 800)]
        users: u32,
        #[arg(long, default_value = "2026-01-01")]
        start: NaiveDate,
        #[arg(long, default_value_t = 10)]
        signup_spread_days: u32,
        #[arg(long, default_value_t = 0.03)]
        treatment_lift: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Compute retention, lift and significance and write report artifacts
    Analyze {
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long, default_value = "outputs")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = config::DEFAULT_SIGNIFICANCE_LEVEL)]
        alpha: f64,
        #[arg(long, default_value_t = config::DEFAULT_MAX_DAY)]
        max_day: u32,
        /// Disable the Yates continuity correction
        #[arg(long)]
        no_yates: bool,
        /// Print the full result as JSON instead of the console report
        #[arg(long)]
        json: bool,
    },
    /// Retention on exactly one day after signup
    Retention {
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long)]
        day: i64,
        #[arg(long)]
        variant: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(logging::LoggingConfig::from_env(cli.log_json, cli.verbose));

    match cli.command {
        Commands::Generate {
            out,
            users,
            start,
            signup_spread_days,
            treatment_lift,
            seed,
        } => {
            let config = generate::GeneratorConfig {
                users,
                start,
                signup_spread_days,
                treatment_lift,
                seed,
            };
            let rows = generate::generate_events(&out, &config)?;
            println!("Wrote {rows} events for {users} users to {}.", out.display());
        }
        Commands::Analyze {
            engine,
            out_dir,
            alpha,
            max_day,
            no_yates,
            json,
        } => {
            let config = AnalysisConfig {
                significance_level: alpha,
                max_day,
                control: engine.control.clone(),
                treatment: engine.treatment.clone(),
                yates_correction: !no_yates,
                duplicate_policy: engine.duplicate_policy(),
            };
            let (result, paths) = pipeline::run(&engine.input, &out_dir, &config)?;

            if json {
                let rendered = serde_json::to_string_pretty(&result)
                    .context("failed to serialize analysis result")?;
                println!("{rendered}");
            } else {
                print!("{}", report::build_console_report(&result, &config));
                println!();
                for path in [&paths.ab_table, &paths.curve_table, &paths.curve_chart, &paths.summary] {
                    println!("Saved: {}", path.display());
                }
            }
        }
        Commands::Retention {
            engine,
            day,
            variant,
        } => {
            let events = ingest::load_events(&engine.input)?;
            let retention = RetentionEngine::from_events(&events, engine.duplicate_policy())?;
            let filter = match variant.as_deref() {
                Some(label) => CohortFilter::Variant(label),
                None => CohortFilter::All,
            };
            let rate = retention.day_retention(day, filter);
            println!(
                "D{day} retention ({}): {}%",
                variant.as_deref().unwrap_or("overall"),
                report::format_number(stats::round_to(rate * 100.0, 2))
            );
        }
    }

    Ok(())
}
