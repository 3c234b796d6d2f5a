use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use windfarm_aggregator::{
    detect_source, get_all_wind_farms, get_events_for_entity, get_source, get_wind_farm,
    open_database, rename_wind_farm, ImportPipeline, MatchDecision, Matcher, MatchingConfig,
};

/// Aggregate wind-farm listings into one canonical store.
#[derive(Parser, Debug)]
#[command(name = "windfarm-aggregator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = "windfarms.db")]
    db: PathBuf,

    /// JSON file with matching thresholds and reserved words
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV or JSON listing
    Import {
        /// Listing file (.csv or .json)
        file: PathBuf,
    },

    /// Show which stored wind farm a name would resolve to (no changes made)
    Resolve {
        name: String,
    },

    /// List stored wind farms
    List,

    /// Rename a wind farm
    Rename {
        id: i64,
        name: String,
    },

    /// Show the audit trail of a wind farm
    History {
        id: i64,
    },
}

/// RUST_LOG directives when set, otherwise warnings only
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() -> ExitCode {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => MatchingConfig::from_file(path)?,
        None => MatchingConfig::default(),
    };
    let matcher = Matcher::from_config(&config)?;
    let mut conn = open_database(&cli.db)?;

    match cli.command {
        Command::Import { file } => {
            let source_type = detect_source(&file)?;
            let records = get_source(source_type).parse(&file)?;
            let label = source_type.label(&file);

            let report = ImportPipeline::new(&matcher).run(&mut conn, &label, &records)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("📂 {} ({})", label, source_type.name());
                println!("✓ Created:   {}", report.created);
                println!("✓ Updated:   {}", report.updated);
                println!("✓ Unchanged: {}", report.unchanged);
                println!("✓ Skipped:   {}", report.skipped);
                for (stage, count) in &report.matches_by_stage {
                    println!("   matched via {}: {}", stage, count);
                }
            }
        }

        Command::Resolve { name } => {
            let pool = get_all_wind_farms(&conn)?;
            let decision = matcher.resolve(&name, &pool);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                match decision {
                    MatchDecision::Matched { consumed_index, stage, .. } => {
                        let farm = &pool[consumed_index];
                        println!("✓ \"{}\" → #{} {} (via {})", name, farm.id, farm.name, stage.as_str());
                    }
                    MatchDecision::NoMatch => println!("✗ \"{}\" → new wind farm", name),
                }
            }
        }

        Command::List => {
            let farms = get_all_wind_farms(&conn)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&farms)?);
            } else {
                for farm in &farms {
                    let capacity = farm
                        .capacity_mw
                        .map(|c| format!("{:.1} MW", c))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "#{:<5} {:<40} {:>10}  {}",
                        farm.id,
                        farm.name,
                        capacity,
                        farm.status.as_str()
                    );
                }
                println!("{} wind farms", farms.len());
            }
        }

        Command::Rename { id, name } => {
            rename_wind_farm(&conn, id, &name)?;
            println!("✓ #{} renamed to {}", id, name);
        }

        Command::History { id } => {
            let farm = get_wind_farm(&conn, id)?
                .with_context(|| format!("Wind farm not found: {}", id))?;
            let events = get_events_for_entity(&conn, "wind_farm", &id.to_string())?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                println!("#{} {}", farm.id, farm.name);
                for event in &events {
                    println!("  {}  {:<20} {}", event.timestamp.to_rfc3339(), event.event_type, event.data);
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
