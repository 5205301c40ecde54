#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the farm survey dashboard.
//!
//! Summarizes a survey data directory, replays a recorded list of chart
//! interactions against it, or starts the API server. Without a
//! subcommand the user picks a tool interactively.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use farm_map_dashboard::{Dashboard, DashboardConfig, DashboardError, charts};
use farm_map_dashboard_models::{ChartKind, Interaction};

#[derive(Parser)]
#[command(name = "farm_map_cli", about = "Farm survey dashboard tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print farm, country, and farm-size counts for a data directory
    Summary {
        /// Directory holding the survey input files (defaults to `FARM_MAP_DATA_DIR` or `data/`)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Apply a JSON array of interactions and print the resulting chart views
    Replay {
        /// JSON file with the interactions to apply, in order
        events: PathBuf,
        /// Directory holding the survey input files (defaults to `FARM_MAP_DATA_DIR` or `data/`)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Start the API server
    Serve,
}

/// Tools offered in interactive mode.
enum Tool {
    Summary,
    Replay,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Summary, Self::Server, Self::Replay];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Summarize survey data",
            Self::Server => "Start server",
            Self::Replay => "Replay interactions",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive();
    };

    match command {
        Commands::Summary { data_dir } => summary(&resolve_data_dir(data_dir))?,
        Commands::Replay { events, data_dir } => replay(&resolve_data_dir(data_dir), &events)?,
        Commands::Serve => {
            actix_web::rt::System::new().block_on(farm_map_server::run_server())?;
        }
    }

    Ok(())
}

fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    println!("Farm Map Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Summary => summary(&resolve_data_dir(None))?,
        Tool::Replay => {
            let events: String = Input::new()
                .with_prompt("Interactions file")
                .interact_text()?;
            replay(&resolve_data_dir(None), Path::new(&events))?;
        }
        Tool::Server => {
            actix_web::rt::System::new().block_on(farm_map_server::interactive::run())?;
        }
    }

    Ok(())
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        std::env::var("FARM_MAP_DATA_DIR")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map_or_else(farm_map_dataset::paths::data_dir, PathBuf::from)
    })
}

fn load_dashboard(data_dir: &Path) -> Result<Dashboard, DashboardError> {
    log::info!("Loading survey data from {}", data_dir.display());
    Dashboard::load(data_dir, DashboardConfig::default()).inspect_err(|e| {
        log::error!("Failed to load survey data: {e}");
    })
}

fn summary(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = load_dashboard(data_dir)?;
    let state = dashboard.state();
    let dataset = state.dataset();

    println!("Farms:     {}", dataset.farms().len());
    println!("Visible:   {}", dashboard.summary().farm_count);
    println!("Countries: {}", dataset.countries().len());
    println!();

    let bar = charts::bar::build(state);
    let mut header = format!("{:<8}", "USERS");
    for legend in &bar.buckets {
        header.push_str(&format!(" {:>12}", legend.label));
    }
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    for row in &bar.rows {
        let mut line = format!("{:<8}", row.number_of_users);
        for legend in &bar.buckets {
            let count = row.counts.get(&legend.bucket).copied().unwrap_or(0);
            line.push_str(&format!(" {count:>12}"));
        }
        println!("{line}");
    }

    Ok(())
}

fn parse_events(json: &str) -> Result<Vec<Interaction>, serde_json::Error> {
    serde_json::from_str(json)
}

fn replay(data_dir: &Path, events: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let interactions = parse_events(&std::fs::read_to_string(events)?)?;
    log::info!(
        "Replaying {} interactions against {}",
        interactions.len(),
        data_dir.display()
    );

    let mut dashboard = load_dashboard(data_dir)?;

    for interaction in &interactions {
        let outcome = dashboard.handle(interaction, Instant::now())?;
        log::info!(
            "{}: changed={} immediate={:?} deferred={:?}",
            outcome.event,
            outcome.changed,
            outcome.immediate,
            outcome.deferred
        );
    }

    let ran = dashboard.flush_deferred();
    log::debug!("Flushed deferred redraws: {ran:?}");

    let mut views = serde_json::Map::new();
    for &kind in ChartKind::all() {
        if let Some(view) = dashboard.chart_view(kind)? {
            views.insert(kind.to_string(), view);
        }
    }

    let report = serde_json::json!({
        "summary": dashboard.summary(),
        "filters": dashboard.filters(),
        "charts": views,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use farm_map_dashboard_models::{AreaBucket, BarMode};

    use super::*;

    #[test]
    fn parses_recorded_interactions() {
        let events = parse_events(
            r#"[
                {"type": "toggle_area_bucket", "bucket": 10000},
                {"type": "set_bar_mode", "mode": "count"},
                {"type": "reset_map"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            events,
            vec![
                Interaction::ToggleAreaBucket {
                    bucket: AreaBucket(10_000)
                },
                Interaction::SetBarMode {
                    mode: BarMode::Count
                },
                Interaction::ResetMap,
            ]
        );
    }

    #[test]
    fn rejects_unknown_interactions() {
        assert!(parse_events(r#"[{"type": "zoom"}]"#).is_err());
    }

    #[test]
    fn missing_data_dir_is_a_dataset_error() {
        let dir = std::env::temp_dir().join(format!("farm_map_cli_missing_{}", std::process::id()));
        assert!(matches!(load_dashboard(&dir), Err(DashboardError::Dataset(_))));
    }

    #[test]
    fn explicit_data_dir_wins() {
        assert_eq!(
            resolve_data_dir(Some(PathBuf::from("/srv/survey"))),
            PathBuf::from("/srv/survey")
        );
    }
}
