//! Command line entry: load the configured tables, build a team or player partition
//! for a mode, and report feature profiles and partition shapes.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use soccer_features::{
    create_player_data, create_team_data, load_data, DataConfig, FeatureProfile, Granularity,
    Mode, PlayerSplit, PlayerTask, Table,
};

#[derive(Debug, Parser)]
#[command(name = "soccer_features")]
#[command(about = "Prepare per-team and per-player soccer action datasets", long_about = None)]
struct Cli {
    /// Directory holding the default csv files
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// JSON file overriding individual dataset paths
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the feature lists of a mode
    Profile {
        mode: Mode,

        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Check a mode's feature lists against the loaded event table
    Audit {
        mode: Mode,

        #[arg(long, value_enum, default_value_t = Split::Train)]
        table: Split,
    },

    /// Build the partition of one team
    Team {
        mode: Mode,

        #[arg(long)]
        team_id: i64,

        #[arg(long, default_value = "team_id")]
        team_col: String,

        /// Target column (defaults to the mode's target)
        #[arg(long)]
        target: Option<String>,
    },

    /// Build the partition of one player
    Player {
        mode: Mode,

        #[arg(long)]
        player_id: i64,

        /// Regression target (defaults to the mode's target)
        #[arg(long)]
        target: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Split {
    Train,
    Test,
}

fn data_config(cli: &Cli) -> Result<DataConfig> {
    match &cli.config {
        Some(path) => DataConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DataConfig::with_root(&cli.data_dir)),
    }
}

fn print_list(title: &str, names: &[String]) {
    println!("{title} ({}):", names.len());
    for name in names {
        println!("  {name}");
    }
}

/// Strip and encode a feature table, then print its shape.
fn report_features(label: &str, profile: &FeatureProfile, x: &Table) -> Result<()> {
    let stripped = profile.strip(x)?;
    let encoded = profile
        .encode(&stripped)
        .with_context(|| format!("encoding {label} features"))?;
    println!(
        "{label:<8} rows={:<6} numeric={:<4} categorical={}",
        stripped.height(),
        encoded.numeric.ncols(),
        encoded.categorical.ncols()
    );
    Ok(())
}

fn expect_granularity(mode: Mode, granularity: Granularity) -> Result<()> {
    if mode.granularity != granularity {
        bail!("mode {mode} does not match this command");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Profile { mode, json } => {
            let profile = FeatureProfile::for_mode(*mode);
            if *json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("mode {mode}, target {}", mode.task.target());
                print_list("numeric", &profile.numeric);
                print_list("categorical", &profile.categorical);
                print_list("drop", &profile.drop);
            }
        }

        Commands::Audit { mode, table } => {
            let data = load_data(&data_config(&cli)?).context("loading datasets")?;
            let (train, test) = data.event_tables(mode.task);
            let events = match table {
                Split::Train => train,
                Split::Test => test,
            };

            let audit = FeatureProfile::for_mode(*mode).audit(events.columns(), mode.task.targets());
            println!("{}", serde_json::to_string_pretty(&audit)?);
            if !audit.is_clean() {
                bail!("profile {mode} does not account for the {table:?} table");
            }
        }

        Commands::Team {
            mode,
            team_id,
            team_col,
            target,
        } => {
            expect_granularity(*mode, Granularity::Team)?;
            let data = load_data(&data_config(&cli)?).context("loading datasets")?;
            let (train, test) = data.event_tables(mode.task);
            let target = target.as_deref().unwrap_or(mode.task.target());

            info!(%mode, team_id, target, "building team partition");
            let split = create_team_data(team_col, *team_id, train, test, target)?;
            let profile = FeatureProfile::for_mode(*mode);
            report_features("train", &profile, &split.x_train)?;
            report_features("test", &profile, &split.x_test)?;
        }

        Commands::Player {
            mode,
            player_id,
            target,
        } => {
            expect_granularity(*mode, Granularity::Player)?;
            let data = load_data(&data_config(&cli)?).context("loading datasets")?;
            let (train, test) = data.event_tables(mode.task);

            let task = match (PlayerTask::for_task(mode.task), target) {
                (PlayerTask::Regression { .. }, Some(t)) => PlayerTask::Regression { target: t.clone() },
                (task, _) => task,
            };

            info!(%mode, player_id, ?task, "building player partition");
            let profile = FeatureProfile::for_mode(*mode);
            match create_player_data(&task, train, test, *player_id)? {
                PlayerSplit::Classification(split) => {
                    report_features("train", &profile, &split.x_train)?;
                    report_features("test", &profile, &split.x_test)?;
                }
                PlayerSplit::Regression(split) => {
                    report_features("train", &profile, &split.x_train)?;
                    report_features("test", &profile, &split.x_test)?;
                }
            }
        }
    }

    Ok(())
}
