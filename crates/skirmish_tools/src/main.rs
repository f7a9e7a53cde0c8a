//! Skirmish Rules - Development Tools

use std::path::Path;

use clap::{Args, Parser, Subcommand};
use skirmish_tools::odds::{OddsReport, PoolShape};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "skirmish-tools")]
#[command(about = "Development tools for the skirmish combat rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: String,
    },
    /// Print exact success odds for a d6 pool
    Odds(OddsArgs),
}

#[derive(Args)]
struct OddsArgs {
    /// Dice rolled
    #[arg(long, default_value_t = 3)]
    dice: u32,
    /// Target number
    #[arg(long, default_value_t = 4)]
    target: u32,
    /// Added to every die
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    modifier: i32,
    /// Natural sixes score a bonus success
    #[arg(long)]
    criticals: bool,
    /// Reroll natural ones once
    #[arg(long)]
    reroll_ones: bool,
    /// Reroll failed dice once
    #[arg(long)]
    reroll_failed: bool,
    /// Defence dice to compare against
    #[arg(long)]
    vs_dice: Option<u32>,
    /// Defence target number
    #[arg(long, default_value_t = 4)]
    vs_target: u32,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => validate(&path),
        Commands::Odds(args) => odds(&args),
    }
}

fn validate(path: &str) {
    tracing::info!("Validating data files in: {path}");
    let report = match skirmish_tools::validate::validate_data_directory(Path::new(path)) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Validation failed: {e}");
            std::process::exit(1);
        }
    };

    for file in &report.valid {
        tracing::info!(file = %file.path.display(), kind = ?file.kind, items = file.items, "ok");
    }
    for (file, error) in &report.failures {
        tracing::error!(file = %file.display(), "{error}");
    }
    for name in &report.duplicate_weapons {
        tracing::error!(weapon = %name, "Weapon defined more than once");
    }

    if report.is_ok() {
        tracing::info!("Validation passed ({} files)", report.files_checked());
    } else {
        tracing::error!(
            "Validation failed: {} of {} files invalid, {} duplicate weapons",
            report.failures.len(),
            report.files_checked(),
            report.duplicate_weapons.len()
        );
        std::process::exit(1);
    }
}

fn odds(args: &OddsArgs) {
    let attack = PoolShape {
        dice: args.dice,
        target: args.target,
        modifier: args.modifier,
        criticals: args.criticals,
        reroll_ones: args.reroll_ones,
        reroll_failed: args.reroll_failed,
    }
    .to_pool();
    let defense = args
        .vs_dice
        .map(|dice| PoolShape::new(dice, args.vs_target).to_pool());

    let report = OddsReport::build(&attack, defense.as_ref());
    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", report.to_table());
    }
}
