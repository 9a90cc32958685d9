pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "lastfit",
    about = "Lastfit sizing CLI",
    long_about = "Recommend shoe sizes from foot measurements, inspect the sizing dataset and last catalog, and check runtime readiness.",
    after_help = "Examples:\n  lastfit recommend --last alhambra --length 263 --girth 247.5\n  lastfit lasts\n  lastfit doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend sizes for one last, or for every last when --last is omitted")]
    Recommend {
        #[arg(long, help = "Last identifier, e.g. alhambra")]
        last: Option<String>,
        #[arg(long = "length", help = "Foot length in millimetres")]
        foot_length: f64,
        #[arg(long = "girth", help = "Ball girth in millimetres")]
        ball_girth: f64,
        #[arg(long = "right-length", help = "Right foot length when both feet were measured")]
        right_foot_length: Option<f64>,
        #[arg(long = "right-girth", help = "Right ball girth when both feet were measured")]
        right_ball_girth: Option<f64>,
    },
    #[command(about = "List catalogued lasts with their available widths")]
    Lasts,
    #[command(about = "Estimate the width class for a last from girth alone")]
    Width {
        #[arg(long)]
        last: String,
        #[arg(long = "length")]
        foot_length: f64,
        #[arg(long = "girth")]
        ball_girth: f64,
    },
    #[command(about = "Validate a sizing dataset file, or the configured dataset")]
    Dataset {
        #[arg(long, help = "Dataset JSON file to validate instead of the configured one")]
        path: Option<PathBuf>,
    },
    #[command(about = "Apply pending database migrations for the sqlite storage backend")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, sizing dataset, storage, and measurement readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Recommend { last, foot_length, ball_girth, right_foot_length, right_ball_girth } => {
            commands::recommend::run(RecommendArgs {
                last,
                foot_length,
                ball_girth,
                right_foot_length,
                right_ball_girth,
            })
        }
        Command::Lasts => commands::lasts::run(),
        Command::Width { last, foot_length, ball_girth } => {
            commands::width::run(&last, foot_length, ball_girth)
        }
        Command::Dataset { path } => commands::dataset::run(path.as_deref()),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let (passed, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code: if passed { 0 } else { 1 }, output }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
