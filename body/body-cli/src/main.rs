//! `bodyscale`: reshape base body meshes from the command line.
//!
//! # Commands
//!
//! - `bodyscale scale <BASE> <OUTPUT> <HEIGHT> <WEIGHT> [TEXTURE]` - run one
//!   scaling job in this process. This is the engine `generate` launches.
//! - `bodyscale generate --gender male --height 180 --weight 80 --nickname bob` -
//!   file a model under the configured output directory and print its URL
//! - `bodyscale clean` - empty the output directory
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

mod jobs;
mod scale;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use body_jobs::status::EXIT_USAGE;
use body_jobs::{EngineConfig, JobError, ServerConfig};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Body proportion mesh scaler
#[derive(Parser)]
#[command(name = "bodyscale")]
#[command(about = "Reshape rigged body meshes to a target height and weight", long_about = None)]
#[command(version)]
struct Cli {
    /// Server configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scale one base mesh and write a skeleton-free GLB
    Scale {
        /// Rigged base mesh (GLB)
        base: PathBuf,
        /// Output GLB path
        output: PathBuf,
        /// Target height in centimeters
        #[arg(allow_negative_numbers = true)]
        height: f64,
        /// Target weight in kilograms
        #[arg(allow_negative_numbers = true)]
        weight: f64,
        /// Replacement texture image (PNG or JPEG)
        texture: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a model for an owner and print its public URL
    Generate {
        /// male or female
        #[arg(long)]
        gender: String,
        /// Height in centimeters
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        /// Age in years
        #[arg(long, default_value_t = 0)]
        age: u32,
        /// Texture file name in the clothes directory
        #[arg(long)]
        texture: Option<String>,
        /// Owner the model is filed under
        #[arg(long)]
        nickname: String,
    },

    /// Remove every generated model
    Clean {
        /// Directory to empty (defaults to the configured output directory)
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scale {
            base,
            output,
            height,
            weight,
            texture,
            json,
        } => scale::run(&base, &output, height, weight, texture, json),
        Commands::Generate {
            gender,
            height,
            weight,
            age,
            texture,
            nickname,
        } => finish(load_config(cli.config).and_then(|config| {
            jobs::generate(
                &config,
                body_jobs::GenerateRequest {
                    gender,
                    height,
                    weight,
                    age,
                    texture,
                    nickname,
                },
            )
        })),
        Commands::Clean { dir } => finish(
            load_config(cli.config).and_then(|config| jobs::clean(&config, dir.as_deref())),
        ),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The configured server, or the default layout with this binary as engine.
fn load_config(path: Option<PathBuf>) -> Result<ServerConfig> {
    if let Some(path) = path {
        return ServerConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    let exe = std::env::current_exe().context("Failed to locate the bodyscale executable")?;
    Ok(ServerConfig::default().with_engine(EngineConfig::new(exe).with_args(["scale"])))
}

/// Print a failure. Rejected requests exit with the usage code.
fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "✗".red().bold());
            let rejected = e
                .downcast_ref::<JobError>()
                .is_some_and(JobError::is_client_error);
            if rejected {
                ExitCode::from(scale::exit_byte(EXIT_USAGE))
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
