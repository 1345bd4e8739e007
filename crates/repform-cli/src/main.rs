//! repform command-line entry point.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::{AppConfig, ScorerKind};

#[derive(Parser)]
#[command(name = "repform", version, about = "Exercise form analysis from pose landmarks")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze recorded sessions and print one JSON outcome per session
    Analyze {
        /// Recorded session files (JSON)
        #[arg(required = true)]
        sessions: Vec<PathBuf>,

        /// Override the exercise recorded in each session
        #[arg(short, long)]
        exercise: Option<String>,

        /// Persist reports under this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay a recorded session through the live feedback loop
    Live {
        /// Recorded session file (JSON)
        replay: PathBuf,

        /// Exercise used by the policy scorer
        #[arg(short, long)]
        exercise: Option<String>,

        #[arg(long, value_enum)]
        scorer: Option<ScorerKind>,

        /// Replay pacing in frames per second
        #[arg(long)]
        fps: Option<f64>,

        /// Disable spoken feedback
        #[arg(long)]
        no_speech: bool,
    },

    /// Print the effective threshold tables
    Standards,

    /// Write a synthetic recorded session (JSON) to stdout
    Synth {
        #[arg(short, long, default_value = "squat")]
        exercise: String,

        #[arg(long, default_value_t = 60)]
        frames: usize,

        /// Knee angle at the bottom of each rep
        #[arg(long, default_value_t = 90.0)]
        bottom_knee: f64,

        /// Hip angle held through the set
        #[arg(long, default_value_t = 160.0)]
        hip: f64,

        /// Extra knee flexion on the right leg
        #[arg(long, default_value_t = 0.0)]
        asymmetry: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Analyze {
            sessions,
            exercise,
            output,
        } => {
            if output.is_some() {
                config.output.report_dir = output;
            }
            commands::analyze(&config, &sessions, exercise.as_deref())
        }
        Commands::Live {
            replay,
            exercise,
            scorer,
            fps,
            no_speech,
        } => {
            if let Some(scorer) = scorer {
                config.live.scorer = scorer;
            }
            if let Some(fps) = fps {
                config.live.frame_rate = fps;
            }
            if no_speech {
                config.live.speech_enabled = false;
            }
            commands::live(&config, &replay, exercise.as_deref())
        }
        Commands::Standards => commands::standards(&config),
        Commands::Synth {
            exercise,
            frames,
            bottom_knee,
            hip,
            asymmetry,
        } => commands::synth(&exercise, frames, bottom_knee, hip, asymmetry),
    }
}
