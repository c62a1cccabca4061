use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use crate::clock::SystemClock;
use crate::config::GreeterConfig;
use crate::joint::JointWhitelist;
use crate::session::{SessionPlan, run_session};
use crate::speech::{EngineFactory, EspeakFactory, LogFactory, SpeechCuePlayer};
use crate::virtual_robot::VirtualSimulation;

#[derive(Debug, Parser)]
#[command(
    name = "pepper-greeter",
    version,
    about = "Waves hello on a virtual Pepper and optionally tunes joints interactively"
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Write logs to file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log speech instead of playing it
    #[arg(long)]
    mute: bool,

    /// Run the interactive joint calibration loop after the wave
    #[arg(long)]
    calibrate: bool,

    /// Skip the greeting wave
    #[arg(long)]
    skip_wave: bool,

    /// Stop the simulation without waiting for Enter
    #[arg(long)]
    no_pause: bool,
}

impl Cli {
    fn plan(&self) -> SessionPlan {
        SessionPlan {
            wave: !self.skip_wave,
            calibrate: self.calibrate,
            pause: !self.no_pause,
        }
    }
}

/// Parses arguments, runs one session, and returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(err) = crate::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        eprintln!("failed to initialise logging: {err:#}");
        return 1;
    }

    match execute(&cli) {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            1
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = GreeterConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(config = ?cli.config, mute = cli.mute, "starting session");

    if cli.mute {
        session_with(cli, &config, LogFactory)
    } else {
        let factory = EspeakFactory::new(config.speech.program.clone());
        session_with(cli, &config, factory)
    }
}

fn session_with<F: EngineFactory>(
    cli: &Cli,
    config: &GreeterConfig,
    factory: F,
) -> anyhow::Result<()> {
    let speaker = SpeechCuePlayer::new(factory, config.speech.clone());
    let mut simulation = VirtualSimulation::new();
    let stdin = io::stdin();

    run_session(
        &mut simulation,
        config,
        &cli.plan(),
        speaker,
        &mut SystemClock,
        JointWhitelist::pepper(),
        stdin.lock(),
        io::stdout(),
    )
    .context("greeting session")
}
