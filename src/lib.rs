//! # pepper-greeter
//!
//! Speech-synchronized gesture choreography for a Pepper-class humanoid, plus an
//! interactive loop for tuning single joints against a whitelist.
//!
//! The robot, the physics world, and the speech synthesizer stay behind narrow traits
//! ([`JointActuator`], [`SimulationHarness`], [`SynthesisEngine`]). The crate owns the
//! ordering: which joints move when, where holds go, and when speech blocks.

pub mod actuator;
pub mod calibration;
pub mod cli;
pub mod clock;
pub mod config;
pub mod gesture;
pub mod harness;
pub mod joint;
pub mod session;
pub mod speech;
pub mod virtual_robot;

pub use actuator::*;
pub use calibration::*;
pub use clock::*;
pub use config::*;
pub use gesture::*;
pub use harness::*;
pub use joint::*;
pub use session::*;
pub use speech::*;
pub use virtual_robot::*;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `log_level` takes precedence over `RUST_LOG`. With a `log_file`, output is JSON.
pub fn init_logging(
    log_level: Option<&str>,
    log_file: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("creating log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}
