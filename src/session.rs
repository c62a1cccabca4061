//! Top-level run: simulation lifecycle around the gesture and the calibration loop.

use crate::actuator::{ActuatorError, JointActuator};
use crate::calibration::{CalibrationError, CalibrationLoop};
use crate::clock::{Clock, units_to_duration};
use crate::config::GreeterConfig;
use crate::gesture::{Choreographer, Choreography, ChoreographyError};
use crate::harness::{HarnessError, SimulationHarness};
use crate::joint::JointWhitelist;
use crate::speech::Speaker;
use std::io::{self, BufRead, Write};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Harness(#[from] HarnessError),
    #[error("initial posture failed")]
    Posture(#[source] ActuatorError),
    #[error(transparent)]
    Choreography(#[from] ChoreographyError),
    #[error("calibration aborted")]
    Calibration(#[from] CalibrationError),
    #[error("operator console")]
    Io(#[from] io::Error),
}

/// What a session does between spawn and stop.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionPlan {
    pub wave: bool,
    pub calibrate: bool,
    /// Wait for Enter before tearing the simulation down.
    pub pause: bool,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            wave: true,
            calibrate: false,
            pause: true,
        }
    }
}

/// Launches the simulation, spawns the robot, runs `plan`, and stops the simulation.
///
/// `stop` runs exactly once, even if a step fails; the first failure is returned.
#[allow(clippy::too_many_arguments)]
pub fn run_session<H, S, C, R, W>(
    harness: &mut H,
    config: &GreeterConfig,
    plan: &SessionPlan,
    speaker: S,
    clock: &mut C,
    whitelist: JointWhitelist,
    mut input: R,
    mut output: W,
) -> Result<(), SessionError>
where
    H: SimulationHarness,
    S: Speaker,
    C: Clock,
    R: BufRead,
    W: Write,
{
    let session = harness.launch()?;
    let outcome = match harness.spawn_robot(&session, &config.spawn) {
        Ok(mut robot) => perform(
            &mut robot,
            config,
            plan,
            speaker,
            clock,
            whitelist,
            &mut input,
            &mut output,
        ),
        Err(err) => Err(err.into()),
    };
    if let Err(err) = &outcome {
        error!(error = %err, "session failed");
    }

    let stopped = harness.stop(session);
    outcome?;
    stopped?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn perform<A, S, C, R, W>(
    robot: &mut A,
    config: &GreeterConfig,
    plan: &SessionPlan,
    speaker: S,
    clock: &mut C,
    whitelist: JointWhitelist,
    input: &mut R,
    output: &mut W,
) -> Result<(), SessionError>
where
    A: JointActuator,
    S: Speaker,
    C: Clock,
    R: BufRead,
    W: Write,
{
    let time_unit = config.timing.time_unit();
    let spawn = &config.spawn;

    robot
        .go_to_posture(&spawn.initial_posture, spawn.initial_speed)
        .map_err(SessionError::Posture)?;
    clock.hold(units_to_duration(time_unit, config.timing.initial_settle));

    if plan.wave {
        let mut choreographer = Choreographer::new(speaker, &mut *clock, time_unit);
        choreographer.perform(robot, &Choreography::greeting_wave())?;
    }

    if plan.calibrate {
        let mut calibration = CalibrationLoop::new(
            whitelist,
            config.calibration.clone(),
            &mut *input,
            &mut *output,
            &mut *clock,
            time_unit,
        );
        calibration.run(robot)?;
    }

    if plan.pause {
        write!(output, "Press Enter to end the simulation...")?;
        output.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
    }

    info!("session complete");
    Ok(())
}
