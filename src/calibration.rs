//! Interactive joint calibration.
//!
//! A line-based read/adjust/apply cycle: the operator names a joint, sees its current
//! angle, and types a new one. Bad input is reported and the loop asks again; only the
//! exit keyword (or end of input) stops it.

use crate::actuator::{ActuatorError, JointActuator};
use crate::clock::{Clock, units_to_duration};
use crate::joint::{AngleRange, CommandError, JointCommand, JointWhitelist};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    #[error("Invalid key name. Please select a valid key from: {valid}")]
    InvalidKey { key: String, valid: String },
    #[error("Please enter a valid numerical value.")]
    Parse { input: String },
    #[error("Invalid angle value. Please enter a value between {min} and {max}.")]
    OutOfRange { angle: f64, min: f64, max: f64 },
    #[error("calibration command rejected: {0}")]
    Command(#[from] CommandError),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
    #[error("operator console: {0}")]
    Io(#[from] io::Error),
}

impl CalibrationError {
    /// Input errors are reported to the operator and the loop continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. } | Self::Parse { .. } | Self::OutOfRange { .. }
        )
    }
}

/// Tunables of the loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Speed used for every calibration command.
    pub speed: f32,
    /// Hold after a successful command, in time units.
    pub settle: f64,
    /// Bounds are checked in f64 so inputs a hair past them cannot round onto them.
    pub min_angle: f64,
    pub max_angle: f64,
    /// Matched case-insensitively.
    pub exit_keyword: String,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            speed: 0.5,
            settle: 2.0,
            min_angle: -3.14,
            max_angle: 3.14,
            exit_keyword: "exit".to_string(),
        }
    }
}

impl CalibrationSettings {
    /// Inclusive bound check in f64. `NaN` is never in range.
    pub fn in_range(&self, angle: f64) -> bool {
        self.min_angle <= angle && angle <= self.max_angle
    }

    /// The bounds narrowed to the actuator's precision.
    pub fn range(&self) -> AngleRange {
        AngleRange::new(self.min_angle as f32, self.max_angle as f32)
    }
}

/// A validated operator request.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationRequest {
    pub joint_id: String,
    pub new_angle: f32,
}

impl CalibrationRequest {
    /// Validates `joint_id` against the whitelist and parses `raw_angle` into the
    /// configured bounds.
    ///
    /// The angle is parsed and compared as f64 and only narrowed to f32 once accepted.
    pub fn parse(
        joint_id: &str,
        raw_angle: &str,
        whitelist: &JointWhitelist,
        settings: &CalibrationSettings,
    ) -> Result<Self, CalibrationError> {
        check_key(whitelist, joint_id)?;
        let raw = raw_angle.trim();
        let angle: f64 = raw.parse().map_err(|_| CalibrationError::Parse {
            input: raw.to_string(),
        })?;
        if !settings.in_range(angle) {
            return Err(CalibrationError::OutOfRange {
                angle,
                min: settings.min_angle,
                max: settings.max_angle,
            });
        }
        Ok(Self {
            joint_id: joint_id.to_string(),
            new_angle: angle as f32,
        })
    }

    /// Builds the command sent to the robot, checked against the whitelist, the
    /// narrowed bounds and the configured speed.
    pub fn into_command(
        self,
        whitelist: &JointWhitelist,
        settings: &CalibrationSettings,
    ) -> Result<JointCommand, CommandError> {
        let cmd = JointCommand::new(self.joint_id, self.new_angle, settings.speed);
        cmd.validate(whitelist, settings.range())?;
        Ok(cmd)
    }
}

/// Rejects identifiers outside the whitelist.
pub fn check_key(whitelist: &JointWhitelist, key: &str) -> Result<(), CalibrationError> {
    if whitelist.contains(key) {
        Ok(())
    } else {
        Err(CalibrationError::InvalidKey {
            key: key.to_string(),
            valid: whitelist.to_string(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// The calibration state machine, reading from `input` and reporting to `output`.
pub struct CalibrationLoop<R, W, C> {
    whitelist: JointWhitelist,
    settings: CalibrationSettings,
    input: R,
    output: W,
    clock: C,
    time_unit: Duration,
    state: LoopState,
}

impl<R: BufRead, W: Write, C: Clock> CalibrationLoop<R, W, C> {
    pub fn new(
        whitelist: JointWhitelist,
        settings: CalibrationSettings,
        input: R,
        output: W,
        clock: C,
        time_unit: Duration,
    ) -> Self {
        Self {
            whitelist,
            settings,
            input,
            output,
            clock,
            time_unit,
            state: LoopState::AwaitingInput,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs cycles until the loop terminates.
    ///
    /// Only command, actuator and console failures escape; input errors are reported and
    /// looped.
    pub fn run<A: JointActuator + ?Sized>(
        &mut self,
        robot: &mut A,
    ) -> Result<(), CalibrationError> {
        info!("calibration loop start");
        while self.step(robot)? == LoopState::AwaitingInput {}
        info!("calibration loop terminated");
        Ok(())
    }

    /// Executes one read/adjust/apply cycle and returns the resulting state.
    pub fn step<A: JointActuator + ?Sized>(
        &mut self,
        robot: &mut A,
    ) -> Result<LoopState, CalibrationError> {
        if self.state == LoopState::Terminated {
            return Ok(self.state);
        }

        let prompt = format!(
            "Enter the name of the key (or type '{}' to stop): ",
            self.settings.exit_keyword
        );
        let Some(key) = self.prompt(&prompt)? else {
            return Ok(self.terminate());
        };
        // Only the exit keyword tolerates surrounding blanks; joint names must match exactly.
        if key.trim().eq_ignore_ascii_case(&self.settings.exit_keyword) {
            return Ok(self.terminate());
        }
        if let Err(err) = check_key(&self.whitelist, &key) {
            return self.report(err);
        }

        let current = robot.get_angle(&key)?;
        writeln!(self.output, "Current angle of {key} is: {current}")?;

        let prompt = format!(
            "Enter the new angle for {key} (between {} to {}): ",
            self.settings.min_angle, self.settings.max_angle
        );
        let Some(raw) = self.prompt(&prompt)? else {
            return Ok(self.terminate());
        };
        let request = match CalibrationRequest::parse(&key, &raw, &self.whitelist, &self.settings)
        {
            Ok(request) => request,
            Err(err) => return self.report(err),
        };

        let cmd = request.into_command(&self.whitelist, &self.settings)?;
        robot.set_angle(&cmd.joint_id, cmd.target_angle, cmd.speed)?;
        info!(
            joint_name = %cmd.joint_id,
            angle = cmd.target_angle,
            speed = cmd.speed,
            "calibration command"
        );
        writeln!(
            self.output,
            "Set new angle {} for {} with speed {}",
            cmd.target_angle, cmd.joint_id, cmd.speed
        )?;
        self.output.flush()?;

        self.clock
            .hold(units_to_duration(self.time_unit, self.settings.settle));
        Ok(self.state)
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn terminate(&mut self) -> LoopState {
        self.state = LoopState::Terminated;
        self.state
    }

    fn report(&mut self, err: CalibrationError) -> Result<LoopState, CalibrationError> {
        if !err.is_recoverable() {
            return Err(err);
        }
        debug!(error = ?err, "rejected calibration input");
        writeln!(self.output, "{err}")?;
        self.output.flush()?;
        Ok(self.state)
    }

    /// Writes `prompt` and reads one line without its line ending. `None` at end of input.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let text = line.strip_suffix('\n').unwrap_or(&line);
        let text = text.strip_suffix('\r').unwrap_or(text);
        Ok(Some(text.to_string()))
    }
}
