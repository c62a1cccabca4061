//! Scripted gestures: joint groups, holds, and speech cues executed strictly in order.
//!
//! The actuator gives no motion-completion signal, so a script approximates completion
//! with fixed holds. Phase order and relative hold lengths are what keep speech and motion
//! in step; changing either desynchronizes the gesture.

use crate::actuator::{ActuatorError, JointActuator};
use crate::clock::{Clock, units_to_duration};
use crate::joint::JointGroup;
use crate::speech::{Speaker, SpeechError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Joint rolled back and forth in the wave.
pub const WAVE_JOINT: &str = "RElbowRoll";
/// Elbow targets that make up one wave.
pub const WAVE_ANGLES: [f32; 3] = [1.562, 1.0, 1.562];
/// Angle that straightens the right fingers and thumb.
pub const FINGER_STRAIGHT: f32 = 0.872;
/// Speed shared by every arm motion of the greeting.
pub const GREETING_SPEED: f32 = 0.25;

const RIGHT_FINGERS: [&str; 14] = [
    "RFinger11",
    "RFinger12",
    "RFinger13",
    "RFinger21",
    "RFinger22",
    "RFinger23",
    "RFinger31",
    "RFinger32",
    "RFinger33",
    "RFinger41",
    "RFinger42",
    "RFinger43",
    "RThumb1",
    "RThumb2",
];

#[derive(Debug, thiserror::Error)]
pub enum ChoreographyError {
    #[error("phase {phase} failed: {source}")]
    Actuator {
        phase: usize,
        #[source]
        source: ActuatorError,
    },
    #[error("phase {phase} failed to speak: {source}")]
    Speech {
        phase: usize,
        #[source]
        source: SpeechError,
    },
}

/// A phrase rendered synchronously.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeechCue {
    pub text: String,
}

impl SpeechCue {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One step of a choreography.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GesturePhase {
    /// Fire every command of the group, in order, without waiting for motion.
    Apply(JointGroup),
    /// Wait a fixed number of time units.
    Hold(f64),
    /// Speak and block until playback completes.
    Speak(SpeechCue),
    /// Command a named whole-body posture.
    Posture { name: String, speed: f32 },
}

/// An ordered script of phases forming one gesture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choreography {
    pub name: String,
    pub phases: Vec<GesturePhase>,
}

impl Choreography {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
        }
    }

    pub fn apply(mut self, group: JointGroup) -> Self {
        self.phases.push(GesturePhase::Apply(group));
        self
    }

    pub fn hold(mut self, units: f64) -> Self {
        self.phases.push(GesturePhase::Hold(units));
        self
    }

    pub fn speak(mut self, text: impl Into<String>) -> Self {
        self.phases.push(GesturePhase::Speak(SpeechCue::new(text)));
        self
    }

    pub fn posture(mut self, name: impl Into<String>, speed: f32) -> Self {
        self.phases.push(GesturePhase::Posture {
            name: name.into(),
            speed,
        });
        self
    }

    /// The right-hand greeting wave with its three spoken lines.
    pub fn greeting_wave() -> Self {
        let shoulder = JointGroup::new("right shoulder raise", GREETING_SPEED)
            .with("RShoulderRoll", -1.5)
            .with("RShoulderPitch", 0.0);
        let fingers = JointGroup::new("right hand/fingers straighten", GREETING_SPEED)
            .with_all(RIGHT_FINGERS, FINGER_STRAIGHT);

        let mut script = Self::new("greeting wave")
            .apply(shoulder)
            .apply(fingers)
            .hold(1.0)
            .speak("Hello");
        for angle in WAVE_ANGLES {
            script = script
                .apply(JointGroup::new("right elbow wave", GREETING_SPEED).with(WAVE_JOINT, angle))
                .hold(0.5);
        }
        script
            .speak("How are you")
            .hold(1.0)
            .posture("Stand", 0.2)
            .speak("I am Pepper. How can I assist you today")
            .hold(2.0)
    }

    /// Spoken lines, in the order they will be heard.
    pub fn cues(&self) -> impl Iterator<Item = &SpeechCue> {
        self.phases.iter().filter_map(|phase| match phase {
            GesturePhase::Speak(cue) => Some(cue),
            _ => None,
        })
    }

    /// Sum of all holds, in time units. Speech time is not included.
    pub fn total_hold_units(&self) -> f64 {
        self.phases
            .iter()
            .map(|phase| match phase {
                GesturePhase::Hold(units) => *units,
                _ => 0.0,
            })
            .sum()
    }
}

/// Executes choreographies against a robot, with a speaker for cues and a clock for holds.
pub struct Choreographer<S, C> {
    speaker: S,
    clock: C,
    time_unit: Duration,
}

impl<S: Speaker, C: Clock> Choreographer<S, C> {
    /// `time_unit` is the wall-clock length of one hold unit.
    pub fn new(speaker: S, clock: C, time_unit: Duration) -> Self {
        Self {
            speaker,
            clock,
            time_unit,
        }
    }

    /// Runs every phase in order.
    ///
    /// The first failure aborts the run. Nothing is retried or rolled back: joints already
    /// commanded stay at their last commanded targets.
    pub fn perform<A: JointActuator + ?Sized>(
        &mut self,
        robot: &mut A,
        choreography: &Choreography,
    ) -> Result<(), ChoreographyError> {
        info!(name = %choreography.name, phases = choreography.phases.len(), "choreography start");

        for (phase, step) in choreography.phases.iter().enumerate() {
            match step {
                GesturePhase::Apply(group) => {
                    debug!(
                        phase,
                        group = %group.label,
                        joints = group.len(),
                        "applying joint group"
                    );
                    for cmd in group.commands() {
                        info!(joint_name = %cmd.joint_id, angle = cmd.target_angle, "set angle");
                        robot
                            .set_angle(&cmd.joint_id, cmd.target_angle, cmd.speed)
                            .map_err(|source| ChoreographyError::Actuator { phase, source })?;
                    }
                }
                GesturePhase::Hold(units) => {
                    let duration = units_to_duration(self.time_unit, *units);
                    debug!(phase, ?duration, "hold");
                    self.clock.hold(duration);
                }
                GesturePhase::Speak(cue) => {
                    self.speaker
                        .speak(&cue.text)
                        .map_err(|source| ChoreographyError::Speech { phase, source })?;
                }
                GesturePhase::Posture { name, speed } => {
                    info!(phase, posture = %name, speed, "go to posture");
                    robot
                        .go_to_posture(name, *speed)
                        .map_err(|source| ChoreographyError::Actuator { phase, source })?;
                }
            }
        }

        info!(name = %choreography.name, "choreography done");
        Ok(())
    }

    pub fn into_parts(self) -> (S, C) {
        (self.speaker, self.clock)
    }
}
