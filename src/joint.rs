//! Joint vocabulary and command values.
//!
//! A [`JointCommand`] is the unit the facade understands: one named joint, one target
//! angle, one normalized speed. A [`JointGroup`] bundles several targets sharing a speed
//! into a single coordinated movement. The [`JointWhitelist`] is the closed vocabulary the
//! calibration loop accepts from an operator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f32::consts::PI;
use std::fmt;

/// Errors raised when a [`JointCommand`] breaks its own invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown joint '{0}'")]
    UnknownJoint(String),
    #[error("angle {angle} for '{joint}' is outside [{min}, {max}]")]
    AngleOutOfRange {
        joint: String,
        angle: f32,
        min: f32,
        max: f32,
    },
    #[error("speed {0} is outside (0, 1]")]
    InvalidSpeed(f32),
}

/// Closed interval of admissible angles, in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    /// The full revolution assumed when an actuator reports nothing tighter.
    pub const FULL: Self = Self { min: -PI, max: PI };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends. `NaN` is never contained.
    pub fn contains(&self, angle: f32) -> bool {
        self.min <= angle && angle <= self.max
    }

    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.min, self.max)
    }
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A single joint target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointCommand {
    /// Joint identifier from the robot's vocabulary (e.g. `"RElbowRoll"`).
    pub joint_id: String,
    /// Target angle in radians.
    pub target_angle: f32,
    /// Normalized speed in (0, 1].
    pub speed: f32,
}

impl JointCommand {
    pub fn new(joint_id: impl Into<String>, target_angle: f32, speed: f32) -> Self {
        Self {
            joint_id: joint_id.into(),
            target_angle,
            speed,
        }
    }

    /// Checks the command against a vocabulary and an angle range.
    pub fn validate(
        &self,
        whitelist: &JointWhitelist,
        range: AngleRange,
    ) -> Result<(), CommandError> {
        if !whitelist.contains(&self.joint_id) {
            return Err(CommandError::UnknownJoint(self.joint_id.clone()));
        }
        if !range.contains(self.target_angle) {
            return Err(CommandError::AngleOutOfRange {
                joint: self.joint_id.clone(),
                angle: self.target_angle,
                min: range.min,
                max: range.max,
            });
        }
        if !(self.speed > 0.0 && self.speed <= 1.0) {
            return Err(CommandError::InvalidSpeed(self.speed));
        }
        Ok(())
    }
}

/// A coordinated movement: several joint targets issued back to back at one speed.
///
/// Targets keep their insertion order, which is the order commands reach the actuator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointGroup {
    /// Human-readable label used in logs (e.g. `"right shoulder raise"`).
    pub label: String,
    pub speed: f32,
    pub targets: Vec<(String, f32)>,
}

impl JointGroup {
    pub fn new(label: impl Into<String>, speed: f32) -> Self {
        Self {
            label: label.into(),
            speed,
            targets: Vec::new(),
        }
    }

    /// Appends a target (builder pattern).
    pub fn with(mut self, joint_id: impl Into<String>, angle: f32) -> Self {
        self.targets.push((joint_id.into(), angle));
        self
    }

    /// Appends the same angle for every joint in `joint_ids`.
    pub fn with_all<I, S>(mut self, joint_ids: I, angle: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets
            .extend(joint_ids.into_iter().map(|id| (id.into(), angle)));
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Expands the group into individual commands, in order.
    pub fn commands(&self) -> impl Iterator<Item = JointCommand> + '_ {
        self.targets
            .iter()
            .map(|(id, angle)| JointCommand::new(id.clone(), *angle, self.speed))
    }
}

/// Joint names accepted by the calibration loop on a Pepper robot.
pub const PEPPER_JOINTS: [&str; 42] = [
    "HeadYaw",
    "HeadPitch",
    "LShoulderPitch",
    "LShoulderRoll",
    "LElbowYaw",
    "LElbowRoll",
    "LWristYaw",
    "LHand",
    "LFinger21",
    "LFinger22",
    "LFinger23",
    "LFinger11",
    "LFinger12",
    "LFinger13",
    "LFinger41",
    "LFinger42",
    "LFinger43",
    "LFinger31",
    "LFinger32",
    "LFinger33",
    "LThumb1",
    "LThumb2",
    "RShoulderPitch",
    "RShoulderRoll",
    "RElbowYaw",
    "RElbowRoll",
    "RWristYaw",
    "RHand",
    "RFinger41",
    "RFinger42",
    "RFinger43",
    "RFinger31",
    "RFinger32",
    "RFinger33",
    "RFinger21",
    "RFinger22",
    "RFinger23",
    "RFinger11",
    "RFinger12",
    "RFinger13",
    "RThumb1",
    "RThumb2",
];

/// Immutable set of valid joint identifiers.
///
/// Iteration and `Display` keep the order the names were given in, so the list shown to an
/// operator matches the configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JointWhitelist {
    ordered: Vec<String>,
    lookup: BTreeSet<String>,
}

impl JointWhitelist {
    /// Builds a whitelist; duplicate names are kept once, at their first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = BTreeSet::new();
        for name in names {
            let name = name.into();
            if lookup.insert(name.clone()) {
                ordered.push(name);
            }
        }
        Self { ordered, lookup }
    }

    /// The stock Pepper whitelist.
    pub fn pepper() -> Self {
        Self::new(PEPPER_JOINTS)
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, joint_id: &str) -> bool {
        self.lookup.contains(joint_id)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }
}

impl fmt::Display for JointWhitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive_and_rejects_nan() {
        let range = AngleRange::new(-3.14, 3.14);
        assert!(range.contains(3.14));
        assert!(range.contains(-3.14));
        assert!(!range.contains(3.1401));
        assert!(!range.contains(f32::NAN));
    }

    #[test]
    fn whitelist_deduplicates_but_keeps_order() {
        let list = JointWhitelist::new(["B", "A", "B"]);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(list.to_string(), r#"["B", "A"]"#);
    }

    #[test]
    fn command_validation_checks_speed() {
        let list = JointWhitelist::pepper();
        let cmd = JointCommand::new("HeadYaw", 0.1, 0.0);
        assert_eq!(
            cmd.validate(&list, AngleRange::FULL),
            Err(CommandError::InvalidSpeed(0.0))
        );
    }
}
