//! The capability surface a robot must expose to be choreographed or calibrated.

/// Errors reported by a robot actuator. The facade forwards them untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActuatorError {
    #[error("unknown joint '{0}'")]
    UnknownJoint(String),
    #[error("angle {angle} is outside the mechanical range [{min}, {max}] of '{joint}'")]
    AngleOutOfRange {
        joint: String,
        angle: f32,
        min: f32,
        max: f32,
    },
    #[error("speed {0} is outside (0, 1]")]
    InvalidSpeed(f32),
    #[error("unknown posture '{0}'")]
    UnknownPosture(String),
    #[error("actuator not ready")]
    NotReady,
}

/// Joint-level control of an articulated robot.
///
/// `set_angle` and `go_to_posture` are fire-and-forget: they return once the command is
/// accepted, not once the motion completes. Two commands issued back to back are ordered by
/// issue, never by completion. Implementations perform their own mechanical checks; callers
/// that need vocabulary validation do it before reaching this trait.
pub trait JointActuator {
    /// Commands `joint_id` toward `target_angle` (radians) at normalized `speed`.
    fn set_angle(&mut self, joint_id: &str, target_angle: f32, speed: f32)
    -> Result<(), ActuatorError>;

    /// Instantaneous angle of `joint_id`, in radians.
    fn get_angle(&self, joint_id: &str) -> Result<f32, ActuatorError>;

    /// Commands a named whole-body stance.
    fn go_to_posture(&mut self, posture: &str, speed: f32) -> Result<(), ActuatorError>;
}

impl<A: JointActuator + ?Sized> JointActuator for &mut A {
    fn set_angle(
        &mut self,
        joint_id: &str,
        target_angle: f32,
        speed: f32,
    ) -> Result<(), ActuatorError> {
        (**self).set_angle(joint_id, target_angle, speed)
    }

    fn get_angle(&self, joint_id: &str) -> Result<f32, ActuatorError> {
        (**self).get_angle(joint_id)
    }

    fn go_to_posture(&mut self, posture: &str, speed: f32) -> Result<(), ActuatorError> {
        (**self).go_to_posture(posture, speed)
    }
}
