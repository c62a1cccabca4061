//! Simulation lifecycle seam.

use crate::actuator::JointActuator;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HarnessError {
    #[error("simulation failed to launch: {0}")]
    Launch(String),
    #[error("robot failed to spawn: {0}")]
    Spawn(String),
    #[error("unknown or already stopped session {0}")]
    UnknownSession(u32),
}

/// Where and how the robot is placed in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    /// Spawn a ground plane under the robot.
    pub ground_plane: bool,

    /// World-space position of the robot base.
    pub translation: Vec3,

    /// World-space orientation of the robot base.
    pub orientation: Quat,

    /// Posture commanded right after spawning.
    pub initial_posture: String,

    /// Speed of the initial posture command.
    pub initial_speed: f32,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            ground_plane: true,
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            initial_posture: "Stand".to_string(),
            initial_speed: 1.0,
        }
    }
}

/// Owns the physics world. The core launches it once and stops it once.
pub trait SimulationHarness {
    type Session;
    type Robot: JointActuator;

    fn launch(&mut self) -> Result<Self::Session, HarnessError>;

    fn spawn_robot(
        &mut self,
        session: &Self::Session,
        options: &SpawnOptions,
    ) -> Result<Self::Robot, HarnessError>;

    fn stop(&mut self, session: Self::Session) -> Result<(), HarnessError>;
}
