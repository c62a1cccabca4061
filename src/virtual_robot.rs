//! In-process kinematic stand-in for a simulated Pepper.
//!
//! No physics: every joint moves linearly toward its last commanded target at
//! `speed * max_velocity`, and [`JointActuator::get_angle`] reports where it is right now.
//! Targets beyond a joint's mechanical limits are clamped to them, like the physics
//! simulator does.

use crate::actuator::{ActuatorError, JointActuator};
use crate::harness::{HarnessError, SimulationHarness, SpawnOptions};
use crate::joint::AngleRange;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mechanical description of one joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointSpec {
    pub name: &'static str,
    pub limits: AngleRange,
    /// Maximum angular velocity in rad/s, reached at speed 1.0.
    pub max_velocity: f32,
}

const fn spec(name: &'static str, min: f32, max: f32, max_velocity: f32) -> JointSpec {
    JointSpec {
        name,
        limits: AngleRange::new(min, max),
        max_velocity,
    }
}

const FINGER_MAX: f32 = 0.8727;
const FINGER_VEL: f32 = 10.0;

/// Pepper's actuated joints.
pub const PEPPER_JOINT_SPECS: &[JointSpec] = &[
    spec("HeadYaw", -2.0857, 2.0857, 7.19),
    spec("HeadPitch", -0.7068, 0.6371, 9.23),
    spec("HipRoll", -0.5149, 0.5149, 2.27),
    spec("HipPitch", -1.0385, 1.0385, 2.27),
    spec("KneePitch", -0.5149, 0.5149, 2.94),
    // --- Left arm ---
    spec("LShoulderPitch", -2.0857, 2.0857, 7.19),
    spec("LShoulderRoll", 0.0087, 1.5620, 9.23),
    spec("LElbowYaw", -2.0857, 2.0857, 7.19),
    spec("LElbowRoll", -1.5620, -0.0087, 9.23),
    spec("LWristYaw", -1.8239, 1.8239, 17.38),
    spec("LHand", 0.0, 1.0, 10.2),
    spec("LFinger11", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger12", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger13", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger21", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger22", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger23", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger31", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger32", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger33", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger41", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger42", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LFinger43", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LThumb1", 0.0, FINGER_MAX, FINGER_VEL),
    spec("LThumb2", 0.0, FINGER_MAX, FINGER_VEL),
    // --- Right arm ---
    spec("RShoulderPitch", -2.0857, 2.0857, 7.19),
    spec("RShoulderRoll", -1.5620, -0.0087, 9.23),
    spec("RElbowYaw", -2.0857, 2.0857, 7.19),
    spec("RElbowRoll", 0.0087, 1.5620, 9.23),
    spec("RWristYaw", -1.8239, 1.8239, 17.38),
    spec("RHand", 0.0, 1.0, 10.2),
    spec("RFinger11", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger12", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger13", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger21", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger22", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger23", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger31", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger32", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger33", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger41", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger42", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RFinger43", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RThumb1", 0.0, FINGER_MAX, FINGER_VEL),
    spec("RThumb2", 0.0, FINGER_MAX, FINGER_VEL),
];

const STAND: &[(&str, f32)] = &[
    ("HeadYaw", 0.0),
    ("HeadPitch", -0.21),
    ("HipRoll", 0.0),
    ("HipPitch", -0.052),
    ("KneePitch", -0.01),
    ("LShoulderPitch", 1.58),
    ("LShoulderRoll", 0.12),
    ("LElbowYaw", -1.71),
    ("LElbowRoll", -0.17),
    ("LWristYaw", 0.02),
    ("LHand", 0.6),
    ("RShoulderPitch", 1.58),
    ("RShoulderRoll", -0.12),
    ("RElbowYaw", 1.71),
    ("RElbowRoll", 0.17),
    ("RWristYaw", -0.02),
    ("RHand", 0.6),
];

const STAND_INIT: &[(&str, f32)] = &[
    ("HeadYaw", 0.0),
    ("HeadPitch", -0.2),
    ("HipRoll", 0.0),
    ("HipPitch", 0.0),
    ("KneePitch", 0.0),
    ("LShoulderPitch", 1.56),
    ("LShoulderRoll", 0.14),
    ("LElbowYaw", -1.22),
    ("LElbowRoll", -0.52),
    ("LWristYaw", 0.0),
    ("LHand", 0.6),
    ("RShoulderPitch", 1.56),
    ("RShoulderRoll", -0.14),
    ("RElbowYaw", 1.22),
    ("RElbowRoll", 0.52),
    ("RWristYaw", 0.0),
    ("RHand", 0.6),
];

const CROUCH: &[(&str, f32)] = &[
    ("HeadYaw", 0.0),
    ("HeadPitch", 0.64),
    ("HipRoll", 0.0),
    ("HipPitch", -1.04),
    ("KneePitch", 0.51),
    ("LShoulderPitch", 1.56),
    ("LShoulderRoll", 0.14),
    ("LElbowYaw", -0.79),
    ("LElbowRoll", -0.06),
    ("LWristYaw", -1.82),
    ("LHand", 0.0),
    ("RShoulderPitch", 1.56),
    ("RShoulderRoll", -0.14),
    ("RElbowYaw", 0.79),
    ("RElbowRoll", 0.06),
    ("RWristYaw", 1.82),
    ("RHand", 0.0),
];

/// Posture names understood by [`VirtualPepper::go_to_posture`].
pub const POSTURES: [&str; 4] = ["Stand", "StandInit", "StandZero", "Crouch"];

/// Time base for motion interpolation.
#[derive(Clone, Copy, Debug)]
enum SimTime {
    Wall { epoch: Instant },
    Manual { now: Duration },
}

impl SimTime {
    fn now(&self) -> Duration {
        match self {
            Self::Wall { epoch } => epoch.elapsed(),
            Self::Manual { now } => *now,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct JointState {
    spec: JointSpec,
    from: f32,
    target: f32,
    /// rad/s
    velocity: f32,
    started: Duration,
}

impl JointState {
    fn at_rest(spec: JointSpec) -> Self {
        let angle = spec.limits.clamp(0.0);
        Self {
            spec,
            from: angle,
            target: angle,
            velocity: 0.0,
            started: Duration::ZERO,
        }
    }

    fn angle(&self, now: Duration) -> f32 {
        let travelled = self.velocity * now.saturating_sub(self.started).as_secs_f32();
        let distance = self.target - self.from;
        if travelled >= distance.abs() {
            self.target
        } else {
            self.from + travelled.copysign(distance)
        }
    }
}

/// A kinematic Pepper.
#[derive(Debug)]
pub struct VirtualPepper {
    joints: HashMap<&'static str, JointState>,
    time: SimTime,
    alive: Rc<Cell<bool>>,
    posture: Option<String>,
}

impl Default for VirtualPepper {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualPepper {
    /// A ready robot whose motion follows wall-clock time.
    pub fn new() -> Self {
        Self::with_time(SimTime::Wall {
            epoch: Instant::now(),
        })
    }

    /// A ready robot whose clock only moves through [`advance`](Self::advance).
    pub fn with_manual_time() -> Self {
        Self::with_time(SimTime::Manual {
            now: Duration::ZERO,
        })
    }

    fn with_time(time: SimTime) -> Self {
        let joints = PEPPER_JOINT_SPECS
            .iter()
            .map(|spec| (spec.name, JointState::at_rest(*spec)))
            .collect();
        Self {
            joints,
            time,
            alive: Rc::new(Cell::new(true)),
            posture: None,
        }
    }

    /// Moves manual time forward. No effect on wall-clock robots.
    pub fn advance(&mut self, dt: Duration) {
        if let SimTime::Manual { now } = &mut self.time {
            *now += dt;
        }
    }

    /// Last commanded target of `joint_id`.
    pub fn target(&self, joint_id: &str) -> Option<f32> {
        self.joints.get(joint_id).map(|state| state.target)
    }

    /// Last posture commanded, if any.
    pub fn posture(&self) -> Option<&str> {
        self.posture.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.alive.get()
    }

    fn ensure_ready(&self) -> Result<(), ActuatorError> {
        if self.alive.get() {
            Ok(())
        } else {
            Err(ActuatorError::NotReady)
        }
    }

    fn command(
        &mut self,
        joint_id: &str,
        target_angle: f32,
        speed: f32,
    ) -> Result<(), ActuatorError> {
        if !(speed > 0.0 && speed <= 1.0) {
            return Err(ActuatorError::InvalidSpeed(speed));
        }
        let now = self.time.now();
        let state = self
            .joints
            .get_mut(joint_id)
            .ok_or_else(|| ActuatorError::UnknownJoint(joint_id.to_string()))?;
        if !AngleRange::FULL.contains(target_angle) {
            return Err(ActuatorError::AngleOutOfRange {
                joint: joint_id.to_string(),
                angle: target_angle,
                min: AngleRange::FULL.min,
                max: AngleRange::FULL.max,
            });
        }

        let target = state.spec.limits.clamp(target_angle);
        if target != target_angle {
            debug!(
                joint = joint_id,
                requested = target_angle,
                clamped = target,
                "target clamped to joint limits"
            );
        }
        state.from = state.angle(now);
        state.target = target;
        state.velocity = speed * state.spec.max_velocity;
        state.started = now;
        Ok(())
    }
}

impl JointActuator for VirtualPepper {
    fn set_angle(
        &mut self,
        joint_id: &str,
        target_angle: f32,
        speed: f32,
    ) -> Result<(), ActuatorError> {
        self.ensure_ready()?;
        self.command(joint_id, target_angle, speed)
    }

    fn get_angle(&self, joint_id: &str) -> Result<f32, ActuatorError> {
        self.ensure_ready()?;
        self.joints
            .get(joint_id)
            .map(|state| state.angle(self.time.now()))
            .ok_or_else(|| ActuatorError::UnknownJoint(joint_id.to_string()))
    }

    fn go_to_posture(&mut self, posture: &str, speed: f32) -> Result<(), ActuatorError> {
        self.ensure_ready()?;
        let targets: Vec<(&'static str, f32)> = match posture {
            "Stand" => STAND.to_vec(),
            "StandInit" => STAND_INIT.to_vec(),
            "Crouch" => CROUCH.to_vec(),
            "StandZero" => STAND
                .iter()
                .map(|(name, _)| (*name, 0.0))
                .collect(),
            _ => return Err(ActuatorError::UnknownPosture(posture.to_string())),
        };
        for (joint, angle) in targets {
            self.command(joint, angle, speed)?;
        }
        self.posture = Some(posture.to_string());
        Ok(())
    }
}

/// Handle to a running virtual world.
#[derive(Debug, PartialEq, Eq)]
pub struct VirtualSession {
    id: u32,
}

impl VirtualSession {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Hands out virtual worlds and the robots living in them.
#[derive(Debug, Default)]
pub struct VirtualSimulation {
    next_id: u32,
    sessions: BTreeMap<u32, Rc<Cell<bool>>>,
    manual_time: bool,
}

impl VirtualSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Robots spawned from this simulation use manual time.
    pub fn with_manual_time(mut self) -> Self {
        self.manual_time = true;
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl SimulationHarness for VirtualSimulation {
    type Session = VirtualSession;
    type Robot = VirtualPepper;

    fn launch(&mut self) -> Result<VirtualSession, HarnessError> {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, Rc::new(Cell::new(true)));
        info!(session = id, "virtual simulation launched");
        Ok(VirtualSession { id })
    }

    fn spawn_robot(
        &mut self,
        session: &VirtualSession,
        options: &SpawnOptions,
    ) -> Result<VirtualPepper, HarnessError> {
        let alive = self
            .sessions
            .get(&session.id)
            .ok_or(HarnessError::UnknownSession(session.id))?;
        let mut robot = if self.manual_time {
            VirtualPepper::with_manual_time()
        } else {
            VirtualPepper::new()
        };
        robot.alive = Rc::clone(alive);
        info!(
            session = session.id,
            translation = ?options.translation,
            orientation = ?options.orientation,
            ground_plane = options.ground_plane,
            "pepper spawned"
        );
        Ok(robot)
    }

    fn stop(&mut self, session: VirtualSession) -> Result<(), HarnessError> {
        let alive = self
            .sessions
            .remove(&session.id)
            .ok_or(HarnessError::UnknownSession(session.id))?;
        alive.set(false);
        info!(session = session.id, "virtual simulation stopped");
        Ok(())
    }
}
