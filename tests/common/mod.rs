// tests/common/mod.rs
#![allow(dead_code)]

use pepper_greeter::{ActuatorError, Clock, JointActuator, Speaker, SpeechError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Everything the fakes observe, in the order it happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    SetAngle(String, f32, f32),
    GetAngle(String),
    Posture(String, f32),
    Speak(String),
    Hold(Duration),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn events(log: &Log) -> Vec<Event> {
    log.borrow().clone()
}

pub struct FakeRobot {
    pub log: Log,
    pub angles: HashMap<String, f32>,
    /// Joints whose commands fail with `UnknownJoint`.
    pub broken: Vec<String>,
}

impl FakeRobot {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
            angles: HashMap::new(),
            broken: Vec::new(),
        }
    }
}

impl JointActuator for FakeRobot {
    fn set_angle(
        &mut self,
        joint_id: &str,
        target_angle: f32,
        speed: f32,
    ) -> Result<(), ActuatorError> {
        if self.broken.iter().any(|j| j == joint_id) {
            return Err(ActuatorError::UnknownJoint(joint_id.to_string()));
        }
        self.log
            .borrow_mut()
            .push(Event::SetAngle(joint_id.to_string(), target_angle, speed));
        self.angles.insert(joint_id.to_string(), target_angle);
        Ok(())
    }

    fn get_angle(&self, joint_id: &str) -> Result<f32, ActuatorError> {
        self.log
            .borrow_mut()
            .push(Event::GetAngle(joint_id.to_string()));
        Ok(self.angles.get(joint_id).copied().unwrap_or(0.0))
    }

    fn go_to_posture(&mut self, posture: &str, speed: f32) -> Result<(), ActuatorError> {
        self.log
            .borrow_mut()
            .push(Event::Posture(posture.to_string(), speed));
        Ok(())
    }
}

pub struct FakeSpeaker {
    pub log: Log,
}

impl Speaker for FakeSpeaker {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.log.borrow_mut().push(Event::Speak(text.to_string()));
        Ok(())
    }
}

pub struct FakeClock {
    pub log: Log,
}

impl Clock for FakeClock {
    fn hold(&mut self, duration: Duration) {
        self.log.borrow_mut().push(Event::Hold(duration));
    }
}

pub fn set_angles(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| matches!(e, Event::SetAngle(..)))
        .collect()
}
