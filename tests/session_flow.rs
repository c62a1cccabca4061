// tests/session_flow.rs
mod common;

use common::{Event, FakeClock, FakeSpeaker, events, new_log};
use pepper_greeter::{
    GreeterConfig, HarnessError, JointWhitelist, SessionError, SessionPlan, SimulationHarness,
    SpawnOptions, VirtualPepper, VirtualSimulation, run_session,
};
use std::io::Cursor;
use std::time::Duration;

fn quiet_plan() -> SessionPlan {
    SessionPlan {
        wave: true,
        calibrate: false,
        pause: false,
    }
}

#[test]
fn test_wave_session_on_virtual_robot() {
    let log = new_log();
    let mut sim = VirtualSimulation::new().with_manual_time();
    let mut clock = FakeClock { log: log.clone() };
    let mut out = Vec::new();

    run_session(
        &mut sim,
        &GreeterConfig::default(),
        &quiet_plan(),
        FakeSpeaker { log: log.clone() },
        &mut clock,
        JointWhitelist::pepper(),
        Cursor::new(Vec::new()),
        &mut out,
    )
    .unwrap();

    let events = events(&log);
    // Initial settle, then the gesture.
    assert_eq!(events[0], Event::Hold(Duration::from_secs(1)));
    assert_eq!(events[1], Event::Hold(Duration::from_secs(1)));
    assert_eq!(events[2], Event::Speak("Hello".into()));
    assert_eq!(sim.active_sessions(), 0, "simulation must be stopped");
    assert!(out.is_empty());
}

#[test]
fn test_calibration_and_pause() {
    let log = new_log();
    let mut sim = VirtualSimulation::new().with_manual_time();
    let mut clock = FakeClock { log: log.clone() };
    let mut out = Vec::new();
    let plan = SessionPlan {
        wave: false,
        calibrate: true,
        pause: true,
    };

    run_session(
        &mut sim,
        &GreeterConfig::default(),
        &plan,
        FakeSpeaker { log: log.clone() },
        &mut clock,
        JointWhitelist::pepper(),
        Cursor::new(b"HeadYaw\n0.3\nexit\n\n".to_vec()),
        &mut out,
    )
    .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Set new angle 0.3 for HeadYaw with speed 0.5"));
    assert!(out.ends_with("Press Enter to end the simulation..."));
    assert_eq!(
        events(&log),
        vec![
            Event::Hold(Duration::from_secs(1)),
            Event::Hold(Duration::from_secs(2)),
        ]
    );
}

#[test]
fn test_failure_still_stops_simulation() {
    let log = new_log();
    let mut sim = VirtualSimulation::new().with_manual_time();
    let mut clock = FakeClock { log: log.clone() };
    let mut config = GreeterConfig::default();
    config.spawn.initial_posture = "Handstand".into();

    let err = run_session(
        &mut sim,
        &config,
        &quiet_plan(),
        FakeSpeaker { log: log.clone() },
        &mut clock,
        JointWhitelist::pepper(),
        Cursor::new(Vec::new()),
        Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::Posture(_)));
    assert_eq!(sim.active_sessions(), 0);
    assert!(events(&log).is_empty(), "nothing runs after the failed posture");
}

/// Harness whose robot never spawns.
struct NoRobot {
    stops: usize,
}

impl SimulationHarness for NoRobot {
    type Session = ();
    type Robot = VirtualPepper;

    fn launch(&mut self) -> Result<(), HarnessError> {
        Ok(())
    }

    fn spawn_robot(&mut self, _: &(), _: &SpawnOptions) -> Result<VirtualPepper, HarnessError> {
        Err(HarnessError::Spawn("model missing".into()))
    }

    fn stop(&mut self, _: ()) -> Result<(), HarnessError> {
        self.stops += 1;
        Ok(())
    }
}

#[test]
fn test_spawn_failure_stops_once() {
    let log = new_log();
    let mut harness = NoRobot { stops: 0 };
    let err = run_session(
        &mut harness,
        &GreeterConfig::default(),
        &quiet_plan(),
        FakeSpeaker { log: log.clone() },
        &mut FakeClock { log: log.clone() },
        JointWhitelist::pepper(),
        Cursor::new(Vec::new()),
        Vec::new(),
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::Harness(HarnessError::Spawn(_))));
    assert_eq!(harness.stops, 1);
}
