// tests/greeting_wave.rs
mod common;

use common::{Event, FakeClock, FakeRobot, FakeSpeaker, Log, events, new_log, set_angles};
use pepper_greeter::{Choreographer, Choreography, ChoreographyError, GesturePhase, JointWhitelist};
use std::time::Duration;

fn setup() -> (Log, FakeRobot, Choreographer<FakeSpeaker, FakeClock>) {
    let log = new_log();
    let robot = FakeRobot::new(&log);
    let choreographer = Choreographer::new(
        FakeSpeaker { log: log.clone() },
        FakeClock { log: log.clone() },
        Duration::from_secs(1),
    );
    (log, robot, choreographer)
}

fn speak(text: &str) -> Event {
    Event::Speak(text.to_string())
}

fn hold_ms(ms: u64) -> Event {
    Event::Hold(Duration::from_millis(ms))
}

fn elbow(angle: f32) -> Event {
    Event::SetAngle("RElbowRoll".to_string(), angle, 0.25)
}

#[test]
fn test_speech_cues_in_fixed_order() {
    let (log, mut robot, mut choreographer) = setup();
    choreographer
        .perform(&mut robot, &Choreography::greeting_wave())
        .unwrap();

    let spoken: Vec<Event> = events(&log)
        .into_iter()
        .filter(|e| matches!(e, Event::Speak(_)))
        .collect();
    assert_eq!(
        spoken,
        vec![
            speak("Hello"),
            speak("How are you"),
            speak("I am Pepper. How can I assist you today"),
        ]
    );
}

#[test]
fn test_full_phase_sequence() {
    let (log, mut robot, mut choreographer) = setup();
    choreographer
        .perform(&mut robot, &Choreography::greeting_wave())
        .unwrap();
    let events = events(&log);

    // 2 shoulder + 14 finger commands precede the first hold.
    let first_hold = events.iter().position(|e| matches!(e, Event::Hold(_))).unwrap();
    assert_eq!(first_hold, 16);
    assert!(events[..16].iter().all(|e| matches!(e, Event::SetAngle(_, _, s) if *s == 0.25)));
    assert_eq!(events[0], Event::SetAngle("RShoulderRoll".into(), -1.5, 0.25));
    assert_eq!(events[1], Event::SetAngle("RShoulderPitch".into(), 0.0, 0.25));
    assert!(events[2..16]
        .iter()
        .all(|e| matches!(e, Event::SetAngle(_, a, _) if *a == 0.872)));

    assert_eq!(
        events[16..],
        [
            hold_ms(1000),
            speak("Hello"),
            elbow(1.562),
            hold_ms(500),
            elbow(1.0),
            hold_ms(500),
            elbow(1.562),
            hold_ms(500),
            speak("How are you"),
            hold_ms(1000),
            Event::Posture("Stand".into(), 0.2),
            speak("I am Pepper. How can I assist you today"),
            hold_ms(2000),
        ]
    );
}

#[test]
fn test_elbow_wave_is_three_commands() {
    let (log, mut robot, mut choreographer) = setup();
    choreographer
        .perform(&mut robot, &Choreography::greeting_wave())
        .unwrap();
    let events = events(&log);

    let elbow_cmds: Vec<&Event> = set_angles(&events)
        .into_iter()
        .filter(|e| matches!(e, Event::SetAngle(j, _, _) if j == "RElbowRoll"))
        .collect();
    assert_eq!(elbow_cmds, vec![&elbow(1.562), &elbow(1.0), &elbow(1.562)]);

    for (i, e) in events.iter().enumerate() {
        if matches!(e, Event::SetAngle(j, _, _) if j == "RElbowRoll") {
            assert_eq!(events[i + 1], hold_ms(500), "elbow command {i} not followed by hold");
        }
    }
}

#[test]
fn test_actuator_error_aborts_without_rollback() {
    let (log, mut robot, mut choreographer) = setup();
    robot.broken.push("RFinger11".to_string());

    let err = choreographer
        .perform(&mut robot, &Choreography::greeting_wave())
        .unwrap_err();
    assert!(matches!(err, ChoreographyError::Actuator { phase: 1, .. }));

    // Shoulder commands stay issued, nothing after the failure runs.
    let events = events(&log);
    assert_eq!(events.len(), 2);
    assert!(!events.iter().any(|e| matches!(e, Event::Speak(_) | Event::Hold(_))));
    assert_eq!(robot.angles.get("RShoulderRoll"), Some(&-1.5));
}

#[test]
fn test_time_unit_scales_holds() {
    let log = new_log();
    let mut robot = FakeRobot::new(&log);
    let mut choreographer = Choreographer::new(
        FakeSpeaker { log: log.clone() },
        FakeClock { log: log.clone() },
        Duration::from_millis(10),
    );
    let script = Choreography::new("tiny").hold(0.5).hold(2.0);
    choreographer.perform(&mut robot, &script).unwrap();
    assert_eq!(events(&log), vec![hold_ms(5), hold_ms(20)]);
}

#[test]
fn test_greeting_shape() {
    let wave = Choreography::greeting_wave();
    assert_eq!(wave.total_hold_units(), 1.0 + 0.5 * 3.0 + 1.0 + 2.0);
    assert_eq!(wave.cues().count(), 3);

    let GesturePhase::Apply(fingers) = &wave.phases[1] else {
        panic!("second phase should be the finger group");
    };
    assert_eq!(fingers.len(), 14);

    // Every joint the gesture touches is a known joint.
    let whitelist = JointWhitelist::pepper();
    for phase in &wave.phases {
        if let GesturePhase::Apply(group) = phase {
            for cmd in group.commands() {
                assert!(whitelist.contains(&cmd.joint_id), "{} not whitelisted", cmd.joint_id);
            }
        }
    }
}
