// tests/config_loading.rs
use glam::Vec3;
use pepper_greeter::{ConfigError, GreeterConfig};
use std::io::Write;
use std::time::Duration;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_without_file() {
    let config = GreeterConfig::load(None).unwrap();
    assert_eq!(config.speech.rate, 125);
    assert_eq!(config.speech.volume, 1.0);
    assert_eq!(config.speech.voice, "English (America)");
    assert_eq!(config.calibration.speed, 0.5);
    assert_eq!(config.calibration.settle, 2.0);
    assert_eq!(config.calibration.exit_keyword, "exit");
    assert_eq!(config.timing.time_unit(), Duration::from_secs(1));
    assert!(config.spawn.ground_plane);
    assert_eq!(config.spawn.initial_posture, "Stand");
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let file = write_config(
        r#"
[speech]
voice = "en-gb"

[timing]
time_unit_secs = 0.5

[spawn]
ground_plane = false
translation = [1.0, 2.0, 0.0]
"#,
    );
    let config = GreeterConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.speech.voice, "en-gb");
    assert_eq!(config.speech.rate, 125);
    assert_eq!(config.timing.time_unit(), Duration::from_millis(500));
    assert!(!config.spawn.ground_plane);
    assert_eq!(config.spawn.translation, Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(config.calibration.max_angle, 3.14);
}

#[test]
fn test_bad_toml_names_the_file() {
    let file = write_config("[speech\nrate = ");
    let err = GreeterConfig::load(Some(file.path())).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GreeterConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_config("[calibration]\nmin_angle = 1.0\nmax_angle = -1.0\n");
    assert!(matches!(
        GreeterConfig::load(Some(file.path())),
        Err(ConfigError::Invalid(_))
    ));

    let file = write_config("[calibration]\nspeed = 0.0\n");
    assert!(matches!(
        GreeterConfig::load(Some(file.path())),
        Err(ConfigError::Invalid(_))
    ));

    for text in [
        "[timing]\ntime_unit_secs = 1e30\n",
        "[timing]\ntime_unit_secs = -1.0\n",
        "[timing]\ninitial_settle = 1e30\n",
        "[calibration]\nsettle = 1e30\n",
        "[calibration]\nsettle = -2.0\n",
    ] {
        let file = write_config(text);
        assert!(
            matches!(GreeterConfig::load(Some(file.path())), Err(ConfigError::Invalid(_))),
            "accepted {text:?}"
        );
    }
}

#[test]
fn test_time_unit_never_panics() {
    let mut config = GreeterConfig::default();
    config.timing.time_unit_secs = 1e30;
    assert_eq!(config.timing.time_unit(), Duration::MAX);
    config.timing.time_unit_secs = f64::NAN;
    assert_eq!(config.timing.time_unit(), Duration::ZERO);
}
