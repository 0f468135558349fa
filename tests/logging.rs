use std::{fs, thread::sleep, time::Duration};

use balloon_window::settings::BalloonSettings;
use serial_test::serial;
use tempfile::tempdir;

// A test binary can install the global subscriber only once, so everything
// that depends on it lives in this single test.
#[test]
#[serial]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("balloon.log");

    let settings = BalloonSettings {
        debug_logging: true,
        ..BalloonSettings::default()
    };
    balloon_window::logging::init_from_settings(&settings, Some(path.clone()));
    tracing::info!("balloon shown");
    tracing::debug!(quadrant = "top", "anchor quadrant changed");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("balloon shown"));
    assert!(contents.contains("anchor quadrant changed"));
}
