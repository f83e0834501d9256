use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("timerbox-{nanos}-{name}"))
}

fn timerbox(data_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_timerbox"));
    command
        .env("TIMERBOX_DATA_DIR", data_dir)
        .env("TIMERBOX_CONFIG_PATH", data_dir.join("missing-config.json"))
        .env("TIMERBOX_DISABLE_NOTIFICATIONS", "1");
    command
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn seed_timer(data_dir: &Path) {
    std::fs::create_dir_all(data_dir).unwrap();
    let timers = serde_json::json!([
        {"id": "timer-1", "name": "Pushups", "duration": 30, "remaining": 10,
         "category": "Workout", "status": "paused", "halfwayAlert": false}
    ]);
    std::fs::write(data_dir.join("timers.json"), timers.to_string()).unwrap();
}

#[test]
fn edit_duration_resets_remaining() {
    let data_dir = temp_path("edit-duration");
    seed_timer(&data_dir);

    let output = timerbox(&data_dir)
        .args(["edit", "timer-1", "--duration", "45", "--name", "Pushups x2"])
        .output()
        .expect("failed to run edit");

    assert!(output.status.success());
    let stored = read_json(&data_dir.join("timers.json"));
    std::fs::remove_dir_all(&data_dir).ok();

    assert_eq!(stored[0]["name"], "Pushups x2");
    assert_eq!(stored[0]["duration"], 45);
    assert_eq!(stored[0]["remaining"], 45);
    assert_eq!(stored[0]["status"], "paused");
}

#[test]
fn edit_accepts_unique_id_prefix() {
    let data_dir = temp_path("edit-prefix");
    seed_timer(&data_dir);

    let output = timerbox(&data_dir)
        .args(["edit", "timer", "--category", "Strength"])
        .output()
        .expect("failed to run edit");

    assert!(output.status.success());
    let stored = read_json(&data_dir.join("timers.json"));
    std::fs::remove_dir_all(&data_dir).ok();

    assert_eq!(stored[0]["category"], "Strength");
    assert_eq!(stored[0]["remaining"], 10);
}

#[test]
fn edit_unknown_id_leaves_store_untouched() {
    let data_dir = temp_path("edit-unknown");
    seed_timer(&data_dir);
    let before = std::fs::read_to_string(data_dir.join("timers.json")).unwrap();

    let output = timerbox(&data_dir)
        .args(["edit", "nope", "--name", "Other"])
        .output()
        .expect("failed to run edit");

    let after = std::fs::read_to_string(data_dir.join("timers.json")).unwrap();
    std::fs::remove_dir_all(&data_dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No timer matches nope"));
    assert_eq!(before, after);
}

#[test]
fn delete_removes_timer_and_keeps_history() {
    let data_dir = temp_path("delete");
    seed_timer(&data_dir);
    let history = serde_json::json!([
        {"id": "entry-1", "timerId": "timer-1", "timerName": "Pushups",
         "category": "Workout", "duration": 30, "completedAt": "2025-12-20T00:00:30.000Z"}
    ]);
    std::fs::write(data_dir.join("timerHistory.json"), history.to_string()).unwrap();

    let output = timerbox(&data_dir)
        .args(["delete", "timer-1"])
        .output()
        .expect("failed to run delete");

    assert!(output.status.success());
    let timers = read_json(&data_dir.join("timers.json"));
    let history = read_json(&data_dir.join("timerHistory.json"));
    std::fs::remove_dir_all(&data_dir).ok();

    assert_eq!(timers, serde_json::json!([]));
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn reset_restores_full_duration() {
    let data_dir = temp_path("reset");
    seed_timer(&data_dir);

    let output = timerbox(&data_dir)
        .args(["reset", "timer-1"])
        .output()
        .expect("failed to run reset");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Reset timer: Pushups"));
    let stored = read_json(&data_dir.join("timers.json"));
    std::fs::remove_dir_all(&data_dir).ok();

    assert_eq!(stored[0]["remaining"], 30);
}
