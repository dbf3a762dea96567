//! Tests for TimeManager

use project_scheduler_core_rs::TimeManager;

#[test]
fn test_time_manager_new() {
    let time = TimeManager::new();
    assert_eq!(time.current_tick(), 0);
}

#[test]
fn test_advance_tick() {
    let mut time = TimeManager::new();

    time.advance_tick();
    assert_eq!(time.current_tick(), 1);

    time.advance_tick();
    assert_eq!(time.current_tick(), 2);
}

#[test]
fn test_serde_roundtrip_preserves_tick() {
    let mut time = TimeManager::new();
    for _ in 0..17 {
        time.advance_tick();
    }

    let json = serde_json::to_string(&time).unwrap();
    let restored: TimeManager = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.current_tick(), 17);
}
