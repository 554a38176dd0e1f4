// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_config(root: &std::path::Path) -> Config {
    Config::for_root(root).unwrap()
}

#[tokio::test]
async fn startup_creates_socket_and_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let state = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());
    assert!(config.lock_path.exists());

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    drop(state);
}

#[tokio::test]
async fn second_startup_fails_while_lock_held() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let _state = startup(&config).await.unwrap();
    let err = startup(&config).await.err().unwrap();
    assert!(matches!(err, LifecycleError::LockFailed(_)));
}

#[tokio::test]
async fn bad_wakeup_policy_fails_startup_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.settings.wakeup_policy = vec!["not-a-row".to_string()];

    let err = startup(&config).await.err().unwrap();
    assert!(matches!(err, LifecycleError::Policy(_)));
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn shutdown_removes_runtime_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let mut state = startup(&config).await.unwrap();
    state.shutdown().await;

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn idle_daemon_sleeps_one_heartbeat() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let state = startup(&config).await.unwrap();
    assert_eq!(state.until_next_timer(), std::time::Duration::from_secs(1));
}

#[tokio::test]
async fn dispatch_with_empty_scheduler_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let state = startup(&config).await.unwrap();
    state.dispatch_due_timers().await;
    assert!(!state.controller.garage().is_active());
}
