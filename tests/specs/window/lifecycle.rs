//! Full idle-window lifecycle: enter, poll, finish, cancel.

use std::time::Duration;

use gk_core::{AdapterCall, ModeSignal, Outcome};
use gk_daemon::controller::WAKEUP_TIMER;

use crate::prelude::World;

#[tokio::test]
async fn window_completes_when_jobs_drain() {
    let world = World::new();
    world.fakes.script_running(&["update-maps"]);
    world.fakes.script_running(&[]);

    let waiter = world.controller.initiate_garage_mode().await;
    assert!(world.controller.garage().is_active());
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 1);

    // First poll after the initial delay still sees a running job
    world.advance(Duration::from_secs(10)).await;
    assert!(world.controller.garage().is_active());
    assert_eq!(
        world.controller.garage().pending_jobs(),
        vec!["update-maps".to_string()]
    );

    // One fast re-poll later the backend is drained
    world.advance(Duration::from_secs(1)).await;
    assert!(!world.controller.garage().is_active());
    assert_eq!(world.fakes.broadcasts(ModeSignal::Off), 1);
    assert_eq!(waiter.wait().await, Outcome::Completed);
}

#[tokio::test]
async fn completion_schedules_a_maintenance_wakeup() {
    let world = World::new();

    world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;

    assert!(world.timer_armed(WAKEUP_TIMER));
}

#[tokio::test]
async fn cancel_cuts_the_window_short() {
    let world = World::new();
    world.fakes.script_running(&["update-maps"]);

    let waiter = world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;
    assert!(world.controller.garage().is_active());

    world.controller.cancel_garage_mode().await;
    assert!(!world.controller.garage().is_active());
    assert_eq!(world.fakes.broadcasts(ModeSignal::Off), 1);
    assert_eq!(waiter.wait().await, Outcome::Canceled);

    // The canceled window never logged a session stop
    assert!(!world
        .fakes
        .calls()
        .contains(&AdapterCall::LogSessionStop));
}

#[tokio::test]
async fn pending_jobs_stay_visible_after_the_window_closes() {
    let world = World::new();
    world.fakes.script_running(&["update-maps", "cache-prune"]);

    world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;

    world.controller.cancel_garage_mode().await;
    assert_eq!(
        world.controller.garage().pending_jobs(),
        vec!["update-maps".to_string(), "cache-prune".to_string()]
    );
}

#[tokio::test]
async fn backend_outage_closes_the_window() {
    let world = World::new();
    world.fakes.set_backend_unavailable(true);

    let waiter = world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;

    // An unreachable backend reads as zero blockers
    assert!(!world.controller.garage().is_active());
    assert_eq!(waiter.wait().await, Outcome::Completed);
}
