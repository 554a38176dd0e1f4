//! Maintenance wake-up chains driven by the wake-up policy.

use std::time::Duration;

use gk_core::ModeSignal;
use gk_daemon::controller::WAKEUP_TIMER;

use crate::prelude::World;

const FIFTEEN_MIN: Duration = Duration::from_secs(15 * 60);
const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

/// Completes the currently open window (empty backend, 10s initial poll)
async fn complete_window(world: &World) {
    world.advance(Duration::from_secs(10)).await;
    assert!(!world.controller.garage().is_active());
}

#[tokio::test]
async fn wakeup_opens_a_new_window() {
    let world = World::with_policy(&["15m,1", "6h,1"]);

    world.controller.initiate_garage_mode().await;
    complete_window(&world).await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 1);

    world.advance(FIFTEEN_MIN).await;
    assert!(world.controller.garage().is_active());
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 2);
}

#[tokio::test]
async fn policy_walk_spans_windows_and_repeats_its_last_row() {
    let world = World::with_policy(&["15m,1", "6h,1"]);

    world.controller.initiate_garage_mode().await;
    complete_window(&world).await;

    // Row one: 15 minutes
    world.advance(FIFTEEN_MIN).await;
    complete_window(&world).await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 2);

    // Row two: 6 hours
    world.advance(SIX_HOURS).await;
    complete_window(&world).await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 3);

    // Policy exhausted: the last row keeps repeating
    world.advance(SIX_HOURS).await;
    complete_window(&world).await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 4);
}

#[tokio::test]
async fn vehicle_use_restarts_the_policy_walk() {
    let world = World::with_policy(&["15m,1", "6h,1"]);

    world.controller.initiate_garage_mode().await;
    complete_window(&world).await;
    world.advance(FIFTEEN_MIN).await;
    complete_window(&world).await;
    assert!(world.timer_armed(WAKEUP_TIMER));

    // Vehicle comes back into use: armed wake-up is dropped
    world.controller.cancel_garage_mode().await;
    assert!(!world.timer_armed(WAKEUP_TIMER));

    // The next completed window starts over at row one
    world.controller.initiate_garage_mode().await;
    complete_window(&world).await;
    let before = world.fakes.broadcasts(ModeSignal::On);
    world.advance(FIFTEEN_MIN).await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), before + 1);
}

#[tokio::test]
async fn wakeup_while_active_does_not_reenter() {
    let world = World::with_policy(&["15m,1"]);
    world.fakes.script_running(&["long-job"]);

    world.controller.initiate_garage_mode().await;

    // Fire a wake-up by hand while the window is still open
    world.controller.on_wakeup().await;
    assert_eq!(world.fakes.broadcasts(ModeSignal::On), 1);
}
