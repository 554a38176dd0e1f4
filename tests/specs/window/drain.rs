//! Background user drain after the window closes.

use std::time::Duration;

use gk_core::{AdapterCall, UserId};

use crate::prelude::World;

#[tokio::test]
async fn users_are_stopped_one_per_tick() {
    let world = World::new();
    world
        .fakes
        .set_background_users(vec![UserId(0), UserId(10), UserId(11)]);

    world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;
    assert!(!world.controller.garage().is_active());

    // The system user is untracked on its tick, never stopped
    world.advance(Duration::from_secs(10)).await;
    world.advance(Duration::from_secs(10)).await;
    world.advance(Duration::from_secs(10)).await;

    let stopped: Vec<UserId> = world
        .fakes
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            AdapterCall::StopBackgroundUser { id } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(stopped, vec![UserId(10), UserId(11)]);
}

#[tokio::test]
async fn drain_holds_while_jobs_are_running() {
    let world = World::new();
    world.fakes.set_background_users(vec![UserId(10)]);

    world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;
    assert!(!world.controller.garage().is_active());

    // A job shows up between drain ticks; the user must be left alone
    world.fakes.script_running(&["late-arrival"]);
    world.advance(Duration::from_secs(10)).await;
    assert!(!world
        .fakes
        .calls()
        .iter()
        .any(|c| matches!(c, AdapterCall::StopBackgroundUser { .. })));

    // Once the job is gone the drain resumes
    world.fakes.script_running(&[]);
    world.advance(Duration::from_secs(10)).await;
    assert!(world
        .fakes
        .calls()
        .contains(&AdapterCall::StopBackgroundUser { id: UserId(10) }));
}

#[tokio::test]
async fn failed_stop_still_advances_the_drain() {
    let world = World::new();
    world
        .fakes
        .set_background_users(vec![UserId(10), UserId(11)]);
    world.fakes.set_stop_user_fails(true);

    world.controller.initiate_garage_mode().await;
    world.advance(Duration::from_secs(10)).await;

    world.advance(Duration::from_secs(10)).await;
    world.advance(Duration::from_secs(10)).await;

    // Both users were attempted despite the failures
    let attempts = world
        .fakes
        .calls()
        .iter()
        .filter(|c| matches!(c, AdapterCall::StopBackgroundUser { .. }))
        .count();
    assert_eq!(attempts, 2);
}
