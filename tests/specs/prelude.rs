//! Shared harness for window and controller specs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gk_core::{
    Clock, FakeAdapters, FakeClock, GarageAdapters, GarageMode, ScheduledKind, Scheduler,
};
use gk_daemon::controller::{Controller, WakeupPlanner, WakeupPolicy};

/// Fake backend bundle whose wake-up scheduling goes through the real planner
#[derive(Clone)]
pub struct PlannedFakes {
    fakes: FakeAdapters,
    planner: WakeupPlanner<FakeClock>,
}

impl GarageAdapters for PlannedFakes {
    type Jobs = FakeAdapters;
    type Users = FakeAdapters;
    type Signals = FakeAdapters;
    type Telemetry = FakeAdapters;
    type Wakeup = WakeupPlanner<FakeClock>;

    fn jobs(&self) -> FakeAdapters {
        self.fakes.clone()
    }

    fn users(&self) -> FakeAdapters {
        self.fakes.clone()
    }

    fn signals(&self) -> FakeAdapters {
        self.fakes.clone()
    }

    fn telemetry(&self) -> FakeAdapters {
        self.fakes.clone()
    }

    fn wakeup(&self) -> WakeupPlanner<FakeClock> {
        self.planner.clone()
    }
}

/// A complete in-process world: controller, coordinator, fakes, fake time
pub struct World {
    pub fakes: FakeAdapters,
    pub clock: FakeClock,
    pub scheduler: Arc<Mutex<Scheduler>>,
    pub controller: Controller<PlannedFakes, FakeClock>,
}

impl World {
    pub fn new() -> Self {
        Self::with_policy(&["15m,1", "6h,8", "1d,5"])
    }

    pub fn with_policy(rows: &[&str]) -> Self {
        let clock = FakeClock::new();
        let scheduler = Arc::new(Mutex::new(Scheduler::new()));
        let policy = WakeupPolicy::parse(rows).unwrap();
        let planner = WakeupPlanner::new(Arc::clone(&scheduler), policy, clock.clone());
        let fakes = FakeAdapters::new();
        let adapters = PlannedFakes {
            fakes: fakes.clone(),
            planner: planner.clone(),
        };
        let garage = Arc::new(GarageMode::new(
            adapters,
            Arc::clone(&scheduler),
            clock.clone(),
        ));
        let controller = Controller::new(garage, planner);
        Self {
            fakes,
            clock,
            scheduler,
            controller,
        }
    }

    /// Fire every timer due at the current fake time, including timers armed
    /// by the dispatched handlers themselves
    pub async fn run_due(&self) {
        loop {
            let due = {
                let mut scheduler = self.scheduler.lock().unwrap_or_else(|e| e.into_inner());
                scheduler.poll(self.clock.now())
            };
            if due.is_empty() {
                return;
            }
            for item in due {
                match item.kind {
                    ScheduledKind::JobPoll => self.controller.garage().on_job_poll().await,
                    ScheduledKind::UserStopCheck => {
                        self.controller.garage().on_user_stop_check().await
                    }
                    ScheduledKind::Wakeup => self.controller.on_wakeup().await,
                }
            }
        }
    }

    /// Advance fake time and fire whatever became due
    pub async fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
        self.run_due().await;
    }

    /// Whether a timer with this id is currently armed
    pub fn timer_armed(&self, id: &str) -> bool {
        let scheduler = self.scheduler.lock().unwrap_or_else(|e| e.into_inner());
        scheduler.is_armed(id)
    }
}
