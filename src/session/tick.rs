//! Fixed-rate tick loop driving every room

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::util::time::{tick_duration, Timer};

use super::RoomRegistry;

/// Tick all rooms at `tick_rate` Hz until the task is dropped
pub async fn run_tick_loop(registry: Arc<RoomRegistry>, tick_rate: u32) {
    let budget = tick_duration(tick_rate);
    let mut ticker = interval(budget);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(tick_rate, "Tick loop started");

    loop {
        ticker.tick().await;

        let timer = Timer::new();
        registry.tick_all();

        let elapsed = timer.elapsed_micros();
        if elapsed > budget.as_micros() as u64 {
            warn!(
                elapsed_micros = elapsed,
                budget_micros = budget.as_micros() as u64,
                rooms = registry.active_rooms(),
                "Tick over budget"
            );
        }
    }
}
