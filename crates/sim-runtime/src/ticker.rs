//! Periodic tick driver. The host starts it on entering the simulation and
//! stops it on teardown; the engine itself never schedules.

use crate::SharedSimulation;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Background task committing one tick per interval.
pub struct Ticker {
    stop: Option<oneshot::Sender<()>>,
    committed: watch::Receiver<u64>,
    handle: JoinHandle<u64>,
}

impl Ticker {
    /// Spawn on the current tokio runtime. The first tick fires one full
    /// period after start.
    pub fn start(sim: SharedSimulation, every: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let (publish, committed) = watch::channel(0u64);
        let handle = tokio::spawn(async move {
            let mut clock = interval(every);
            clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
            clock.tick().await;
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = clock.tick() => {
                        let report = sim.tick();
                        ticks += 1;
                        publish.send_replace(ticks);
                        debug!(ticks, bonus = report.bonus, "periodic tick");
                    }
                }
            }
            ticks
        });
        Self {
            stop: Some(stop),
            committed,
            handle,
        }
    }

    /// Running count of committed ticks; changes once per tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.committed.clone()
    }

    /// Stop the driver and return how many ticks it committed.
    pub async fn stop(mut self) -> u64 {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match (&mut self.handle).await {
            Ok(ticks) => ticks,
            Err(e) => {
                warn!(error = %e, "ticker task failed");
                0
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.handle.abort();
        }
    }
}
