use super::registry::SessionRegistry;
use super::state::CloseReason;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Background job that closes sessions with no frame activity.
///
/// ```ignore
/// let (shutdown_tx, handle) = IdleReaper::new(registry, idle_timeout, every).spawn();
/// // later
/// let _ = shutdown_tx.send(());
/// handle.await?;
/// ```
pub struct IdleReaper {
    registry: SessionRegistry,
    idle_timeout: Duration,
    interval: Duration,
}

impl IdleReaper {
    pub fn new(registry: SessionRegistry, idle_timeout: Duration, interval: Duration) -> Self {
        Self {
            registry,
            idle_timeout,
            interval,
        }
    }

    pub fn spawn(self) -> (watch::Sender<()>, tokio::task::JoinHandle<()>) {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            info!(
                interval_secs = self.interval.as_secs(),
                idle_timeout_secs = self.idle_timeout.as_secs(),
                "IdleReaper started"
            );

            let mut timer = interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!("IdleReaper received shutdown signal");
                        break;
                    }
                    _ = timer.tick() => {
                        self.run_cycle();
                    }
                }
            }

            info!("IdleReaper stopped");
        });

        (shutdown_tx, handle)
    }

    /// Signal every idle session to close. Returns how many were signalled.
    pub fn run_cycle(&self) -> usize {
        let mut reaped = 0;
        for handle in self.registry.idle_sessions(self.idle_timeout) {
            if handle.close(CloseReason::IdleTimeout) {
                info!(
                    session_id = %handle.id(),
                    idle_secs = handle.idle_for().as_secs(),
                    "Closing idle session"
                );
                reaped += 1;
            }
        }
        if reaped > 0 {
            debug!(reaped, "Idle reap cycle completed");
        }
        reaped
    }
}
