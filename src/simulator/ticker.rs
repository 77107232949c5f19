//! Start/stop interval primitive
//!
//! A `Ticker` owns at most one background task that calls a callback on a
//! fixed period. Starting an already running ticker is a no-op, so two
//! timers can never drive the same simulator.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Returned by a tick callback to keep going or end the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

pub struct Ticker {
    name: &'static str,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    fn handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn the tick task. The first tick fires one `period` from now.
    ///
    /// Returns `false` without spawning when a task is already running.
    /// Must be called inside a tokio runtime.
    pub fn start<F>(&self, period: Duration, mut on_tick: F) -> bool
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let mut slot = self.handle();
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!(ticker = self.name, "Ticker already running");
            return false;
        }

        let period = period.max(Duration::from_millis(1));
        let name = self.name;
        *slot = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if on_tick() == TickControl::Stop {
                    debug!(ticker = name, "Ticker finished");
                    break;
                }
            }
        }));

        debug!(ticker = self.name, period_ms = period.as_millis() as u64, "Ticker started");
        true
    }

    /// Abort the tick task; returns whether one was running
    pub fn stop(&self) -> bool {
        match self.handle().take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                debug!(ticker = self.name, "Ticker stopped");
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let ticker = Ticker::new("test");
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        assert!(ticker.start(Duration::from_millis(100), move || {
            c.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        }));
        let c = Arc::clone(&count);
        assert!(!ticker.start(Duration::from_millis(100), move || {
            c.fetch_add(100, Ordering::SeqCst);
            TickControl::Continue
        }));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        assert!(ticker.stop());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_callback_allows_restart() {
        let ticker = Ticker::new("test");
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        ticker.start(Duration::from_millis(10), move || {
            if c.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!ticker.is_running());

        assert!(ticker.start(Duration::from_millis(10), || TickControl::Stop));
    }
}
