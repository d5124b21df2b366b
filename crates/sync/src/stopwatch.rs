//! Whole-second match clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);

/// Counts seconds on a background task while running.
#[derive(Default)]
pub struct Stopwatch {
    elapsed: Arc<AtomicU32>,
    ticker: Mutex<Option<CancellationToken>>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let Ok(mut ticker) = self.ticker.lock() else {
            return;
        };
        if ticker.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let elapsed = Arc::clone(&self.elapsed);
        let c = cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.tick().await; // Skip immediate first tick.

            loop {
                tokio::select! {
                    _ = c.cancelled() => break,
                    _ = interval.tick() => {
                        elapsed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
        *ticker = Some(cancel);
    }

    pub fn stop(&self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(cancel) = ticker.take() {
                cancel.cancel();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Whole seconds counted so far.
    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::Relaxed)
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.stop();
    }
}
