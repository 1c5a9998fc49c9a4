//! Timed progress messages on the terminal.

use guide_core::StatusRotator;
use std::io::Write;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Runs a [`StatusRotator`] on a timer until dropped.
///
/// The first message is emitted before `start` returns; after that the
/// sink sees the next message every `period`, wrapping around.
pub struct StatusIndicator {
    handle: JoinHandle<()>,
    clear_line: bool,
}

impl StatusIndicator {
    pub fn start<F>(mut rotator: StatusRotator, period: Duration, mut sink: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        sink(rotator.current());
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                sink(rotator.advance());
            }
        });
        Self {
            handle,
            clear_line: false,
        }
    }

    /// Rewrite one stderr line in place.
    pub fn terminal(rotator: StatusRotator, period: Duration) -> Self {
        let mut indicator = Self::start(rotator, period, |message| {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K{}", message);
            let _ = stderr.flush();
        });
        indicator.clear_line = true;
        indicator
    }

    /// Stop the timer. Dropping the indicator does the same.
    pub fn stop(self) {}
}

impl Drop for StatusIndicator {
    fn drop(&mut self) {
        self.handle.abort();
        if self.clear_line {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        }
    }
}
