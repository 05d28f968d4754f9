use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
struct TimerState {
    started_at: DateTime<Utc>,
    started: Instant,
    ended_at: DateTime<Utc>,
    elapsed: Duration,
}

/// Named, restartable stopwatches for lifecycle diagnostics. Starting an
/// existing name resets it; ending a never-started name is a logged no-op.
/// Not correctness-critical, read only in the single-task execution path.
#[derive(Debug, Default)]
pub struct TaskTimers {
    timers: HashMap<String, TimerState>,
    order: Vec<String>,
}

impl TaskTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the named timer.
    pub fn start(&mut self, name: &str) {
        let now_utc = Utc::now();
        let state = TimerState {
            started_at: now_utc,
            started: Instant::now(),
            ended_at: now_utc,
            elapsed: Duration::ZERO,
        };
        if self.timers.insert(name.to_string(), state).is_none() {
            self.order.push(name.to_string());
        }
    }

    /// Stop the named timer and return its elapsed time, or `None` if it was
    /// never started.
    pub fn end(&mut self, name: &str) -> Option<Duration> {
        match self.timers.get_mut(name) {
            Some(state) => {
                state.ended_at = Utc::now();
                state.elapsed = state.started.elapsed();
                Some(state.elapsed)
            }
            None => {
                tracing::warn!("Timer '{}' was never started", name);
                None
            }
        }
    }

    /// Log one line per timer, in start order, tagged with the job name.
    pub fn log_summary(&self, job_name: &str) {
        for name in &self.order {
            if let Some(state) = self.timers.get(name) {
                tracing::debug!(
                    "{}: {:<40} {} {} {:.2}s",
                    job_name,
                    name,
                    state.started_at.format("%H:%M:%S%.6f"),
                    state.ended_at.format("%H:%M:%S%.6f"),
                    state.elapsed.as_secs_f64()
                );
            }
        }
    }

    #[cfg(test)]
    fn elapsed(&self, name: &str) -> Option<Duration> {
        self.timers.get(name).map(|s| s.elapsed)
    }
}
