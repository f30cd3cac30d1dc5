//! Cancelable repeating task driven by explicit `Instant`s.

use std::time::{Duration, Instant};

/// A recurring activity. Fires are pulled with [`RepeatingTask::poll`]; once
/// stopped, a task never fires again, so late polls are no-ops.
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    interval: Duration,
    next_due: Option<Instant>,
}

impl RepeatingTask {
    /// First fire is one interval after `now`.
    pub fn start(now: Instant, interval: Duration) -> Self {
        Self {
            interval,
            next_due: Some(now + interval),
        }
    }

    pub fn stopped() -> Self {
        Self {
            interval: Duration::ZERO,
            next_due: None,
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Fires at most once. Returns the scheduled fire time, which may lie in the
    /// past when the caller is catching up; the next fire is one interval later.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        let due = self.next_due?;
        if due > now {
            return None;
        }
        self.next_due = Some(due + self.interval);
        Some(due)
    }

    /// Reschedule relative to the fire at `fired`, for tasks whose period changes.
    pub fn retime(&mut self, fired: Instant, interval: Duration) {
        self.interval = interval;
        if self.next_due.is_some() {
            self.next_due = Some(fired + interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_once_per_interval_and_catches_up() {
        let t0 = Instant::now();
        let mut task = RepeatingTask::start(t0, 20 * MS);
        assert_eq!(task.poll(t0 + 19 * MS), None);
        let mut fires = Vec::new();
        while let Some(at) = task.poll(t0 + 65 * MS) {
            fires.push(at);
        }
        assert_eq!(fires, vec![t0 + 20 * MS, t0 + 40 * MS, t0 + 60 * MS]);
        assert_eq!(task.next_due(), Some(t0 + 80 * MS));
    }

    #[test]
    fn stopped_task_never_fires() {
        let t0 = Instant::now();
        let mut task = RepeatingTask::start(t0, 10 * MS);
        task.stop();
        assert_eq!(task.next_due(), None);
        assert_eq!(task.poll(t0 + 1000 * MS), None);
        task.retime(t0, 5 * MS);
        assert_eq!(task.poll(t0 + 1000 * MS), None);
        assert_eq!(RepeatingTask::stopped().poll(t0), None);
    }

    #[test]
    fn retime_changes_next_delay() {
        let t0 = Instant::now();
        let mut task = RepeatingTask::start(t0, 600 * MS);
        let fired = task.poll(t0 + 600 * MS).unwrap();
        task.retime(fired, 300 * MS);
        assert_eq!(task.next_due(), Some(t0 + 900 * MS));
    }
}
