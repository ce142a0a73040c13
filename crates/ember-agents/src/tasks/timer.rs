// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use ember_core::task::{Task, TaskContext, TaskStep};
use std::time::{Duration, Instant};

type Action = Box<dyn FnMut(&mut dyn TaskContext) + Send>;

/// Runs an action after a delay, once, a fixed number of times, or forever.
///
/// The clock starts on the first step, using the tick time handed out by the
/// scheduler. Each period restarts from the tick that fired, so a long frame
/// delays the next firing rather than causing a burst.
pub struct TimerTask {
    name: String,
    interval: Duration,
    remaining: Option<u32>,
    period_start: Option<Instant>,
    fired: u32,
    action: Action,
}

impl TimerTask {
    /// Fires `action` once, `delay` after the first step, then finishes.
    pub fn once(
        name: impl Into<String>,
        delay: Duration,
        action: impl FnMut(&mut dyn TaskContext) + Send + 'static,
    ) -> Self {
        Self::build(name.into(), delay, Some(1), Box::new(action))
    }

    /// Fires `action` every `interval` until cancelled.
    pub fn repeating(
        name: impl Into<String>,
        interval: Duration,
        action: impl FnMut(&mut dyn TaskContext) + Send + 'static,
    ) -> Self {
        Self::build(name.into(), interval, None, Box::new(action))
    }

    fn build(name: String, interval: Duration, remaining: Option<u32>, action: Action) -> Self {
        Self {
            name,
            interval,
            remaining,
            period_start: None,
            fired: 0,
            action,
        }
    }

    /// Limits the timer to `count` firings. Zero finishes on the first step.
    pub fn times(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }

    /// Number of firings so far.
    pub fn fired(&self) -> u32 {
        self.fired
    }
}

impl Task for TimerTask {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn step(&mut self, ctx: &mut dyn TaskContext) -> TaskStep {
        if self.remaining == Some(0) {
            return TaskStep::Finished;
        }

        let now = ctx.now();
        let start = *self.period_start.get_or_insert(now);
        if now.saturating_duration_since(start) < self.interval {
            return TaskStep::Continue;
        }

        (self.action)(ctx);
        self.fired += 1;
        self.period_start = Some(now);

        match self.remaining.as_mut() {
            Some(left) => {
                *left -= 1;
                TaskStep::from_continue(*left > 0)
            }
            None => TaskStep::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_control::Scheduler;
    use ember_core::task::Lane;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn once_fires_after_delay_then_finishes() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let mut scheduler = Scheduler::default();
        let id = scheduler
            .register(
                TimerTask::once("hide_banner", Duration::from_millis(500), move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                Lane::Parallel,
            )
            .unwrap();

        let t0 = Instant::now();
        scheduler.process_at(t0).unwrap();
        scheduler.process_at(t0 + Duration::from_millis(499)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(scheduler.has_task(id));

        scheduler.process_at(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!scheduler.has_task(id));
    }

    #[test]
    fn limited_repeats_restart_from_firing_tick() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let mut scheduler = Scheduler::default();
        let id = scheduler
            .register(
                TimerTask::repeating("flash", Duration::from_secs(1), move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .times(2),
                Lane::Parallel,
            )
            .unwrap();

        let t0 = Instant::now();
        scheduler.process_at(t0).unwrap();
        // A late frame fires once, not twice.
        scheduler.process_at(t0 + Duration::from_millis(2500)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        scheduler.process_at(t0 + Duration::from_millis(3000)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        scheduler.process_at(t0 + Duration::from_millis(3500)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(!scheduler.has_task(id));
    }

    #[test]
    fn zero_times_finishes_without_firing() {
        let mut scheduler = Scheduler::default();
        scheduler
            .register(
                TimerTask::once("noop", Duration::ZERO, |_| panic!("must not fire")).times(0),
                Lane::Parallel,
            )
            .unwrap();

        let report = scheduler.process().unwrap();
        assert_eq!(report.finished, 1);
        assert_eq!(report.failed, 0);
    }
}
