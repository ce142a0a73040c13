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

type StepFn = Box<dyn FnMut(&mut dyn TaskContext) -> TaskStep + Send>;
type FinishFn = Box<dyn FnMut(bool) + Send>;

/// A task built from closures.
///
/// ```rust
/// use ember_agents::tasks::FnTask;
/// use ember_core::task::TaskStep;
///
/// let mut frames = 0;
/// let task = FnTask::new(move |_ctx| {
///     frames += 1;
///     TaskStep::from_continue(frames < 10)
/// })
/// .named("blink");
/// ```
pub struct FnTask {
    name: Option<String>,
    step: StepFn,
    finish: Option<FinishFn>,
}

impl FnTask {
    /// Wraps a step closure.
    pub fn new(step: impl FnMut(&mut dyn TaskContext) -> TaskStep + Send + 'static) -> Self {
        Self {
            name: None,
            step: Box::new(step),
            finish: None,
        }
    }

    /// Wraps a fallible step closure; an `Err` becomes [`TaskStep::Failed`].
    pub fn fallible(
        mut step: impl FnMut(&mut dyn TaskContext) -> anyhow::Result<TaskStep> + Send + 'static,
    ) -> Self {
        Self::new(move |ctx| step(ctx).into())
    }

    /// Sets the diagnostic label.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Runs `finish` when the task leaves the scheduler.
    pub fn with_finish(mut self, finish: impl FnMut(bool) + Send + 'static) -> Self {
        self.finish = Some(Box::new(finish));
        self
    }
}

impl Task for FnTask {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn step(&mut self, ctx: &mut dyn TaskContext) -> TaskStep {
        (self.step)(ctx)
    }

    fn on_finish(&mut self, forced: bool) {
        if let Some(finish) = self.finish.as_mut() {
            finish(forced);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Context};
    use ember_control::Scheduler;
    use ember_core::task::Lane;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn fallible_errors_become_failures() {
        let finished_forced = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished_forced);
        let mut scheduler = Scheduler::default();
        let id = scheduler
            .register(
                FnTask::fallible(|_| {
                    let level: u32 = "x".parse().context("parsing level number")?;
                    if level > 3 {
                        bail!("level out of range");
                    }
                    Ok(TaskStep::Finished)
                })
                .named("load")
                .with_finish(move |forced| flag.store(forced, Ordering::SeqCst)),
                Lane::Parallel,
            )
            .unwrap();

        let report = scheduler.process().unwrap();
        assert_eq!(report.failed, 1);
        assert!(!scheduler.has_task(id));
        assert!(finished_forced.load(Ordering::SeqCst));
    }

    #[test]
    fn name_is_optional() {
        assert_eq!(FnTask::new(|_| TaskStep::Finished).name(), None);
        assert_eq!(
            FnTask::new(|_| TaskStep::Finished).named("blink").name(),
            Some("blink")
        );
    }
}
