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

//! The two-lane cooperative scheduler.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::{SchedulerEvent, TickReport};
use crate::ids::TaskIdAllocator;
use crossbeam_channel::{Receiver, Sender};
use ember_core::diagnostics::{DiagnosticsSink, Level, LogSink};
use ember_core::task::{Lane, Task, TaskContext, TaskError, TaskId, TaskStep};
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Where lifecycle lines and events go.
struct Notifier {
    tag: String,
    log_lifecycle: bool,
    sink: Arc<dyn DiagnosticsSink>,
    events: Option<Sender<SchedulerEvent>>,
}

impl Notifier {
    fn line(&self, level: Level, message: impl FnOnce() -> String) {
        if level > Level::Warn && !self.log_lifecycle {
            return;
        }
        if self.sink.enabled(&self.tag, level) {
            self.sink.emit(&self.tag, level, &message());
        }
    }

    fn event(&self, event: SchedulerEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.try_send(event);
        }
    }
}

fn label(id: TaskId, task: &dyn Task) -> String {
    match task.name() {
        Some(name) => format!("{id} '{name}'"),
        None => id.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Lanes, id counter and notifier: everything a task may touch mid-tick.
struct SchedulerCore {
    parallel: BTreeMap<TaskId, Box<dyn Task>>,
    exclusive: VecDeque<(TaskId, Box<dyn Task>)>,
    /// The task being stepped; it is out of its lane while that happens.
    current: Option<TaskId>,
    ids: TaskIdAllocator,
    notifier: Notifier,
    catch_panics: bool,
}

impl SchedulerCore {
    fn contains(&self, id: TaskId) -> bool {
        self.current == Some(id)
            || self.parallel.contains_key(&id)
            || self.exclusive.iter().any(|(queued, _)| *queued == id)
    }

    fn insert(&mut self, task: Box<dyn Task>, lane: Lane) -> TaskId {
        let id = self.ids.allocate(|id| {
            self.current == Some(id)
                || self.parallel.contains_key(&id)
                || self.exclusive.iter().any(|(queued, _)| *queued == id)
        });

        self.notifier.line(Level::Debug, || {
            format!("Registered {} in {lane} lane", label(id, task.as_ref()))
        });
        self.notifier.event(SchedulerEvent::Registered {
            id,
            lane,
            name: task.name().map(str::to_owned),
        });

        match lane {
            Lane::Parallel => {
                self.parallel.insert(id, task);
            }
            Lane::Exclusive => self.exclusive.push_back((id, task)),
        }
        id
    }

    fn take(&mut self, id: TaskId) -> Option<Box<dyn Task>> {
        if let Some(task) = self.parallel.remove(&id) {
            return Some(task);
        }
        let index = self.exclusive.iter().position(|(queued, _)| *queued == id)?;
        self.exclusive.remove(index).map(|(_, task)| task)
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        match self.take(id) {
            Some(task) => {
                self.cancelled(id, task);
                true
            }
            None => false,
        }
    }

    fn notify_finish(&self, id: TaskId, task: &mut dyn Task, forced: bool) {
        if !self.catch_panics {
            task.on_finish(forced);
            return;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.on_finish(forced))) {
            let msg = panic_message(payload);
            self.notifier.line(Level::Error, || {
                format!("on_finish of {} panicked: {msg}", label(id, task))
            });
        }
    }

    fn cancelled(&self, id: TaskId, mut task: Box<dyn Task>) {
        self.notifier
            .line(Level::Info, || format!("Cancelled {}", label(id, task.as_ref())));
        self.notify_finish(id, task.as_mut(), true);
        self.notifier.event(SchedulerEvent::Cancelled { id });
    }

    fn finished(&self, id: TaskId, mut task: Box<dyn Task>) {
        self.notifier
            .line(Level::Debug, || format!("Finished {}", label(id, task.as_ref())));
        self.notify_finish(id, task.as_mut(), false);
        self.notifier.event(SchedulerEvent::Finished { id });
    }

    fn failed(&self, id: TaskId, mut task: Box<dyn Task>, error: TaskError) {
        self.notifier.line(Level::Error, || {
            format!("{} failed and was removed: {error}", label(id, task.as_ref()))
        });
        self.notify_finish(id, task.as_mut(), true);
        self.notifier.event(SchedulerEvent::Failed {
            id,
            reason: error.to_string(),
        });
    }
}

/// The scheduler as seen from inside a step.
struct StepContext<'a> {
    core: &'a mut SchedulerCore,
    id: TaskId,
    tick: u64,
    now: Instant,
    cancel_self: bool,
    cancelled_others: usize,
}

impl TaskContext for StepContext<'_> {
    fn id(&self) -> TaskId {
        self.id
    }

    fn tick(&self) -> u64 {
        self.tick
    }

    fn now(&self) -> Instant {
        self.now
    }

    fn spawn(&mut self, task: Box<dyn Task>, lane: Lane) -> TaskId {
        self.core.insert(task, lane)
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        if id == self.id {
            let first = !self.cancel_self;
            self.cancel_self = true;
            return first;
        }
        let cancelled = self.core.cancel(id);
        if cancelled {
            self.cancelled_others += 1;
        }
        cancelled
    }

    fn has_task(&self, id: TaskId) -> bool {
        if id == self.id {
            return !self.cancel_self;
        }
        self.core.contains(id)
    }
}

/// What became of a task after one step.
enum Outcome {
    Keep(Box<dyn Task>),
    Removed,
}

/// Drives registered tasks once per external tick.
///
/// Two lanes with different disciplines:
/// - **Parallel**: every task is stepped once per tick, in ascending id order.
/// - **Exclusive**: a FIFO queue of which only the head is stepped, after all
///   parallel tasks. Later exclusive tasks wait unstarted until every task
///   ahead of them has finished or been cancelled.
///
/// A task that fails (returns [`TaskStep::Failed`] or panics) is
/// force-finished and removed; the rest of the tick goes on.
///
/// ```text
/// process():  [ parallel#0, parallel#3, parallel#4 ]  →  exclusive head
/// ```
pub struct Scheduler {
    core: SchedulerCore,
    tick: u64,
    destroyed: bool,
}

impl Scheduler {
    /// Creates a scheduler with the given configuration, reporting to the
    /// `log` facade.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            core: SchedulerCore {
                parallel: BTreeMap::new(),
                exclusive: VecDeque::new(),
                current: None,
                ids: TaskIdAllocator::new(),
                notifier: Notifier {
                    tag: config.name,
                    log_lifecycle: config.log_lifecycle,
                    sink: Arc::new(LogSink),
                    events: None,
                },
                catch_panics: config.catch_panics,
            },
            tick: 0,
            destroyed: false,
        }
    }

    /// Creates a scheduler together with a bounded telemetry channel.
    pub fn with_event_channel(config: SchedulerConfig) -> (Self, Receiver<SchedulerEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(config.event_buffer_size);
        (Self::new(config).with_event_sender(tx), rx)
    }

    /// Routes lifecycle lines to `sink` instead of the `log` facade.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.core.notifier.sink = sink;
        self
    }

    /// Attaches a sender for [`SchedulerEvent`]s.
    pub fn with_event_sender(mut self, sender: Sender<SchedulerEvent>) -> Self {
        self.core.notifier.events = Some(sender);
        self
    }

    /// Replaces the id allocator, e.g. to resume numbering.
    pub fn with_id_allocator(mut self, ids: TaskIdAllocator) -> Self {
        self.core.ids = ids;
        self
    }

    fn destroyed_error(&self) -> SchedulerError {
        SchedulerError::Destroyed(self.core.notifier.tag.clone())
    }

    /// Registers `task` in `lane` and returns its id.
    pub fn register_task(
        &mut self,
        task: Box<dyn Task>,
        lane: Lane,
    ) -> Result<TaskId, SchedulerError> {
        if self.destroyed {
            return Err(self.destroyed_error());
        }
        Ok(self.core.insert(task, lane))
    }

    /// Convenience for `register_task(Box::new(task), lane)`.
    pub fn register<T: Task + 'static>(
        &mut self,
        task: T,
        lane: Lane,
    ) -> Result<TaskId, SchedulerError> {
        self.register_task(Box::new(task), lane)
    }

    /// Runs one tick using the current time.
    pub fn process(&mut self) -> Result<TickReport, SchedulerError> {
        self.process_at(Instant::now())
    }

    /// Runs one tick, handing `now` to every task as the tick's time.
    ///
    /// Parallel tasks first, then the exclusive head. Parallel tasks spawned
    /// during the tick are first stepped on the next one.
    pub fn process_at(&mut self, now: Instant) -> Result<TickReport, SchedulerError> {
        if self.destroyed {
            return Err(self.destroyed_error());
        }

        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let parallel: Vec<TaskId> = self.core.parallel.keys().copied().collect();
        for id in parallel {
            // Gone if an earlier task cancelled it this tick.
            let Some(task) = self.core.parallel.remove(&id) else {
                continue;
            };
            if let Outcome::Keep(task) = self.step_task(id, task, now, &mut report) {
                self.core.parallel.insert(id, task);
            }
        }

        if let Some((id, task)) = self.core.exclusive.pop_front() {
            report.exclusive_head = Some(id);
            if let Outcome::Keep(task) = self.step_task(id, task, now, &mut report) {
                self.core.exclusive.push_front((id, task));
            }
        }

        Ok(report)
    }

    fn step_task(
        &mut self,
        id: TaskId,
        mut task: Box<dyn Task>,
        now: Instant,
        report: &mut TickReport,
    ) -> Outcome {
        self.core.current = Some(id);
        let catch_panics = self.core.catch_panics;
        let mut ctx = StepContext {
            core: &mut self.core,
            id,
            tick: self.tick,
            now,
            cancel_self: false,
            cancelled_others: 0,
        };

        let step = if catch_panics {
            panic::catch_unwind(AssertUnwindSafe(|| task.step(&mut ctx))).unwrap_or_else(|payload| {
                TaskStep::Failed(TaskError::Panicked(panic_message(payload)))
            })
        } else {
            task.step(&mut ctx)
        };
        let cancel_self = ctx.cancel_self;
        report.cancelled += ctx.cancelled_others;
        report.stepped += 1;
        self.core.current = None;

        match step {
            TaskStep::Failed(error) => {
                report.failed += 1;
                self.core.failed(id, task, error);
                Outcome::Removed
            }
            _ if cancel_self => {
                report.cancelled += 1;
                self.core.cancelled(id, task);
                Outcome::Removed
            }
            TaskStep::Finished => {
                report.finished += 1;
                self.core.finished(id, task);
                Outcome::Removed
            }
            TaskStep::Continue => Outcome::Keep(task),
        }
    }

    /// Cancels the task with `id` in either lane.
    ///
    /// `on_finish(true)` has run by the time this returns. Unknown ids and a
    /// destroyed scheduler are silent no-ops returning `false`.
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        if self.destroyed {
            return false;
        }
        self.core.cancel(id)
    }

    /// Returns `true` while `id` is registered in either lane.
    pub fn has_task(&self, id: TaskId) -> bool {
        !self.destroyed && self.core.contains(id)
    }

    /// Drops every pending task without calling `on_finish`.
    ///
    /// The scheduler is unusable afterwards: `process` and `register_task`
    /// return [`SchedulerError::Destroyed`]. Calling `destroy` again does
    /// nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let count = self.len();
        self.core.parallel.clear();
        self.core.exclusive.clear();
        self.destroyed = true;

        self.core.notifier.line(Level::Info, || {
            format!("Destroyed, discarded {count} pending tasks")
        });
        self.core.notifier.event(SchedulerEvent::Discarded { count });
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of tasks in the parallel lane.
    pub fn parallel_len(&self) -> usize {
        self.core.parallel.len()
    }

    /// Number of tasks in the exclusive queue, head included.
    pub fn exclusive_len(&self) -> usize {
        self.core.exclusive.len()
    }

    /// Id of the exclusive task that will be stepped next.
    pub fn exclusive_head(&self) -> Option<TaskId> {
        self.core.exclusive.front().map(|(id, _)| *id)
    }

    /// Number of registered tasks across both lanes.
    pub fn len(&self) -> usize {
        self.parallel_len() + self.exclusive_len()
    }

    /// Returns `true` if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of ticks processed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The diagnostics tag this scheduler reports under.
    pub fn name(&self) -> &str {
        &self.core.notifier.tag
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.core.notifier.tag)
            .field("parallel", &self.parallel_len())
            .field("exclusive", &self.exclusive_len())
            .field("tick", &self.tick)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
