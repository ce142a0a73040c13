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

//! # Task Abstraction
//!
//! The contract for a unit of per-tick work driven by the scheduler.
//!
//! A **Task** is a manual coroutine: every tick the scheduler calls
//! [`Task::step`] once, and the task either asks to be called again
//! ([`TaskStep::Continue`]), declares itself done ([`TaskStep::Finished`]) or
//! reports a failure ([`TaskStep::Failed`]). When the task leaves the scheduler
//! for any reason it receives exactly one [`Task::on_finish`] call telling it
//! whether it completed on its own or was cut short.
//!
//! ## Lifecycle
//!
//! ```text
//! register  →  [ step(ctx) → Continue ]*  →  step(ctx) → Finished   →  on_finish(false)
//!                                         →  step(ctx) → Failed(e)  →  on_finish(true)
//!                                         →  cancel(id)             →  on_finish(true)
//! ```
//!
//! ## Lanes
//!
//! Tasks are registered to one of two [`Lane`]s. Every parallel task is
//! stepped every tick. Exclusive tasks form a FIFO queue of which only the head
//! is ever stepped, so a room transition or a cutscene runs strictly one at a
//! time while timers keep ticking beside it.
//!
//! ## Usage
//!
//! ```rust
//! use ember_core::task::{Task, TaskContext, TaskStep};
//!
//! struct Blink {
//!     remaining: u32,
//! }
//!
//! impl Task for Blink {
//!     fn name(&self) -> Option<&str> {
//!         Some("blink")
//!     }
//!
//!     fn step(&mut self, _ctx: &mut dyn TaskContext) -> TaskStep {
//!         if self.remaining == 0 {
//!             return TaskStep::Finished;
//!         }
//!         self.remaining -= 1;
//!         TaskStep::Continue
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Error type for a failed task step.
#[derive(Debug)]
pub enum TaskError {
    /// The task reported a failure with a message.
    Failed(String),
    /// The step function panicked; the payload message is kept when it was a string.
    Panicked(String),
    /// A domain-specific error bubbled out of the step.
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    /// Convenience constructor for a message-only failure.
    pub fn msg(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }

    /// Wraps any error raised while stepping.
    pub fn from_error(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TaskError::Source(error.into())
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Failed(msg) => write!(f, "Task failed: {msg}"),
            TaskError::Panicked(msg) => write!(f, "Task panicked: {msg}"),
            TaskError::Source(e) => write!(f, "Task failed: {e}"),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskError::Source(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// The outcome of one call to [`Task::step`].
#[derive(Debug)]
pub enum TaskStep {
    /// Step the task again on the next tick.
    Continue,
    /// The task completed on its own.
    Finished,
    /// The task failed; it is force-finished and removed.
    Failed(TaskError),
}

impl TaskStep {
    /// Shorthand for `TaskStep::Failed(TaskError::msg(message))`.
    pub fn fail(message: impl Into<String>) -> Self {
        TaskStep::Failed(TaskError::msg(message))
    }

    /// Maps `true` to [`TaskStep::Continue`] and `false` to [`TaskStep::Finished`].
    pub fn from_continue(keep_going: bool) -> Self {
        if keep_going {
            TaskStep::Continue
        } else {
            TaskStep::Finished
        }
    }

    /// Returns `true` for [`TaskStep::Continue`].
    pub fn is_continue(&self) -> bool {
        matches!(self, TaskStep::Continue)
    }
}

impl<E> From<Result<TaskStep, E>> for TaskStep
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn from(result: Result<TaskStep, E>) -> Self {
        match result {
            Ok(step) => step,
            Err(e) => TaskStep::Failed(TaskError::from_error(e)),
        }
    }
}

/// Scheduler lane a task is registered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// Stepped every tick, independently of every other task.
    Parallel,
    /// FIFO queue, only the head is stepped.
    Exclusive,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Parallel => write!(f, "Parallel"),
            Lane::Exclusive => write!(f, "Exclusive"),
        }
    }
}

/// Identifier handed out by a scheduler when a task is registered.
///
/// Unique among the live tasks of one scheduler. The counter wraps at
/// `u64::MAX`, so an id may come back once its task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates an id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// The view of the scheduler a task gets while it is being stepped.
pub trait TaskContext {
    /// Id of the task currently being stepped.
    fn id(&self) -> TaskId;

    /// Number of the tick being processed, starting at 1.
    fn tick(&self) -> u64;

    /// Time captured when the current tick started.
    fn now(&self) -> Instant;

    /// Registers a new task. Parallel tasks spawned mid-tick are first stepped
    /// on the next tick.
    fn spawn(&mut self, task: Box<dyn Task>, lane: Lane) -> TaskId;

    /// Cancels a task synchronously. Cancelling the current task force-finishes
    /// it once its step returns. Returns `false` for unknown ids.
    fn cancel(&mut self, id: TaskId) -> bool;

    /// Returns `true` while `id` is live in either lane.
    fn has_task(&self, id: TaskId) -> bool;
}

/// A unit of per-tick work.
pub trait Task: Send {
    /// Diagnostic label.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Advances the task by one tick. Must return promptly.
    fn step(&mut self, ctx: &mut dyn TaskContext) -> TaskStep;

    /// Called exactly once when the task leaves the scheduler. `forced` is
    /// `true` after a failure or a cancellation.
    fn on_finish(&mut self, _forced: bool) {}
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name().unwrap_or("<unnamed>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_from_bool() {
        assert!(TaskStep::from_continue(true).is_continue());
        assert!(matches!(TaskStep::from_continue(false), TaskStep::Finished));
    }

    #[test]
    fn step_from_result_keeps_error() {
        let step: TaskStep = Err::<TaskStep, _>("missing room").into();
        match step {
            TaskStep::Failed(e) => assert_eq!(e.to_string(), "Task failed: missing room"),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(TaskId::new(1) < TaskId::new(2));
        assert_eq!(TaskId::new(7).to_string(), "task#7");
    }
}
