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

//! Telemetry emitted by the scheduler.

use ember_core::task::{Lane, TaskId};
use serde::Serialize;

/// Lifecycle event sent on the scheduler's optional telemetry channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchedulerEvent {
    /// A task entered a lane.
    Registered {
        /// Assigned id.
        id: TaskId,
        /// Lane it was registered to.
        lane: Lane,
        /// Diagnostic label, if the task has one.
        name: Option<String>,
    },
    /// A task completed on its own.
    Finished {
        /// Id of the task.
        id: TaskId,
    },
    /// A task's step failed or panicked.
    Failed {
        /// Id of the task.
        id: TaskId,
        /// Rendered error.
        reason: String,
    },
    /// A task was cancelled.
    Cancelled {
        /// Id of the task.
        id: TaskId,
    },
    /// The scheduler was destroyed with tasks still pending.
    Discarded {
        /// Number of tasks dropped without notification.
        count: usize,
    },
}

/// Summary of one call to [`Scheduler::process`](crate::Scheduler::process).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Step calls made this tick.
    pub stepped: usize,
    /// Tasks that finished on their own.
    pub finished: usize,
    /// Tasks removed after a failure.
    pub failed: usize,
    /// Tasks cancelled during this tick, self-cancels included.
    pub cancelled: usize,
    /// The exclusive task stepped this tick, if any.
    pub exclusive_head: Option<TaskId>,
}
