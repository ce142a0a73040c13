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
use std::collections::VecDeque;

/// Runs stages one after another, one stage step per tick.
///
/// Typical use is a scripted sequence registered on the exclusive lane, such
/// as fade out, swap the room, fade in. Each stage gets its own `on_finish`
/// when it completes. If a stage fails, the whole sequence fails with that
/// error. If the sequence is cancelled, the running stage is force-finished and
/// stages that never started are dropped silently.
pub struct SequenceTask {
    name: String,
    stages: VecDeque<Box<dyn Task>>,
    current_started: bool,
    completed: usize,
}

impl SequenceTask {
    /// Creates an empty sequence. An empty sequence finishes on its first step.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: VecDeque::new(),
            current_started: false,
            completed: 0,
        }
    }

    /// Appends a stage.
    pub fn then(mut self, stage: impl Task + 'static) -> Self {
        self.stages.push_back(Box::new(stage));
        self
    }

    /// Appends an already boxed stage.
    pub fn push(&mut self, stage: Box<dyn Task>) {
        self.stages.push_back(stage);
    }

    /// Number of stages that completed.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Number of stages left, the running one included.
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl Task for SequenceTask {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn step(&mut self, ctx: &mut dyn TaskContext) -> TaskStep {
        let Some(stage) = self.stages.front_mut() else {
            return TaskStep::Finished;
        };
        self.current_started = true;

        match stage.step(ctx) {
            TaskStep::Continue => TaskStep::Continue,
            TaskStep::Finished => {
                if let Some(mut done) = self.stages.pop_front() {
                    done.on_finish(false);
                }
                self.current_started = false;
                self.completed += 1;
                log::trace!(
                    "SequenceTask '{}': stage {} done, {} left",
                    self.name,
                    self.completed,
                    self.stages.len()
                );
                TaskStep::from_continue(!self.stages.is_empty())
            }
            TaskStep::Failed(error) => {
                if let Some(mut failed) = self.stages.pop_front() {
                    failed.on_finish(true);
                }
                self.current_started = false;
                log::debug!(
                    "SequenceTask '{}': stage {} failed",
                    self.name,
                    self.completed + 1
                );
                TaskStep::Failed(error)
            }
        }
    }

    fn on_finish(&mut self, forced: bool) {
        if forced && self.current_started {
            if let Some(mut running) = self.stages.pop_front() {
                running.on_finish(true);
            }
        }
        self.stages.clear();
    }
}
