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

//! In-memory diagnostics sink.

use ember_core::diagnostics::{DiagnosticsSink, Level};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    /// Tag of the component that emitted the line.
    pub tag: String,
    /// Severity.
    pub level: Level,
    /// Rendered message.
    pub message: String,
}

/// Keeps the most recent lines in memory, optionally forwarding them to the
/// `log` facade as well.
///
/// Backs in-game consoles and lets tests assert on lifecycle output.
#[derive(Debug)]
pub struct RecordingSink {
    entries: Mutex<VecDeque<DiagnosticEntry>>,
    capacity: usize,
    forward: bool,
}

impl RecordingSink {
    /// Default number of retained lines.
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a sink retaining [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY) lines.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a sink retaining at most `capacity` lines; older lines are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            capacity: capacity.max(1),
            forward: false,
        }
    }

    /// Also forwards every line to the `log` facade.
    pub fn forwarding(mut self) -> Self {
        self.forward = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DiagnosticEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies of the retained lines, oldest first.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Number of retained lines at exactly `level`.
    pub fn count_at(&self, level: Level) -> usize {
        self.lock().iter().filter(|e| e.level == level).count()
    }

    /// Returns `true` if a retained line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Removes and returns every retained line.
    pub fn drain(&self) -> Vec<DiagnosticEntry> {
        self.lock().drain(..).collect()
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, tag: &str, level: Level, message: &str) {
        if self.forward {
            log::log!(target: tag, level, "{message}");
        }
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(DiagnosticEntry {
            tag: tag.to_owned(),
            level,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let sink = RecordingSink::new();
        sink.emit("Scheduler", Level::Debug, "Registered task#0");
        sink.emit("Scheduler", Level::Error, "task#0 failed");

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Registered task#0");
        assert_eq!(sink.count_at(Level::Error), 1);
        assert!(sink.contains("failed"));
    }

    #[test]
    fn drops_oldest_past_capacity() {
        let sink = RecordingSink::with_capacity(2);
        for i in 0..3 {
            sink.emit("t", Level::Info, &format!("line {i}"));
        }
        let messages: Vec<_> = sink.drain().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["line 1", "line 2"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn forwarding_still_records() {
        crate::logging::init_for_tests();
        let sink = RecordingSink::new().forwarding();
        sink.emit("Scheduler", Level::Warn, "slow tick");
        assert_eq!(sink.len(), 1);
    }
}
