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

//! Where the runtime's lifecycle lines go.
//!
//! Components that report task registration, cancellation, completion and
//! failure do so through a [`DiagnosticsSink`] instead of calling the `log`
//! macros directly, so a game can route them to an in-game console or capture
//! them in tests. [`LogSink`] is the default and forwards to the `log` facade.

pub use log::Level;

/// Accepts `(tag, level, message)` triples.
pub trait DiagnosticsSink: Send + Sync {
    /// Records one line.
    fn emit(&self, tag: &str, level: Level, message: &str);

    /// Lets callers skip formatting lines nobody will read.
    fn enabled(&self, _tag: &str, _level: Level) -> bool {
        true
    }
}

/// Forwards every line to the `log` facade, using the tag as the log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn emit(&self, tag: &str, level: Level, message: &str) {
        log::log!(target: tag, level, "{message}");
    }

    fn enabled(&self, tag: &str, level: Level) -> bool {
        log::log_enabled!(target: tag, level)
    }
}
