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

//! Sandbox configuration, loaded from an optional RON file.

use anyhow::{Context, Result};
use ember_agents::SweepConfig;
use ember_control::SchedulerConfig;
use ember_data::resources::LifetimePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything the sandbox needs to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Number of frames to pump.
    pub ticks: u32,
    /// Simulated frame length in milliseconds.
    pub frame_ms: u64,
    /// Frame on which memory pressure is signalled, if any.
    pub pressure_at_tick: Option<u32>,
    pub scheduler: SchedulerConfig,
    pub sweep: SweepConfig,
    pub lifetimes: LifetimePolicy,
}

impl SandboxConfig {
    /// Reads and parses the RON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parses a RON document.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// The simulated frame length.
    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            ticks: 300,
            frame_ms: 100,
            pressure_at_tick: None,
            scheduler: SchedulerConfig {
                name: "SandboxScheduler".to_owned(),
                ..SchedulerConfig::default()
            },
            sweep: SweepConfig::default(),
            lifetimes: LifetimePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::resource::ResourceKindTag;

    #[test]
    fn sample_file_parses() {
        let config = SandboxConfig::parse(include_str!("../sandbox.ron")).unwrap();
        assert_eq!(config.ticks, 400);
        assert_eq!(config.pressure_at_tick, Some(350));
        assert_eq!(config.scheduler.name, "SandboxScheduler");
        assert!(config.scheduler.catch_panics, "missing fields keep their default");
        assert_eq!(config.sweep.max_evictions_per_pass, 4);
        assert_eq!(
            config.lifetimes.override_for(ResourceKindTag::Texture),
            Some(Duration::from_secs(8))
        );
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(SandboxConfig::parse("()").unwrap(), SandboxConfig::default());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(SandboxConfig::parse("(ticks: )").is_err());
    }
}
