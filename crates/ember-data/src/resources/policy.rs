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

use ember_core::resource::ResourceKindTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-kind overrides of the idle threshold, keyed by the tag's stable name
/// (`"texture"`, `"music"`, ...).
///
/// Kinds without an override keep the lifetime they declare themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimePolicy {
    /// Idle threshold in milliseconds, per kind name.
    pub max_lifetime_ms: BTreeMap<String, u64>,
}

impl LifetimePolicy {
    /// Adds or replaces the override for `tag`.
    pub fn with_override(mut self, tag: ResourceKindTag, lifetime: Duration) -> Self {
        self.max_lifetime_ms
            .insert(tag.as_str().to_owned(), lifetime.as_millis() as u64);
        self
    }

    /// The override for `tag`, if any.
    pub fn override_for(&self, tag: ResourceKindTag) -> Option<Duration> {
        self.max_lifetime_ms
            .get(tag.as_str())
            .copied()
            .map(Duration::from_millis)
    }

    /// The override for `tag`, or `kind_default`.
    pub fn lifetime_for(&self, tag: ResourceKindTag, kind_default: Duration) -> Duration {
        self.override_for(tag).unwrap_or(kind_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_kind_default() {
        let policy = LifetimePolicy::default();
        assert_eq!(
            policy.lifetime_for(ResourceKindTag::Tilemap, Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn custom_kinds_are_keyed_by_name() {
        let policy = LifetimePolicy::default()
            .with_override(ResourceKindTag::Custom("font"), Duration::from_millis(1500));
        assert_eq!(
            policy.override_for(ResourceKindTag::Custom("font")),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn parses_from_ron() {
        let policy: LifetimePolicy =
            ron::from_str(r#"(max_lifetime_ms: {"music": 90000, "texture": 5000})"#).unwrap();
        assert_eq!(
            policy.override_for(ResourceKindTag::Music),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            policy.override_for(ResourceKindTag::Texture),
            Some(Duration::from_secs(5))
        );

        let empty: LifetimePolicy = ron::from_str("()").unwrap();
        assert!(empty.max_lifetime_ms.is_empty());
    }
}
