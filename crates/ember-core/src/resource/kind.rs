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

use super::ResourceError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Idle time after which a resource becomes eligible for eviction, unless its
/// kind says otherwise.
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(10);

/// Idle threshold for streamed music tracks.
pub const MUSIC_MAX_LIFETIME: Duration = Duration::from_secs(60);

/// Idle threshold for composite animation sets, which are expensive to rebuild.
pub const ANIMATION_SET_MAX_LIFETIME: Duration = Duration::from_secs(120);

/// Classification of resource kinds, used to bucket handles in the registry.
///
/// Kinds declare their tag through [`ResourceKind::TAG`]. Collaborators outside
/// the built-in set use [`ResourceKindTag::Custom`] with a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKindTag {
    /// GPU textures and sprite sheets.
    Texture,
    /// Short sound effects.
    AudioClip,
    /// Streamed music tracks.
    Music,
    /// Tilemap layers.
    Tilemap,
    /// Composite animation sets (skeleton + clips).
    AnimationSet,
    /// Parsed map data.
    MapData,
    /// Any other kind, identified by a stable name.
    Custom(&'static str),
}

impl ResourceKindTag {
    /// Returns the stable name of this tag, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKindTag::Texture => "texture",
            ResourceKindTag::AudioClip => "audio_clip",
            ResourceKindTag::Music => "music",
            ResourceKindTag::Tilemap => "tilemap",
            ResourceKindTag::AnimationSet => "animation_set",
            ResourceKindTag::MapData => "map_data",
            ResourceKindTag::Custom(name) => name,
        }
    }

    /// The idle threshold a kind gets when it does not override
    /// [`ResourceKind::max_lifetime`].
    pub fn default_max_lifetime(&self) -> Duration {
        match self {
            ResourceKindTag::Music => MUSIC_MAX_LIFETIME,
            ResourceKindTag::AnimationSet => ANIMATION_SET_MAX_LIFETIME,
            _ => DEFAULT_MAX_LIFETIME,
        }
    }
}

impl fmt::Display for ResourceKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability a resource type provides to the cache.
///
/// A value implementing this trait is the *recipe* for one resource: it keeps
/// whatever it needs (a path, decode options, a device handle) to rebuild the
/// instance from scratch each time the cache asks for it.
///
/// # Examples
///
/// ```
/// use ember_core::resource::{ResourceError, ResourceKind, ResourceKindTag};
///
/// struct Texture {
///     width: u32,
///     height: u32,
/// }
///
/// struct TextureFile {
///     path: String,
/// }
///
/// impl ResourceKind for TextureFile {
///     type Resource = Texture;
///     const TAG: ResourceKindTag = ResourceKindTag::Texture;
///
///     fn new_reference(&self) -> Result<Texture, ResourceError> {
///         if self.path.is_empty() {
///             return Err(ResourceError::not_found(&self.path));
///         }
///         Ok(Texture { width: 16, height: 16 })
///     }
/// }
/// ```
pub trait ResourceKind: Send + Sync + 'static {
    /// The heavy instance produced by this kind.
    type Resource: Send + Sync + 'static;

    /// The registry bucket handles of this kind are filed under.
    const TAG: ResourceKindTag;

    /// Builds a fresh instance.
    ///
    /// Called with the owning handle's lock held, so it must not call back
    /// into the same handle.
    fn new_reference(&self) -> Result<Self::Resource, ResourceError>;

    /// Kind-specific disposal guard, consulted after the generic referrer and
    /// pin checks. An audio clip, for example, refuses while it is playing.
    fn allow_dispose(&self, _resource: &Self::Resource) -> bool {
        true
    }

    /// How long an instance may sit unused before it is considered stale.
    fn max_lifetime(&self) -> Duration {
        Self::TAG.default_max_lifetime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lifetimes_per_tag() {
        assert_eq!(ResourceKindTag::Texture.default_max_lifetime(), DEFAULT_MAX_LIFETIME);
        assert_eq!(ResourceKindTag::Music.default_max_lifetime(), Duration::from_secs(60));
        assert_eq!(
            ResourceKindTag::AnimationSet.default_max_lifetime(),
            Duration::from_secs(120)
        );
        assert_eq!(
            ResourceKindTag::Custom("font").default_max_lifetime(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn tag_names_are_stable() {
        assert_eq!(ResourceKindTag::AudioClip.to_string(), "audio_clip");
        assert_eq!(ResourceKindTag::Custom("font").as_str(), "font");
    }

    struct Blob;

    impl ResourceKind for Blob {
        type Resource = Vec<u8>;
        const TAG: ResourceKindTag = ResourceKindTag::Music;

        fn new_reference(&self) -> Result<Vec<u8>, ResourceError> {
            Ok(vec![0; 4])
        }
    }

    #[test]
    fn kind_defaults_follow_tag() {
        let blob = Blob;
        assert_eq!(blob.max_lifetime(), MUSIC_MAX_LIFETIME);
        assert!(blob.allow_dispose(&vec![]));
    }
}
