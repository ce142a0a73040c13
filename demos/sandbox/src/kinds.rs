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

//! Stand-in resource kinds. Nothing is read from disk; construction just
//! allocates a buffer sized from the name.

use ember_core::resource::{ResourceError, ResourceKind, ResourceKindTag};
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Texture {
    pub path: String,
    pub pixels: Vec<u8>,
}

pub struct TextureFile {
    pub path: String,
}

impl TextureFile {
    pub fn new(name: &str) -> Self {
        Self {
            path: format!("textures/{name}"),
        }
    }
}

impl ResourceKind for TextureFile {
    type Resource = Texture;
    const TAG: ResourceKindTag = ResourceKindTag::Texture;

    fn new_reference(&self) -> Result<Texture, ResourceError> {
        if self.path.contains("missing") {
            return Err(ResourceError::not_found(&self.path));
        }
        Ok(Texture {
            path: self.path.clone(),
            pixels: vec![0; 64 * self.path.len()],
        })
    }
}

pub struct Music {
    pub track: String,
    playing: AtomicBool,
}

impl Music {
    pub fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

pub struct MusicFile {
    pub track: String,
}

impl MusicFile {
    pub fn new(name: &str) -> Self {
        Self {
            track: format!("music/{name}"),
        }
    }
}

impl ResourceKind for MusicFile {
    type Resource = Music;
    const TAG: ResourceKindTag = ResourceKindTag::Music;

    fn new_reference(&self) -> Result<Music, ResourceError> {
        Ok(Music {
            track: self.track.clone(),
            playing: AtomicBool::new(false),
        })
    }

    // A playing stream is never evicted, even when nobody references it.
    fn allow_dispose(&self, music: &Music) -> bool {
        !music.is_playing()
    }
}
