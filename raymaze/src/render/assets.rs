//! Asset Handles
//!
//! Images and sounds keyed by logical name. Each handle is `Pending`,
//! `Ready` or `Failed`, and only `Ready` assets are ever drawn or played.
//! Loading itself belongs to the host; this module only tracks readiness
//! and can synthesise procedural stand-ins for headless runs.

use std::collections::BTreeMap;

use crate::render::frame::Color;

/// Image keys the renderer looks up.
pub const IMAGE_KEYS: [&str; 9] = [
    "wallTexture",
    "monster1",
    "monster2",
    "monster3",
    "pistol",
    "machinegun",
    "plasma",
    "player_client",
    "powerup",
];

/// Sound keys the session plays.
pub const SOUND_KEYS: [&str; 2] = ["shoot", "hit"];

/// Readiness of one asset.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetState<T> {
    /// Requested, not yet available
    Pending,
    /// Usable
    Ready(T),
    /// Load failed; treated like `Pending` by every consumer
    Failed(String),
}

impl<T> AssetState<T> {
    /// The asset if ready.
    pub fn ready(&self) -> Option<&T> {
        match self {
            AssetState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Decoded image, `0xAARRGGBB` row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Texture {
    /// Wrap pixels; `None` if the size does not match.
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return None;
        }
        Some(Self { width, height, pixels })
    }

    /// Build from tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width * height * 4 {
            return None;
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| Color::rgba(p[0], p[1], p[2], p[3]).0)
            .collect();
        Self::new(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample with normalised coordinates (wrapped into [0, 1)).
    #[inline]
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let x = ((u.rem_euclid(1.0) * self.width as f64) as usize).min(self.width - 1);
        let y = ((v.rem_euclid(1.0) * self.height as f64) as usize).min(self.height - 1);
        Color(self.pixels[y * self.width + x])
    }

    /// Brick wall pattern.
    pub fn brick(size: usize) -> Self {
        let size = size.max(8);
        let brick_h = size / 4;
        let brick_w = size / 2;
        let mut pixels = vec![0u32; size * size];
        for y in 0..size {
            for x in 0..size {
                let row = y / brick_h;
                let offset = if row % 2 == 0 { 0 } else { brick_w / 2 };
                let bx = (x + offset) % brick_w;
                let by = y % brick_h;
                pixels[y * size + x] = if by < 2 || bx < 2 {
                    0xFF333333
                } else {
                    let noise = ((x * 7 + y * 13) % 20) as u8;
                    Color::rgb(140 + noise, 60 + noise / 2, 30 + noise / 3).0
                };
            }
        }
        Self { width: size, height: size, pixels }
    }

    /// Filled disc on a transparent background.
    pub fn disc(size: usize, color: Color) -> Self {
        let size = size.max(2);
        let c = size as f64 / 2.0;
        let r2 = c * c;
        let pixels = (0..size * size)
            .map(|i| {
                let dx = (i % size) as f64 + 0.5 - c;
                let dy = (i / size) as f64 + 0.5 - c;
                if dx * dx + dy * dy <= r2 { color.0 } else { 0 }
            })
            .collect();
        Self { width: size, height: size, pixels }
    }

    /// Barrel pointing up from the bottom edge, transparent elsewhere.
    pub fn weapon(size: usize, barrel: Color) -> Self {
        let size = size.max(8);
        let mut pixels = vec![0u32; size * size];
        let (x0, x1) = (size * 2 / 5, size * 3 / 5);
        for y in size / 3..size {
            for x in x0..x1 {
                pixels[y * size + x] = if y < size / 3 + size / 10 { barrel.0 } else { 0xFF444444 };
            }
        }
        Self { width: size, height: size, pixels }
    }
}

/// A sound clip the host knows how to play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundClip {
    /// Logical name
    pub name: String,
}

/// Host audio output.
pub trait AudioSink {
    /// Start playing a clip from the beginning.
    fn play(&mut self, clip: &SoundClip);
}

/// Audio sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _clip: &SoundClip) {}
}

/// Image and sound handles keyed by logical name.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    images: BTreeMap<String, AssetState<Texture>>,
    sounds: BTreeMap<String, AssetState<SoundClip>>,
}

impl AssetStore {
    /// Every known key registered as `Pending`.
    pub fn new() -> Self {
        let mut store = Self::default();
        for key in IMAGE_KEYS {
            store.images.insert(key.to_owned(), AssetState::Pending);
        }
        for key in SOUND_KEYS {
            store.sounds.insert(key.to_owned(), AssetState::Pending);
        }
        store
    }

    /// Every key ready, with generated textures.
    pub fn procedural() -> Self {
        let mut store = Self::new();
        store.set_image("wallTexture", Texture::brick(64));
        store.set_image("monster1", Texture::disc(64, Color(0xFFFF0000)));
        store.set_image("monster2", Texture::disc(64, Color(0xFF8B4513)));
        store.set_image("monster3", Texture::disc(64, Color(0xFFFFD700)));
        store.set_image("pistol", Texture::weapon(64, Color(0xFF00FF00)));
        store.set_image("machinegun", Texture::weapon(64, Color(0xFFFFFF00)));
        store.set_image("plasma", Texture::weapon(64, Color(0xFF00FFFF)));
        store.set_image("player_client", Texture::disc(64, Color::ORANGE));
        store.set_image("powerup", Texture::disc(32, Color::WHITE));
        for key in SOUND_KEYS {
            store.set_sound(key);
        }
        store
    }

    /// Mark an image ready.
    pub fn set_image(&mut self, name: &str, texture: Texture) {
        self.images.insert(name.to_owned(), AssetState::Ready(texture));
    }

    /// Mark a sound ready.
    pub fn set_sound(&mut self, name: &str) {
        self.sounds.insert(
            name.to_owned(),
            AssetState::Ready(SoundClip { name: name.to_owned() }),
        );
    }

    /// Record a failed load. The asset keeps degrading to its fallback.
    pub fn mark_failed(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(asset = name, %reason, "asset failed to load");
        if self.sounds.contains_key(name) {
            self.sounds.insert(name.to_owned(), AssetState::Failed(reason));
        } else {
            self.images.insert(name.to_owned(), AssetState::Failed(reason));
        }
    }

    /// Image if ready.
    pub fn image(&self, name: &str) -> Option<&Texture> {
        self.images.get(name).and_then(AssetState::ready)
    }

    /// Readiness of an image.
    pub fn image_state(&self, name: &str) -> Option<&AssetState<Texture>> {
        self.images.get(name)
    }

    /// Play a sound if ready. Returns whether anything was played.
    pub fn play(&self, name: &str, sink: &mut dyn AudioSink) -> bool {
        match self.sounds.get(name).and_then(AssetState::ready) {
            Some(clip) => {
                sink.play(clip);
                true
            }
            None => {
                tracing::debug!(sound = name, "sound not ready, skipped");
                false
            }
        }
    }

    /// True when every registered asset is ready.
    pub fn all_ready(&self) -> bool {
        self.images.values().all(|s| s.ready().is_some())
            && self.sounds.values().all(|s| s.ready().is_some())
    }
}
