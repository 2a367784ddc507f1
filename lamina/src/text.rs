//! Text sizing collaborator.
//!
//! The engine never shapes text itself; it asks a [`FontAtlas`] for metrics
//! when emitting text draw commands and for the atlas texture that seeds
//! every draw list. Hosts plug in their real shaping/atlas service;
//! [`MonoFontAtlas`] is a metrics-only default good enough for tests and
//! headless use.

use unicode_width::UnicodeWidthStr;

use crate::draw::TextureId;
use crate::primitives::Size;

/// External font/atlas service.
pub trait FontAtlas {
    /// Texture handle of the glyph atlas. Bound at the start of every
    /// z-layer buffer so each buffer is self-contained.
    fn texture(&self) -> TextureId;

    /// Measure a single line of text at the given pixel size.
    fn measure(&self, text: &str, px: f32) -> Size;
}

/// Fixed-advance metrics, no shaping. Advance and line height are expressed
/// as fractions of the pixel size.
#[derive(Debug, Clone, Copy)]
pub struct MonoFontAtlas {
    texture: TextureId,
    /// Horizontal advance per display column, in ems.
    pub char_advance: f32,
    /// Line height, in ems.
    pub line_height: f32,
}

impl MonoFontAtlas {
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            char_advance: 0.6,
            line_height: 1.3,
        }
    }
}

impl Default for MonoFontAtlas {
    fn default() -> Self {
        Self::new(TextureId(1))
    }
}

impl FontAtlas for MonoFontAtlas {
    fn texture(&self) -> TextureId {
        self.texture
    }

    fn measure(&self, text: &str, px: f32) -> Size {
        let columns = text.width() as f32;
        Size::new(columns * self.char_advance * px, self.line_height * px)
    }
}
