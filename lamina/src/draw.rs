//! Draw-list / z-layer compositor.
//!
//! Every integer z-index owns an ordered command buffer. Buffers are cleared
//! at the start of each draw pass and seeded with a font-atlas texture bind
//! so each buffer is self-contained. At flush, layers are handed to the
//! renderer in ascending z order regardless of the order draw calls touched
//! them during the pass.

use std::collections::BTreeMap;

use crate::primitives::{Color, Point, Rect, Size};

/// Opaque handle to a texture owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// One drawing instruction. Commands within a buffer execute in order;
/// clip push/pop pairs scope the commands between them.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Switch the active texture for subsequent textured draws.
    BindTexture(TextureId),
    /// Begin clipping to `rect` (already intersected with the enclosing
    /// region by the emitter).
    PushClip(Rect),
    /// Restore the previous clip region.
    PopClip,
    /// Stroked rectangle outline.
    Rect {
        rect: Rect,
        color: Color,
        thickness: f32,
        rounding: f32,
    },
    /// Filled (optionally rounded) rectangle.
    RectFilled {
        rect: Rect,
        color: Color,
        rounding: f32,
    },
    /// A single line of text. `bounds` carries the metrics the engine
    /// obtained from the font collaborator at emit time.
    Text {
        pos: Point,
        text: String,
        px: f32,
        color: Color,
        bounds: Size,
    },
    /// Textured quad with explicit UVs.
    Image {
        rect: Rect,
        texture: TextureId,
        uv_min: Point,
        uv_max: Point,
        tint: Color,
    },
}

/// Ordered command buffer for one z-layer.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Append a command.
    #[inline]
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// All commands in emission order.
    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn reset(&mut self, font_texture: TextureId) {
        self.commands.clear();
        self.commands.push(DrawCommand::BindTexture(font_texture));
    }

    fn reset_if_empty(&mut self, font_texture: TextureId) {
        if self.commands.is_empty() {
            self.reset(font_texture);
        }
    }
}

/// All z-layer buffers for the engine. Layers persist across frames (their
/// allocations are reused); contents are rebuilt every draw pass.
#[derive(Debug, Default)]
pub struct DrawLists {
    layers: BTreeMap<i32, DrawList>,
}

impl DrawLists {
    /// Clear every existing layer and seed it with the font-atlas bind.
    /// Called once at the start of each draw pass.
    pub fn begin_pass(&mut self, font_texture: TextureId) {
        for list in self.layers.values_mut() {
            list.reset(font_texture);
        }
        // The root layer always exists so flush output is never empty.
        self.layers
            .entry(0)
            .or_insert_with(DrawList::default)
            .reset_if_empty(font_texture);
    }

    /// Buffer for the given z-index, created and seeded on first touch.
    pub fn layer_mut(&mut self, z: i32, font_texture: TextureId) -> &mut DrawList {
        self.layers.entry(z).or_insert_with(|| {
            let mut list = DrawList::default();
            list.reset(font_texture);
            list
        })
    }

    /// Discard all commands (used when a pass failed and its output must
    /// not reach the renderer).
    pub fn discard(&mut self) {
        for list in self.layers.values_mut() {
            list.commands.clear();
        }
    }

    /// Layers in ascending z order.
    pub fn layers(&self) -> impl Iterator<Item = (i32, &DrawList)> {
        self.layers.iter().map(|(z, list)| (*z, list))
    }

    /// Total command count across all layers.
    pub fn command_count(&self) -> usize {
        self.layers.values().map(|l| l.len()).sum()
    }
}

/// External renderer that turns flushed layers into GPU work.
///
/// Layers arrive in ascending z order, exactly once per frame.
pub trait Renderer {
    fn render(&mut self, screen: Rect, layers: &[(i32, &[DrawCommand])]);
}
