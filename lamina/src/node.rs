//! Node identity and per-node data.
//!
//! A node's identity is derived from (parent id, call-site token,
//! sibling-occurrence index) with splitmix64-style mixing, so the same
//! logical element resolves to the same 64-bit id on every frame even though
//! the tree is rebuilt from scratch. The call-site token comes from
//! `std::panic::Location`, captured with `#[track_caller]` at the
//! description API boundary.

use std::hash::{Hash, Hasher};
use std::panic::Location;

use rustc_hash::FxHasher;

use crate::interact::InteractionState;
use crate::layout::{Offset, SizeSpec, Spacing};
use crate::primitives::{Rect, Size};

/// Stable 64-bit node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Derive a child id from its parent, call site, and occurrence index.
    ///
    /// Deterministic: identical tuples yield identical ids across frames.
    pub(crate) const fn derive(parent: NodeId, call_site: u64, occurrence: u32) -> NodeId {
        NodeId(mix(mix(parent.0, call_site), occurrence as u64))
    }

    /// Raw numeric value, for hosts that key external state by node.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Splitmix64-style finalizer: mix two u64s into a well-distributed result.
/// Branchless and avoids the structured collision risk of bare XOR.
pub(crate) const fn mix(a: u64, b: u64) -> u64 {
    let mut z = a.wrapping_add(b.wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Hash a call site into a token. Identical source locations always produce
/// the same token within a build.
pub(crate) fn call_site_token(location: &'static Location<'static>) -> u64 {
    let mut hasher = FxHasher::default();
    location.file().hash(&mut hasher);
    location.line().hash(&mut hasher);
    location.column().hash(&mut hasher);
    hasher.finish()
}

/// How a node arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutKind {
    /// Children keep their explicit offsets.
    #[default]
    None,
    /// Children placed sequentially along the horizontal axis.
    Row,
    /// Children placed sequentially along the vertical axis.
    Column,
    /// Children placed into a row-major cell matrix; overflow wraps to new
    /// rows.
    Grid,
    /// Children packed along the horizontal axis, wrapping to a new line
    /// when they exceed the available width.
    Wrap,
}

/// Clipping applied to a node's children at scope enter/exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipKind {
    #[default]
    None,
    /// Clip to the node's padded interior.
    Inner,
    /// Clip to the node's full bounds.
    Outer,
}

/// Layout specification for one node. Every field participates in the
/// structural hash except `clip`, which affects drawing but never geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeStyle {
    pub left: Offset,
    pub top: Offset,
    pub width: SizeSpec,
    pub height: SizeSpec,
    pub min_width: Option<SizeSpec>,
    pub min_height: Option<SizeSpec>,
    pub max_width: Option<SizeSpec>,
    pub max_height: Option<SizeSpec>,
    pub margin: Spacing,
    pub padding: Spacing,
    pub layout: LayoutKind,
    /// Redistribute leftover main-axis space among flexible children
    /// (row/column only).
    pub scale_children: bool,
    /// Excluded from the parent's flow; positioned by own offsets.
    pub ignore_layout: bool,
    /// Requested grid cell size; derived from the largest child when unset.
    pub grid_cell: Option<Size>,
    pub clip: ClipKind,
}

impl NodeStyle {
    /// Hash the layout-relevant fields. Children are mixed in separately by
    /// the tree so the combined hash stays order-sensitive.
    pub(crate) fn layout_hash(&self) -> u64 {
        let mut h = FxHasher::default();
        hash_offset(&mut h, self.left);
        hash_offset(&mut h, self.top);
        hash_size_spec(&mut h, self.width);
        hash_size_spec(&mut h, self.height);
        for clamp in [
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
        ] {
            match clamp {
                Some(spec) => {
                    h.write_u8(1);
                    hash_size_spec(&mut h, spec);
                }
                None => h.write_u8(0),
            }
        }
        hash_spacing(&mut h, self.margin);
        hash_spacing(&mut h, self.padding);
        h.write_u8(self.layout as u8);
        h.write_u8(self.scale_children as u8);
        h.write_u8(self.ignore_layout as u8);
        match self.grid_cell {
            Some(cell) => {
                h.write_u8(1);
                h.write_u32(cell.width.to_bits());
                h.write_u32(cell.height.to_bits());
            }
            None => h.write_u8(0),
        }
        h.finish()
    }
}

fn hash_offset(h: &mut FxHasher, offset: Offset) {
    match offset {
        Offset::Pixels(v) => {
            h.write_u8(0);
            h.write_u32(v.to_bits());
        }
        Offset::Percent(p) => {
            h.write_u8(1);
            h.write_u32(p.to_bits());
        }
    }
}

fn hash_size_spec(h: &mut FxHasher, spec: SizeSpec) {
    match spec {
        SizeSpec::FitContent => h.write_u8(0),
        SizeSpec::Pixels(v) => {
            h.write_u8(1);
            h.write_u32(v.to_bits());
        }
        SizeSpec::Percent(p) => {
            h.write_u8(2);
            h.write_u32(p.to_bits());
        }
    }
}

fn hash_spacing(h: &mut FxHasher, spacing: Spacing) {
    h.write_u32(spacing.top.to_bits());
    h.write_u32(spacing.right.to_bits());
    h.write_u32(spacing.bottom.to_bits());
    h.write_u32(spacing.left.to_bits());
}

/// Resolved geometry, valid only after a layout pass has run.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutData {
    /// Absolute bounds.
    pub rect: Rect,
    /// Bounds inset by padding.
    pub inner_rect: Rect,
    /// Resolved size from the most recent measure step (solver scratch,
    /// becomes `rect.size()` after arrange).
    pub(crate) size: Size,
}

/// One entry in the flat node table.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Back-references in tree order; rebuilt every structure pass.
    pub children: Vec<NodeId>,
    pub style: NodeStyle,
    pub layout: LayoutData,
    pub interaction: InteractionState,
    /// Committed structural hash from the most recent diff-and-commit.
    pub(crate) structural_hash: u64,
    /// Frame generation this id was last resolved; drives pruning.
    pub(crate) last_seen: u64,
}

impl Node {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, frame: u64) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            style: NodeStyle::default(),
            layout: LayoutData::default(),
            interaction: InteractionState::default(),
            structural_hash: 0,
            last_seen: frame,
        }
    }
}
