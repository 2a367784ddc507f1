//! Per-frame instrumentation.
//!
//! [`FrameReport`] is returned from every `Gui::frame` call so hosts (and
//! tests) can observe what the frame actually did: whether the tree was
//! dirty, how many layout solves ran, and how much output was produced.

use crate::error::GuiError;

/// Summary of one completed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Monotonic frame index, starting at 1.
    pub frame: u64,
    /// Whether the structure pass left the tree dirty.
    pub dirty: bool,
    /// Number of layout solves this frame (0 when dirty detection
    /// suppressed relayout, 1 otherwise).
    pub layout_runs: u32,
    /// Live nodes in the table after pruning.
    pub live_nodes: usize,
    /// Total draw commands across all z-layers.
    pub commands: usize,
    /// Error absorbed during this frame, if any. Never propagates.
    pub error: Option<GuiError>,
}
