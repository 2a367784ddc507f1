//! Engine error types.
//!
//! Frame failures are absorbed at the pass boundary and never propagate to
//! the host loop; the first absorbed error of a frame is reported through
//! [`FrameReport`](crate::stats::FrameReport).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuiError {
    /// A push onto the clip/scope stack was not matched by a pop (or vice
    /// versa) before the pass ended. The offending pass's draw output is
    /// discarded and the next frame starts clean and forced dirty.
    #[error("clip/scope stack imbalance: {pushes} pushes vs {pops} pops")]
    StackImbalance { pushes: u32, pops: u32 },

    /// The caller-supplied description code panicked mid-pass. The pass is
    /// abandoned; already-materialized nodes stay in the table and the next
    /// frame relayouts unconditionally.
    #[error("ui description failed: {0}")]
    DescriptionFailure(String),
}
