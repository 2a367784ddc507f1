//! Layout solver.
//!
//! Invoked only when dirty detection says the tree changed. Two steps over
//! the whole tree:
//!
//! 1. **Measure** (top-down with bottom-up fit-content resolution):
//!    fixed/percent sizes resolve against the parent's content extent;
//!    fit-content axes take the packed extent of their children.
//! 2. **Arrange** (top-down): children receive absolute rects per the
//!    parent's layout kind, with optional flex-style redistribution of
//!    leftover main-axis space in rows/columns.
//!
//! There is no partial relayout: a dirty tree is solved in full.

mod length;
mod solver;

pub use length::{Offset, SizeSpec, Spacing};
pub(crate) use solver::solve;
