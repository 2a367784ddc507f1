//! lamina — a call-site-keyed immediate-mode UI engine.
//!
//! The UI is a plain function over application state: every frame the host
//! calls [`Gui::frame`] with a closure that describes the interface from
//! scratch, and the engine gives nodes stable identity across those rebuilds
//! by hashing *where in the code* each node was declared (parent id +
//! call site + sibling occurrence) instead of asking the caller to manage
//! keys or retained handles.
//!
//! # Architecture
//!
//! ```text
//!  host input ──► Gui::frame(describe)
//!                   │
//!                   ├─ structure pass   describe() resolves/creates nodes,
//!                   │                   records styles; draws discarded
//!                   ├─ diff-and-commit  structural hashes vs last frame
//!                   ├─ layout solve     only if something changed
//!                   ├─ draw pass        describe() again; same ids, draw
//!                   │                   calls fill per-z command buffers
//!                   └─ FrameReport
//!                   ▼
//!                 Gui::present(renderer)   layers in ascending z order
//! ```
//!
//! Rendering and text shaping stay outside the crate: draws are buffered as
//! [`DrawCommand`] values handed to a host [`Renderer`], and text metrics
//! come from a host [`FontAtlas`]. Failures inside the description closure
//! (panics, unbalanced clip stacks) are absorbed at the pass boundary,
//! logged, and reported via [`FrameReport`]; a broken frame never takes the
//! host loop down with it.
//!
//! # Example
//!
//! ```
//! use lamina::{Color, Gui, InputState, LayoutKind, Rect, SizeSpec};
//!
//! let mut gui = Gui::default();
//! let screen = Rect::new(0.0, 0.0, 640.0, 480.0);
//!
//! gui.frame(screen, 0.016, InputState::default(), |gui| {
//!     gui.node()
//!         .width(SizeSpec::Percent(1.0))
//!         .height(SizeSpec::Percent(1.0))
//!         .layout(LayoutKind::Column)
//!         .padding(8.0)
//!         .scope(|gui| {
//!             let bar = gui.node().height(32.0).width(SizeSpec::Percent(1.0)).id();
//!             gui.draw_rect_filled(gui.rect_of(bar), Color::rgb8(40, 40, 48), 4.0);
//!         });
//! });
//! ```

mod draw;
mod error;
mod gui;
mod interact;
mod layout;
mod node;
mod primitives;
mod stats;
mod text;
mod tree;

pub use draw::{DrawCommand, DrawList, Renderer, TextureId};
pub use error::GuiError;
pub use gui::{Gui, NodeRef};
pub use interact::{InputState, InteractionState, MouseButtons};
pub use layout::{Offset, SizeSpec, Spacing};
pub use node::{ClipKind, LayoutKind, Node, NodeId, NodeStyle};
pub use primitives::{Color, Point, Rect, Size};
pub use stats::FrameReport;
pub use text::{FontAtlas, MonoFontAtlas};
pub use tree::Tree;
