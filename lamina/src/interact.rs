//! Interaction state and the per-frame input collaborator.
//!
//! The engine never polls devices. The host samples its input source once
//! per frame and hands the result in as an [`InputState`]; nodes then ask
//! "am I hovered / pressed / focused" during either pass. Answers are
//! persisted on the node so they survive the per-frame tree rebuild.

use crate::primitives::Point;

/// Pointer button state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    /// Primary button is currently held.
    pub primary_down: bool,
    /// Primary button was released this frame (click edge).
    pub primary_clicked: bool,
    pub secondary_down: bool,
    pub middle_down: bool,
}

/// Snapshot of the external input source, supplied once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Pointer position in the same logical units as the screen rect.
    pub pointer: Point,
    pub buttons: MouseButtons,
    /// Host-driven request to drop keyboard focus (e.g. Escape).
    pub clear_focus: bool,
}

/// Per-node interaction flags, persisted across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub hovered: bool,
    pub pressed: bool,
    pub focused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_state_defaults_are_inert() {
        let input = InputState::default();
        assert!(!input.buttons.primary_down);
        assert!(!input.buttons.primary_clicked);
        assert!(!input.clear_focus);
        assert_eq!(input.pointer, Point::ORIGIN);
    }
}
