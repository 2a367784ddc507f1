//! Sizing and spacing types for node styles.

/// Sizing mode for one node axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizeSpec {
    /// Size to the extent of the children (and participate in flex
    /// redistribution when the parent has `scale_children` set).
    #[default]
    FitContent,
    /// Fixed size in logical units.
    Pixels(f32),
    /// Fraction of the parent's content size, 0.0..=1.0.
    Percent(f32),
}

impl SizeSpec {
    /// Resolve against the parent's content extent on this axis.
    /// `FitContent` resolves to the fallback (usually a measured extent);
    /// negative results clamp to zero.
    pub fn resolve(self, parent: f32, fit_fallback: f32) -> f32 {
        let value = match self {
            SizeSpec::FitContent => fit_fallback,
            SizeSpec::Pixels(v) => v,
            SizeSpec::Percent(p) => p * parent,
        };
        value.max(0.0)
    }

    /// Whether this axis stretches during flex redistribution.
    #[inline]
    pub fn is_flexible(self) -> bool {
        matches!(self, SizeSpec::FitContent)
    }
}

/// Position offset for one node axis, relative to the parent's content
/// origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Offset {
    Pixels(f32),
    /// Fraction of the parent's content extent on this axis.
    Percent(f32),
}

impl Offset {
    pub const ZERO: Self = Offset::Pixels(0.0);

    pub fn resolve(self, parent: f32) -> f32 {
        match self {
            Offset::Pixels(v) => v,
            Offset::Percent(p) => p * parent,
        }
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f32> for Offset {
    fn from(v: f32) -> Self {
        Offset::Pixels(v)
    }
}

impl From<f32> for SizeSpec {
    fn from(v: f32) -> Self {
        SizeSpec::Pixels(v)
    }
}

/// Per-side spacing, used for both margin and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spacing {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Spacing {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    /// Uniform spacing on all sides.
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Total horizontal spacing.
    #[inline]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Total vertical spacing.
    #[inline]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl From<f32> for Spacing {
    fn from(v: f32) -> Self {
        Spacing::all(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_resolves_against_parent() {
        assert_eq!(SizeSpec::Percent(0.25).resolve(400.0, 0.0), 100.0);
    }

    #[test]
    fn negative_space_resolves_to_zero() {
        assert_eq!(SizeSpec::Percent(0.5).resolve(-100.0, 0.0), 0.0);
        assert_eq!(SizeSpec::Pixels(-3.0).resolve(100.0, 0.0), 0.0);
        assert_eq!(SizeSpec::FitContent.resolve(100.0, -1.0), 0.0);
    }

    #[test]
    fn fit_content_uses_fallback() {
        assert_eq!(SizeSpec::FitContent.resolve(500.0, 42.0), 42.0);
    }

    #[test]
    fn offset_percent() {
        assert_eq!(Offset::Percent(0.1).resolve(500.0), 50.0);
        assert_eq!(Offset::Pixels(12.0).resolve(500.0), 12.0);
    }
}
