//! Single glyph instances with resolved layout metrics.

use bitflags::bitflags;

use crate::geometry::Rect;

bitflags! {
    /// Visual style flags of a glyph run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextStyle: u8 {
        /// Bold weight, real or simulated
        const BOLD = 1;
        /// Italic slant, real or sheared
        const ITALIC = 2;
        /// Underline decoration
        const UNDERLINE = 4;
        /// Strike-through decoration
        const LINE_THROUGH = 8;
    }
}

/// One drawn glyph in display space.
///
/// `bounds` is the nominal box derived from font metrics and the text
/// rendering matrix; `visible_bounds` is that box clipped against the active
/// clip region and is what layout decisions use.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Nominal bounding box in display space
    pub bounds: Rect,
    /// Clip-adjusted bounding box; equals `bounds` when unclipped
    pub visible_bounds: Rect,
    /// Unicode text of the glyph
    pub text: String,
    /// Font resource name
    pub font_name: String,
    /// Declared font size in text space
    pub font_size: f32,
    /// Effective visual size; differs from `font_size` when glyphs are drawn
    /// with extreme matrices
    pub style_size: f32,
    /// Style flags
    pub style: TextStyle,
    /// Fill color
    pub color: (f32, f32, f32),
    /// Rotation of the baseline in degrees within (-180, 180]
    pub rotation: f32,
    /// Display-space width of a space in this font and size
    pub space_width: f32,
    /// Whether the glyph is invisible (clipped away, zero-size, or render
    /// mode 3)
    pub hidden: bool,
    /// Whether this element is a synthesized space, not drawn content
    pub mock: bool,
    /// Marked-content identifier active when the glyph was drawn
    pub mcid: Option<i32>,
    /// Set when a shadow duplicate was folded into another element
    pub deleted: bool,
}

impl TextElement {
    /// Create a visible element with identical nominal and visible bounds.
    pub fn new(bounds: Rect, text: impl Into<String>, font_name: impl Into<String>, font_size: f32) -> Self {
        Self {
            bounds,
            visible_bounds: bounds,
            text: text.into(),
            font_name: font_name.into(),
            font_size,
            style_size: font_size,
            style: TextStyle::empty(),
            color: (0.0, 0.0, 0.0),
            rotation: 0.0,
            space_width: font_size / 4.0,
            hidden: false,
            mock: false,
            mcid: None,
            deleted: false,
        }
    }

    /// Create a synthesized space covering the gap after `prev`.
    ///
    /// The element inherits the previous glyph's font and style so dominant
    /// metric computations are not skewed.
    pub fn mock_space(prev: &TextElement, gap_width: f32) -> Self {
        let bounds = Rect::new(
            prev.bounds.right(),
            prev.bounds.top(),
            gap_width,
            prev.bounds.height,
        );
        Self {
            bounds,
            visible_bounds: bounds,
            text: " ".to_string(),
            font_name: prev.font_name.clone(),
            font_size: prev.font_size,
            style_size: prev.style_size,
            style: prev.style,
            color: prev.color,
            rotation: prev.rotation,
            space_width: prev.space_width,
            hidden: prev.hidden,
            mock: true,
            mcid: prev.mcid,
            deleted: false,
        }
    }

    /// Whether this element draws only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Whether this element's text is a CJK ideograph.
    pub fn is_cjk(&self) -> bool {
        self.text.chars().next().map(super::patterns::is_cjk_char).unwrap_or(false)
    }

    /// Width along the reading direction, accounting for rotation.
    pub fn text_width(&self) -> f32 {
        if self.is_axis_rotated() {
            self.bounds.height
        } else {
            self.bounds.width
        }
    }

    /// Height across the reading direction, accounting for rotation.
    pub fn text_height(&self) -> f32 {
        if self.is_axis_rotated() {
            self.bounds.width
        } else {
            self.bounds.height
        }
    }

    /// Whether the baseline runs vertically (rotation near +-90 degrees).
    pub fn is_axis_rotated(&self) -> bool {
        let r = self.rotation.abs();
        (r - 90.0).abs() < 45.0
    }

    /// Whether the element is bold.
    pub fn is_bold(&self) -> bool {
        self.style.contains(TextStyle::BOLD)
    }

    /// Whether the element is italic.
    pub fn is_italic(&self) -> bool {
        self.style.contains(TextStyle::ITALIC)
    }

    /// Whether `other` draws the same text at (nearly) the same place.
    ///
    /// Fake-bold output draws each glyph twice with a sub-point offset.
    pub fn is_shadow_of(&self, other: &TextElement) -> bool {
        self.text == other.text
            && !self.is_blank()
            && self.bounds.self_overlap_ratio(&other.bounds) > 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(x: f32, w: f32) -> TextElement {
        TextElement::new(Rect::new(x, 100.0, w, 12.0), "A", "F1", 12.0)
    }

    #[test]
    fn test_mock_space_inherits_metrics() {
        let prev = element(10.0, 8.0);
        let space = TextElement::mock_space(&prev, 4.0);
        assert!(space.mock);
        assert!(space.is_blank());
        assert_eq!(space.bounds.left(), 18.0);
        assert_eq!(space.bounds.width, 4.0);
        assert_eq!(space.font_size, prev.font_size);
    }

    #[test]
    fn test_rotation_swaps_extents() {
        let mut el = element(0.0, 8.0);
        assert_eq!(el.text_width(), 8.0);
        assert_eq!(el.text_height(), 12.0);
        el.rotation = 90.0;
        assert_eq!(el.text_width(), 12.0);
        assert_eq!(el.text_height(), 8.0);
    }

    #[test]
    fn test_shadow_detection() {
        let a = element(10.0, 8.0);
        let mut b = element(10.2, 8.0);
        assert!(a.is_shadow_of(&b));
        b.bounds.x = 30.0;
        assert!(!a.is_shadow_of(&b));
    }
}
