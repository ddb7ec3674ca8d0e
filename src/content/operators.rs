//! Drawing operators with resolved operands.
//!
//! The interpreter adapter (an external PDF library) parses content streams
//! and hands this crate a sequence of [`Operator`] values whose operands are
//! already resolved: numbers are decoded, strings are mapped to Unicode, and
//! resource names are looked up against [`crate::page::PageInput`] tables.

use super::graphics_state::Matrix;
use crate::geometry::Rect;

/// One glyph of a text-showing operator, with metrics resolved by the
/// interpreter adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Unicode text for this glyph (may be multiple chars for ligatures)
    pub text: String,
    /// Horizontal displacement in glyph space (thousandths of text space)
    pub displacement: f32,
    /// Advance width from the font's own metric table, same units
    pub font_width: f32,
    /// Glyph bounding-box height in glyph space; 0 for fonts without one
    pub bbox_height: f32,
}

impl Glyph {
    /// Create a glyph whose font metric agrees with its displacement.
    pub fn new(text: impl Into<String>, displacement: f32, bbox_height: f32) -> Self {
        Self {
            text: text.into(),
            displacement,
            font_width: displacement,
            bbox_height,
        }
    }
}

/// A marked-content sequence opening, with the properties layout cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkedContentProps {
    /// Structural tag (P, Span, Figure, Artifact, ...)
    pub tag: String,
    /// Marked-content identifier binding this span to the structure tree
    pub mcid: Option<i32>,
    /// Replacement text carried on the properties dictionary
    pub actual_text: Option<String>,
}

/// A drawing operator with resolved operands.
///
/// Only the operators the scene builder reacts to are modeled; state
/// operators it ignores (rendering intent, flatness, ...) are dropped by the
/// adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    // Graphics state
    /// q - Save graphics state
    SaveState,
    /// Q - Restore graphics state
    RestoreState,
    /// cm - Concatenate matrix to current transformation matrix
    Concat {
        /// Matrix to concatenate
        matrix: Matrix,
    },
    /// w - Set line width
    SetLineWidth {
        /// Width in user-space units
        width: f32,
    },
    /// rg/g/k and friends, reduced to RGB - set fill color
    SetFillColor {
        /// RGB components in [0, 1]
        color: (f32, f32, f32),
    },
    /// RG/G/K and friends, reduced to RGB - set stroke color
    SetStrokeColor {
        /// RGB components in [0, 1]
        color: (f32, f32, f32),
    },

    // Path construction
    /// m - Begin new subpath
    MoveTo {
        /// Target x
        x: f32,
        /// Target y
        y: f32,
    },
    /// l - Append straight line segment
    LineTo {
        /// Target x
        x: f32,
        /// Target y
        y: f32,
    },
    /// c - Append cubic Bezier curve
    CurveTo {
        /// First control point x
        x1: f32,
        /// First control point y
        y1: f32,
        /// Second control point x
        x2: f32,
        /// Second control point y
        y2: f32,
        /// End point x
        x3: f32,
        /// End point y
        y3: f32,
    },
    /// re - Append rectangle
    Rectangle {
        /// Lower-left x in user space
        x: f32,
        /// Lower-left y in user space
        y: f32,
        /// Width
        width: f32,
        /// Height
        height: f32,
    },
    /// h - Close subpath
    ClosePath,

    // Path painting
    /// f/f* - Fill the pending path
    Fill,
    /// S/s - Stroke the pending path
    Stroke,
    /// B/B*/b/b* - Fill and stroke the pending path
    FillStroke,
    /// n - End the pending path without painting (used with W)
    EndPath,
    /// W/W* - Intersect clip with the pending path
    Clip,
    /// sh - Fill the clip region with a shading
    ShadingFill {
        /// Shading resource name
        name: String,
        /// Shading bounding box in user space, when the shading declares one
        bbox: Option<Rect>,
        /// Representative color, when resolvable
        color: Option<(f32, f32, f32)>,
    },

    // Text
    /// BT - Begin text object
    BeginText,
    /// ET - End text object
    EndText,
    /// Tf - Set font and size
    SetFont {
        /// Font resource name
        name: String,
        /// Size in text-space units
        size: f32,
    },
    /// Tc - Set character spacing
    SetCharSpace {
        /// Spacing in unscaled text-space units
        spacing: f32,
    },
    /// Tw - Set word spacing
    SetWordSpace {
        /// Spacing in unscaled text-space units
        spacing: f32,
    },
    /// Tz - Set horizontal scaling
    SetHorizontalScaling {
        /// Scale as a percentage (100 = no scaling)
        scale: f32,
    },
    /// TL - Set text leading
    SetLeading {
        /// Leading in unscaled text-space units
        leading: f32,
    },
    /// Ts - Set text rise
    SetTextRise {
        /// Rise in unscaled text-space units
        rise: f32,
    },
    /// Tr - Set text rendering mode
    SetRenderMode {
        /// Mode 0-7
        mode: u8,
    },
    /// Td - Move text position
    MoveText {
        /// X offset from start of current line
        tx: f32,
        /// Y offset from start of current line
        ty: f32,
    },
    /// TD - Move text position and set leading
    MoveTextSetLeading {
        /// X offset from start of current line
        tx: f32,
        /// Y offset from start of current line
        ty: f32,
    },
    /// Tm - Set text matrix
    SetTextMatrix {
        /// New text matrix (replaces, does not concatenate)
        matrix: Matrix,
    },
    /// T* - Move to start of next line
    NextLine,
    /// Tj/TJ/'/" - Show text, decoded into per-glyph records
    ShowText {
        /// Glyphs in display order
        glyphs: Vec<Glyph>,
    },

    // XObjects
    /// Do referencing an image XObject
    DrawImage {
        /// Image resource name
        name: String,
    },
    /// Do referencing a form XObject
    DrawForm {
        /// Form resource name
        name: String,
    },

    // Marked content
    /// BMC/BDC - Begin marked-content sequence
    BeginMarkedContent {
        /// Tag and resolved properties
        props: MarkedContentProps,
    },
    /// EMC - End marked-content sequence
    EndMarkedContent,
}

impl Operator {
    /// Whether this operator paints the pending path.
    pub fn is_path_paint(&self) -> bool {
        matches!(
            self,
            Operator::Fill | Operator::Stroke | Operator::FillStroke | Operator::EndPath
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_new() {
        let g = Glyph::new("A", 722.0, 716.0);
        assert_eq!(g.font_width, 722.0);
        assert_eq!(g.text, "A");
    }

    #[test]
    fn test_is_path_paint() {
        assert!(Operator::Fill.is_path_paint());
        assert!(Operator::EndPath.is_path_paint());
        assert!(!Operator::ClosePath.is_path_paint());
        assert!(!Operator::Clip.is_path_paint());
    }
}
