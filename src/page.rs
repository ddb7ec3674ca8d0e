//! Per-page input handed over by the interpreter adapter.
//!
//! [`PageInput`] is the boundary between the external PDF library and this
//! crate: one fully resolved operator stream plus the resource tables the
//! scene builder consults while dispatching it. Coordinates inside the
//! operator stream are PDF user space (y up); [`PageInput::page_matrix`]
//! produces the transform into display space (y down, origin at the top-left
//! of the crop box, page rotation applied).

use std::collections::HashMap;

use crate::content::{Matrix, Operator};
use crate::geometry::Rect;

/// Font facts the scene builder needs per text run.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// Font name as recorded in the resource dictionary
    pub name: String,
    /// Whether a font program is embedded in the document
    pub embedded: bool,
    /// Width of the space glyph in thousandths of text space; 0 when the
    /// font has no space glyph
    pub space_width: f32,
    /// Whether the font predominantly maps CJK ideographs
    pub cjk: bool,
}

impl FontInfo {
    /// Create a font record.
    pub fn new(name: impl Into<String>, embedded: bool, space_width: f32) -> Self {
        Self {
            name: name.into(),
            embedded,
            space_width,
            cjk: false,
        }
    }
}

/// Counts of resource-dictionary entries relevant to painting detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSummary {
    /// XObjects that are not images (forms, transparency groups)
    pub non_image_xobjects: usize,
    /// Shading dictionary entries
    pub shadings: usize,
}

/// A form XObject's stream, pre-resolved like the page's own.
#[derive(Debug, Clone)]
pub struct FormInput {
    /// Operators of the form's content stream
    pub operators: Vec<Operator>,
    /// Resource counts of the form's own dictionary
    pub resources: ResourceSummary,
    /// Form bounding box in form space
    pub bbox: Option<Rect>,
    /// Form matrix (form space to user space)
    pub matrix: Matrix,
    /// Whether this stream is a tiling pattern cell rather than a form
    pub tiling_pattern: bool,
}

impl FormInput {
    /// Create a form with an identity matrix and empty resources.
    pub fn new(operators: Vec<Operator>) -> Self {
        Self {
            operators,
            resources: ResourceSummary::default(),
            bbox: None,
            matrix: Matrix::identity(),
            tiling_pattern: false,
        }
    }
}

/// An image XObject's facts relevant to layout.
#[derive(Debug, Clone, Default)]
pub struct ImageInfo {
    /// Replacement text attached to the image's structure element, if any
    pub actual_text: Option<String>,
}

/// One page of resolved input.
#[derive(Debug, Clone)]
pub struct PageInput {
    /// One-based page number
    pub page_number: u32,
    /// Crop box origin in user space
    pub crop_origin: (f32, f32),
    /// Crop box width in user space
    pub crop_width: f32,
    /// Crop box height in user space
    pub crop_height: f32,
    /// Page rotation in degrees (multiple of 90)
    pub rotation: i32,
    /// The page content stream, resolved
    pub operators: Vec<Operator>,
    /// Font table keyed by resource name
    pub fonts: HashMap<String, FontInfo>,
    /// Form XObject table keyed by resource name
    pub forms: HashMap<String, FormInput>,
    /// Image XObject table keyed by resource name
    pub images: HashMap<String, ImageInfo>,
    /// Resource counts of the page dictionary
    pub resources: ResourceSummary,
    /// Count of ActualText spans on the page; loosens the painting threshold
    pub actual_text_count: usize,
    /// The page's struct-parents index into the document number tree
    pub struct_parents: Option<i32>,
}

impl PageInput {
    /// Create an empty page of the given display size.
    pub fn new(page_number: u32, width: f32, height: f32) -> Self {
        Self {
            page_number,
            crop_origin: (0.0, 0.0),
            crop_width: width,
            crop_height: height,
            rotation: 0,
            operators: Vec::new(),
            fonts: HashMap::new(),
            forms: HashMap::new(),
            images: HashMap::new(),
            resources: ResourceSummary::default(),
            actual_text_count: 0,
            struct_parents: None,
        }
    }

    /// Display width after rotation is applied.
    pub fn width(&self) -> f32 {
        match self.rotation.rem_euclid(360) {
            90 | 270 => self.crop_height,
            _ => self.crop_width,
        }
    }

    /// Display height after rotation is applied.
    pub fn height(&self) -> f32 {
        match self.rotation.rem_euclid(360) {
            90 | 270 => self.crop_width,
            _ => self.crop_height,
        }
    }

    /// Display-space bounds of the whole page.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }

    /// The transform from user space to display space.
    ///
    /// Flips the y axis, shifts the crop box origin to (0, 0), and applies
    /// page rotation. Seeded as the initial CTM before dispatching operators.
    pub fn page_matrix(&self) -> Matrix {
        let (cx, cy) = self.crop_origin;
        let (cw, ch) = (self.crop_width, self.crop_height);
        match self.rotation.rem_euclid(360) {
            90 => Matrix {
                a: 0.0,
                b: 1.0,
                c: 1.0,
                d: 0.0,
                e: -cy,
                f: -cx,
            },
            180 => Matrix {
                a: -1.0,
                b: 0.0,
                c: 0.0,
                d: 1.0,
                e: cw + cx,
                f: -cy,
            },
            270 => Matrix {
                a: 0.0,
                b: -1.0,
                c: -1.0,
                d: 0.0,
                e: ch + cy,
                f: cw + cx,
            },
            _ => Matrix {
                a: 1.0,
                b: 0.0,
                c: 0.0,
                d: -1.0,
                e: -cx,
                f: ch + cy,
            },
        }
    }
}
