//! Graphics state management for operator stream execution.
//!
//! This module provides the graphics state machine that tracks transformations,
//! text positioning, colors, and the active clip region as drawing operators
//! are dispatched.

use crate::geometry::{Point, Rect};

/// A 2D transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Where (a,b,c,d) define scaling/rotation/skewing and (e,f) define translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_layout::content::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a rotation matrix for an angle in degrees, counter-clockwise.
    pub fn rotation(degrees: f32) -> Self {
        let r = degrees.to_radians();
        Self {
            a: r.cos(),
            b: r.sin(),
            c: -r.sin(),
            d: r.cos(),
            e: 0.0,
            f: 0.0,
        }
    }

    /// Multiply this matrix with another matrix.
    ///
    /// Matrix multiplication is not commutative. The result represents first
    /// applying `self`, then applying `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_layout::content::Matrix;
    ///
    /// let m = Matrix::scaling(2.0, 2.0).multiply(&Matrix::translation(10.0, 0.0));
    /// let p = m.transform_point(1.0, 0.0);
    /// assert_eq!(p.x, 12.0);
    /// ```
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Transform an axis-aligned rectangle, returning the bounding box of its
    /// four transformed corners.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let p0 = self.transform_point(rect.left(), rect.top());
        let p1 = self.transform_point(rect.right(), rect.top());
        let p2 = self.transform_point(rect.left(), rect.bottom());
        let p3 = self.transform_point(rect.right(), rect.bottom());
        let x0 = p0.x.min(p1.x).min(p2.x).min(p3.x);
        let y0 = p0.y.min(p1.y).min(p2.y).min(p3.y);
        let x1 = p0.x.max(p1.x).max(p2.x).max(p3.x);
        let y1 = p0.y.max(p1.y).max(p2.y).max(p3.y);
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Check if this matrix is invertible.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() > f32::EPSILON
    }

    /// Rotation angle of the x-axis under this matrix, in degrees within
    /// `(-180, 180]`.
    pub fn rotation_degrees(&self) -> f32 {
        self.b.atan2(self.a).to_degrees()
    }

    /// Horizontal scale magnitude.
    pub fn scale_x(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Vertical scale magnitude.
    pub fn scale_y(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Shear factor of the y-axis relative to the x-axis.
    ///
    /// Used to detect synthetic italics applied through the text matrix.
    pub fn shear(&self) -> f32 {
        let sx = self.scale_x();
        if sx <= f32::EPSILON {
            return 0.0;
        }
        (self.a * self.c + self.b * self.d) / (sx * sx)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// Graphics state parameters.
///
/// Tracks the parameters that affect where and how content lands on the page:
/// transformations, text state, colors, stroke parameters, and the active
/// clip rectangle.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (maps user space to device space)
    pub ctm: Matrix,
    /// Text matrix (maps text space to user space)
    pub text_matrix: Matrix,
    /// Text line matrix (saved position at start of line)
    pub text_line_matrix: Matrix,

    // Text state parameters
    /// Character spacing (Tc)
    pub char_space: f32,
    /// Word spacing (Tw)
    pub word_space: f32,
    /// Horizontal scaling percentage (Tz)
    pub horizontal_scaling: f32,
    /// Text leading (TL)
    pub leading: f32,
    /// Current font name
    pub font_name: Option<String>,
    /// Current font size (Tf)
    pub font_size: f32,
    /// Text rise (Ts)
    pub text_rise: f32,
    /// Text rendering mode (Tr)
    pub render_mode: u8,

    // Color parameters
    /// Fill color (RGB)
    pub fill_color: (f32, f32, f32),
    /// Stroke color (RGB)
    pub stroke_color: (f32, f32, f32),

    // Stroke parameters
    /// Line width
    pub line_width: f32,

    /// Active clip rectangle in device space. `None` means unclipped.
    pub clip: Option<Rect>,
}

/// Text rendering mode values relevant to style inference.
pub mod render_mode {
    /// Fill glyph outlines (default).
    pub const FILL: u8 = 0;
    /// Stroke glyph outlines.
    pub const STROKE: u8 = 1;
    /// Fill then stroke. Combined with a thin line width this indicates
    /// simulated bold.
    pub const FILL_STROKE: u8 = 2;
    /// Neither fill nor stroke (invisible text, OCR layers).
    pub const INVISIBLE: u8 = 3;
}

impl GraphicsState {
    /// Create a new graphics state with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_layout::content::GraphicsState;
    ///
    /// let state = GraphicsState::new();
    /// assert_eq!(state.font_size, 12.0);
    /// assert_eq!(state.horizontal_scaling, 100.0);
    /// ```
    pub fn new() -> Self {
        Self {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font_name: None,
            font_size: 12.0,
            text_rise: 0.0,
            render_mode: render_mode::FILL,
            fill_color: (0.0, 0.0, 0.0),
            stroke_color: (0.0, 0.0, 0.0),
            line_width: 1.0,
            clip: None,
        }
    }

    /// Intersect the active clip with a device-space rectangle.
    pub fn intersect_clip(&mut self, rect: Rect) {
        self.clip = match self.clip {
            Some(existing) => Some(existing.intersection(&rect).unwrap_or(Rect::ZERO)),
            None => Some(rect),
        };
    }

    /// Clip a device-space rectangle against the active clip region.
    pub fn clipped(&self, rect: Rect) -> Option<Rect> {
        match &self.clip {
            Some(clip) => clip.intersection(&rect),
            None => Some(rect),
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack of graphics states for save/restore operations.
///
/// The q (save) and Q (restore) operators push and pop graphics states,
/// allowing temporary modifications that are easily reverted.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    stack: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Create a new graphics state stack with an initial state.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_layout::content::GraphicsStateStack;
    ///
    /// let stack = GraphicsStateStack::new();
    /// assert_eq!(stack.depth(), 1);
    /// ```
    pub fn new() -> Self {
        Self {
            stack: vec![GraphicsState::new()],
        }
    }

    /// Get a reference to the current graphics state.
    pub fn current(&self) -> &GraphicsState {
        self.stack.last().expect("stack is never empty")
    }

    /// Get a mutable reference to the current graphics state.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        self.stack.last_mut().expect("stack is never empty")
    }

    /// Save the current graphics state (q operator).
    pub fn save(&mut self) {
        let state = self.current().clone();
        self.stack.push(state);
    }

    /// Restore the previous graphics state (Q operator).
    ///
    /// If only the initial state remains this operation has no effect;
    /// malformed streams restore more often than they save.
    pub fn restore(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Get the current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_identity() {
        let m = Matrix::identity();
        let p = m.transform_point(3.0, 4.0);
        assert_eq!(p.x, 3.0);
        assert_eq!(p.y, 4.0);
    }

    #[test]
    fn test_matrix_translation() {
        let m = Matrix::translation(10.0, 20.0);
        let p = m.transform_point(5.0, 10.0);
        assert_eq!(p.x, 15.0);
        assert_eq!(p.y, 30.0);
    }

    #[test]
    fn test_matrix_multiply_order() {
        // Scale first, then translate.
        let m = Matrix::scaling(2.0, 2.0).multiply(&Matrix::translation(10.0, 0.0));
        let p = m.transform_point(1.0, 1.0);
        assert_eq!(p.x, 12.0);
        assert_eq!(p.y, 2.0);
    }

    #[test]
    fn test_matrix_rotation_degrees() {
        let m = Matrix::rotation(90.0);
        assert!((m.rotation_degrees() - 90.0).abs() < 1e-4);
        assert!((Matrix::identity().rotation_degrees()).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_transform_rect_rotated() {
        let m = Matrix::rotation(90.0);
        let r = m.transform_rect(&Rect::new(0.0, 0.0, 10.0, 4.0));
        assert!((r.width - 4.0).abs() < 1e-3);
        assert!((r.height - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_matrix_determinant() {
        assert_eq!(Matrix::identity().determinant(), 1.0);
        assert_eq!(Matrix::scaling(2.0, 3.0).determinant(), 6.0);
        assert!(Matrix::scaling(0.0, 1.0).determinant().abs() < f32::EPSILON);
    }

    #[test]
    fn test_state_defaults() {
        let state = GraphicsState::new();
        assert_eq!(state.render_mode, render_mode::FILL);
        assert_eq!(state.fill_color, (0.0, 0.0, 0.0));
        assert!(state.clip.is_none());
    }

    #[test]
    fn test_clip_intersection() {
        let mut state = GraphicsState::new();
        state.intersect_clip(Rect::new(0.0, 0.0, 100.0, 100.0));
        state.intersect_clip(Rect::new(50.0, 50.0, 100.0, 100.0));
        let clip = state.clip.unwrap();
        assert_eq!(clip, Rect::new(50.0, 50.0, 50.0, 50.0));

        let visible = state.clipped(Rect::new(60.0, 60.0, 10.0, 10.0));
        assert!(visible.is_some());
        let hidden = state.clipped(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(hidden.is_none());
    }

    #[test]
    fn test_stack_save_restore() {
        let mut stack = GraphicsStateStack::new();
        stack.current_mut().font_size = 14.0;
        stack.save();
        stack.current_mut().font_size = 8.0;
        assert_eq!(stack.current().font_size, 8.0);
        stack.restore();
        assert_eq!(stack.current().font_size, 14.0);
        // Never pops the last state.
        stack.restore();
        stack.restore();
        assert_eq!(stack.depth(), 1);
    }
}
