//! Drawing operators and graphics state.
//!
//! This module models the input side of the pipeline: the operator stream an
//! interpreter adapter produces for a page, and the graphics state machine
//! the scene builder runs while dispatching it.

pub mod graphics_state;
pub mod operators;

pub use graphics_state::{render_mode, GraphicsState, GraphicsStateStack, Matrix};
pub use operators::{Glyph, MarkedContentProps, Operator};
