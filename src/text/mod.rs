//! Text model: glyph elements, mergeable runs, and line merging.
//!
//! A [`TextElement`] is one drawn glyph; a [`TextChunk`] is an ordered run of
//! elements sharing a reading direction; [`TextChunkMerger`] joins runs into
//! visual lines. Paragraph assembly on top of lines lives in
//! [`crate::layout`].

pub mod chunk;
pub mod element;
pub mod merger;
pub mod patterns;

pub use chunk::{Direction, PaginationType, TextChunk};
pub use element::{TextElement, TextStyle};
pub use merger::TextChunkMerger;
