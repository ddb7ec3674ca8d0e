//! Line, paragraph, and region layout.
//!
//! Text chunks from a scene graph are gathered into spatial regions
//! ([`TextGroup`]), folded into lines, and merged into paragraphs
//! ([`TextBlock`]) by an ordered rule cascade or an installed
//! [`LineTagger`].

pub mod block;
pub mod group;
pub mod merger;
pub mod rules;

pub use block::{LineTag, Paragraph, ParagraphId, TextBlock};
pub use group::{build_groups, TextGroup};
pub use merger::{LineTagger, ParagraphMerger};
pub use rules::{default_rules, MergeContext, MergeRule, Verdict};
