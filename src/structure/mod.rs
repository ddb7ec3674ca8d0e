//! Tagged-structure reconciliation.
//!
//! The document's accessibility tree arrives flattened from the adapter; the
//! reconciler maps it onto one page's marked content, repairing broken
//! number trees and falling back to a full scan when the parent tree is
//! missing or inconsistent.

pub mod node;
pub mod reconcile;
pub mod text_tree;

pub use node::{NumberTree, StructElem, StructElemId, StructKid, StructTree};
pub use reconcile::reconcile;
pub use text_tree::{TextNodeId, TextTree, TextTreeNode};
