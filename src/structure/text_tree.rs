//! Per-page view of the structure tree with text attached.

use indexmap::IndexMap;

use crate::structure::node::StructElemId;
use crate::text::TextChunk;

/// Index of a node in [`TextTree::nodes`].
pub type TextNodeId = usize;

/// One node of the per-page text tree.
#[derive(Debug, Clone)]
pub struct TextTreeNode {
    /// The structure element behind this node; `None` for the root
    pub element: Option<StructElemId>,
    /// Role-mapped structure type; "Root" for the root
    pub structure_type: String,
    /// Parent node
    pub parent: Option<TextNodeId>,
    /// Children in reading order
    pub children: Vec<TextNodeId>,
    /// Text runs bound to this node's marked content
    pub chunks: Vec<TextChunk>,
}

impl TextTreeNode {
    /// Whether the node carries neither text nor children.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.children.is_empty()
    }
}

/// The text tree recovered for one page.
///
/// Built by [`crate::structure::reconcile`]; `broken` marks a tree whose
/// ancestor chains did not all terminate at the document root, which callers
/// must treat as best-effort rather than authoritative.
#[derive(Debug, Clone)]
pub struct TextTree {
    nodes: Vec<TextTreeNode>,
    /// Marked-content identifier to owning structure element
    pub mcid_map: IndexMap<i32, StructElemId>,
    /// Set when reconciliation recovered only a partial or inconsistent tree
    pub broken: bool,
    /// Runs on the page that no structure element claims
    pub no_struct_chunks: Vec<TextChunk>,
}

impl Default for TextTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![TextTreeNode {
                element: None,
                structure_type: "Root".to_string(),
                parent: None,
                children: Vec::new(),
                chunks: Vec::new(),
            }],
            mcid_map: IndexMap::new(),
            broken: false,
            no_struct_chunks: Vec::new(),
        }
    }

    /// The root node.
    pub fn root(&self) -> TextNodeId {
        0
    }

    /// Add an unlinked node; call [`TextTree::link`] to attach it.
    pub fn add_node(&mut self, element: Option<StructElemId>, structure_type: impl Into<String>) -> TextNodeId {
        let id = self.nodes.len();
        self.nodes.push(TextTreeNode {
            element,
            structure_type: structure_type.into(),
            parent: None,
            children: Vec::new(),
            chunks: Vec::new(),
        });
        id
    }

    /// Attach `child` under `parent` unless it already has a parent.
    ///
    /// First linkage wins; a node reachable through several leaves keeps the
    /// parent it got first.
    pub fn link(&mut self, parent: TextNodeId, child: TextNodeId) {
        if child == self.root() || self.nodes[child].parent.is_some() {
            return;
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Borrow a node.
    pub fn node(&self, id: TextNodeId) -> &TextTreeNode {
        &self.nodes[id]
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: TextNodeId) -> &mut TextTreeNode {
        &mut self.nodes[id]
    }

    /// Number of nodes including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no structure was recovered at all.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty() && self.nodes.len() == 1
    }

    /// Drop the root's subtrees and start over. Used when a reconciliation
    /// strategy fails partway.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.nodes[0].chunks.clear();
        self.mcid_map.clear();
        self.broken = false;
    }

    /// Distribute a page's text runs onto the nodes that claim their
    /// marked-content identifiers; unclaimed runs become `no_struct_chunks`.
    pub fn attach_chunks(&mut self, chunks: Vec<TextChunk>) {
        let mut leftover = Vec::new();
        'next: for chunk in chunks {
            if let Some(mcid) = chunk.mcid() {
                if let Some(&elem) = self.mcid_map.get(&mcid) {
                    for node in self.nodes.iter_mut() {
                        if node.element == Some(elem) {
                            node.chunks.push(chunk);
                            continue 'next;
                        }
                    }
                }
            }
            leftover.push(chunk);
        }
        self.no_struct_chunks = leftover;
    }

    /// Find nodes by role-mapped structure type, not descending below a
    /// match.
    pub fn find_by_type(&self, structure_type: &str) -> Vec<TextNodeId> {
        let mut found = Vec::new();
        self.find_from(self.root(), structure_type, &mut found);
        found
    }

    fn find_from(&self, id: TextNodeId, structure_type: &str, found: &mut Vec<TextNodeId>) {
        if self.nodes[id].structure_type == structure_type {
            found.push(id);
            return;
        }
        for &child in &self.nodes[id].children {
            self.find_from(child, structure_type, found);
        }
    }

    /// All runs under a node, subtree order.
    pub fn all_chunks(&self, id: TextNodeId) -> Vec<&TextChunk> {
        let mut out = Vec::new();
        self.collect_chunks(id, &mut out);
        out.sort_by_key(|c| (c.mcid().unwrap_or(i32::MAX), c.group_index));
        out
    }

    fn collect_chunks<'a>(&'a self, id: TextNodeId, out: &mut Vec<&'a TextChunk>) {
        out.extend(self.nodes[id].chunks.iter());
        for &child in &self.nodes[id].children {
            self.collect_chunks(child, out);
        }
    }

    /// Concatenated text under a node.
    pub fn text(&self, id: TextNodeId) -> String {
        self.all_chunks(id).iter().map(|c| c.text()).collect()
    }

    /// Whether structure information is complete enough to drive layout:
    /// the tree is not broken and every unclaimed run was classified as
    /// pagination content.
    pub fn is_reliable(&self) -> bool {
        !self.broken
            && self
                .no_struct_chunks
                .iter()
                .all(|c| c.pagination.is_pagination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::text::TextElement;

    fn chunk(mcid: Option<i32>, text: &str) -> TextChunk {
        let mut el = TextElement::new(Rect::new(0.0, 0.0, 10.0, 12.0), text, "F1", 12.0);
        el.mcid = mcid;
        TextChunk::new(el)
    }

    #[test]
    fn test_first_linkage_wins() {
        let mut tree = TextTree::new();
        let a = tree.add_node(Some(0), "Sect");
        let b = tree.add_node(Some(1), "P");
        tree.link(tree.root(), a);
        tree.link(a, b);
        tree.link(tree.root(), b);
        assert_eq!(tree.node(b).parent, Some(a));
        assert_eq!(tree.node(tree.root()).children, vec![a]);
    }

    #[test]
    fn test_attach_chunks_by_mcid() {
        let mut tree = TextTree::new();
        let p = tree.add_node(Some(0), "P");
        tree.link(tree.root(), p);
        tree.mcid_map.insert(4, 0);
        tree.attach_chunks(vec![chunk(Some(4), "body"), chunk(Some(9), "stray")]);
        assert_eq!(tree.node(p).chunks.len(), 1);
        assert_eq!(tree.no_struct_chunks.len(), 1);
        assert_eq!(tree.text(p), "body");
    }

    #[test]
    fn test_find_by_type_stops_at_match() {
        let mut tree = TextTree::new();
        let table = tree.add_node(Some(0), "Table");
        let row = tree.add_node(Some(1), "Table");
        tree.link(tree.root(), table);
        tree.link(table, row);
        assert_eq!(tree.find_by_type("Table"), vec![table]);
    }

    #[test]
    fn test_reliability() {
        let mut tree = TextTree::new();
        assert!(tree.is_reliable());
        tree.no_struct_chunks.push(chunk(None, "stray"));
        assert!(!tree.is_reliable());
        tree.no_struct_chunks[0].pagination = crate::text::PaginationType::Footer;
        assert!(tree.is_reliable());
        tree.broken = true;
        assert!(!tree.is_reliable());
    }
}
