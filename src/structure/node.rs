//! Document-level tagged-structure tree, as handed over by the adapter.
//!
//! The adapter flattens the document's structure elements into an arena; kids
//! are either other elements or raw marked-content identifiers. The
//! struct-parent number tree comes along in its raw nested form because real
//! documents carry broken ones that reconciliation has to repair in place.

use std::collections::HashMap;

use log::warn;

/// Index of a structure element in [`StructTree::elements`].
pub type StructElemId = usize;

/// Child of a structure element.
#[derive(Debug, Clone, PartialEq)]
pub enum StructKid {
    /// Another structure element
    Elem(StructElemId),
    /// A marked-content identifier on the element's page
    Mcid(i32),
}

/// One structure element (a StructElem dictionary).
#[derive(Debug, Clone)]
pub struct StructElem {
    /// Raw structure type as written in the document (before role mapping)
    pub struct_type: String,
    /// Stable element identifier; assigned during reconciliation when absent
    pub identifier: Option<String>,
    /// Parent element; `None` means the tree root is the parent
    pub parent: Option<StructElemId>,
    /// Children in document order
    pub kids: Vec<StructKid>,
    /// Page binding; `None` until first reconciled
    pub page: Option<u32>,
}

impl StructElem {
    /// Create an unbound element of the given type.
    pub fn new(struct_type: impl Into<String>) -> Self {
        Self {
            struct_type: struct_type.into(),
            identifier: None,
            parent: None,
            kids: Vec::new(),
            page: None,
        }
    }

    /// Marked-content identifiers directly on this element.
    pub fn mcids(&self) -> impl Iterator<Item = i32> + '_ {
        self.kids.iter().filter_map(|k| match k {
            StructKid::Mcid(m) => Some(*m),
            StructKid::Elem(_) => None,
        })
    }
}

/// A node of the struct-parent number tree.
///
/// Leaf entries map a page's struct-parent index to the structure elements
/// whose kids reference that page's marked content. Intermediate nodes carry
/// child ranges; merged documents routinely break the range invariants, so
/// [`NumberTree::resolve`] repairs inconsistent nodes by flattening.
#[derive(Debug, Clone, Default)]
pub struct NumberTree {
    /// Leaf entries, `(struct-parent index, elements)` pairs
    pub nums: Vec<(i32, Vec<StructElemId>)>,
    /// Child nodes
    pub kids: Vec<NumberTree>,
    /// Declared key range of this subtree
    pub limits: Option<(i32, i32)>,
    /// Set once this node's children have been flattened into `nums`
    pub repaired: bool,
}

impl NumberTree {
    /// Create a leaf node from its entries.
    pub fn from_nums(nums: Vec<(i32, Vec<StructElemId>)>) -> Self {
        Self {
            nums,
            ..Self::default()
        }
    }

    /// Look up a struct-parent index, repairing inconsistent child ranges.
    ///
    /// When any child lacks a usable range, all remaining children's leaf
    /// arrays are merged into this node and re-indexed; the node is marked
    /// repaired so the merge happens once.
    pub fn resolve(&mut self, key: i32) -> Option<Vec<StructElemId>> {
        if let Some((_, elems)) = self.nums.iter().find(|(k, _)| *k == key) {
            return Some(elems.clone());
        }
        if self.kids.is_empty() {
            return None;
        }

        let mut merged: Option<Vec<(i32, Vec<StructElemId>)>> = None;
        let mut recurse: Option<usize> = None;
        for (i, child) in self.kids.iter().enumerate() {
            let bad_range = match child.limits {
                Some((lo, hi)) => lo < 0 || hi < 0,
                None => true,
            };
            if !self.repaired && (merged.is_some() || bad_range) {
                // Once one child is inconsistent the sibling order cannot be
                // trusted either; fold them all together.
                let sink = merged.get_or_insert_with(|| {
                    warn!("number tree node has inconsistent kid ranges, flattening");
                    Vec::new()
                });
                child.collect_nums(sink);
            } else if child
                .limits
                .map(|(lo, hi)| lo <= key && key <= hi)
                .unwrap_or(true)
            {
                recurse = Some(i);
                break;
            }
        }

        if let Some(i) = recurse {
            return self.kids[i].resolve(key);
        }
        if let Some(mut entries) = merged {
            entries.sort_by_key(|(k, _)| *k);
            self.limits = match (entries.first(), entries.last()) {
                (Some((lo, _)), Some((hi, _))) => Some((*lo, *hi)),
                _ => self.limits,
            };
            self.nums = entries;
            self.repaired = true;
            return self.nums.iter().find(|(k, _)| *k == key).map(|(_, e)| e.clone());
        }
        None
    }

    fn collect_nums(&self, sink: &mut Vec<(i32, Vec<StructElemId>)>) {
        sink.extend(self.nums.iter().cloned());
        for kid in &self.kids {
            kid.collect_nums(sink);
        }
    }
}

/// The document's tagged-structure tree.
#[derive(Debug, Clone, Default)]
pub struct StructTree {
    /// All structure elements, arena-style
    pub elements: Vec<StructElem>,
    /// Elements directly under the structure tree root, in document order
    pub root_kids: Vec<StructElemId>,
    /// Struct-parent number tree, when the document has one
    pub parent_tree: Option<NumberTree>,
    /// Maps custom structure types to standard ones
    pub role_map: HashMap<String, String>,
    next_auto_id: u64,
}

impl StructTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element under `parent` (`None` puts it under the root).
    pub fn add_element(&mut self, parent: Option<StructElemId>, elem: StructElem) -> StructElemId {
        let id = self.elements.len();
        let mut elem = elem;
        elem.parent = parent;
        self.elements.push(elem);
        match parent {
            Some(p) => self.elements[p].kids.push(StructKid::Elem(id)),
            None => self.root_kids.push(id),
        }
        id
    }

    /// Assign a stable identifier to an element that lacks one.
    pub fn ensure_identifier(&mut self, id: StructElemId) -> String {
        if let Some(ident) = &self.elements[id].identifier {
            return ident.clone();
        }
        self.next_auto_id += 1;
        let ident = format!("AutoElem.{}", self.next_auto_id);
        self.elements[id].identifier = Some(ident.clone());
        ident
    }

    /// Structure type after role-map substitution.
    pub fn mapped_type(&self, id: StructElemId) -> &str {
        let raw = self.elements[id].struct_type.as_str();
        self.role_map.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Whether `id` hangs directly under the tree root.
    pub fn is_root_kid(&self, id: StructElemId) -> bool {
        self.root_kids.contains(&id)
    }
}
