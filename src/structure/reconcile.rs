//! Mapping the document structure tree onto one page's content.
//!
//! Strategy ladder, first success wins: resolve the page's struct-parent
//! index through the number tree and rebuild the tree bottom-up from the
//! recovered leaves; failing that, scan the whole structure tree pre-order
//! and keep the nodes bound to this page. Either way the result is a
//! [`TextTree`] plus an MCID index; a tree whose ancestor chains do not all
//! reach the document root is returned anyway but marked broken.

use std::collections::HashMap;

use log::warn;

use crate::page::PageInput;
use crate::structure::node::{StructElemId, StructKid, StructTree};
use crate::structure::text_tree::{TextNodeId, TextTree};

/// Reconcile the document structure tree against one page.
///
/// Returns `None` only when the document carries no structure at all.
/// Mutates `doc`: identifiers are assigned, pages are bound, and broken
/// number-tree nodes are repaired in place so the work is not repeated for
/// later pages.
pub fn reconcile(doc: &mut StructTree, page: &PageInput) -> Option<TextTree> {
    if doc.elements.is_empty() {
        return None;
    }
    let mut tree = TextTree::new();

    let mut collected = false;
    if let Some(index) = page.struct_parents.filter(|i| *i >= 0) {
        let leaves = doc
            .parent_tree
            .as_mut()
            .and_then(|nt| nt.resolve(index));
        if let Some(leaves) = leaves {
            collected = collect_from_leaves(doc, &leaves, page.page_number, &mut tree);
            if !collected {
                warn!(
                    "page {}: no usable leaves behind struct-parent {}; document may be merged",
                    page.page_number, index
                );
                tree.clear();
            }
        }
    }

    if !collected {
        let root_kids = doc.root_kids.clone();
        let root = tree.root();
        for kid in root_kids {
            if let Some(node) = scan_subtree(doc, kid, page.page_number, &mut tree) {
                tree.link(root, node);
            }
        }
    }

    Some(tree)
}

/// Rebuild the page tree upward from number-tree leaves.
fn collect_from_leaves(
    doc: &mut StructTree,
    leaves: &[StructElemId],
    page_number: u32,
    tree: &mut TextTree,
) -> bool {
    // Merged documents repeat leaf entries.
    let mut seen = Vec::new();
    let leaves: Vec<StructElemId> = leaves
        .iter()
        .copied()
        .filter(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        })
        .collect();

    let mut node_map: HashMap<String, TextNodeId> = HashMap::new();
    node_map.insert("Root".to_string(), tree.root());
    let mut matched = 0usize;

    for leaf in leaves {
        if leaf >= doc.elements.len() {
            continue;
        }
        let ident = doc.ensure_identifier(leaf);
        match doc.elements[leaf].page {
            None => doc.elements[leaf].page = Some(page_number),
            // Duplicate struct-parent values across merged documents land
            // leaves on foreign pages; skip those.
            Some(p) if p != page_number => continue,
            Some(_) => {}
        }
        matched += 1;

        let leaf_node = match node_map.get(&ident) {
            Some(&n) => n,
            None => {
                let n = tree.add_node(Some(leaf), doc.mapped_type(leaf).to_string());
                node_map.insert(ident.clone(), n);
                n
            }
        };
        for mcid in doc.elements[leaf].mcids().collect::<Vec<_>>() {
            tree.mcid_map.insert(mcid, leaf);
        }

        // Walk upward, materializing one text node per ancestor.
        let mut current = leaf_node;
        let mut elem = leaf;
        loop {
            let (key, parent_elem) = match doc.elements[elem].parent {
                Some(p) => {
                    let ident = doc.ensure_identifier(p);
                    if doc.elements[p].page.is_none() {
                        doc.elements[p].page = Some(page_number);
                    }
                    (ident, Some(p))
                }
                None => ("Root".to_string(), None),
            };
            let parent_node = match node_map.get(&key) {
                Some(&n) => n,
                None => {
                    let n = tree.add_node(parent_elem, match parent_elem {
                        Some(p) => doc.mapped_type(p).to_string(),
                        None => "Root".to_string(),
                    });
                    node_map.insert(key, n);
                    n
                }
            };
            tree.link(parent_node, current);
            match parent_elem {
                Some(p) => {
                    current = parent_node;
                    elem = p;
                }
                None => break,
            }
        }
        // An element with no parent link that is not a root kid means the
        // chain never reached the true root.
        if doc.elements[elem].parent.is_none() && !doc.is_root_kid(elem) {
            warn!(
                "page {}: structure info mismatched, incomplete or broken",
                page_number
            );
            tree.broken = true;
        }
    }

    if matched > 0 {
        let root_kids: Vec<StructKid> =
            doc.root_kids.iter().copied().map(StructKid::Elem).collect();
        fix_children_order(doc, tree, tree.root(), &root_kids, page_number);
    }
    matched > 0
}

/// Re-sort a node's children into structure-tree kid order.
///
/// The bottom-up walk discovers children in leaf order, not document order,
/// and loses empty elements that own no marked content; both are restored
/// here from the structure node's own kid list.
fn fix_children_order(
    doc: &StructTree,
    tree: &mut TextTree,
    node: TextNodeId,
    elem_kids: &[StructKid],
    page_number: u32,
) {
    let mut fixed = Vec::new();
    for kid in elem_kids {
        let &StructKid::Elem(kid_elem) = kid else {
            continue;
        };
        let existing = tree
            .node(node)
            .children
            .iter()
            .copied()
            .find(|&c| tree.node(c).element == Some(kid_elem));
        match existing {
            Some(c) => fixed.push(c),
            None if doc.elements[kid_elem].page == Some(page_number) => {
                let c = tree.add_node(Some(kid_elem), doc.mapped_type(kid_elem).to_string());
                tree.node_mut(c).parent = Some(node);
                fixed.push(c);
            }
            None => {}
        }
    }
    tree.node_mut(node).children = fixed.clone();
    for child in fixed {
        let Some(elem) = tree.node(child).element else {
            continue;
        };
        let kids = doc.elements[elem].kids.clone();
        fix_children_order(doc, tree, child, &kids, page_number);
    }
}

/// Fallback: pre-order scan keeping elements bound to this page or unbound.
///
/// Returns the materialized node when the subtree touched the page.
fn scan_subtree(
    doc: &mut StructTree,
    elem: StructElemId,
    page_number: u32,
    tree: &mut TextTree,
) -> Option<TextNodeId> {
    let mut matched = false;
    match doc.elements[elem].page {
        Some(p) if p == page_number => {
            doc.ensure_identifier(elem);
            matched = true;
            for mcid in doc.elements[elem].mcids().collect::<Vec<_>>() {
                tree.mcid_map.insert(mcid, elem);
            }
        }
        None => matched = true,
        Some(_) => {}
    }

    let node = tree.add_node(Some(elem), doc.mapped_type(elem).to_string());
    let kids = doc.elements[elem].kids.clone();
    for kid in kids {
        if let StructKid::Elem(child) = kid {
            if let Some(child_node) = scan_subtree(doc, child, page_number, tree) {
                tree.link(node, child_node);
                matched = true;
            }
        }
    }
    matched.then_some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::node::{NumberTree, StructElem};

    /// Document / Sect / two P leaves with MCIDs 0 and 1 on page 1.
    fn two_paragraph_doc() -> (StructTree, StructElemId, StructElemId) {
        let mut doc = StructTree::new();
        let document = doc.add_element(None, StructElem::new("Document"));
        let sect = doc.add_element(Some(document), StructElem::new("Sect"));
        let p1 = doc.add_element(Some(sect), StructElem::new("P"));
        let p2 = doc.add_element(Some(sect), StructElem::new("P"));
        doc.elements[p1].kids.push(StructKid::Mcid(0));
        doc.elements[p2].kids.push(StructKid::Mcid(1));
        doc.parent_tree = Some(NumberTree::from_nums(vec![(0, vec![p1, p2])]));
        (doc, p1, p2)
    }

    fn page(number: u32, struct_parents: i32) -> PageInput {
        let mut page = PageInput::new(number, 612.0, 792.0);
        page.struct_parents = Some(struct_parents);
        page
    }

    #[test]
    fn test_parent_tree_path() {
        let (mut doc, p1, p2) = two_paragraph_doc();
        let tree = reconcile(&mut doc, &page(1, 0)).unwrap();
        assert!(!tree.broken);
        assert_eq!(tree.mcid_map.get(&0), Some(&p1));
        assert_eq!(tree.mcid_map.get(&1), Some(&p2));
        // Root -> Document -> Sect -> P, P
        let root_children = &tree.node(tree.root()).children;
        assert_eq!(root_children.len(), 1);
        assert_eq!(tree.node(root_children[0]).structure_type, "Document");
        let ps = tree.find_by_type("P");
        assert_eq!(ps.len(), 2);
        // Pages got bound along the way.
        assert_eq!(doc.elements[p1].page, Some(1));
    }

    #[test]
    fn test_children_keep_document_order() {
        let (mut doc, p1, p2) = two_paragraph_doc();
        // Leaves arrive in reverse order; kid order must win.
        if let Some(nt) = &mut doc.parent_tree {
            nt.nums = vec![(0, vec![p2, p1])];
        }
        let tree = reconcile(&mut doc, &page(1, 0)).unwrap();
        let ps = tree.find_by_type("P");
        assert_eq!(tree.node(ps[0]).element, Some(p1));
        assert_eq!(tree.node(ps[1]).element, Some(p2));
    }

    #[test]
    fn test_foreign_page_leaves_skipped() {
        let (mut doc, p1, _) = two_paragraph_doc();
        doc.elements[p1].page = Some(7);
        let tree = reconcile(&mut doc, &page(1, 0)).unwrap();
        // p1 belongs to another page; only p2 survives.
        assert_eq!(tree.find_by_type("P").len(), 1);
    }

    #[test]
    fn test_fallback_scan_without_parent_tree() {
        let (mut doc, p1, p2) = two_paragraph_doc();
        doc.parent_tree = None;
        doc.elements[p1].page = Some(1);
        doc.elements[p2].page = Some(2);
        let tree = reconcile(&mut doc, &page(1, -1)).unwrap();
        // The scan keeps page-1 and unbound nodes; p2 is bound elsewhere
        // so its MCID never lands in the index.
        assert_eq!(tree.mcid_map.get(&0), Some(&p1));
        assert_eq!(tree.mcid_map.get(&1), None);
    }

    #[test]
    fn test_orphan_chain_marks_broken() {
        let mut doc = StructTree::new();
        // An element created outside the root's kid list: its chain cannot
        // reach the true root.
        let orphan = doc.elements.len();
        doc.elements.push(StructElem::new("P"));
        doc.elements[orphan].kids.push(StructKid::Mcid(0));
        doc.parent_tree = Some(NumberTree::from_nums(vec![(0, vec![orphan])]));
        // Give the document a real root kid too so it is non-empty.
        doc.add_element(None, StructElem::new("Document"));
        let tree = reconcile(&mut doc, &page(1, 0)).unwrap();
        assert!(tree.broken);
        assert_eq!(tree.mcid_map.get(&0), Some(&orphan));
    }

    #[test]
    fn test_no_structure_returns_none() {
        let mut doc = StructTree::new();
        assert!(reconcile(&mut doc, &page(1, 0)).is_none());
    }
}
