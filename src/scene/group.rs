//! The scene graph: a nested group tree of drawn items.
//!
//! Groups form an arena-backed tree. Each group owns its items and child
//! group handles; the parent link is a plain index, so upward traversal never
//! creates an ownership cycle. Once built the tree is immutable except for
//! the page-level tag map later stages annotate.

use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;

use crate::content::Matrix;
use crate::geometry::Rect;
use crate::text::TextChunk;

/// Handle of a group inside a [`SceneGraph`].
pub type GroupId = usize;

/// Well-known tag keys written by pipeline stages.
pub mod tags {
    /// Matched paper profile name
    pub const PAPER: &str = "paper";
    /// Detected pagination frame rectangle
    pub const PAGINATION_FRAME: &str = "pagination_frame";
    /// Whether the frame's top edge came from a drawn line
    pub const PAGINATION_TOP_LINE: &str = "pagination.top_line";
    /// Whether the frame's bottom edge came from a drawn line
    pub const PAGINATION_BOTTOM_LINE: &str = "pagination.bottom_line";
    /// Whether the frame's left edge came from a drawn line
    pub const PAGINATION_LEFT_LINE: &str = "pagination.left_line";
    /// Whether the frame's right edge came from a drawn line
    pub const PAGINATION_RIGHT_LINE: &str = "pagination.right_line";
    /// Structure tree was recovered but marked broken
    pub const STRUCTURE_BROKEN: &str = "structure.broken";
}

/// A typed value in a group's tag map.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f32),
    /// Text value
    Text(String),
    /// Rectangle value
    Rect(Rect),
}

/// A finalized vector path.
#[derive(Debug, Clone)]
pub struct PathItem {
    /// Display-space bounding box
    pub bounds: Rect,
    /// Fill color when the path was filled
    pub fill_color: Option<(f32, f32, f32)>,
    /// Stroke color when the path was stroked
    pub stroke_color: Option<(f32, f32, f32)>,
    /// Stroke width in display space
    pub line_width: f32,
    /// Shading resource name for shading fills
    pub shading: Option<String>,
    /// Marked-content identifier active when the path was painted
    pub mcid: Option<i32>,
}

impl PathItem {
    /// Whether the item is a thin horizontal rule.
    pub fn is_horizontal_line(&self) -> bool {
        self.bounds.height <= 3.0 && self.bounds.width > self.bounds.height
    }

    /// Whether the item is a thin vertical rule.
    pub fn is_vertical_line(&self) -> bool {
        self.bounds.width <= 3.0 && self.bounds.height > self.bounds.width
    }
}

/// A placed raster image.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Display-space bounding box
    pub bounds: Rect,
    /// Full affine mapping from unit image space to display space
    pub matrix: Matrix,
    /// Image resource name
    pub name: String,
    /// Marked-content identifier active when the image was drawn
    pub mcid: Option<i32>,
}

/// One entry in a group's ordered item list.
#[derive(Debug, Clone)]
pub enum SceneItem {
    /// A painted path
    Path(PathItem),
    /// A placed image
    Image(ImageItem),
    /// A run of glyphs
    Text(TextChunk),
    /// A nested group
    Group(GroupId),
}

/// A node of the scene graph: one nested drawing context.
#[derive(Debug, Clone)]
pub struct SceneGroup {
    /// This group's handle
    pub id: GroupId,
    /// Parent handle; `None` for the page root
    pub parent: Option<GroupId>,
    /// Items in paint order
    pub items: Vec<SceneItem>,
    /// Clip rectangle active when the group was opened
    pub clip: Option<Rect>,
    /// Form resource name for form-backed groups
    pub form_name: Option<String>,
    /// Set when population was skipped because the stream looked like a
    /// painting or cover page
    pub skipped_painting: bool,
}

impl SceneGroup {
    fn new(id: GroupId, parent: Option<GroupId>) -> Self {
        Self {
            id,
            parent,
            items: Vec::new(),
            clip: None,
            form_name: None,
            skipped_painting: false,
        }
    }

    /// Union of the bounds of this group's direct items.
    pub fn area(&self) -> Option<Rect> {
        let mut area: Option<Rect> = None;
        for item in &self.items {
            let bounds = match item {
                SceneItem::Path(p) => Some(p.bounds),
                SceneItem::Image(i) => Some(i.bounds),
                SceneItem::Text(t) => Some(t.bounds),
                SceneItem::Group(_) => None,
            };
            if let Some(b) = bounds {
                area = Some(match area {
                    Some(a) => a.union(&b),
                    None => b,
                });
            }
        }
        area
    }
}

/// The built scene graph of one page.
///
/// The group tree is immutable once built. The page tag map is behind a
/// lock so later pipeline stages can annotate a graph shared through the
/// page cache; entries are only ever added.
#[derive(Debug)]
pub struct SceneGraph {
    groups: Vec<SceneGroup>,
    /// One-based page number
    pub page_number: u32,
    /// Display-space bounds of the page
    pub bounds: Rect,
    /// Total glyphs drawn on the page
    pub glyph_count: usize,
    tags: Mutex<IndexMap<String, TagValue>>,
}

impl Clone for SceneGraph {
    fn clone(&self) -> Self {
        Self {
            groups: self.groups.clone(),
            page_number: self.page_number,
            bounds: self.bounds,
            glyph_count: self.glyph_count,
            tags: Mutex::new(self.tag_map()),
        }
    }
}

impl SceneGraph {
    /// Create a graph containing only the page root group.
    pub fn new(page_number: u32, bounds: Rect) -> Self {
        Self {
            groups: vec![SceneGroup::new(0, None)],
            page_number,
            bounds,
            glyph_count: 0,
            tags: Mutex::new(IndexMap::new()),
        }
    }

    /// Handle of the page root group.
    pub fn root(&self) -> GroupId {
        0
    }

    /// Open a new child group under `parent` and return its handle.
    pub fn add_group(&mut self, parent: GroupId) -> GroupId {
        let id = self.groups.len();
        self.groups.push(SceneGroup::new(id, Some(parent)));
        self.groups[parent].items.push(SceneItem::Group(id));
        id
    }

    /// Borrow a group.
    pub fn group(&self, id: GroupId) -> &SceneGroup {
        &self.groups[id]
    }

    /// Borrow a group mutably.
    pub fn group_mut(&mut self, id: GroupId) -> &mut SceneGroup {
        &mut self.groups[id]
    }

    /// Number of groups including the root.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterate over all groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &SceneGroup> {
        self.groups.iter()
    }

    /// Write a page tag.
    pub fn set_tag(&self, key: &str, value: TagValue) {
        self.lock_tags().insert(key.to_string(), value);
    }

    /// Read a page tag.
    pub fn tag(&self, key: &str) -> Option<TagValue> {
        self.lock_tags().get(key).cloned()
    }

    /// Snapshot of all page tags in insertion order.
    pub fn tag_map(&self) -> IndexMap<String, TagValue> {
        self.lock_tags().clone()
    }

    fn lock_tags(&self) -> MutexGuard<'_, IndexMap<String, TagValue>> {
        // A poisoning panic cannot leave the map half-written; every
        // insert happens in one step under the lock.
        self.tags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All text runs in paint order, walking groups depth-first.
    pub fn text_chunks(&self) -> Vec<&TextChunk> {
        let mut out = Vec::new();
        self.collect_chunks(0, &mut out);
        out
    }

    fn collect_chunks<'a>(&'a self, id: GroupId, out: &mut Vec<&'a TextChunk>) {
        for item in &self.groups[id].items {
            match item {
                SceneItem::Text(chunk) => out.push(chunk),
                SceneItem::Group(child) => self.collect_chunks(*child, out),
                _ => {}
            }
        }
    }

    /// Visit every text run mutably. Groups are visited in creation order,
    /// which matches paint order for sequentially built graphs.
    pub fn for_each_chunk_mut<F: FnMut(&mut TextChunk)>(&mut self, mut f: F) {
        for group in &mut self.groups {
            for item in &mut group.items {
                if let SceneItem::Text(chunk) = item {
                    f(chunk);
                }
            }
        }
    }

    /// All path items in paint order.
    pub fn path_items(&self) -> Vec<&PathItem> {
        let mut out = Vec::new();
        self.collect_paths(0, &mut out);
        out
    }

    fn collect_paths<'a>(&'a self, id: GroupId, out: &mut Vec<&'a PathItem>) {
        for item in &self.groups[id].items {
            match item {
                SceneItem::Path(p) => out.push(p),
                SceneItem::Group(child) => self.collect_paths(*child, out),
                _ => {}
            }
        }
    }

    /// Depth of `id` below the root.
    pub fn depth(&self, id: GroupId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.groups[current].parent {
            depth += 1;
            current = parent;
        }
        depth
    }
}
