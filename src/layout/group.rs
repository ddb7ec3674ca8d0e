//! Text regions: spatial clusters of runs merged before paragraph
//! assembly.
//!
//! A page is partitioned into regions so that multi-column layouts and
//! floating sidebars are merged independently of the main flow.

use crate::geometry::Rect;
use crate::text::{PaginationType, TextChunk};
use crate::utils::safe_float_cmp;

/// A rectangular cluster of text runs on one page.
#[derive(Debug, Clone)]
pub struct TextGroup {
    bounds: Rect,
    chunks: Vec<TextChunk>,
    /// Classification when the whole region is page furniture.
    pub pagination: PaginationType,
}

impl TextGroup {
    /// Open a region around a first run.
    pub fn new(chunk: TextChunk) -> Self {
        TextGroup {
            bounds: chunk.bounds,
            chunks: vec![chunk],
            pagination: PaginationType::None,
        }
    }

    /// Bounding rectangle of all runs in the region.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The region's runs, in insertion order until sorted.
    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// Number of runs in the region.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the region holds no runs.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Add a run, growing the bounds.
    pub fn add(&mut self, chunk: TextChunk) {
        self.bounds = self.bounds.union(&chunk.bounds);
        self.chunks.push(chunk);
    }

    /// Whether a run belongs to this region spatially.
    pub fn can_add(&self, bounds: &Rect) -> bool {
        self.bounds.intersects(bounds)
    }

    /// Whether `other` should be folded into this region: full
    /// containment, or an established region whose horizontal span
    /// covers the other's.
    pub fn can_absorb(&self, other: &TextGroup) -> bool {
        if self.bounds.contains(&other.bounds) {
            return true;
        }
        self.chunks.len() >= 5
            && self.bounds.left() <= other.bounds.left()
            && self.bounds.right() >= other.bounds.right()
    }

    /// Fold another region's runs into this one.
    pub fn absorb(&mut self, other: TextGroup) {
        self.bounds = self.bounds.union(&other.bounds);
        self.chunks.extend(other.chunks);
    }

    /// Leftmost visible text edge over all runs, ignoring leading spaces.
    pub fn text_left(&self) -> f32 {
        self.chunks
            .iter()
            .map(|c| c.text_left())
            .fold(self.bounds.right(), f32::min)
    }

    /// Rightmost visible text edge over all runs, ignoring trailing spaces.
    pub fn text_right(&self) -> f32 {
        self.chunks
            .iter()
            .map(|c| c.text_right())
            .fold(self.bounds.left(), f32::max)
    }

    /// Horizontal center of the region.
    pub fn center_x(&self) -> f32 {
        self.bounds.center_x()
    }

    /// Restore stream order within the region.
    pub fn sort_chunks(&mut self) {
        self.chunks.sort_by_key(|c| c.group_index);
    }

    /// Take the region's runs, leaving it empty.
    pub fn take_chunks(&mut self) -> Vec<TextChunk> {
        std::mem::take(&mut self.chunks)
    }
}

/// Partition a page's runs into text regions.
///
/// Each run joins the nearest region it intersects, or opens a new one.
/// Overlapping or span-covered regions are then folded together and the
/// result is ordered top to bottom.
pub fn build_groups(chunks: Vec<TextChunk>) -> Vec<TextGroup> {
    let mut groups: Vec<TextGroup> = Vec::new();
    for chunk in chunks {
        let best = groups
            .iter_mut()
            .filter(|g| g.can_add(&chunk.bounds))
            .min_by(|a, b| {
                let da = center_distance(&a.bounds, &chunk.bounds);
                let db = center_distance(&b.bounds, &chunk.bounds);
                safe_float_cmp(da, db)
            });
        match best {
            Some(group) => group.add(chunk),
            None => groups.push(TextGroup::new(chunk)),
        }
    }

    // Fold contained and span-covered regions until stable.
    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..groups.len() {
            for j in 0..groups.len() {
                if i != j && groups[i].can_absorb(&groups[j]) {
                    let other = groups.remove(j);
                    let i = if j < i { i - 1 } else { i };
                    groups[i].absorb(other);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }

    for group in &mut groups {
        group.sort_chunks();
    }
    groups.sort_by(|a, b| {
        safe_float_cmp(a.bounds.top(), b.bounds.top())
            .then(safe_float_cmp(a.bounds.left(), b.bounds.left()))
    });
    groups
}

fn center_distance(a: &Rect, b: &Rect) -> f32 {
    let dx = a.center_x() - b.center_x();
    let dy = a.center_y() - b.center_y();
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextElement;

    fn run(x: f32, y: f32, w: f32) -> TextChunk {
        TextChunk::new(TextElement::new(Rect::new(x, y, w, 10.0), "字", "F1", 10.0))
    }

    #[test]
    fn test_disjoint_runs_open_separate_groups() {
        let groups = build_groups(vec![run(0.0, 0.0, 50.0), run(300.0, 400.0, 50.0)]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_overlapping_runs_share_a_group() {
        let groups = build_groups(vec![run(0.0, 0.0, 50.0), run(40.0, 5.0, 50.0)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].chunk_count(), 2);
    }

    #[test]
    fn test_contained_group_absorbed() {
        // A big region and a smaller one fully inside its bounds.
        let mut big = TextGroup::new(run(0.0, 0.0, 200.0));
        big.add(run(0.0, 190.0, 200.0));
        let small = TextGroup::new(run(50.0, 50.0, 20.0));
        assert!(big.can_absorb(&small));
    }

    #[test]
    fn test_groups_ordered_top_to_bottom() {
        let groups = build_groups(vec![run(0.0, 500.0, 50.0), run(0.0, 0.0, 50.0)]);
        assert!(groups[0].bounds().top() < groups[1].bounds().top());
    }
}
