//! Line merge: joining glyph runs that share one visual text line.

use crate::config::thresholds;
use crate::config::LayoutConfig;

use super::chunk::{Direction, TextChunk};
use super::patterns;

/// Merges adjacent glyph runs into text lines.
///
/// Runs merge when they share a reading direction, sit on one line, and the
/// gap between them is at most a configurable number of space widths. The
/// pass is idempotent: already-merged lines are further apart than the gap
/// bound, so re-running it is a no-op.
#[derive(Debug, Clone)]
pub struct TextChunkMerger {
    merge_space_count: f32,
}

impl Default for TextChunkMerger {
    fn default() -> Self {
        Self {
            merge_space_count: thresholds::MERGE_SPACE_COUNT,
        }
    }
}

impl TextChunkMerger {
    /// Create a merger using the config's gap bound.
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            merge_space_count: config.merge_space_count,
        }
    }

    /// Merge runs into lines, preserving encounter order.
    pub fn merge(&self, chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        let mut merged: Vec<TextChunk> = Vec::new();
        'next: for chunk in chunks {
            if chunk.elements.is_empty() {
                continue;
            }
            for target in merged.iter_mut().rev() {
                if target.merge_shadow(&chunk) {
                    continue 'next;
                }
                if self.can_merge(target, &chunk) {
                    target.merge(chunk);
                    continue 'next;
                }
            }
            merged.push(chunk);
        }
        merged
    }

    /// Collapse runs that share one visual line into single line chunks,
    /// regardless of the horizontal gap between them.
    ///
    /// Line merging proper ([`TextChunkMerger::merge`]) respects column gaps;
    /// this pass deliberately does not and is used where whole lines are
    /// compared as units, such as pagination probing.
    pub fn merge_to_line(&self, chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        let mut sorted = chunks;
        sorted.retain(|c| !c.elements.is_empty());
        sorted.sort_by(|a, b| {
            a.bounds
                .top()
                .partial_cmp(&b.bounds.top())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    a.bounds
                        .left()
                        .partial_cmp(&b.bounds.left())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        let mut lines: Vec<TextChunk> = Vec::new();
        'next: for chunk in sorted {
            for line in lines.iter_mut().rev() {
                if line.pagination == chunk.pagination
                    && line.direction.compatible(chunk.direction)
                    && !line.direction.is_vertical()
                    && !chunk.direction.is_vertical()
                    && line.in_one_line(&chunk)
                {
                    line.merge(chunk);
                    continue 'next;
                }
            }
            lines.push(chunk);
        }
        lines
    }

    fn can_merge(&self, existing: &TextChunk, candidate: &TextChunk) -> bool {
        if existing.pagination != candidate.pagination {
            return false;
        }
        if !existing.direction.compatible(candidate.direction) {
            return false;
        }
        if existing.direction == Direction::Rotated || candidate.direction == Direction::Rotated {
            return self.can_merge_rotated(existing, candidate);
        }
        if existing.direction.is_vertical() || candidate.direction.is_vertical() {
            return self.can_merge_vertical(existing, candidate);
        }

        if !existing.in_one_line(candidate) {
            return false;
        }

        // Captions share a visual line with their source credit but must
        // stay separate chunks.
        if splits_caption(existing, candidate) {
            return false;
        }

        let gap = horizontal_gap(existing, candidate);
        gap <= self.gap_allowance(existing)
    }

    fn gap_allowance(&self, existing: &TextChunk) -> f32 {
        let space = existing.width_of_space();
        let mut delta = space * self.merge_space_count / 2.0;
        if existing.starts_with_bullet() {
            delta += space * thresholds::BULLET_EXTRA_SPACES;
        }
        delta
    }

    fn can_merge_rotated(&self, existing: &TextChunk, candidate: &TextChunk) -> bool {
        let a = existing.rotation();
        let b = candidate.rotation();
        let diff = (a - b).abs();
        let aligned = diff <= thresholds::ROTATION_TOLERANCE_DEG
            || (a.abs() > 45.0 && b.abs() > 45.0 && diff <= thresholds::ROTATION_TOLERANCE_WIDE_DEG);
        if !aligned {
            return false;
        }
        let space = existing.width_of_space().max(1.0);
        centers_within(existing, candidate, space * self.merge_space_count * 2.0)
    }

    fn can_merge_vertical(&self, existing: &TextChunk, candidate: &TextChunk) -> bool {
        let half_width = existing.most_common_text_width().max(1.0) / 2.0;
        if (existing.bounds.center_x() - candidate.bounds.center_x()).abs() > half_width {
            return false;
        }
        let gap = vertical_gap(existing, candidate);
        gap <= self.gap_allowance(existing)
    }
}

fn horizontal_gap(a: &TextChunk, b: &TextChunk) -> f32 {
    if b.bounds.left() >= a.bounds.right() {
        b.bounds.left() - a.bounds.right()
    } else if a.bounds.left() >= b.bounds.right() {
        a.bounds.left() - b.bounds.right()
    } else {
        0.0
    }
}

fn vertical_gap(a: &TextChunk, b: &TextChunk) -> f32 {
    if b.bounds.top() >= a.bounds.bottom() {
        b.bounds.top() - a.bounds.bottom()
    } else if a.bounds.top() >= b.bounds.bottom() {
        a.bounds.top() - b.bounds.bottom()
    } else {
        0.0
    }
}

fn centers_within(a: &TextChunk, b: &TextChunk, limit: f32) -> bool {
    let dx = a.bounds.center_x() - b.bounds.center_x();
    let dy = a.bounds.center_y() - b.bounds.center_y();
    (dx * dx + dy * dy).sqrt() <= limit
}

fn splits_caption(existing: &TextChunk, candidate: &TextChunk) -> bool {
    let left = existing.text();
    let right = candidate.text();
    if patterns::is_source_credit(&right) && !patterns::is_source_credit(&left) {
        return true;
    }
    if patterns::is_source_credit(&left) && !patterns::is_source_credit(&right) {
        return true;
    }
    patterns::is_caption_begin(&left) && patterns::is_source_credit(&right)
}
