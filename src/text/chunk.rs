//! Ordered, mergeable runs of glyphs sharing a reading direction.

use std::collections::HashMap;

use crate::config::thresholds;
use crate::geometry::Rect;
use crate::utils::feq;

use super::element::{TextElement, TextStyle};
use super::patterns;

/// Reading direction of a glyph run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Left to right
    Ltr,
    /// Right to left
    Rtl,
    /// Vertical, reading upward
    VerticalUp,
    /// Vertical, reading downward
    VerticalDown,
    /// Rotated off-axis by an arbitrary angle
    Rotated,
    /// Not yet determined (single glyph)
    #[default]
    Unknown,
}

impl Direction {
    /// Whether two directions can coexist in one run.
    ///
    /// `Unknown` is compatible with everything; a single glyph has no
    /// direction of its own.
    pub fn compatible(self, other: Direction) -> bool {
        self == Direction::Unknown || other == Direction::Unknown || self == other
    }

    /// Whether the run is vertical.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::VerticalUp | Direction::VerticalDown)
    }

    /// Whether the run reads along the horizontal axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Ltr | Direction::Rtl)
    }
}

/// Pagination classification of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationType {
    /// Body content
    #[default]
    None,
    /// Page header band
    Header,
    /// Page footer band
    Footer,
    /// Vertical margin text on the left edge
    LeftWing,
    /// Vertical margin text on the right edge
    RightWing,
}

impl PaginationType {
    /// Whether this run belongs to a pagination band rather than the body.
    pub fn is_pagination(self) -> bool {
        self != PaginationType::None
    }
}

/// An ordered run of [`TextElement`]s sharing a reading direction.
///
/// Carries the aggregate metrics the merge cascade consumes: dominant font
/// size and name, visible text bounds, pagination classification.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// Elements in reading order
    pub elements: Vec<TextElement>,
    /// Reading direction
    pub direction: Direction,
    /// Union of element bounds
    pub bounds: Rect,
    /// Pagination classification, written by the frame detector
    pub pagination: PaginationType,
    /// Encounter order within the page, used for stable grouping
    pub group_index: usize,
}

impl Default for TextChunk {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            direction: Direction::Unknown,
            bounds: Rect::ZERO,
            pagination: PaginationType::None,
            group_index: 0,
        }
    }
}

impl TextChunk {
    /// Create a run from its first element.
    pub fn new(element: TextElement) -> Self {
        let mut chunk = Self {
            elements: Vec::new(),
            direction: Direction::Unknown,
            bounds: element.bounds,
            pagination: PaginationType::None,
            group_index: 0,
        };
        chunk.direction = initial_direction(&element);
        chunk.elements.push(element);
        chunk
    }

    /// Create a run from elements already in reading order.
    pub fn from_elements(elements: Vec<TextElement>) -> Self {
        let mut iter = elements.into_iter();
        let first = match iter.next() {
            Some(el) => el,
            None => return Self::default(),
        };
        let mut chunk = Self::new(first);
        for el in iter {
            chunk.push(el);
        }
        chunk
    }

    /// Append an element, synthesizing a space when the gap warrants one.
    pub fn push(&mut self, element: TextElement) {
        if let Some(last) = self.last_real_element().cloned() {
            if self.direction == Direction::Unknown {
                self.direction = infer_direction(&last, &element);
            }
            if !self.direction.is_vertical() && self.direction != Direction::Rotated {
                if let Some(space) = synthesize_space(&last, &element) {
                    self.bounds = self.bounds.union(&space.bounds);
                    self.elements.push(space);
                }
            }
        }
        self.bounds = self.bounds.union(&element.bounds);
        self.elements.push(element);
    }

    fn last_real_element(&self) -> Option<&TextElement> {
        self.elements.iter().rev().find(|e| !e.deleted)
    }

    /// Marked-content identifier of the run, taken from its first element.
    pub fn mcid(&self) -> Option<i32> {
        self.elements.first().and_then(|e| e.mcid)
    }

    /// Concatenated text, skipping shadow-merged elements.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter(|e| !e.deleted)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Whether the run draws only whitespace.
    pub fn is_blank(&self) -> bool {
        self.elements.iter().all(|e| e.deleted || e.is_blank())
    }

    /// Whether every element is hidden.
    pub fn is_hidden(&self) -> bool {
        self.elements.iter().all(|e| e.hidden)
    }

    /// Union of visible bounds over non-hidden elements.
    pub fn visible_bounds(&self) -> Rect {
        let mut rect: Option<Rect> = None;
        for el in self.elements.iter().filter(|e| !e.hidden && !e.deleted) {
            rect = Some(match rect {
                Some(r) => r.union(&el.visible_bounds),
                None => el.visible_bounds,
            });
        }
        rect.unwrap_or(self.bounds)
    }

    /// Left edge of the first non-blank element.
    pub fn text_left(&self) -> f32 {
        self.elements
            .iter()
            .find(|e| !e.deleted && !e.is_blank())
            .map(|e| e.visible_bounds.left())
            .unwrap_or_else(|| self.bounds.left())
    }

    /// Right edge of the last non-blank element.
    pub fn text_right(&self) -> f32 {
        self.elements
            .iter()
            .rev()
            .find(|e| !e.deleted && !e.is_blank())
            .map(|e| e.visible_bounds.right())
            .unwrap_or_else(|| self.bounds.right())
    }

    /// Baseline rotation of the run in degrees.
    pub fn rotation(&self) -> f32 {
        self.elements
            .iter()
            .find(|e| !e.deleted && !e.is_blank())
            .map(|e| e.rotation)
            .unwrap_or(0.0)
    }

    /// Dominant font size over non-blank elements.
    pub fn most_common_font_size(&self) -> f32 {
        self.mode_by(|e| (e.font_size * 10.0).round() as i64)
            .map(|e| e.font_size)
            .unwrap_or(0.0)
    }

    /// Dominant effective style size over non-blank elements.
    pub fn most_common_style_size(&self) -> f32 {
        self.mode_by(|e| (e.style_size * 10.0).round() as i64)
            .map(|e| e.style_size)
            .unwrap_or(0.0)
    }

    /// Dominant font name over non-blank elements.
    pub fn most_common_font_name(&self) -> Option<&str> {
        self.mode_by(|e| {
            let mut hash: i64 = 0;
            for b in e.font_name.bytes() {
                hash = hash.wrapping_mul(31).wrapping_add(b as i64);
            }
            hash
        })
        .map(|e| e.font_name.as_str())
    }

    /// Dominant per-glyph height over non-blank elements.
    pub fn most_common_text_height(&self) -> f32 {
        self.mode_by(|e| (e.text_height() * 10.0).round() as i64)
            .map(|e| e.text_height())
            .unwrap_or(0.0)
    }

    /// Dominant per-glyph width over non-blank elements.
    pub fn most_common_text_width(&self) -> f32 {
        self.mode_by(|e| (e.text_width() * 10.0).round() as i64)
            .map(|e| e.text_width())
            .unwrap_or(0.0)
    }

    /// Dominant style flags over non-blank elements.
    pub fn most_common_style(&self) -> TextStyle {
        self.mode_by(|e| e.style.bits() as i64)
            .map(|e| e.style)
            .unwrap_or_default()
    }

    fn mode_by<F: Fn(&TextElement) -> i64>(&self, key: F) -> Option<&TextElement> {
        let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();
        for (i, el) in self.elements.iter().enumerate() {
            if el.deleted || el.is_blank() {
                continue;
            }
            let entry = counts.entry(key(el)).or_insert((0, i));
            entry.0 += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, (count, idx))| (*count, usize::MAX - *idx))
            .map(|(_, (_, idx))| &self.elements[idx])
    }

    /// Largest nominal font size in the run.
    pub fn max_font_size(&self) -> f32 {
        self.elements
            .iter()
            .filter(|e| !e.deleted)
            .map(|e| e.font_size)
            .fold(0.0, f32::max)
    }

    /// Whether every non-blank glyph in the run is bold.
    pub fn is_bold(&self) -> bool {
        let mut any = false;
        for e in self.elements.iter().filter(|e| !e.deleted && !e.is_blank()) {
            if !e.is_bold() {
                return false;
            }
            any = true;
        }
        any
    }

    /// Display width of one space in the run's dominant font.
    pub fn width_of_space(&self) -> f32 {
        let sw = self
            .mode_by(|e| (e.space_width * 10.0).round() as i64)
            .map(|e| e.space_width)
            .unwrap_or(0.0);
        if sw > 0.0 {
            sw
        } else {
            self.most_common_font_size() / 4.0
        }
    }

    /// Whether `other` sits on the same text line as this run.
    ///
    /// Lines are matched on their baselines: the bottoms must agree within
    /// two fifths of the smaller line's glyph height.
    pub fn in_one_line(&self, other: &TextChunk) -> bool {
        if !self.direction.compatible(other.direction) {
            return false;
        }
        let min_height = self
            .most_common_text_height()
            .min(other.most_common_text_height());
        if min_height <= 0.0 {
            return false;
        }
        (self.visible_bounds().bottom() - other.visible_bounds().bottom()).abs()
            <= min_height * 2.0 / 5.0
    }

    /// Whether two runs share visual style: equal glyph height within
    /// tolerance and identical dominant style flags.
    pub fn has_same_style(&self, other: &TextChunk) -> bool {
        feq(
            self.most_common_text_height(),
            other.most_common_text_height(),
            thresholds::TEXT_HEIGHT_TOLERANCE,
        ) && self.most_common_style() == other.most_common_style()
    }

    /// Whether the run's text starts with a bullet marker.
    pub fn starts_with_bullet(&self) -> bool {
        patterns::is_bullet_start(&self.text())
    }

    /// A copy of this run shifted by `(dx, dy)` in display space.
    ///
    /// Used to re-base a next-page line onto the previous page's baseline
    /// when testing cross-page continuation.
    pub fn translated(&self, dx: f32, dy: f32) -> TextChunk {
        let mut out = self.clone();
        out.bounds.x += dx;
        out.bounds.y += dy;
        for el in &mut out.elements {
            el.bounds.x += dx;
            el.bounds.y += dy;
            el.visible_bounds.x += dx;
            el.visible_bounds.y += dy;
        }
        out
    }

    /// Merge `other` into this run.
    ///
    /// When `other` lies before this run in reading order its elements are
    /// prepended, otherwise appended; either way a synthetic space covers the
    /// joint when the gap warrants one.
    pub fn merge(&mut self, other: TextChunk) {
        if self.elements.is_empty() {
            *self = other;
            return;
        }
        if self.direction == Direction::Unknown {
            self.direction = other.direction;
        }
        let before = match self.direction {
            Direction::Rtl => other.bounds.left() >= self.bounds.right() - 0.5,
            Direction::VerticalUp => other.bounds.top() >= self.bounds.bottom() - 0.5,
            Direction::VerticalDown => other.bounds.bottom() <= self.bounds.top() + 0.5,
            _ => other.bounds.right() <= self.bounds.left() + 0.5,
        };
        self.group_index = self.group_index.min(other.group_index);
        if before {
            let tail = std::mem::take(&mut self.elements);
            let dir = self.direction;
            self.elements = other.elements;
            self.bounds = other.bounds;
            for el in tail {
                self.push(el);
            }
            self.direction = dir;
        } else {
            for el in other.elements {
                self.push(el);
            }
        }
    }

    /// Fold a shadow duplicate of this run into it.
    ///
    /// Fake-bold output draws glyph runs twice with a sub-point offset.
    /// Returns true when `other` was recognized as a shadow; the receiving
    /// elements gain the bold flag.
    pub fn merge_shadow(&mut self, other: &TextChunk) -> bool {
        let ours: Vec<usize> = (0..self.elements.len())
            .filter(|&i| !self.elements[i].deleted && !self.elements[i].is_blank())
            .collect();
        let theirs: Vec<&TextElement> = other
            .elements
            .iter()
            .filter(|e| !e.deleted && !e.is_blank())
            .collect();
        if ours.is_empty() || ours.len() != theirs.len() {
            return false;
        }
        for (&i, them) in ours.iter().zip(theirs.iter()) {
            if !self.elements[i].is_shadow_of(them) {
                return false;
            }
        }
        for i in ours {
            self.elements[i].style |= TextStyle::BOLD;
        }
        true
    }
}

fn initial_direction(element: &TextElement) -> Direction {
    let r = element.rotation;
    // Display space is y-down: a baseline pointing up the page has a
    // rotation of -90 degrees.
    if r.abs() < f32::EPSILON {
        Direction::Unknown
    } else if (r + 90.0).abs() < 1.0 {
        Direction::VerticalUp
    } else if (r - 90.0).abs() < 1.0 {
        Direction::VerticalDown
    } else {
        Direction::Rotated
    }
}

fn infer_direction(prev: &TextElement, next: &TextElement) -> Direction {
    let by_rotation = initial_direction(prev);
    if by_rotation != Direction::Unknown {
        return by_rotation;
    }
    let dx = next.bounds.center_x() - prev.bounds.center_x();
    let dy = next.bounds.center_y() - prev.bounds.center_y();
    if dy.abs() > dx.abs() && dy.abs() > prev.text_height() / 2.0 {
        if dy > 0.0 {
            Direction::VerticalDown
        } else {
            Direction::VerticalUp
        }
    } else if dx < 0.0 {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// Synthesize a space element for the gap between two horizontal neighbors.
fn synthesize_space(prev: &TextElement, next: &TextElement) -> Option<TextElement> {
    if prev.is_blank() || next.is_blank() {
        return None;
    }
    let gap = next.bounds.left() - prev.bounds.right();
    let space_width = if next.space_width > 0.0 {
        next.space_width
    } else {
        prev.space_width
    };
    if space_width <= 0.0 || gap <= space_width * 0.5 {
        return None;
    }
    let count = (gap / space_width).round() as usize;
    // A CJK pair with a sub-double gap is letter spacing, not a word break.
    if prev.is_cjk() && next.is_cjk() && count < 2 {
        return None;
    }
    if count == 0 {
        return None;
    }
    let mut space = TextElement::mock_space(prev, gap);
    if count > 3 {
        space.text = " ".repeat(count.min(10));
    }
    Some(space)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(text: &str, x: f32, w: f32) -> TextElement {
        let mut e = TextElement::new(Rect::new(x, 100.0, w, 12.0), text, "F1", 12.0);
        e.space_width = 3.0;
        e
    }

    #[test]
    fn test_direction_inference() {
        let mut chunk = TextChunk::new(el("a", 0.0, 6.0));
        assert_eq!(chunk.direction, Direction::Unknown);
        chunk.push(el("b", 6.0, 6.0));
        assert_eq!(chunk.direction, Direction::Ltr);
    }

    #[test]
    fn test_space_synthesis() {
        let mut chunk = TextChunk::new(el("a", 0.0, 6.0));
        chunk.push(el("b", 10.0, 6.0)); // gap 4.0 > 1.5 = half space width
        assert_eq!(chunk.text(), "a b");
    }

    #[test]
    fn test_no_space_for_tight_gap() {
        let mut chunk = TextChunk::new(el("a", 0.0, 6.0));
        chunk.push(el("b", 7.0, 6.0)); // gap 1.0 < 1.5
        assert_eq!(chunk.text(), "ab");
    }

    #[test]
    fn test_cjk_pair_suppresses_single_space() {
        let mut chunk = TextChunk::new(el("中", 0.0, 12.0));
        chunk.push(el("文", 16.0, 12.0)); // gap 4.0, count 1
        assert_eq!(chunk.text(), "中文");
    }

    #[test]
    fn test_merge_prepends_left_chunk() {
        let mut right = TextChunk::from_elements(vec![el("c", 20.0, 6.0), el("d", 26.0, 6.0)]);
        let left = TextChunk::from_elements(vec![el("a", 0.0, 6.0), el("b", 6.0, 6.0)]);
        right.merge(left);
        assert!(right.text().starts_with("ab"));
        assert_eq!(right.bounds.left(), 0.0);
        assert_eq!(right.bounds.right(), 32.0);
    }

    #[test]
    fn test_text_left_right_skip_blanks() {
        let mut chunk = TextChunk::new(el(" ", 0.0, 3.0));
        chunk.push(el("x", 3.0, 6.0));
        chunk.push(el(" ", 9.0, 3.0));
        assert_eq!(chunk.text_left(), 3.0);
        assert_eq!(chunk.text_right(), 9.0);
    }

    #[test]
    fn test_in_one_line() {
        let a = TextChunk::from_elements(vec![el("a", 0.0, 6.0), el("b", 6.0, 6.0)]);
        let b = TextChunk::from_elements(vec![el("c", 40.0, 6.0), el("d", 46.0, 6.0)]);
        assert!(a.in_one_line(&b));
        let mut low = el("e", 80.0, 6.0);
        low.bounds.y = 120.0;
        low.visible_bounds = low.bounds;
        let c = TextChunk::from_elements(vec![low.clone(), {
            let mut f = low.clone();
            f.bounds.x = 86.0;
            f.visible_bounds = f.bounds;
            f
        }]);
        assert!(!a.in_one_line(&c));
    }

    #[test]
    fn test_dominant_metrics() {
        let mut chunk = TextChunk::new(el("a", 0.0, 6.0));
        let mut big = el("T", 6.0, 10.0);
        big.font_size = 18.0;
        big.bounds.height = 18.0;
        big.visible_bounds = big.bounds;
        chunk.push(big);
        chunk.push(el("b", 20.0, 6.0));
        assert_eq!(chunk.most_common_font_size(), 12.0);
        assert_eq!(chunk.most_common_font_name(), Some("F1"));
    }

    #[test]
    fn test_merge_shadow_sets_bold() {
        let mut chunk = TextChunk::from_elements(vec![el("a", 0.0, 6.0), el("b", 6.0, 6.0)]);
        let shadow = TextChunk::from_elements(vec![el("a", 0.2, 6.0), el("b", 6.2, 6.0)]);
        assert!(chunk.merge_shadow(&shadow));
        assert!(chunk.elements[0].is_bold());
        let other = TextChunk::from_elements(vec![el("x", 0.2, 6.0), el("b", 6.2, 6.0)]);
        assert!(!chunk.merge_shadow(&other));
    }
}
