//! Paragraph-level text containers.
//!
//! A [`TextBlock`] is an ordered list of line runs treated as one
//! paragraph; [`Paragraph`] wraps a finished block with its page
//! identity and cross-page links.

use crate::geometry::Rect;
use crate::text::patterns::column_count;
use crate::text::{Direction, PaginationType, TextChunk};

/// Per-line classification produced by a [`crate::layout::LineTagger`]
/// or recorded on a block as it is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// First line of a multi-line paragraph
    ParagraphStart,
    /// Interior line of a paragraph
    ParagraphMiddle,
    /// Last line of a paragraph
    ParagraphEnd,
    /// A paragraph of exactly one line
    SingleLineParagraph,
    /// Page header line
    Header,
    /// Page footer line
    Footer,
}

/// Stable identity of a paragraph within a document: page number plus
/// the paragraph's index on that page.
pub type ParagraphId = (u32, usize);

/// An ordered list of line runs forming one paragraph.
#[derive(Debug, Clone)]
pub struct TextBlock {
    lines: Vec<TextChunk>,
    bounds: Rect,
    direction: Direction,
    column_count: usize,
    last_line_tag: Option<LineTag>,
}

impl TextBlock {
    /// Open a block with its first line.
    pub fn new(line: TextChunk) -> Self {
        let bounds = line.bounds;
        let direction = line.direction;
        let column_count = column_count(&line.text());
        TextBlock {
            lines: vec![line],
            bounds,
            direction,
            column_count,
            last_line_tag: None,
        }
    }

    /// Append a line to the block.
    ///
    /// A line sharing the last line's baseline is folded into it instead
    /// of starting a new row.
    pub fn push_line(&mut self, line: TextChunk) {
        self.bounds = self.bounds.union(&line.bounds);
        if line.direction != Direction::Unknown && line.direction != self.direction {
            self.direction = Direction::Unknown;
        }
        self.column_count = self.column_count.max(column_count(&line.text()));
        match self.lines.last_mut() {
            Some(last) if last.in_one_line(&line) => last.merge(line),
            _ => self.lines.push(line),
        }
    }

    /// The block's lines, top to bottom.
    pub fn lines(&self) -> &[TextChunk] {
        &self.lines
    }

    /// Number of lines in the block.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The first line.
    pub fn first_line(&self) -> &TextChunk {
        &self.lines[0]
    }

    /// The last line.
    pub fn last_line(&self) -> &TextChunk {
        self.lines.last().unwrap_or(&self.lines[0])
    }

    /// Bounding rectangle of all lines.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Dominant reading direction of the lines.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of visual columns seen on any line of the block.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Concatenated text of all lines, in reading order.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text()).collect()
    }

    /// Whether every line is whitespace.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.is_blank())
    }

    /// Whether `chunk` sits on the same text line as the block's last line.
    pub fn in_one_line(&self, chunk: &TextChunk) -> bool {
        self.last_line().in_one_line(chunk)
    }

    /// Mean vertical gap between consecutive lines.
    ///
    /// Single-line and columnar blocks report a nominal spacing derived
    /// from the first line's height.
    pub fn line_spacing(&self) -> f32 {
        if self.lines.len() == 1 || self.column_count >= 2 {
            return self.first_line().bounds.height * 1.2;
        }
        let total: f32 = self
            .lines
            .windows(2)
            .map(|w| w[1].bounds.top() - w[0].bounds.bottom())
            .sum();
        total / (self.lines.len() - 1) as f32
    }

    /// Pagination classification of the block, taken from its lines.
    pub fn pagination(&self) -> PaginationType {
        self.lines
            .iter()
            .map(|l| l.pagination)
            .find(|p| p.is_pagination())
            .unwrap_or(PaginationType::None)
    }

    /// Record the tag the block's last line merged under.
    pub fn set_last_line_tag(&mut self, tag: LineTag) {
        self.last_line_tag = Some(tag);
    }

    /// The tag the block's last line merged under, if any.
    pub fn last_line_tag(&self) -> Option<LineTag> {
        self.last_line_tag
    }
}

/// A finished paragraph bound to its page.
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// One-based page number the paragraph belongs to.
    pub page_number: u32,
    /// Index of the paragraph on its page, in reading order.
    pub pid: usize,
    /// Sequential number over the whole document, assigned once the
    /// pages have been linked. Zero until then.
    pub seq: usize,
    /// Index of the text region the paragraph came from.
    pub group_index: usize,
    /// Covering chart or table caption key, when the paragraph sits
    /// inside a detected figure region.
    pub cover: Option<String>,
    /// Link to the continuation on the next page.
    pub cross_page_next: Option<ParagraphId>,
    /// Link to the continued paragraph on the previous page.
    pub cross_page_prev: Option<ParagraphId>,
    block: TextBlock,
}

impl Paragraph {
    /// Bind a finished block to its page.
    pub fn new(page_number: u32, pid: usize, block: TextBlock) -> Self {
        Paragraph {
            page_number,
            pid,
            seq: 0,
            group_index: 0,
            cover: None,
            cross_page_next: None,
            cross_page_prev: None,
            block,
        }
    }

    /// The paragraph's document-wide identifier.
    pub fn id(&self) -> ParagraphId {
        (self.page_number, self.pid)
    }

    /// The underlying text block.
    pub fn block(&self) -> &TextBlock {
        &self.block
    }

    /// Mutable access to the underlying text block.
    pub fn block_mut(&mut self) -> &mut TextBlock {
        &mut self.block
    }

    /// The paragraph's text.
    pub fn text(&self) -> String {
        self.block.text()
    }

    /// The paragraph's bounding rectangle.
    pub fn bounds(&self) -> Rect {
        self.block.bounds()
    }

    /// Whether the paragraph is all whitespace.
    pub fn is_blank(&self) -> bool {
        self.block.is_blank()
    }

    /// Pagination classification inherited from the block.
    pub fn pagination(&self) -> PaginationType {
        self.block.pagination()
    }

    /// Whether the paragraph continues onto another page in either
    /// direction.
    pub fn is_cross_page(&self) -> bool {
        self.cross_page_next.is_some() || self.cross_page_prev.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextElement;

    fn line(x: f32, y: f32, text: &str) -> TextChunk {
        let mut elements = Vec::new();
        for (i, c) in text.chars().enumerate() {
            elements.push(TextElement::new(
                Rect::new(x + i as f32 * 10.0, y, 10.0, 10.0),
                &c.to_string(),
                "F1",
                10.0,
            ));
        }
        TextChunk::from_elements(elements)
    }

    #[test]
    fn test_push_line_grows_bounds() {
        let mut block = TextBlock::new(line(100.0, 100.0, "第一行文字"));
        block.push_line(line(100.0, 114.0, "第二行文字"));
        assert_eq!(block.line_count(), 2);
        assert!((block.bounds().bottom() - 124.0).abs() < 0.01);
        assert_eq!(block.text(), "第一行文字第二行文字");
    }

    #[test]
    fn test_same_baseline_folds_into_last_line() {
        let mut block = TextBlock::new(line(100.0, 100.0, "left"));
        block.push_line(line(300.0, 100.0, "right"));
        assert_eq!(block.line_count(), 1);
    }

    #[test]
    fn test_line_spacing_mean() {
        let mut block = TextBlock::new(line(100.0, 100.0, "一二三"));
        block.push_line(line(100.0, 114.0, "四五六"));
        block.push_line(line(100.0, 130.0, "七八九"));
        // Gaps are 4 and 6.
        assert!((block.line_spacing() - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_columnar_text_detected() {
        let block = TextBlock::new(line(100.0, 100.0, "营收     1200"));
        assert!(block.column_count() >= 2);
    }

    #[test]
    fn test_paragraph_identity() {
        let p = Paragraph::new(3, 7, TextBlock::new(line(0.0, 0.0, "x")));
        assert_eq!(p.id(), (3, 7));
        assert!(!p.is_cross_page());
    }
}
