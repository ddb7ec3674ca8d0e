//! Groups lines into paragraphs.
//!
//! Within a text region, adjacent lines are folded into [`TextBlock`]s
//! either by the merge rule cascade or, when a [`LineTagger`] is
//! installed, by the tagger's per-line labels.

use log::trace;

use crate::config::LayoutConfig;
use crate::layout::block::{LineTag, TextBlock};
use crate::layout::group::TextGroup;
use crate::layout::rules::{default_rules, MergeContext, MergeRule, Verdict};
use crate::text::{TextChunk, TextChunkMerger};

/// Labels each line of a region with a [`LineTag`].
///
/// Implementations range from sequence models to hand-written
/// heuristics; the merger only requires one tag per input line.
pub trait LineTagger {
    /// Tagger name for tracing.
    fn name(&self) -> &'static str;
    /// One tag per line, in order. Must return `lines.len()` tags.
    fn tag(&self, lines: &[TextChunk]) -> Vec<LineTag>;
}

/// Folds the lines of a text region into paragraphs.
pub struct ParagraphMerger {
    rules: Vec<Box<dyn MergeRule + Send + Sync>>,
    chunk_merger: TextChunkMerger,
    tagger: Option<Box<dyn LineTagger + Send + Sync>>,
    align_tolerance: f32,
    font_size_hard_gap: f32,
}

impl ParagraphMerger {
    /// Creates a merger running the default rule cascade.
    pub fn new(config: &LayoutConfig) -> Self {
        ParagraphMerger {
            rules: default_rules(),
            chunk_merger: TextChunkMerger::new(config),
            tagger: None,
            align_tolerance: config.align_tolerance,
            font_size_hard_gap: config.font_size_hard_gap,
        }
    }

    /// Installs a line tagger; tagged regions bypass the rule cascade.
    pub fn with_tagger(mut self, tagger: Box<dyn LineTagger + Send + Sync>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Whether a line tagger is installed.
    pub fn has_tagger(&self) -> bool {
        self.tagger.is_some()
    }

    /// Builds the paragraphs of one text region.
    pub fn merge_group(&self, group: &TextGroup) -> Vec<TextBlock> {
        let lines = self.chunk_merger.merge_to_line(group.chunks().to_vec());
        if lines.is_empty() {
            return Vec::new();
        }
        match &self.tagger {
            Some(tagger) => {
                let tags = tagger.tag(&lines);
                debug_assert_eq!(tags.len(), lines.len());
                self.merge_by_tags(lines, &tags)
            }
            None => self.merge_by_rules(lines, group),
        }
    }

    fn merge_by_rules(&self, lines: Vec<TextChunk>, group: &TextGroup) -> Vec<TextBlock> {
        let mut blocks: Vec<TextBlock> = Vec::new();
        let mut block_left = f32::MAX;
        let mut block_right = f32::MIN;
        for i in 0..lines.len() {
            let line = &lines[i];
            let Some(block) = blocks.last() else {
                block_left = line.text_left();
                block_right = line.text_right();
                blocks.push(TextBlock::new(line.clone()));
                continue;
            };
            let lookahead = lines.get(i + 1).unwrap_or(line);
            let mut cx = MergeContext::new(block, line, lookahead, group, block_left, block_right);
            cx.align_tolerance = self.align_tolerance;
            cx.font_size_hard_gap = self.font_size_hard_gap;
            if self.decide(&cx) == Verdict::Merge {
                block_left = block_left.min(line.text_left());
                block_right = block_right.max(line.text_right());
                blocks.last_mut().unwrap().push_line(line.clone());
            } else {
                block_left = line.text_left();
                block_right = line.text_right();
                blocks.push(TextBlock::new(line.clone()));
            }
        }
        blocks
    }

    fn decide(&self, cx: &MergeContext<'_>) -> Verdict {
        for rule in &self.rules {
            match rule.apply(cx) {
                Verdict::Undecided => continue,
                verdict => {
                    trace!("merge rule {} -> {:?}", rule.name(), verdict);
                    return verdict;
                }
            }
        }
        Verdict::Merge
    }

    /// Folds lines by their tags: a middle or end line continues the
    /// open paragraph, as does a single-line tag right after a middle
    /// (taggers sometimes mislabel a final wrapped fragment).
    fn merge_by_tags(&self, lines: Vec<TextChunk>, tags: &[LineTag]) -> Vec<TextBlock> {
        let mut blocks: Vec<TextBlock> = Vec::new();
        for (line, &tag) in lines.into_iter().zip(tags) {
            let continues = match blocks.last().and_then(|b| b.last_line_tag()) {
                Some(LineTag::ParagraphMiddle) => matches!(
                    tag,
                    LineTag::ParagraphMiddle
                        | LineTag::ParagraphEnd
                        | LineTag::SingleLineParagraph
                ),
                Some(_) => matches!(tag, LineTag::ParagraphMiddle | LineTag::ParagraphEnd),
                None => false,
            };
            if continues {
                let block = blocks.last_mut().unwrap();
                block.push_line(line);
                block.set_last_line_tag(if tag == LineTag::ParagraphEnd {
                    LineTag::ParagraphEnd
                } else {
                    LineTag::ParagraphMiddle
                });
            } else {
                let mut block = TextBlock::new(line);
                block.set_last_line_tag(tag);
                blocks.push(block);
            }
        }
        blocks
    }

    /// Decides whether the first line of a page continues the last
    /// paragraph of the previous page.
    ///
    /// The candidate is re-based directly under the paragraph's last
    /// line so the cascade's vertical spacing rules see an in-flow gap.
    pub fn can_merge_cross_page(
        &self,
        prev_block: &TextBlock,
        next_first: &TextChunk,
        group: &TextGroup,
    ) -> bool {
        let prev = prev_block.last_line();
        let dy = prev.bounds.bottom() + prev.most_common_text_height() - next_first.bounds.top();
        let moved = next_first.translated(0.0, dy);
        let (mut left, mut right) = (f32::MAX, f32::MIN);
        for line in prev_block.lines() {
            left = left.min(line.text_left());
            right = right.max(line.text_right());
        }
        let mut cx = MergeContext::new(prev_block, &moved, &moved, group, left, right);
        cx.align_tolerance = self.align_tolerance;
        cx.font_size_hard_gap = self.font_size_hard_gap;
        self.decide(&cx) == Verdict::Merge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::text::TextElement;

    fn line(x: f32, y: f32, glyphs: &[char], size: f32) -> TextChunk {
        let mut elements = Vec::new();
        for (i, &ch) in glyphs.iter().enumerate() {
            let gx = x + i as f32 * size;
            elements.push(TextElement::new(
                Rect::new(gx, y, size, size),
                ch.to_string(),
                "F1",
                size,
            ));
        }
        TextChunk::from_elements(elements)
    }

    fn cjk_line(x: f32, y: f32, n: usize, size: f32) -> TextChunk {
        let glyphs: Vec<char> = "报告期内公司经营情况良好主要业务稳步推进收入持续增长利润率保持稳定"
            .chars()
            .cycle()
            .take(n)
            .collect();
        line(x, y, &glyphs, size)
    }

    fn group_of(chunks: &[TextChunk]) -> TextGroup {
        let mut g = TextGroup::new(chunks[0].clone());
        for c in &chunks[1..] {
            g.add(c.clone());
        }
        g
    }

    #[test]
    fn test_full_width_lines_merge_into_one_paragraph() {
        // Two body lines spanning the measure, left edges aligned.
        let a = cjk_line(90.0, 100.0, 42, 10.5);
        let b = cjk_line(90.0, 113.0, 42, 10.5);
        let chunks = vec![a, b];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        let blocks = merger.merge_group(&group);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_count(), 2);
    }

    #[test]
    fn test_font_size_jump_splits_heading_from_body() {
        let heading = cjk_line(90.0, 100.0, 8, 16.0);
        let body = cjk_line(90.0, 125.0, 42, 10.5);
        let chunks = vec![heading, body];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        let blocks = merger.merge_group(&group);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_short_lead_line_stays_alone() {
        // A short line at the region's left edge, then full lines.
        let lead = cjk_line(90.0, 100.0, 6, 10.5);
        let a = cjk_line(90.0, 113.0, 42, 10.5);
        let b = cjk_line(90.0, 126.0, 42, 10.5);
        let chunks = vec![lead, a, b];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        let blocks = merger.merge_group(&group);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line_count(), 1);
        assert_eq!(blocks[1].line_count(), 2);
    }

    #[test]
    fn test_sentence_end_before_narrow_line_splits() {
        // Paragraph closes with a period well short of the measure.
        let mut glyphs: Vec<char> = "公司董事会全体成员保证信息真实".chars().collect();
        glyphs.push('。');
        let closed = line(90.0, 100.0, &glyphs, 10.5);
        let next = cjk_line(130.0, 113.0, 10, 10.5);
        let filler = cjk_line(90.0, 126.0, 42, 10.5);
        let chunks = vec![closed, next, filler.clone()];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        let blocks = merger.merge_group(&group);
        assert!(blocks.len() >= 2);
        assert_eq!(blocks[0].line_count(), 1);
    }

    struct FixedTags(Vec<LineTag>);

    impl LineTagger for FixedTags {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn tag(&self, _lines: &[TextChunk]) -> Vec<LineTag> {
            self.0.clone()
        }
    }

    #[test]
    fn test_tagger_path_groups_by_tags() {
        let a = cjk_line(90.0, 100.0, 20, 10.5);
        let b = cjk_line(90.0, 113.0, 20, 10.5);
        let c = cjk_line(90.0, 126.0, 20, 10.5);
        let d = cjk_line(90.0, 139.0, 20, 10.5);
        let chunks = vec![a, b, c, d];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default()).with_tagger(Box::new(
            FixedTags(vec![
                LineTag::ParagraphStart,
                LineTag::ParagraphMiddle,
                LineTag::ParagraphEnd,
                LineTag::SingleLineParagraph,
            ]),
        ));
        let blocks = merger.merge_group(&group);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line_count(), 3);
        assert_eq!(blocks[0].last_line_tag(), Some(LineTag::ParagraphEnd));
        assert_eq!(blocks[1].line_count(), 1);
    }

    #[test]
    fn test_single_line_after_middle_continues_paragraph() {
        let a = cjk_line(90.0, 100.0, 20, 10.5);
        let b = cjk_line(90.0, 113.0, 20, 10.5);
        let c = cjk_line(90.0, 126.0, 20, 10.5);
        let chunks = vec![a, b, c];
        let group = group_of(&chunks);
        let merger = ParagraphMerger::new(&LayoutConfig::default()).with_tagger(Box::new(
            FixedTags(vec![
                LineTag::ParagraphStart,
                LineTag::ParagraphMiddle,
                LineTag::SingleLineParagraph,
            ]),
        ));
        let blocks = merger.merge_group(&group);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_count(), 3);
    }

    #[test]
    fn test_cross_page_continuation_merges() {
        let prev = cjk_line(90.0, 780.0, 42, 10.5);
        let block = TextBlock::new(prev);
        let next = cjk_line(90.0, 80.0, 42, 10.5);
        let group = group_of(block.lines());
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        assert!(merger.can_merge_cross_page(&block, &next, &group));
    }
}
