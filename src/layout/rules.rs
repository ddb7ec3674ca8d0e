//! The paragraph-merge rule cascade.
//!
//! Each rule looks at the paragraph built so far, the candidate line,
//! one line of lookahead, and the enclosing text region, and returns a
//! [`Verdict`]. Rules run in a fixed order; the first decisive verdict
//! wins and the cascade's default is to merge. The thresholds live in
//! [`crate::config::thresholds`] and were fitted against financial
//! report corpora.

use crate::config::thresholds::{
    BODY_LEFT_REACH, BODY_RIGHT_REACH, CENTER_TOLERANCE, RIGHT_ALIGN_TOLERANCE, TITLE_MAX_BOTTOM,
    TITLE_PAIR_MAX_BOTTOM, TITLE_STRICT_MAX_BOTTOM,
};
use crate::layout::block::TextBlock;
use crate::layout::group::TextGroup;
use crate::text::patterns;
use crate::text::TextChunk;
use crate::utils::feq;

/// Outcome of one merge rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate line continues the current paragraph.
    Merge,
    /// The candidate line starts a new paragraph.
    Split,
    /// This rule has no opinion; fall through to the next.
    Undecided,
}

/// Everything a rule may consult for one merge decision.
pub struct MergeContext<'a> {
    /// Paragraph assembled so far.
    pub block: &'a TextBlock,
    /// Last line of the paragraph.
    pub prev: &'a TextChunk,
    /// Candidate line.
    pub next: &'a TextChunk,
    /// Line after the candidate; equals `next` at end of region.
    pub lookahead: &'a TextChunk,
    /// Enclosing text region.
    pub group: &'a TextGroup,
    /// Running left border of the paragraph.
    pub block_left: f32,
    /// Running right border of the paragraph.
    pub block_right: f32,
    /// Cached text of the whole paragraph.
    pub block_text: String,
    /// Cached text of the last line.
    pub prev_text: String,
    /// Cached text of the candidate.
    pub next_text: String,
    /// Left-edge alignment tolerance, in points.
    pub align_tolerance: f32,
    /// Font size gap above which lines never share a paragraph.
    pub font_size_hard_gap: f32,
}

impl<'a> MergeContext<'a> {
    /// Builds a context for judging `next` against `block` inside `group`.
    pub fn new(
        block: &'a TextBlock,
        next: &'a TextChunk,
        lookahead: &'a TextChunk,
        group: &'a TextGroup,
        block_left: f32,
        block_right: f32,
    ) -> Self {
        let prev = block.last_line();
        MergeContext {
            block,
            prev,
            next,
            lookahead,
            group,
            block_left,
            block_right,
            block_text: block.text(),
            prev_text: prev.text(),
            next_text: next.text(),
            align_tolerance: crate::config::thresholds::LEFT_ALIGN_TOLERANCE,
            font_size_hard_gap: crate::config::thresholds::FONT_SIZE_HARD_GAP,
        }
    }

    fn font_gap(&self) -> f32 {
        (self.prev.max_font_size() - self.next.max_font_size()).abs()
    }

    fn left_gap(&self) -> f32 {
        (self.prev.text_left() - self.next.text_left()).abs()
    }

    fn right_gap(&self) -> f32 {
        (self.prev.text_right() - self.next.text_right()).abs()
    }

    /// How far the candidate tucks under the previous line's left edge.
    fn hanging(&self) -> f32 {
        self.prev.text_left() - self.next.text_left()
    }

    fn space(&self) -> f32 {
        self.next.width_of_space()
    }

    /// Left edges agree, or the candidate hangs back under the previous
    /// line as continuation lines of an indented first line do.
    fn aligned_or_hanging(&self) -> bool {
        self.left_gap() < self.align_tolerance || self.hanging() > self.space() * 2.0
    }

    fn centered(&self, chunk: &TextChunk) -> bool {
        feq(
            chunk.bounds.center_x(),
            self.group.center_x(),
            CENTER_TOLERANCE,
        )
    }

    fn centered_pair(&self) -> bool {
        self.centered(self.prev) && self.centered(self.next)
    }

    /// The previous line runs out to the body's right reach.
    fn full_width(&self) -> bool {
        self.prev.text_right() > BODY_RIGHT_REACH
    }

    fn line_spacing(&self) -> f32 {
        self.next.bounds.top() - self.prev.bounds.bottom()
    }

    fn same_font_name(&self) -> bool {
        self.prev.most_common_font_name() == self.next.most_common_font_name()
    }
}

/// One step of the merge cascade.
pub trait MergeRule {
    /// Rule name for tracing.
    fn name(&self) -> &'static str;
    /// Judges whether the candidate continues the paragraph.
    fn apply(&self, cx: &MergeContext<'_>) -> Verdict;
}

/// Lines with different reading directions or different pagination
/// classifications never share a paragraph.
pub struct IncompatibleLines;

impl MergeRule for IncompatibleLines {
    fn name(&self) -> &'static str {
        "incompatible-lines"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if cx.prev.direction != cx.next.direction {
            return Verdict::Split;
        }
        if cx.prev.pagination != cx.next.pagination {
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// A candidate on the paragraph's current baseline always joins it.
pub struct SameLine;

impl MergeRule for SameLine {
    fn name(&self) -> &'static str {
        "same-line"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if cx.block.in_one_line(cx.next) {
            Verdict::Merge
        } else {
            Verdict::Undecided
        }
    }
}

/// Columnar lines (wide internal gaps) are table text, not prose.
pub struct ColumnarText;

impl MergeRule for ColumnarText {
    fn name(&self) -> &'static str {
        "columnar-text"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if cx.block.column_count() >= 2 || patterns::column_count(&cx.next_text) >= 2 {
            Verdict::Split
        } else {
            Verdict::Undecided
        }
    }
}

/// Font-size jumps between lines.
///
/// A large jump splits unless the pair reads like a centered two-line
/// title (company name over report name). Jumps near two and one point
/// have their own narrower exceptions.
pub struct FontSizeJump;

impl FontSizeJump {
    fn big_jump(&self, cx: &MergeContext<'_>) -> Verdict {
        let t1 = cx.prev_text.trim();
        if patterns::is_company_title(t1)
            && cx.centered_pair()
            && cx.next.bounds.bottom() < TITLE_MAX_BOTTOM
        {
            if patterns::is_latin_text(&cx.next_text) {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        if cx.prev.most_common_font_size() == cx.next.most_common_font_size()
            && (cx.left_gap() < cx.align_tolerance || cx.hanging() > cx.space() * 2.0)
            && cx.full_width()
            && patterns::cjk_char_count(&cx.prev_text) > 25
        {
            return Verdict::Merge;
        }
        Verdict::Split
    }

    fn two_point_jump(&self, cx: &MergeContext<'_>) -> Verdict {
        let t1 = cx.prev_text.trim();
        if patterns::is_company_title(t1)
            && cx.centered_pair()
            && cx.next.bounds.bottom() < TITLE_STRICT_MAX_BOTTOM
        {
            if cx.prev_text.chars().count() + cx.next_text.chars().count() > 48 {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        if cx.prev.most_common_font_size() == cx.next.most_common_font_size()
            && cx.aligned_or_hanging()
            && cx.full_width()
            && patterns::cjk_char_count(&cx.prev_text) > 35
        {
            return Verdict::Merge;
        }
        if patterns::is_company_title(t1) && patterns::is_notice_title(cx.next_text.trim()) {
            return Verdict::Merge;
        }
        Verdict::Split
    }

    fn one_point_jump(&self, cx: &MergeContext<'_>) -> Verdict {
        let t1 = cx.prev_text.trim();
        let t2 = cx.next_text.trim();
        if (patterns::is_catalog_part(&cx.prev_text) || patterns::is_bullet_start(&cx.prev_text))
            && patterns::is_catalog_line(&cx.next_text)
            && cx.left_gap() < cx.align_tolerance
            && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
            && cx.next.text_left() > 80.0
            && cx.next.text_left() < 110.0
            && cx.prev_text.chars().count() > 30
        {
            return Verdict::Merge;
        }
        if patterns::is_long_catalog_line(&cx.next_text)
            && patterns::cjk_char_count(&cx.prev_text) > 35
            && cx.left_gap() < cx.align_tolerance
            && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
        {
            return Verdict::Merge;
        }
        if patterns::is_company_title(t1)
            && cx.centered_pair()
            && cx.next.bounds.bottom() < TITLE_STRICT_MAX_BOTTOM
            && !patterns::has_comma(t2)
        {
            return Verdict::Merge;
        }
        let title_like = cx.prev.is_bold()
            && cx.prev.has_same_style(cx.next)
            && !patterns::has_comma(&cx.prev_text)
            && !patterns::has_comma(&cx.next_text);
        if !title_like {
            // Latin text broken across lines with matched margins.
            if patterns::is_latin_text(&cx.next_text)
                && patterns::is_latin_text(&cx.prev_text)
                && cx.left_gap() < cx.align_tolerance
                && cx.full_width()
                && cx.next.text_left() < BODY_LEFT_REACH
                && cx.prev_text.chars().count() + cx.next_text.chars().count() > 150
                && !patterns::is_paragraph_end(&cx.prev_text)
            {
                return Verdict::Merge;
            }
            return Verdict::Split;
        }
        if cx.next.max_font_size() > cx.prev.max_font_size()
            && cx.prev_text.chars().count() > 20
        {
            return Verdict::Split;
        }
        if cx.centered_pair() {
            if cx.block_text.chars().count() + cx.next_text.chars().count() > 48 {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        Verdict::Split
    }
}

impl MergeRule for FontSizeJump {
    fn name(&self) -> &'static str {
        "font-size-jump"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let gap = cx.font_gap();
        if gap > cx.font_size_hard_gap {
            self.big_jump(cx)
        } else if (gap - 2.0).abs() < 0.2 {
            self.two_point_jump(cx)
        } else if (gap - 1.0).abs() < 0.2 {
            self.one_point_jump(cx)
        } else {
            Verdict::Undecided
        }
    }
}

/// Equal sizes but different styles split, with narrow exceptions for
/// wrapped URLs and aligned full-width continuations.
pub struct StyleMismatch;

impl MergeRule for StyleMismatch {
    fn name(&self) -> &'static str {
        "style-mismatch"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if cx.prev.has_same_style(cx.next) {
            return Verdict::Undecided;
        }
        if patterns::is_url(&cx.prev_text) && !patterns::is_paragraph_end(&cx.prev_text) {
            if cx.same_font_name()
                && !cx.prev.is_bold()
                && !cx.next.is_bold()
                && cx.full_width()
                && cx.next.text_left() < 100.0
                && cx.hanging() > cx.space() * 3.0
            {
                return Verdict::Merge;
            }
        }
        if patterns::is_bullet_start(&cx.block_text)
            && patterns::is_catalog_line(&cx.next_text)
            && cx.left_gap() < cx.align_tolerance
            && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
            && cx.prev.text_left() > 100.0
        {
            return Verdict::Merge;
        }
        if cx.prev.max_font_size() == cx.next.max_font_size()
            && cx.left_gap() < cx.align_tolerance
            && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
            && cx.prev.text_left() < BODY_LEFT_REACH
            && cx.full_width()
        {
            return Verdict::Merge;
        }
        Verdict::Split
    }
}

/// Rows of gap-separated figures are table fragments.
pub struct TableRow;

impl MergeRule for TableRow {
    fn name(&self) -> &'static str {
        "table-row"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let prev_table =
            patterns::is_digit_label_row(&cx.prev_text) && patterns::space_gap_count(&cx.prev_text) >= 1;
        let next_table =
            patterns::is_digit_label_row(&cx.next_text) && patterns::space_gap_count(&cx.next_text) >= 1;
        if prev_table || next_table {
            return Verdict::Split;
        }
        if patterns::space_gap_count(&cx.block_text) >= 3
            && patterns::space_gap_count(&cx.next_text) >= 3
        {
            if !patterns::has_comma(&cx.block_text)
                && !patterns::has_comma(&cx.next_text)
                && cx.prev.bounds.top() < 150.0
            {
                return Verdict::Split;
            }
            if patterns::cjk_char_count(&cx.prev_text) > 25
                && patterns::cjk_char_count(&cx.next_text) > 25
                && cx.left_gap() > cx.space() * 3.0
                && cx.prev.bounds.top() > 200.0
            {
                return Verdict::Merge;
            }
        }
        Verdict::Undecided
    }
}

/// The paragraph so far ends in sentence punctuation.
///
/// Full-width lines ending in a period usually continue (the period may
/// close a clause mid-paragraph); short ones end the paragraph.
pub struct SentenceEnd;

impl MergeRule for SentenceEnd {
    fn name(&self) -> &'static str {
        "sentence-end"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if !patterns::is_paragraph_end(&cx.block_text) {
            return Verdict::Undecided;
        }
        let space = cx.space();
        if patterns::is_bullet_start(&cx.next_text)
            && cx.next.text_right() < 480.0
            && !patterns::has_comma(&cx.next_text)
        {
            return Verdict::Split;
        }
        if !patterns::is_bullet_start(&cx.block_text)
            && cx.aligned_or_hanging()
            && cx.full_width()
            && cx.next.text_left() < BODY_LEFT_REACH
            && cx.line_spacing() < cx.prev.most_common_text_height()
        {
            if cx.next.text_right() - cx.prev.text_right() > space * 3.0 {
                if patterns::is_serial_number(&cx.next_text) {
                    return Verdict::Merge;
                }
                return Verdict::Split;
            }
            if cx.next.text_right() - cx.prev.text_right() > space
                && cx.next.text_left() - cx.lookahead.text_left() > space * 3.0
            {
                return Verdict::Split;
            }
            if patterns::is_list_start(&cx.prev_text) && patterns::is_list_start(&cx.next_text) {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        if !patterns::is_bullet_start(&cx.prev_text)
            && patterns::is_paragraph_end(&cx.prev_text)
            && cx.left_gap() < cx.align_tolerance
            && cx.full_width()
            && cx.next.text_left() < BODY_LEFT_REACH
            && cx.line_spacing() < cx.prev.most_common_text_height() * 1.5
        {
            // A bullet line followed by visibly looser spacing opens a
            // list rather than continuing the sentence.
            if patterns::is_bullet_start(&cx.next_text)
                && cx.lookahead.bounds.bottom() - cx.next.bounds.bottom() > 10.0
                && (cx.next.bounds.bottom() - cx.prev.bounds.bottom()
                    > cx.lookahead.bounds.bottom() - cx.next.bounds.bottom() + 3.0
                    || cx.next.text_right() < 480.0)
            {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        if cx.prev.bounds.right() < cx.group.bounds().right() - space * 3.0
            && (cx.prev.text_left() - cx.block_left > space * 2.0
                || !patterns::is_paragraph_end(&cx.next_text))
        {
            return Verdict::Split;
        }
        if cx.next.text_left() - cx.prev.text_left() > space * 2.0
            && patterns::is_paragraph_end(&cx.next_text)
        {
            return Verdict::Split;
        }
        if cx.next_text.chars().count() < 10
            && cx.line_spacing() > cx.next.most_common_text_height() * 1.5
        {
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// Table-of-contents rows stay one row per paragraph, except wrapped
/// overlong entries.
pub struct CatalogRow;

impl MergeRule for CatalogRow {
    fn name(&self) -> &'static str {
        "catalog-row"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let block_catalog = patterns::is_catalog_line(&cx.block_text);
        let next_catalog = patterns::is_catalog_line(&cx.next_text);
        if !block_catalog && !next_catalog {
            return Verdict::Undecided;
        }
        if (patterns::is_bullet_start(&cx.block_text) && block_catalog)
            || (patterns::is_bullet_start(&cx.next_text) && next_catalog)
        {
            return Verdict::Split;
        }
        if patterns::is_catalog_part(&cx.next_text)
            && cx.hanging() > cx.space() * 2.0
            && !cx.same_font_name()
        {
            return Verdict::Split;
        }
        if patterns::is_bullet_start(&cx.block_text)
            && next_catalog
            && cx.aligned_or_hanging()
            && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
        {
            if cx.prev.text_left() > 110.0 {
                return Verdict::Merge;
            }
            if cx.prev.text_left() > 100.0 && cx.prev.is_bold() && cx.next.is_bold() {
                return Verdict::Merge;
            }
        }
        if patterns::cjk_char_count(&cx.prev_text) > 32 {
            if patterns::is_long_catalog_line(&cx.next_text) {
                return Verdict::Merge;
            }
            if next_catalog && patterns::cjk_char_count(&cx.next_text) > 27 {
                return Verdict::Merge;
            }
        }
        Verdict::Split
    }
}

/// The candidate opens a new bullet or numbered item.
pub struct BulletOpensNext;

impl MergeRule for BulletOpensNext {
    fn name(&self) -> &'static str {
        "bullet-opens-next"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if !patterns::is_bullet_start(&cx.next_text) {
            return Verdict::Undecided;
        }
        if patterns::is_paragraph_keep(&cx.block_text)
            && (cx.prev.text_right() - cx.block_right).abs() < RIGHT_ALIGN_TOLERANCE
        {
            return Verdict::Merge;
        }
        if cx.hanging() > cx.space() * 3.0
            && cx.full_width()
            && cx.next.text_right() > BODY_RIGHT_REACH
        {
            // A line pulled back short of the running border ends the
            // paragraph when the next line resumes the full measure.
            if cx.prev.text_right() < cx.block_right - RIGHT_ALIGN_TOLERANCE
                && cx.next.text_right() > cx.block_right - RIGHT_ALIGN_TOLERANCE
            {
                return Verdict::Split;
            }
            if patterns::space_gap_count(&cx.prev_text) >= 1 && cx.prev.text_left() > 240.0 {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        Verdict::Split
    }
}

/// Checkbox choice rows stand alone.
pub struct ChoiceRow;

impl MergeRule for ChoiceRow {
    fn name(&self) -> &'static str {
        "choice-row"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if patterns::is_choice_symbol(cx.next_text.trim())
            || patterns::is_choice_symbol(cx.prev_text.trim())
        {
            Verdict::Split
        } else {
            Verdict::Undecided
        }
    }
}

/// Consecutive circled-number list items without closing punctuation.
pub struct ListPair;

impl MergeRule for ListPair {
    fn name(&self) -> &'static str {
        "list-pair"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if patterns::is_list_start(&cx.block_text)
            && patterns::is_list_start(&cx.next_text)
            && !patterns::is_paragraph_end(&cx.block_text)
        {
            return Verdict::Split;
        }
        if patterns::is_address_line(&cx.block_text)
            && patterns::is_address_line(&cx.next_text)
            && cx.left_gap() < cx.align_tolerance + 0.5
        {
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// The paragraph so far opens with a bullet marker: continuation is
/// judged by alignment against the marker and the running borders.
pub struct BulletBlock;

impl MergeRule for BulletBlock {
    fn name(&self) -> &'static str {
        "bullet-block"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if !patterns::is_bullet_start(&cx.block_text) {
            return Verdict::Undecided;
        }
        let space = cx.space();
        let first = cx.block.first_line();
        // A very short bullet line stands alone unless the candidate
        // squares up with the running borders.
        if cx.block.bounds().right() + cx.prev.most_common_text_width() * 4.0
            < cx.group.text_right()
        {
            if (cx.prev.text_right() - cx.block_right).abs() < f32::EPSILON
                && (cx.next.text_left() - cx.block_left).abs() < f32::EPSILON
                && !patterns::is_paragraph_end(&cx.block_text)
                && patterns::is_paragraph_end(&cx.next_text)
            {
                if cx.prev.text_right() < BODY_RIGHT_REACH {
                    return Verdict::Split;
                }
                return Verdict::Merge;
            }
            if !patterns::is_paragraph_end(&cx.prev_text)
                && cx.full_width()
                && cx.hanging() > cx.align_tolerance
            {
                return Verdict::Merge;
            }
            if !patterns::is_bullet_start(&cx.prev_text)
                && !patterns::is_paragraph_end(&cx.prev_text)
                && cx.full_width()
                && cx.left_gap() < cx.align_tolerance
            {
                return Verdict::Merge;
            }
            return Verdict::Split;
        }
        if !patterns::is_paragraph_end(&cx.prev_text)
            && cx.next.text_left() - cx.prev.text_left() > space * 2.0
            && cx.left_gap() < 30.0
            && !patterns::is_paragraph_end(&cx.next_text)
            && cx.next_text.chars().count() < 16
        {
            return Verdict::Merge;
        }
        // Aligned with the bullet line's own start but not itself a
        // bullet: the wrapped remainder of the item.
        if !patterns::is_bullet_start(&cx.next_text)
            && feq(cx.next.bounds.left(), first.bounds.left(), space * 2.0)
        {
            if cx.next.text_left() - cx.group.text_left() > space * 2.0 {
                if cx.left_gap() < cx.align_tolerance
                    && cx.right_gap() < RIGHT_ALIGN_TOLERANCE
                    && !patterns::is_paragraph_end(&cx.block_text)
                {
                    return Verdict::Merge;
                }
                if cx.left_gap() < cx.align_tolerance
                    && !patterns::is_paragraph_end(&cx.block_text)
                    && patterns::is_paragraph_end(&cx.next_text)
                {
                    return Verdict::Merge;
                }
                if cx.next.text_left() < 90.0 && cx.next.text_right() < 300.0 {
                    return Verdict::Merge;
                }
                return Verdict::Split;
            }
            if cx.next.bounds.bottom() - cx.prev.bounds.bottom() > cx.prev.bounds.height * 8.0 {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        if !patterns::is_paragraph_end(&cx.prev_text)
            && cx.left_gap() < cx.align_tolerance
            && (cx.prev.text_right() - cx.block_right).abs() < RIGHT_ALIGN_TOLERANCE
            && cx.next.text_left() > cx.block_left + space * 2.0
        {
            return Verdict::Merge;
        }
        if cx.next.bounds.left() + space * 2.0 <= first.bounds.left() {
            return Verdict::Merge;
        }
        if patterns::is_paragraph_keep(&cx.prev_text) {
            return Verdict::Merge;
        }
        Verdict::Undecided
    }
}

/// Date signature lines close documents on their own.
pub struct DateSignature;

impl MergeRule for DateSignature {
    fn name(&self) -> &'static str {
        "date-signature"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if patterns::is_year_month_day(&cx.next_text)
            && cx.next_text.trim().chars().count() <= 11
            && !patterns::has_comma(&cx.prev_text)
            && !patterns::has_comma(&cx.next_text)
        {
            Verdict::Split
        } else {
            Verdict::Undecided
        }
    }
}

/// A trailing clause comma keeps the paragraph open.
pub struct CommaContinues;

impl MergeRule for CommaContinues {
    fn name(&self) -> &'static str {
        "comma-continues"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let t = cx.block_text.trim_end();
        if t.ends_with('，') || t.ends_with(',') || t.ends_with('、') {
            Verdict::Merge
        } else {
            Verdict::Undecided
        }
    }
}

/// A line that starts at the region's left edge yet stops far short of
/// its right edge is a one-line paragraph.
pub struct ShortLeadLine;

impl MergeRule for ShortLeadLine {
    fn name(&self) -> &'static str {
        "short-lead-line"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if (cx.block.bounds().left() - cx.group.bounds().left()).abs() < 2.0
            && cx.block.bounds().right() + cx.prev.most_common_text_width() * 8.0
                < cx.group.bounds().right()
        {
            return Verdict::Split;
        }
        // Both lines end with punctuation and the previous one falls
        // short of the measure.
        if patterns::is_paragraph_end(&cx.block_text)
            && cx.prev.text_right() < BODY_RIGHT_REACH
            && patterns::is_paragraph_end(&cx.next_text)
            && (cx.next.text_left() <= cx.prev.text_left() + 2.0
                || cx.next.text_left() > cx.prev.text_left() + cx.prev.width_of_space() * 2.0)
        {
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// Two-line centered titles merge when large and clean of punctuation.
pub struct CenteredTitle;

impl MergeRule for CenteredTitle {
    fn name(&self) -> &'static str {
        "centered-title"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let t1 = cx.prev_text.trim();
        if patterns::is_company_title(t1)
            && cx.centered_pair()
            && cx.next.bounds.bottom() < TITLE_PAIR_MAX_BOTTOM
        {
            return Verdict::Merge;
        }
        // Full-measure lines center on their region trivially; a title
        // pair is short of the measure.
        if cx.full_width()
            || cx.next.text_right() > BODY_RIGHT_REACH
            || !cx.centered_pair()
            || !cx.prev.has_same_style(cx.next)
        {
            return Verdict::Undecided;
        }
        if cx.prev.max_font_size() < 16.0 || cx.next.max_font_size() < 16.0 {
            return Verdict::Split;
        }
        if patterns::is_paragraph_keep(&cx.prev_text) && t1.chars().count() == 1 {
            return Verdict::Merge;
        }
        if cx.next.text_left() - cx.prev.text_left() > cx.space() * 3.0
            && patterns::is_paragraph_end(&cx.block_text)
        {
            return Verdict::Split;
        }
        let spacing = cx.line_spacing();
        if spacing > 0.0 && spacing < cx.next.bounds.height {
            return Verdict::Merge;
        }
        if spacing > 0.0 && cx.next.is_bold() && cx.next.bounds.bottom() < 300.0 {
            return Verdict::Merge;
        }
        Verdict::Undecided
    }
}

/// Centered line followed by an off-center one with a wide left shift
/// ends the centered paragraph.
pub struct CenterBreak;

impl MergeRule for CenterBreak {
    fn name(&self) -> &'static str {
        "center-break"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if !patterns::is_paragraph_end(&cx.prev_text)
            && cx.centered(cx.prev)
            && cx.prev.bounds.center_x() - cx.next.bounds.center_x() > cx.space() * 8.0
            && !patterns::has_comma(&cx.prev_text)
            && cx.prev.text_right() < 480.0
            && cx.left_gap() > cx.space() * 10.0
        {
            Verdict::Split
        } else {
            Verdict::Undecided
        }
    }
}

/// Tight, left-aligned spacing with a narrowing second line: the shape
/// of a wrapped paragraph body.
pub struct AlignedSpacing;

impl MergeRule for AlignedSpacing {
    fn name(&self) -> &'static str {
        "aligned-spacing"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let spacing = cx.line_spacing();
        let space = cx.space();
        if spacing > 0.0
            && spacing < cx.next.bounds.height
            && feq(cx.next.bounds.left(), cx.prev.bounds.left(), 3.0)
            && cx.prev.bounds.width >= cx.next.bounds.width - 8.0
        {
            if cx.prev.bounds.right() < cx.group.text_right() - cx.group.bounds().width / 8.0
                && !cx.next.is_bold()
            {
                let block_center = (cx.block_left + cx.block_right) / 2.0;
                if !patterns::has_comma(&cx.block_text)
                    && !patterns::has_comma(&cx.next_text)
                    && feq(cx.prev.bounds.center_x(), block_center, CENTER_TOLERANCE)
                    && feq(cx.next.bounds.center_x(), block_center, CENTER_TOLERANCE)
                    && cx.next.bounds.top() < 200.0
                {
                    return Verdict::Merge;
                }
                if !((cx.next.text_left() - cx.block_left).abs() < f32::EPSILON
                    && patterns::is_paragraph_end(&cx.next_text))
                {
                    return Verdict::Split;
                }
            }
            if cx.next.text_left() > cx.group.text_left() + space * 3.0
                && cx.next.bounds.top() < 150.0
            {
                if cx.prev.text_left() < BODY_LEFT_REACH
                    && cx.full_width()
                    && cx.left_gap() < cx.align_tolerance + 0.5
                    && cx.right_gap() < RIGHT_ALIGN_TOLERANCE + 0.5
                    && cx.block_text.chars().count() > 32
                    && cx.next_text.chars().count() > 32
                {
                    return Verdict::Merge;
                }
                if patterns::is_notice_title(&cx.next_text) {
                    return Verdict::Merge;
                }
                if !patterns::is_paragraph_end(&cx.prev_text)
                    && cx.full_width()
                    && cx.prev.text_left() < 115.0
                    && cx.left_gap() < cx.align_tolerance
                    && patterns::has_comma(&cx.next_text)
                {
                    return Verdict::Merge;
                }
                return Verdict::Split;
            }
            if patterns::is_paragraph_keep(&cx.block_text) && cx.full_width() {
                return Verdict::Merge;
            }
            if !patterns::is_paragraph_end(&cx.prev_text)
                && patterns::is_paragraph_end(&cx.next_text)
                && cx.next_text.chars().count() < 15
                && cx.left_gap() < 3.0
                && spacing < 5.0
            {
                return Verdict::Merge;
            }
            // A line ending mid-measure before an indented starter.
            if cx.group.text_right() - cx.prev.text_right() > space * 6.0
                && cx.next.text_left() - cx.group.text_left() > space * 3.0
                && cx.group.center_x() - cx.prev.bounds.center_x() > space * 6.0
                && cx.prev.text_right() < 450.0
                && patterns::is_paragraph_end(&cx.next_text)
            {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        // The candidate tucks back left of the paragraph's first line.
        if spacing > 0.0
            && spacing < cx.next.bounds.height
            && cx.block.first_line().bounds.left() - cx.next.bounds.left() >= space * 2.0
        {
            if cx.next_text.len() > cx.next_text.trim_start().len() + 1 {
                return Verdict::Split;
            }
            if patterns::is_year_month_day(&cx.next_text)
                && cx.next_text.trim().chars().count() <= 11
            {
                return Verdict::Split;
            }
            if cx.block_text.chars().count() < 18
                && (cx.prev.text_left() > 300.0 || cx.prev.text_right() < 300.0)
            {
                return Verdict::Split;
            }
            return Verdict::Merge;
        }
        Verdict::Undecided
    }
}

/// A previous line ending far from the right edge ends its paragraph
/// unless the candidate plainly continues it.
pub struct FarFromRightEdge;

impl MergeRule for FarFromRightEdge {
    fn name(&self) -> &'static str {
        "far-from-right-edge"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        if cx.prev.bounds.right() < cx.group.bounds().right() - cx.group.bounds().width / 8.0
            && !cx.next.is_bold()
            && !patterns::is_paragraph_end(&cx.next_text)
        {
            if cx.full_width() {
                if cx.next_text.chars().count() < 12 && cx.next.text_left() > 200.0 {
                    return Verdict::Split;
                }
                return Verdict::Merge;
            }
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// Vertical spacing out of family with the paragraph's own leading.
pub struct SpacingJump;

impl MergeRule for SpacingJump {
    fn name(&self) -> &'static str {
        "spacing-jump"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let spacing = cx.line_spacing();
        if spacing < cx.prev.bounds.height * -1.2 {
            return Verdict::Split;
        }
        if spacing >= cx.block.line_spacing() + 5.0 {
            if cx.left_gap() < cx.align_tolerance
                && cx.prev.text_left() < 100.0
                && cx.full_width()
                && !patterns::is_paragraph_end(&cx.block_text)
                && cx.prev.has_same_style(cx.next)
            {
                return Verdict::Merge;
            }
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// Last resort geometry: reject candidates whose horizontal placement
/// cannot belong to the same flow, accept the rest.
pub struct GeometryFallback;

impl MergeRule for GeometryFallback {
    fn name(&self) -> &'static str {
        "geometry-fallback"
    }

    fn apply(&self, cx: &MergeContext<'_>) -> Verdict {
        let center = cx.group.center_x();
        let width = cx.group.bounds().width;
        let space = cx.space();
        if cx.prev.bounds.right() < center - width / 8.0 {
            return Verdict::Split;
        }
        if cx.prev.bounds.left() > center + width / 8.0 {
            return Verdict::Split;
        }
        if cx.next.bounds.left() > cx.group.bounds().left() + space * 2.0 {
            // Large bold indented opener: a heading, unless it matches
            // the previous line's size and font exactly.
            if cx.next.max_font_size() > 9.5
                && !patterns::has_comma(&cx.next_text)
                && cx.next.is_bold()
            {
                if cx.font_gap() > 0.75
                    || cx.block.bounds().right() + cx.prev.most_common_text_width() * 2.0
                        > cx.group.bounds().right()
                {
                    return Verdict::Split;
                }
                if !cx.same_font_name() {
                    return Verdict::Split;
                }
                return Verdict::Merge;
            }
            if cx.block.first_line().bounds.left() - cx.next.bounds.left() >= space * 2.0 {
                return Verdict::Merge;
            }
            if !patterns::is_paragraph_end(&cx.prev_text)
                && cx.prev.bounds.right() > BODY_RIGHT_REACH
                && cx.next.text_left() > cx.prev.text_left() + space * 2.0
                && patterns::is_paragraph_end(&cx.next_text)
            {
                return Verdict::Merge;
            }
            return Verdict::Split;
        }
        if (cx.prev.bounds.left() - cx.next.bounds.left()).abs() > cx.prev.width_of_space() * 9.0 {
            return Verdict::Split;
        }
        Verdict::Undecided
    }
}

/// The cascade in evaluation order.
pub fn default_rules() -> Vec<Box<dyn MergeRule + Send + Sync>> {
    vec![
        Box::new(IncompatibleLines),
        Box::new(SameLine),
        Box::new(ColumnarText),
        Box::new(FontSizeJump),
        Box::new(StyleMismatch),
        Box::new(TableRow),
        Box::new(SentenceEnd),
        Box::new(CatalogRow),
        Box::new(BulletOpensNext),
        Box::new(ChoiceRow),
        Box::new(ListPair),
        Box::new(BulletBlock),
        Box::new(DateSignature),
        Box::new(CommaContinues),
        Box::new(ShortLeadLine),
        Box::new(CenteredTitle),
        Box::new(CenterBreak),
        Box::new(AlignedSpacing),
        Box::new(FarFromRightEdge),
        Box::new(SpacingJump),
        Box::new(GeometryFallback),
    ]
}
