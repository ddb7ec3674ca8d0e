//! Cross-page paragraph linking.
//!
//! A paragraph interrupted by a page break is stitched to its
//! continuation by a doubly-linked pair of [`ParagraphId`]s. Without a
//! line tagger the decision falls to the merge rule cascade, with the
//! continuation re-based under the interrupted paragraph; with a tagger
//! the per-line tags pick the candidates directly.

use log::debug;

use crate::document::PageModel;
use crate::layout::{LineTag, Paragraph, ParagraphMerger};
use crate::text::{patterns, PaginationType};

/// Overlap ratio above which a paragraph is considered part of the
/// page's topmost text region.
pub const TOP_GROUP_OVERLAP: f32 = 0.8;

/// Vertical slack below the last region's bottom edge within which a
/// paragraph still counts as ending the previous page.
pub const PAGE_TAIL_SLACK: f32 = 30.0;

/// Center offset, as a fraction of page width, beyond which a line is
/// no longer considered centered.
pub const CENTER_OFFSET_RATIO: f32 = 0.01;

/// Links interrupted paragraphs to their continuations across every
/// consecutive page pair.
pub fn link_pages(pages: &mut [PageModel], merger: &ParagraphMerger) {
    for i in 1..pages.len() {
        let (head, tail) = pages.split_at_mut(i);
        let prev_page = head.last_mut().unwrap();
        let page = &mut tail[0];
        if merger.has_tagger() {
            link_by_tags(prev_page, page);
        } else {
            link_by_rules(prev_page, page, merger);
        }
    }
}

fn link_by_rules(prev_page: &mut PageModel, page: &mut PageModel, merger: &ParagraphMerger) {
    let Some(last_idx) = prev_page
        .paragraphs
        .iter()
        .rposition(|p| !p.is_blank() && p.pagination() == PaginationType::None)
    else {
        return;
    };
    let Some(first_idx) = page
        .paragraphs
        .iter()
        .position(|p| !p.is_blank() && p.pagination() == PaginationType::None)
    else {
        return;
    };
    let last = &prev_page.paragraphs[last_idx];
    let first = &page.paragraphs[first_idx];
    let Some(group) = prev_page.groups.get(last.group_index) else {
        return;
    };
    if merger.can_merge_cross_page(last.block(), first.block().first_line(), group) {
        let (last_id, first_id) = (last.id(), first.id());
        debug!(
            "linking paragraph {:?} on page {} to {:?}",
            last_id, prev_page.page_number, first_id
        );
        prev_page.paragraphs[last_idx].cross_page_next = Some(first_id);
        page.paragraphs[first_idx].cross_page_prev = Some(last_id);
    }
}

fn link_by_tags(prev_page: &mut PageModel, page: &mut PageModel) {
    let Some(tail_bottom) = prev_page.groups.last().map(|g| g.bounds().bottom()) else {
        return;
    };
    let last_idx = prev_page
        .paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| is_interrupted_tail(p, tail_bottom))
        .max_by(|(_, a), (_, b)| a.bounds().bottom().total_cmp(&b.bounds().bottom()))
        .map(|(i, _)| i);
    let Some(last_idx) = last_idx else { return };
    let Some(top_group) = page.groups.first().map(|g| g.bounds()) else {
        return;
    };
    let page_width = page.bounds.width;
    let first_idx = page
        .paragraphs
        .iter()
        .enumerate()
        .filter(|(_, p)| is_continuation_head(p, &top_group, page_width))
        .min_by(|(_, a), (_, b)| a.bounds().top().total_cmp(&b.bounds().top()))
        .map(|(i, _)| i);
    let Some(first_idx) = first_idx else { return };
    let last_id = prev_page.paragraphs[last_idx].id();
    let first_id = page.paragraphs[first_idx].id();
    debug!(
        "linking tagged paragraph {:?} on page {} to {:?}",
        last_id, prev_page.page_number, first_id
    );
    prev_page.paragraphs[last_idx].cross_page_next = Some(first_id);
    page.paragraphs[first_idx].cross_page_prev = Some(last_id);
}

/// A paragraph at the page's tail whose last line was tagged as still
/// inside an open paragraph.
fn is_interrupted_tail(p: &Paragraph, tail_bottom: f32) -> bool {
    if p.pagination() != PaginationType::None {
        return false;
    }
    if !matches!(
        p.block().last_line_tag(),
        Some(LineTag::ParagraphMiddle) | Some(LineTag::ParagraphStart)
    ) {
        return false;
    }
    if p.bounds().bottom() <= tail_bottom - PAGE_TAIL_SLACK {
        return false;
    }
    !patterns::is_sentence_end(&p.text())
}

/// A paragraph at the top of a page that reads like continuation body
/// text rather than a heading, caption, or list opener.
fn is_continuation_head(
    p: &Paragraph,
    top_group: &crate::geometry::Rect,
    page_width: f32,
) -> bool {
    if p.pagination() != PaginationType::None {
        return false;
    }
    if !matches!(
        p.block().last_line_tag(),
        Some(
            LineTag::ParagraphStart
                | LineTag::ParagraphMiddle
                | LineTag::ParagraphEnd
                | LineTag::SingleLineParagraph
        )
    ) {
        return false;
    }
    let text = p.text();
    let bounds = p.bounds();
    // A short top-region line without closing punctuation is a heading.
    if bounds.self_overlap_ratio(top_group) > TOP_GROUP_OVERLAP
        && patterns::cjk_char_count(&text) < 31
        && !patterns::is_paragraph_end(&text)
    {
        return false;
    }
    let first_line = p.block().first_line();
    if bounds.top() >= top_group.top() + 10.0
        && first_line.bounds.self_overlap_ratio(top_group) <= TOP_GROUP_OVERLAP
    {
        return false;
    }
    if patterns::is_serial_number(&text)
        || patterns::is_bullet_start(&text)
        || patterns::is_caption_begin(&text)
    {
        return false;
    }
    // Centered openers are titles; body continuations hug the margins
    // or close a sentence.
    let off_center =
        (bounds.left() + bounds.right() - page_width).abs() / 2.0 / page_width;
    off_center > CENTER_OFFSET_RATIO || patterns::is_sentence_end(&text)
}
