//! Pagination frame detection.
//!
//! Finds the rectangle separating body content from repeating page
//! furniture. Drawn rules near the margins are the strongest signal;
//! when a page has none, short header- or footer-looking text lines
//! stand in, and the paper profile's margins are the last resort. Text
//! runs outside the frame are then classified as header, footer, or
//! wing so downstream merging can skip them.

use log::debug;

use crate::config::thresholds::{
    BOUNDARY_MIN_SPAN, FOOTER_BAND_TOLERANCE, FULL_PAGE_TOLERANCE, HEADER_BAND_TOLERANCE,
    HEADER_TEXT_REACH, PAGE_EDGE_EXCLUSION, PAGINATION_CJK_SLACK, PAGINATION_MAX_CJK_CHARS,
};
use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::pagination::paper::PaperProfile;
use crate::scene::{tags, SceneGraph, TagValue};
use crate::text::patterns::{
    cjk_char_count, is_caption_begin, is_digit_label_row, is_footer_text, is_header_text,
    is_page_number,
};
use crate::text::{Direction, PaginationType, TextChunk, TextChunkMerger};
use crate::utils::{feq, fgte, flte, safe_float_cmp};

/// The detected pagination frame for one page.
///
/// Content inside `bounds` is body text; the `*_from_line` flags record
/// which edges were anchored by an actual drawn rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationFrame {
    /// Frame rectangle in display space.
    pub bounds: Rect,
    /// The top edge came from a drawn header line.
    pub top_from_line: bool,
    /// The bottom edge came from a drawn footer line.
    pub bottom_from_line: bool,
    /// The left edge came from a drawn wing line.
    pub left_from_line: bool,
    /// The right edge came from a drawn wing line.
    pub right_from_line: bool,
}

impl Default for PaginationFrame {
    fn default() -> Self {
        PaginationFrame {
            bounds: Rect::ZERO,
            top_from_line: false,
            bottom_from_line: false,
            left_from_line: false,
            right_from_line: false,
        }
    }
}

/// Header or footer text may not exceed this many CJK characters.
fn short_enough(text: &str) -> bool {
    cjk_char_count(text) <= PAGINATION_MAX_CJK_CHARS + PAGINATION_CJK_SLACK
}

/// Whether a line of text reads like a page header.
fn looks_like_header(text: &str) -> bool {
    is_page_number(text) || is_header_text(text)
}

/// Whether a line of text reads like a page footer.
fn looks_like_footer(text: &str) -> bool {
    is_page_number(text) || is_footer_text(text)
}

/// Prefer the candidate edge closer to the content region, falling back
/// to the far one when the near one crossed the bound.
fn bounded_max(near: f32, far: f32, bound: f32) -> f32 {
    if far < bound {
        far
    } else {
        near
    }
}

fn bounded_min(near: f32, far: f32, bound: f32) -> f32 {
    if near > bound {
        near
    } else {
        far
    }
}

/// Detect the pagination frame of a built scene graph.
///
/// Writes the frame and its line provenance as tags on the graph and
/// sets [`PaginationType`] on every run that falls in a band. Returns
/// the frame.
pub fn detect_pagination_frame(
    graph: &mut SceneGraph,
    paper: &PaperProfile,
    config: &LayoutConfig,
) -> PaginationFrame {
    let page_width = graph.bounds.width;
    let page_height = graph.bounds.height;

    let mut paths: Vec<Rect> = graph.path_items().iter().map(|p| p.bounds).collect();
    paths.sort_by(|a, b| safe_float_cmp(a.top(), b.top()));

    // Content region by experience; header and footer rules are never
    // sought inside it.
    let content_left = paper.left_margin;
    let content_top = paper.top_margin;
    let content_right = page_width - paper.right_margin;
    let content_bottom = page_height - paper.bottom_margin;

    // Rules and fills sometimes bleed to the very page edge; nothing
    // that close counts.
    let edge_right = page_width - PAGE_EDGE_EXCLUSION;

    let min_horizontal_span = page_width * BOUNDARY_MIN_SPAN;
    let min_vertical_span = page_height * BOUNDARY_MIN_SPAN;

    let mut left_wing: Option<f32> = None;
    let mut header_top: Option<f32> = None;
    let mut right_wing: Option<f32> = None;
    let mut footer_bottom: Option<f32> = None;

    for line in &paths {
        let (l, t, r, b) = (line.left(), line.top(), line.right(), line.bottom());
        if content_left < l && content_top < t && r < content_right && b < content_bottom {
            continue;
        }
        if feq(line.width, page_width, FULL_PAGE_TOLERANCE)
            && feq(line.height, page_height, FULL_PAGE_TOLERANCE)
        {
            continue;
        }
        if line.width < min_horizontal_span && line.height < min_vertical_span {
            continue;
        }

        if left_wing.is_none()
            && line.height >= min_vertical_span
            && (PAGE_EDGE_EXCLUSION < l || r < content_left)
            && l < content_left
        {
            left_wing = Some(bounded_max(l, r, content_left));
        }
        // A header rule must be shaped like a line, not a band.
        if header_top.is_none()
            && line.width >= min_horizontal_span
            && line.height < PAGE_EDGE_EXCLUSION
            && (PAGE_EDGE_EXCLUSION < t || b < content_top)
            && t < content_top
        {
            header_top = Some(bounded_max(t, b, content_top));
        }
        if right_wing.is_none()
            && line.height >= min_vertical_span
            && content_right < r
            && r < edge_right
        {
            right_wing = Some(bounded_min(l, r, content_right));
        }
        if footer_bottom.is_none() && line.width >= min_horizontal_span && content_bottom < b {
            footer_bottom = Some(bounded_min(t, b, content_bottom));
        }
        if left_wing.is_some()
            && header_top.is_some()
            && right_wing.is_some()
            && footer_bottom.is_some()
        {
            break;
        }
    }

    let chunks: Vec<TextChunk> = graph.text_chunks().into_iter().cloned().collect();
    let merger = TextChunkMerger::new(config);

    let left = match left_wing {
        Some(x) => {
            graph.set_tag(tags::PAGINATION_LEFT_LINE, TagValue::Float(x));
            x
        }
        None => content_left,
    };
    let top = match header_top {
        Some(y) => {
            graph.set_tag(tags::PAGINATION_TOP_LINE, TagValue::Float(y));
            y
        }
        None => header_fallback(&chunks, &paths, &merger, content_top),
    };
    let right = match right_wing {
        Some(x) => {
            graph.set_tag(tags::PAGINATION_RIGHT_LINE, TagValue::Float(x));
            x
        }
        None => content_right,
    };
    let bottom = match footer_bottom {
        Some(y) => {
            graph.set_tag(tags::PAGINATION_BOTTOM_LINE, TagValue::Float(y));
            y
        }
        None => footer_fallback(
            &chunks,
            &paths,
            &merger,
            content_bottom,
            page_height,
            paper.bottom_margin,
        ),
    };

    let frame = PaginationFrame {
        bounds: Rect::from_points(left, top, right, bottom),
        top_from_line: header_top.is_some(),
        bottom_from_line: footer_bottom.is_some(),
        left_from_line: left_wing.is_some(),
        right_from_line: right_wing.is_some(),
    };
    debug!(
        "page {}: pagination frame {:?} (lines t={} b={} l={} r={})",
        graph.page_number,
        frame.bounds,
        frame.top_from_line,
        frame.bottom_from_line,
        frame.left_from_line,
        frame.right_from_line
    );

    classify_runs(graph, &frame.bounds, &merger);

    graph.set_tag(tags::PAPER, TagValue::Text(paper.name.to_string()));
    graph.set_tag(tags::PAGINATION_FRAME, TagValue::Rect(frame.bounds));
    frame
}

/// Place the frame's top edge from text when no header rule was drawn.
fn header_fallback(
    chunks: &[TextChunk],
    paths: &[Rect],
    merger: &TextChunkMerger,
    content_top: f32,
) -> f32 {
    // A run already classified as header pins the edge directly.
    let known = chunks
        .iter()
        .filter(|c| c.pagination == PaginationType::Header && c.direction.is_horizontal())
        .max_by(|a, b| safe_float_cmp(a.bounds.bottom(), b.bounds.bottom()));
    if let Some(header) = known {
        if header.bounds.bottom() < content_top * HEADER_TEXT_REACH {
            return header.bounds.bottom() + 0.1;
        }
    }

    let merged = merger.merge_to_line(merger.merge(chunks.to_vec()));
    let top_text = merged
        .iter()
        .min_by(|a, b| safe_float_cmp(a.bounds.top(), b.bounds.top()));
    let first_path_top = paths.iter().map(|p| p.top()).find(|&y| y > 0.0);
    if let (Some(text), Some(path_top)) = (top_text, first_path_top) {
        let t = text.text();
        if looks_like_header(&t)
            && short_enough(&t)
            && flte(text.bounds.bottom(), content_top, 30.0)
            && flte(text.bounds.top(), path_top, 1.5 * text.bounds.height)
        {
            return text.bounds.bottom() + 0.1;
        }
    }
    content_top
}

/// Place the frame's bottom edge from text when no footer rule was drawn.
fn footer_fallback(
    chunks: &[TextChunk],
    paths: &[Rect],
    merger: &TextChunkMerger,
    content_bottom: f32,
    page_height: f32,
    bottom_margin: f32,
) -> f32 {
    let known = chunks
        .iter()
        .filter(|c| c.pagination == PaginationType::Footer && c.direction.is_horizontal())
        .min_by(|a, b| safe_float_cmp(a.bounds.top(), b.bounds.top()));
    if let Some(footer) = known {
        if page_height - footer.bounds.top() < bottom_margin * HEADER_TEXT_REACH {
            return footer.bounds.top() - 0.1;
        }
    }

    let merged = merger.merge_to_line(merger.merge(chunks.to_vec()));
    let bottom_text = merged
        .iter()
        .max_by(|a, b| safe_float_cmp(a.bounds.bottom(), b.bounds.bottom()));
    let last_path_bottom = paths.last().map(|p| p.bottom());
    if let (Some(text), Some(path_bottom)) = (bottom_text, last_path_bottom) {
        let t = text.text();
        if looks_like_footer(&t)
            && fgte(text.bounds.top(), content_bottom, 15.0)
            && short_enough(&t)
            && fgte(text.bounds.top(), path_bottom, 1.5 * text.bounds.height)
        {
            return text.bounds.top() - 0.1;
        }
    }
    content_bottom
}

/// Classify every text run against the frame.
///
/// Vertical runs beyond the left or right edge become wings at once.
/// Horizontal runs in the top and bottom bands are merged into lines
/// first and must read like page furniture before their source runs
/// are committed as header or footer.
fn classify_runs(graph: &mut SceneGraph, frame: &Rect, merger: &TextChunkMerger) {
    let mut candidates: Vec<TextChunk> = Vec::new();
    let (frame_top, frame_bottom) = (frame.top(), frame.bottom());
    let (frame_left, frame_right) = (frame.left(), frame.right());
    graph.for_each_chunk_mut(|chunk| {
        if chunk.is_hidden() || chunk.pagination.is_pagination() {
            return;
        }
        let along_page = chunk.direction.is_horizontal() || chunk.direction == Direction::Unknown;
        if flte(chunk.bounds.bottom(), frame_top, HEADER_BAND_TOLERANCE) && along_page {
            candidates.push(chunk.clone());
        } else if fgte(chunk.bounds.top(), frame_bottom, FOOTER_BAND_TOLERANCE) && along_page {
            candidates.push(chunk.clone());
        } else if chunk.bounds.right() < frame_left && chunk.direction.is_vertical() {
            chunk.pagination = PaginationType::LeftWing;
        } else if chunk.bounds.left() > frame_right && chunk.direction.is_vertical() {
            chunk.pagination = PaginationType::RightWing;
        }
    });

    let mut band_chunks = merger.merge(candidates.clone());
    band_chunks.retain(|c| c.direction.is_horizontal());
    let lines = merger.merge_to_line(band_chunks);

    let header_rects: Vec<Rect> = lines
        .iter()
        .filter(|line| flte(line.bounds.bottom(), frame_top, HEADER_BAND_TOLERANCE))
        .filter(|line| {
            let t = line.text();
            !is_digit_label_row(&t)
                && !is_caption_begin(&t)
                && short_enough(&t)
                && looks_like_header(&t)
        })
        .map(|line| line.bounds)
        .collect();
    let footer_rects: Vec<Rect> = lines
        .iter()
        .filter(|line| fgte(line.bounds.top(), frame_bottom, FOOTER_BAND_TOLERANCE))
        .filter(|line| {
            let t = line.text();
            !is_digit_label_row(&t) && short_enough(&t) && looks_like_footer(&t)
        })
        .map(|line| line.bounds)
        .collect();

    if header_rects.is_empty() && footer_rects.is_empty() {
        return;
    }
    graph.for_each_chunk_mut(|chunk| {
        if chunk.is_hidden() || chunk.pagination.is_pagination() {
            return;
        }
        if header_rects.iter().any(|r| r.contains(&chunk.bounds)) {
            chunk.pagination = PaginationType::Header;
        } else if footer_rects.iter().any(|r| r.contains(&chunk.bounds)) {
            chunk.pagination = PaginationType::Footer;
        }
    });
}
