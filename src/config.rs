//! Configuration for the layout pipeline.
//!
//! The numeric thresholds used by the pagination detector and the paragraph
//! merger were fitted empirically on financial-report corpora. They are
//! exposed here as named constants, and the ones that most affect merge
//! behavior can be overridden through [`LayoutConfig`].

/// Named threshold constants used across the pipeline.
pub mod thresholds {
    /// Wall-clock budget per page, checked once per dispatched operator.
    pub const PAGE_PROCESS_TIMEOUT_MS: u64 = 60_000;

    /// Number of pages kept in the result cache before FIFO eviction.
    pub const MAX_CACHED_PAGES: usize = 3;

    /// Non-image XObject count above which a stream is treated as a
    /// painting/cover and its content is skipped.
    pub const PAINTING_XOBJECT_COUNT: usize = 100;

    /// Shading count above which a stream is treated as a painting/cover.
    pub const PAINTING_SHADING_COUNT: usize = 200;

    /// Height substitute factor for degenerate glyph boxes: height becomes
    /// advance width times this factor.
    pub const DEGENERATE_HEIGHT_FACTOR: f32 = 1.2;

    /// Aspect ratio (height / width) above which a CJK glyph box is treated
    /// as degenerate.
    pub const CJK_MAX_ASPECT: f32 = 3.0;

    /// Tolerated disagreement between a font's own advance metric and the
    /// declared width before the glyph is rescaled, in thousandths of text
    /// space.
    pub const ADVANCE_MISMATCH: f32 = 1e-4;

    /// Font sizes below this are replaced by a style size derived from the
    /// drawn glyph height.
    pub const MIN_REAL_FONT_SIZE: f32 = 2.0;

    /// Horizontal shear at or above which a glyph is considered italic.
    pub const ITALIC_SHEAR: f32 = 0.3;

    /// Stroke widths below this, combined with a fill-stroke render mode,
    /// indicate simulated bold rather than outlined text.
    pub const FAKE_BOLD_MAX_LINE_WIDTH: f32 = 1.0;

    /// Distance from the physical page edge inside which margin lines are
    /// ignored (crop marks, printer borders), in points.
    pub const PAGE_EDGE_EXCLUSION: f32 = 5.0;

    /// Tolerance when rejecting a path item whose extent matches the whole
    /// page (page borders), in points.
    pub const FULL_PAGE_TOLERANCE: f32 = 2.0;

    /// Fraction of the page extent a path item must span to count as a
    /// header/footer or wing boundary line.
    pub const BOUNDARY_MIN_SPAN: f32 = 0.5;

    /// Vertical tolerance when matching text runs above the frame top, in
    /// points.
    pub const HEADER_BAND_TOLERANCE: f32 = 5.0;

    /// Vertical tolerance when matching text runs below the frame bottom,
    /// in points.
    pub const FOOTER_BAND_TOLERANCE: f32 = 3.0;

    /// Multiplier applied to the nominal content-margin top when probing for
    /// textual header candidates.
    pub const HEADER_TEXT_REACH: f32 = 1.5;

    /// Maximum count of non-blank ideographic characters in a header or
    /// footer line.
    pub const PAGINATION_MAX_CJK_CHARS: usize = 25;

    /// Slack added to [`PAGINATION_MAX_CJK_CHARS`] for lines that also match
    /// a pagination text pattern.
    pub const PAGINATION_CJK_SLACK: usize = 6;

    /// Tolerance when matching a page's physical size against a known paper
    /// profile, in points.
    pub const PAPER_MATCH_TOLERANCE: f32 = 0.5;

    /// Default number of space widths two chunks may be apart and still be
    /// merged onto one line.
    pub const MERGE_SPACE_COUNT: f32 = 2.0;

    /// Extra space widths granted when the existing line starts with a
    /// bullet marker.
    pub const BULLET_EXTRA_SPACES: f32 = 10.0;

    /// Rotated runs merge when their angles agree within this many degrees.
    pub const ROTATION_TOLERANCE_DEG: f32 = 5.0;

    /// Wider rotation window used when both runs are far from axis-aligned.
    pub const ROTATION_TOLERANCE_WIDE_DEG: f32 = 10.0;

    /// Font size difference above which two lines never share a paragraph.
    pub const FONT_SIZE_HARD_GAP: f32 = 2.2;

    /// Tolerance when comparing per-line text heights, in points.
    pub const TEXT_HEIGHT_TOLERANCE: f32 = 2.0;

    /// Tolerance when comparing two lines' horizontal centers for a
    /// centered-title test, in points.
    pub const CENTER_TOLERANCE: f32 = 30.0;

    /// Left-margin difference below which two lines are treated as aligned,
    /// in points.
    pub const LEFT_ALIGN_TOLERANCE: f32 = 6.0;

    /// Right-margin difference below which two lines are treated as aligned,
    /// in points.
    pub const RIGHT_ALIGN_TOLERANCE: f32 = 6.0;

    /// A previous line reaching past this x suggests the paragraph continues
    /// onto the next line, in points.
    pub const BODY_RIGHT_REACH: f32 = 500.0;

    /// A next line starting left of this x is a plausible body continuation,
    /// in points.
    pub const BODY_LEFT_REACH: f32 = 95.0;

    /// Upper bound on a centered big-font title's bottom edge, in points.
    pub const TITLE_MAX_BOTTOM: f32 = 500.0;

    /// Upper bound for the stricter variant of the centered-title test, in
    /// points.
    pub const TITLE_STRICT_MAX_BOTTOM: f32 = 360.0;

    /// Upper bound used when both lines are title-sized, in points.
    pub const TITLE_PAIR_MAX_BOTTOM: f32 = 400.0;
}

/// Layout pipeline configuration.
///
/// Created with [`LayoutConfig::new`] and adjusted through the builder-style
/// `with_*` methods.
///
/// # Examples
///
/// ```
/// use pdf_layout::config::LayoutConfig;
///
/// let config = LayoutConfig::new()
///     .with_page_budget_ms(30_000)
///     .with_merge_space_count(3.0);
/// assert_eq!(config.page_budget_ms, 30_000);
/// ```
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Wall-clock budget per page, in milliseconds.
    pub page_budget_ms: u64,

    /// Capacity of the page result cache.
    pub max_cached_pages: usize,

    /// Number of space widths two chunks may be apart and still merge onto
    /// one line.
    pub merge_space_count: f32,

    /// Left/right-margin alignment tolerance for the paragraph cascade, in
    /// points.
    pub align_tolerance: f32,

    /// Font size difference above which two lines never share a paragraph.
    pub font_size_hard_gap: f32,

    /// Detect header/footer/wing regions and classify text runs.
    pub detect_pagination: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            page_budget_ms: thresholds::PAGE_PROCESS_TIMEOUT_MS,
            max_cached_pages: thresholds::MAX_CACHED_PAGES,
            merge_space_count: thresholds::MERGE_SPACE_COUNT,
            align_tolerance: thresholds::LEFT_ALIGN_TOLERANCE,
            font_size_hard_gap: thresholds::FONT_SIZE_HARD_GAP,
            detect_pagination: true,
        }
    }

    /// Set the per-page processing budget in milliseconds.
    pub fn with_page_budget_ms(mut self, budget_ms: u64) -> Self {
        self.page_budget_ms = budget_ms;
        self
    }

    /// Set the page cache capacity.
    pub fn with_max_cached_pages(mut self, capacity: usize) -> Self {
        self.max_cached_pages = capacity;
        self
    }

    /// Set the line-merge gap in space widths.
    pub fn with_merge_space_count(mut self, spaces: f32) -> Self {
        self.merge_space_count = spaces;
        self
    }

    /// Set the margin alignment tolerance in points.
    pub fn with_align_tolerance(mut self, tolerance: f32) -> Self {
        self.align_tolerance = tolerance;
        self
    }

    /// Set the hard font-size gap in points.
    pub fn with_font_size_hard_gap(mut self, gap: f32) -> Self {
        self.font_size_hard_gap = gap;
        self
    }

    /// Enable or disable pagination detection.
    pub fn with_pagination_detection(mut self, enable: bool) -> Self {
        self.detect_pagination = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayoutConfig::new();
        assert_eq!(config.page_budget_ms, 60_000);
        assert_eq!(config.max_cached_pages, 3);
        assert!(config.detect_pagination);
    }

    #[test]
    fn test_builder() {
        let config = LayoutConfig::new()
            .with_max_cached_pages(8)
            .with_pagination_detection(false);
        assert_eq!(config.max_cached_pages, 8);
        assert!(!config.detect_pagination);
    }
}
