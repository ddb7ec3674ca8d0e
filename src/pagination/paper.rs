//! Paper size profiles and their conventional content margins.
//!
//! A profile gives the detector a prior for where body content lives on
//! the page; pagination lines and header or footer text are only looked
//! for outside that region.

use crate::config::thresholds::PAPER_MATCH_TOLERANCE;
use crate::geometry::Rect;
use crate::utils::feq;

/// Points per millimeter, derived from A4 at 595.35 x 841.995 pt.
const MM_TO_PT: f32 = 2.835;

/// A known page size with its typical content margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperProfile {
    /// Profile name, recorded on the scene graph for diagnostics.
    pub name: &'static str,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Left content margin.
    pub left_margin: f32,
    /// Top content margin.
    pub top_margin: f32,
    /// Right content margin.
    pub right_margin: f32,
    /// Bottom content margin.
    pub bottom_margin: f32,
}

/// Base A4 extent, standard 32 mm / 25 mm margins.
const A4: PaperProfile = PaperProfile {
    name: "A4",
    width: 210.0 * MM_TO_PT,
    height: 297.0 * MM_TO_PT,
    left_margin: 32.0 * MM_TO_PT,
    top_margin: 25.0 * MM_TO_PT,
    right_margin: 32.0 * MM_TO_PT,
    bottom_margin: 25.0 * MM_TO_PT,
};

/// A4 paper with the margins Adobe tools default to, in points.
pub const A4_ADOBE: PaperProfile = PaperProfile {
    name: "A4-adobe",
    left_margin: DEFAULT_HORIZONTAL_MARGIN,
    top_margin: DEFAULT_VERTICAL_MARGIN,
    right_margin: DEFAULT_HORIZONTAL_MARGIN,
    bottom_margin: DEFAULT_VERTICAL_MARGIN,
    ..A4
};

/// US Letter paper, 13 mm / 21 mm margins.
pub const US_LETTER: PaperProfile = PaperProfile {
    name: "us-letter",
    width: 216.0 * MM_TO_PT,
    height: 279.0 * MM_TO_PT,
    left_margin: 13.0 * MM_TO_PT,
    top_margin: 21.0 * MM_TO_PT,
    right_margin: 13.0 * MM_TO_PT,
    bottom_margin: 21.0 * MM_TO_PT,
};

/// Fallback horizontal margin for unrecognized page sizes, in points.
pub const DEFAULT_HORIZONTAL_MARGIN: f32 = 28.0;
/// Fallback vertical margin for unrecognized page sizes, in points.
pub const DEFAULT_VERTICAL_MARGIN: f32 = 69.0;

/// Profiles consulted by [`find_profile`], in match order.
const KNOWN_PAPERS: [PaperProfile; 2] = [A4_ADOBE, US_LETTER];

impl PaperProfile {
    /// The content region of a page with this profile's margins applied.
    ///
    /// The actual page extent is used rather than the profile's nominal
    /// size so a near-match page keeps its true edges.
    pub fn content_frame(&self, page: &Rect) -> Rect {
        Rect::from_points(
            self.left_margin,
            self.top_margin,
            page.width - self.right_margin,
            page.height - self.bottom_margin,
        )
    }

    /// This profile rotated a quarter turn for landscape pages.
    fn landscape(&self) -> PaperProfile {
        PaperProfile {
            name: self.name,
            width: self.height,
            height: self.width,
            left_margin: self.top_margin,
            top_margin: self.left_margin,
            right_margin: self.bottom_margin,
            bottom_margin: self.right_margin,
        }
    }
}

/// Find the paper profile matching a page extent.
///
/// Known sizes are matched in either orientation; anything else gets a
/// custom profile with the default Adobe margins.
pub fn find_profile(width: f32, height: f32) -> PaperProfile {
    let portrait = height >= width;
    for paper in KNOWN_PAPERS {
        if portrait
            && feq(paper.width, width, PAPER_MATCH_TOLERANCE)
            && feq(paper.height, height, PAPER_MATCH_TOLERANCE)
        {
            return paper;
        }
        if !portrait
            && feq(paper.height, width, PAPER_MATCH_TOLERANCE)
            && feq(paper.width, height, PAPER_MATCH_TOLERANCE)
        {
            return paper.landscape();
        }
    }
    let (hm, vm) = if portrait {
        (DEFAULT_HORIZONTAL_MARGIN, DEFAULT_VERTICAL_MARGIN)
    } else {
        (DEFAULT_VERTICAL_MARGIN, DEFAULT_HORIZONTAL_MARGIN)
    };
    PaperProfile {
        name: "custom",
        width,
        height,
        left_margin: hm,
        top_margin: vm,
        right_margin: hm,
        bottom_margin: vm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_portrait_matches() {
        let paper = find_profile(595.35, 841.995);
        assert_eq!(paper.name, "A4-adobe");
        assert_eq!(paper.left_margin, DEFAULT_HORIZONTAL_MARGIN);
        assert_eq!(paper.top_margin, DEFAULT_VERTICAL_MARGIN);
    }

    #[test]
    fn test_a4_landscape_swaps_margins() {
        let paper = find_profile(841.995, 595.35);
        assert_eq!(paper.name, "A4-adobe");
        assert!(paper.width > paper.height);
        assert_eq!(paper.left_margin, DEFAULT_VERTICAL_MARGIN);
        assert_eq!(paper.top_margin, DEFAULT_HORIZONTAL_MARGIN);
    }

    #[test]
    fn test_us_letter_matches() {
        let paper = find_profile(216.0 * 2.835, 279.0 * 2.835);
        assert_eq!(paper.name, "us-letter");
    }

    #[test]
    fn test_unknown_size_falls_back_to_custom() {
        let paper = find_profile(500.0, 500.0);
        assert_eq!(paper.name, "custom");
        assert_eq!(paper.width, 500.0);
        assert_eq!(paper.left_margin, DEFAULT_HORIZONTAL_MARGIN);
        assert_eq!(paper.bottom_margin, DEFAULT_VERTICAL_MARGIN);
    }

    #[test]
    fn test_content_frame_uses_page_extent() {
        let paper = find_profile(612.36, 790.965);
        let frame = paper.content_frame(&Rect::new(0.0, 0.0, 612.36, 790.965));
        assert!((frame.left() - 13.0 * 2.835).abs() < 0.01);
        assert!((frame.right() - (612.36 - 13.0 * 2.835)).abs() < 0.01);
    }
}
