//! Property tests for the line merge pass.

use proptest::prelude::*;

use pdf_layout::geometry::Rect;
use pdf_layout::text::{TextChunk, TextChunkMerger, TextElement};
use pdf_layout::LayoutConfig;

fn run(x: f32, baseline: f32, text: &str, size: f32) -> TextChunk {
    let mut elements = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        elements.push(TextElement::new(
            Rect::new(x + i as f32 * size * 0.5, baseline - size, size * 0.5, size),
            ch.to_string(),
            "F1",
            size,
        ));
    }
    TextChunk::from_elements(elements)
}

/// Runs scattered across a handful of baselines.
fn arb_runs() -> impl Strategy<Value = Vec<TextChunk>> {
    prop::collection::vec(
        (
            20.0f32..520.0,
            prop::sample::select(vec![100.0f32, 160.0, 220.0, 280.0]),
            "[a-z]{1,8}",
        ),
        1..24,
    )
    .prop_map(|specs| {
        // Suffix each run with its index so no run reads as a shadow
        // (double-strike duplicate) of another.
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (x, baseline, text))| run(x, baseline, &format!("{text}{i}"), 10.0))
            .collect()
    })
}

proptest! {
    /// Folding already-folded lines changes nothing.
    #[test]
    fn merge_to_line_is_idempotent(runs in arb_runs()) {
        let merger = TextChunkMerger::new(&LayoutConfig::default());
        let once = merger.merge_to_line(runs);
        let texts: Vec<String> = once.iter().map(|c| c.text()).collect();
        let twice = merger.merge_to_line(once);
        prop_assert_eq!(twice.len(), texts.len());
        for (chunk, text) in twice.iter().zip(&texts) {
            prop_assert_eq!(&chunk.text(), text);
        }
    }

    /// Gap-bounded merging never drops drawn glyphs.
    #[test]
    fn merge_preserves_glyphs(runs in arb_runs()) {
        let total: usize = runs.iter().map(|c| c.elements.len()).sum();
        let merger = TextChunkMerger::new(&LayoutConfig::default());
        let merged = merger.merge(runs);
        let kept: usize = merged
            .iter()
            .map(|c| c.elements.iter().filter(|e| !e.mock).count())
            .sum();
        prop_assert_eq!(kept, total);
    }

    /// Line folding never loses or invents glyphs.
    #[test]
    fn merge_to_line_preserves_glyphs(runs in arb_runs()) {
        let total: usize = runs.iter().map(|c| c.elements.len()).sum();
        let merger = TextChunkMerger::new(&LayoutConfig::default());
        let lines = merger.merge_to_line(runs);
        let kept: usize = lines
            .iter()
            .map(|c| c.elements.iter().filter(|e| !e.mock).count())
            .sum();
        prop_assert_eq!(kept, total);
    }

    /// Every folded line sits on a single baseline band.
    #[test]
    fn merged_lines_do_not_span_baselines(runs in arb_runs()) {
        let merger = TextChunkMerger::new(&LayoutConfig::default());
        for line in merger.merge_to_line(runs) {
            let bottoms: Vec<f32> = line
                .elements
                .iter()
                .filter(|e| !e.mock)
                .map(|e| e.bounds.bottom())
                .collect();
            let min = bottoms.iter().cloned().fold(f32::MAX, f32::min);
            let max = bottoms.iter().cloned().fold(f32::MIN, f32::max);
            prop_assert!(max - min < 10.0);
        }
    }
}
