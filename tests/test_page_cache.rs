//! Page cache behavior against the real scene builder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use pdf_layout::content::{Glyph, Matrix, Operator};
use pdf_layout::page::FontInfo;
use pdf_layout::scene::SceneBuilder;
use pdf_layout::{LayoutConfig, PageCache, PageInput};

fn page(page_number: u32) -> PageInput {
    let mut input = PageInput::new(page_number, 595.35, 841.995);
    input
        .fonts
        .insert("F1".into(), FontInfo::new("Helvetica", true, 250.0));
    input.operators = vec![
        Operator::BeginText,
        Operator::SetFont {
            name: "F1".into(),
            size: 12.0,
        },
        Operator::SetTextMatrix {
            matrix: Matrix::translation(100.0, 700.0),
        },
        Operator::ShowText {
            glyphs: vec![Glyph::new("x", 500.0, 700.0)],
        },
        Operator::EndText,
    ];
    input
}

#[test]
fn test_concurrent_readers_share_one_build() {
    let config = LayoutConfig::default();
    let cache = Arc::new(PageCache::new(&config));
    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(6));
    let mut handles = Vec::new();
    for _ in 0..6 {
        let cache = Arc::clone(&cache);
        let builds = Arc::clone(&builds);
        let barrier = Arc::clone(&barrier);
        let config = config.clone();
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            cache
                .get_or_build(1, || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    SceneBuilder::new(&config).build(&page(1))
                })
                .unwrap()
        }));
    }
    let graphs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    for g in &graphs {
        assert_eq!(g.page_number, 1);
        assert!(Arc::ptr_eq(&graphs[0], g));
    }
}

#[test]
fn test_capacity_evicts_in_arrival_order() {
    let config = LayoutConfig::default().with_max_cached_pages(2);
    let cache = PageCache::new(&config);
    for n in 1..=4 {
        cache
            .get_or_build(n, || SceneBuilder::new(&config).build(&page(n)))
            .unwrap();
    }
    assert!(!cache.contains(1));
    assert!(!cache.contains(2));
    assert!(cache.contains(3));
    assert!(cache.contains(4));
}

#[test]
fn test_timeout_sticks_until_reload() {
    let config = LayoutConfig::default();
    let cache = PageCache::new(&config);
    let strict = LayoutConfig::default().with_page_budget_ms(0);
    let err = cache
        .get_or_build(1, || SceneBuilder::new(&strict).build(&page(1)))
        .unwrap_err();
    assert!(err.is_timeout());
    // Stays failed without touching the builder again.
    let err = cache
        .get_or_build(1, || unreachable!("sticky timeout must not rebuild"))
        .unwrap_err();
    assert!(err.is_timeout());
    // Reload clears the marker and rebuilds in one step.
    let graph = cache
        .reload(1, || SceneBuilder::new(&config).build(&page(1)))
        .unwrap();
    assert_eq!(graph.glyph_count, 1);
    assert!(cache.contains(1));
}
