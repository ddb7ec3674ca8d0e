//! End-to-end pipeline tests: operator streams in, linked paragraphs out.

use pdf_layout::content::{Glyph, Matrix, Operator};
use pdf_layout::page::FontInfo;
use pdf_layout::scene::tags;
use pdf_layout::text::PaginationType;
use pdf_layout::{DocumentModeler, LayoutConfig, PageInput};

const PAGE_W: f32 = 595.35;
const PAGE_H: f32 = 841.995;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn show_cjk(n: usize) -> Operator {
    let glyphs = "报告期内公司经营情况良好主要业务稳步推进收入保持增长利润率稳定"
        .chars()
        .cycle()
        .take(n)
        .map(|c| Glyph::new(c.to_string(), 1000.0, 1000.0))
        .collect();
    Operator::ShowText { glyphs }
}

fn show_latin(text: &str) -> Operator {
    Operator::ShowText {
        glyphs: text
            .chars()
            .map(|c| Glyph::new(c.to_string(), 500.0, 700.0))
            .collect(),
    }
}

/// A text line at display-space position, on a page of A4 height.
fn cjk_line_ops(x: f32, display_bottom: f32, n: usize, size: f32) -> Vec<Operator> {
    vec![
        Operator::BeginText,
        Operator::SetFont {
            name: "F1".into(),
            size,
        },
        Operator::SetTextMatrix {
            matrix: Matrix::translation(x, PAGE_H - display_bottom),
        },
        show_cjk(n),
        Operator::EndText,
    ]
}

fn page(page_number: u32, ops: Vec<Operator>) -> PageInput {
    let mut input = PageInput::new(page_number, PAGE_W, PAGE_H);
    input
        .fonts
        .insert("F1".into(), FontInfo::new("STSong", true, 250.0));
    input.operators = ops;
    input
}

#[test]
fn test_wrapped_lines_become_one_paragraph() {
    init_logs();
    let mut ops = cjk_line_ops(90.0, 400.0, 42, 10.5);
    ops.extend(cjk_line_ops(90.0, 413.0, 42, 10.5));
    ops.extend(cjk_line_ops(90.0, 426.0, 20, 10.5));
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, ops)], None);
    assert!(model.failures.is_empty());
    let paragraphs: Vec<_> = model.pages[0].paragraphs.iter().collect();
    assert_eq!(paragraphs.len(), 1);
    assert_eq!(paragraphs[0].block().line_count(), 3);
    assert_eq!(paragraphs[0].text().chars().count(), 104);
}

#[test]
fn test_heading_separated_from_body() {
    init_logs();
    let mut ops = cjk_line_ops(90.0, 120.0, 8, 16.0);
    ops.extend(cjk_line_ops(90.0, 150.0, 42, 10.5));
    ops.extend(cjk_line_ops(90.0, 163.0, 42, 10.5));
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, ops)], None);
    let page_model = &model.pages[0];
    assert_eq!(page_model.paragraphs.len(), 2);
    assert_eq!(page_model.paragraphs[0].block().line_count(), 1);
    assert_eq!(page_model.paragraphs[1].block().line_count(), 2);
}

/// A hairline rule across the top of the page, page-number text above
/// it, and body text below.
fn header_framed_page_ops() -> Vec<Operator> {
    let mut ops = vec![
        Operator::Rectangle {
            x: 28.0,
            y: PAGE_H - 60.5,
            width: 540.0,
            height: 0.5,
        },
        Operator::Fill,
        Operator::BeginText,
        Operator::SetFont {
            name: "F1".into(),
            size: 9.0,
        },
        Operator::SetTextMatrix {
            matrix: Matrix::translation(280.0, PAGE_H - 50.0),
        },
        show_latin("12"),
        Operator::EndText,
    ];
    ops.extend(cjk_line_ops(90.0, 200.0, 42, 10.5));
    ops
}

#[test]
fn test_drawn_header_line_frames_the_page() {
    init_logs();
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, header_framed_page_ops())], None);
    let page_model = &model.pages[0];
    assert!(page_model.frame.top_from_line);
    assert!(page_model.frame.bounds.top() > 59.0 && page_model.frame.bounds.top() < 62.0);
    // The page number above the line is a header run, not body text.
    let header = page_model
        .paragraphs
        .iter()
        .find(|p| p.text() == "12")
        .expect("page number paragraph");
    assert_eq!(header.pagination(), PaginationType::Header);
    assert_eq!(page_model.body_paragraphs().count(), 1);
}

#[test]
fn test_paragraph_continues_across_pages() {
    init_logs();
    let mut first = cjk_line_ops(90.0, 767.0, 42, 10.5);
    first.extend(cjk_line_ops(90.0, 780.0, 42, 10.5));
    let second = cjk_line_ops(90.0, 80.0, 42, 10.5);
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, first), page(2, second)], None);
    assert!(model.failures.is_empty());
    let tail = model.pages[0].paragraphs.last().unwrap();
    assert_eq!(tail.cross_page_next, Some((2, 0)));
    let texts = model.merged_texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].chars().count(), 126);
}

#[test]
fn test_exhausted_budget_is_recorded_not_fatal() {
    init_logs();
    let ops = cjk_line_ops(90.0, 400.0, 42, 10.5);
    let config = LayoutConfig::default().with_page_budget_ms(0);
    let model = DocumentModeler::new(config)
        .model_document(&[page(1, ops.clone()), page(2, ops)], None);
    assert!(model.pages.is_empty());
    assert_eq!(model.failures.len(), 2);
    assert!(model.failures.iter().all(|(_, e)| e.is_timeout()));
}

#[test]
fn test_merged_texts_skip_page_furniture() {
    init_logs();
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, header_framed_page_ops())], None);
    let texts = model.merged_texts();
    assert_eq!(texts.len(), 1);
    assert!(!texts.iter().any(|t| t == "12"));
    assert_eq!(texts[0].chars().count(), 42);
}

#[test]
fn test_modeling_passes_share_cached_graphs() {
    init_logs();
    let modeler = DocumentModeler::new(LayoutConfig::default());
    let first = modeler.model_document(&[page(1, header_framed_page_ops())], None);
    assert!(first.failures.is_empty());
    assert!(modeler.cache().contains(1));
    // A second pass reads the cached graph; the builder must not run.
    let shared = modeler
        .cache()
        .get_or_build(1, || unreachable!("cached page must not rebuild"))
        .unwrap();
    assert_eq!(shared.page_number, 1);
    // Detection results were published onto the shared graph.
    assert!(shared.tag(tags::PAGINATION_FRAME).is_some());
    assert!(shared.tag(tags::PAPER).is_some());
}

#[test]
fn test_timed_out_page_fails_fast_on_later_passes() {
    init_logs();
    let ops = cjk_line_ops(90.0, 400.0, 42, 10.5);
    let modeler = DocumentModeler::new(LayoutConfig::default().with_page_budget_ms(0));
    let first = modeler.model_document(&[page(1, ops.clone())], None);
    assert_eq!(first.failures.len(), 1);
    // The timeout is remembered; a later pass must not pay for the
    // build again.
    let err = modeler
        .cache()
        .get_or_build(1, || unreachable!("sticky timeout must not rebuild"))
        .unwrap_err();
    assert!(err.is_timeout());
    let second = modeler.model_document(&[page(1, ops)], None);
    assert_eq!(second.failures.len(), 1);
    assert!(second.failures[0].1.is_timeout());
}

#[test]
fn test_paragraphs_numbered_across_document() {
    init_logs();
    let mut first = cjk_line_ops(90.0, 120.0, 8, 16.0);
    first.extend(cjk_line_ops(90.0, 150.0, 42, 10.5));
    let second = cjk_line_ops(90.0, 80.0, 42, 10.5);
    let model = DocumentModeler::new(LayoutConfig::default())
        .model_document(&[page(1, first), page(2, second)], None);
    let seqs: Vec<usize> = model.paragraphs().map(|p| p.seq).collect();
    assert_eq!(seqs, (0..seqs.len()).collect::<Vec<_>>());
    assert!(seqs.len() >= 3);
}
