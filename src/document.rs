//! The document pipeline.
//!
//! Turns resolved page inputs into [`PageModel`]s: scene graph, tagged
//! structure, pagination frame, text regions, and paragraphs, then
//! links interrupted paragraphs across page breaks. Pages that fail are
//! recorded and skipped so one bad page never sinks the document.

use log::warn;

use crate::cache::PageCache;
use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::{
    build_groups, LineTagger, Paragraph, ParagraphId, ParagraphMerger, TextGroup,
};
use crate::linker::link_pages;
use crate::page::PageInput;
use crate::pagination::{detect_pagination_frame, find_profile, PaginationFrame};
use crate::scene::{tags, SceneBuilder, SceneGraph, TagValue};
use crate::structure::{reconcile, StructTree, TextTree};
use crate::text::TextChunk;

/// Everything derived from one page.
#[derive(Debug)]
pub struct PageModel {
    /// One-based page number.
    pub page_number: u32,
    /// Display-space page bounds.
    pub bounds: Rect,
    /// Scene graph with pagination tags applied.
    pub scene: SceneGraph,
    /// Text organized by the tagged structure, when one was usable.
    pub text_tree: Option<TextTree>,
    /// Detected header, footer, and wing boundaries.
    pub frame: PaginationFrame,
    /// Spatial text regions in reading order.
    pub groups: Vec<TextGroup>,
    /// Paragraphs in reading order; `pid` equals the vector index.
    pub paragraphs: Vec<Paragraph>,
}

impl PageModel {
    /// Paragraphs that carry body text, skipping header and footer runs.
    pub fn body_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs
            .iter()
            .filter(|p| p.pagination() == crate::text::PaginationType::None)
    }
}

/// A fully modeled document with per-page failure accounting.
#[derive(Debug, Default)]
pub struct DocumentModel {
    /// Successfully modeled pages, in page order.
    pub pages: Vec<PageModel>,
    /// Pages that could not be modeled, with the error that stopped them.
    pub failures: Vec<(u32, Error)>,
}

impl DocumentModel {
    /// The model for one page, if it was built.
    pub fn page(&self, page_number: u32) -> Option<&PageModel> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    /// Look up a paragraph by its document-wide identifier.
    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.page(id.0)?.paragraphs.get(id.1)
    }

    /// All paragraphs in page order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.pages.iter().flat_map(|p| p.paragraphs.iter())
    }

    /// Paragraph texts with cross-page continuations joined.
    ///
    /// A linked chain contributes one string, emitted at the position
    /// of its first member. Header, footer, and wing paragraphs are
    /// left out.
    pub fn merged_texts(&self) -> Vec<String> {
        let mut out = Vec::new();
        for p in self.paragraphs() {
            if p.cross_page_prev.is_some() || p.pagination().is_pagination() {
                continue;
            }
            let mut text = p.text();
            let mut next = p.cross_page_next;
            while let Some(id) = next {
                match self.paragraph(id) {
                    Some(cont) => {
                        text.push_str(&cont.text());
                        next = cont.cross_page_next;
                    }
                    None => break,
                }
            }
            out.push(text);
        }
        out
    }
}

/// Builds [`DocumentModel`]s from page inputs.
///
/// Scene graphs are built through an internal [`PageCache`], so several
/// extraction passes over the same modeler share one build per page and
/// a page that blew its budget fails fast on every later pass.
pub struct DocumentModeler {
    config: LayoutConfig,
    scene_builder: SceneBuilder,
    merger: ParagraphMerger,
    cache: PageCache,
}

impl DocumentModeler {
    /// Create a modeler with the given configuration.
    pub fn new(config: LayoutConfig) -> Self {
        DocumentModeler {
            scene_builder: SceneBuilder::new(&config),
            merger: ParagraphMerger::new(&config),
            cache: PageCache::new(&config),
            config,
        }
    }

    /// The modeler's page cache.
    ///
    /// Other consumers of the same document (chart and table passes)
    /// read built graphs from here instead of rebuilding pages.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Installs a line tagger for paragraph merging and linking.
    pub fn with_tagger(mut self, tagger: Box<dyn LineTagger + Send + Sync>) -> Self {
        self.merger = ParagraphMerger::new(&self.config).with_tagger(tagger);
        self
    }

    /// Models every page and links paragraphs across page breaks.
    ///
    /// Page failures are collected in [`DocumentModel::failures`]; the
    /// remaining pages are still modeled and linked.
    pub fn model_document(
        &self,
        pages: &[PageInput],
        mut tree: Option<&mut StructTree>,
    ) -> DocumentModel {
        let mut model = DocumentModel::default();
        for page in pages {
            match self.model_page(page, tree.as_deref_mut()) {
                Ok(modeled) => model.pages.push(modeled),
                Err(err) => {
                    warn!("page {} failed: {}", page.page_number, err);
                    model.failures.push((page.page_number, err));
                }
            }
        }
        link_pages(&mut model.pages, &self.merger);
        let mut seq = 0usize;
        for page in &mut model.pages {
            for paragraph in &mut page.paragraphs {
                paragraph.seq = seq;
                seq += 1;
            }
        }
        model
    }

    /// Models a single page.
    ///
    /// The scene graph comes from the page cache; a sticky timeout from
    /// an earlier pass returns immediately without rebuilding.
    pub fn model_page(
        &self,
        page: &PageInput,
        tree: Option<&mut StructTree>,
    ) -> Result<PageModel> {
        let shared = self
            .cache
            .get_or_build(page.page_number, || self.scene_builder.build(page))?;
        // Chunk classification mutates the graph, so it runs on a
        // private copy; page tags are published back onto the shared
        // graph below.
        let mut scene = SceneGraph::clone(&shared);
        let text_tree = tree.and_then(|t| reconcile(t, page));
        if let Some(tree) = &text_tree {
            if tree.broken {
                scene.set_tag(tags::STRUCTURE_BROKEN, TagValue::Bool(true));
            }
        }
        let paper = find_profile(page.width(), page.height());
        let frame = if self.config.detect_pagination {
            detect_pagination_frame(&mut scene, &paper, &self.config)
        } else {
            PaginationFrame {
                bounds: paper.content_frame(&page.bounds()),
                ..PaginationFrame::default()
            }
        };
        let mut chunks: Vec<TextChunk> = scene.text_chunks().into_iter().cloned().collect();
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.group_index = i;
        }
        for (key, value) in scene.tag_map() {
            shared.set_tag(&key, value);
        }
        let groups = build_groups(chunks);
        let mut paragraphs = Vec::new();
        for (group_index, group) in groups.iter().enumerate() {
            for block in self.merger.merge_group(group) {
                let mut paragraph =
                    Paragraph::new(page.page_number, paragraphs.len(), block);
                paragraph.group_index = group_index;
                paragraphs.push(paragraph);
            }
        }
        Ok(PageModel {
            page_number: page.page_number,
            bounds: page.bounds(),
            scene,
            text_tree,
            frame,
            groups,
            paragraphs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TextBlock;
    use crate::text::TextElement;

    fn cjk_line(x: f32, y: f32, n: usize, size: f32) -> TextChunk {
        let glyphs: Vec<char> = "报告期内公司经营情况良好主要业务稳步推进收入保持增长"
            .chars()
            .cycle()
            .take(n)
            .collect();
        let mut elements = Vec::new();
        for (i, ch) in glyphs.into_iter().enumerate() {
            elements.push(TextElement::new(
                Rect::new(x + i as f32 * size, y, size, size),
                ch.to_string(),
                "F1",
                size,
            ));
        }
        TextChunk::from_elements(elements)
    }

    fn page_with_lines(page_number: u32, lines: Vec<TextChunk>) -> PageModel {
        let bounds = Rect::new(0.0, 0.0, 595.35, 841.995);
        let mut group = TextGroup::new(lines[0].clone());
        for line in &lines[1..] {
            group.add(line.clone());
        }
        let mut paragraphs = Vec::new();
        for (pid, line) in lines.into_iter().enumerate() {
            paragraphs.push(Paragraph::new(page_number, pid, TextBlock::new(line)));
        }
        PageModel {
            page_number,
            bounds,
            scene: SceneGraph::new(page_number, bounds),
            text_tree: None,
            frame: PaginationFrame::default(),
            groups: vec![group],
            paragraphs,
        }
    }

    #[test]
    fn test_empty_page_models_without_paragraphs() {
        let modeler = DocumentModeler::new(LayoutConfig::default());
        let input = PageInput::new(1, 595.35, 841.995);
        let model = modeler.model_document(&[input], None);
        assert!(model.failures.is_empty());
        assert_eq!(model.pages.len(), 1);
        assert!(model.pages[0].paragraphs.is_empty());
    }

    #[test]
    fn test_cross_page_chain_joins_text() {
        // A full-measure line at the page tail continues onto the next
        // page; the merged view reads as one paragraph.
        let tail = cjk_line(90.0, 780.0, 42, 10.5);
        let head = cjk_line(90.0, 80.0, 42, 10.5);
        let mut pages = vec![
            page_with_lines(1, vec![tail]),
            page_with_lines(2, vec![head]),
        ];
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        link_pages(&mut pages, &merger);
        assert_eq!(pages[0].paragraphs[0].cross_page_next, Some((2, 0)));
        assert_eq!(pages[1].paragraphs[0].cross_page_prev, Some((1, 0)));
        let model = DocumentModel {
            pages,
            failures: Vec::new(),
        };
        let texts = model.merged_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].chars().count(), 84);
    }

    #[test]
    fn test_closed_paragraph_does_not_link() {
        // The page tail ends in a period short of the measure.
        let body = cjk_line(90.0, 760.0, 42, 10.5);
        let mut tail = cjk_line(90.0, 780.0, 16, 10.5);
        let period = TextElement::new(
            Rect::new(90.0 + 16.0 * 10.5, 780.0, 10.5, 10.5),
            "。",
            "F1",
            10.5,
        );
        tail.push(period);
        let head = cjk_line(90.0, 80.0, 42, 10.5);
        let mut pages = vec![
            page_with_lines(1, vec![body, tail]),
            page_with_lines(2, vec![head]),
        ];
        let merger = ParagraphMerger::new(&LayoutConfig::default());
        link_pages(&mut pages, &merger);
        assert!(pages[0].paragraphs[1].cross_page_next.is_none());
        assert!(pages[1].paragraphs[0].cross_page_prev.is_none());
    }
}
