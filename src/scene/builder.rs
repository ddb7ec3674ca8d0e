//! Scene graph construction from a page's operator stream.
//!
//! The builder dispatches operators against a graphics state stack, turning
//! painted paths, placed images, and shown glyphs into scene items. Nested
//! form XObjects open child groups; marked-content sequences annotate items
//! with their identifiers; a wall-clock deadline is checked once per
//! dispatched operator.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::config::{thresholds, LayoutConfig};
use crate::content::{render_mode, GraphicsState, GraphicsStateStack, Matrix, Operator};
use crate::content::operators::{Glyph, MarkedContentProps};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::page::{FontInfo, PageInput, ResourceSummary};
use crate::text::{TextChunk, TextElement, TextStyle};

use super::group::{GroupId, ImageItem, PathItem, SceneGraph, SceneItem};

/// Nested forms deeper than this are skipped; real documents never get
/// close, self-referencing ones loop forever.
const MAX_FORM_DEPTH: usize = 15;

/// Whether a stream's resource dictionary looks like an irregular painting
/// or cover page rather than document content.
///
/// Pages with ActualText spans legitimately carry one form per span, so the
/// span count loosens the XObject bound.
pub fn is_painting(resources: &ResourceSummary, actual_text_count: usize) -> bool {
    resources.non_image_xobjects > thresholds::PAINTING_XOBJECT_COUNT + actual_text_count
        || resources.shadings > thresholds::PAINTING_SHADING_COUNT
}

/// Builds a [`SceneGraph`] from a [`PageInput`].
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    budget: Duration,
}

impl SceneBuilder {
    /// Create a builder using the config's page budget.
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            budget: Duration::from_millis(config.page_budget_ms),
        }
    }

    /// Build the page's scene graph.
    ///
    /// Returns [`Error::Timeout`] once the page budget is exceeded; the
    /// partially built graph is dropped.
    pub fn build(&self, page: &PageInput) -> Result<SceneGraph> {
        let mut graph = SceneGraph::new(page.page_number, page.bounds());

        if is_painting(&page.resources, page.actual_text_count) {
            warn!(
                "page {} looks like a painting/cover ({} non-image xobjects, {} shadings), skipping content",
                page.page_number, page.resources.non_image_xobjects, page.resources.shadings
            );
            let root = graph.root();
            graph.group_mut(root).skipped_painting = true;
            return Ok(graph);
        }

        let mut states = GraphicsStateStack::new();
        states.current_mut().ctm = page.page_matrix();

        let mut run = DispatchState {
            page,
            deadline: Instant::now() + self.budget,
            budget_ms: self.budget.as_millis() as u64,
        };
        let root = graph.root();
        dispatch_stream(&page.operators, page, &mut graph, root, &mut states, &mut run, 0)?;
        debug!(
            "page {}: {} groups, {} glyphs",
            page.page_number,
            graph.group_count(),
            graph.glyph_count
        );
        Ok(graph)
    }
}

struct DispatchState<'a> {
    page: &'a PageInput,
    deadline: Instant,
    budget_ms: u64,
}

impl DispatchState<'_> {
    fn check_deadline(&self) -> Result<()> {
        if Instant::now() >= self.deadline {
            Err(Error::Timeout {
                page: self.page.page_number,
                budget_ms: self.budget_ms,
            })
        } else {
            Ok(())
        }
    }
}

/// Per-stream dispatch context. Forms get a fresh one; the deadline and the
/// graph are shared across the recursion.
struct StreamContext<'a> {
    font: Option<&'a FontInfo>,
    chunk: Option<TextChunk>,
    chunk_serial: usize,
    path: Option<Rect>,
    pending_clip: bool,
    mc_stack: Vec<McEntry>,
    in_tiling: bool,
}

struct McEntry {
    props: MarkedContentProps,
    chunk_serial: usize,
    element_snapshot: usize,
}

impl<'a> StreamContext<'a> {
    fn new(in_tiling: bool) -> Self {
        Self {
            font: None,
            chunk: None,
            chunk_serial: 0,
            path: None,
            pending_clip: false,
            mc_stack: Vec::new(),
            in_tiling,
        }
    }

    fn current_mcid(&self) -> Option<i32> {
        self.mc_stack.iter().rev().find_map(|e| e.props.mcid)
    }

    fn flush_chunk(&mut self, graph: &mut SceneGraph, group: GroupId) {
        if let Some(chunk) = self.chunk.take() {
            if !chunk.elements.is_empty() {
                graph.group_mut(group).items.push(SceneItem::Text(chunk));
            }
            self.chunk_serial += 1;
        }
    }
}

fn dispatch_stream(
    operators: &[Operator],
    page: &PageInput,
    graph: &mut SceneGraph,
    group: GroupId,
    states: &mut GraphicsStateStack,
    run: &mut DispatchState,
    depth: usize,
) -> Result<()> {
    let mut ctx = StreamContext::new(false);
    dispatch_into(operators, page, graph, group, states, run, &mut ctx, depth)?;
    ctx.flush_chunk(graph, group);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn dispatch_into<'a>(
    operators: &[Operator],
    page: &'a PageInput,
    graph: &mut SceneGraph,
    group: GroupId,
    states: &mut GraphicsStateStack,
    run: &mut DispatchState,
    ctx: &mut StreamContext<'a>,
    depth: usize,
) -> Result<()> {
    for op in operators {
        run.check_deadline()?;
        match op {
            Operator::SaveState => states.save(),
            Operator::RestoreState => states.restore(),
            Operator::Concat { matrix } => {
                let state = states.current_mut();
                state.ctm = matrix.multiply(&state.ctm);
            }
            Operator::SetLineWidth { width } => states.current_mut().line_width = *width,
            Operator::SetFillColor { color } => states.current_mut().fill_color = *color,
            Operator::SetStrokeColor { color } => states.current_mut().stroke_color = *color,

            Operator::MoveTo { x, y } | Operator::LineTo { x, y } => {
                extend_path(&mut ctx.path, *x, *y);
            }
            Operator::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
            } => {
                extend_path(&mut ctx.path, *x1, *y1);
                extend_path(&mut ctx.path, *x2, *y2);
                extend_path(&mut ctx.path, *x3, *y3);
            }
            Operator::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                extend_path(&mut ctx.path, *x, *y);
                extend_path(&mut ctx.path, x + width, y + height);
            }
            Operator::ClosePath => {}

            Operator::Clip => ctx.pending_clip = true,
            Operator::Fill => finish_path(graph, group, states, ctx, true, false),
            Operator::Stroke => finish_path(graph, group, states, ctx, false, true),
            Operator::FillStroke => finish_path(graph, group, states, ctx, true, true),
            Operator::EndPath => finish_path(graph, group, states, ctx, false, false),

            Operator::ShadingFill { name, bbox, color } => {
                let state = states.current();
                let area = match bbox {
                    Some(b) => state.ctm.transform_rect(b),
                    None => state.clip.unwrap_or(graph.bounds),
                };
                if let Some(bounds) = state.clipped(area) {
                    graph.group_mut(group).items.push(SceneItem::Path(PathItem {
                        bounds,
                        fill_color: *color,
                        stroke_color: None,
                        line_width: 0.0,
                        shading: Some(name.clone()),
                        mcid: ctx.current_mcid(),
                    }));
                }
            }

            Operator::BeginText => {
                let state = states.current_mut();
                state.text_matrix = Matrix::identity();
                state.text_line_matrix = Matrix::identity();
            }
            Operator::EndText => ctx.flush_chunk(graph, group),
            Operator::SetFont { name, size } => {
                ctx.font = page.fonts.get(name);
                if ctx.font.is_none() {
                    debug!("font {} not in resource table", name);
                }
                let state = states.current_mut();
                state.font_name = Some(name.clone());
                state.font_size = *size;
            }
            Operator::SetCharSpace { spacing } => states.current_mut().char_space = *spacing,
            Operator::SetWordSpace { spacing } => states.current_mut().word_space = *spacing,
            Operator::SetHorizontalScaling { scale } => {
                states.current_mut().horizontal_scaling = *scale
            }
            Operator::SetLeading { leading } => states.current_mut().leading = *leading,
            Operator::SetTextRise { rise } => states.current_mut().text_rise = *rise,
            Operator::SetRenderMode { mode } => states.current_mut().render_mode = *mode,
            Operator::MoveText { tx, ty } => {
                ctx.flush_chunk(graph, group);
                let state = states.current_mut();
                state.text_line_matrix =
                    Matrix::translation(*tx, *ty).multiply(&state.text_line_matrix);
                state.text_matrix = state.text_line_matrix;
            }
            Operator::MoveTextSetLeading { tx, ty } => {
                ctx.flush_chunk(graph, group);
                let state = states.current_mut();
                state.leading = -*ty;
                state.text_line_matrix =
                    Matrix::translation(*tx, *ty).multiply(&state.text_line_matrix);
                state.text_matrix = state.text_line_matrix;
            }
            Operator::SetTextMatrix { matrix } => {
                ctx.flush_chunk(graph, group);
                let state = states.current_mut();
                state.text_matrix = *matrix;
                state.text_line_matrix = *matrix;
            }
            Operator::NextLine => {
                ctx.flush_chunk(graph, group);
                let state = states.current_mut();
                state.text_line_matrix =
                    Matrix::translation(0.0, -state.leading).multiply(&state.text_line_matrix);
                state.text_matrix = state.text_line_matrix;
            }
            Operator::ShowText { glyphs } => {
                show_glyphs(glyphs, graph, states.current_mut(), ctx);
            }

            Operator::DrawImage { name } => {
                ctx.flush_chunk(graph, group);
                draw_image(name, page, graph, group, states.current(), ctx);
            }
            Operator::DrawForm { name } => {
                ctx.flush_chunk(graph, group);
                draw_form(name, page, graph, group, states, run, ctx, depth)?;
            }

            Operator::BeginMarkedContent { props } => {
                ctx.mc_stack.push(McEntry {
                    props: props.clone(),
                    chunk_serial: ctx.chunk_serial,
                    element_snapshot: ctx.chunk.as_ref().map(|c| c.elements.len()).unwrap_or(0),
                });
            }
            Operator::EndMarkedContent => {
                if let Some(entry) = ctx.mc_stack.pop() {
                    finish_marked_content(entry, ctx);
                }
            }
        }
    }
    Ok(())
}

fn extend_path(path: &mut Option<Rect>, x: f32, y: f32) {
    let point = Rect::new(x, y, 0.0, 0.0);
    *path = Some(match path {
        Some(r) => r.union(&point),
        None => point,
    });
}

fn finish_path(
    graph: &mut SceneGraph,
    group: GroupId,
    states: &mut GraphicsStateStack,
    ctx: &mut StreamContext,
    filled: bool,
    stroked: bool,
) {
    let Some(user_bounds) = ctx.path.take() else {
        ctx.pending_clip = false;
        return;
    };
    let state = states.current_mut();
    let display = state.ctm.transform_rect(&user_bounds);
    if ctx.pending_clip {
        state.intersect_clip(display);
        ctx.pending_clip = false;
    }
    if !filled && !stroked {
        return;
    }
    if let Some(bounds) = state.clipped(display) {
        let item = PathItem {
            bounds,
            fill_color: filled.then_some(state.fill_color),
            stroke_color: stroked.then_some(state.stroke_color),
            line_width: state.line_width * state.ctm.scale_x(),
            shading: None,
            mcid: ctx.current_mcid(),
        };
        graph.group_mut(group).items.push(SceneItem::Path(item));
    }
}

fn show_glyphs(
    glyphs: &[Glyph],
    graph: &mut SceneGraph,
    state: &mut GraphicsState,
    ctx: &mut StreamContext,
) {
    let th = state.horizontal_scaling / 100.0;
    for glyph in glyphs {
        let fs = state.font_size;
        let trm = Matrix {
            a: fs * th,
            b: 0.0,
            c: 0.0,
            d: fs,
            e: 0.0,
            f: state.text_rise,
        }
        .multiply(&state.text_matrix)
        .multiply(&state.ctm);

        let element = make_element(glyph, ctx.font, state, &trm);

        // Advance the text matrix by the declared displacement.
        let is_space = glyph.text == " ";
        let tx = (glyph.displacement / 1000.0 * fs
            + state.char_space
            + if is_space { state.word_space } else { 0.0 })
            * th;
        state.text_matrix = Matrix::translation(tx, 0.0).multiply(&state.text_matrix);

        graph.glyph_count += 1;
        let mut el = element;
        el.mcid = ctx.current_mcid();
        match &mut ctx.chunk {
            Some(chunk) => chunk.push(el),
            None => ctx.chunk = Some(TextChunk::new(el)),
        }
    }
}

/// Compute a display-space element for one glyph, correcting degenerate
/// metrics the way report generators commonly break them.
fn make_element(
    glyph: &Glyph,
    font: Option<&FontInfo>,
    state: &GraphicsState,
    trm: &Matrix,
) -> TextElement {
    let embedded = font.map(|f| f.embedded).unwrap_or(true);
    let cjk_font = font.map(|f| f.cjk).unwrap_or(false);
    let is_cjk = cjk_font
        || glyph
            .text
            .chars()
            .next()
            .map(crate::text::patterns::is_cjk_char)
            .unwrap_or(false);

    // Non-embedded fonts whose own metric disagrees with the declared
    // advance are rescaled to the advance.
    let mut width = glyph.font_width;
    if width <= 0.0
        || (!embedded
            && (width - glyph.displacement).abs() > thresholds::ADVANCE_MISMATCH * 1000.0)
    {
        width = glyph.displacement;
    }
    let w_frac = width / 1000.0;

    let mut h_frac = glyph.bbox_height / 1000.0;
    if h_frac <= 0.0 || (is_cjk && w_frac > 0.0 && h_frac / w_frac > thresholds::CJK_MAX_ASPECT) {
        h_frac = w_frac * thresholds::DEGENERATE_HEIGHT_FACTOR;
    }

    let bounds = trm.transform_rect(&Rect::new(0.0, 0.0, w_frac.max(1e-3), h_frac.max(1e-3)));

    let nominal_size = trm.scale_y();
    let style_size = if nominal_size < thresholds::MIN_REAL_FONT_SIZE {
        bounds.height.ceil() / thresholds::DEGENERATE_HEIGHT_FACTOR
    } else {
        nominal_size
    };

    let font_name = state.font_name.clone().unwrap_or_default();
    let lower = font_name.to_ascii_lowercase();
    let mut style = TextStyle::empty();
    if lower.contains("bold")
        || (state.render_mode == render_mode::FILL_STROKE
            && state.line_width < thresholds::FAKE_BOLD_MAX_LINE_WIDTH)
    {
        style |= TextStyle::BOLD;
    }
    if lower.contains("italic")
        || lower.contains("oblique")
        || trm.shear().abs() >= thresholds::ITALIC_SHEAR
    {
        style |= TextStyle::ITALIC;
    }

    let space_frac = font
        .map(|f| f.space_width)
        .filter(|w| *w > 0.0)
        .unwrap_or(250.0)
        / 1000.0;

    let mut hidden = state.render_mode == render_mode::INVISIBLE;
    let mut visible_bounds = bounds;
    if let Some(clip) = state.clip {
        // The clip is expanded by one glyph extent before the visibility
        // test; hairline clips along a text edge should not hide the run.
        if clip
            .expanded(bounds.width, bounds.height)
            .intersection(&bounds)
            .is_some()
        {
            visible_bounds = clip.intersection(&bounds).unwrap_or(bounds);
        } else {
            hidden = true;
        }
    }
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        hidden = true;
    }

    TextElement {
        bounds,
        visible_bounds,
        text: glyph.text.clone(),
        font_name,
        font_size: state.font_size,
        style_size,
        style,
        color: state.fill_color,
        rotation: trm.rotation_degrees(),
        space_width: space_frac * trm.scale_x(),
        hidden,
        mock: false,
        mcid: None,
        deleted: false,
    }
}

fn draw_image(
    name: &str,
    page: &PageInput,
    graph: &mut SceneGraph,
    group: GroupId,
    state: &GraphicsState,
    ctx: &StreamContext,
) {
    let bounds = state.ctm.transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
    let info = page.images.get(name);
    if let Some(text) = info.and_then(|i| i.actual_text.clone()) {
        // Text rendered as a picture: emit its substitute text as a normal
        // run so paragraph assembly sees it.
        let mut element = TextElement::new(bounds, text, name, bounds.height);
        element.mcid = ctx.current_mcid();
        graph
            .group_mut(group)
            .items
            .push(SceneItem::Text(TextChunk::new(element)));
        return;
    }
    graph.group_mut(group).items.push(SceneItem::Image(ImageItem {
        bounds,
        matrix: state.ctm,
        name: name.to_string(),
        mcid: ctx.current_mcid(),
    }));
}

#[allow(clippy::too_many_arguments)]
fn draw_form<'a>(
    name: &str,
    page: &'a PageInput,
    graph: &mut SceneGraph,
    group: GroupId,
    states: &mut GraphicsStateStack,
    run: &mut DispatchState,
    ctx: &mut StreamContext<'a>,
    depth: usize,
) -> Result<()> {
    let Some(form) = page.forms.get(name) else {
        debug!("form {} not in resource table", name);
        return Ok(());
    };
    if depth >= MAX_FORM_DEPTH {
        warn!("form nesting deeper than {}, skipping {}", MAX_FORM_DEPTH, name);
        return Ok(());
    }

    if form.tiling_pattern || ctx.in_tiling {
        // Tiling pattern content stays in the invoking group.
        states.save();
        {
            let state = states.current_mut();
            state.ctm = form.matrix.multiply(&state.ctm);
        }
        let mut inner = StreamContext::new(true);
        inner.font = ctx.font;
        dispatch_into(
            &form.operators,
            page,
            graph,
            group,
            states,
            run,
            &mut inner,
            depth + 1,
        )?;
        inner.flush_chunk(graph, group);
        states.restore();
        return Ok(());
    }

    let child = graph.add_group(group);
    graph.group_mut(child).form_name = Some(name.to_string());

    if is_painting(&form.resources, 0) {
        warn!("form {} looks like a painting, skipping content", name);
        graph.group_mut(child).skipped_painting = true;
        return Ok(());
    }

    states.save();
    {
        let state = states.current_mut();
        state.ctm = form.matrix.multiply(&state.ctm);
        if let Some(bbox) = form.bbox {
            let display = state.ctm.transform_rect(&bbox);
            state.intersect_clip(display);
        }
        graph.group_mut(child).clip = state.clip;
    }
    let mut inner = StreamContext::new(false);
    dispatch_into(
        &form.operators,
        page,
        graph,
        child,
        states,
        run,
        &mut inner,
        depth + 1,
    )?;
    inner.flush_chunk(graph, child);
    states.restore();
    Ok(())
}

/// Close a marked-content span: when it carried ActualText, replace the
/// glyphs drawn inside it with one synthetic element.
fn finish_marked_content(entry: McEntry, ctx: &mut StreamContext) {
    let Some(actual) = entry.props.actual_text else {
        return;
    };
    if entry.chunk_serial != ctx.chunk_serial {
        // The run was flushed mid-span (a line break inside the span);
        // substitution would tear the chunk, keep the drawn glyphs.
        return;
    }
    let Some(chunk) = &mut ctx.chunk else { return };
    if chunk.elements.len() <= entry.element_snapshot {
        return;
    }
    let replaced: Vec<TextElement> = chunk.elements.split_off(entry.element_snapshot);
    let mut bounds = replaced[0].bounds;
    for el in &replaced[1..] {
        bounds = bounds.union(&el.bounds);
    }
    let mut synthetic = replaced[0].clone();
    synthetic.bounds = bounds;
    synthetic.visible_bounds = bounds;
    synthetic.text = actual;
    synthetic.mock = false;
    chunk.elements.push(synthetic);
    chunk.bounds = chunk.bounds.union(&bounds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::operators::MarkedContentProps;
    use crate::page::{FormInput, ImageInfo};

    fn page_with(ops: Vec<Operator>) -> PageInput {
        let mut page = PageInput::new(1, 612.0, 792.0);
        page.fonts
            .insert("F1".into(), FontInfo::new("Helvetica", true, 250.0));
        page.operators = ops;
        page
    }

    fn show(text: &str) -> Operator {
        Operator::ShowText {
            glyphs: text.chars().map(|c| Glyph::new(c.to_string(), 500.0, 700.0)).collect(),
        }
    }

    fn text_ops(x: f32, y: f32, text: &str) -> Vec<Operator> {
        vec![
            Operator::BeginText,
            Operator::SetFont {
                name: "F1".into(),
                size: 12.0,
            },
            Operator::SetTextMatrix {
                matrix: Matrix::translation(x, y),
            },
            show(text),
            Operator::EndText,
        ]
    }

    fn build(page: &PageInput) -> SceneGraph {
        SceneBuilder::new(&LayoutConfig::new()).build(page).unwrap()
    }

    #[test]
    fn test_text_lands_in_display_space() {
        let page = page_with(text_ops(100.0, 700.0, "Hi"));
        let graph = build(&page);
        let chunks = graph.text_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text(), "Hi");
        let bounds = chunks[0].bounds;
        assert!((bounds.left() - 100.0).abs() < 0.01);
        // User y 700 on a 792pt page is 92pt from the top; the glyph box
        // extends upward from the baseline.
        assert!((bounds.bottom() - 92.0).abs() < 0.01);
        assert_eq!(graph.glyph_count, 2);
    }

    #[test]
    fn test_line_breaks_split_chunks() {
        let mut ops = text_ops(100.0, 700.0, "first");
        ops.extend(text_ops(100.0, 680.0, "second"));
        let graph = build(&page_with(ops));
        assert_eq!(graph.text_chunks().len(), 2);
    }

    #[test]
    fn test_filled_path_recorded() {
        let ops = vec![
            Operator::Rectangle {
                x: 50.0,
                y: 50.0,
                width: 100.0,
                height: 2.0,
            },
            Operator::Fill,
        ];
        let graph = build(&page_with(ops));
        let paths = graph.path_items();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].fill_color.is_some());
        assert!(paths[0].is_horizontal_line());
        // y flipped: user 50..52 becomes display 740..742.
        assert!((paths[0].bounds.top() - 740.0).abs() < 0.01);
    }

    #[test]
    fn test_clip_hides_outside_path() {
        let ops = vec![
            Operator::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            },
            Operator::Clip,
            Operator::EndPath,
            Operator::Rectangle {
                x: 500.0,
                y: 500.0,
                width: 10.0,
                height: 10.0,
            },
            Operator::Fill,
        ];
        let graph = build(&page_with(ops));
        assert_eq!(graph.path_items().len(), 0);
    }

    #[test]
    fn test_form_opens_child_group() {
        let mut page = page_with(vec![Operator::DrawForm { name: "Fm0".into() }]);
        page.forms.insert(
            "Fm0".into(),
            FormInput::new(vec![
                Operator::Rectangle {
                    x: 10.0,
                    y: 10.0,
                    width: 50.0,
                    height: 50.0,
                },
                Operator::Fill,
            ]),
        );
        let graph = build(&page);
        assert_eq!(graph.group_count(), 2);
        assert_eq!(graph.path_items().len(), 1);
        let child = graph.group(1);
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.form_name.as_deref(), Some("Fm0"));
    }

    #[test]
    fn test_painting_form_is_skipped() {
        let mut page = page_with(vec![Operator::DrawForm { name: "Fm0".into() }]);
        let mut form = FormInput::new(vec![
            Operator::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            Operator::Fill,
        ]);
        form.resources.non_image_xobjects = 150;
        page.forms.insert("Fm0".into(), form);
        let graph = build(&page);
        // The child group exists but stays empty.
        assert_eq!(graph.group_count(), 2);
        assert!(graph.group(1).skipped_painting);
        assert!(graph.group(1).items.is_empty());
        assert_eq!(graph.path_items().len(), 0);
    }

    #[test]
    fn test_painting_page_short_circuits() {
        let mut page = page_with(text_ops(100.0, 700.0, "content"));
        page.resources.non_image_xobjects = 150;
        let graph = build(&page);
        assert!(graph.group(graph.root()).skipped_painting);
        assert!(graph.text_chunks().is_empty());
    }

    #[test]
    fn test_timeout_raises() {
        let mut ops = Vec::new();
        for _ in 0..100 {
            ops.extend(text_ops(100.0, 700.0, "x"));
        }
        let page = page_with(ops);
        let builder = SceneBuilder::new(&LayoutConfig::new().with_page_budget_ms(0));
        let err = builder.build(&page).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_actual_text_substitution() {
        let ops = vec![
            Operator::BeginText,
            Operator::SetFont {
                name: "F1".into(),
                size: 12.0,
            },
            Operator::SetTextMatrix {
                matrix: Matrix::translation(100.0, 700.0),
            },
            Operator::BeginMarkedContent {
                props: MarkedContentProps {
                    tag: "Span".into(),
                    mcid: Some(0),
                    actual_text: Some("fi".into()),
                },
            },
            show("ﬁ"),
            Operator::EndMarkedContent,
            Operator::EndText,
        ];
        let graph = build(&page_with(ops));
        assert_eq!(graph.text_chunks()[0].text(), "fi");
        assert_eq!(graph.text_chunks()[0].elements[0].mcid, Some(0));
    }

    #[test]
    fn test_image_with_actual_text_becomes_run() {
        let mut page = page_with(vec![
            Operator::Concat {
                matrix: Matrix::scaling(200.0, 20.0),
            },
            Operator::DrawImage { name: "Im0".into() },
        ]);
        page.images.insert(
            "Im0".into(),
            ImageInfo {
                actual_text: Some("Quarterly results".into()),
            },
        );
        let graph = build(&page);
        assert_eq!(graph.text_chunks().len(), 1);
        assert_eq!(graph.text_chunks()[0].text(), "Quarterly results");
    }

    #[test]
    fn test_mcid_attached_to_path() {
        let ops = vec![
            Operator::BeginMarkedContent {
                props: MarkedContentProps {
                    tag: "Figure".into(),
                    mcid: Some(7),
                    actual_text: None,
                },
            },
            Operator::Rectangle {
                x: 10.0,
                y: 10.0,
                width: 5.0,
                height: 5.0,
            },
            Operator::Fill,
            Operator::EndMarkedContent,
        ];
        let graph = build(&page_with(ops));
        assert_eq!(graph.path_items()[0].mcid, Some(7));
    }
}
