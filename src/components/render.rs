//! Canvas rendering for the viewer and the flow builder.
//!
//! Both canvases draw in passes for correct z-ordering:
//! 1. Background and dot grid
//! 2. Edges (world space), dimmed before emphasized
//! 3. Node cards, dimmed before emphasized, then builder overlays

use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::theme::{CardPaint, Color, EdgePaint, NodePaint, Theme};
use crate::canvas::{BuilderCanvas, Handle, Viewport, ViewerController};
use crate::flow::{FlowGraph, FlowNode};
use crate::flow::document::ArrowMarker;
use crate::geometry::{Point, Rect};
use crate::graph::Emphasis;

const ARROW_SIZE: f64 = 10.0;
const CARD_PADDING: f64 = 12.0;
const LINE_HEIGHT: f64 = 16.0;

/// Renders the read-only architecture graph. Emphasized edges are dashed and
/// the dashes move with `elapsed_ms`.
pub fn render_viewer(
	ctx: &CanvasRenderingContext2d,
	viewer: &ViewerController,
	theme: &Theme,
	elapsed_ms: f64,
) {
	let (width, height) = viewer.size();
	let viewport = viewer.viewport();
	draw_background(ctx, viewport, width, height, theme);

	ctx.save();
	apply_viewport(ctx, viewport);

	let graph = viewer.graph();
	let render = viewer.render_state();
	let layout = viewer.layout();

	for pass in [Emphasis::Dimmed, Emphasis::Normal, Emphasis::Emphasized] {
		if pass.is_emphasized() {
			set_dash(ctx, theme.flow_dash);
			ctx.set_line_dash_offset(theme.flow_offset(elapsed_ms));
		}
		for (i, edge) in graph.edges().iter().enumerate() {
			if render.edge(i) != pass {
				continue;
			}
			let (Some(from), Some(to)) = (layout.rect(&edge.source), layout.rect(&edge.target))
			else {
				continue;
			};
			let start = Point::new(from.x + from.width, from.y + from.height / 2.0);
			let end = Point::new(to.x, to.y + to.height / 2.0);
			draw_edge(ctx, start, end, theme.edge(pass), ArrowMarker::ArrowClosed);
		}
	}
	clear_dash(ctx);

	for pass in [Emphasis::Dimmed, Emphasis::Normal, Emphasis::Emphasized] {
		for (i, node) in graph.nodes().iter().enumerate() {
			if render.node(i) != pass {
				continue;
			}
			let Some(rect) = layout.rect(&node.id) else {
				continue;
			};
			let paint = theme.node(node.category, pass);
			let selected = render.selected() == Some(node.id.as_str());
			draw_viewer_node(ctx, rect, &node.label, node.category.title(), paint, selected, theme);
		}
	}

	ctx.restore();
}

/// Renders the flow builder canvas.
///
/// Connectors are only drawn when `editable`, since they are only usable then.
pub fn render_builder(
	ctx: &CanvasRenderingContext2d,
	graph: &FlowGraph,
	selected: Option<&str>,
	canvas: &BuilderCanvas,
	editable: bool,
	size: (f64, f64),
	theme: &Theme,
) {
	let viewport = canvas.viewport();
	draw_background(ctx, viewport, size.0, size.1, theme);

	ctx.save();
	apply_viewport(ctx, viewport);

	let config = canvas.config();
	let by_id: HashMap<&str, &FlowNode> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
	for edge in &graph.edges {
		let (Some(from), Some(to)) = (
			by_id.get(edge.source.as_str()),
			by_id.get(edge.target.as_str()),
		) else {
			continue;
		};
		draw_edge(
			ctx,
			config.connector(from, Handle::Source),
			config.connector(to, Handle::Target),
			EdgePaint {
				color: theme.connector,
				width: 2.0,
				opacity: 1.0,
			},
			edge.marker_end,
		);
	}

	if let Some((start, end)) = canvas.connect_preview(graph) {
		set_dash(ctx, [5.0, 5.0]);
		draw_edge(ctx, start, end, theme.edge_emphasized, ArrowMarker::None);
		clear_dash(ctx);
	}

	for node in &graph.nodes {
		let rect = config.node_rect(node);
		let paint = theme.card(node.kind);
		let is_selected = selected == Some(node.id.as_str());
		draw_card(ctx, rect, &node.label, node.kind.is_note(), paint, is_selected, theme);
		if editable {
			for handle in [Handle::Target, Handle::Source] {
				draw_connector(ctx, config.connector(node, handle), theme.connector);
			}
		}
	}

	ctx.restore();
}

fn set_dash(ctx: &CanvasRenderingContext2d, [dash, gap]: [f64; 2]) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
}

fn clear_dash(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_line_dash_offset(0.0);
}

fn apply_viewport(ctx: &CanvasRenderingContext2d, viewport: &Viewport) {
	let _ = ctx.translate(viewport.x, viewport.y);
	let _ = ctx.scale(viewport.zoom, viewport.zoom);
}

fn draw_background(
	ctx: &CanvasRenderingContext2d,
	viewport: &Viewport,
	width: f64,
	height: f64,
	theme: &Theme,
) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);

	// Grid dots stay anchored to canvas space while panning.
	let gap = theme.grid_gap * viewport.zoom;
	if gap < 6.0 {
		return;
	}
	ctx.set_fill_style_str(&theme.grid_dot.to_css());
	let mut x = viewport.x.rem_euclid(gap);
	while x < width {
		let mut y = viewport.y.rem_euclid(gap);
		while y < height {
			ctx.fill_rect(x, y, 1.0, 1.0);
			y += gap;
		}
		x += gap;
	}
}

fn draw_edge(
	ctx: &CanvasRenderingContext2d,
	start: Point,
	end: Point,
	paint: EdgePaint,
	marker: ArrowMarker,
) {
	let (dx, dy) = (end.x - start.x, end.y - start.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let color = paint.color.with_alpha(paint.opacity).to_css();

	let inset = if marker == ArrowMarker::None {
		0.0
	} else {
		ARROW_SIZE
	};
	ctx.set_stroke_style_str(&color);
	ctx.set_line_width(paint.width);
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(end.x - ux * inset, end.y - uy * inset);
	ctx.stroke();

	let back = Point::new(end.x - ux * ARROW_SIZE, end.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	match marker {
		ArrowMarker::ArrowClosed => {
			ctx.set_fill_style_str(&color);
			ctx.begin_path();
			ctx.move_to(end.x, end.y);
			ctx.line_to(back.x + px, back.y + py);
			ctx.line_to(back.x - px, back.y - py);
			ctx.close_path();
			ctx.fill();
		}
		ArrowMarker::Arrow => {
			ctx.begin_path();
			ctx.move_to(back.x + px, back.y + py);
			ctx.line_to(end.x, end.y);
			ctx.line_to(back.x - px, back.y - py);
			ctx.stroke();
		}
		ArrowMarker::None => {}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) {
	let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
	let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_viewer_node(
	ctx: &CanvasRenderingContext2d,
	rect: Rect,
	label: &str,
	caption: &str,
	paint: NodePaint,
	selected: bool,
	theme: &Theme,
) {
	ctx.set_global_alpha(paint.opacity);

	if paint.shadow {
		ctx.set_shadow_color("rgba(0, 0, 0, 0.08)");
		ctx.set_shadow_blur(12.0);
		ctx.set_shadow_offset_y(4.0);
	}
	rounded_rect(ctx, rect, theme.corner_radius);
	ctx.set_fill_style_str(&paint.background.to_css());
	ctx.fill();
	ctx.set_shadow_color("rgba(0, 0, 0, 0)");
	ctx.set_shadow_blur(0.0);
	ctx.set_shadow_offset_y(0.0);

	// Accent bar along the left edge, clipped to the card.
	ctx.save();
	rounded_rect(ctx, rect, theme.corner_radius);
	ctx.clip();
	ctx.set_fill_style_str(&paint.accent.to_css());
	ctx.fill_rect(rect.x, rect.y, theme.accent_width, rect.height);
	ctx.restore();

	rounded_rect(ctx, rect, theme.corner_radius);
	ctx.set_stroke_style_str(&if selected {
		theme.selection.to_css()
	} else {
		paint.border.to_css()
	});
	ctx.set_line_width(if selected { 2.0 } else { 1.0 });
	ctx.stroke();

	let text_x = rect.x + theme.accent_width + CARD_PADDING;
	let max_width = rect.width - theme.accent_width - CARD_PADDING * 2.0;
	ctx.set_fill_style_str(&paint.text.to_css());
	ctx.set_font(theme.font);
	let _ = ctx.fill_text_with_max_width(label, text_x, rect.y + rect.height / 2.0 - 2.0, max_width);
	ctx.set_font("400 11px system-ui, sans-serif");
	ctx.set_fill_style_str(&paint.text.with_alpha(0.6).to_css());
	let _ = ctx.fill_text_with_max_width(
		caption,
		text_x,
		rect.y + rect.height / 2.0 + LINE_HEIGHT,
		max_width,
	);

	ctx.set_global_alpha(1.0);
}

fn draw_card(
	ctx: &CanvasRenderingContext2d,
	rect: Rect,
	label: &str,
	note: bool,
	paint: CardPaint,
	selected: bool,
	theme: &Theme,
) {
	rounded_rect(ctx, rect, 8.0);
	ctx.set_fill_style_str(&paint.background.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&if selected {
		theme.selection.to_css()
	} else {
		paint.border.to_css()
	});
	ctx.set_line_width(if selected { 2.5 } else { 1.5 });
	ctx.stroke();

	ctx.set_fill_style_str(&paint.text.to_css());
	let max_width = rect.width - CARD_PADDING * 2.0;
	if note {
		ctx.set_font("400 12px system-ui, sans-serif");
		for (i, line) in label.lines().enumerate() {
			let y = rect.y + CARD_PADDING + LINE_HEIGHT * (i as f64 + 0.75);
			if y > rect.y + rect.height - CARD_PADDING / 2.0 {
				break;
			}
			let _ = ctx.fill_text_with_max_width(line, rect.x + CARD_PADDING, y, max_width);
		}
	} else {
		ctx.set_font(theme.font);
		ctx.set_text_align("center");
		let _ = ctx.fill_text_with_max_width(
			label,
			rect.x + rect.width / 2.0,
			rect.y + rect.height / 2.0 + 4.0,
			max_width,
		);
		ctx.set_text_align("start");
	}
}

fn draw_connector(ctx: &CanvasRenderingContext2d, at: Point, color: Color) {
	ctx.begin_path();
	let _ = ctx.arc(at.x, at.y, 4.0, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("#ffffff");
	ctx.fill();
	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(1.5);
	ctx.stroke();
}
