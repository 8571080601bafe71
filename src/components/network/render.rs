use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::simulation::Snapshot;
use super::state::ViewerState;
use super::style::{self, COMPOUND_RADIUS, EC_RADII, REACTION_CORNER, REACTION_SIZE};
use super::types::{Node, NodeKind};

/// Redraws the whole frame. Safe to call on every tick and every gesture.
pub fn render(state: &ViewerState, ctx: &CanvasRenderingContext2d) {
	let ratio = state.pixel_ratio;
	let _ = ctx.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0);
	ctx.set_fill_style_str(style::BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let snapshot = state.snapshot();
	let k = state.transform.k;
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(k, k);
	draw_grid(state, &snapshot, ctx);
	if !state.pair_colors().is_empty() {
		draw_overlay(state, &snapshot, ctx);
	}
	draw_edges(&snapshot, k, ctx);
	draw_nodes(state, &snapshot, ctx);
	draw_labels(&snapshot, ctx);
	ctx.restore();
}

/// Grid over the visible world rectangle, one cell per largest node.
fn draw_grid(state: &ViewerState, snapshot: &Snapshot<'_>, ctx: &CanvasRenderingContext2d) {
	let spacing = snapshot
		.nodes
		.iter()
		.map(|node| style::footprint(node.kind))
		.fold(0.0_f64, f64::max);
	let spacing = if spacing > 0.0 { spacing } else { style::DEFAULT_FOOTPRINT };

	let k = state.transform.k;
	let (min_x, min_y) = state.screen_to_world(0.0, 0.0);
	let (max_x, max_y) = (min_x + state.width / k, min_y + state.height / k);

	ctx.save();
	ctx.set_stroke_style_str(style::GRID_COLOR);
	ctx.set_line_width(1.0 / k);
	let mut x = (min_x / spacing).floor() * spacing;
	while x <= max_x {
		ctx.begin_path();
		ctx.move_to(x, min_y);
		ctx.line_to(x, max_y);
		ctx.stroke();
		x += spacing;
	}
	let mut y = (min_y / spacing).floor() * spacing;
	while y <= max_y {
		ctx.begin_path();
		ctx.move_to(min_x, y);
		ctx.line_to(max_x, y);
		ctx.stroke();
		y += spacing;
	}
	ctx.restore();
}

/// Halo per originating query, under edges and around nodes.
fn draw_overlay(state: &ViewerState, snapshot: &Snapshot<'_>, ctx: &CanvasRenderingContext2d) {
	let colors = state.pair_colors();
	let width = (style::OVERLAY_WIDTH / state.transform.k).max(style::MIN_OVERLAY_WIDTH);

	ctx.save();
	ctx.set_line_width(width);
	ctx.set_line_cap("round");
	for visible in &snapshot.edges {
		for pair in &visible.edge.pair_indices {
			let Some(color) = colors.get(pair) else {
				continue;
			};
			ctx.set_stroke_style_str(&style::hex_to_rgba(color, style::OVERLAY_ALPHA));
			ctx.begin_path();
			ctx.move_to(visible.source.x, visible.source.y);
			ctx.line_to(visible.target.x, visible.target.y);
			ctx.stroke();
		}
	}
	for node in &snapshot.nodes {
		for pair in &node.pair_indices {
			let Some(color) = colors.get(pair) else {
				continue;
			};
			ctx.set_stroke_style_str(&style::hex_to_rgba(color, style::OVERLAY_ALPHA));
			trace_shape(ctx, node, style::OVERLAY_PAD, style::OVERLAY_CORNER);
			ctx.stroke();
		}
	}
	ctx.restore();
}

fn draw_edges(snapshot: &Snapshot<'_>, k: f64, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_cap("round");
	ctx.set_line_width((style::EDGE_WIDTH / k).max(style::MIN_EDGE_WIDTH));
	for visible in &snapshot.edges {
		let edge_style = style::edge_style(visible.edge.kind);
		let dash: js_sys::Array = edge_style
			.dash
			.iter()
			.map(|segment| JsValue::from_f64(segment / k))
			.collect();
		ctx.set_stroke_style_str(edge_style.color);
		let _ = ctx.set_line_dash(&dash);
		ctx.begin_path();
		ctx.move_to(visible.source.x, visible.source.y);
		ctx.line_to(visible.target.x, visible.target.y);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.save();
	ctx.set_fill_style_str(style::STOICHIOMETRY_COLOR);
	ctx.set_font(style::STOICHIOMETRY_FONT);
	ctx.set_text_align("center");
	for visible in &snapshot.edges {
		if let Some(label) = visible.edge.stoichiometry_label() {
			let x = (visible.source.x + visible.target.x) / 2.0;
			let y = (visible.source.y + visible.target.y) / 2.0 - 4.0 / k;
			let _ = ctx.fill_text(&label, x, y);
		}
	}
	ctx.restore();
}

fn draw_nodes(state: &ViewerState, snapshot: &Snapshot<'_>, ctx: &CanvasRenderingContext2d) {
	let max_generation = state.max_generation();
	for node in &snapshot.nodes {
		let colors = style::node_colors(node.generation, max_generation);
		ctx.save();
		ctx.set_shadow_color(style::NODE_SHADOW);
		ctx.set_shadow_blur(style::NODE_SHADOW_BLUR);
		ctx.set_fill_style_str(&colors.fill);
		ctx.set_stroke_style_str(&colors.stroke);
		ctx.set_line_width(if state.is_collapsed(&node.id) {
			style::COLLAPSED_OUTLINE_WIDTH
		} else {
			style::NODE_OUTLINE_WIDTH
		});
		trace_shape(ctx, node, 0.0, REACTION_CORNER);
		ctx.fill();
		ctx.stroke();
		ctx.restore();
	}
}

fn draw_labels(snapshot: &Snapshot<'_>, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(style::LABEL_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(style::LABEL_COLOR);
	for node in &snapshot.nodes {
		let _ = ctx.fill_text(node.display_label(), node.x, node.y);
	}
}

/// Starts a new path outlining the node's shape grown by `pad`.
fn trace_shape(ctx: &CanvasRenderingContext2d, node: &Node, pad: f64, corner: f64) {
	ctx.begin_path();
	match node.kind {
		NodeKind::Compound => {
			let _ = ctx.arc(node.x, node.y, COMPOUND_RADIUS + pad, 0.0, TAU);
		}
		NodeKind::Ec => {
			let _ = ctx.ellipse(node.x, node.y, EC_RADII.0 + pad, EC_RADII.1 + pad, 0.0, 0.0, TAU);
		}
		NodeKind::ReactionIn | NodeKind::ReactionOut => {
			let (w, h) = (REACTION_SIZE.0 + pad * 2.0, REACTION_SIZE.1 + pad * 2.0);
			rounded_rect(ctx, node.x - w / 2.0, node.y - h / 2.0, w, h, corner);
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.move_to(x + r, y);
	ctx.line_to(x + w - r, y);
	ctx.quadratic_curve_to(x + w, y, x + w, y + r);
	ctx.line_to(x + w, y + h - r);
	ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
	ctx.line_to(x + r, y + h);
	ctx.quadratic_curve_to(x, y + h, x, y + h - r);
	ctx.line_to(x, y + r);
	ctx.quadratic_curve_to(x, y, x + r, y);
	ctx.close_path();
}
