use svg::Document;
use svg::node::element::{Circle, Ellipse, Line, Rectangle, Text};

use super::simulation::Snapshot;
use super::style::{self, COMPOUND_RADIUS, EC_RADII, REACTION_CORNER, REACTION_SIZE};
use super::types::{Generation, Node, NodeKind};

const FONT_FAMILY: &str = "Inter, sans-serif";
const LABEL_FONT_SIZE: f64 = 7.0;
const STOICHIOMETRY_FONT_SIZE: f64 = 6.0;
const STOICHIOMETRY_OFFSET: f64 = 4.0;

/// Renders the visible graph as a standalone SVG document framed on the
/// node bounding box. Returns `None` when nothing is visible.
pub fn export_svg(snapshot: &Snapshot<'_>, max_generation: Generation, padding: f64) -> Option<String> {
	let (min_x, min_y, max_x, max_y) = bounds(&snapshot.nodes)?;
	let (min_x, min_y) = (min_x - padding, min_y - padding);
	let width = max_x + padding - min_x;
	let height = max_y + padding - min_y;

	let mut document = Document::new()
		.set("viewBox", (min_x, min_y, width, height))
		.set("width", width)
		.set("height", height);

	for visible in &snapshot.edges {
		let edge_style = style::edge_style(visible.edge.kind);
		let mut line = Line::new()
			.set("x1", visible.source.x)
			.set("y1", visible.source.y)
			.set("x2", visible.target.x)
			.set("y2", visible.target.y)
			.set("stroke", edge_style.color)
			.set("stroke-width", style::EDGE_WIDTH)
			.set("stroke-linecap", "round");
		if !edge_style.dash.is_empty() {
			line = line.set("stroke-dasharray", dash_array(edge_style.dash));
		}
		document = document.add(line);
	}

	for visible in &snapshot.edges {
		let Some(label) = visible.edge.stoichiometry_label() else {
			continue;
		};
		let x = (visible.source.x + visible.target.x) / 2.0;
		let y = (visible.source.y + visible.target.y) / 2.0 - STOICHIOMETRY_OFFSET;
		document = document.add(
			Text::new(label)
				.set("x", x)
				.set("y", y)
				.set("text-anchor", "middle")
				.set("font-size", STOICHIOMETRY_FONT_SIZE)
				.set("font-family", FONT_FAMILY)
				.set("fill", style::STOICHIOMETRY_COLOR),
		);
	}

	for node in &snapshot.nodes {
		let colors = style::node_colors(node.generation, max_generation);
		document = match node.kind {
			NodeKind::Compound => document.add(
				Circle::new()
					.set("cx", node.x)
					.set("cy", node.y)
					.set("r", COMPOUND_RADIUS)
					.set("fill", colors.fill)
					.set("stroke", colors.stroke)
					.set("stroke-width", style::NODE_OUTLINE_WIDTH),
			),
			NodeKind::Ec => document.add(
				Ellipse::new()
					.set("cx", node.x)
					.set("cy", node.y)
					.set("rx", EC_RADII.0)
					.set("ry", EC_RADII.1)
					.set("fill", colors.fill)
					.set("stroke", colors.stroke)
					.set("stroke-width", style::NODE_OUTLINE_WIDTH),
			),
			NodeKind::ReactionIn | NodeKind::ReactionOut => document.add(
				Rectangle::new()
					.set("x", node.x - REACTION_SIZE.0 / 2.0)
					.set("y", node.y - REACTION_SIZE.1 / 2.0)
					.set("width", REACTION_SIZE.0)
					.set("height", REACTION_SIZE.1)
					.set("rx", REACTION_CORNER)
					.set("fill", colors.fill)
					.set("stroke", colors.stroke)
					.set("stroke-width", style::NODE_OUTLINE_WIDTH),
			),
		};
		document = document.add(
			Text::new(node.display_label())
				.set("x", node.x)
				.set("y", node.y)
				.set("text-anchor", "middle")
				.set("dominant-baseline", "middle")
				.set("font-size", LABEL_FONT_SIZE)
				.set("font-family", FONT_FAMILY)
				.set("fill", style::LABEL_COLOR),
		);
	}

	Some(document.to_string())
}

fn bounds(nodes: &[&Node]) -> Option<(f64, f64, f64, f64)> {
	let first = nodes.first()?;
	Some(nodes.iter().fold(
		(first.x, first.y, first.x, first.y),
		|(min_x, min_y, max_x, max_y), node| {
			(min_x.min(node.x), min_y.min(node.y), max_x.max(node.x), max_y.max(node.y))
		},
	))
}

fn dash_array(dash: &[f64]) -> String {
	dash.iter().map(f64::to_string).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::network::config::PhysicsConfig;
	use crate::components::network::simulation::Simulation;
	use crate::components::network::types::{Edge, EdgeKind, GraphData};

	fn placed(id: &str, kind: NodeKind, x: f64, y: f64) -> Node {
		let mut node = Node::new(id, kind, 0, format!("{id}_label"));
		node.pin_at(x, y);
		node
	}

	fn simulation() -> Simulation {
		let data = GraphData {
			nodes: vec![
				placed("A", NodeKind::Compound, 0.0, 0.0),
				placed("R1_r", NodeKind::ReactionIn, 100.0, 40.0),
				placed("ec_1.1.1.1_0", NodeKind::Ec, 200.0, -20.0),
			],
			edges: vec![
				Edge::new("A", "R1_r", EdgeKind::Substrate, 0).with_stoichiometry(2.0),
				Edge::new("R1_r", "ec_1.1.1.1_0", EdgeKind::EcIn, 0),
			],
		};
		Simulation::new(data, PhysicsConfig::default(), (0.0, 0.0))
	}

	#[test]
	fn nothing_visible_exports_nothing() {
		let sim = Simulation::new(GraphData::default(), PhysicsConfig::default(), (0.0, 0.0));
		assert_eq!(export_svg(&sim.snapshot(), 0, 50.0), None);
	}

	#[test]
	fn document_frames_visible_nodes() {
		let sim = simulation();
		let svg = export_svg(&sim.snapshot(), 0, 50.0).unwrap();
		assert!(svg.contains(r#"viewBox="-50 -70 300 160""#), "{svg}");
		assert!(svg.contains("<circle"));
		assert!(svg.contains("<ellipse"));
		assert!(svg.contains("<rect"));
		assert_eq!(svg.matches("<line").count(), 2);
		assert!(svg.contains(r#"stroke-dasharray="2 4""#));
		assert!(svg.contains("A_label"));
		assert!(!svg.contains("R1_r_label"), "reaction labels drop their suffix");
		assert_eq!(svg.matches("<text").count(), 4, "three labels and one stoichiometry");
	}

	#[test]
	fn hidden_nodes_are_left_out() {
		let mut sim = simulation();
		sim.set_hidden(&HashSet::from(["ec_1.1.1.1_0".to_owned()]));
		let svg = export_svg(&sim.snapshot(), 0, 50.0).unwrap();
		assert!(!svg.contains("<ellipse"));
		assert_eq!(svg.matches("<line").count(), 1);
		assert!(svg.contains(r#"viewBox="-50 -50 200 140""#), "{svg}");
	}

	#[test]
	fn export_is_deterministic() {
		let sim = simulation();
		assert_eq!(export_svg(&sim.snapshot(), 2, 50.0), export_svg(&sim.snapshot(), 2, 50.0));
	}
}
