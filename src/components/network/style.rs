use super::types::{EdgeKind, Generation, NodeKind};

pub const COMPOUND_RADIUS: f64 = 18.0;
pub const EC_RADII: (f64, f64) = (24.0, 14.0);
pub const REACTION_SIZE: (f64, f64) = (40.0, 24.0);
pub const REACTION_CORNER: f64 = 4.0;

pub const BACKGROUND: &str = "#ffffff";
pub const GRID_COLOR: &str = "rgba(0, 0, 0, 0.05)";
pub const LABEL_COLOR: &str = "#374151";
pub const STOICHIOMETRY_COLOR: &str = "#1F2937";
pub const LABEL_FONT: &str = "7px Inter, sans-serif";
pub const STOICHIOMETRY_FONT: &str = "6px Inter, sans-serif";

pub const EC_EDGE_COLOR: &str = "#8B5CF6";
pub const EDGE_COLOR: &str = "#9CA3AF";

pub const EDGE_WIDTH: f64 = 1.0;
pub const MIN_EDGE_WIDTH: f64 = 0.8;
pub const NODE_OUTLINE_WIDTH: f64 = 1.5;
pub const COLLAPSED_OUTLINE_WIDTH: f64 = 3.0;
pub const OVERLAY_WIDTH: f64 = 6.0;
pub const MIN_OVERLAY_WIDTH: f64 = 3.0;
pub const OVERLAY_PAD: f64 = 4.0;
pub const OVERLAY_CORNER: f64 = 6.0;
pub const OVERLAY_ALPHA: f64 = 0.35;
pub const NODE_SHADOW: &str = "rgba(0, 0, 0, 0.1)";
pub const NODE_SHADOW_BLUR: f64 = 3.0;

/// Grid cell used by snapping; the largest visible footprint wins.
pub fn footprint(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Compound => 36.0,
		NodeKind::Ec => 48.0,
		NodeKind::ReactionIn | NodeKind::ReactionOut => 40.0,
	}
}

pub const DEFAULT_FOOTPRINT: f64 = 40.0;

/// Whether an offset from the node centre lands on the drawn shape.
pub fn hit_test(kind: NodeKind, dx: f64, dy: f64) -> bool {
	match kind {
		NodeKind::Compound => dx.hypot(dy) <= COMPOUND_RADIUS,
		NodeKind::Ec => (dx / EC_RADII.0).powi(2) + (dy / EC_RADII.1).powi(2) <= 1.0,
		NodeKind::ReactionIn | NodeKind::ReactionOut => {
			dx.abs() <= REACTION_SIZE.0 / 2.0 && dy.abs() <= REACTION_SIZE.1 / 2.0
		}
	}
}

pub fn collision_radius(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Compound => 45.0,
		NodeKind::Ec => 55.0,
		NodeKind::ReactionIn | NodeKind::ReactionOut => 50.0,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeColors {
	pub fill: String,
	pub stroke: String,
}

/// Generations are spread across the hue wheel, stopping short of wrapping
/// back to red. A network with a single generation is drawn in blue.
pub fn node_colors(generation: Generation, max_generation: Generation) -> NodeColors {
	let hue = if max_generation > 0 {
		f64::from(generation) / f64::from(max_generation + 1) * 320.0
	} else {
		200.0
	};
	NodeColors {
		fill: format!("hsl({hue:.0}, 70%, 90%)"),
		stroke: format!("hsl({hue:.0}, 70%, 45%)"),
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub color: &'static str,
	pub dash: &'static [f64],
}

pub fn edge_style(kind: EdgeKind) -> EdgeStyle {
	if kind.is_enzyme() {
		return EdgeStyle {
			color: EC_EDGE_COLOR,
			dash: &[2.0, 4.0],
		};
	}
	match kind {
		EdgeKind::Reaction => EdgeStyle {
			color: EDGE_COLOR,
			dash: &[6.0, 4.0],
		},
		_ => EdgeStyle {
			color: EDGE_COLOR,
			dash: &[],
		},
	}
}

/// `#rrggbb` (or `#rgb`) to `rgba(...)`. Anything else passes through untouched.
pub fn hex_to_rgba(color: &str, alpha: f64) -> String {
	let Some(hex) = color.strip_prefix('#').filter(|hex| hex.is_ascii()) else {
		return color.to_owned();
	};
	let expanded: String = match hex.len() {
		3 => hex.chars().flat_map(|c| [c, c]).collect(),
		6 => hex.to_owned(),
		_ => return color.to_owned(),
	};
	let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
	match (channel(0), channel(2), channel(4)) {
		(Some(r), Some(g), Some(b)) => format!("rgba({r}, {g}, {b}, {alpha})"),
		_ => color.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_generation_is_blue() {
		assert_eq!(node_colors(0, 0).fill, "hsl(200, 70%, 90%)");
		assert_eq!(node_colors(0, 0).stroke, "hsl(200, 70%, 45%)");
	}

	#[test]
	fn hues_spread_by_generation() {
		assert_eq!(node_colors(0, 3).fill, "hsl(0, 70%, 90%)");
		assert_eq!(node_colors(2, 3).fill, "hsl(160, 70%, 90%)");
		assert_ne!(node_colors(1, 3), node_colors(2, 3));
	}

	#[test]
	fn enzyme_links_are_dotted_purple() {
		let style = edge_style(EdgeKind::EcOut);
		assert_eq!(style.color, EC_EDGE_COLOR);
		assert_eq!(style.dash, &[2.0, 4.0]);
		assert!(edge_style(EdgeKind::Product).dash.is_empty());
	}

	#[test]
	fn picking_follows_the_drawn_outline() {
		assert!(hit_test(NodeKind::ReactionIn, 19.0, 11.0));
		assert!(!hit_test(NodeKind::ReactionIn, 0.0, 15.0));
		assert!(hit_test(NodeKind::Ec, 23.0, 0.0));
		assert!(!hit_test(NodeKind::Ec, 0.0, 16.0));
		assert!(hit_test(NodeKind::Compound, 0.0, 18.0));
		assert!(!hit_test(NodeKind::Compound, 13.0, 13.0));
	}

	#[test]
	fn overlay_colors() {
		assert_eq!(hex_to_rgba("#ff0080", 0.5), "rgba(255, 0, 128, 0.5)");
		assert_eq!(hex_to_rgba("#0f0", 1.0), "rgba(0, 255, 0, 1)");
		assert_eq!(hex_to_rgba("tomato", 0.5), "tomato");
		assert_eq!(hex_to_rgba("#zzzzzz", 0.5), "#zzzzzz");
	}
}
