use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use rand::Rng;

use super::types::{Generation, Node};

pub const BASE_RADIUS: f64 = 80.0;
pub const SPIRAL_SPACING: f64 = 120.0;
pub const NODE_SPACING: f64 = 50.0;
pub const ANGLE_INCREMENT: f64 = 0.7;

#[derive(Clone, Copy, Debug)]
pub struct SpiralOptions {
	pub center: (f64, f64),
	pub current_generation: Generation,
	/// Leave every other generation where it is.
	pub only_current_generation: bool,
	/// Pin each node where it lands.
	pub lock: bool,
	/// Re-place pinned nodes too.
	pub reset: bool,
}

/// Seeds positions on one spiral ring per generation.
pub fn place<R: Rng>(nodes: &mut [Node], options: &SpiralOptions, rng: &mut R) {
	let mut by_generation: BTreeMap<Generation, Vec<usize>> = BTreeMap::new();
	for (i, node) in nodes.iter().enumerate() {
		by_generation.entry(node.generation).or_default().push(i);
	}

	let (cx, cy) = options.center;
	let jitter = NODE_SPACING * 0.5;

	for (generation, members) in by_generation {
		if options.only_current_generation && generation != options.current_generation {
			continue;
		}
		let radius = BASE_RADIUS + f64::from(generation) * SPIRAL_SPACING;
		let offset = f64::from(generation) * FRAC_PI_2;

		let unplaced: Vec<usize> = members
			.into_iter()
			.filter(|&i| options.reset || !nodes[i].is_pinned())
			.collect();
		for (slot, i) in unplaced.into_iter().enumerate() {
			let angle = ANGLE_INCREMENT * slot as f64 + offset;
			let node = &mut nodes[i];
			node.x = cx + radius * angle.cos() + rng.gen_range(-0.5..0.5) * jitter;
			node.y = cy + radius * angle.sin() + rng.gen_range(-0.5..0.5) * jitter;
			node.vx = 0.0;
			node.vy = 0.0;
			if options.lock {
				node.pin_here();
			} else {
				node.unpin();
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;
	use crate::components::network::types::NodeKind;

	fn options(current: Generation, only_current: bool, lock: bool) -> SpiralOptions {
		SpiralOptions {
			center: (400.0, 300.0),
			current_generation: current,
			only_current_generation: only_current,
			lock,
			reset: false,
		}
	}

	fn nodes() -> Vec<Node> {
		vec![
			Node::new("A", NodeKind::Compound, 0, "A"),
			Node::new("B", NodeKind::Compound, 0, "B"),
			Node::new("R_r", NodeKind::ReactionIn, 1, "R"),
			Node::new("C", NodeKind::Compound, 2, "C"),
		]
	}

	fn distance_from_center(node: &Node) -> f64 {
		((node.x - 400.0).powi(2) + (node.y - 300.0).powi(2)).sqrt()
	}

	#[test]
	fn rings_grow_with_generation() {
		let mut rng = SmallRng::seed_from_u64(7);
		let mut nodes = nodes();
		place(&mut nodes, &options(2, false, false), &mut rng);

		let slack = NODE_SPACING * 0.5;
		for node in &nodes {
			let expected = BASE_RADIUS + f64::from(node.generation) * SPIRAL_SPACING;
			assert!((distance_from_center(node) - expected).abs() <= slack, "{}", node.id);
		}
	}

	#[test]
	fn only_current_generation_leaves_others_alone() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut nodes = nodes();
		place(&mut nodes, &options(1, true, false), &mut rng);

		assert_eq!((nodes[0].x, nodes[0].y), (0.0, 0.0));
		assert_eq!((nodes[3].x, nodes[3].y), (0.0, 0.0));
		assert_ne!((nodes[2].x, nodes[2].y), (0.0, 0.0));
	}

	#[test]
	fn pinned_nodes_are_skipped_unless_reset() {
		let mut rng = SmallRng::seed_from_u64(3);
		let mut nodes = nodes();
		nodes[0].pin_at(-5.0, -5.0);
		place(&mut nodes, &options(0, true, false), &mut rng);
		assert_eq!((nodes[0].x, nodes[0].y), (-5.0, -5.0));
		assert!(nodes[0].is_pinned());

		let reset = SpiralOptions {
			reset: true,
			..options(0, true, false)
		};
		place(&mut nodes, &reset, &mut rng);
		assert_ne!((nodes[0].x, nodes[0].y), (-5.0, -5.0));
		assert!(!nodes[0].is_pinned());
	}

	#[test]
	fn lock_pins_placed_nodes() {
		let mut rng = SmallRng::seed_from_u64(9);
		let mut nodes = nodes();
		place(&mut nodes, &options(0, false, true), &mut rng);
		for node in &nodes {
			assert_eq!(node.fx, Some(node.x));
			assert_eq!(node.fy, Some(node.y));
		}
	}

	#[test]
	fn same_seed_same_layout() {
		let mut a = nodes();
		let mut b = nodes();
		place(&mut a, &options(2, false, false), &mut SmallRng::seed_from_u64(42));
		place(&mut b, &options(2, false, false), &mut SmallRng::seed_from_u64(42));
		assert_eq!(a, b);
	}
}
