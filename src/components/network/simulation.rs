use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::PhysicsConfig;
use super::style;
use super::types::{Edge, EdgeKind, GraphData, Node, PositionMap};

pub const ALPHA_MIN: f64 = 0.001;

const REACTION_LINK_DISTANCE: f64 = 90.0;
const ENZYME_LINK_DISTANCE: f64 = 70.0;
const GENERATION_GAP_DISTANCE: f64 = 40.0;
const CHARGE_GENERATION_SCALE: f64 = 0.2;
const CHARGE_DISTANCE_MIN: f64 = 10.0;
const CHARGE_DISTANCE_MAX: f64 = 500.0;
const GRID_SEARCH_LIMIT: i64 = 100;
const JIGGLE_SEED: u64 = 0x5eed;

#[derive(Clone, Copy, Debug)]
struct Link {
	edge: usize,
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

pub struct VisibleEdge<'a> {
	pub edge: &'a Edge,
	pub source: &'a Node,
	pub target: &'a Node,
}

/// Everything that should be drawn this frame, in draw order.
pub struct Snapshot<'a> {
	pub nodes: Vec<&'a Node>,
	pub edges: Vec<VisibleEdge<'a>>,
}

/// Velocity-Verlet force layout with link, many-body, collision and
/// centering forces. Hidden nodes are frozen and exert no force.
pub struct Simulation {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<String, usize>,
	links: Vec<Link>,
	hidden: Vec<bool>,
	params: PhysicsConfig,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	running: bool,
	rng: SmallRng,
}

impl Simulation {
	pub fn new(data: GraphData, params: PhysicsConfig, center: (f64, f64)) -> Self {
		let GraphData { nodes, edges } = data;
		let index: HashMap<String, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.clone(), i))
			.collect();
		let links = edges
			.iter()
			.enumerate()
			.filter_map(|(edge, e)| {
				Some(Link {
					edge,
					source: *index.get(&e.source)?,
					target: *index.get(&e.target)?,
					distance: 0.0,
					strength: 0.0,
					bias: 0.5,
				})
			})
			.collect();
		let hidden = vec![false; nodes.len()];

		let mut simulation = Self {
			nodes,
			edges,
			index,
			links,
			hidden,
			params,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			running: false,
			rng: SmallRng::seed_from_u64(JIGGLE_SEED),
		};
		simulation.initialize_links();
		simulation
	}

	/// Link weights depend on how many visible links meet at each end.
	fn initialize_links(&mut self) {
		let mut count = vec![0usize; self.nodes.len()];
		for link in &self.links {
			if !self.hidden[link.source] && !self.hidden[link.target] {
				count[link.source] += 1;
				count[link.target] += 1;
			}
		}
		for link in &mut self.links {
			let (s, t) = (count[link.source], count[link.target]);
			link.bias = if s + t > 0 { s as f64 / (s + t) as f64 } else { 0.5 };
			link.strength = 1.0 / s.min(t).max(1) as f64;
			link.distance = link_distance(
				self.edges[link.edge].kind,
				&self.nodes[link.source],
				&self.nodes[link.target],
				self.params.tension,
			);
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Direct access for re-seeding. Link weights are not recomputed.
	pub fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	#[cfg(test)]
	pub fn params(&self) -> &PhysicsConfig {
		&self.params
	}

	pub fn set_params(&mut self, params: PhysicsConfig) {
		self.params = params;
		self.initialize_links();
	}

	pub fn set_hidden(&mut self, hidden: &HashSet<String>) {
		for (node, flag) in self.nodes.iter().zip(self.hidden.iter_mut()) {
			*flag = hidden.contains(&node.id);
		}
		self.initialize_links();
	}

	pub fn is_hidden(&self, index: usize) -> bool {
		self.hidden.get(index).copied().unwrap_or(true)
	}

	pub fn snapshot(&self) -> Snapshot<'_> {
		let nodes = self
			.nodes
			.iter()
			.zip(&self.hidden)
			.filter(|(_, hidden)| !**hidden)
			.map(|(node, _)| node)
			.collect();
		let edges = self
			.links
			.iter()
			.filter(|link| !self.hidden[link.source] && !self.hidden[link.target])
			.map(|link| VisibleEdge {
				edge: &self.edges[link.edge],
				source: &self.nodes[link.source],
				target: &self.nodes[link.target],
			})
			.collect();
		Snapshot { nodes, edges }
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn restart(&mut self, alpha: f64) {
		self.alpha = alpha;
		self.running = true;
	}

	pub fn resume(&mut self) {
		self.running = true;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Advances one frame if the layout is still warm. Returns whether it moved.
	pub fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.tick();
		if self.alpha < ALPHA_MIN {
			self.running = false;
		}
		true
	}

	/// Runs up to `ticks` frames synchronously.
	pub fn settle(&mut self, ticks: usize) {
		for _ in 0..ticks {
			if !self.step() || !self.is_running() {
				break;
			}
		}
	}

	pub fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_collision();
		self.apply_center();

		let retain = 1.0 - self.params.velocity_decay;
		for (node, hidden) in self.nodes.iter_mut().zip(&self.hidden) {
			if *hidden {
				continue;
			}
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= retain;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= retain;
					node.y += node.vy;
				}
			}
		}
	}

	fn jiggle(&mut self) -> f64 {
		self.rng.gen_range(-0.5e-6..0.5e-6)
	}

	fn apply_links(&mut self, alpha: f64) {
		for i in 0..self.links.len() {
			let link = self.links[i];
			if self.hidden[link.source] || self.hidden[link.target] {
				continue;
			}
			let (source, target) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut dx = target.x + target.vx - source.x - source.vx;
			let mut dy = target.y + target.vy - source.y - source.vy;
			if dx == 0.0 {
				dx = self.jiggle();
			}
			if dy == 0.0 {
				dy = self.jiggle();
			}
			let length = (dx * dx + dy * dy).sqrt();
			let k = (length - link.distance) / length * alpha * link.strength;
			dx *= k;
			dy *= k;

			let target = &mut self.nodes[link.target];
			target.vx -= dx * link.bias;
			target.vy -= dy * link.bias;
			let source = &mut self.nodes[link.source];
			source.vx += dx * (1.0 - link.bias);
			source.vy += dy * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let min2 = CHARGE_DISTANCE_MIN * CHARGE_DISTANCE_MIN;
		let max2 = CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX;
		let strengths: Vec<f64> = self
			.nodes
			.iter()
			.map(|node| -self.params.repulsion * (1.0 + f64::from(node.generation) * CHARGE_GENERATION_SCALE))
			.collect();

		let n = self.nodes.len();
		for i in 0..n {
			if self.hidden[i] {
				continue;
			}
			for j in 0..n {
				if i == j || self.hidden[j] {
					continue;
				}
				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				if dx == 0.0 {
					dx = self.jiggle();
				}
				if dy == 0.0 {
					dy = self.jiggle();
				}
				let mut l = dx * dx + dy * dy;
				if l >= max2 {
					continue;
				}
				if l < min2 {
					l = (min2 * l).sqrt();
				}
				let w = strengths[j] * alpha / l;
				self.nodes[i].vx += dx * w;
				self.nodes[i].vy += dy * w;
			}
		}
	}

	fn apply_collision(&mut self) {
		let strength = self.params.collision_strength;
		let n = self.nodes.len();
		for i in 0..n {
			if self.hidden[i] {
				continue;
			}
			let ri = style::collision_radius(self.nodes[i].kind);
			for j in (i + 1)..n {
				if self.hidden[j] {
					continue;
				}
				let rj = style::collision_radius(self.nodes[j].kind);
				let r = ri + rj;
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut dx = a.x + a.vx - b.x - b.vx;
				let mut dy = a.y + a.vy - b.y - b.vy;
				let mut l = dx * dx + dy * dy;
				if l >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = self.jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = self.jiggle();
					l += dy * dy;
				}
				let distance = l.sqrt();
				let k = (r - distance) / distance * strength;
				dx *= k;
				dy *= k;
				let share = rj * rj / (ri * ri + rj * rj);

				self.nodes[i].vx += dx * share;
				self.nodes[i].vy += dy * share;
				self.nodes[j].vx -= dx * (1.0 - share);
				self.nodes[j].vy -= dy * (1.0 - share);
			}
		}
	}

	/// Shifts free nodes so their centroid drifts toward the viewport centre.
	fn apply_center(&mut self) {
		let (mut sx, mut sy, mut count) = (0.0, 0.0, 0usize);
		for (node, hidden) in self.nodes.iter().zip(&self.hidden) {
			if !*hidden && !node.is_pinned() {
				sx += node.x;
				sy += node.y;
				count += 1;
			}
		}
		if count == 0 {
			return;
		}
		let (cx, cy) = self.center;
		let strength = self.params.center_strength;
		let shift_x = (sx / count as f64 - cx) * strength;
		let shift_y = (sy / count as f64 - cy) * strength;
		for (node, hidden) in self.nodes.iter_mut().zip(&self.hidden) {
			if !*hidden && !node.is_pinned() {
				node.x -= shift_x;
				node.y -= shift_y;
			}
		}
	}

	pub fn pin(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.pin_here();
		}
	}

	pub fn drag_to(&mut self, index: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.pin_at(x, y);
		}
	}

	pub fn unpin_all(&mut self) {
		for node in &mut self.nodes {
			node.unpin();
		}
	}

	/// Pins every visible node to the nearest free cell of a square grid
	/// sized to the largest visible node. Hidden nodes are pinned in place.
	pub fn snap_to_grid(&mut self) {
		let spacing = self
			.nodes
			.iter()
			.zip(&self.hidden)
			.filter(|(_, hidden)| !**hidden)
			.map(|(node, _)| style::footprint(node.kind))
			.fold(0.0_f64, f64::max);
		let spacing = if spacing > 0.0 { spacing } else { style::DEFAULT_FOOTPRINT };

		let mut occupied = HashSet::new();
		for (node, hidden) in self.nodes.iter_mut().zip(&self.hidden) {
			node.vx = 0.0;
			node.vy = 0.0;
			if *hidden {
				node.pin_here();
				continue;
			}
			let nearest = ((node.x / spacing).round() as i64, (node.y / spacing).round() as i64);
			let cell = free_cell(nearest, &occupied).unwrap_or(nearest);
			occupied.insert(cell);
			node.pin_at(cell.0 as f64 * spacing, cell.1 as f64 * spacing);
		}
		self.running = false;
	}

	/// Rotates every node about `center`, carrying pins along.
	pub fn rotate(&mut self, angle: f64, center: (f64, f64)) {
		let (sin, cos) = angle.sin_cos();
		let (cx, cy) = center;
		for node in &mut self.nodes {
			let (dx, dy) = (node.x - cx, node.y - cy);
			node.x = cx + dx * cos - dy * sin;
			node.y = cy + dx * sin + dy * cos;
			node.vx = 0.0;
			node.vy = 0.0;
			if node.is_pinned() {
				node.pin_here();
			}
		}
	}

	pub fn positions(&self) -> PositionMap {
		self.nodes
			.iter()
			.map(|node| (node.id.clone(), node.position()))
			.collect()
	}

	/// Moves and pins every node named in `positions`. Returns how many matched.
	pub fn apply_positions(&mut self, positions: &PositionMap) -> usize {
		let mut applied = 0;
		for node in &mut self.nodes {
			if let Some(position) = positions.get(&node.id) {
				node.pin_at(position.x, position.y);
				node.vx = 0.0;
				node.vy = 0.0;
				applied += 1;
			}
		}
		applied
	}
}

fn link_distance(kind: EdgeKind, source: &Node, target: &Node, tension: f64) -> f64 {
	match kind {
		EdgeKind::Reaction => REACTION_LINK_DISTANCE,
		EdgeKind::EcIn | EdgeKind::EcOut => ENZYME_LINK_DISTANCE,
		EdgeKind::Substrate | EdgeKind::Product => {
			tension + f64::from(source.generation.abs_diff(target.generation)) * GENERATION_GAP_DISTANCE
		}
	}
}

fn free_cell(origin: (i64, i64), occupied: &HashSet<(i64, i64)>) -> Option<(i64, i64)> {
	if !occupied.contains(&origin) {
		return Some(origin);
	}
	(1..GRID_SEARCH_LIMIT).find_map(|r| {
		(-r..=r)
			.flat_map(move |dx| (-r..=r).map(move |dy| (dx, dy)))
			.filter(|(dx, dy)| dx.abs().max(dy.abs()) == r)
			.map(|(dx, dy)| (origin.0 + dx, origin.1 + dy))
			.find(|cell| !occupied.contains(cell))
	})
}
