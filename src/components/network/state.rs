use std::collections::{BTreeSet, HashMap};

use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::builder;
use super::collapse;
use super::config::{PhysicsConfig, ViewerConfig};
use super::controller::GraphController;
use super::export;
use super::session::Session;
use super::simulation::{Simulation, Snapshot};
use super::spiral::{self, SpiralOptions};
use super::style;
use super::types::{Generation, GraphData, Node, PositionMap, ReactionRecord};

const DRAG_ALPHA_TARGET: f64 = 0.3;
const UNLOCK_ALPHA: f64 = 0.7;
const RESPIRAL_ALPHA: f64 = 0.8;
const NUDGE_ALPHA: f64 = 0.3;
const WHEEL_ZOOM_IN: f64 = 1.1;
const WHEEL_ZOOM_OUT: f64 = 0.9;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	/// Held by ID; rebuilds reorder the node list.
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Everything the canvas needs between frames: the layout, the camera and
/// in-flight pointer gestures.
pub struct ViewerState {
	simulation: Simulation,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub pixel_ratio: f64,
	physics: PhysicsConfig,
	config: ViewerConfig,
	records: Vec<ReactionRecord>,
	current_generation: Generation,
	max_generation: Generation,
	collapsed: BTreeSet<String>,
	locked: bool,
	pair_colors: HashMap<u32, String>,
	rng: SmallRng,
}

impl ViewerState {
	pub fn new(
		width: f64,
		height: f64,
		pixel_ratio: f64,
		physics: PhysicsConfig,
		config: ViewerConfig,
		seed: u64,
	) -> Self {
		let simulation = Simulation::new(GraphData::default(), physics.clone(), (width / 2.0, height / 2.0));
		Self {
			simulation,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			pixel_ratio,
			physics,
			config,
			records: Vec::new(),
			current_generation: 0,
			max_generation: 0,
			collapsed: BTreeSet::new(),
			locked: false,
			pair_colors: HashMap::new(),
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	/// Rebuilds for new records and/or a new generation cursor.
	pub fn sync(&mut self, records: &[ReactionRecord], generation: Generation) {
		if self.records == records && self.current_generation == generation && !self.simulation.nodes().is_empty() {
			return;
		}
		self.records = records.to_vec();
		self.max_generation = builder::max_generation(&self.records);
		self.current_generation = generation;
		self.rebuild();
	}

	fn rebuild(&mut self) {
		let mut data = builder::build(&self.records, self.current_generation);

		let mut fresh = Vec::new();
		for (i, node) in data.nodes.iter_mut().enumerate() {
			match self.simulation.node(&node.id) {
				Some(previous) => {
					node.carry_layout(previous);
					if !self.locked && node.generation < self.current_generation {
						node.pin_here();
					}
				}
				None => fresh.push(i),
			}
		}

		let center = self.layout_center();
		let mut placed: Vec<Node> = fresh.iter().map(|&i| data.nodes[i].clone()).collect();
		let options = SpiralOptions {
			center,
			current_generation: self.current_generation,
			only_current_generation: false,
			lock: self.locked,
			reset: false,
		};
		spiral::place(&mut placed, &options, &mut self.rng);
		for (node, &i) in placed.into_iter().zip(&fresh) {
			data.nodes[i] = node;
		}

		let (node_count, edge_count) = (data.nodes.len(), data.edges.len());
		self.simulation = Simulation::new(data, self.physics.clone(), center);
		self.refresh_hidden();

		if self.locked {
			self.simulation.stop();
		} else {
			self.simulation.restart(1.0);
			self.simulation.settle(self.physics.settle_ticks);
		}
		debug!(
			"rebuilt generation {}/{}: {node_count} nodes ({} new), {edge_count} edges",
			self.current_generation,
			self.max_generation,
			fresh.len(),
		);
	}

	fn refresh_hidden(&mut self) {
		let hidden = collapse::hidden_nodes(self.simulation.nodes(), self.simulation.edges(), &self.collapsed);
		self.simulation.set_hidden(&hidden);
	}

	/// World point under the middle of the viewport.
	fn layout_center(&self) -> (f64, f64) {
		self.screen_to_world(self.width / 2.0, self.height / 2.0)
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Nearest visible node whose outline contains the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (wx, wy) = self.screen_to_world(sx, sy);
		self.simulation
			.nodes()
			.iter()
			.enumerate()
			.filter(|(i, _)| !self.simulation.is_hidden(*i))
			.filter_map(|(i, node)| {
				let (dx, dy) = (wx - node.x, wy - node.y);
				style::hit_test(node.kind, dx, dy).then_some((i, dx.hypot(dy)))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	/// Collapse toggle, node drag or pan, depending on what is under the pointer.
	pub fn pointer_down(&mut self, sx: f64, sy: f64, collapse_modifier: bool) {
		match self.node_at_position(sx, sy) {
			Some(index) if collapse_modifier && self.simulation.nodes()[index].kind.is_reaction_side() => {
				let id = self.simulation.nodes()[index].id.clone();
				self.toggle_collapse(&id);
			}
			Some(index) => {
				let node = &self.simulation.nodes()[index];
				self.drag = DragState {
					active: true,
					node: Some(node.id.clone()),
					start_x: sx,
					start_y: sy,
					node_start_x: node.x,
					node_start_y: node.y,
				};
				self.simulation.pin(index);
				if !self.locked {
					self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
					self.simulation.resume();
				}
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.drag.active {
			if let Some(index) = self.drag.node.as_deref().and_then(|id| self.simulation.index_of(id)) {
				let x = self.drag.node_start_x + (sx - self.drag.start_x) / self.transform.k;
				let y = self.drag.node_start_y + (sy - self.drag.start_y) / self.transform.k;
				self.simulation.drag_to(index, x, y);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	/// Dropped nodes stay pinned where they were released.
	pub fn pointer_up(&mut self) {
		if self.drag.active {
			self.simulation.set_alpha_target(0.0);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	pub fn pointer_leave(&mut self) {
		self.pointer_up();
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.active
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN };
		self.zoom_at(sx, sy, factor);
	}

	/// Scales the view about a screen point, keeping that point fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(self.config.min_zoom, self.config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom_at(self.width / 2.0, self.height / 2.0, factor);
	}

	pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
		self.width = width;
		self.height = height;
		self.pixel_ratio = pixel_ratio;
	}

	pub fn set_physics(&mut self, physics: PhysicsConfig) {
		if physics == self.physics {
			return;
		}
		self.physics = physics.clone();
		self.simulation.set_params(physics);
		if !self.locked {
			self.simulation.restart(NUDGE_ALPHA);
		}
	}

	pub fn toggle_collapse(&mut self, id: &str) {
		if !self.collapsed.remove(id) {
			self.collapsed.insert(id.to_owned());
		}
		self.refresh_hidden();
		debug!("collapse roots: {:?}", self.collapsed);
		if !self.locked {
			self.simulation.restart(NUDGE_ALPHA);
		}
	}

	pub fn is_collapsed(&self, id: &str) -> bool {
		self.collapsed.contains(id)
	}

	pub fn set_pair_colors(&mut self, colors: HashMap<u32, String>) {
		self.pair_colors = colors;
	}

	pub fn pair_colors(&self) -> &HashMap<u32, String> {
		&self.pair_colors
	}

	/// One animation frame of layout.
	pub fn step(&mut self) -> bool {
		self.simulation.step()
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn snapshot(&self) -> Snapshot<'_> {
		self.simulation.snapshot()
	}

	#[cfg(test)]
	pub fn current_generation(&self) -> Generation {
		self.current_generation
	}

	pub fn max_generation(&self) -> Generation {
		self.max_generation
	}

	/// Loads a saved session and pins every node it has a position for.
	pub fn restore(&mut self, session: &Session) {
		self.sync(&session.results, session.generation);
		self.set_node_positions(&session.positions);
	}
}

impl GraphController for ViewerState {
	fn zoom_in(&mut self) {
		self.zoom_by(self.config.zoom_in_factor);
	}

	fn zoom_out(&mut self) {
		self.zoom_by(self.config.zoom_out_factor);
	}

	/// Back to the default scale with the layout centre in the middle.
	fn reset_view(&mut self) {
		let k = self.config.reset_zoom;
		self.transform = ViewTransform {
			x: self.width / 2.0 * (1.0 - k),
			y: self.height / 2.0 * (1.0 - k),
			k,
		};
	}

	fn export_svg(&self) -> Option<String> {
		let document = export::export_svg(&self.snapshot(), self.max_generation, self.config.export_padding)?;
		debug!("exported {} bytes of SVG", document.len());
		Some(document)
	}

	fn toggle_lock(&mut self) {
		self.locked = !self.locked;
		if self.locked {
			self.simulation.snap_to_grid();
		} else {
			self.simulation.unpin_all();
			self.simulation.set_alpha_target(0.0);
			self.simulation.restart(UNLOCK_ALPHA);
		}
		debug!("layout {}", if self.locked { "locked" } else { "unlocked" });
	}

	fn is_locked(&self) -> bool {
		self.locked
	}

	/// Re-seeds the current generation only; earlier ones keep their layout.
	fn reset_spiral(&mut self) {
		let options = SpiralOptions {
			center: self.layout_center(),
			current_generation: self.current_generation,
			only_current_generation: true,
			lock: self.locked,
			reset: true,
		};
		spiral::place(self.simulation.nodes_mut(), &options, &mut self.rng);
		if !self.locked {
			self.simulation.restart(RESPIRAL_ALPHA);
		}
	}

	fn node_positions(&self) -> PositionMap {
		self.simulation.positions()
	}

	fn set_node_positions(&mut self, positions: &PositionMap) {
		let applied = self.simulation.apply_positions(positions);
		debug!("restored {applied} of {} node positions", positions.len());
	}

	fn rotate(&mut self, angle: f64) {
		let center = self.layout_center();
		self.simulation.rotate(angle, center);
	}
}
