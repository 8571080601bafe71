use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Generation = u32;

/// Ordered so session documents serialise identically for identical layouts.
pub type PositionMap = BTreeMap<String, Position>;

/// One traced reaction as returned by a backtrace search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
	#[serde(default)]
	pub reaction: String,
	#[serde(default)]
	pub equation: String,
	#[serde(default)]
	pub transition: Option<String>,
	#[serde(default)]
	pub compound_generation: Option<BTreeMap<String, Value>>,
	#[serde(default)]
	pub ec_list: Option<Vec<String>>,
	/// Index of the query this row came from in a combined search.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pair_index: Option<u32>,
}

impl ReactionRecord {
	/// Compound generations, accepting integers or numeric strings.
	pub fn compound_generations(&self) -> impl Iterator<Item = (&str, Generation)> {
		self.compound_generation
			.iter()
			.flatten()
			.filter_map(|(compound, value)| {
				let generation = match value {
					Value::Number(n) => n.as_u64().and_then(|g| Generation::try_from(g).ok()),
					Value::String(s) => s.trim().parse().ok(),
					_ => None,
				}?;
				Some((compound.as_str(), generation))
			})
	}

	pub fn enzymes(&self) -> impl Iterator<Item = &str> {
		self.ec_list
			.iter()
			.flatten()
			.map(|ec| ec.trim())
			.filter(|ec| !ec.is_empty() && *ec != NOT_APPLICABLE_EC)
	}
}

pub const NOT_APPLICABLE_EC: &str = "N/A";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	Compound,
	ReactionIn,
	ReactionOut,
	Ec,
}

impl NodeKind {
	pub fn is_reaction_side(self) -> bool {
		matches!(self, Self::ReactionIn | Self::ReactionOut)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
	Reaction,
	EcIn,
	EcOut,
	Substrate,
	Product,
}

impl EdgeKind {
	pub fn is_enzyme(self) -> bool {
		matches!(self, Self::EcIn | Self::EcOut)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub kind: NodeKind,
	pub generation: Generation,
	pub label: String,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	pub pair_indices: BTreeSet<u32>,
}

impl Node {
	pub fn new(id: impl Into<String>, kind: NodeKind, generation: Generation, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			generation,
			label: label.into(),
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			pair_indices: BTreeSet::new(),
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() && self.fy.is_some()
	}

	pub fn pin_here(&mut self) {
		self.fx = Some(self.x);
		self.fy = Some(self.y);
	}

	pub fn pin_at(&mut self, x: f64, y: f64) {
		self.x = x;
		self.y = y;
		self.fx = Some(x);
		self.fy = Some(y);
	}

	pub fn unpin(&mut self) {
		self.fx = None;
		self.fy = None;
	}

	/// Copy position, velocity and pin state from the same node in a previous build.
	pub fn carry_layout(&mut self, previous: &Node) {
		self.x = previous.x;
		self.y = previous.y;
		self.vx = previous.vx;
		self.vy = previous.vy;
		self.fx = previous.fx;
		self.fy = previous.fy;
	}

	pub fn position(&self) -> Position {
		Position { x: self.x, y: self.y }
	}

	/// Reaction sides show the bare reaction accession.
	pub fn display_label(&self) -> &str {
		if self.kind.is_reaction_side() {
			self.label.split('_').next().unwrap_or(&self.label)
		} else {
			&self.label
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: String,
	pub target: String,
	pub kind: EdgeKind,
	pub generation: Generation,
	pub stoichiometry: Option<f64>,
	pub pair_indices: BTreeSet<u32>,
}

impl Edge {
	pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind, generation: Generation) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
			generation,
			stoichiometry: None,
			pair_indices: BTreeSet::new(),
		}
	}

	pub fn with_stoichiometry(mut self, stoichiometry: f64) -> Self {
		self.stoichiometry = Some(stoichiometry);
		self
	}

	/// Only stoichiometries above one are labelled.
	pub fn stoichiometry_label(&self) -> Option<String> {
		let value = self.stoichiometry.filter(|s| *s > 1.0)?;
		Some(if value.fract() == 0.0 {
			format!("{}", value as u64)
		} else {
			format!("{value}")
		})
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}
