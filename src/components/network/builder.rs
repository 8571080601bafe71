//! Derives the typed node/edge graph from flat reaction records.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use serde_json::Value;

use super::types::{Edge, EdgeKind, Generation, GraphData, Node, NodeKind, ReactionRecord};
use crate::error::ViewerError;

static TRANSITION: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\d+)\s*->\s*(\d+)").expect("transition pattern"));
static TERM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(\d*\.?\d*)\s*(.+)$").expect("term pattern"));

#[derive(Clone, Debug, PartialEq)]
pub struct Term {
	pub id: String,
	pub stoichiometry: f64,
}

/// Accepts whatever the search endpoint produced. Anything but an array is
/// an empty result set; rows that fail to deserialise are dropped.
pub fn parse_records(value: &Value) -> Vec<ReactionRecord> {
	let Some(rows) = value.as_array() else {
		return Vec::new();
	};
	rows.iter()
		.enumerate()
		.filter_map(|(i, row)| {
			match serde_json::from_value::<ReactionRecord>(row.clone()) {
				Ok(record) => Some(record),
				Err(err) => {
					warn!("{}", ViewerError::InvalidRecord(format!("row {i}: {err}")));
					None
				}
			}
		})
		.collect()
}

pub fn max_generation(records: &[ReactionRecord]) -> Generation {
	records
		.iter()
		.flat_map(|record| record.compound_generations().map(|(_, g)| g))
		.max()
		.unwrap_or(0)
}

/// `"<sourceGen> -> <targetGen>"`, falling back to `(0, 0)`.
pub fn parse_transition(transition: Option<&str>) -> (Generation, Generation) {
	let Some(text) = transition else {
		return (0, 0);
	};
	let parsed = TRANSITION.captures(text).and_then(|caps| {
		let source = caps.get(1)?.as_str().parse().ok()?;
		let target = caps.get(2)?.as_str().parse().ok()?;
		Some((source, target))
	});
	parsed.unwrap_or_else(|| {
		warn!("unparseable transition {text:?}, treating as 0 -> 0");
		(0, 0)
	})
}

pub fn parse_term(text: &str) -> Option<Term> {
	let text = text.trim();
	if text.is_empty() {
		return None;
	}
	let Some(caps) = TERM.captures(text) else {
		return Some(Term {
			id: text.to_owned(),
			stoichiometry: 1.0,
		});
	};
	let prefix = caps.get(1).map_or("", |m| m.as_str());
	let id = caps.get(2).map_or(text, |m| m.as_str()).trim();
	Some(Term {
		id: id.to_owned(),
		stoichiometry: prefix.parse::<f64>().ok().filter(|s| *s > 0.0).unwrap_or(1.0),
	})
}

/// Splits `"<reactants> => <products>"`.
pub fn parse_equation(reaction: &str, equation: &str) -> Result<(Vec<Term>, Vec<Term>), ViewerError> {
	let sides: Vec<&str> = equation.split("=>").collect();
	let [reactants, products] = sides.as_slice() else {
		return Err(ViewerError::MalformedEquation {
			reaction: reaction.to_owned(),
			equation: equation.to_owned(),
		});
	};
	let terms = |side: &str| side.split('+').filter_map(parse_term).collect::<Vec<_>>();
	Ok((terms(*reactants), terms(*products)))
}

/// Builds the graph visible at `current`. Node order is insertion order.
pub fn build(records: &[ReactionRecord], current: Generation) -> GraphData {
	let mut graph = GraphBuilder::default();

	for record in records {
		for (compound, generation) in record.compound_generations() {
			if generation <= current {
				graph.add_node(
					Node::new(compound, NodeKind::Compound, generation, compound),
					record.pair_index,
				);
			}
		}
	}

	for record in records {
		if let Err(err) = graph.add_reaction(record, current) {
			warn!("skipping record: {err}");
		}
	}

	graph.finish()
}

#[derive(Default)]
struct GraphBuilder {
	nodes: Vec<Node>,
	index: HashMap<String, usize>,
	edges: Vec<Edge>,
	enzyme_links: HashMap<(String, String), usize>,
}

impl GraphBuilder {
	/// First insertion wins; repeats only merge the query index.
	fn add_node(&mut self, node: Node, pair_index: Option<u32>) {
		let slot = match self.index.get(&node.id) {
			Some(&i) => i,
			None => {
				self.index.insert(node.id.clone(), self.nodes.len());
				self.nodes.push(node);
				self.nodes.len() - 1
			}
		};
		if let Some(pair) = pair_index {
			self.nodes[slot].pair_indices.insert(pair);
		}
	}

	fn has_node(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	fn add_edge(&mut self, mut edge: Edge, pair_index: Option<u32>) {
		if let Some(pair) = pair_index {
			edge.pair_indices.insert(pair);
		}
		self.edges.push(edge);
	}

	/// At most one enzyme edge per (source, target) pair.
	fn add_enzyme_edge(&mut self, edge: Edge, pair_index: Option<u32>) {
		let key = (edge.source.clone(), edge.target.clone());
		if let Some(&existing) = self.enzyme_links.get(&key) {
			if let Some(pair) = pair_index {
				self.edges[existing].pair_indices.insert(pair);
			}
			return;
		}
		self.enzyme_links.insert(key, self.edges.len());
		self.add_edge(edge, pair_index);
	}

	fn add_reaction(&mut self, record: &ReactionRecord, current: Generation) -> Result<(), ViewerError> {
		let (source_gen, target_gen) = parse_transition(record.transition.as_deref());
		// The reactant side appears with its substrates; the product side
		// waits for the target generation.
		if source_gen.min(target_gen) > current {
			return Ok(());
		}
		let (reactants, products) = parse_equation(&record.reaction, &record.equation)?;
		let pair = record.pair_index;

		let reactant_id = format!("{}_r", record.reaction);
		self.add_node(
			Node::new(&reactant_id, NodeKind::ReactionIn, source_gen, &record.reaction),
			pair,
		);

		if current >= target_gen {
			let product_id = format!("{}_p", record.reaction);
			self.add_node(
				Node::new(&product_id, NodeKind::ReactionOut, target_gen, &record.reaction),
				pair,
			);
			self.add_edge(
				Edge::new(&reactant_id, &product_id, EdgeKind::Reaction, target_gen),
				pair,
			);

			let mut seen = HashSet::new();
			for ec in record.enzymes() {
				if !seen.insert(ec) {
					continue;
				}
				let ec_id = format!("ec_{ec}_{target_gen}");
				self.add_node(Node::new(&ec_id, NodeKind::Ec, target_gen, ec), pair);
				self.add_enzyme_edge(
					Edge::new(&reactant_id, &ec_id, EdgeKind::EcIn, target_gen),
					pair,
				);
				self.add_enzyme_edge(
					Edge::new(&ec_id, &product_id, EdgeKind::EcOut, target_gen),
					pair,
				);
			}

			for product in &products {
				if self.has_node(&product.id) {
					self.add_edge(
						Edge::new(&product_id, &product.id, EdgeKind::Product, target_gen)
							.with_stoichiometry(product.stoichiometry),
						pair,
					);
				}
			}
		}

		for reactant in &reactants {
			if self.has_node(&reactant.id) {
				self.add_edge(
					Edge::new(&reactant.id, &reactant_id, EdgeKind::Substrate, source_gen)
						.with_stoichiometry(reactant.stoichiometry),
					pair,
				);
			}
		}

		Ok(())
	}

	fn finish(self) -> GraphData {
		GraphData {
			nodes: self.nodes,
			edges: self.edges,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, HashSet};

	use serde_json::json;

	use super::*;

	fn record(reaction: &str, equation: &str, transition: &str, gens: &[(&str, u32)], ecs: &[&str]) -> ReactionRecord {
		ReactionRecord {
			reaction: reaction.into(),
			equation: equation.into(),
			transition: Some(transition.into()),
			compound_generation: Some(
				gens.iter()
					.map(|(c, g)| (c.to_string(), json!(g)))
					.collect::<BTreeMap<_, _>>(),
			),
			ec_list: Some(ecs.iter().map(|s| s.to_string()).collect()),
			pair_index: None,
		}
	}

	fn sample() -> Vec<ReactionRecord> {
		vec![record(
			"R1",
			"C1 + C2 => C3",
			"0 -> 1",
			&[("C1", 0), ("C2", 0), ("C3", 1)],
			&["1.1.1.1"],
		)]
	}

	fn node_ids(graph: &GraphData) -> HashSet<String> {
		graph.nodes.iter().map(|n| n.id.clone()).collect()
	}

	fn edge_keys(graph: &GraphData) -> HashSet<(String, String, EdgeKind)> {
		graph
			.edges
			.iter()
			.map(|e| (e.source.clone(), e.target.clone(), e.kind))
			.collect()
	}

	fn key(s: &str, t: &str, kind: EdgeKind) -> (String, String, EdgeKind) {
		(s.into(), t.into(), kind)
	}

	#[test]
	fn reactant_side_only_before_target_generation() {
		let graph = build(&sample(), 0);
		let expected: HashSet<String> = ["C1", "C2", "R1_r"].into_iter().map(String::from).collect();
		assert_eq!(node_ids(&graph), expected);
		assert_eq!(
			edge_keys(&graph),
			HashSet::from([
				key("C1", "R1_r", EdgeKind::Substrate),
				key("C2", "R1_r", EdgeKind::Substrate),
			])
		);
	}

	#[test]
	fn full_reaction_at_target_generation() {
		let graph = build(&sample(), 1);
		let expected: HashSet<String> = ["C1", "C2", "C3", "R1_r", "R1_p", "ec_1.1.1.1_1"]
			.into_iter()
			.map(String::from)
			.collect();
		assert_eq!(node_ids(&graph), expected);

		let edges = edge_keys(&graph);
		assert!(edges.contains(&key("R1_r", "R1_p", EdgeKind::Reaction)));
		assert!(edges.contains(&key("R1_r", "ec_1.1.1.1_1", EdgeKind::EcIn)));
		assert!(edges.contains(&key("ec_1.1.1.1_1", "R1_p", EdgeKind::EcOut)));
		assert!(edges.contains(&key("R1_p", "C3", EdgeKind::Product)));
		assert!(edges.contains(&key("C1", "R1_r", EdgeKind::Substrate)));
		assert!(edges.contains(&key("C2", "R1_r", EdgeKind::Substrate)));
		assert_eq!(graph.edges.len(), 6);
	}

	#[test]
	fn stoichiometry_prefixes() {
		let records = vec![record(
			"R7",
			"2 C00001 + C00002 => C00003",
			"0 -> 0",
			&[("C00001", 0), ("C00002", 0), ("C00003", 0)],
			&[],
		)];
		let graph = build(&records, 0);
		let stoich = |from: &str| {
			graph
				.edges
				.iter()
				.find(|e| e.source == from && e.kind == EdgeKind::Substrate)
				.and_then(|e| e.stoichiometry)
		};
		assert_eq!(stoich("C00001"), Some(2.0));
		assert_eq!(stoich("C00002"), Some(1.0));
	}

	#[test]
	fn malformed_equation_skips_only_that_record() {
		let mut records = sample();
		records.insert(
			0,
			record("BAD", "C1 -> C2", "0 -> 0", &[("C1", 0), ("C2", 0)], &[]),
		);
		let graph = build(&records, 1);
		assert!(graph.nodes.iter().all(|n| !n.id.starts_with("BAD")));
		assert!(graph.edges.iter().all(|e| !e.source.starts_with("BAD") && !e.target.starts_with("BAD")));
		assert!(node_ids(&graph).contains("R1_p"));
	}

	#[test]
	fn compound_generation_repeat_keeps_first() {
		let records = vec![
			record("R1", "A => B", "0 -> 1", &[("A", 0), ("B", 1)], &[]),
			record("R2", "A => C", "1 -> 2", &[("A", 1), ("C", 2)], &[]),
		];
		let graph = build(&records, 2);
		let a = graph.nodes.iter().find(|n| n.id == "A").unwrap();
		assert_eq!(a.generation, 0);
	}

	#[test]
	fn shared_enzyme_edges_are_deduplicated() {
		let records = vec![
			record("R1", "A => B", "0 -> 1", &[("A", 0), ("B", 1)], &["1.1.1.1", "1.1.1.1", "N/A"]),
		];
		let graph = build(&records, 1);
		let enzyme_edges = graph.edges.iter().filter(|e| e.kind.is_enzyme()).count();
		assert_eq!(enzyme_edges, 2);
		assert!(graph.nodes.iter().all(|n| n.label != "N/A"));
	}

	#[test]
	fn missing_transition_defaults_to_zero() {
		let mut r = record("R1", "A => B", "", &[("A", 0), ("B", 0)], &[]);
		r.transition = None;
		let graph = build(&[r], 0);
		let product = graph.nodes.iter().find(|n| n.id == "R1_p").unwrap();
		assert_eq!(product.generation, 0);
		assert_eq!(parse_transition(Some("garbage")), (0, 0));
		assert_eq!(parse_transition(Some("2->3")), (2, 3));
	}

	#[test]
	fn rebuild_is_idempotent() {
		assert_eq!(build(&sample(), 1), build(&sample(), 1));
	}

	#[test]
	fn later_generations_are_supersets() {
		let records = vec![
			record("R1", "A + B => C", "0 -> 1", &[("A", 0), ("B", 0), ("C", 1)], &["2.7.1.1"]),
			record("R2", "C => D", "1 -> 2", &[("C", 1), ("D", 2)], &["4.2.1.1"]),
			record("R3", "2 D + A => E", "2 -> 3", &[("D", 2), ("A", 0), ("E", 3)], &[]),
		];
		for g in 0..3 {
			let lower = build(&records, g);
			let upper = build(&records, g + 1);
			assert!(node_ids(&lower).is_subset(&node_ids(&upper)), "nodes at {g}");
			assert!(edge_keys(&lower).is_subset(&edge_keys(&upper)), "edges at {g}");
		}
	}

	#[test]
	fn every_edge_references_an_emitted_node() {
		let records = vec![
			record("R1", "A + X => C", "0 -> 1", &[("A", 0), ("C", 1)], &["1.2.3.4"]),
			record("R2", "C => D", "1 -> 2", &[("C", 1), ("D", 2)], &[]),
		];
		for g in 0..=2 {
			let graph = build(&records, g);
			let ids = node_ids(&graph);
			for edge in &graph.edges {
				assert!(ids.contains(&edge.source) && ids.contains(&edge.target));
			}
		}
	}

	#[test]
	fn ingestion_tolerates_non_arrays_and_bad_rows() {
		assert!(parse_records(&Value::Null).is_empty());
		assert!(parse_records(&json!({"reaction": "R1"})).is_empty());

		let rows = json!([
			{
				"reaction": "R1",
				"equation": "C1 => C2",
				"transition": "0 -> 1",
				"compound_generation": {"C1": "0", "C2": 1},
				"ec_list": ["1.1.1.1"]
			},
			{"reaction": 42},
		]);
		let records = parse_records(&rows);
		assert_eq!(records.len(), 1);
		assert_eq!(max_generation(&records), 1);
	}
}
