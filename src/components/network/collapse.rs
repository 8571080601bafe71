use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::types::{Edge, Node};

const REACTANT_SUFFIX: &str = "_r";
const PRODUCT_SUFFIX: &str = "_p";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
	/// Toward the substrates; halts at product sides.
	Upstream,
	/// Toward the products; halts at reactant sides.
	Downstream,
}

impl Direction {
	fn from_root(id: &str) -> Self {
		if id.ends_with(REACTANT_SUFFIX) {
			Self::Upstream
		} else {
			Self::Downstream
		}
	}

	fn halts_at(self, id: &str) -> bool {
		match self {
			Self::Upstream => id.ends_with(PRODUCT_SUFFIX),
			Self::Downstream => id.ends_with(REACTANT_SUFFIX),
		}
	}
}

/// Node ids hidden by the given collapse roots.
///
/// Each root hides what a breadth-first walk reaches before crossing to the
/// opposite side of a reaction. Results for several roots are unioned and the
/// roots themselves always stay visible.
pub fn hidden_nodes(nodes: &[Node], edges: &[Edge], roots: &BTreeSet<String>) -> HashSet<String> {
	let mut hidden = HashSet::new();
	if roots.is_empty() {
		return hidden;
	}

	let known: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
	let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
	for edge in edges {
		adjacency.entry(&edge.source).or_default().push(&edge.target);
		adjacency.entry(&edge.target).or_default().push(&edge.source);
	}

	for root in roots {
		let direction = Direction::from_root(root);
		let mut visited = HashSet::from([root.as_str()]);
		let mut queue = VecDeque::from([root.as_str()]);

		while let Some(current) = queue.pop_front() {
			for &neighbor in adjacency.get(current).into_iter().flatten() {
				if !visited.insert(neighbor) {
					continue;
				}
				if !known.contains(neighbor) || direction.halts_at(neighbor) {
					continue;
				}
				hidden.insert(neighbor.to_owned());
				queue.push_back(neighbor);
			}
		}
	}

	for root in roots {
		hidden.remove(root);
	}
	hidden
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::network::builder::{build, parse_records};

	/// A -> R1 -> B -> R2 -> C, with an enzyme on R1.
	fn chain() -> (Vec<Node>, Vec<Edge>) {
		let records = parse_records(&json!([
			{
				"reaction": "R1",
				"equation": "A => B",
				"transition": "0 -> 1",
				"compound_generation": {"A": 0, "B": 1},
				"ec_list": ["1.1.1.1"]
			},
			{
				"reaction": "R2",
				"equation": "B => C",
				"transition": "1 -> 2",
				"compound_generation": {"C": 2}
			}
		]));
		let graph = build(&records, 2);
		(graph.nodes, graph.edges)
	}

	fn roots(ids: &[&str]) -> BTreeSet<String> {
		ids.iter().map(|id| id.to_string()).collect()
	}

	fn sorted(hidden: HashSet<String>) -> Vec<String> {
		let mut ids: Vec<_> = hidden.into_iter().collect();
		ids.sort();
		ids
	}

	#[test]
	fn no_roots_hides_nothing() {
		let (nodes, edges) = chain();
		assert!(hidden_nodes(&nodes, &edges, &BTreeSet::new()).is_empty());
	}

	#[test]
	fn reactant_root_hides_substrate_side_only() {
		let (nodes, edges) = chain();
		let hidden = hidden_nodes(&nodes, &edges, &roots(&["R1_r"]));
		assert_eq!(sorted(hidden), vec!["A", "ec_1.1.1.1_1"]);
	}

	#[test]
	fn product_root_hides_downstream_until_next_reaction() {
		let (nodes, edges) = chain();
		let hidden = hidden_nodes(&nodes, &edges, &roots(&["R1_p"]));
		assert_eq!(sorted(hidden), vec!["B", "ec_1.1.1.1_1"]);
		assert!(!hidden_nodes(&nodes, &edges, &roots(&["R1_p"])).contains("R1_r"));
	}

	#[test]
	fn roots_union_and_stay_visible() {
		let (nodes, edges) = chain();
		let both = hidden_nodes(&nodes, &edges, &roots(&["R1_r", "R2_r"]));
		let first = hidden_nodes(&nodes, &edges, &roots(&["R1_r"]));
		let second = hidden_nodes(&nodes, &edges, &roots(&["R2_r"]));
		assert_eq!(both, first.union(&second).cloned().collect::<HashSet<_>>());
		assert!(!both.contains("R1_r"));
		assert!(!both.contains("R2_r"));
	}

	#[test]
	fn expanding_restores_previous_hidden_set() {
		let (nodes, edges) = chain();
		let mut collapsed = roots(&["R2_r"]);
		let before = hidden_nodes(&nodes, &edges, &collapsed);

		collapsed.insert("R1_p".to_owned());
		assert_ne!(hidden_nodes(&nodes, &edges, &collapsed), before);

		collapsed.remove("R1_p");
		assert_eq!(hidden_nodes(&nodes, &edges, &collapsed), before);
	}

	#[test]
	fn unknown_roots_are_harmless() {
		let (nodes, edges) = chain();
		assert!(hidden_nodes(&nodes, &edges, &roots(&["nope_r"])).is_empty());
	}
}
