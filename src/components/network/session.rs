use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{Generation, PositionMap, ReactionRecord};
use crate::error::ViewerError;

/// Saved search: its parameters, the rows it returned and where the user
/// left every node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
	#[serde(default)]
	pub parameters: Value,
	#[serde(default)]
	pub results: Vec<ReactionRecord>,
	#[serde(default)]
	pub positions: PositionMap,
	#[serde(default)]
	pub generation: Generation,
}

impl Session {
	pub fn to_json(&self) -> Result<String, ViewerError> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	pub fn from_json(text: &str) -> Result<Self, ViewerError> {
		Ok(serde_json::from_str(text)?)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::network::builder::parse_records;
	use crate::components::network::types::Position;

	#[test]
	fn snapshot_survives_json() {
		let session = Session {
			parameters: json!({"target": "C00031", "generations": 3}),
			results: parse_records(&json!([{
				"reaction": "R1",
				"equation": "A => B",
				"transition": "0 -> 1",
				"compound_generation": {"A": 0, "B": 1}
			}])),
			positions: PositionMap::from([("A".to_owned(), Position { x: 3.5, y: -1.0 })]),
			generation: 1,
		};
		let text = session.to_json().unwrap();
		assert_eq!(Session::from_json(&text).unwrap(), session);
	}

	#[test]
	fn missing_sections_default() {
		let session = Session::from_json(r#"{"results": []}"#).unwrap();
		assert!(session.positions.is_empty());
		assert_eq!(session.generation, 0);
		assert!(session.parameters.is_null());
	}

	#[test]
	fn garbage_is_a_session_error() {
		assert!(matches!(Session::from_json("{nope"), Err(ViewerError::Session(_))));
	}
}
