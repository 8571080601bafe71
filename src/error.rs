use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum ViewerError {
	#[error("reaction {reaction:?} has a malformed equation {equation:?}")]
	MalformedEquation { reaction: String, equation: String },

	#[error("invalid reaction record: {0}")]
	InvalidRecord(String),

	#[error("session document: {0}")]
	Session(#[from] serde_json::Error),

	#[error("browser call failed: {0}")]
	Dom(String),
}

impl ViewerError {
	pub fn dom(value: JsValue) -> Self {
		Self::Dom(
			value
				.as_string()
				.unwrap_or_else(|| format!("{value:?}")),
		)
	}
}
