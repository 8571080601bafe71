use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Force-layout tuning. `tension` and `repulsion` are exposed as sliders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
	/// Rest length of substrate/product links, in world units.
	pub tension: f64,
	/// Base charge magnitude; deeper generations are scaled up from this.
	pub repulsion: f64,
	pub velocity_decay: f64,
	pub alpha_decay: f64,
	pub collision_strength: f64,
	pub center_strength: f64,
	/// Synchronous ticks run after each rebuild, before the first paint.
	pub settle_ticks: usize,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			tension: 130.0,
			repulsion: 800.0,
			velocity_decay: 0.3,
			alpha_decay: 0.02,
			collision_strength: 0.7,
			center_strength: 0.1,
			settle_ticks: 300,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
	pub play_interval_ms: i32,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub zoom_in_factor: f64,
	pub zoom_out_factor: f64,
	pub reset_zoom: f64,
	/// Radians per rotate shortcut.
	pub rotate_step: f64,
	pub export_padding: f64,
	pub export_file_name: String,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			play_interval_ms: 1500,
			min_zoom: 0.2,
			max_zoom: 10.0,
			zoom_in_factor: 1.5,
			zoom_out_factor: 0.75,
			reset_zoom: 0.8,
			rotate_step: PI / 12.0,
			export_padding: 50.0,
			export_file_name: "metabolic-network.svg".to_owned(),
		}
	}
}

/// Reads a CSS length such as `"600px"` or `"600"`. Relative units are not
/// resolvable here and yield `None`.
pub fn parse_css_length(value: &str) -> Option<f64> {
	let value = value.trim();
	let number = value.strip_suffix("px").unwrap_or(value).trim();
	number.parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_lengths() {
		assert_eq!(parse_css_length("600px"), Some(600.0));
		assert_eq!(parse_css_length(" 480 "), Some(480.0));
		assert_eq!(parse_css_length("70vh"), None);
		assert_eq!(parse_css_length("-2px"), None);
	}

	#[test]
	fn partial_config_falls_back_to_defaults() {
		let physics: PhysicsConfig = serde_json::from_str(r#"{"tension": 200}"#).unwrap();
		assert_eq!(physics.tension, 200.0);
		assert_eq!(physics.repulsion, PhysicsConfig::default().repulsion);
	}
}
