use super::types::{Generation, PositionMap};

/// Imperative operations a host toolbar drives on the network view.
pub trait GraphController {
	fn zoom_in(&mut self);
	fn zoom_out(&mut self);
	fn reset_view(&mut self);
	/// `None` when nothing is visible.
	fn export_svg(&self) -> Option<String>;
	fn toggle_lock(&mut self);
	fn is_locked(&self) -> bool;
	fn reset_spiral(&mut self);
	fn node_positions(&self) -> PositionMap;
	fn set_node_positions(&mut self, positions: &PositionMap);
	/// Rigid rotation about the viewport centre, in radians.
	fn rotate(&mut self, angle: f64);
}

/// Generation cursor with play/pause. Ticking is left to the host timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Playback {
	current: Generation,
	max: Generation,
	playing: bool,
}

impl Playback {
	pub fn new(max: Generation) -> Self {
		Self {
			current: 0,
			max,
			playing: false,
		}
	}

	pub fn current(&self) -> Generation {
		self.current
	}

	pub fn max(&self) -> Generation {
		self.max
	}

	pub fn is_playing(&self) -> bool {
		self.playing
	}

	/// New data may shrink the range; the cursor follows.
	pub fn set_max(&mut self, max: Generation) {
		self.max = max;
		self.current = self.current.min(max);
		if self.current >= self.max {
			self.playing = false;
		}
	}

	pub fn set_current(&mut self, generation: Generation) {
		self.current = generation.min(self.max);
	}

	/// Starting from the last generation rewinds to the first.
	pub fn toggle_play(&mut self) {
		if self.playing {
			self.playing = false;
			return;
		}
		if self.current >= self.max {
			self.current = 0;
		}
		self.playing = self.current < self.max;
	}

	/// One timer tick. Returns false once playback has stopped.
	pub fn advance(&mut self) -> bool {
		if !self.playing {
			return false;
		}
		if self.current < self.max {
			self.current += 1;
		}
		if self.current >= self.max {
			self.playing = false;
		}
		true
	}

	pub fn step_forward(&mut self) {
		self.current = (self.current + 1).min(self.max);
	}

	pub fn step_backward(&mut self) {
		self.current = self.current.saturating_sub(1);
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerAction {
	ZoomIn,
	ZoomOut,
	ResetView,
	TogglePlay,
	StepBackward,
	StepForward,
	ResetSpiral,
	ToggleFullscreen,
	ToggleLock,
	Download,
	RotateLeft,
	RotateRight,
}

impl ViewerAction {
	/// Keyboard shortcut for a `KeyboardEvent.key` value.
	pub fn from_key(key: &str) -> Option<Self> {
		Some(match key {
			"+" | "=" => Self::ZoomIn,
			"-" | "_" => Self::ZoomOut,
			"0" => Self::ResetView,
			" " => Self::TogglePlay,
			"ArrowLeft" => Self::StepBackward,
			"ArrowRight" => Self::StepForward,
			"r" | "R" => Self::ResetSpiral,
			"f" | "F" => Self::ToggleFullscreen,
			"l" | "L" => Self::ToggleLock,
			"[" => Self::RotateLeft,
			"]" => Self::RotateRight,
			_ => return None,
		})
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::ZoomIn => "Zoom in",
			Self::ZoomOut => "Zoom out",
			Self::ResetView => "Reset view",
			Self::TogglePlay => "Play / pause",
			Self::StepBackward => "Previous generation",
			Self::StepForward => "Next generation",
			Self::ResetSpiral => "Reset layout",
			Self::ToggleFullscreen => "Fullscreen",
			Self::ToggleLock => "Lock / unlock",
			Self::Download => "Download SVG",
			Self::RotateLeft => "Rotate left",
			Self::RotateRight => "Rotate right",
		}
	}

	pub fn shortcut(self) -> Option<&'static str> {
		match self {
			Self::ZoomIn => Some("+"),
			Self::ZoomOut => Some("-"),
			Self::ResetView => Some("0"),
			Self::TogglePlay => Some("Space"),
			Self::StepBackward => Some("←"),
			Self::StepForward => Some("→"),
			Self::ResetSpiral => Some("R"),
			Self::ToggleFullscreen => Some("F"),
			Self::ToggleLock => Some("L"),
			Self::RotateLeft => Some("["),
			Self::RotateRight => Some("]"),
			Self::Download => None,
		}
	}

	pub const ALL: [Self; 12] = [
		Self::ZoomIn,
		Self::ZoomOut,
		Self::ResetView,
		Self::TogglePlay,
		Self::StepBackward,
		Self::StepForward,
		Self::ResetSpiral,
		Self::ToggleFullscreen,
		Self::ToggleLock,
		Self::Download,
		Self::RotateLeft,
		Self::RotateRight,
	];
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn play_stops_at_last_generation() {
		let mut playback = Playback::new(2);
		playback.toggle_play();
		assert!(playback.is_playing());
		assert!(playback.advance());
		assert_eq!(playback.current(), 1);
		assert!(playback.advance());
		assert_eq!(playback.current(), 2);
		assert!(!playback.is_playing());
		assert!(!playback.advance());
		assert_eq!(playback.current(), 2);
	}

	#[test]
	fn play_from_end_rewinds() {
		let mut playback = Playback::new(3);
		playback.set_current(3);
		playback.toggle_play();
		assert_eq!(playback.current(), 0);
		assert!(playback.is_playing());
		playback.toggle_play();
		assert!(!playback.is_playing());
	}

	#[test]
	fn single_generation_never_plays() {
		let mut playback = Playback::new(0);
		playback.toggle_play();
		assert!(!playback.is_playing());
	}

	#[test]
	fn steps_clamp_to_range() {
		let mut playback = Playback::new(1);
		playback.step_backward();
		assert_eq!(playback.current(), 0);
		playback.step_forward();
		playback.step_forward();
		assert_eq!(playback.current(), 1);
		playback.set_current(9);
		assert_eq!(playback.current(), 1);
	}

	#[test]
	fn shrinking_range_pulls_cursor_back() {
		let mut playback = Playback::new(5);
		playback.set_current(4);
		playback.set_max(2);
		assert_eq!(playback.current(), 2);
	}

	#[test]
	fn shortcuts_round_trip() {
		assert_eq!(ViewerAction::from_key("="), Some(ViewerAction::ZoomIn));
		assert_eq!(ViewerAction::from_key(" "), Some(ViewerAction::TogglePlay));
		assert_eq!(ViewerAction::from_key("ArrowLeft"), Some(ViewerAction::StepBackward));
		assert_eq!(ViewerAction::from_key("q"), None);
		for action in ViewerAction::ALL {
			if let Some(key) = action.shortcut().filter(|key| key.len() == 1) {
				assert_eq!(ViewerAction::from_key(key), Some(action), "{key}");
			}
		}
	}
}
