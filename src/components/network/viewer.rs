use std::collections::HashMap;
use std::time::Duration;

use leptos::html::Div;
use leptos::prelude::*;
use log::{debug, warn};
use serde_json::Value;
use wasm_bindgen::JsCast;
use web_sys::{Element, KeyboardEvent};

use super::builder;
use super::component::{GraphHandle, NetworkCanvas, save_file};
use super::config::{PhysicsConfig, ViewerConfig};
use super::controller::{Playback, ViewerAction};
use super::session::Session;
use super::types::ReactionRecord;

const SESSION_FILE_NAME: &str = "network-session.json";

/// Form controls handle their own keys, Space on a focused button included.
fn keeps_own_keys(tag_name: &str) -> bool {
	matches!(
		tag_name.to_ascii_uppercase().as_str(),
		"INPUT" | "TEXTAREA" | "SELECT" | "BUTTON"
	)
}

fn typing_into_field(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|target| target.dyn_into::<Element>().ok())
		.is_some_and(|el| keeps_own_keys(&el.tag_name()))
}

fn toggle_fullscreen(container: NodeRef<Div>) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	if document.fullscreen_element().is_some() {
		document.exit_fullscreen();
	} else if let Some(el) = container.get_untracked() {
		if let Err(err) = el.request_fullscreen() {
			warn!("fullscreen request rejected: {err:?}");
		}
	}
}

fn is_fullscreen() -> bool {
	web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.fullscreen_element())
		.is_some()
}

/// Backtrace network with its generation slider, toolbar and shortcuts.
#[component]
pub fn NetworkViewer(
	#[prop(into)] records: Signal<Vec<ReactionRecord>>,
	#[prop(into, default = Signal::stored(Value::Null))] parameters: Signal<Value>,
	#[prop(into, default = "600px".to_owned())] height: String,
	#[prop(into, default = Signal::stored(HashMap::new()))] pair_colors: Signal<HashMap<u32, String>>,
	#[prop(optional)] config: ViewerConfig,
) -> impl IntoView {
	let handle = GraphHandle::new();
	let container_ref = NodeRef::<Div>::new();
	let active_records = RwSignal::new(Vec::<ReactionRecord>::new());
	let playback = RwSignal::new(Playback::new(0));
	let physics = RwSignal::new(PhysicsConfig::default());
	let fullscreen = RwSignal::new(false);
	let locked = RwSignal::new(false);
	let saved_session = RwSignal::new(None::<String>);

	Effect::new(move |_| {
		active_records.set(records.get());
	});
	Effect::new(move |_| {
		let max = active_records.with(|r| builder::max_generation(r));
		playback.update(|p| p.set_max(max));
	});

	let playing = Memo::new(move |_| playback.with(Playback::is_playing));
	let timer = StoredValue::new(None::<IntervalHandle>);
	let interval = Duration::from_millis(config.play_interval_ms.max(1) as u64);
	Effect::new(move |_| {
		let playing = playing.get();
		if let Some(running) = timer.try_update_value(Option::take).flatten() {
			running.clear();
		}
		if !playing {
			return;
		}
		let tick = move || {
			playback.try_update(Playback::advance);
		};
		match set_interval_with_handle(tick, interval) {
			Ok(started) => timer.set_value(Some(started)),
			Err(err) => warn!("playback timer: {err:?}"),
		}
	});
	on_cleanup(move || {
		if let Some(running) = timer.try_update_value(Option::take).flatten() {
			running.clear();
		}
	});

	let act = {
		let handle = handle.clone();
		let file_name = config.export_file_name.clone();
		let rotate_step = config.rotate_step;
		move |action: ViewerAction| match action {
			ViewerAction::ZoomIn => {
				handle.controller(|c| c.zoom_in());
			}
			ViewerAction::ZoomOut => {
				handle.controller(|c| c.zoom_out());
			}
			ViewerAction::ResetView => {
				handle.controller(|c| c.reset_view());
			}
			ViewerAction::TogglePlay => playback.update(Playback::toggle_play),
			ViewerAction::StepBackward => playback.update(Playback::step_backward),
			ViewerAction::StepForward => playback.update(Playback::step_forward),
			ViewerAction::ResetSpiral => {
				handle.controller(|c| c.reset_spiral());
			}
			ViewerAction::ToggleFullscreen => toggle_fullscreen(container_ref),
			ViewerAction::ToggleLock => {
				if let Some(now_locked) = handle.controller(|c| {
					c.toggle_lock();
					c.is_locked()
				}) {
					locked.set(now_locked);
				}
			}
			ViewerAction::Download => match handle.download_svg(&file_name) {
				Ok(true) => {}
				Ok(false) => debug!("nothing visible to export"),
				Err(err) => warn!("SVG download failed: {err}"),
			},
			ViewerAction::RotateLeft => {
				handle.controller(|c| c.rotate(-rotate_step));
			}
			ViewerAction::RotateRight => {
				handle.controller(|c| c.rotate(rotate_step));
			}
		}
	};

	let key_act = act.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if ev.ctrl_key() || ev.meta_key() || ev.alt_key() || typing_into_field(&ev) {
			return;
		}
		if let Some(action) = ViewerAction::from_key(&ev.key()) {
			ev.prevent_default();
			key_act(action);
		}
	};

	let snapshot_handle = handle.clone();
	let take_snapshot = move |_| {
		let session = Session {
			parameters: parameters.get_untracked(),
			results: active_records.get_untracked(),
			positions: snapshot_handle
				.controller(|c| c.node_positions())
				.unwrap_or_default(),
			generation: playback.with_untracked(Playback::current),
		};
		match session.to_json() {
			Ok(json) => saved_session.set(Some(json)),
			Err(err) => warn!("session snapshot failed: {err}"),
		}
	};

	let restore_handle = handle.clone();
	let restore_snapshot = move |_| {
		let Some(json) = saved_session.get_untracked() else {
			return;
		};
		let session = match Session::from_json(&json) {
			Ok(session) => session,
			Err(err) => {
				warn!("session restore failed: {err}");
				return;
			}
		};
		restore_handle.with(|s| s.restore(&session));
		playback.update(|p| {
			p.set_max(builder::max_generation(&session.results));
			p.set_current(session.generation);
		});
		active_records.set(session.results);
	};

	let download_session = move |_| {
		let Some(json) = saved_session.get_untracked() else {
			return;
		};
		if let Err(err) = save_file(&json, "application/json", SESSION_FILE_NAME) {
			warn!("session download failed: {err}");
		}
	};

	let toolbar = ViewerAction::ALL
		.into_iter()
		.map(|action| {
			let act = act.clone();
			let title = match action.shortcut() {
				Some(key) => format!("{} ({key})", action.label()),
				None => action.label().to_owned(),
			};
			let text = move || match action {
				ViewerAction::TogglePlay if playing.get() => "Pause",
				ViewerAction::TogglePlay => "Play",
				ViewerAction::ToggleLock if locked.get() => "Unlock",
				ViewerAction::ToggleLock => "Lock",
				_ => action.label(),
			};
			view! {
				<button type="button" class="network-tool" title=title on:click=move |_| act(action)>
					{text}
				</button>
			}
		})
		.collect_view();

	let shortcuts = ViewerAction::ALL
		.into_iter()
		.filter_map(|action| {
			action
				.shortcut()
				.map(|key| view! { <li><kbd>{key}</kbd>" "{action.label()}</li> })
		})
		.collect_view();

	view! {
		<div
			node_ref=container_ref
			class="network-viewer"
			tabindex="0"
			on:keydown=on_keydown
			on:fullscreenchange=move |_| fullscreen.set(is_fullscreen())
		>
			<div class="network-toolbar">{toolbar}</div>

			<div class="network-generation">
				<label>
					{move || format!("Generation {} / {}", playback.get().current(), playback.get().max())}
					<input
						type="range"
						min="0"
						max=move || playback.get().max().to_string()
						prop:value=move || playback.get().current().to_string()
						on:input=move |ev| {
							if let Ok(generation) = event_target_value(&ev).parse() {
								playback.update(|p| p.set_current(generation));
							}
						}
					/>
				</label>
			</div>

			<div class="network-physics">
				<label>
					{move || format!("Tension {:.0}", physics.get().tension)}
					<input
						type="range"
						min="50"
						max="300"
						prop:value=move || physics.get().tension.to_string()
						on:input=move |ev| {
							if let Ok(tension) = event_target_value(&ev).parse() {
								physics.update(|p| p.tension = tension);
							}
						}
					/>
				</label>
				<label>
					{move || format!("Repulsion {:.0}", physics.get().repulsion)}
					<input
						type="range"
						min="0"
						max="1000"
						prop:value=move || physics.get().repulsion.to_string()
						on:input=move |ev| {
							if let Ok(repulsion) = event_target_value(&ev).parse() {
								physics.update(|p| p.repulsion = repulsion);
							}
						}
					/>
				</label>
			</div>

			<NetworkCanvas
				records=active_records
				generation=Signal::derive(move || playback.get().current())
				handle=handle
				fullscreen=fullscreen
				height=height
				pair_colors=pair_colors
				physics=physics
				config=config
			/>

			<div class="network-session">
				<button type="button" on:click=take_snapshot>"Snapshot session"</button>
				<button type="button" on:click=restore_snapshot disabled=move || saved_session.with(Option::is_none)>
					"Restore session"
				</button>
				<button type="button" on:click=download_session disabled=move || saved_session.with(Option::is_none)>
					"Download session"
				</button>
			</div>

			<div class="network-legend">
				<ul>
					<li>"● Compound"</li>
					<li>"▭ Reaction (substrate side / product side)"</li>
					<li>"⬭ Enzyme (EC number)"</li>
					<li>"Ctrl+click a reaction side to collapse its branch"</li>
				</ul>
				<ul class="network-shortcuts">{shortcuts}</ul>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn form_controls_keep_their_keys() {
		for tag in ["INPUT", "TEXTAREA", "SELECT", "BUTTON", "button"] {
			assert!(keeps_own_keys(tag), "{tag}");
		}
		assert!(!keeps_own_keys("DIV"));
		assert!(!keeps_own_keys("CANVAS"));
	}
}
