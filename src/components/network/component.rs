use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, MouseEvent, Url,
	WheelEvent, Window,
};

use super::config::{PhysicsConfig, ViewerConfig, parse_css_length};
use super::controller::GraphController;
use super::render;
use super::state::ViewerState;
use super::types::{Generation, ReactionRecord};
use crate::error::ViewerError;

const FALLBACK_WIDTH: f64 = 800.0;
const FALLBACK_HEIGHT: f64 = 600.0;

/// Shared reference to the mounted canvas state. The host keeps a clone
/// and drives the view through [`GraphController`].
#[derive(Clone, Default)]
pub struct GraphHandle {
	state: Rc<RefCell<Option<ViewerState>>>,
}

impl GraphHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_ready(&self) -> bool {
		self.state.borrow().is_some()
	}

	/// Runs `f` against the live state, if the canvas is mounted.
	pub fn with<R>(&self, f: impl FnOnce(&mut ViewerState) -> R) -> Option<R> {
		self.state.borrow_mut().as_mut().map(f)
	}

	pub fn controller<R>(&self, f: impl FnOnce(&mut dyn GraphController) -> R) -> Option<R> {
		self.with(|state| f(state))
	}

	/// Exports the visible graph and saves it. `Ok(false)` when there was
	/// nothing to export.
	pub fn download_svg(&self, file_name: &str) -> Result<bool, ViewerError> {
		let Some(document) = self.controller(|c| c.export_svg()).flatten() else {
			return Ok(false);
		};
		save_file(&document, "image/svg+xml", file_name)?;
		Ok(true)
	}

	fn install(&self, state: ViewerState) {
		*self.state.borrow_mut() = Some(state);
	}

	fn clear(&self) {
		self.state.borrow_mut().take();
	}
}

/// Hands `contents` to the browser as a download.
pub(crate) fn save_file(contents: &str, mime: &str, file_name: &str) -> Result<(), ViewerError> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| ViewerError::Dom("no document".to_owned()))?;

	let parts = js_sys::Array::of1(&JsValue::from_str(contents));
	let options = BlobPropertyBag::new();
	options.set_type(mime);
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(ViewerError::dom)?;
	let url = Url::create_object_url_with_blob(&blob).map_err(ViewerError::dom)?;

	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(ViewerError::dom)?
		.dyn_into()
		.map_err(|_| ViewerError::Dom("anchor element".to_owned()))?;
	anchor.set_href(&url);
	anchor.set_download(file_name);
	anchor.click();
	Url::revoke_object_url(&url).map_err(ViewerError::dom)?;
	debug!("saved {file_name} ({} bytes)", contents.len());
	Ok(())
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, ViewerError> {
	canvas
		.get_context("2d")
		.map_err(ViewerError::dom)?
		.ok_or_else(|| ViewerError::Dom("2d context unavailable".to_owned()))?
		.dyn_into()
		.map_err(|_| ViewerError::Dom("unexpected context type".to_owned()))
}

/// CSS size of the drawing surface and the device pixel ratio.
fn measure(canvas: &HtmlCanvasElement, window: &Window, fullscreen: bool, height: &str) -> (f64, f64, f64) {
	let ratio = window.device_pixel_ratio().max(1.0);
	if fullscreen {
		let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(FALLBACK_WIDTH);
		let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(FALLBACK_HEIGHT);
		return (w, h, ratio);
	}
	let w = canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(FALLBACK_WIDTH);
	let h = parse_css_length(height)
		.or_else(|| Some(canvas.client_height() as f64).filter(|h| *h > 0.0))
		.unwrap_or(FALLBACK_HEIGHT);
	(w, h, ratio)
}

/// Backing store at device resolution; drawing happens in CSS pixels.
fn size_canvas(canvas: &HtmlCanvasElement, w: f64, h: f64, ratio: f64) {
	canvas.set_width((w * ratio).round() as u32);
	canvas.set_height((h * ratio).round() as u32);
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

#[component]
pub fn NetworkCanvas(
	#[prop(into)] records: Signal<Vec<ReactionRecord>>,
	#[prop(into)] generation: Signal<Generation>,
	handle: GraphHandle,
	#[prop(into, default = Signal::stored(false))] fullscreen: Signal<bool>,
	#[prop(into, default = "600px".to_owned())] height: String,
	#[prop(into, default = Signal::stored(HashMap::new()))] pair_colors: Signal<HashMap<u32, String>>,
	#[prop(into, default = Signal::stored(PhysicsConfig::default()))] physics: Signal<PhysicsConfig>,
	#[prop(optional)] config: ViewerConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = StoredValue::new(true);
	let resize_listener = StoredValue::new(None::<WindowListenerHandle>);

	let (setup_handle, animate_init, setup_height) = (handle.clone(), animate.clone(), height.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if setup_handle.is_ready() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				warn!("network canvas disabled: {err}");
				return;
			}
		};

		let (w, h, ratio) = measure(&canvas, &window, fullscreen.get_untracked(), &setup_height);
		size_canvas(&canvas, w, h, ratio);
		let mut state = ViewerState::new(
			w,
			h,
			ratio,
			physics.get_untracked(),
			config.clone(),
			js_sys::Date::now() as u64,
		);
		state.set_pair_colors(pair_colors.get_untracked());
		state.sync(&records.get_untracked(), generation.get_untracked());
		setup_handle.install(state);

		let (resize_handle, resize_canvas, resize_height) =
			(setup_handle.clone(), canvas.clone(), setup_height.clone());
		let listener = window_event_listener(ev::resize, move |_| {
			let Some(window) = web_sys::window() else {
				return;
			};
			let (w, h, ratio) = measure(&resize_canvas, &window, fullscreen.get_untracked(), &resize_height);
			size_canvas(&resize_canvas, w, h, ratio);
			resize_handle.with(|s| s.resize(w, h, ratio));
		});
		resize_listener.set_value(Some(listener));

		let (frame_handle, animate_inner) = (setup_handle.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			// A disposed owner reads as not alive.
			if !alive.try_get_value().unwrap_or(false) {
				frame_handle.clear();
				animate_inner.borrow_mut().take();
				return;
			}
			frame_handle.with(|s| {
				s.step();
				render::render(s, &ctx);
			});
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(window) = web_sys::window() {
					let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let data_handle = handle.clone();
	Effect::new(move |_| {
		let (records, generation) = (records.get(), generation.get());
		data_handle.with(|s| s.sync(&records, generation));
	});

	let physics_handle = handle.clone();
	Effect::new(move |_| {
		let physics = physics.get();
		physics_handle.with(|s| s.set_physics(physics));
	});

	let colors_handle = handle.clone();
	Effect::new(move |_| {
		let colors = pair_colors.get();
		colors_handle.with(|s| s.set_pair_colors(colors));
	});

	let (fullscreen_handle, fullscreen_height) = (handle.clone(), height.clone());
	Effect::new(move |_| {
		let fullscreen = fullscreen.get();
		let (Some(canvas), Some(window)) = (canvas_ref.get_untracked(), web_sys::window()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h, ratio) = measure(&canvas, &window, fullscreen, &fullscreen_height);
		size_canvas(&canvas, w, h, ratio);
		fullscreen_handle.with(|s| s.resize(w, h, ratio));
	});

	on_cleanup(move || {
		alive.set_value(false);
		if let Some(listener) = resize_listener.try_update_value(Option::take).flatten() {
			listener.remove();
		}
	});

	let state_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		state_md.with(|s| s.pointer_down(x, y, ev.ctrl_key() || ev.meta_key()));
	};

	let state_mm = handle.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let cursor = state_mm.with(|s| {
			s.pointer_move(x, y);
			if s.is_dragging() || s.pan.active {
				"grabbing"
			} else if s.node_at_position(x, y).is_some() {
				"pointer"
			} else {
				"grab"
			}
		});
		if let (Some(cursor), Some(canvas)) = (cursor, canvas_ref.get_untracked()) {
			let canvas: HtmlCanvasElement = canvas.into();
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let state_mu = handle.clone();
	let on_mouseup = move |_: MouseEvent| {
		state_mu.with(|s| s.pointer_up());
	};

	let state_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| {
		state_ml.with(|s| s.pointer_leave());
	};

	let state_wh = handle;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		state_wh.with(|s| s.wheel(x, y, ev.delta_y()));
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="network-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style:display="block"
			style:width="100%"
			style:height=move || if fullscreen.get() { "100vh".to_owned() } else { height.clone() }
			style:cursor="grab"
		/>
	}
}
