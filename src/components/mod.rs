//! Leptos components: the architecture viewer, the flow builder and the
//! flow list, plus the canvas renderer and theme they share.

mod builder;
mod flows;
mod render;
pub mod theme;
mod viewer;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent};

use crate::geometry::Point;

pub use builder::FlowBuilder;
pub use flows::FlowWorkspace;
pub use theme::Theme;
pub use viewer::ArchitectureGraphViewer;

/// Pointer position relative to the canvas' top-left corner.
fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Sizes the canvas backing store to its parent. Returns the new size when
/// it changed.
fn fit_to_parent(canvas: &HtmlCanvasElement, fallback_height: f64) -> Option<(f64, f64)> {
	let parent = canvas.parent_element()?;
	let w = parent.client_width() as f64;
	let h = match parent.client_height() {
		0 => fallback_height,
		h => h as f64,
	};
	if canvas.width() == w as u32 && canvas.height() == h as u32 {
		return None;
	}
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	Some((w, h))
}

/// Wall-clock milliseconds, used to mint node ids.
fn now_ms() -> u64 {
	js_sys::Date::now() as u64
}

/// Calls `frame` on every animation frame until `alive` is cleared.
fn run_frames(alive: Arc<AtomicBool>, mut frame: impl FnMut() + 'static) {
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let animate_inner = animate.clone();
	*animate.borrow_mut() = Some(Closure::new(move || {
		if !alive.load(Ordering::Relaxed) {
			return;
		}
		frame();
		if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let (Some(window), Some(cb)) = (web_sys::window(), animate.borrow().as_ref()) {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}
