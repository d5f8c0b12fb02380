//! Leptos component wrapping the read-only architecture canvas.
//!
//! Pointer and wheel events are translated to [`ViewerEvent`]s. Fetch commands
//! run on `spawn_local` and feed their result back through the same reducer.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::theme::Theme;
use super::{canvas_point, fit_to_parent, now_ms, render, run_frames};
use crate::canvas::{ViewStatus, ViewerCommand, ViewerConfig, ViewerController, ViewerEvent};
use crate::graph::{Category, LayoutConfig};
use crate::store::{HttpStore, RecordStore};

const VIEWER_HEIGHT: f64 = 550.0;

/// Reducer plus what the host needs to run its commands.
#[derive(Clone)]
struct Viewer {
	controller: Rc<RefCell<ViewerController>>,
	status: RwSignal<ViewStatus>,
	store: HttpStore,
}

impl Viewer {
	fn dispatch(&self, event: ViewerEvent) {
		let command = self.controller.borrow_mut().apply(event);
		let status = self.controller.borrow().status().clone();
		if status != self.status.get_untracked() {
			self.status.set(status);
		}
		if let Some(ViewerCommand::Fetch(ticket)) = command {
			let this = self.clone();
			spawn_local(async move {
				let event = match this.store.fetch_graph(&ticket.subject).await {
					Ok(graph) => ViewerEvent::Loaded { ticket, graph },
					Err(e) => ViewerEvent::Failed {
						ticket,
						message: e.to_string(),
					},
				};
				this.dispatch(event);
			});
		}
	}
}

/// Renders the analyzed architecture of `subject` as a tiered graph.
///
/// Click a node to highlight its direct neighbours, click it again or the
/// background to clear. Drag to pan, scroll to zoom.
#[component]
pub fn ArchitectureGraphViewer(
	/// Project to show; changes trigger a fresh fetch.
	#[prop(into)] subject: Signal<String>,
	/// Backend the graph is fetched from.
	store: HttpStore,
	/// Zoom limits and click slop.
	#[prop(optional)] config: ViewerConfig,
	/// Tier layout dimensions.
	#[prop(optional)] layout: LayoutConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let fullscreen = RwSignal::new(false);
	let viewer = Viewer {
		controller: Rc::new(RefCell::new(ViewerController::new(config, layout))),
		status: RwSignal::new(ViewStatus::Idle),
		store,
	};

	let alive = Arc::new(AtomicBool::new(true));
	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let viewer_init = viewer.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if let Some((width, height)) = fit_to_parent(&canvas, VIEWER_HEIGHT) {
			viewer_init.dispatch(ViewerEvent::Resize { width, height });
		}
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			return;
		};

		let theme = Theme::default();
		let viewer_frame = viewer_init.clone();
		run_frames(alive.clone(), move || {
			if let Some((width, height)) = fit_to_parent(&canvas, VIEWER_HEIGHT) {
				viewer_frame.dispatch(ViewerEvent::Resize { width, height });
			}
			render::render_viewer(
				&ctx,
				&viewer_frame.controller.borrow(),
				&theme,
				now_ms() as f64,
			);
		});
	});

	let viewer_open = viewer.clone();
	Effect::new(move |_| {
		let subject = subject.get();
		if !subject.trim().is_empty() {
			viewer_open.dispatch(ViewerEvent::Open(subject));
		}
	});

	let pointer = move |ev: &MouseEvent| {
		canvas_ref.get().map(|c| {
			let canvas: HtmlCanvasElement = c.into();
			canvas_point(&canvas, ev)
		})
	};

	let viewer_md = viewer.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some(p) = pointer(&ev) {
			viewer_md.dispatch(ViewerEvent::PointerDown(p));
		}
	};

	let viewer_mm = viewer.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = pointer(&ev) {
			viewer_mm.dispatch(ViewerEvent::PointerMove(p));
		}
	};

	let viewer_mu = viewer.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(p) = pointer(&ev) {
			viewer_mu.dispatch(ViewerEvent::PointerUp(p));
		}
	};

	let viewer_ml = viewer.clone();
	let on_mouseleave = move |_: MouseEvent| viewer_ml.dispatch(ViewerEvent::Leave);

	let viewer_wh = viewer.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(p) = pointer(&*ev) {
			viewer_wh.dispatch(ViewerEvent::Wheel {
				at: p,
				delta_y: ev.delta_y(),
			});
		}
	};

	let viewer_reset = viewer.clone();
	let on_reset = move |_: MouseEvent| viewer_reset.dispatch(ViewerEvent::Reset);

	let status = viewer.status;
	let overlay = move || match status.get() {
		ViewStatus::Idle => None,
		ViewStatus::Loading => Some(view! { <div class="graph-status">"Loading architecture..."</div> }.into_any()),
		ViewStatus::Ready => None,
		ViewStatus::Empty => Some(
			view! { <div class="graph-status">"No components found. Analyze the project first."</div> }
				.into_any(),
		),
		ViewStatus::Failed(message) => Some(
			view! {
				<div class="graph-status graph-status-error">
					<p>"Could not load the architecture graph."</p>
					<p class="graph-status-detail">{message}</p>
				</div>
			}
			.into_any(),
		),
	};

	view! {
		<div class="arch-viewer" class:arch-viewer-fullscreen=move || fullscreen.get()>
			<div class="arch-viewer-controls">
				<button class="icon-button" title="Reset Layout" on:click=on_reset>
					"\u{21bb}"
				</button>
				<button
					class="icon-button"
					title=move || if fullscreen.get() { "Exit Fullscreen" } else { "Enter Fullscreen" }
					on:click=move |_| fullscreen.update(|f| *f = !*f)
				>
					{move || if fullscreen.get() { "\u{2715}" } else { "\u{26f6}" }}
				</button>
			</div>
			<canvas
				node_ref=canvas_ref
				class="arch-viewer-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{overlay}
			<Legend />
		</div>
	}
}

/// Tier legend along the bottom of the viewer.
#[component]
fn Legend() -> impl IntoView {
	let theme = Theme::default();
	let tiers = [
		(Category::Controller, "Controller"),
		(Category::Service, "Service"),
		(Category::Repository, "Repo"),
		(Category::Entity, "Entity"),
	];
	let items = tiers
		.into_iter()
		.enumerate()
		.map(|(i, (category, label))| {
			let dot = format!("background: {};", theme.category(category).accent.to_css());
			view! {
				{(i > 0).then(|| view! { <span class="legend-arrow">"\u{2192}"</span> })}
				<span class="legend-item">
					<span class="legend-dot" style=dot></span>
					{label}
				</span>
			}
		})
		.collect_view();

	view! { <div class="arch-legend">{items}</div> }
}
