//! Leptos component for viewing and editing one flow document.
//!
//! Canvas gestures go through [`BuilderCanvas::handle`]; toolbar actions call
//! the [`FlowManager`] lifecycle directly and mirror the result into signals.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, DragEvent, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::flows::SharedFlows;
use super::theme::Theme;
use super::{canvas_point, fit_to_parent, now_ms, render, run_frames};
use crate::canvas::{
	BuilderCanvas, BuilderConfig, BuilderEvent, BuilderOutcome, RequestSeq, ViewerConfig,
};
use crate::error::SaveError;
use crate::flow::{FlowManager, FlowMode, Palette, PaletteItem};
use crate::geometry::Point;
use crate::graph::Graph;
use crate::store::{HttpStore, RecordStore};

const BUILDER_HEIGHT: f64 = 600.0;

#[derive(Clone)]
struct Builder {
	flows: Rc<RefCell<FlowManager>>,
	canvas: Rc<RefCell<BuilderCanvas>>,
	mode: RwSignal<FlowMode>,
	name: RwSignal<String>,
	description: RwSignal<String>,
	error: RwSignal<Option<String>>,
	refresh: RwSignal<u64>,
	store: HttpStore,
}

impl Builder {
	/// Mirrors manager state into the toolbar signals.
	fn sync(&self) {
		let flows = self.flows.borrow();
		self.mode.set(flows.mode());
		if let Some(view) = flows.view() {
			self.name.set(view.flow().name.clone());
			self.description.set(view.flow().description.clone());
		}
	}

	fn handle(&self, event: BuilderEvent) -> BuilderOutcome {
		self.canvas
			.borrow_mut()
			.handle(&mut self.flows.borrow_mut(), event)
	}

	fn rename(&self, name: String) {
		if let Some(edit) = self.flows.borrow_mut().editable() {
			edit.set_name(name.clone());
		}
		self.name.set(name);
	}

	fn describe(&self, description: String) {
		if let Some(edit) = self.flows.borrow_mut().editable() {
			edit.set_description(description.clone());
		}
		self.description.set(description);
	}

	fn edit(&self) {
		if self.flows.borrow_mut().request_edit() {
			self.error.set(None);
			self.sync();
		}
	}

	fn cancel(&self) {
		self.flows.borrow_mut().cancel();
		if let Some(view) = self.flows.borrow().view() {
			self.canvas.borrow_mut().restore(view.graph().viewport);
		}
		self.error.set(None);
		self.sync();
	}

	fn close(&self) {
		self.flows.borrow_mut().close();
		self.sync();
	}

	fn save(&self) {
		let viewport = *self.canvas.borrow().viewport();
		let started = self.flows.borrow_mut().begin_save(viewport);
		let (ticket, doc) = match started {
			Ok(started) => started,
			Err(e) => {
				self.error.set(Some(e.to_string()));
				return;
			}
		};
		self.error.set(None);
		self.sync();

		let this = self.clone();
		spawn_local(async move {
			let result = this.store.save_flow(&doc).await;
			let finished = this.flows.borrow_mut().finish_save(ticket, result);
			match finished {
				Ok(_) => this.refresh.update(|n| *n += 1),
				// The flow was closed meanwhile; the list may still have changed.
				Err(SaveError::Superseded) => {
					this.refresh.update(|n| *n += 1);
					return;
				}
				Err(e) => this.error.set(Some(e.to_string())),
			}
			this.sync();
		});
	}
}

type SharedBuilder = StoredValue<Builder, LocalStorage>;

/// Canvas editor for the open flow in `flows`.
///
/// Drag palette items onto the canvas, drag from a node's bottom connector to
/// another node's connector to link them, Delete removes the selected node.
#[component]
pub fn FlowBuilder(
	/// Flow manager shared with the workspace.
	flows: SharedFlows,
	/// Project whose components fill the palette.
	#[prop(into)] subject: Signal<String>,
	/// Backend for the palette graph and saves.
	store: HttpStore,
	/// Mirrors [`FlowManager::mode`] for the host.
	mode: RwSignal<FlowMode>,
	/// Bumped after a save so the host reloads its list.
	refresh: RwSignal<u64>,
	/// Card and connector geometry.
	#[prop(optional)] config: BuilderConfig,
	/// Zoom limits.
	#[prop(optional)] zoom: ViewerConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let error = RwSignal::new(None::<String>);
	let palette = RwSignal::new(Palette::default());
	let search = RwSignal::new(String::new());

	let manager = flows.get_value();
	let mut canvas = BuilderCanvas::new(config, zoom);
	if let Some(view) = manager.borrow().view() {
		canvas.restore(view.graph().viewport);
	}
	let builder: SharedBuilder = StoredValue::new_local(Builder {
		flows: manager,
		canvas: Rc::new(RefCell::new(canvas)),
		mode,
		name: RwSignal::new(String::new()),
		description: RwSignal::new(String::new()),
		error,
		refresh,
		store: store.clone(),
	});
	builder.with_value(Builder::sync);
	let (name, description) = builder.with_value(|b| (b.name, b.description));

	let requests = StoredValue::new_local(RequestSeq::default());
	Effect::new(move |_| {
		let subject = subject.get();
		let Some(ticket) = requests.try_update_value(|r| r.issue(&subject)) else {
			return;
		};
		palette.set(Palette::default());
		let store = store.clone();
		spawn_local(async move {
			let result = store.fetch_graph(&subject).await;
			if !requests.try_with_value(|r| r.is_current(&ticket)).unwrap_or(false) {
				debug!("arch-graph: discarding stale palette for {subject}");
				return;
			}
			match result {
				Ok(raw) => palette.set(Palette::from_graph(&Graph::ingest(raw).graph)),
				Err(e) => warn!("arch-graph: palette for {subject} unavailable: {e}"),
			}
		});
	});

	let alive = Arc::new(AtomicBool::new(true));
	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			return;
		};

		let theme = Theme::default();
		let mut size = (canvas.width() as f64, canvas.height() as f64);
		run_frames(alive.clone(), move || {
			if let Some(resized) = fit_to_parent(&canvas, BUILDER_HEIGHT) {
				size = resized;
			}
			builder.try_with_value(|b| {
				let flows = b.flows.borrow();
				let Some(view) = flows.view() else {
					return;
				};
				render::render_builder(
					&ctx,
					view.graph(),
					view.selected(),
					&b.canvas.borrow(),
					flows.mode() == FlowMode::Editing,
					size,
					&theme,
				);
			});
		});
	});

	let dispatch = move |event: BuilderEvent| {
		builder.with_value(|b| b.handle(event));
	};
	let pointer = move |ev: &MouseEvent| -> Option<(HtmlCanvasElement, Point)> {
		let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
		let p = canvas_point(&canvas, ev);
		Some((canvas, p))
	};

	let on_mousedown = move |ev: MouseEvent| {
		if let Some((canvas, p)) = pointer(&ev) {
			let _ = canvas.focus();
			dispatch(BuilderEvent::PointerDown(p));
		}
	};
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((_, p)) = pointer(&ev) {
			dispatch(BuilderEvent::PointerMove(p));
		}
	};
	let on_mouseup = move |ev: MouseEvent| {
		if let Some((_, p)) = pointer(&ev) {
			dispatch(BuilderEvent::PointerUp(p));
		}
	};
	let on_mouseleave = move |_: MouseEvent| dispatch(BuilderEvent::Leave);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((_, p)) = pointer(&*ev) {
			dispatch(BuilderEvent::Wheel {
				at: p,
				delta_y: ev.delta_y(),
			});
		}
	};
	let on_keydown = move |ev: KeyboardEvent| match ev.key().as_str() {
		"Delete" | "Backspace" => {
			ev.prevent_default();
			dispatch(BuilderEvent::DeleteSelected);
		}
		"Escape" => dispatch(BuilderEvent::Escape),
		_ => {}
	};
	let on_dragover = move |ev: DragEvent| ev.prevent_default();
	let on_drop = move |ev: DragEvent| {
		ev.prevent_default();
		if let Some((canvas, p)) = pointer(&*ev) {
			let over_canvas = p.x >= 0.0
				&& p.y >= 0.0
				&& p.x <= canvas.width() as f64
				&& p.y <= canvas.height() as f64;
			dispatch(BuilderEvent::PaletteDrop {
				at: p,
				over_canvas,
				minted_at: now_ms(),
			});
		}
	};

	let actions = move || match mode.get() {
		FlowMode::Viewing => view! {
			<button class="button" on:click=move |_| builder.with_value(Builder::edit)>"Edit"</button>
		}
		.into_any(),
		FlowMode::Editing => view! {
			<button class="button button-primary" on:click=move |_| builder.with_value(Builder::save)>
				"Save"
			</button>
			<button class="button" on:click=move |_| builder.with_value(Builder::cancel)>"Cancel"</button>
		}
		.into_any(),
		FlowMode::Saving => view! {
			<button class="button button-primary" disabled=true>"Saving..."</button>
		}
		.into_any(),
		FlowMode::Closed => ().into_any(),
	};

	let sidebar = move || {
		(mode.get() == FlowMode::Editing).then(|| {
			let groups = move || {
				palette
					.with(|p| p.groups(&search.get()))
					.into_iter()
					.map(|group| {
						let title = group.title();
						let items = group
							.items
							.into_iter()
							.map(|item| palette_entry(item, builder))
							.collect_view();
						view! {
							<div class="palette-group">
								<h4>{title}</h4>
								{items}
							</div>
						}
					})
					.collect_view()
			};
			view! {
				<aside class="flow-palette">
					<input
						type="search"
						placeholder="Search components..."
						prop:value=move || search.get()
						on:input=move |ev| search.set(event_target_value(&ev))
					/>
					<div class="palette-group">
						<h4>"Tools"</h4>
						{palette_entry(PaletteItem::note(), builder)}
					</div>
					{groups}
				</aside>
			}
		})
	};

	view! {
		<div class="flow-builder">
			<div class="flow-toolbar">
				<input
					class="flow-name"
					prop:value=move || name.get()
					prop:disabled=move || mode.get() != FlowMode::Editing
					on:input=move |ev| builder.with_value(|b| b.rename(event_target_value(&ev)))
				/>
				<input
					class="flow-description"
					placeholder="Description"
					prop:value=move || description.get()
					prop:disabled=move || mode.get() != FlowMode::Editing
					on:input=move |ev| builder.with_value(|b| b.describe(event_target_value(&ev)))
				/>
				{actions}
				<button class="button" on:click=move |_| builder.with_value(Builder::close)>"Close"</button>
			</div>
			{move || error.get().map(|e| view! { <div class="flow-error">{e}</div> })}
			<div class="flow-body">
				{sidebar}
				<div class="flow-canvas-wrap">
					<canvas
						node_ref=canvas_ref
						class="flow-canvas"
						tabindex="0"
						on:mousedown=on_mousedown
						on:mousemove=on_mousemove
						on:mouseup=on_mouseup
						on:mouseleave=on_mouseleave
						on:wheel=on_wheel
						on:keydown=on_keydown
						on:dragover=on_dragover
						on:drop=on_drop
						style="display: block; outline: none;"
					/>
				</div>
			</div>
		</div>
	}
}

fn palette_entry(item: PaletteItem, builder: SharedBuilder) -> impl IntoView {
	let label = item.label.clone();
	let note = item.kind.is_note();
	let on_dragstart = move |ev: DragEvent| {
		if let Some(transfer) = ev.data_transfer() {
			let _ = transfer.set_data("text/plain", &item.label);
			transfer.set_effect_allowed("move");
		}
		builder.with_value(|b| b.handle(BuilderEvent::PaletteDragStart(item.clone())));
	};
	let on_dragend = move |_: DragEvent| {
		builder.with_value(|b| b.handle(BuilderEvent::PaletteDragEnd));
	};
	view! {
		<div
			class="palette-item"
			class:palette-note=note
			draggable="true"
			on:dragstart=on_dragstart
			on:dragend=on_dragend
		>
			{label}
		</div>
	}
}
