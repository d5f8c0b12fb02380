//! arch-graph: architecture graph viewer and flow builder for analyzed projects.
//!
//! The crate renders a project's analyzed component graph as a tiered,
//! left-to-right diagram with click-to-highlight, and lets users author
//! free-form "flow" diagrams from the same components. The graph model,
//! layout, highlight and canvas reducers are plain Rust and tested natively;
//! the Leptos components under [`components`] bind them to a WASM canvas.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod canvas;
pub mod components;
pub mod config;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod graph;
pub mod store;

pub use components::{ArchitectureGraphViewer, FlowBuilder, FlowWorkspace};
pub use config::{AppConfig, load_config};
pub use store::{HttpStore, RecordStore};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("arch-graph: logging initialized");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
	Architecture,
	Flows,
}

/// Main application component.
/// Reads configuration from the DOM and shows the viewer and flow workspace
/// for the chosen project.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config();
	let store = StoredValue::new_local(HttpStore::new(config.api_base.clone()));
	let subject = RwSignal::new(config.subject.clone().unwrap_or_default());
	let draft = RwSignal::new(subject.get_untracked());
	let tab = RwSignal::new(Tab::Architecture);
	// Switching subjects keeps the mounted views; they react to `subject`.
	let has_subject = Memo::new(move |_| !subject.get().trim().is_empty());

	let viewer_config = config.viewer.clone();
	let layout = config.layout.clone();
	let builder_config = config.builder.clone();
	let zoom = config.viewer.clone();

	let body = move || {
		if !has_subject.get() {
			return view! { <p class="app-hint">"Enter a project name to view its architecture."</p> }
				.into_any();
		}
		match tab.get() {
			Tab::Architecture => view! {
				<ArchitectureGraphViewer
					subject=subject
					store=store.get_value()
					config=viewer_config.clone()
					layout=layout.clone()
				/>
			}
			.into_any(),
			Tab::Flows => view! {
				<FlowWorkspace
					subject=subject
					store=store.get_value()
					builder=builder_config.clone()
					zoom=zoom.clone()
				/>
			}
			.into_any(),
		}
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Architecture Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<main class="app">
			<header class="app-header">
				<form
					class="subject-form"
					on:submit=move |ev| {
						ev.prevent_default();
						subject.set(draft.get_untracked().trim().to_string());
					}
				>
					<input
						placeholder="Project name"
						prop:value=move || draft.get()
						on:input=move |ev| draft.set(event_target_value(&ev))
					/>
					<button class="button" type="submit">"Open"</button>
				</form>
				<nav class="tabs">
					<button
						class="tab"
						class:tab-active=move || tab.get() == Tab::Architecture
						on:click=move |_| tab.set(Tab::Architecture)
					>
						"Architecture"
					</button>
					<button
						class="tab"
						class:tab-active=move || tab.get() == Tab::Flows
						on:click=move |_| tab.set(Tab::Flows)
					>
						"Flows"
					</button>
				</nav>
			</header>
			{body}
		</main>
	}
}
