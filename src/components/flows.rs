//! Flow list for one subject, and the builder for whichever flow is open.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};

use super::builder::FlowBuilder;
use crate::canvas::{BuilderConfig, RequestSeq, ViewerConfig};
use crate::flow::{FlowDocument, FlowId, FlowManager, FlowMode};
use crate::store::{HttpStore, RecordStore};

/// The flow manager shared between the list and the builder.
pub type SharedFlows = StoredValue<Rc<RefCell<FlowManager>>, LocalStorage>;

/// Lists the subject's saved flows; opening or creating one swaps in the
/// builder until it is closed.
#[component]
pub fn FlowWorkspace(
	/// Project whose flows are listed.
	#[prop(into)] subject: Signal<String>,
	/// Backend for flow records.
	store: HttpStore,
	/// Passed through to [`FlowBuilder`].
	#[prop(optional)] builder: BuilderConfig,
	/// Zoom limits for the builder canvas.
	#[prop(optional)] zoom: ViewerConfig,
) -> impl IntoView {
	let flows: SharedFlows = StoredValue::new_local(Rc::new(RefCell::new(FlowManager::new())));
	let store = StoredValue::new_local(store);
	let mode = RwSignal::new(FlowMode::Closed);
	let refresh = RwSignal::new(0u64);
	let list = RwSignal::new(Vec::<FlowDocument>::new());
	let list_error = RwSignal::new(None::<String>);
	let is_open = Memo::new(move |_| mode.get() != FlowMode::Closed);

	let requests = StoredValue::new_local(RequestSeq::default());

	// A flow belongs to one subject; switching subjects closes it.
	Effect::new(move |previous: Option<String>| {
		let current = subject.get();
		if previous.is_some_and(|p| p != current) {
			flows.with_value(|m| m.borrow_mut().close());
			mode.set(FlowMode::Closed);
			list.set(Vec::new());
		}
		current
	});

	Effect::new(move |_| {
		refresh.track();
		let subject = subject.get();
		let Some(ticket) = requests.try_update_value(|r| r.issue(&subject)) else {
			return;
		};
		let store = store.get_value();
		spawn_local(async move {
			let result = store.list_flows(&subject).await;
			if !requests.try_with_value(|r| r.is_current(&ticket)).unwrap_or(false) {
				debug!("arch-graph: discarding stale flow list for {subject}");
				return;
			}
			match result {
				Ok(docs) => {
					list.set(docs);
					list_error.set(None);
				}
				Err(e) => {
					warn!("arch-graph: cannot list flows for {subject}: {e}");
					list_error.set(Some(e.to_string()));
				}
			}
		});
	});

	let open = move |doc: FlowDocument| {
		let opened = flows.with_value(|m| m.borrow_mut().open(&doc));
		match opened {
			Ok(()) => mode.set(FlowMode::Viewing),
			Err(e) => {
				warn!("arch-graph: cannot open flow {:?}: {e}", doc.name);
				list_error.set(Some(e.to_string()));
			}
		}
	};

	let create = move || {
		flows.with_value(|m| m.borrow_mut().new_flow(&subject.get_untracked()));
		mode.set(FlowMode::Editing);
	};

	let delete = move |id: FlowId| {
		let store = store.get_value();
		spawn_local(async move {
			match store.delete_flow(id).await {
				Ok(()) => {
					flows.try_with_value(|m| {
						m.borrow_mut().forget(id);
						mode.set(m.borrow().mode());
					});
					refresh.update(|n| *n += 1);
				}
				Err(e) => list_error.set(Some(e.to_string())),
			}
		});
	};

	let rows = move || {
		let docs = list.get();
		if docs.is_empty() {
			return view! { <p class="flow-empty">"No flows yet. Create one to document a use case."</p> }
				.into_any();
		}
		let items = docs
			.into_iter()
			.map(|doc| {
				let id = doc.id;
				let name = doc.name.clone();
				let description = doc.description.clone();
				view! {
					<li class="flow-row">
						<div class="flow-row-text">
							<span class="flow-row-name">{name}</span>
							<span class="flow-row-description">{description}</span>
						</div>
						<button class="button" on:click=move |_| open(doc.clone())>"Open"</button>
						{id.map(|id| view! {
							<button class="button button-danger" on:click=move |_| delete(id)>"Delete"</button>
						})}
					</li>
				}
			})
			.collect_view();
		view! { <ul>{items}</ul> }.into_any()
	};

	move || {
		if is_open.get() {
			view! {
				<FlowBuilder
					flows=flows
					subject=subject
					store=store.get_value()
					mode=mode
					refresh=refresh
					config=builder.clone()
					zoom=zoom.clone()
				/>
			}
			.into_any()
		} else {
			view! {
				<section class="flow-list">
					<header class="flow-list-header">
						<h3>"Flows"</h3>
						<button class="button button-primary" on:click=move |_| create()>"New Flow"</button>
					</header>
					{move || list_error.get().map(|e| view! { <div class="flow-error">{e}</div> })}
					{rows}
				</section>
			}
			.into_any()
		}
	}
}
