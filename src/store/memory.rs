//! In-memory [`RecordStore`] for tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use super::RecordStore;
use crate::error::StoreError;
use crate::flow::{FlowDocument, FlowId};
use crate::graph::RawGraph;

#[derive(Debug, Default)]
pub struct MemoryStore {
	graphs: HashMap<String, RawGraph>,
	flows: RefCell<BTreeMap<FlowId, FlowDocument>>,
	next_id: Cell<FlowId>,
	/// When set, saves answer with this HTTP status.
	pub fail_saves: Cell<Option<u16>>,
}

impl MemoryStore {
	pub fn with_graph(subject: &str, graph: RawGraph) -> Self {
		let mut store = Self::default();
		store.graphs.insert(subject.to_string(), graph);
		store
	}
}

impl RecordStore for MemoryStore {
	async fn fetch_graph(&self, subject: &str) -> Result<RawGraph, StoreError> {
		Ok(self.graphs.get(subject).cloned().unwrap_or_default())
	}

	async fn list_flows(&self, subject: &str) -> Result<Vec<FlowDocument>, StoreError> {
		Ok(self
			.flows
			.borrow()
			.values()
			.filter(|d| d.subject_name == subject)
			.cloned()
			.collect())
	}

	async fn save_flow(&self, doc: &FlowDocument) -> Result<FlowDocument, StoreError> {
		if let Some(status) = self.fail_saves.get() {
			return Err(StoreError::Status {
				url: "memory://flows".into(),
				status,
			});
		}
		let id = match doc.id {
			Some(id) if self.flows.borrow().contains_key(&id) => id,
			Some(id) => return Err(StoreError::NotFound { id }),
			None => {
				let id = self.next_id.get() + 1;
				self.next_id.set(id);
				id
			}
		};
		let stored = FlowDocument {
			id: Some(id),
			..doc.clone()
		};
		self.flows.borrow_mut().insert(id, stored.clone());
		Ok(stored)
	}

	async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError> {
		self.flows
			.borrow_mut()
			.remove(&id)
			.map(|_| ())
			.ok_or(StoreError::NotFound { id })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::canvas::Viewport;
	use crate::error::SaveError;
	use crate::flow::{FlowManager, FlowMode, FlowNodeKind, Palette};
	use crate::geometry::Point;
	use crate::graph::{Category, Graph, GraphNode};

	const SERVICE: FlowNodeKind = FlowNodeKind::Component(Category::Service);

	fn drafted(subject: &str) -> FlowManager {
		let mut m = FlowManager::new();
		m.new_flow(subject);
		let e = m.editable().unwrap();
		e.set_name("Checkout");
		let a = e.add_node(SERVICE, "OrderService", Point::new(10.0, 20.0), 100);
		let b = e.add_node(FlowNodeKind::Note, "Sticky Note", Point::new(300.0, 20.0), 200);
		e.connect(&a, &b);
		m
	}

	#[tokio::test]
	async fn save_list_and_reopen_round_trip() {
		let store = MemoryStore::default();
		let mut m = drafted("shop");
		let draft = m.view().unwrap().graph().clone();
		let vp = Viewport {
			x: -20.0,
			y: -10.0,
			zoom: 1.5,
		};

		let (ticket, doc) = m.begin_save(vp).unwrap();
		let id = m.finish_save(ticket, store.save_flow(&doc).await).unwrap();
		assert_eq!(id, Some(1));

		let listed = store.list_flows("shop").await.unwrap();
		assert_eq!(listed.len(), 1);
		assert!(store.list_flows("billing").await.unwrap().is_empty());

		let mut reopened = FlowManager::new();
		reopened.open(&listed[0]).unwrap();
		let graph = reopened.view().unwrap().graph();
		assert_eq!(graph.nodes, draft.nodes);
		assert_eq!(graph.edges, draft.edges);
		assert_eq!(graph.viewport, vp);
		assert_eq!(reopened.view().unwrap().flow().name, "Checkout");
	}

	#[tokio::test]
	async fn second_save_updates_in_place() {
		let store = MemoryStore::default();
		let mut m = drafted("shop");
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		m.finish_save(ticket, store.save_flow(&doc).await).unwrap();

		assert!(m.request_edit());
		m.editable().unwrap().set_description("with payment");
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		assert_eq!(doc.id, Some(1));
		m.finish_save(ticket, store.save_flow(&doc).await).unwrap();

		let listed = store.list_flows("shop").await.unwrap();
		assert_eq!(listed.len(), 1);
		assert_eq!(listed[0].description, "with payment");
	}

	#[tokio::test]
	async fn failed_save_keeps_draft_editable() {
		let store = MemoryStore::default();
		store.fail_saves.set(Some(500));
		let mut m = drafted("shop");
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		let err = m.finish_save(ticket, store.save_flow(&doc).await).unwrap_err();
		assert!(matches!(
			err,
			SaveError::Store(StoreError::Status { status: 500, .. })
		));
		assert_eq!(m.mode(), FlowMode::Editing);
		assert!(store.list_flows("shop").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn delete_then_forget_closes_open_flow() {
		let store = MemoryStore::default();
		let mut m = drafted("shop");
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		let id = m
			.finish_save(ticket, store.save_flow(&doc).await)
			.unwrap()
			.unwrap();
		store.delete_flow(id).await.unwrap();
		m.forget(id);
		assert_eq!(m.mode(), FlowMode::Closed);
		assert!(matches!(
			store.delete_flow(id).await,
			Err(StoreError::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn unknown_subject_has_empty_graph_and_palette() {
		let store = MemoryStore::with_graph(
			"shop",
			RawGraph {
				nodes: vec![GraphNode::new("s1", "OrderService", Category::Service)],
				edges: vec![],
			},
		);
		let raw = store.fetch_graph("shop").await.unwrap();
		assert!(!Palette::from_graph(&Graph::ingest(raw).graph).is_empty());
		let raw = store.fetch_graph("billing").await.unwrap();
		assert!(Palette::from_graph(&Graph::ingest(raw).graph).is_empty());
	}
}
