//! Open-flow state machine.
//!
//! ```text
//!   open(doc) ──► Viewing ──request_edit──► Editing ──begin_save──► (saving)
//!                    ▲                        │  ▲                     │
//!                    └──────── cancel ────────┘  └──── store error ────┤
//!                    ▲                                                 │
//!                    └──────────────────── store ok ───────────────────┘
//!   new_flow ──► Editing (no baseline; cancel closes)
//! ```
//!
//! Mutation is only reachable through [`EditableFlow`], which the manager
//! hands out exclusively in the Editing state while no save is in flight.
//! Viewing exposes [`ReadOnlyFlow`], which can select but not mutate.

use std::ops::{Deref, DerefMut};

use log::{debug, info, warn};

use super::document::{
	self, ArrowMarker, DEFAULT_RELATION, FlowDocument, FlowEdge, FlowGraph, FlowId, FlowNode,
	FlowNodeKind, NEW_FLOW_NAME,
};
use crate::canvas::viewport::Viewport;
use crate::error::{DocumentError, SaveError, StoreError};
use crate::geometry::Point;

/// A decoded flow: document metadata plus its graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpenFlow {
	/// Store id; `None` until first saved.
	pub id: Option<FlowId>,
	/// Display name.
	pub name: String,
	/// Free-text description.
	pub description: String,
	/// Analyzed project the flow belongs to.
	pub subject_name: String,
	/// Decoded canvas contents.
	pub graph: FlowGraph,
}

impl OpenFlow {
	/// Decodes a stored document.
	pub fn from_document(doc: &FlowDocument) -> Result<Self, DocumentError> {
		Ok(Self {
			id: doc.id,
			name: doc.name.clone(),
			description: doc.description.clone(),
			subject_name: doc.subject_name.clone(),
			graph: document::decode(&doc.serialized_graph)?,
		})
	}

	/// Encodes back into the store's record shape.
	pub fn to_document(&self) -> Result<FlowDocument, DocumentError> {
		Ok(FlowDocument {
			id: self.id,
			name: self.name.clone(),
			description: self.description.clone(),
			subject_name: self.subject_name.clone(),
			serialized_graph: document::encode(&self.graph)?,
		})
	}

	fn empty(subject: &str) -> Self {
		Self {
			id: None,
			name: NEW_FLOW_NAME.to_string(),
			description: String::new(),
			subject_name: subject.to_string(),
			graph: FlowGraph::default(),
		}
	}
}

/// Read-only capability: inspect the flow and change the selection.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOnlyFlow {
	flow: OpenFlow,
	selected: Option<String>,
}

impl ReadOnlyFlow {
	fn new(flow: OpenFlow) -> Self {
		Self {
			flow,
			selected: None,
		}
	}

	/// The open flow.
	pub fn flow(&self) -> &OpenFlow {
		&self.flow
	}

	/// Canvas contents of the open flow.
	pub fn graph(&self) -> &FlowGraph {
		&self.flow.graph
	}

	/// Id of the selected card.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Selects `id` if it exists, or clears the selection.
	pub fn select(&mut self, id: Option<&str>) {
		self.selected = id
			.filter(|id| self.flow.graph.contains(id))
			.map(str::to_string);
	}
}

/// Editable capability: everything [`ReadOnlyFlow`] offers plus mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct EditableFlow {
	view: ReadOnlyFlow,
	/// Last saved state to return to on cancel; `None` for a new flow.
	baseline: Option<OpenFlow>,
}

impl Deref for EditableFlow {
	type Target = ReadOnlyFlow;

	fn deref(&self) -> &ReadOnlyFlow {
		&self.view
	}
}

impl DerefMut for EditableFlow {
	fn deref_mut(&mut self) -> &mut ReadOnlyFlow {
		&mut self.view
	}
}

impl EditableFlow {
	/// Renames the draft.
	pub fn set_name(&mut self, name: impl Into<String>) {
		self.view.flow.name = name.into();
	}

	/// Replaces the draft's description.
	pub fn set_description(&mut self, description: impl Into<String>) {
		self.view.flow.description = description.into();
	}

	/// Places a new node at `position` and returns its id.
	pub fn add_node(
		&mut self,
		kind: FlowNodeKind,
		label: impl Into<String>,
		position: Point,
		created_at_ms: u64,
	) -> String {
		let graph = &mut self.view.flow.graph;
		let id = graph.mint_node_id(kind, created_at_ms);
		graph.nodes.push(FlowNode {
			id: id.clone(),
			label: label.into(),
			kind,
			position,
		});
		debug!("arch-graph: added flow node {id}");
		id
	}

	/// Adds a directed edge with the default relation and a closed arrow.
	///
	/// Refuses self-loops, unknown endpoints and duplicate edges.
	pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
		let graph = &mut self.view.flow.graph;
		if source == target
			|| !graph.contains(source)
			|| !graph.contains(target)
			|| graph.has_edge(source, target)
		{
			return None;
		}
		let id = format!("e-{source}-{target}");
		graph.edges.push(FlowEdge {
			id: id.clone(),
			source: source.to_string(),
			target: target.to_string(),
			relation: DEFAULT_RELATION.to_string(),
			marker_end: ArrowMarker::ArrowClosed,
		});
		Some(id)
	}

	/// Moves one node. Other nodes and edges are untouched.
	pub fn move_node(&mut self, id: &str, position: Point) -> bool {
		match self.view.flow.graph.node_mut(id) {
			Some(node) => {
				node.position = position;
				true
			}
			None => false,
		}
	}

	/// Removes a node together with every edge touching it.
	pub fn remove_node(&mut self, id: &str) -> bool {
		let graph = &mut self.view.flow.graph;
		let before = graph.nodes.len();
		graph.nodes.retain(|n| n.id != id);
		if graph.nodes.len() == before {
			return false;
		}
		graph.edges.retain(|e| e.source != id && e.target != id);
		if self.view.selected.as_deref() == Some(id) {
			self.view.selected = None;
		}
		true
	}
}

/// Current state of the open flow.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FlowState {
	/// Nothing open; the host shows the flow list.
	#[default]
	Closed,
	/// A saved flow shown read-only.
	Viewing(ReadOnlyFlow),
	/// A draft being edited, possibly with a save in flight.
	Editing(EditableFlow),
}

/// Coarse mode for toolbars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowMode {
	/// Nothing open.
	Closed,
	/// Read-only.
	Viewing,
	/// Mutable, no save in flight.
	Editing,
	/// A save is in flight; mutation is withheld until it answers.
	Saving,
}

/// Identifies one [`FlowManager::begin_save`] call. Only the answer carrying
/// the ticket of the save still in flight is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveTicket {
	seq: u64,
}

/// Owns the currently open flow document.
#[derive(Debug, Default)]
pub struct FlowManager {
	state: FlowState,
	/// Snapshot handed to the store, present while a save is in flight.
	saving: Option<(SaveTicket, OpenFlow)>,
	save_seq: u64,
}

impl FlowManager {
	/// Manager with nothing open.
	pub fn new() -> Self {
		Self::default()
	}

	/// Full state, for inspection.
	pub fn state(&self) -> &FlowState {
		&self.state
	}

	/// Coarse mode for the toolbar.
	pub fn mode(&self) -> FlowMode {
		match (&self.state, &self.saving) {
			(FlowState::Closed, _) => FlowMode::Closed,
			(FlowState::Viewing(_), _) => FlowMode::Viewing,
			(FlowState::Editing(_), Some(_)) => FlowMode::Saving,
			(FlowState::Editing(_), None) => FlowMode::Editing,
		}
	}

	/// Read-only access in both Viewing and Editing.
	pub fn view(&self) -> Option<&ReadOnlyFlow> {
		match &self.state {
			FlowState::Closed => None,
			FlowState::Viewing(v) => Some(v),
			FlowState::Editing(e) => Some(&e.view),
		}
	}

	/// Selection access in both Viewing and Editing.
	pub fn view_mut(&mut self) -> Option<&mut ReadOnlyFlow> {
		match &mut self.state {
			FlowState::Closed => None,
			FlowState::Viewing(v) => Some(v),
			FlowState::Editing(e) => Some(&mut e.view),
		}
	}

	/// Mutation capability; `None` unless Editing with no save in flight.
	pub fn editable(&mut self) -> Option<&mut EditableFlow> {
		match (&mut self.state, &self.saving) {
			(FlowState::Editing(e), None) => Some(e),
			_ => None,
		}
	}

	/// Opens a stored document read-only.
	pub fn open(&mut self, doc: &FlowDocument) -> Result<(), DocumentError> {
		let flow = OpenFlow::from_document(doc)?;
		info!(
			"arch-graph: opened flow {:?} ({} nodes, {} edges)",
			flow.name,
			flow.graph.nodes.len(),
			flow.graph.edges.len()
		);
		self.saving = None;
		self.state = FlowState::Viewing(ReadOnlyFlow::new(flow));
		Ok(())
	}

	/// Starts an empty, never-saved flow directly in Editing.
	pub fn new_flow(&mut self, subject: &str) {
		self.saving = None;
		self.state = FlowState::Editing(EditableFlow {
			view: ReadOnlyFlow::new(OpenFlow::empty(subject)),
			baseline: None,
		});
	}

	/// Viewing -> Editing on the same document. Returns whether it switched.
	pub fn request_edit(&mut self) -> bool {
		match std::mem::take(&mut self.state) {
			FlowState::Viewing(view) => {
				let baseline = Some(view.flow.clone());
				self.state = FlowState::Editing(EditableFlow { view, baseline });
				true
			}
			other => {
				self.state = other;
				false
			}
		}
	}

	/// Freezes the draft for saving and returns the document to write, with
	/// the ticket its answer must be handed back with.
	///
	/// `viewport` is stored alongside the graph. Until [`finish_save`] is
	/// called the editable capability is withheld.
	///
	/// [`finish_save`]: FlowManager::finish_save
	pub fn begin_save(
		&mut self,
		viewport: Viewport,
	) -> Result<(SaveTicket, FlowDocument), SaveError> {
		if self.saving.is_some() {
			return Err(SaveError::InFlight);
		}
		let FlowState::Editing(edit) = &self.state else {
			return Err(SaveError::NotEditing);
		};
		if edit.graph().is_empty() {
			return Err(SaveError::EmptyCanvas);
		}
		let mut snapshot = edit.flow().clone();
		snapshot.graph.viewport = viewport;
		let doc = snapshot.to_document()?;
		self.save_seq += 1;
		let ticket = SaveTicket { seq: self.save_seq };
		self.saving = Some((ticket, snapshot));
		Ok((ticket, doc))
	}

	/// Applies the store's answer to [`begin_save`](FlowManager::begin_save).
	///
	/// On success the flow becomes Viewing with the store-assigned id. On
	/// failure the manager stays in Editing with the draft untouched and the
	/// error is handed back for display.
	///
	/// An answer whose ticket is not the save in flight (the flow was closed
	/// or replaced meanwhile) changes nothing and yields
	/// [`SaveError::Superseded`].
	pub fn finish_save(
		&mut self,
		ticket: SaveTicket,
		result: Result<FlowDocument, StoreError>,
	) -> Result<Option<FlowId>, SaveError> {
		let Some((_, mut snapshot)) = self.saving.take_if(|(pending, _)| *pending == ticket) else {
			debug!("arch-graph: ignoring answer to superseded save #{}", ticket.seq);
			return Err(SaveError::Superseded);
		};
		match result {
			Ok(saved) => {
				snapshot.id = saved.id.or(snapshot.id);
				let selected = self.view().and_then(|v| v.selected().map(str::to_string));
				let mut view = ReadOnlyFlow::new(snapshot);
				view.select(selected.as_deref());
				let id = view.flow.id;
				info!("arch-graph: saved flow {:?} as {:?}", view.flow.name, id);
				self.state = FlowState::Viewing(view);
				Ok(id)
			}
			Err(e) => {
				warn!("arch-graph: save failed, keeping draft: {e}");
				Err(SaveError::Store(e))
			}
		}
	}

	/// Discards unsaved edits.
	///
	/// Editing returns to Viewing of the last saved state, or closes a flow
	/// that was never saved. Viewing and Closed are unaffected.
	pub fn cancel(&mut self) {
		if self.saving.is_some() {
			debug!("arch-graph: cancel ignored while saving");
			return;
		}
		self.state = match std::mem::take(&mut self.state) {
			FlowState::Editing(EditableFlow {
				baseline: Some(flow),
				..
			}) => FlowState::Viewing(ReadOnlyFlow::new(flow)),
			FlowState::Editing(EditableFlow { baseline: None, .. }) => FlowState::Closed,
			other => other,
		};
	}

	/// Closes whatever is open, dropping unsaved edits.
	pub fn close(&mut self) {
		self.saving = None;
		self.state = FlowState::Closed;
	}

	/// Closes the open flow if it is the one just deleted from the store.
	pub fn forget(&mut self, id: FlowId) {
		if self.view().and_then(|v| v.flow().id) == Some(id) {
			self.close();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::Category;

	const SERVICE: FlowNodeKind = FlowNodeKind::Component(Category::Service);
	const ENTITY: FlowNodeKind = FlowNodeKind::Component(Category::Entity);

	fn editing_with_two_nodes() -> (FlowManager, String, String) {
		let mut m = FlowManager::new();
		m.new_flow("shop");
		let e = m.editable().unwrap();
		let a = e.add_node(SERVICE, "OrderService", Point::new(0.0, 0.0), 1);
		let b = e.add_node(ENTITY, "Order", Point::new(0.0, 200.0), 2);
		(m, a, b)
	}

	fn stored(id: FlowId) -> FlowDocument {
		FlowDocument {
			id: Some(id),
			name: "Checkout".into(),
			description: String::new(),
			subject_name: "shop".into(),
			serialized_graph: String::new(),
		}
	}

	#[test]
	fn new_flow_skips_viewing() {
		let mut m = FlowManager::new();
		m.new_flow("shop");
		assert_eq!(m.mode(), FlowMode::Editing);
		assert_eq!(m.view().unwrap().flow().name, NEW_FLOW_NAME);
		assert!(m.view().unwrap().flow().id.is_none());
	}

	#[test]
	fn viewing_withholds_mutation() {
		let mut m = FlowManager::new();
		m.open(&stored(3)).unwrap();
		assert_eq!(m.mode(), FlowMode::Viewing);
		assert!(m.editable().is_none());
		assert!(m.request_edit());
		assert!(m.editable().is_some());
		assert!(!m.request_edit());
	}

	#[test]
	fn save_without_id_creates_then_views_with_store_id() {
		let (mut m, _, _) = editing_with_two_nodes();
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		assert!(doc.id.is_none());
		assert_eq!(m.mode(), FlowMode::Saving);
		assert!(m.editable().is_none());

		let saved = FlowDocument {
			id: Some(17),
			..doc
		};
		assert_eq!(m.finish_save(ticket, Ok(saved)).unwrap(), Some(17));
		assert_eq!(m.mode(), FlowMode::Viewing);
		assert_eq!(m.view().unwrap().flow().id, Some(17));

		let before = m.state().clone();
		m.cancel();
		assert_eq!(m.state(), &before);
	}

	#[test]
	fn saved_document_round_trips_graph_and_viewport() {
		let (mut m, a, b) = editing_with_two_nodes();
		m.editable().unwrap().connect(&a, &b).unwrap();
		let vp = Viewport {
			x: 12.0,
			y: -4.0,
			zoom: 0.75,
		};
		let (_, doc) = m.begin_save(vp).unwrap();
		let decoded = document::decode(&doc.serialized_graph).unwrap();
		assert_eq!(decoded.viewport, vp);
		assert_eq!(decoded.nodes, m.view().unwrap().graph().nodes);
		assert_eq!(decoded.edges, m.view().unwrap().graph().edges);
	}

	#[test]
	fn save_failure_keeps_draft_in_editing() {
		let (mut m, a, _) = editing_with_two_nodes();
		let draft = m.view().unwrap().graph().clone();
		let (ticket, _) = m.begin_save(Viewport::default()).unwrap();
		let err = m
			.finish_save(ticket, Err(StoreError::Status {
				url: "http://localhost:8080/api/flows".into(),
				status: 503,
			}))
			.unwrap_err();
		assert!(matches!(err, SaveError::Store(_)));
		assert_eq!(m.mode(), FlowMode::Editing);
		assert_eq!(m.view().unwrap().graph(), &draft);
		assert!(m.editable().unwrap().move_node(&a, Point::new(5.0, 5.0)));
	}

	#[test]
	fn empty_canvas_cannot_be_saved() {
		let mut m = FlowManager::new();
		m.new_flow("shop");
		assert!(matches!(
			m.begin_save(Viewport::default()),
			Err(SaveError::EmptyCanvas)
		));
		assert_eq!(m.mode(), FlowMode::Editing);
	}

	#[test]
	fn saving_twice_is_refused() {
		let (mut m, _, _) = editing_with_two_nodes();
		m.begin_save(Viewport::default()).unwrap();
		assert!(matches!(
			m.begin_save(Viewport::default()),
			Err(SaveError::InFlight)
		));
	}

	#[test]
	fn viewing_cannot_be_saved() {
		let mut m = FlowManager::new();
		m.open(&stored(1)).unwrap();
		assert!(matches!(
			m.begin_save(Viewport::default()),
			Err(SaveError::NotEditing)
		));
	}

	#[test]
	fn cancel_restores_baseline() {
		let mut m = FlowManager::new();
		m.open(&stored(9)).unwrap();
		m.request_edit();
		let e = m.editable().unwrap();
		e.add_node(SERVICE, "Extra", Point::default(), 5);
		e.set_name("Renamed");
		m.cancel();
		assert_eq!(m.mode(), FlowMode::Viewing);
		let view = m.view().unwrap();
		assert!(view.graph().is_empty());
		assert_eq!(view.flow().name, "Checkout");
	}

	#[test]
	fn cancel_of_unsaved_new_flow_closes() {
		let (mut m, _, _) = editing_with_two_nodes();
		m.cancel();
		assert_eq!(m.mode(), FlowMode::Closed);
	}

	#[test]
	fn connect_refuses_loops_duplicates_and_unknowns() {
		let (mut m, a, b) = editing_with_two_nodes();
		let e = m.editable().unwrap();
		assert_eq!(e.connect(&a, &b), Some(format!("e-{a}-{b}")));
		assert_eq!(e.connect(&a, &b), None);
		assert_eq!(e.connect(&a, &a), None);
		assert_eq!(e.connect(&a, "nope"), None);
		assert!(e.connect(&b, &a).is_some());
		let edge = &e.graph().edges[0];
		assert_eq!(edge.relation, DEFAULT_RELATION);
		assert_eq!(edge.marker_end, ArrowMarker::ArrowClosed);
	}

	#[test]
	fn remove_node_drops_incident_edges_and_selection() {
		let (mut m, a, b) = editing_with_two_nodes();
		let e = m.editable().unwrap();
		e.connect(&a, &b);
		e.select(Some(a.as_str()));
		assert!(e.remove_node(&a));
		assert!(e.graph().edges.is_empty());
		assert!(e.selected().is_none());
		assert!(!e.remove_node(&a));
	}

	#[test]
	fn late_answer_for_closed_flow_is_not_applied_to_the_next() {
		let (mut m, _, _) = editing_with_two_nodes();
		let (first, first_doc) = m.begin_save(Viewport::default()).unwrap();
		m.close();

		m.new_flow("shop");
		let e = m.editable().unwrap();
		e.set_name("Flow B");
		e.add_node(SERVICE, "PaymentService", Point::default(), 3);
		let (second, b_doc) = m.begin_save(Viewport::default()).unwrap();
		assert_ne!(first, second);

		let late = FlowDocument {
			id: Some(7),
			..first_doc
		};
		assert!(matches!(
			m.finish_save(first, Ok(late)),
			Err(SaveError::Superseded)
		));
		assert_eq!(m.mode(), FlowMode::Saving);
		assert!(m.view().unwrap().flow().id.is_none());

		let saved = FlowDocument {
			id: Some(8),
			..b_doc
		};
		assert_eq!(m.finish_save(second, Ok(saved)).unwrap(), Some(8));
		let view = m.view().unwrap();
		assert_eq!(view.flow().name, "Flow B");
		assert_eq!(view.flow().id, Some(8));
	}

	#[test]
	fn answer_after_close_is_ignored() {
		let (mut m, _, _) = editing_with_two_nodes();
		let (ticket, doc) = m.begin_save(Viewport::default()).unwrap();
		m.close();
		assert!(matches!(
			m.finish_save(ticket, Ok(doc)),
			Err(SaveError::Superseded)
		));
		assert_eq!(m.mode(), FlowMode::Closed);
	}

	#[test]
	fn forget_closes_only_matching_flow() {
		let mut m = FlowManager::new();
		m.open(&stored(4)).unwrap();
		m.forget(5);
		assert_eq!(m.mode(), FlowMode::Viewing);
		m.forget(4);
		assert_eq!(m.mode(), FlowMode::Closed);
	}

	#[test]
	fn selection_ignores_unknown_ids() {
		let (mut m, a, _) = editing_with_two_nodes();
		let v = m.view_mut().unwrap();
		v.select(Some("ghost"));
		assert!(v.selected().is_none());
		v.select(Some(a.as_str()));
		assert_eq!(v.selected(), Some(a.as_str()));
	}
}
