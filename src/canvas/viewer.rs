//! Read-only architecture viewer: fetch keying, pan/zoom and click selection.
//!
//! [`ViewerController::apply`] is the single entry point. Each event rewrites
//! graph, layout and render state together, so the highlight is never computed
//! against a half-replaced graph and never recomputed twice for one click.

use log::{debug, info, warn};
use serde::Deserialize;

use super::gesture::Gesture;
use super::viewport::Viewport;
use crate::geometry::Point;
use crate::graph::{Graph, Layout, LayoutConfig, RawGraph, RenderState, highlight, layout};

/// Pan/zoom behaviour of the canvases.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
	/// Smallest zoom reachable by wheel or fit.
	pub min_zoom: f64,
	/// Largest zoom reachable by wheel or fit.
	pub max_zoom: f64,
	/// Zoom multiplier per wheel notch.
	pub zoom_step: f64,
	/// Screen pixels kept free around the graph when fitting.
	pub fit_padding: f64,
	/// Pointer travel (screen pixels) below which a press counts as a click.
	pub click_slop: f64,
}

impl Default for ViewerConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.1,
			max_zoom: 2.0,
			zoom_step: 1.1,
			fit_padding: 40.0,
			click_slop: 4.0,
		}
	}
}

impl ViewerConfig {
	/// Zoom factor for a wheel event with vertical delta `delta_y`.
	pub fn wheel_factor(&self, delta_y: f64) -> f64 {
		if delta_y > 0.0 {
			1.0 / self.zoom_step
		} else {
			self.zoom_step
		}
	}
}

/// Identifies one graph fetch. Responses for any other ticket are stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTicket {
	/// Subject the request was issued for.
	pub subject: String,
	/// Issue order; later requests carry larger numbers.
	pub seq: u64,
}

/// Issues [`RequestTicket`]s for a repeated fetch (flow list, palette) and
/// tells whether an answer is still the latest one asked for.
#[derive(Clone, Debug, Default)]
pub struct RequestSeq {
	latest: Option<RequestTicket>,
}

impl RequestSeq {
	/// Supersedes every ticket issued before.
	pub fn issue(&mut self, subject: &str) -> RequestTicket {
		let seq = self.latest.as_ref().map_or(1, |t| t.seq + 1);
		let ticket = RequestTicket {
			subject: subject.to_string(),
			seq,
		};
		self.latest = Some(ticket.clone());
		ticket
	}

	/// Whether `ticket` is the last one issued.
	pub fn is_current(&self, ticket: &RequestTicket) -> bool {
		self.latest.as_ref() == Some(ticket)
	}
}

/// What the viewer is currently showing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ViewStatus {
	/// No subject chosen.
	#[default]
	Idle,
	/// A fetch is in flight.
	Loading,
	/// A non-empty graph is shown.
	Ready,
	/// Loaded, but the subject has not been analyzed yet.
	Empty,
	/// Fetch failed; `Reset` retries.
	Failed(String),
}

/// Input to [`ViewerController::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
	/// Show a (possibly different) subject.
	Open(String),
	/// Re-fetch and re-layout the current subject from scratch.
	Reset,
	/// The store answered a [`ViewerCommand::Fetch`].
	Loaded {
		/// Ticket of the fetch being answered.
		ticket: RequestTicket,
		/// Graph as received, not yet validated.
		graph: RawGraph,
	},
	/// A [`ViewerCommand::Fetch`] failed.
	Failed {
		/// Ticket of the fetch being answered.
		ticket: RequestTicket,
		/// Human-readable cause, shown in the status overlay.
		message: String,
	},
	/// The canvas was resized; used by the next fit.
	Resize {
		/// Canvas width in screen pixels.
		width: f64,
		/// Canvas height in screen pixels.
		height: f64,
	},
	/// Button pressed at a canvas-relative screen point.
	PointerDown(Point),
	/// Pointer moved, pressed or not.
	PointerMove(Point),
	/// Button released.
	PointerUp(Point),
	/// Pointer left the canvas.
	Leave,
	/// Wheel scrolled over the canvas.
	Wheel {
		/// Zoom anchor, canvas-relative screen pixels.
		at: Point,
		/// Positive scrolls down (zoom out).
		delta_y: f64,
	},
	/// Direct node activation (keyboard or assistive technology).
	ClickNode(String),
	/// Click on empty canvas.
	ClickPane,
}

/// Side effect the host must perform.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerCommand {
	/// Fetch the graph for `ticket.subject` and answer with `Loaded` or
	/// `Failed` carrying the same ticket.
	Fetch(RequestTicket),
}

#[derive(Clone, Debug, PartialEq)]
struct Press {
	origin: Point,
	last: Point,
	panning: bool,
}

/// State of one viewer canvas.
#[derive(Debug)]
pub struct ViewerController {
	config: ViewerConfig,
	layout_config: LayoutConfig,
	subject: Option<String>,
	seq: u64,
	pending: Option<RequestTicket>,
	status: ViewStatus,
	graph: Graph,
	layout: Layout,
	render: RenderState,
	selected: Option<String>,
	viewport: Viewport,
	width: f64,
	height: f64,
	press: Gesture<Press>,
}

impl ViewerController {
	/// Idle viewer with no subject.
	pub fn new(config: ViewerConfig, layout_config: LayoutConfig) -> Self {
		Self {
			config,
			layout_config,
			subject: None,
			seq: 0,
			pending: None,
			status: ViewStatus::Idle,
			graph: Graph::default(),
			layout: Layout::default(),
			render: RenderState::default(),
			selected: None,
			viewport: Viewport::default(),
			width: 800.0,
			height: 550.0,
			press: Gesture::default(),
		}
	}

	/// Subject last opened.
	pub fn subject(&self) -> Option<&str> {
		self.subject.as_deref()
	}

	/// What the status overlay should show.
	pub fn status(&self) -> &ViewStatus {
		&self.status
	}

	/// Validated graph currently shown.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Tier positions of [`graph`](Self::graph).
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// Emphasis of every node and edge for the current selection.
	pub fn render_state(&self) -> &RenderState {
		&self.render
	}

	/// Id of the selected node.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Current pan and zoom.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Last canvas size reported through `Resize`.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Whether a press has turned into a pan.
	pub fn is_panning(&self) -> bool {
		self.press.active().is_some_and(|p| p.panning)
	}

	/// Applies one event. A returned command must be executed by the host,
	/// which feeds the outcome back as `Loaded` or `Failed`.
	pub fn apply(&mut self, event: ViewerEvent) -> Option<ViewerCommand> {
		match event {
			ViewerEvent::Open(subject) => {
				if self.subject.as_deref() != Some(subject.as_str()) {
					self.graph = Graph::default();
					self.layout = Layout::default();
					self.subject = Some(subject);
				}
				self.viewport = Viewport::default();
				self.start_fetch()
			}
			ViewerEvent::Reset => {
				self.viewport = Viewport::default();
				self.start_fetch()
			}
			ViewerEvent::Loaded { ticket, graph } => {
				if self.take_pending(&ticket) {
					self.apply_graph(graph);
				}
				None
			}
			ViewerEvent::Failed { ticket, message } => {
				if self.take_pending(&ticket) {
					warn!("arch-graph: graph fetch for {} failed: {message}", ticket.subject);
					self.graph = Graph::default();
					self.layout = Layout::default();
					self.set_selection(None);
					self.status = ViewStatus::Failed(message);
				}
				None
			}
			ViewerEvent::Resize { width, height } => {
				self.width = width;
				self.height = height;
				None
			}
			ViewerEvent::PointerDown(p) => {
				self.press.begin(Press {
					origin: p,
					last: p,
					panning: false,
				});
				None
			}
			ViewerEvent::PointerMove(p) => {
				let slop = self.config.click_slop;
				if let Some(press) = self.press.active_mut() {
					if !press.panning && press.origin.distance(p) > slop {
						press.panning = true;
					}
					if press.panning {
						let (dx, dy) = (p.x - press.last.x, p.y - press.last.y);
						press.last = p;
						self.viewport.pan_by(dx, dy);
					}
				}
				None
			}
			ViewerEvent::PointerUp(p) => {
				let was_click = self.press.active().is_some_and(|press| !press.panning);
				self.press.drop_gesture();
				if was_click {
					self.click_at(p);
				}
				None
			}
			ViewerEvent::Leave => {
				self.press.cancel();
				None
			}
			ViewerEvent::Wheel { at, delta_y } => {
				let factor = self.config.wheel_factor(delta_y);
				self.viewport
					.zoom_at(at, factor, self.config.min_zoom, self.config.max_zoom);
				None
			}
			ViewerEvent::ClickNode(id) => {
				self.click_node(&id);
				None
			}
			ViewerEvent::ClickPane => {
				self.set_selection(None);
				None
			}
		}
	}

	fn start_fetch(&mut self) -> Option<ViewerCommand> {
		let subject = self.subject.clone()?;
		self.seq += 1;
		let ticket = RequestTicket {
			subject,
			seq: self.seq,
		};
		self.pending = Some(ticket.clone());
		self.status = ViewStatus::Loading;
		self.set_selection(None);
		Some(ViewerCommand::Fetch(ticket))
	}

	/// Clears the pending ticket if `ticket` is it; otherwise reports stale.
	fn take_pending(&mut self, ticket: &RequestTicket) -> bool {
		if self.pending.as_ref() == Some(ticket) {
			self.pending = None;
			true
		} else {
			debug!(
				"arch-graph: discarding stale response for {} (#{})",
				ticket.subject, ticket.seq
			);
			false
		}
	}

	fn apply_graph(&mut self, raw: RawGraph) {
		let ingested = Graph::ingest(raw);
		self.graph = ingested.graph;
		self.layout = layout(&self.graph, &self.layout_config);
		self.selected = None;
		self.render = highlight(&self.graph, None);
		self.status = if self.graph.is_empty() {
			ViewStatus::Empty
		} else {
			ViewStatus::Ready
		};
		self.viewport = match self.layout.bounds() {
			Some(bounds) => Viewport::fit(
				bounds,
				self.width,
				self.height,
				self.config.fit_padding,
				self.config.min_zoom,
				self.config.max_zoom,
			),
			None => Viewport::default(),
		};
		info!(
			"arch-graph: showing {} nodes, {} edges ({} rejected)",
			self.graph.nodes().len(),
			self.graph.edges().len(),
			ingested.rejected.len()
		);
	}

	fn click_at(&mut self, screen: Point) {
		let canvas = self.viewport.screen_to_canvas(screen);
		match self.layout.node_at(canvas).map(|p| p.node.id.clone()) {
			Some(id) => self.click_node(&id),
			None => self.set_selection(None),
		}
	}

	/// Clicking the selected node clears; any other node replaces.
	fn click_node(&mut self, id: &str) {
		let next = if self.selected.as_deref() == Some(id) {
			None
		} else {
			Some(id.to_string())
		};
		self.set_selection(next);
	}

	fn set_selection(&mut self, selected: Option<String>) {
		let selected = selected.filter(|id| self.graph.contains(id));
		if selected == self.selected && self.render.selected() == selected.as_deref() {
			return;
		}
		self.render = highlight(&self.graph, selected.as_deref());
		self.selected = selected;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Category, Emphasis, GraphEdge, GraphNode};

	fn raw() -> RawGraph {
		RawGraph {
			nodes: vec![
				GraphNode::new("c1", "UserController", Category::Controller),
				GraphNode::new("s1", "UserService", Category::Service),
				GraphNode::new("r1", "UserRepository", Category::Repository),
			],
			edges: vec![
				GraphEdge::new("c1", "s1", "calls"),
				GraphEdge::new("s1", "r1", "calls"),
			],
		}
	}

	fn fetched(subject: &str) -> (ViewerController, RequestTicket) {
		let mut v = ViewerController::new(ViewerConfig::default(), LayoutConfig::default());
		let Some(ViewerCommand::Fetch(ticket)) = v.apply(ViewerEvent::Open(subject.into())) else {
			panic!("open should fetch");
		};
		(v, ticket)
	}

	#[test]
	fn only_the_latest_request_is_current() {
		let mut requests = RequestSeq::default();
		let first = requests.issue("shop");
		assert!(requests.is_current(&first));
		let second = requests.issue("billing");
		assert!(!requests.is_current(&first));
		assert!(requests.is_current(&second));
		let again = requests.issue("shop");
		assert_ne!(again, first);
		assert!(!requests.is_current(&first));
	}

	fn loaded() -> ViewerController {
		let (mut v, ticket) = fetched("shop");
		v.apply(ViewerEvent::Loaded { ticket, graph: raw() });
		v
	}

	#[test]
	fn load_lays_out_and_starts_unselected() {
		let v = loaded();
		assert_eq!(v.status(), &ViewStatus::Ready);
		assert_eq!(v.layout().nodes().len(), 3);
		assert!(v.selected().is_none());
		assert!(v.render_state().emphasized_nodes().is_empty());
	}

	#[test]
	fn stale_response_is_discarded() {
		let (mut v, first) = fetched("shop");
		let Some(ViewerCommand::Fetch(second)) = v.apply(ViewerEvent::Open("billing".into()))
		else {
			panic!("switching subject should fetch");
		};
		v.apply(ViewerEvent::Loaded {
			ticket: first,
			graph: raw(),
		});
		assert_eq!(v.status(), &ViewStatus::Loading);
		assert!(v.graph().is_empty());

		v.apply(ViewerEvent::Loaded {
			ticket: second,
			graph: RawGraph::default(),
		});
		assert_eq!(v.status(), &ViewStatus::Empty);
		assert_eq!(v.subject(), Some("billing"));
	}

	#[test]
	fn reset_supersedes_in_flight_fetch() {
		let (mut v, first) = fetched("shop");
		let Some(ViewerCommand::Fetch(second)) = v.apply(ViewerEvent::Reset) else {
			panic!("reset should fetch");
		};
		assert_ne!(first, second);
		v.apply(ViewerEvent::Failed {
			ticket: first,
			message: "boom".into(),
		});
		assert_eq!(v.status(), &ViewStatus::Loading);
	}

	#[test]
	fn click_toggles_and_replaces_selection() {
		let mut v = loaded();
		v.apply(ViewerEvent::ClickNode("s1".into()));
		assert_eq!(v.selected(), Some("s1"));
		assert_eq!(v.render_state().emphasized_nodes().len(), 3);

		v.apply(ViewerEvent::ClickNode("c1".into()));
		assert_eq!(v.selected(), Some("c1"));
		assert_eq!(v.render_state().node_by_id("r1"), Emphasis::Dimmed);

		v.apply(ViewerEvent::ClickNode("c1".into()));
		assert!(v.selected().is_none());
		assert!(v.render_state().emphasized_nodes().is_empty());
	}

	#[test]
	fn pane_click_clears_selection() {
		let mut v = loaded();
		v.apply(ViewerEvent::ClickNode("r1".into()));
		v.apply(ViewerEvent::ClickPane);
		assert!(v.selected().is_none());
	}

	#[test]
	fn reset_clears_selection_and_reload_keeps_it_clear() {
		let mut v = loaded();
		v.apply(ViewerEvent::ClickNode("s1".into()));
		let Some(ViewerCommand::Fetch(ticket)) = v.apply(ViewerEvent::Reset) else {
			panic!("reset should fetch");
		};
		assert!(v.selected().is_none());
		v.apply(ViewerEvent::Loaded { ticket, graph: raw() });
		assert!(v.render_state().selected().is_none());
	}

	#[test]
	fn pointer_click_hits_node_through_viewport() {
		let mut v = loaded();
		let centre = v.layout().rect("s1").unwrap().center();
		let screen = v.viewport().canvas_to_screen(centre);
		v.apply(ViewerEvent::PointerDown(screen));
		v.apply(ViewerEvent::PointerUp(screen));
		assert_eq!(v.selected(), Some("s1"));
	}

	#[test]
	fn drag_pans_without_selecting() {
		let mut v = loaded();
		let before = *v.viewport();
		let start = v
			.viewport()
			.canvas_to_screen(v.layout().rect("c1").unwrap().center());
		v.apply(ViewerEvent::PointerDown(start));
		v.apply(ViewerEvent::PointerMove(start.offset(30.0, 10.0)));
		assert!(v.is_panning());
		v.apply(ViewerEvent::PointerUp(start.offset(30.0, 10.0)));
		assert!(v.selected().is_none());
		assert_eq!(v.viewport().x, before.x + 30.0);
		assert_eq!(v.viewport().y, before.y + 10.0);
	}

	#[test]
	fn wheel_zoom_is_clamped() {
		let mut v = loaded();
		for _ in 0..100 {
			v.apply(ViewerEvent::Wheel {
				at: Point::new(10.0, 10.0),
				delta_y: -1.0,
			});
		}
		assert_eq!(v.viewport().zoom, 2.0);
	}

	#[test]
	fn failure_shows_empty_state_and_reset_retries() {
		let (mut v, ticket) = fetched("shop");
		v.apply(ViewerEvent::Failed {
			ticket,
			message: "connection refused".into(),
		});
		assert_eq!(
			v.status(),
			&ViewStatus::Failed("connection refused".into())
		);
		assert!(matches!(
			v.apply(ViewerEvent::Reset),
			Some(ViewerCommand::Fetch(_))
		));
	}

	#[test]
	fn reset_without_subject_does_nothing() {
		let mut v = ViewerController::new(ViewerConfig::default(), LayoutConfig::default());
		assert_eq!(v.apply(ViewerEvent::Reset), None);
		assert_eq!(v.status(), &ViewStatus::Idle);
	}
}
