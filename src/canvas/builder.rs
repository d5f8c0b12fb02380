//! Flow builder canvas: palette drops, connectors, node moves and panning.
//!
//! The canvas owns only presentation state (viewport and the active pointer
//! gesture). Every change to the document goes through
//! [`FlowManager::editable`], so in Viewing mode mutating gestures come back
//! as [`BuilderOutcome::Refused`] and the document is untouched.

use log::debug;
use serde::Deserialize;

use super::gesture::{Gesture, GestureEnd};
use super::viewer::ViewerConfig;
use super::viewport::Viewport;
use crate::flow::{FlowGraph, FlowManager, FlowMode, FlowNode, PaletteItem};
use crate::geometry::{Point, Rect};

/// Sizes of builder nodes and their connectors, in canvas units.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
	/// Width of a component card.
	pub node_width: f64,
	/// Height of a component card.
	pub node_height: f64,
	/// Width of a sticky note.
	pub note_width: f64,
	/// Height of a sticky note.
	pub note_height: f64,
	/// Hit radius of a connector, in screen pixels.
	pub connector_radius: f64,
}

impl Default for BuilderConfig {
	fn default() -> Self {
		Self {
			node_width: 180.0,
			node_height: 44.0,
			note_width: 200.0,
			note_height: 100.0,
			connector_radius: 8.0,
		}
	}
}

/// Which connector of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
	/// Top centre; edges arrive here.
	Target,
	/// Bottom centre; edges leave from here.
	Source,
}

impl BuilderConfig {
	/// Area covered by `node`, which depends on whether it is a note.
	pub fn node_rect(&self, node: &FlowNode) -> Rect {
		let (w, h) = if node.kind.is_note() {
			(self.note_width, self.note_height)
		} else {
			(self.node_width, self.node_height)
		};
		Rect::new(node.position.x, node.position.y, w, h)
	}

	/// Canvas position of one of `node`'s connectors.
	pub fn connector(&self, node: &FlowNode, handle: Handle) -> Point {
		let r = self.node_rect(node);
		match handle {
			Handle::Target => Point::new(r.x + r.width / 2.0, r.y),
			Handle::Source => Point::new(r.x + r.width / 2.0, r.y + r.height),
		}
	}

	/// Topmost node whose connector lies within the hit radius of `at`.
	fn connector_at<'a>(
		&self,
		graph: &'a FlowGraph,
		at: Point,
		zoom: f64,
	) -> Option<(&'a FlowNode, Handle)> {
		let radius = self.connector_radius / zoom;
		graph.nodes.iter().rev().find_map(|node| {
			[Handle::Source, Handle::Target]
				.into_iter()
				.find(|&h| self.connector(node, h).distance(at) <= radius)
				.map(|h| (node, h))
		})
	}

	fn node_at<'a>(&self, graph: &'a FlowGraph, at: Point) -> Option<&'a FlowNode> {
		graph
			.nodes
			.iter()
			.rev()
			.find(|node| self.node_rect(node).contains(at))
	}
}

/// Payload of the active builder gesture.
#[derive(Clone, Debug, PartialEq)]
pub enum Drag {
	/// Palette item being dragged over the page.
	Palette(PaletteItem),
	/// Edge being drawn from `from`; `cursor` is in canvas space.
	Connect {
		/// Source node id.
		from: String,
		/// Current pointer position.
		cursor: Point,
	},
	/// Node being dragged by its body.
	MoveNode {
		/// Node being moved.
		id: String,
		/// Pointer position relative to the node's top-left corner.
		grab_offset: Point,
		/// Position before the drag, restored on cancel.
		origin: Point,
	},
	/// Empty canvas being dragged.
	Pan {
		/// Previous pointer position, screen space.
		last: Point,
	},
}

/// Input to [`BuilderCanvas::handle`]. Points are canvas-relative screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum BuilderEvent {
	/// A palette item started being dragged.
	PaletteDragStart(PaletteItem),
	/// The dragged palette item was released.
	PaletteDrop {
		/// Release point.
		at: Point,
		/// Whether the release happened inside the canvas.
		over_canvas: bool,
		/// Wall-clock milliseconds used for the node id.
		minted_at: u64,
	},
	/// The palette drag ended without a drop.
	PaletteDragEnd,
	/// Button pressed on the canvas.
	PointerDown(Point),
	/// Pointer moved over the canvas.
	PointerMove(Point),
	/// Button released on the canvas.
	PointerUp(Point),
	/// Pointer left the canvas; cancels the gesture.
	Leave,
	/// Escape key; cancels the gesture.
	Escape,
	/// Wheel scrolled over the canvas.
	Wheel {
		/// Zoom anchor.
		at: Point,
		/// Positive scrolls down (zoom out).
		delta_y: f64,
	},
	/// Delete or Backspace pressed.
	DeleteSelected,
}

/// What [`BuilderCanvas::handle`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum BuilderOutcome {
	/// Nothing to do.
	Ignored,
	/// A gesture began.
	Started,
	/// Preview, pan or zoom changed; redraw.
	Tracking,
	/// A node with this id was dropped in.
	Added(String),
	/// An edge with this id was created.
	Connected(String),
	/// This node finished moving.
	Moved(String),
	/// Selection changed to this node, or was cleared.
	Selected(Option<String>),
	/// This node and its edges were removed.
	Deleted(String),
	/// The gesture ended without touching the document.
	Cancelled,
	/// A mutation was attempted on a read-only flow.
	Refused,
}

/// Presentation state of the builder canvas.
#[derive(Debug, Default)]
pub struct BuilderCanvas {
	config: BuilderConfig,
	zoom: ViewerConfig,
	viewport: Viewport,
	drag: Gesture<Drag>,
}

impl BuilderCanvas {
	/// Canvas at the default viewport. `zoom` supplies the wheel and zoom
	/// limits shared with the viewer.
	pub fn new(config: BuilderConfig, zoom: ViewerConfig) -> Self {
		Self {
			config,
			zoom,
			viewport: Viewport::default(),
			drag: Gesture::default(),
		}
	}

	/// Card and connector geometry.
	pub fn config(&self) -> &BuilderConfig {
		&self.config
	}

	/// Current pan and zoom.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Shows a freshly opened flow at its saved viewport, dropping any gesture.
	pub fn restore(&mut self, viewport: Viewport) {
		let mut viewport = viewport.sanitized();
		viewport.zoom = viewport.zoom.clamp(self.zoom.min_zoom, self.zoom.max_zoom);
		self.viewport = viewport;
		self.drag = Gesture::default();
	}

	/// Gesture in progress.
	pub fn drag(&self) -> Option<&Drag> {
		self.drag.active()
	}

	/// Start and end (canvas space) of the edge being drawn, if any.
	pub fn connect_preview(&self, graph: &FlowGraph) -> Option<(Point, Point)> {
		match self.drag.active()? {
			Drag::Connect { from, cursor } => graph
				.node(from)
				.map(|n| (self.config.connector(n, Handle::Source), *cursor)),
			_ => None,
		}
	}

	/// Applies one event to the canvas and, through its editable
	/// capability, to the open flow.
	pub fn handle(&mut self, flows: &mut FlowManager, event: BuilderEvent) -> BuilderOutcome {
		match event {
			BuilderEvent::PaletteDragStart(item) => {
				if flows.editable().is_none() {
					return refused("palette drag");
				}
				if self.drag.begin(Drag::Palette(item)) {
					BuilderOutcome::Started
				} else {
					BuilderOutcome::Ignored
				}
			}
			BuilderEvent::PaletteDrop {
				at,
				over_canvas,
				minted_at,
			} => self.palette_drop(flows, at, over_canvas, minted_at),
			BuilderEvent::PaletteDragEnd => match self.drag.active() {
				Some(Drag::Palette(_)) => {
					self.drag.cancel();
					BuilderOutcome::Cancelled
				}
				_ => BuilderOutcome::Ignored,
			},
			BuilderEvent::PointerDown(p) => self.pointer_down(flows, p),
			BuilderEvent::PointerMove(p) => self.pointer_move(flows, p),
			BuilderEvent::PointerUp(p) => self.pointer_up(flows, p),
			BuilderEvent::Leave | BuilderEvent::Escape => self.cancel(flows),
			BuilderEvent::Wheel { at, delta_y } => {
				let factor = self.zoom.wheel_factor(delta_y);
				self.viewport
					.zoom_at(at, factor, self.zoom.min_zoom, self.zoom.max_zoom);
				BuilderOutcome::Tracking
			}
			BuilderEvent::DeleteSelected => {
				let Some(edit) = flows.editable() else {
					return refused("delete");
				};
				let Some(id) = edit.selected().map(str::to_string) else {
					return BuilderOutcome::Ignored;
				};
				if edit.remove_node(&id) {
					BuilderOutcome::Deleted(id)
				} else {
					BuilderOutcome::Ignored
				}
			}
		}
	}

	fn palette_drop(
		&mut self,
		flows: &mut FlowManager,
		at: Point,
		over_canvas: bool,
		minted_at: u64,
	) -> BuilderOutcome {
		if !matches!(self.drag.active(), Some(Drag::Palette(_))) {
			return BuilderOutcome::Ignored;
		}
		if !over_canvas {
			self.drag.cancel();
			return BuilderOutcome::Cancelled;
		}
		let Some(GestureEnd::Dropped(Drag::Palette(item))) = self.drag.drop_gesture() else {
			return BuilderOutcome::Ignored;
		};
		let Some(edit) = flows.editable() else {
			return refused("palette drop");
		};
		let position = self.viewport.screen_to_canvas(at);
		BuilderOutcome::Added(edit.add_node(item.kind, item.label, position, minted_at))
	}

	fn pointer_down(&mut self, flows: &mut FlowManager, p: Point) -> BuilderOutcome {
		if !self.drag.is_idle() {
			return BuilderOutcome::Ignored;
		}
		let Some(view) = flows.view() else {
			return BuilderOutcome::Ignored;
		};
		let at = self.viewport.screen_to_canvas(p);
		let graph = view.graph();
		// Connectors are only drawn, and only live, while editing.
		let editable = flows.mode() == FlowMode::Editing;
		let connector = editable
			.then(|| self.config.connector_at(graph, at, self.viewport.zoom))
			.flatten()
			.map(|(n, _)| n.id.clone());
		let body = self
			.config
			.node_at(graph, at)
			.map(|n| (n.id.clone(), n.position));

		if let Some(from) = connector {
			self.drag.begin(Drag::Connect { from, cursor: at });
			return BuilderOutcome::Started;
		}

		match body {
			Some((id, origin)) => {
				if let Some(view) = flows.view_mut() {
					view.select(Some(id.as_str()));
				}
				if flows.editable().is_some() {
					self.drag.begin(Drag::MoveNode {
						id: id.clone(),
						grab_offset: Point::new(at.x - origin.x, at.y - origin.y),
						origin,
					});
				}
				BuilderOutcome::Selected(Some(id))
			}
			None => {
				if let Some(view) = flows.view_mut() {
					view.select(None);
				}
				self.drag.begin(Drag::Pan { last: p });
				BuilderOutcome::Selected(None)
			}
		}
	}

	fn pointer_move(&mut self, flows: &mut FlowManager, p: Point) -> BuilderOutcome {
		let at = self.viewport.screen_to_canvas(p);
		match self.drag.active_mut() {
			Some(Drag::Pan { last }) => {
				let (dx, dy) = (p.x - last.x, p.y - last.y);
				*last = p;
				self.viewport.pan_by(dx, dy);
				BuilderOutcome::Tracking
			}
			Some(Drag::Connect { cursor, .. }) => {
				*cursor = at;
				BuilderOutcome::Tracking
			}
			Some(Drag::MoveNode {
				id, grab_offset, ..
			}) => {
				let position = Point::new(at.x - grab_offset.x, at.y - grab_offset.y);
				let id = id.clone();
				match flows.editable() {
					Some(edit) => {
						edit.move_node(&id, position);
						BuilderOutcome::Tracking
					}
					None => {
						self.drag.cancel();
						refused("move")
					}
				}
			}
			Some(Drag::Palette(_)) | None => BuilderOutcome::Ignored,
		}
	}

	fn pointer_up(&mut self, flows: &mut FlowManager, p: Point) -> BuilderOutcome {
		let at = self.viewport.screen_to_canvas(p);
		match self.drag.active() {
			Some(Drag::Connect { from, .. }) => {
				let target = flows.view().and_then(|v| {
					self.config
						.connector_at(v.graph(), at, self.viewport.zoom)
						.map(|(n, _)| n.id.clone())
						.filter(|id| id != from)
				});
				let Some(GestureEnd::Dropped(Drag::Connect { from, .. })) = self.drag.drop_gesture()
				else {
					return BuilderOutcome::Ignored;
				};
				let Some(target) = target else {
					return BuilderOutcome::Cancelled;
				};
				let Some(edit) = flows.editable() else {
					return refused("connect");
				};
				match edit.connect(&from, &target) {
					Some(edge) => BuilderOutcome::Connected(edge),
					None => BuilderOutcome::Cancelled,
				}
			}
			Some(Drag::MoveNode { .. }) => match self.drag.drop_gesture() {
				Some(GestureEnd::Dropped(Drag::MoveNode { id, .. })) => BuilderOutcome::Moved(id),
				_ => BuilderOutcome::Ignored,
			},
			Some(Drag::Pan { .. }) => {
				self.drag.drop_gesture();
				BuilderOutcome::Ignored
			}
			Some(Drag::Palette(_)) | None => BuilderOutcome::Ignored,
		}
	}

	fn cancel(&mut self, flows: &mut FlowManager) -> BuilderOutcome {
		match self.drag.cancel() {
			Some(GestureEnd::Cancelled(Drag::MoveNode { id, origin, .. })) => {
				if let Some(edit) = flows.editable() {
					edit.move_node(&id, origin);
				}
				BuilderOutcome::Cancelled
			}
			Some(_) => BuilderOutcome::Cancelled,
			None => BuilderOutcome::Ignored,
		}
	}
}

fn refused(what: &str) -> BuilderOutcome {
	debug!("arch-graph: {what} refused on read-only flow");
	BuilderOutcome::Refused
}
