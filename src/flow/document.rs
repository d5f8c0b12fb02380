//! Hand-authored flow documents and their graph encoding.
//!
//! A [`FlowDocument`] is what the store keeps. Its `serialized_graph` is an
//! opaque JSON string holding a [`FlowGraph`]: free-text nodes with manual
//! positions, the edges between them and the viewport they were saved with.

use std::collections::HashSet;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::canvas::viewport::Viewport;
use crate::error::DocumentError;
use crate::geometry::Point;
use crate::graph::Category;

/// Store-assigned document id.
pub type FlowId = i64;

/// Relation given to edges drawn in the builder.
pub const DEFAULT_RELATION: &str = "uses";

/// Name of a freshly created flow.
pub const NEW_FLOW_NAME: &str = "New Flow";

/// A persisted flow as exchanged with the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
	/// Store id; `None` until first saved.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<FlowId>,
	/// Display name.
	pub name: String,
	/// Free-text description, may be empty.
	#[serde(default)]
	pub description: String,
	/// The analyzed project this flow documents.
	#[serde(rename = "projectName")]
	pub subject_name: String,
	/// JSON-encoded [`FlowGraph`].
	#[serde(rename = "flowData", default)]
	pub serialized_graph: String,
}

/// What a flow node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum FlowNodeKind {
	/// Reference to an analyzed component of this category.
	Component(Category),
	/// Free-form sticky note.
	Note,
}

impl FlowNodeKind {
	/// Wire name, also used as the node id prefix.
	pub fn as_str(self) -> &'static str {
		match self {
			FlowNodeKind::Component(c) => c.as_str(),
			FlowNodeKind::Note => "NOTE",
		}
	}

	/// Whether this is a sticky note.
	pub fn is_note(self) -> bool {
		self == FlowNodeKind::Note
	}
}

impl From<String> for FlowNodeKind {
	fn from(value: String) -> Self {
		if value.trim().eq_ignore_ascii_case("NOTE") {
			FlowNodeKind::Note
		} else {
			FlowNodeKind::Component(Category::from_wire(&value))
		}
	}
}

impl From<FlowNodeKind> for &'static str {
	fn from(value: FlowNodeKind) -> Self {
		value.as_str()
	}
}

impl fmt::Display for FlowNodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Arrow drawn at an edge's target end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowMarker {
	/// Filled triangle.
	#[default]
	ArrowClosed,
	/// Open chevron.
	Arrow,
	/// Plain line.
	None,
}

/// A card placed on the builder canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
	/// Unique within the flow, minted as `{KIND}-{millis}`.
	pub id: String,
	/// Text on the card.
	pub label: String,
	/// Component category or note.
	pub kind: FlowNodeKind,
	/// Top-left corner in canvas space.
	pub position: Point,
}

/// A directed link drawn between two cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
	/// `e-{source}-{target}`.
	pub id: String,
	/// Id of the node the edge leaves.
	pub source: String,
	/// Id of the node the edge enters.
	pub target: String,
	/// Label of the relationship.
	#[serde(default)]
	pub relation: String,
	/// Arrow at the target end.
	#[serde(default)]
	pub marker_end: ArrowMarker,
}

/// The user-authored graph inside a flow document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
	/// Cards in drawing order; later ones are on top.
	#[serde(default)]
	pub nodes: Vec<FlowNode>,
	/// Links between cards.
	#[serde(default)]
	pub edges: Vec<FlowEdge>,
	/// Pan and zoom the flow was saved with.
	#[serde(default)]
	pub viewport: Viewport,
}

impl FlowGraph {
	/// Whether the canvas has no cards.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Card with this id.
	pub fn node(&self, id: &str) -> Option<&FlowNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Mutable card with this id.
	pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	/// Whether a card with this id exists.
	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Whether `source -> target` is already linked.
	pub fn has_edge(&self, source: &str, target: &str) -> bool {
		self.edges
			.iter()
			.any(|e| e.source == source && e.target == target)
	}

	/// Mints an id for a node of `kind` created at `millis`, unique in this graph.
	pub fn mint_node_id(&self, kind: FlowNodeKind, millis: u64) -> String {
		let base = format!("{kind}-{millis}");
		if !self.contains(&base) {
			return base;
		}
		(2..)
			.map(|n| format!("{base}-{n}"))
			.find(|candidate| !self.contains(candidate))
			.unwrap_or(base)
	}

	/// Drops edges whose endpoints are not in the node set, returning how many.
	fn drop_dangling_edges(&mut self) -> usize {
		let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		let before = self.edges.len();
		let kept: Vec<FlowEdge> = self
			.edges
			.iter()
			.filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
			.cloned()
			.collect();
		self.edges = kept;
		before - self.edges.len()
	}
}

/// Serializes a flow graph for [`FlowDocument::serialized_graph`].
pub fn encode(graph: &FlowGraph) -> Result<String, DocumentError> {
	serde_json::to_string(graph).map_err(DocumentError::Encode)
}

/// Parses [`FlowDocument::serialized_graph`].
///
/// An empty string is an empty graph. Edges referencing missing nodes are
/// dropped with a warning rather than failing the whole document, and an
/// unusable viewport is repaired.
pub fn decode(data: &str) -> Result<FlowGraph, DocumentError> {
	if data.trim().is_empty() {
		return Ok(FlowGraph::default());
	}
	let mut graph: FlowGraph = serde_json::from_str(data).map_err(DocumentError::Decode)?;
	graph.viewport = graph.viewport.sanitized();
	let dropped = graph.drop_dangling_edges();
	if dropped > 0 {
		warn!("arch-graph: dropped {dropped} dangling edge(s) from flow graph");
	}
	Ok(graph)
}
