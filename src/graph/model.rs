//! Architecture graph data structures and validated ingestion.
//!
//! The analysis backend hands us a flat node list and edge list. [`Graph::ingest`]
//! turns that into a [`Graph`] with an id index built once per load, dropping
//! (and reporting) anything that would break the "every edge endpoint exists"
//! invariant.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

/// Component category assigned by the analysis backend.
///
/// Closed set; any category string the backend invents later decodes to
/// [`Category::Other`] so it lands in the last tier instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Category {
	/// Request entry points; leftmost tier.
	Controller,
	/// Business logic.
	Service,
	/// Data access.
	Repository,
	/// Persisted domain types.
	Entity,
	/// Configuration components.
	Config,
	/// Anything unrecognised; rightmost tier.
	Other,
}

impl Category {
	/// All categories in tier order.
	pub const ALL: [Category; 6] = [
		Category::Controller,
		Category::Service,
		Category::Repository,
		Category::Entity,
		Category::Config,
		Category::Other,
	];

	/// Number of layout tiers.
	pub const TIERS: usize = Self::ALL.len();

	/// Left-to-right tier index used by the layout engine.
	pub const fn rank(self) -> usize {
		match self {
			Category::Controller => 0,
			Category::Service => 1,
			Category::Repository => 2,
			Category::Entity => 3,
			Category::Config => 4,
			Category::Other => 5,
		}
	}

	/// Wire name, e.g. `"CONTROLLER"`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Category::Controller => "CONTROLLER",
			Category::Service => "SERVICE",
			Category::Repository => "REPOSITORY",
			Category::Entity => "ENTITY",
			Category::Config => "CONFIG",
			Category::Other => "OTHER",
		}
	}

	/// Human label for legends and palette headings.
	pub const fn title(self) -> &'static str {
		match self {
			Category::Controller => "Controller",
			Category::Service => "Service",
			Category::Repository => "Repository",
			Category::Entity => "Entity",
			Category::Config => "Config",
			Category::Other => "Other",
		}
	}

	/// Parses a wire name. Unknown names fall back to [`Category::Other`].
	pub fn from_wire(name: &str) -> Self {
		match name.trim().to_ascii_uppercase().as_str() {
			"CONTROLLER" => Category::Controller,
			"SERVICE" => Category::Service,
			"REPOSITORY" => Category::Repository,
			"ENTITY" => Category::Entity,
			"CONFIG" => Category::Config,
			_ => Category::Other,
		}
	}
}

impl From<String> for Category {
	fn from(value: String) -> Self {
		Category::from_wire(&value)
	}
}

impl From<Category> for &'static str {
	fn from(value: Category) -> Self {
		value.as_str()
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A component in the analyzed project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique within one graph.
	pub id: String,
	/// Display text; may repeat across nodes.
	pub label: String,
	/// Decides the tier; missing on the wire means [`Category::Other`].
	#[serde(rename = "type", default = "default_category")]
	pub category: Category,
}

fn default_category() -> Category {
	Category::Other
}

impl GraphNode {
	/// Builds a node.
	pub fn new(id: impl Into<String>, label: impl Into<String>, category: Category) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			category,
		}
	}
}

/// A directed dependency between two components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
	/// Id of the depending node.
	pub source: String,
	/// Id of the node depended upon.
	pub target: String,
	/// Free-form label, e.g. `"calls"`.
	#[serde(default)]
	pub relation: String,
}

impl GraphEdge {
	/// Builds an edge.
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		relation: impl Into<String>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			relation: relation.into(),
		}
	}

	/// True when either endpoint is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// Unvalidated graph exactly as received from the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGraph {
	/// Nodes in backend order.
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	/// Edges in backend order.
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
}

/// Why an input element was left out of the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
	/// Only the source id is missing.
	UnknownSource,
	/// Only the target id is missing.
	UnknownTarget,
	/// Both ids are missing.
	UnknownEndpoints,
	/// A node with this id came earlier.
	DuplicateNode,
}

impl fmt::Display for RejectReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RejectReason::UnknownSource => f.write_str("source node does not exist"),
			RejectReason::UnknownTarget => f.write_str("target node does not exist"),
			RejectReason::UnknownEndpoints => f.write_str("neither endpoint exists"),
			RejectReason::DuplicateNode => f.write_str("node id already used"),
		}
	}
}

/// A dropped input element and the reason it was dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
	/// An edge with a missing endpoint.
	Edge {
		/// The dropped edge.
		edge: GraphEdge,
		/// Which endpoint was missing.
		reason: RejectReason,
	},
	/// A node whose id was already taken.
	Node {
		/// The dropped node.
		node: GraphNode,
		/// Always [`RejectReason::DuplicateNode`].
		reason: RejectReason,
	},
}

/// Result of [`Graph::ingest`].
#[derive(Clone, Debug, Default)]
pub struct Ingested {
	/// The validated graph.
	pub graph: Graph,
	/// Everything left out, in input order.
	pub rejected: Vec<Rejection>,
}

/// A validated architecture graph.
///
/// Node order is the input order; the layout engine relies on it for stable
/// placement within a tier.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<String, usize>,
}

impl Graph {
	/// Validates a raw graph.
	///
	/// Duplicate node ids keep their first occurrence. Edges with an endpoint
	/// outside the node set are dropped; the rest of the graph is kept.
	pub fn ingest(raw: RawGraph) -> Ingested {
		let mut nodes = Vec::with_capacity(raw.nodes.len());
		let mut index = HashMap::with_capacity(raw.nodes.len());
		let mut rejected = Vec::new();

		for node in raw.nodes {
			if index.contains_key(&node.id) {
				rejected.push(Rejection::Node {
					node,
					reason: RejectReason::DuplicateNode,
				});
				continue;
			}
			index.insert(node.id.clone(), nodes.len());
			nodes.push(node);
		}

		let mut edges = Vec::with_capacity(raw.edges.len());
		for edge in raw.edges {
			let reason = match (
				index.contains_key(&edge.source),
				index.contains_key(&edge.target),
			) {
				(true, true) => None,
				(false, true) => Some(RejectReason::UnknownSource),
				(true, false) => Some(RejectReason::UnknownTarget),
				(false, false) => Some(RejectReason::UnknownEndpoints),
			};
			match reason {
				Some(reason) => rejected.push(Rejection::Edge { edge, reason }),
				None => edges.push(edge),
			}
		}

		for r in &rejected {
			match r {
				Rejection::Edge { edge, reason } => warn!(
					"arch-graph: dropped edge {} -> {}: {}",
					edge.source, edge.target, reason
				),
				Rejection::Node { node, reason } => {
					warn!("arch-graph: dropped node {}: {}", node.id, reason)
				}
			}
		}

		Ingested {
			graph: Graph {
				nodes,
				edges,
				index,
			},
			rejected,
		}
	}

	/// Nodes in input order.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Edges whose endpoints both exist.
	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	/// True when there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// True when a node has id `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// Node with id `id`.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Category of node `id`.
	pub fn category(&self, id: &str) -> Option<Category> {
		self.node(id).map(|n| n.category)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(nodes: &[(&str, Category)], edges: &[(&str, &str)]) -> RawGraph {
		RawGraph {
			nodes: nodes
				.iter()
				.map(|&(id, c)| GraphNode::new(id, id.to_uppercase(), c))
				.collect(),
			edges: edges
				.iter()
				.map(|&(s, t)| GraphEdge::new(s, t, "calls"))
				.collect(),
		}
	}

	#[test]
	fn unknown_category_falls_back_to_other() {
		let node: GraphNode =
			serde_json::from_str(r#"{"id":"x","label":"X","type":"MIDDLEWARE"}"#).unwrap();
		assert_eq!(node.category, Category::Other);
		assert_eq!(node.category.rank(), Category::Other.rank());
	}

	#[test]
	fn category_wire_names_round_trip() {
		for c in Category::ALL {
			let json = serde_json::to_string(&c).unwrap();
			assert_eq!(json, format!("\"{}\"", c.as_str()));
			let back: Category = serde_json::from_str(&json).unwrap();
			assert_eq!(back, c);
		}
	}

	#[test]
	fn missing_relation_defaults_to_empty() {
		let g: RawGraph = serde_json::from_str(
			r#"{"nodes":[{"id":"a","label":"A","type":"SERVICE"}],"edges":[{"source":"a","target":"a"}]}"#,
		)
		.unwrap();
		assert_eq!(g.edges[0].relation, "");
	}

	#[test]
	fn dangling_edges_are_rejected_and_rest_kept() {
		let ingested = Graph::ingest(raw(
			&[("a", Category::Controller), ("b", Category::Service)],
			&[("a", "b"), ("a", "ghost"), ("ghost", "b"), ("x", "y")],
		));
		assert_eq!(ingested.graph.edges().len(), 1);
		assert_eq!(ingested.graph.nodes().len(), 2);
		let reasons: Vec<_> = ingested
			.rejected
			.iter()
			.map(|r| match r {
				Rejection::Edge { reason, .. } => reason.clone(),
				Rejection::Node { reason, .. } => reason.clone(),
			})
			.collect();
		assert_eq!(
			reasons,
			vec![
				RejectReason::UnknownTarget,
				RejectReason::UnknownSource,
				RejectReason::UnknownEndpoints
			]
		);
	}

	#[test]
	fn duplicate_node_keeps_first() {
		let mut input = raw(&[("a", Category::Controller)], &[]);
		input.nodes.push(GraphNode::new("a", "second", Category::Entity));
		let ingested = Graph::ingest(input);
		assert_eq!(ingested.graph.nodes().len(), 1);
		assert_eq!(ingested.graph.category("a"), Some(Category::Controller));
		assert_eq!(ingested.rejected.len(), 1);
	}

	#[test]
	fn lookup_by_id() {
		let g = Graph::ingest(raw(
			&[("c1", Category::Controller), ("r1", Category::Repository)],
			&[],
		))
		.graph;
		assert!(g.contains("r1"));
		assert!(!g.contains("zz"));
		assert_eq!(g.node("r1").map(|n| n.label.as_str()), Some("R1"));
		assert_eq!(g.category("c1"), Some(Category::Controller));
	}

	#[test]
	fn empty_graph_is_valid() {
		let ingested = Graph::ingest(RawGraph::default());
		assert!(ingested.graph.is_empty());
		assert!(ingested.rejected.is_empty());
	}
}
