//! Single-hop selection highlighting.
//!
//! Selecting a node emphasizes it, its direct neighbours and the edges that
//! touch it; everything else is dimmed. With no selection nothing is dimmed.
//! The state is derived from `(graph, selection)` alone, so callers recompute
//! it whenever either changes instead of patching it.

use std::collections::HashSet;

use super::model::Graph;

/// Visual weight of one node or edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Emphasis {
	/// No selection active.
	#[default]
	Normal,
	/// Part of the selected node's neighbourhood.
	Emphasized,
	/// A selection is active and this element is outside it.
	Dimmed,
}

impl Emphasis {
	/// True for [`Emphasis::Emphasized`].
	pub fn is_emphasized(self) -> bool {
		self == Emphasis::Emphasized
	}

	/// True for [`Emphasis::Dimmed`].
	pub fn is_dimmed(self) -> bool {
		self == Emphasis::Dimmed
	}
}

/// Per-frame styling decisions for a graph.
///
/// `nodes` and `edges` are aligned with [`Graph::nodes`] and [`Graph::edges`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderState {
	selected: Option<String>,
	emphasized: HashSet<String>,
	nodes: Vec<Emphasis>,
	edges: Vec<Emphasis>,
}

impl RenderState {
	/// The selection this state was computed for, if it was valid.
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Ids of emphasized nodes; empty when nothing is selected.
	pub fn emphasized_nodes(&self) -> &HashSet<String> {
		&self.emphasized
	}

	/// Emphasis of the node at `index`; `Normal` when out of range.
	pub fn node(&self, index: usize) -> Emphasis {
		self.nodes.get(index).copied().unwrap_or_default()
	}

	/// Emphasis of the edge at `index`; `Normal` when out of range.
	pub fn edge(&self, index: usize) -> Emphasis {
		self.edges.get(index).copied().unwrap_or_default()
	}

	/// Emphasis for a node looked up by id.
	pub fn node_by_id(&self, id: &str) -> Emphasis {
		match self.selected {
			None => Emphasis::Normal,
			Some(_) if self.emphasized.contains(id) => Emphasis::Emphasized,
			Some(_) => Emphasis::Dimmed,
		}
	}
}

/// Derives the render state for `graph` with `selected` as the focused node.
///
/// A selection that does not exist in `graph` is treated as no selection.
pub fn highlight(graph: &Graph, selected: Option<&str>) -> RenderState {
	let Some(selected) = selected.filter(|id| graph.contains(id)) else {
		return RenderState {
			selected: None,
			emphasized: HashSet::new(),
			nodes: vec![Emphasis::Normal; graph.nodes().len()],
			edges: vec![Emphasis::Normal; graph.edges().len()],
		};
	};

	let mut emphasized = HashSet::new();
	emphasized.insert(selected.to_string());

	let edges = graph
		.edges()
		.iter()
		.map(|edge| {
			if edge.touches(selected) {
				emphasized.insert(edge.source.clone());
				emphasized.insert(edge.target.clone());
				Emphasis::Emphasized
			} else {
				Emphasis::Dimmed
			}
		})
		.collect();

	let nodes = graph
		.nodes()
		.iter()
		.map(|n| {
			if emphasized.contains(&n.id) {
				Emphasis::Emphasized
			} else {
				Emphasis::Dimmed
			}
		})
		.collect();

	RenderState {
		selected: Some(selected.to_string()),
		emphasized,
		nodes,
		edges,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::{Category, GraphEdge, GraphNode, RawGraph};

	fn scenario() -> Graph {
		Graph::ingest(RawGraph {
			nodes: vec![
				GraphNode::new("c1", "UserController", Category::Controller),
				GraphNode::new("s1", "UserService", Category::Service),
				GraphNode::new("r1", "UserRepository", Category::Repository),
				GraphNode::new("e1", "User", Category::Entity),
			],
			edges: vec![
				GraphEdge::new("c1", "s1", "calls"),
				GraphEdge::new("s1", "r1", "calls"),
				GraphEdge::new("r1", "e1", "persists"),
			],
		})
		.graph
	}

	fn ids(state: &RenderState) -> Vec<&str> {
		let mut v: Vec<_> = state.emphasized_nodes().iter().map(String::as_str).collect();
		v.sort();
		v
	}

	#[test]
	fn selecting_middle_node_emphasizes_both_neighbours() {
		let state = highlight(&scenario(), Some("s1"));
		assert_eq!(ids(&state), vec!["c1", "r1", "s1"]);
		assert_eq!(state.node_by_id("e1"), Emphasis::Dimmed);
		assert_eq!(state.edge(0), Emphasis::Emphasized);
		assert_eq!(state.edge(1), Emphasis::Emphasized);
		assert_eq!(state.edge(2), Emphasis::Dimmed);
	}

	#[test]
	fn selecting_leaf_is_single_hop_only() {
		let state = highlight(&scenario(), Some("c1"));
		assert_eq!(ids(&state), vec!["c1", "s1"]);
		assert_eq!(state.node_by_id("r1"), Emphasis::Dimmed);
	}

	#[test]
	fn no_selection_dims_nothing() {
		let g = scenario();
		let state = highlight(&g, None);
		assert!(state.emphasized_nodes().is_empty());
		assert!(state.selected().is_none());
		for i in 0..g.nodes().len() {
			assert_eq!(state.node(i), Emphasis::Normal);
		}
		for i in 0..g.edges().len() {
			assert_eq!(state.edge(i), Emphasis::Normal);
		}
	}

	#[test]
	fn unknown_selection_behaves_as_none() {
		let g = scenario();
		assert_eq!(highlight(&g, Some("gone")), highlight(&g, None));
	}

	#[test]
	fn closure_matches_definition_for_every_node() {
		let g = scenario();
		for node in g.nodes() {
			let state = highlight(&g, Some(node.id.as_str()));
			let mut expected: HashSet<String> = g
				.edges()
				.iter()
				.filter(|e| e.touches(&node.id))
				.flat_map(|e| [e.source.clone(), e.target.clone()])
				.collect();
			expected.insert(node.id.clone());
			assert_eq!(state.emphasized_nodes(), &expected);
		}
	}

	#[test]
	fn isolated_node_emphasizes_only_itself() {
		let g = Graph::ingest(RawGraph {
			nodes: vec![
				GraphNode::new("a", "A", Category::Config),
				GraphNode::new("b", "B", Category::Other),
			],
			edges: vec![],
		})
		.graph;
		let state = highlight(&g, Some("a"));
		assert_eq!(ids(&state), vec!["a"]);
		assert_eq!(state.node(1), Emphasis::Dimmed);
	}
}
