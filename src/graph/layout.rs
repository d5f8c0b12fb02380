//! Deterministic tiered layout.
//!
//! Every category owns one column, ordered Controller -> Service -> Repository
//! -> Entity -> Config -> Other, so dependency direction reads left to right
//! without any per-edge routing. Columns are centred vertically against the
//! tallest one.

use std::collections::HashMap;

use serde::Deserialize;

use super::model::{Category, Graph, GraphNode};
use crate::geometry::{Point, Rect};

/// Fixed layout dimensions in canvas units. Any positive values keep the
/// layout invariants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Card width.
	pub node_width: f64,
	/// Card height.
	pub node_height: f64,
	/// Horizontal gap between tier origins.
	pub tier_spacing: f64,
	/// Vertical gap between nodes in the same tier.
	pub node_spacing: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			node_width: 220.0,
			node_height: 70.0,
			tier_spacing: 250.0,
			node_spacing: 80.0,
		}
	}
}

impl LayoutConfig {
	/// Distance between consecutive node origins within a tier.
	pub fn row_height(&self) -> f64 {
		self.node_height + self.node_spacing
	}
}

/// A graph node with its computed position (top-left corner).
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedNode {
	/// The laid-out node.
	pub node: GraphNode,
	/// Zero-based column index.
	pub tier: usize,
	/// Left edge in canvas units.
	pub x: f64,
	/// Top edge in canvas units.
	pub y: f64,
}

impl PositionedNode {
	/// Top-left corner as a point.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Output of [`layout`]: positioned nodes in tier order, plus node geometry
/// for hit testing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	nodes: Vec<PositionedNode>,
	/// `node id -> index into nodes`.
	index: HashMap<String, usize>,
	node_width: f64,
	node_height: f64,
}

impl Layout {
	/// Nodes in tier order.
	pub fn nodes(&self) -> &[PositionedNode] {
		&self.nodes
	}

	/// Top-left corner of node `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		self.index
			.get(id)
			.map(|&i| self.nodes[i].position())
	}

	/// Rectangle occupied by node `id`.
	pub fn rect(&self, id: &str) -> Option<Rect> {
		self.position(id)
			.map(|p| Rect::new(p.x, p.y, self.node_width, self.node_height))
	}

	/// Bounding box of all nodes, `None` for an empty layout.
	pub fn bounds(&self) -> Option<Rect> {
		self.nodes
			.iter()
			.map(|p| Rect::new(p.x, p.y, self.node_width, self.node_height))
			.reduce(|acc, r| acc.union(&r))
	}

	/// Topmost node under a canvas-space point.
	pub fn node_at(&self, point: Point) -> Option<&PositionedNode> {
		self.nodes.iter().rev().find(|p| {
			Rect::new(p.x, p.y, self.node_width, self.node_height).contains(point)
		})
	}

	/// `(width, height)` shared by every card.
	pub fn node_size(&self) -> (f64, f64) {
		(self.node_width, self.node_height)
	}
}

/// Computes positions for every node of `graph`.
///
/// Edges are not consulted; they are drawn between whatever positions their
/// endpoints receive. Identical input (same node order) always yields
/// identical output.
pub fn layout(graph: &Graph, config: &LayoutConfig) -> Layout {
	let mut tiers: [Vec<&GraphNode>; Category::TIERS] = Default::default();
	for node in graph.nodes() {
		tiers[node.category.rank()].push(node);
	}

	let row = config.row_height();
	let max_height = tiers
		.iter()
		.map(|t| t.len() as f64 * row)
		.fold(0.0, f64::max);

	let mut nodes = Vec::with_capacity(graph.nodes().len());
	for (tier, members) in tiers.iter().enumerate() {
		let column_height = members.len() as f64 * row;
		let start_y = (max_height - column_height) / 2.0;
		let x = tier as f64 * config.tier_spacing;
		for (i, node) in members.iter().enumerate() {
			nodes.push(PositionedNode {
				node: (*node).clone(),
				tier,
				x,
				y: start_y + i as f64 * row,
			});
		}
	}

	let index = nodes
		.iter()
		.enumerate()
		.map(|(i, p)| (p.node.id.clone(), i))
		.collect();
	Layout {
		nodes,
		index,
		node_width: config.node_width,
		node_height: config.node_height,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::model::{GraphEdge, RawGraph};

	fn graph(nodes: &[(&str, Category)], edges: &[(&str, &str)]) -> Graph {
		Graph::ingest(RawGraph {
			nodes: nodes
				.iter()
				.map(|&(id, c)| GraphNode::new(id, id, c))
				.collect(),
			edges: edges
				.iter()
				.map(|&(s, t)| GraphEdge::new(s, t, "uses"))
				.collect(),
		})
		.graph
	}

	fn mixed() -> Graph {
		graph(
			&[
				("e1", Category::Entity),
				("c1", Category::Controller),
				("s1", Category::Service),
				("c2", Category::Controller),
				("x1", Category::Other),
				("s2", Category::Service),
				("c3", Category::Controller),
				("cfg", Category::Config),
				("r1", Category::Repository),
			],
			&[("c1", "s1"), ("s1", "r1"), ("r1", "e1")],
		)
	}

	#[test]
	fn three_tier_scenario() {
		let g = graph(
			&[
				("c1", Category::Controller),
				("s1", Category::Service),
				("r1", Category::Repository),
			],
			&[("c1", "s1"), ("s1", "r1")],
		);
		let config = LayoutConfig::default();
		let l = layout(&g, &config);
		let tiers: Vec<_> = l.nodes().iter().map(|p| (p.node.id.as_str(), p.tier)).collect();
		assert_eq!(tiers, vec![("c1", 0), ("s1", 1), ("r1", 2)]);

		let xs: Vec<_> = l.nodes().iter().map(|p| p.x).collect();
		assert_eq!(xs, vec![0.0, 250.0, 500.0]);

		// every column holds one node, so max height == row height
		let expected_y = (config.row_height() - config.row_height()) / 2.0;
		assert!(l.nodes().iter().all(|p| p.y == expected_y));
	}

	#[test]
	fn layout_is_deterministic() {
		let g = mixed();
		let config = LayoutConfig::default();
		assert_eq!(layout(&g, &config), layout(&g, &config));
	}

	#[test]
	fn tier_order_follows_category_rank() {
		let l = layout(&mixed(), &LayoutConfig::default());
		for a in l.nodes() {
			for b in l.nodes() {
				if a.node.category.rank() < b.node.category.rank() {
					assert!(a.x < b.x, "{} should be left of {}", a.node.id, b.node.id);
				}
				if a.node.category == b.node.category {
					assert_eq!(a.x, b.x);
				}
			}
		}
	}

	#[test]
	fn no_vertical_collision_within_tier() {
		let l = layout(&mixed(), &LayoutConfig::default());
		let nodes = l.nodes();
		for (i, a) in nodes.iter().enumerate() {
			for b in &nodes[i + 1..] {
				if a.x == b.x {
					assert_ne!(a.y, b.y, "{} and {} overlap", a.node.id, b.node.id);
				}
			}
		}
	}

	#[test]
	fn tiers_keep_input_order_and_are_centred() {
		let config = LayoutConfig::default();
		let l = layout(&mixed(), &config);
		let row = config.row_height();

		let controllers: Vec<_> = l
			.nodes()
			.iter()
			.filter(|p| p.tier == 0)
			.map(|p| (p.node.id.as_str(), p.y))
			.collect();
		assert_eq!(controllers, vec![("c1", 0.0), ("c2", row), ("c3", 2.0 * row)]);

		// two services in a column of height 3 rows start half a row down
		let services: Vec<_> = l.nodes().iter().filter(|p| p.tier == 1).map(|p| p.y).collect();
		assert_eq!(services, vec![row / 2.0, row / 2.0 + row]);

		// singleton tiers sit one row down
		assert_eq!(l.position("r1"), Some(Point::new(2.0 * config.tier_spacing, row)));
	}

	#[test]
	fn other_tier_is_last_even_when_config_empty() {
		let l = layout(
			&graph(&[("x", Category::Other), ("c", Category::Controller)], &[]),
			&LayoutConfig::default(),
		);
		assert_eq!(l.position("x").map(|p| p.x), Some(5.0 * 250.0));
		assert_eq!(l.nodes()[0].node.id, "c");
	}

	#[test]
	fn hit_test_and_bounds() {
		let config = LayoutConfig::default();
		let l = layout(
			&graph(&[("c1", Category::Controller), ("s1", Category::Service)], &[]),
			&config,
		);
		assert_eq!(
			l.node_at(Point::new(10.0, 10.0)).map(|p| p.node.id.as_str()),
			Some("c1")
		);
		assert_eq!(
			l.node_at(Point::new(260.0, 60.0)).map(|p| p.node.id.as_str()),
			Some("s1")
		);
		assert!(l.node_at(Point::new(230.0, 10.0)).is_none());
		assert_eq!(
			l.bounds(),
			Some(Rect::new(0.0, 0.0, 250.0 + config.node_width, config.node_height))
		);
	}

	#[test]
	fn every_node_is_found_by_id() {
		let config = LayoutConfig::default();
		let l = layout(&mixed(), &config);
		for p in l.nodes() {
			assert_eq!(l.position(&p.node.id), Some(p.position()));
			assert_eq!(
				l.rect(&p.node.id),
				Some(Rect::new(p.x, p.y, config.node_width, config.node_height))
			);
		}
		assert!(l.position("missing").is_none());
	}

	#[test]
	fn empty_graph_has_no_bounds() {
		let l = layout(&Graph::default(), &LayoutConfig::default());
		assert!(l.nodes().is_empty());
		assert!(l.bounds().is_none());
	}
}
