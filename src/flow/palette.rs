//! Draggable items offered to the flow builder.
//!
//! Items come from the subject's analyzed graph so a flow can reference real
//! components by name, plus a sticky-note tool.

use super::document::FlowNodeKind;
use crate::graph::{Category, Graph};

/// Categories listed in the palette, in display order.
pub const PALETTE_GROUPS: [Category; 4] = [
	Category::Controller,
	Category::Service,
	Category::Repository,
	Category::Entity,
];

/// Label given to a dropped note.
pub const NOTE_LABEL: &str = "Sticky Note";

/// One thing the user can drag onto the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteItem {
	/// Kind of node created on drop.
	pub kind: FlowNodeKind,
	/// Label of the created node.
	pub label: String,
}

impl PaletteItem {
	/// The sticky-note tool.
	pub fn note() -> Self {
		Self {
			kind: FlowNodeKind::Note,
			label: NOTE_LABEL.to_string(),
		}
	}
}

/// A titled group of items for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteGroup {
	/// Category shared by every item in the group.
	pub category: Category,
	/// Matching items in graph order.
	pub items: Vec<PaletteItem>,
}

impl PaletteGroup {
	/// Plural heading shown above the group.
	pub fn title(&self) -> &'static str {
		match self.category {
			Category::Controller => "Controllers",
			Category::Service => "Services",
			Category::Repository => "Repositories",
			Category::Entity => "Entities",
			Category::Config => "Config",
			Category::Other => "Other",
		}
	}
}

/// Component items for one subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
	items: Vec<PaletteItem>,
}

impl Palette {
	/// Builds the palette from the analyzed graph, keeping graph order.
	pub fn from_graph(graph: &Graph) -> Self {
		Self {
			items: graph
				.nodes()
				.iter()
				.filter(|n| PALETTE_GROUPS.contains(&n.category))
				.map(|n| PaletteItem {
					kind: FlowNodeKind::Component(n.category),
					label: n.label.clone(),
				})
				.collect(),
		}
	}

	/// Whether the graph offered no components.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Non-empty groups whose labels contain `search` (case-insensitive).
	pub fn groups(&self, search: &str) -> Vec<PaletteGroup> {
		let needle = search.trim().to_lowercase();
		PALETTE_GROUPS
			.iter()
			.filter_map(|&category| {
				let items: Vec<_> = self
					.items
					.iter()
					.filter(|i| i.kind == FlowNodeKind::Component(category))
					.filter(|i| needle.is_empty() || i.label.to_lowercase().contains(&needle))
					.cloned()
					.collect();
				(!items.is_empty()).then_some(PaletteGroup { category, items })
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphNode, RawGraph};

	fn palette() -> Palette {
		Palette::from_graph(
			&Graph::ingest(RawGraph {
				nodes: vec![
					GraphNode::new("1", "OrderController", Category::Controller),
					GraphNode::new("2", "OrderService", Category::Service),
					GraphNode::new("3", "PaymentService", Category::Service),
					GraphNode::new("4", "AppConfig", Category::Config),
					GraphNode::new("5", "Order", Category::Entity),
				],
				edges: vec![],
			})
			.graph,
		)
	}

	#[test]
	fn groups_skip_config_and_empty_categories() {
		let groups = palette().groups("");
		let cats: Vec<_> = groups.iter().map(|g| g.category).collect();
		assert_eq!(
			cats,
			vec![Category::Controller, Category::Service, Category::Entity]
		);
		assert_eq!(groups[1].items.len(), 2);
		assert_eq!(groups[2].title(), "Entities");
	}

	#[test]
	fn search_is_case_insensitive() {
		let groups = palette().groups("  ORDER ");
		let labels: Vec<_> = groups
			.iter()
			.flat_map(|g| g.items.iter().map(|i| i.label.as_str()))
			.collect();
		assert_eq!(labels, vec!["OrderController", "OrderService", "Order"]);
	}

	#[test]
	fn search_without_match_is_empty() {
		assert!(palette().groups("kafka").is_empty());
	}

	#[test]
	fn note_tool() {
		let note = PaletteItem::note();
		assert!(note.kind.is_note());
		assert_eq!(note.label, NOTE_LABEL);
	}
}
