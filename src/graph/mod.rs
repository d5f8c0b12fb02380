//! Analyzed architecture graph: model, tiered layout and selection highlight.

pub mod highlight;
pub mod layout;
pub mod model;

pub use highlight::{Emphasis, RenderState, highlight};
pub use layout::{Layout, LayoutConfig, PositionedNode, layout};
pub use model::{Category, Graph, GraphEdge, GraphNode, Ingested, RawGraph, RejectReason, Rejection};
