//! User-authored flow documents: encoding, the open-document state machine
//! and the builder palette.

pub mod document;
pub mod manager;
pub mod palette;

pub use document::{FlowDocument, FlowEdge, FlowGraph, FlowId, FlowNode, FlowNodeKind};
pub use manager::{EditableFlow, FlowManager, FlowMode, FlowState, OpenFlow, ReadOnlyFlow};
pub use palette::{Palette, PaletteGroup, PaletteItem};
