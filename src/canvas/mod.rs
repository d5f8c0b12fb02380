//! Canvas interaction: viewport transform, pointer gestures and the two
//! canvas reducers (read-only viewer and flow builder).

pub mod builder;
pub mod gesture;
pub mod viewer;
pub mod viewport;

pub use builder::{BuilderCanvas, BuilderConfig, BuilderEvent, BuilderOutcome, Drag, Handle};
pub use gesture::{Gesture, GestureEnd};
pub use viewer::{
	RequestSeq, RequestTicket, ViewStatus, ViewerCommand, ViewerConfig, ViewerController, ViewerEvent,
};
pub use viewport::Viewport;
