//! Record store access: analyzed graphs and persisted flow documents.

pub mod http;
#[cfg(test)]
pub mod memory;

pub use http::HttpStore;

use crate::error::StoreError;
use crate::flow::{FlowDocument, FlowId};
use crate::graph::RawGraph;

/// Remote storage the viewer and builder talk to.
///
/// Futures are not `Send`: the store runs on the browser's single thread.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
	/// Analyzed graph of `subject`. A subject that was never analyzed yields
	/// an empty graph rather than an error.
	async fn fetch_graph(&self, subject: &str) -> Result<RawGraph, StoreError>;

	async fn list_flows(&self, subject: &str) -> Result<Vec<FlowDocument>, StoreError>;

	/// Creates the document when it has no id, otherwise replaces it.
	/// Returns the stored document carrying its id.
	async fn save_flow(&self, doc: &FlowDocument) -> Result<FlowDocument, StoreError>;

	async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError>;
}
