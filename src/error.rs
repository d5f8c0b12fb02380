//! Error types for the store client, flow documents, saving and configuration.
//!
//! None of these are fatal: fetch errors become an empty-state placeholder,
//! save errors leave the draft in place for a retry.

use std::fmt;

/// Failure talking to the record store.
#[derive(Debug)]
pub enum StoreError {
	/// The configured base URL plus path did not form a valid URL.
	InvalidUrl {
		/// Base URL the path was joined onto.
		url: String,
		/// Parser complaint.
		message: String,
	},
	/// Network-level failure (DNS, connection refused, CORS, ...).
	Transport {
		/// Request URL.
		url: String,
		/// Underlying client error.
		source: reqwest::Error,
	},
	/// Non-success HTTP status.
	Status {
		/// Request URL.
		url: String,
		/// HTTP status code received.
		status: u16,
	},
	/// Response body was not the expected JSON.
	Decode {
		/// Request URL.
		url: String,
		/// Underlying decode error.
		source: reqwest::Error,
	},
	/// The store has no flow with this id.
	NotFound {
		/// Id that was asked for.
		id: i64,
	},
}

impl fmt::Display for StoreError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidUrl { url, message } => write!(f, "invalid store url {url:?}: {message}"),
			Self::Transport { url, source } => write!(f, "request to {url} failed: {source}"),
			Self::Status { url, status } => write!(f, "{url} answered with HTTP {status}"),
			Self::Decode { url, source } => write!(f, "cannot decode response from {url}: {source}"),
			Self::NotFound { id } => write!(f, "flow {id} does not exist"),
		}
	}
}

impl std::error::Error for StoreError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Transport { source, .. } | Self::Decode { source, .. } => Some(source),
			Self::InvalidUrl { .. } | Self::Status { .. } | Self::NotFound { .. } => None,
		}
	}
}

/// Failure encoding or decoding a flow document's graph.
#[derive(Debug)]
pub enum DocumentError {
	/// The graph could not be serialized.
	Encode(serde_json::Error),
	/// The stored graph is not valid flow JSON.
	Decode(serde_json::Error),
}

impl fmt::Display for DocumentError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Encode(e) => write!(f, "cannot encode flow graph: {e}"),
			Self::Decode(e) => write!(f, "cannot decode flow graph: {e}"),
		}
	}
}

impl std::error::Error for DocumentError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Encode(e) | Self::Decode(e) => Some(e),
		}
	}
}

/// Why a save could not start or did not complete.
#[derive(Debug)]
pub enum SaveError {
	/// Only an editing session can be saved.
	NotEditing,
	/// A save for this document is already waiting on the store.
	InFlight,
	/// Nothing on the canvas.
	EmptyCanvas,
	/// The answer belongs to a save that was abandoned by closing or
	/// reopening; it was not applied.
	Superseded,
	/// The draft could not be serialized.
	Encode(DocumentError),
	/// The store rejected or never received the document.
	Store(StoreError),
}

impl fmt::Display for SaveError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotEditing => f.write_str("flow is not being edited"),
			Self::InFlight => f.write_str("a save is already in progress"),
			Self::EmptyCanvas => f.write_str("canvas is empty"),
			Self::Superseded => f.write_str("save answer arrived for a flow that is no longer open"),
			Self::Encode(e) => write!(f, "{e}"),
			Self::Store(e) => write!(f, "save failed: {e}"),
		}
	}
}

impl std::error::Error for SaveError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Encode(e) => Some(e),
			Self::Store(e) => Some(e),
			Self::NotEditing | Self::InFlight | Self::EmptyCanvas | Self::Superseded => None,
		}
	}
}

impl From<DocumentError> for SaveError {
	fn from(e: DocumentError) -> Self {
		Self::Encode(e)
	}
}

impl From<StoreError> for SaveError {
	fn from(e: StoreError) -> Self {
		Self::Store(e)
	}
}

/// Malformed application configuration.
#[derive(Debug)]
pub struct ConfigError(pub serde_json::Error);

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "invalid configuration: {}", self.0)
	}
}

impl std::error::Error for ConfigError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.0)
	}
}
