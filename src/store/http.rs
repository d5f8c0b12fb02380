//! [`RecordStore`] over the backend's JSON HTTP API.

use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::RecordStore;
use crate::error::StoreError;
use crate::flow::{FlowDocument, FlowId};
use crate::graph::RawGraph;

/// HTTP client for one backend.
#[derive(Clone, Debug)]
pub struct HttpStore {
	client: Client,
	base: String,
}

impl HttpStore {
	/// Store rooted at `base`, e.g. `http://localhost:8080/api`.
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			client: Client::new(),
			base: base.into(),
		}
	}

	/// Base URL requests are built from.
	pub fn base(&self) -> &str {
		&self.base
	}

	async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, StoreError> {
		debug!("arch-graph: {url}");
		request.send().await.map_err(|source| StoreError::Transport {
			url: url.to_string(),
			source,
		})
	}

	async fn json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, StoreError> {
		let response = success(response, url)?;
		response.json::<T>().await.map_err(|source| StoreError::Decode {
			url: url.to_string(),
			source,
		})
	}
}

fn success(response: Response, url: &Url) -> Result<Response, StoreError> {
	let status = response.status();
	if status.is_success() {
		Ok(response)
	} else {
		Err(StoreError::Status {
			url: url.to_string(),
			status: status.as_u16(),
		})
	}
}

/// Joins `segments` onto `base`, percent-encoding each segment.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, StoreError> {
	let invalid = |message: String| StoreError::InvalidUrl {
		url: base.to_string(),
		message,
	};
	let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
	url.path_segments_mut()
		.map_err(|()| invalid("cannot be a base".to_string()))?
		.pop_if_empty()
		.extend(segments);
	Ok(url)
}

/// `GET {base}/flows?projectName={subject}`.
pub fn flows_endpoint(base: &str, subject: &str) -> Result<Url, StoreError> {
	let mut url = endpoint(base, &["flows"])?;
	url.query_pairs_mut().append_pair("projectName", subject);
	Ok(url)
}

impl RecordStore for HttpStore {
	async fn fetch_graph(&self, subject: &str) -> Result<RawGraph, StoreError> {
		let url = endpoint(&self.base, &["analyze", subject, "graph"])?;
		let response = self.send(self.client.get(url.clone()), &url).await?;
		if response.status() == StatusCode::NOT_FOUND {
			info!("arch-graph: {subject} has not been analyzed yet");
			return Ok(RawGraph::default());
		}
		Self::json(response, &url).await
	}

	async fn list_flows(&self, subject: &str) -> Result<Vec<FlowDocument>, StoreError> {
		let url = flows_endpoint(&self.base, subject)?;
		let response = self.send(self.client.get(url.clone()), &url).await?;
		Self::json(response, &url).await
	}

	async fn save_flow(&self, doc: &FlowDocument) -> Result<FlowDocument, StoreError> {
		let (url, request) = match doc.id {
			Some(id) => {
				let url = endpoint(&self.base, &["flows", &id.to_string()])?;
				let request = self.client.put(url.clone());
				(url, request)
			}
			None => {
				let url = endpoint(&self.base, &["flows"])?;
				let request = self.client.post(url.clone());
				(url, request)
			}
		};
		let response = self.send(request.json(doc), &url).await?;
		Self::json(response, &url).await
	}

	async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError> {
		let url = endpoint(&self.base, &["flows", &id.to_string()])?;
		let response = self.send(self.client.delete(url.clone()), &url).await?;
		if response.status() == StatusCode::NOT_FOUND {
			return Err(StoreError::NotFound { id });
		}
		success(response, &url)?;
		Ok(())
	}
}
