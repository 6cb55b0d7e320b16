//! reqwest implementation of `RemoteTodoService`.

use super::{RemoteTodoService, TransportError, TransportResult};
use crate::model::todo::{CreateTodoRequest, RemoteTodo, TodoPatch};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for a `/todos` REST resource rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpTodoService {
    client: Client,
    collection: Url,
}

impl HttpTodoService {
    /// Creates a client with transport defaults and no request timeout.
    pub fn new(base_url: impl AsRef<str>) -> TransportResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a client whose every request is bounded by `timeout`.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// A trailing slash on `base_url` is ignored.
    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> TransportResult<Self> {
        let raw = base_url.as_ref().trim();
        let mut collection =
            Url::parse(raw).map_err(|err| TransportError::InvalidUrl(format!("{raw}: {err}")))?;
        collection
            .path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl(format!("{raw}: not a hierarchical url")))?
            .pop_if_empty()
            .push("todos");
        Ok(Self { client, collection })
    }

    fn collection_url(&self) -> Url {
        self.collection.clone()
    }

    /// `id` is pushed as one percent-encoded segment.
    fn item_url(&self, id: &str) -> TransportResult<Url> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl(self.collection.to_string()))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl RemoteTodoService for HttpTodoService {
    async fn fetch_all(&self) -> TransportResult<Vec<RemoteTodo>> {
        let url = self.collection_url();
        let response = send(self.client.get(url.clone())).await?;
        decode_json(response, &url).await
    }

    async fn fetch_one(&self, id: &str) -> TransportResult<RemoteTodo> {
        let url = self.item_url(id)?;
        let response = send(self.client.get(url.clone())).await?;
        decode_json(response, &url).await
    }

    async fn create(&self, request: &CreateTodoRequest) -> TransportResult<RemoteTodo> {
        let url = self.collection_url();
        let response = send(self.client.post(url.clone()).json(request)).await?;
        decode_json(response, &url).await
    }

    async fn replace(&self, patch: &TodoPatch) -> TransportResult<()> {
        let url = self.item_url(&patch.id)?;
        let response = send(self.client.put(url.clone()).json(patch)).await?;
        log_ignored_ack("put", &url, &response);
        Ok(())
    }

    async fn delete(&self, id: &str) -> TransportResult<()> {
        let url = self.item_url(id)?;
        let response = send(self.client.delete(url.clone())).await?;
        log_ignored_ack("delete", &url, &response);
        Ok(())
    }
}

async fn send(request: reqwest::RequestBuilder) -> TransportResult<Response> {
    request
        .send()
        .await
        .map_err(|err| TransportError::Request(err.to_string()))
}

async fn decode_json<T: DeserializeOwned>(response: Response, url: &Url) -> TransportResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| TransportError::Decode(err.to_string()))
}

fn log_ignored_ack(method: &str, url: &Url, response: &Response) {
    let status = response.status();
    if !status.is_success() {
        debug!(
            "event=remote_ack module=remote status=ignored method={method} url={url} http_status={}",
            status.as_u16()
        );
    }
}
