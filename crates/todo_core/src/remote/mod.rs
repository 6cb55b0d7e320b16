//! Remote todo endpoint contract.
//!
//! # Responsibility
//! - Define the REST operations the repository mirrors writes to.
//! - Provide the reqwest-backed HTTP implementation.
//!
//! # Invariants
//! - The remote is best-effort: only seeding and single-item fallback read
//!   from it.
//! - `replace` and `delete` acknowledgements carry no data.

use crate::model::todo::{CreateTodoRequest, RemoteTodo, TodoPatch};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod http;

pub use http::HttpTodoService;

pub type TransportResult<T> = Result<T, TransportError>;

/// Remote call failure.
#[derive(Debug)]
pub enum TransportError {
    /// Connection, TLS or timeout failure before a response arrived.
    Request(String),
    /// Non-success HTTP status on an endpoint whose body is consumed.
    Status { status: u16, url: String },
    /// Response body could not be decoded.
    Decode(String),
    /// Base URL that cannot carry `/todos/:id` paths.
    InvalidUrl(String),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(reason) => write!(f, "remote request failed: {reason}"),
            Self::Status { status, url } => {
                write!(f, "remote returned status {status} for {url}")
            }
            Self::Decode(reason) => write!(f, "remote response malformed: {reason}"),
            Self::InvalidUrl(reason) => write!(f, "remote base url rejected: {reason}"),
        }
    }
}

impl Error for TransportError {}

/// REST operations against the remote todo service.
#[async_trait]
pub trait RemoteTodoService: Send + Sync {
    /// `GET /todos`
    async fn fetch_all(&self) -> TransportResult<Vec<RemoteTodo>>;
    /// `GET /todos/:id`
    async fn fetch_one(&self, id: &str) -> TransportResult<RemoteTodo>;
    /// `POST /todos`; returns the echoed record.
    async fn create(&self, request: &CreateTodoRequest) -> TransportResult<RemoteTodo>;
    /// `PUT /todos/:id`
    async fn replace(&self, patch: &TodoPatch) -> TransportResult<()>;
    /// `DELETE /todos/:id`
    async fn delete(&self, id: &str) -> TransportResult<()>;
}
