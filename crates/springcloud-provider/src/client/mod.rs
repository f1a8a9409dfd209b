//! The seam between the reconcilers and Azure Resource Manager.
//!
//! [`ResourceManager`] is a small JSON transport addressed by resource ids. Mutations return an
//! [`Operation`], which has to be awaited with [`Operation::wait`] before the resource can be
//! relied upon. [`AppPlatform`] layers typed calls for the `Microsoft.AppPlatform` resources on
//! top of it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use snafu::Snafu;

mod app_platform;
pub mod arm;
#[cfg(test)]
pub(crate) mod memory;

pub use app_platform::AppPlatform;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{id} was not found"))]
    NotFound { id: String },

    #[snafu(display("request for {id} failed with status {status}: {message}"))]
    Request {
        id: String,
        status: u16,
        message: String,
    },

    #[snafu(display("failed to send request for {id}"))]
    Transport { id: String, source: reqwest::Error },

    #[snafu(display("failed to build the request URL for {id}"))]
    InvalidUrl { id: String, source: url::ParseError },

    #[snafu(display("failed to decode the response for {id}"))]
    Decode {
        id: String,
        source: serde_json::Error,
    },

    #[snafu(display("failed to encode the request body for {id}"))]
    Encode {
        id: String,
        source: serde_json::Error,
    },

    #[snafu(display("long-running operation on {id} ended with status {status}: {message}"))]
    OperationFailed {
        id: String,
        status: OperationStatus,
        message: String,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Turns [`Error::NotFound`] into `None`.
///
/// Only reads and deletes treat a missing resource as a regular outcome, every other call
/// keeps it as an error.
pub trait NotFoundExt<T> {
    fn optional(self) -> Result<Option<T>, Error>;
}

impl<T> NotFoundExt<T> for Result<T, Error> {
    fn optional(self) -> Result<Option<T>, Error> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A JSON transport for Azure Resource Manager resources.
///
/// Ids are full resource ids like `/subscriptions/.../spring/svc`, collections are the id of
/// the parent followed by the collection name, like `/subscriptions/.../spring/svc/containerRegistries`.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    async fn get(&self, id: &str) -> Result<Value, Error>;

    async fn list(&self, collection: &str) -> Result<Vec<Value>, Error>;

    async fn put(&self, id: &str, body: Value) -> Result<Operation, Error>;

    async fn patch(&self, id: &str, body: Value) -> Result<Operation, Error>;

    async fn delete(&self, id: &str) -> Result<Operation, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

/// The outcome of polling a long-running operation once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollResult {
    pub status: OperationStatus,

    /// How long the service asked to wait before polling again.
    pub retry_after: Option<Duration>,

    pub message: Option<String>,
}

impl PollResult {
    pub fn with_status(status: OperationStatus) -> Self {
        Self {
            status,
            retry_after: None,
            message: None,
        }
    }
}

#[async_trait]
pub trait Poll: Send {
    async fn poll(&mut self) -> Result<PollResult, Error>;
}

/// A handle to a (possibly) long-running operation.
pub struct Operation {
    id: String,
    poller: Option<Box<dyn Poll>>,
    poll_interval: Duration,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("pending", &self.poller.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Operation {
    /// An operation which already finished with the response.
    pub fn completed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            poller: None,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn pending(id: impl Into<String>, poller: Box<dyn Poll>, poll_interval: Duration) -> Self {
        Self {
            id: id.into(),
            poller: Some(poller),
            poll_interval,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.poller.is_some()
    }

    /// Polls until the operation reaches a terminal state.
    ///
    /// There is no deadline here, callers bound the whole lifecycle phase instead.
    pub async fn wait(self) -> Result<(), Error> {
        let Some(mut poller) = self.poller else {
            return Ok(());
        };

        loop {
            let result = poller.poll().await?;
            match result.status {
                OperationStatus::Succeeded => return Ok(()),
                OperationStatus::Failed | OperationStatus::Canceled => {
                    return OperationFailedSnafu {
                        id: self.id,
                        status: result.status,
                        message: result.message.unwrap_or_default(),
                    }
                    .fail();
                }
                OperationStatus::InProgress => {
                    let delay = result.retry_after.unwrap_or(self.poll_interval);
                    tracing::trace!(id = %self.id, ?delay, "operation in progress");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
