//! Single-writer access to the registry.
//!
//! One task owns the `Registry` and applies commands strictly one at a time.
//! Front ends talk to it through a cloneable [`Handle`].

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::{DbCommand, DbResult};
use crate::error::DbError;
use crate::protocol::{self, JsonResponse};
use crate::registry::Registry;

/// Errors surfaced to front ends.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// The request could not be parsed into a command.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The registry task has stopped.
    #[error("database service unavailable")]
    Unavailable,
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Db(e) => e.kind(),
            ServiceError::InvalidRequest(_) => "invalid_request",
            ServiceError::Unavailable => "unavailable",
        }
    }
}

pub struct Command {
    pub cmd: DbCommand,
    pub respond_to: oneshot::Sender<Result<DbResult, DbError>>,
}

#[derive(Debug, Clone)]
pub struct Handle {
    tx: mpsc::Sender<Command>,
}

impl Handle {
    pub async fn call(&self, cmd: DbCommand) -> Result<DbResult, ServiceError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Command { cmd, respond_to })
            .await
            .map_err(|_| ServiceError::Unavailable)?;
        let result = response.await.map_err(|_| ServiceError::Unavailable)?;
        Ok(result?)
    }

    /// Parses a raw JSON request, runs it and shapes the reply.
    pub async fn request(&self, payload: &[u8]) -> JsonResponse {
        let result = match protocol::decode_command(payload) {
            Ok(cmd) => self.call(cmd).await,
            Err(e) => Err(e),
        };
        JsonResponse::from(result)
    }
}

/// Starts the registry task. The task ends, handing the registry back, once
/// every `Handle` has been dropped.
pub fn spawn(registry: Registry, capacity: usize) -> (Handle, JoinHandle<Registry>) {
    let (tx, rx) = mpsc::channel(capacity);
    let task = tokio::spawn(run(registry, rx));
    (Handle { tx }, task)
}

pub async fn run(mut registry: Registry, mut rx: mpsc::Receiver<Command>) -> Registry {
    info!("registry task started");
    while let Some(Command { cmd, respond_to }) = rx.recv().await {
        let name = cmd.name();
        let result = registry.execute(cmd);
        match &result {
            Ok(_) => debug!(command = name, "ok"),
            Err(e) => warn!(command = name, kind = e.kind(), "{}", e),
        }
        if respond_to.send(result).is_err() {
            debug!(command = name, "caller went away before the reply");
        }
    }
    info!("registry task stopped");
    registry
}
