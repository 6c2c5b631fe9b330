//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of live sessions.

use crate::config::Config;
use crate::web::protocol::{ClientAction, SessionSnapshot};
use crate::web::session_task::SessionCommand;
use chrono::{DateTime, Utc};
use dream_university_core::{ports::CatalogService, FunnelSettings, ResilientClient};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Sessions)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogService>,
    pub client: ResilientClient,
    pub settings: SessionSettings,
    pub sessions: Arc<SessionRegistry>,
}

/// Per-session timing, taken from the configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub funnel: FunnelSettings,
    pub catalog_timeout: Duration,
    pub idle_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            funnel: FunnelSettings { analysis_delay: config.analysis_delay },
            catalog_timeout: config.catalog_timeout,
            idle_timeout: config.session_idle_timeout,
        }
    }
}

//=========================================================================================
// SessionHandle (One Live Session)
//=========================================================================================

/// Returned when the session task behind a handle has already stopped.
#[derive(Debug, thiserror::Error)]
#[error("Session {0} is closed")]
pub struct SessionClosed(pub Uuid);

/// A cheap, cloneable handle to a running session task.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    commands: mpsc::Sender<SessionCommand>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: Uuid,
        commands: mpsc::Sender<SessionCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { session_id, created_at: Utc::now(), commands, shutdown }
    }

    /// Applies a client action and returns the session as it stands afterwards.
    pub async fn apply(&self, action: ClientAction) -> Result<SessionSnapshot, SessionClosed> {
        let (reply, answer) = oneshot::channel();
        self.request(SessionCommand::Apply { action, reply }, answer).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        let (reply, answer) = oneshot::channel();
        self.request(SessionCommand::Snapshot { reply }, answer).await
    }

    async fn request(
        &self,
        command: SessionCommand,
        answer: oneshot::Receiver<SessionSnapshot>,
    ) -> Result<SessionSnapshot, SessionClosed> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionClosed(self.session_id))?;
        answer.await.map_err(|_| SessionClosed(self.session_id))
    }

    /// Stops the session task and everything it has in flight.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Time since the session was created.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

//=========================================================================================
// SessionRegistry
//=========================================================================================

#[derive(Default)]
pub struct SessionRegistry {
    handles: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub async fn insert(&self, handle: SessionHandle) {
        self.handles.write().await.insert(handle.session_id, handle);
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionHandle> {
        self.handles.read().await.get(&session_id).cloned()
    }

    pub async fn remove(&self, session_id: Uuid) -> Option<SessionHandle> {
        self.handles.write().await.remove(&session_id)
    }

    /// Drops handles whose session task has stopped. Returns how many were removed.
    pub async fn prune_closed(&self) -> usize {
        let mut handles = self.handles.write().await;
        let before = handles.len();
        handles.retain(|session_id, handle| {
            let closed = handle.is_closed();
            if closed {
                debug!("Forgetting session {} created at {}.", session_id, handle.created_at);
            }
            !closed
        });
        before - handles.len()
    }

    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }
}
