//! Live session registry
//!
//! The only shared mutable structure in the engine. Each id maps to the
//! handle of its worker; the worker removes its own entry on the way out.

use super::actor::{ActorChannels, SessionActor};
use super::handle::SessionHandle;
use super::state::{CloseReason, SessionId, SessionSnapshot, SessionStatus};
use crate::pipeline::FramePipeline;
use crate::websocket::OutboundMessage;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("session {0} is already live")]
    DuplicateSession(SessionId),

    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("live session limit of {limit} reached")]
    CapacityExceeded { limit: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub inbound_capacity: usize,
    pub outbound_capacity: usize,
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            inbound_capacity: 32,
            outbound_capacity: 64,
            max_sessions: 100,
        }
    }
}

struct RegistryInner {
    sessions: DashMap<SessionId, SessionHandle>,
    next_instance: AtomicU64,
    /// Workers that have been spawned and not yet released.
    workers: AtomicUsize,
    settings: SessionSettings,
    pipeline: Arc<FramePipeline>,
}

#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    pub fn new(pipeline: Arc<FramePipeline>, settings: SessionSettings) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: DashMap::new(),
                next_instance: AtomicU64::new(1),
                workers: AtomicUsize::new(0),
                settings,
                pipeline,
            }),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    pub fn pipeline(&self) -> &Arc<FramePipeline> {
        &self.inner.pipeline
    }

    /// Create a session and spawn its worker.
    ///
    /// Returns the handle and the receiving end of the session's outbound
    /// channel, which the transport drains. Must be called inside a tokio
    /// runtime.
    pub fn register(
        &self,
        id: SessionId,
    ) -> Result<(SessionHandle, mpsc::Receiver<OutboundMessage>), RegistryError> {
        let vacant = match self.inner.sessions.entry(id.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateSession(id)),
            Entry::Vacant(vacant) => vacant,
        };

        if !self.reserve_worker() {
            return Err(RegistryError::CapacityExceeded {
                limit: self.inner.settings.max_sessions,
            });
        }

        let instance = self.inner.next_instance.fetch_add(1, Ordering::Relaxed);
        let settings = self.inner.settings;

        let (command_tx, command_rx) = mpsc::channel(settings.inbound_capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_capacity.max(1));
        let (close_tx, close_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(SessionStatus::connecting());

        let handle = SessionHandle::new(id.clone(), instance, command_tx, close_tx, status_rx);
        vacant.insert(handle.clone());

        let actor = SessionActor::new(
            id,
            instance,
            self.inner.pipeline.clone(),
            self.clone(),
            ActorChannels {
                commands: command_rx,
                outbound: outbound_tx,
                close_rx,
                status: status_tx,
            },
        );
        tokio::spawn(actor.run());

        Ok((handle, outbound_rx))
    }

    pub fn lookup(&self, id: &SessionId) -> Result<SessionHandle, RegistryError> {
        self.inner
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Remove a session from the live map and tell its worker to stop.
    /// Removing an absent id is a no-op.
    pub fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        let (_, handle) = self.inner.sessions.remove(id)?;
        handle.close(CloseReason::ClientRequest);
        tracing::debug!(session_id = %id, "Session removed from registry");
        Some(handle)
    }

    /// Called by a worker on exit. Only removes the entry if it still
    /// belongs to that worker, so a re-registered id is left alone.
    pub(crate) fn release(&self, id: &SessionId, instance: u64) {
        self.inner
            .sessions
            .remove_if(id, |_, handle| handle.instance() == instance);
        self.inner.workers.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn live_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.inner.sessions.contains_key(id)
    }

    pub fn handles(&self) -> Vec<SessionHandle> {
        self.inner
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut rows: Vec<SessionSnapshot> =
            self.handles().iter().map(SessionHandle::snapshot).collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    /// Live sessions with no frame activity for longer than `timeout`.
    pub fn idle_sessions(&self, timeout: Duration) -> Vec<SessionHandle> {
        self.handles()
            .into_iter()
            .filter(|handle| handle.idle_for() > timeout)
            .collect()
    }

    /// Close every live session and wait for the workers to finish.
    pub async fn close_all(&self, reason: CloseReason) -> usize {
        let handles = self.handles();
        for handle in &handles {
            handle.close(reason);
        }
        for handle in &handles {
            handle.closed().await;
        }
        tracing::info!(count = handles.len(), reason = %reason, "Closed all sessions");
        handles.len()
    }

    fn reserve_worker(&self) -> bool {
        let max = self.inner.settings.max_sessions;
        self.inner
            .workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }
}
