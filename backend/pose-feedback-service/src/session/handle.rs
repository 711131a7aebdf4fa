use super::commands::SessionCommand;
use super::state::{CloseReason, SessionId, SessionSnapshot, SessionState, SessionStatus};
use crate::pipeline::FramePayload;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("session backlog full")]
    Backlog,

    #[error("session closed")]
    Closed,
}

/// Cloneable reference to a live session worker.
///
/// Handles never touch the worker's counters directly; they send commands
/// and read the status the worker publishes.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    instance: u64,
    commands: mpsc::Sender<SessionCommand>,
    close_tx: Arc<watch::Sender<Option<CloseReason>>>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        instance: u64,
        commands: mpsc::Sender<SessionCommand>,
        close_tx: watch::Sender<Option<CloseReason>>,
        status: watch::Receiver<SessionStatus>,
    ) -> Self {
        Self {
            id,
            instance,
            commands,
            close_tx: Arc::new(close_tx),
            status,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    /// Queue a frame without waiting. Rejected frames never get a sequence
    /// number.
    pub fn submit_frame(&self, payload: FramePayload) -> Result<(), SubmitError> {
        if self.close_reason().is_some() {
            return Err(SubmitError::Closed);
        }
        self.commands
            .try_send(SessionCommand::Frame {
                payload,
                received_at: Instant::now(),
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => SubmitError::Backlog,
                TrySendError::Closed(_) => SubmitError::Closed,
            })
    }

    /// Queue a frame, waiting for room in the backlog.
    pub async fn enqueue_frame(&self, payload: FramePayload) -> Result<(), SubmitError> {
        if self.close_reason().is_some() {
            return Err(SubmitError::Closed);
        }
        self.commands
            .send(SessionCommand::Frame {
                payload,
                received_at: Instant::now(),
            })
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Wait until every frame queued so far has been processed and return
    /// the last sequence number.
    pub async fn flush(&self) -> Result<u64, SubmitError> {
        let (responder, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Flush { responder })
            .await
            .map_err(|_| SubmitError::Closed)?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Ask the worker to close. The first reason wins; returns whether this
    /// call set it.
    pub fn close(&self, reason: CloseReason) -> bool {
        self.close_tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        *self.close_tx.borrow()
    }

    /// Resolves once the worker has released its registry entry.
    pub async fn closed(&self) {
        let mut status = self.status.clone();
        let _ = status
            .wait_for(|s| s.state == SessionState::Closed)
            .await;
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> SessionState {
        self.status().state
    }

    pub fn last_sequence_processed(&self) -> u64 {
        self.status().last_sequence_processed
    }

    pub fn idle_for(&self) -> Duration {
        self.status().last_activity.elapsed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.status();
        SessionSnapshot {
            id: self.id.clone(),
            state: status.state,
            last_sequence_processed: status.last_sequence_processed,
            idle_secs: status.last_activity.elapsed().as_secs(),
        }
    }
}
