//! Session worker
//!
//! One task per live session. Frames arrive through a bounded mpsc channel and
//! are processed strictly one at a time, so a session's results leave in the
//! order its frames arrived. The close signal is checked between frames; a
//! frame that has already started is finished and its result emitted.

use super::commands::SessionCommand;
use super::registry::SessionRegistry;
use super::state::{CloseReason, SessionId, SessionState, SessionStatus};
use crate::metrics;
use crate::pipeline::{FramePayload, FramePipeline};
use crate::websocket::OutboundMessage;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

pub(crate) struct SessionActor {
    id: SessionId,
    instance: u64,
    pipeline: Arc<FramePipeline>,
    registry: SessionRegistry,
    commands: mpsc::Receiver<SessionCommand>,
    outbound: mpsc::Sender<OutboundMessage>,
    close_rx: watch::Receiver<Option<CloseReason>>,
    status: watch::Sender<SessionStatus>,
    sequence: u64,
}

pub(crate) struct ActorChannels {
    pub commands: mpsc::Receiver<SessionCommand>,
    pub outbound: mpsc::Sender<OutboundMessage>,
    pub close_rx: watch::Receiver<Option<CloseReason>>,
    pub status: watch::Sender<SessionStatus>,
}

impl SessionActor {
    pub(crate) fn new(
        id: SessionId,
        instance: u64,
        pipeline: Arc<FramePipeline>,
        registry: SessionRegistry,
        channels: ActorChannels,
    ) -> Self {
        Self {
            id,
            instance,
            pipeline,
            registry,
            commands: channels.commands,
            outbound: channels.outbound,
            close_rx: channels.close_rx,
            status: channels.status,
            sequence: 0,
        }
    }

    /// Run until closed, then release the registry entry.
    pub(crate) async fn run(mut self) {
        self.transition(SessionState::Active);
        metrics::session_opened();
        tracing::info!(session_id = %self.id, "Session started");

        let started = OutboundMessage::session_started(&self.id);
        let reason = match self.deliver(started).await {
            Ok(()) => self.serve().await,
            Err(reason) => reason,
        };

        self.shutdown(reason);
    }

    async fn serve(&mut self) -> CloseReason {
        loop {
            let command = tokio::select! {
                biased;
                reason = close_signal(&mut self.close_rx) => return reason,
                command = self.commands.recv() => command,
            };

            match command {
                Some(SessionCommand::Frame {
                    payload,
                    received_at,
                }) => {
                    if let Err(reason) = self.process_frame(payload, received_at).await {
                        return reason;
                    }
                }
                Some(SessionCommand::Flush { responder }) => {
                    let _ = responder.send(self.sequence);
                }
                None => return CloseReason::ClientDisconnected,
            }
        }
    }

    async fn process_frame(
        &mut self,
        payload: FramePayload,
        received_at: Instant,
    ) -> Result<(), CloseReason> {
        // Every dequeued frame consumes a sequence number, even if it fails.
        self.sequence += 1;
        let sequence = self.sequence;

        let outcome = self.pipeline.process_payload(payload).await;
        metrics::observe_frame(outcome.kind(), received_at.elapsed());
        tracing::debug!(
            session_id = %self.id,
            sequence,
            outcome = outcome.kind(),
            "Frame processed"
        );

        self.status.send_modify(|status| {
            status.last_sequence_processed = sequence;
            status.last_activity = Instant::now();
        });

        self.deliver(OutboundMessage::from_outcome(sequence, outcome))
            .await
    }

    /// Hand a message to the transport, waiting on backpressure unless the
    /// session is told to close meanwhile.
    async fn deliver(&mut self, message: OutboundMessage) -> Result<(), CloseReason> {
        let message = match self.outbound.try_send(message) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Closed(_)) => return Err(CloseReason::TransportFailure),
            Err(TrySendError::Full(message)) => message,
        };

        tokio::select! {
            biased;
            sent = self.outbound.send(message) => {
                sent.map_err(|_| CloseReason::TransportFailure)
            }
            reason = close_signal(&mut self.close_rx) => Err(reason),
        }
    }

    fn shutdown(mut self, reason: CloseReason) {
        // An explicitly requested reason wins over what the loop observed.
        let requested = *self.close_rx.borrow();
        let reason = requested.unwrap_or(reason);

        self.transition(SessionState::Closing);

        self.commands.close();
        let mut abandoned = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            match command {
                SessionCommand::Frame { .. } => abandoned += 1,
                SessionCommand::Flush { responder } => {
                    let _ = responder.send(self.sequence);
                }
            }
        }

        let _ = self
            .outbound
            .try_send(OutboundMessage::SessionClosed { reason });

        self.registry.release(&self.id, self.instance);
        metrics::session_closed(reason);
        tracing::info!(
            session_id = %self.id,
            reason = %reason,
            last_sequence = self.sequence,
            abandoned_frames = abandoned,
            "Session closed"
        );

        self.transition(SessionState::Closed);
    }

    fn transition(&self, next: SessionState) {
        let id = &self.id;
        self.status.send_if_modified(|status| {
            if !status.state.can_transition_to(next) {
                tracing::debug!(
                    session_id = %id,
                    from = status.state.as_str(),
                    to = next.as_str(),
                    "Ignoring invalid session transition"
                );
                return false;
            }
            status.state = next;
            true
        });
    }
}

/// Resolves once a close reason is published. A dropped sender counts as
/// the client going away.
async fn close_signal(rx: &mut watch::Receiver<Option<CloseReason>>) -> CloseReason {
    loop {
        let current = *rx.borrow_and_update();
        if let Some(reason) = current {
            return reason;
        }
        if rx.changed().await.is_err() {
            let last = *rx.borrow();
            return last.unwrap_or(CloseReason::ClientDisconnected);
        }
    }
}
