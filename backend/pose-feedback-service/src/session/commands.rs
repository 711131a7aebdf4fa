//! Commands accepted by a session worker.

use crate::pipeline::FramePayload;
use std::time::Instant;
use tokio::sync::oneshot;

pub enum SessionCommand {
    /// Run one frame through the pipeline and emit its result.
    Frame {
        payload: FramePayload,
        received_at: Instant,
    },

    /// Answered with the last processed sequence once every frame queued
    /// ahead of it is done.
    Flush { responder: oneshot::Sender<u64> },
}
