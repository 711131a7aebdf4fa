//! Session engine: one worker task per live stream, a concurrent registry
//! keyed by session id, and an idle reaper.

mod actor;
pub mod commands;
pub mod handle;
pub mod reaper;
pub mod registry;
pub mod state;

pub use handle::{SessionHandle, SubmitError};
pub use reaper::IdleReaper;
pub use registry::{RegistryError, SessionRegistry, SessionSettings};
pub use state::{CloseReason, SessionId, SessionSnapshot, SessionState, SessionStatus};
