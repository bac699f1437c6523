//! Error taxonomy for call operations.

use crate::config::ConfigError;
use crate::media::MediaError;
use crate::room::RoomError;
use banter_types::clip::ClipError;
use std::time::Duration;

/// Errors surfaced by [`crate::CallClient`] operations.
///
/// Setup and precondition failures are returned before any resource is
/// created. Failures inside a send operation are returned from that call
/// after the unconditional teardown has run; they are never broadcast as a
/// session-level `error` notification.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Clip(#[from] ClipError),

    #[error("room error: {0}")]
    Room(#[from] RoomError),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("no call is in progress")]
    NotConnected,

    #[error("a call is already starting or in progress")]
    AlreadyStarted,

    #[error("call was started with a live microphone; no synthetic audio source exists")]
    SimulationDisabled,

    #[error("clip is {clip} Hz but the session runs at {session} Hz; resample before sending")]
    SampleRateMismatch { clip: u32, session: u32 },

    #[error("playback did not complete within {0:?}")]
    Timeout(Duration),
}
