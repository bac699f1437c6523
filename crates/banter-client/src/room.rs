//! Seam to the managed real-time media room.
//!
//! The room collaborator owns the transport: connection handshake, codec
//! negotiation, NAT traversal, and remote-track subscription. The client
//! drives it exclusively through these traits and never looks inside.
//! Embedding applications supply the implementation; tests supply an
//! in-memory one.

use crate::config::CallConfig;
use crate::media::AudioFeed;
use async_trait::async_trait;
use banter_types::clip::AudioFrame;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle for a local track the room currently publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPublication {
    /// Transport-assigned identifier, used to unpublish.
    pub sid: String,
    /// The name the track was published under.
    pub name: String,
}

/// A failure reported by the room collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("failed to connect to the session: {0}")]
    Connect(String),
    #[error("failed to publish track: {0}")]
    Publish(String),
    #[error("failed to unpublish track: {0}")]
    Unpublish(String),
    #[error("microphone control failed: {0}")]
    Microphone(String),
    #[error("room is closed")]
    Closed,
}

/// Notifications pushed by the room while the session is alive.
///
/// The room closes its event channel when the session is torn down; the
/// client treats a closed channel like a disconnect.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A remote participant's track became subscribed.
    TrackSubscribed { participant: String },
    /// A decoded frame of remote audio.
    Audio { participant: String, frame: AudioFrame },
    /// A data-channel payload from a remote participant.
    Data { participant: String, payload: Bytes },
    /// A remote participant left the session.
    ParticipantDisconnected { identity: String },
    /// The transport dropped; the session is gone.
    Disconnected { reason: String },
}

/// Establishes room sessions against the agent infrastructure.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    /// Connects with the credential and device selection in `config` and
    /// returns the live session handle plus its event stream.
    async fn connect(
        &self,
        config: &CallConfig,
    ) -> Result<(Arc<dyn RoomHandle>, mpsc::UnboundedReceiver<RoomEvent>), RoomError>;
}

/// One live room session.
#[async_trait]
pub trait RoomHandle: Send + Sync {
    /// Enables or disables live microphone capture.
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), RoomError>;

    /// Publishes a local audio track that plays whatever arrives on `feed`.
    /// The room keeps the feed until the track has finished playing out,
    /// then drops it.
    async fn publish_audio_track(
        &self,
        name: &str,
        feed: AudioFeed,
    ) -> Result<TrackPublication, RoomError>;

    /// Removes a previously published track from the transport.
    async fn unpublish_track(&self, sid: &str) -> Result<(), RoomError>;

    /// Resumes deferred audio playback, for platforms with autoplay-style
    /// output policies.
    async fn start_audio(&self) -> Result<(), RoomError>;

    /// Tears the transport down and closes the event channel. Idempotent.
    async fn close(&self);
}
