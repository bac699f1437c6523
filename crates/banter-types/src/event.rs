//! Public notification surface emitted over a call session's event channel.

use crate::clip::AudioFrame;
use serde::Serialize;
use serde_json::{Map, Value};

/// Notifications a call session emits to its subscribers.
///
/// The serialized form is a compatibility contract: embedding applications
/// forward these to their own UI layers, so the `type` tag and payload
/// shapes must stay stable.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallEvent {
    /// The transport session is established.
    CallStarted,
    /// The agent's audio track is subscribed; audio can now flow both ways.
    CallReady,
    /// The session ended. Emitted exactly once per call.
    CallEnded,
    /// The remote agent began speaking.
    AgentStartTalking,
    /// The remote agent stopped speaking.
    AgentStopTalking,
    /// A raw frame of remote audio. Emitted continuously, and only when
    /// raw-sample emission was enabled at call start.
    Audio { frame: AudioFrame },
    /// Structured live-session state from the agent (transcript and the like).
    Update { data: Map<String, Value> },
    /// Session metadata pushed by the agent infrastructure.
    Metadata { data: Map<String, Value> },
    /// The agent moved between conversation nodes.
    NodeTransition { data: Map<String, Value> },
    /// A session-level failure. Mid-send failures are returned from the
    /// failing call instead and do not appear here.
    Error { message: String },
}
