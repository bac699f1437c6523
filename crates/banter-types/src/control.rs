//! Control-channel payloads received from the agent endpoint.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Participant identity the agent infrastructure uses for its server-side
/// endpoint. Control messages originate from this participant, and its
/// departure is what ends a call.
pub const AGENT_PARTICIPANT: &str = "server";

/// A JSON control message from the agent's data channel.
///
/// Messages are UTF-8 JSON objects discriminated by `event_type`. Unknown
/// discriminators deserialize to [`ServerEvent::Other`] and are dropped;
/// malformed payloads fail to parse and are logged by the session pump,
/// never surfaced as a fatal error.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ServerEvent {
    Update {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    Metadata {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    AgentStartTalking,
    AgentStopTalking,
    NodeTransition {
        #[serde(flatten)]
        data: Map<String, Value>,
    },
    #[serde(other)]
    Other,
}
