//! Banter realtime voice client.
//!
//! This crate joins a live voice session with a remote conversational agent,
//! exchanges audio with it, and can substitute a synthetic source for the
//! microphone so that end-to-end tests drive a call with pre-recorded
//! speech. The transport itself (connection handshake, codec negotiation,
//! track subscription) is a managed room collaborator reached through the
//! traits in [`room`]; this crate never owns a socket.
//!
//! The heart of the crate is the simulated-microphone pipeline: a buffered
//! clip is sliced into microphone-cadence chunks and fed onto a freshly
//! published track at real-time offsets, so the stream is indistinguishable
//! from live speech to the agent's voice-activity detection.

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod publisher;
pub mod room;

pub use banter_types::clip::{AudioClip, AudioFrame};
pub use banter_types::event::CallEvent;
pub use client::CallClient;
pub use config::CallConfig;
pub use error::CallError;
