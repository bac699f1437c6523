//! Caller-supplied configuration for one call session.

use banter_types::DEFAULT_SAMPLE_RATE;
use secrecy::{ExposeSecret, SecretString};

/// A configuration problem detected before any connection is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("access token must not be empty")]
    MissingAccessToken,
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
}

/// Options accepted by [`crate::CallClient::start_call`].
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Credential presented to the agent infrastructure when connecting.
    pub access_token: SecretString,
    /// Capture and playback rate for the session, in Hz. Simulated audio
    /// must already be at this rate; resampling is the caller's job.
    pub sample_rate: u32,
    /// Capture device selector, forwarded to the room collaborator.
    pub capture_device_id: Option<String>,
    /// Playback device selector, forwarded to the room collaborator.
    pub playback_device_id: Option<String>,
    /// Emit an `audio` notification for every frame of remote audio.
    pub emit_raw_audio: bool,
    /// Replace live microphone capture with a synthetic source, enabling
    /// [`crate::CallClient::send_audio_clip`].
    pub simulate_microphone: bool,
}

impl CallConfig {
    pub fn new(access_token: impl Into<SecretString>) -> Self {
        Self {
            access_token: access_token.into(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            capture_device_id: None,
            playback_device_id: None,
            emit_raw_audio: false,
            simulate_microphone: false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.expose_secret().is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(())
    }
}
