pub mod clip;
pub mod control;
pub mod event;

/// Capture and playback rate the agent infrastructure expects, in Hz.
///
/// All simulated audio handed to the client must already be at the session's
/// configured rate; callers resample beforehand if their material differs.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
