//! Paced delivery of buffered clips onto a freshly published track.
//!
//! The chunked path is what makes a simulated send look like a live
//! microphone: the track is published once, given a settle delay so the
//! remote signal-detection pipeline can initialize, and then fed one
//! 20 ms chunk at a time at real-time offsets. Dumping the whole clip at
//! once would defeat the agent's voice-activity detection.

use crate::error::CallError;
use crate::lifecycle::TrackLifecycle;
use crate::media::{AudioGraph, SyntheticSource};
use crate::room::RoomHandle;
use banter_types::clip::{AudioClip, AudioFrame, ClipError, chunk_clip};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

/// Timing knobs for simulated playback.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Duration of one fed chunk; matches live microphone cadence.
    pub chunk: Duration,
    /// Pause between publishing the track and the first chunk. The remote
    /// voice-activity detector needs this warm-up on a brand-new track;
    /// content arriving earlier gets missed.
    pub settle: Duration,
    /// Margin appended after the clip has fully played out.
    pub tail: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            chunk: Duration::from_millis(20),
            settle: Duration::from_millis(300),
            tail: Duration::from_millis(150),
        }
    }
}

/// Safety margin added to a clip's duration to bound the whole-buffer wait.
const PLAYOUT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Publishes one simulated utterance per call and paces its content.
pub struct PacedPublisher {
    room: Arc<dyn RoomHandle>,
    graph: Arc<AudioGraph>,
    lifecycle: Arc<TrackLifecycle>,
    pacing: PacingConfig,
}

impl PacedPublisher {
    pub fn new(
        room: Arc<dyn RoomHandle>,
        graph: Arc<AudioGraph>,
        lifecycle: Arc<TrackLifecycle>,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            room,
            graph,
            lifecycle,
            pacing,
        }
    }

    /// Sends `clip` as a progressively fed stream of fixed-duration chunks.
    ///
    /// Resolves only after the settle delay, the clip's full duration, and
    /// the tail margin have elapsed. On any failure the operation is
    /// rejected, and on every outcome the track is torn down.
    pub async fn send_chunked(&self, clip: &AudioClip) -> Result<(), CallError> {
        // Validate before any resource exists; a rejected clip must leave
        // no trace on the transport.
        chunk_clip(clip, self.pacing.chunk).map(|_| ())?;
        let result = self.run_chunked(clip).await;
        self.lifecycle.teardown().await;
        result
    }

    /// Sends the clip as one pre-buffered unit: a single settle delay, the
    /// entire clip in one piece, then a wait for the transport to finish
    /// playing it out, bounded by the clip duration plus a safety margin.
    ///
    /// Prefer [`send_chunked`](Self::send_chunked); a clip delivered all at
    /// once is easy prey for the remote turn-taking logic. This mode exists
    /// for tests that only care that the audio arrived.
    pub async fn send_buffered(&self, clip: &AudioClip) -> Result<(), CallError> {
        if clip.is_empty() {
            return Err(ClipError::Empty.into());
        }
        let deadline = clip.duration() + PLAYOUT_TIMEOUT_MARGIN;
        let result = match time::timeout(deadline, self.run_buffered(clip)).await {
            Ok(result) => result,
            Err(_) => Err(CallError::Timeout(deadline)),
        };
        self.lifecycle.teardown().await;
        result
    }

    async fn run_chunked(&self, clip: &AudioClip) -> Result<(), CallError> {
        let source = self.prepare_track().await?;
        let first_chunk_at = Instant::now() + self.pacing.settle;
        let mut fed = 0u32;
        for chunk in chunk_clip(clip, self.pacing.chunk)? {
            // Absolute deadlines from one start instant; chained relative
            // sleeps accumulate drift over a multi-second clip.
            time::sleep_until(first_chunk_at + self.pacing.chunk * fed).await;
            source.feed(chunk.to_frame()).await?;
            fed += 1;
        }
        debug!(chunks = fed, duration = ?clip.duration(), "clip fully scheduled");
        // The final chunk may be shorter than the nominal duration, so wait
        // out the clip's exact length rather than a whole extra chunk.
        time::sleep_until(first_chunk_at + clip.duration() + self.pacing.tail).await;
        Ok(())
    }

    async fn run_buffered(&self, clip: &AudioClip) -> Result<(), CallError> {
        let source = self.prepare_track().await?;
        time::sleep(self.pacing.settle).await;
        source
            .feed(AudioFrame {
                samples: clip.samples().to_vec(),
                sample_rate: clip.sample_rate(),
            })
            .await?;
        source.detach().await;
        source.played_out().await?;
        Ok(())
    }

    /// Retires any previous publication, then creates exactly one source and
    /// publishes exactly one track for this operation.
    async fn prepare_track(&self) -> Result<Arc<SyntheticSource>, CallError> {
        self.lifecycle.retire_active().await;
        let (source, feed) = self.graph.create_source()?;
        let source = Arc::new(source);
        let name = self.graph.next_track_name();
        let publication = self.room.publish_audio_track(&name, feed).await?;
        debug!(track = %publication.name, sid = %publication.sid, "published simulated audio track");
        self.lifecycle.register(publication, source.clone()).await;
        Ok(source)
    }
}
