//! Synthetic audio graph backing the simulated microphone.
//!
//! The graph is the session-owned stand-in for a capture pipeline: it mints
//! one [`SyntheticSource`] per send operation and hands the matching
//! [`AudioFeed`] to the room for publication. Frames written to a source
//! travel over a bounded channel, so a stalled transport pushes back on the
//! writer instead of buffering without limit.

use banter_types::clip::AudioFrame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};

/// Frames buffered between a source and the room before backpressure applies.
const SINK_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The session has stopped and its graph was closed.
    #[error("audio graph is closed")]
    GraphClosed,
    /// The source's sink is gone, either detached by teardown or dropped by
    /// the transport.
    #[error("synthetic source is detached")]
    SourceDetached,
}

/// Session-owned factory for synthetic sources and unique track names.
///
/// Closed exactly once, on full session stop — never mid-send. Creating a
/// source afterwards fails, which is what stops a late send from touching a
/// dead session.
pub struct AudioGraph {
    sample_rate: u32,
    closed: AtomicBool,
    track_seq: AtomicU64,
}

impl AudioGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            closed: AtomicBool::new(false),
            track_seq: AtomicU64::new(0),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Mints a fresh source and the feed the room will consume. One source
    /// per send operation; chunks share the source so they form a single
    /// continuous track.
    pub fn create_source(&self) -> Result<(SyntheticSource, AudioFeed), MediaError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(MediaError::GraphClosed);
        }
        let (frames_tx, frames_rx) = mpsc::channel(SINK_DEPTH);
        let (playout_tx, playout_rx) = oneshot::channel();
        let source = SyntheticSource {
            sample_rate: self.sample_rate,
            sink: Mutex::new(Some(frames_tx)),
            playout: Mutex::new(Some(playout_rx)),
        };
        let feed = AudioFeed {
            frames: frames_rx,
            _playout: playout_tx,
        };
        Ok((source, feed))
    }

    /// Name for the next simulated publication, unique for the lifetime of
    /// the session. A new name per publication avoids colliding with a
    /// previous track the transport has not fully released yet.
    pub fn next_track_name(&self) -> String {
        let seq = self.track_seq.fetch_add(1, Ordering::Relaxed);
        format!("simulated-audio-{seq}")
    }

    /// Closes the graph and resets the track-name counter. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.track_seq.store(0, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// A synthetic audio producer standing in for a live microphone.
///
/// Created at the start of one send operation and detached at its end, on
/// success and failure alike. The source owns the sending half of its sink;
/// the room owns the receiving half for as long as the track plays.
pub struct SyntheticSource {
    sample_rate: u32,
    sink: Mutex<Option<mpsc::Sender<AudioFrame>>>,
    playout: Mutex<Option<oneshot::Receiver<()>>>,
}

impl SyntheticSource {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Delivers one frame into the sink, waiting when the transport's buffer
    /// is full.
    pub async fn feed(&self, frame: AudioFrame) -> Result<(), MediaError> {
        let sink = self
            .sink
            .lock()
            .await
            .clone()
            .ok_or(MediaError::SourceDetached)?;
        sink.send(frame)
            .await
            .map_err(|_| MediaError::SourceDetached)
    }

    /// Ends the track's content by closing the sink. The room plays out what
    /// it already buffered and then drops the feed. Idempotent.
    pub async fn detach(&self) {
        self.sink.lock().await.take();
    }

    /// Resolves once the room has finished with the feed and dropped it —
    /// the transport-side signal that playback completed.
    pub async fn played_out(&self) -> Result<(), MediaError> {
        let playout = self
            .playout
            .lock()
            .await
            .take()
            .ok_or(MediaError::SourceDetached)?;
        // A dropped feed reads as an error on the oneshot; either way the
        // room is done with the track.
        let _ = playout.await;
        Ok(())
    }
}

/// Receiving half of a synthetic source's sink, handed to the room when the
/// track is published. Dropping the feed signals playout completion back to
/// the source.
pub struct AudioFeed {
    frames: mpsc::Receiver<AudioFrame>,
    _playout: oneshot::Sender<()>,
}

impl AudioFeed {
    /// Next frame of synthetic audio, or `None` once the source detaches.
    pub async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.recv().await
    }
}
