//! PCM data model: buffered clips, delivery frames, and the chunker that
//! slices a clip into microphone-cadence windows.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors produced when constructing or slicing PCM buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipError {
    #[error("audio clip contains no samples")]
    Empty,
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
    #[error("chunk duration of {0} ms is shorter than one sample period")]
    ChunkTooShort(u128),
}

/// An immutable, fully-materialized mono PCM16 audio buffer.
///
/// Owned by the caller; the client only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Result<Self, ClipError> {
        if sample_rate == 0 {
            return Err(ClipError::ZeroSampleRate);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Exact playback duration of the clip.
    pub fn duration(&self) -> Duration {
        duration_of(self.samples.len(), self.sample_rate)
    }
}

/// One frame of PCM delivered into a track sink, or received from the
/// remote agent's track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn duration(&self) -> Duration {
        duration_of(self.samples.len(), self.sample_rate)
    }
}

/// A borrowed fixed-duration window of a clip.
///
/// Chunks are ephemeral: produced by [`chunk_clip`], converted to an owned
/// [`AudioFrame`] at the moment of delivery, and never retained.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub samples: &'a [i16],
    pub sample_rate: u32,
}

impl Chunk<'_> {
    pub fn to_frame(&self) -> AudioFrame {
        AudioFrame {
            samples: self.samples.to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        duration_of(self.samples.len(), self.sample_rate)
    }
}

/// Number of samples in one chunk of `chunk` duration at `sample_rate`,
/// rounded down.
pub fn samples_per_chunk(sample_rate: u32, chunk: Duration) -> usize {
    (sample_rate as u128 * chunk.as_millis() / 1000) as usize
}

/// Splits `clip` into ordered chunks that cover it exactly once.
///
/// Every chunk spans `chunk` worth of samples except the final one, which is
/// shorter when the clip length is not an exact multiple. Concatenating the
/// chunks in order reproduces the clip's sample sequence exactly. Pure
/// function of its inputs; an empty clip is rejected rather than yielding an
/// empty sequence.
pub fn chunk_clip(
    clip: &AudioClip,
    chunk: Duration,
) -> Result<impl Iterator<Item = Chunk<'_>>, ClipError> {
    if clip.is_empty() {
        return Err(ClipError::Empty);
    }
    let size = samples_per_chunk(clip.sample_rate(), chunk);
    if size == 0 {
        return Err(ClipError::ChunkTooShort(chunk.as_millis()));
    }
    let sample_rate = clip.sample_rate();
    Ok(clip.samples().chunks(size).map(move |samples| Chunk {
        samples,
        sample_rate,
    }))
}

fn duration_of(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_nanos(samples as u64 * 1_000_000_000 / sample_rate as u64)
}
