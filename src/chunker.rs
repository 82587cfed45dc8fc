// src/chunker.rs
//
// Bounded-memory chunking over a frame source. Whole-video buffering is
// infeasible for long matches, so frames are surfaced in blocks of at most
// `chunk_size` fresh frames. Every block after the first is prefixed with
// the last 2 frames of the previous block so that 3-frame temporal-window
// inference never loses context at a chunk boundary.

use crate::error::Result;

/// Number of trailing frames carried into the next chunk. The ball network
/// consumes frame[i-2..=i], so 2 frames of context are enough.
pub const CHUNK_OVERLAP: usize = 2;

/// Anything that can hand out decoded frames one at a time, in order.
/// Non-restartable; `next_frame` returning `None` is final.
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// One block of frames plus the global index of its first frame.
/// For every chunk after the first, `frames[..CHUNK_OVERLAP]` repeat the
/// tail of the previous chunk and `start_index` points at the first of
/// those repeated frames, so `start_index + i` is always the true 0-based
/// frame number of `frames[i]`.
#[derive(Debug)]
pub struct FrameChunk<F> {
    pub frames: Vec<F>,
    pub start_index: u64,
}

impl<F> FrameChunk<F> {
    /// Index into `frames` of the first frame not already seen in a
    /// previous chunk.
    pub fn fresh_offset(&self) -> usize {
        if self.start_index == 0 {
            0
        } else {
            CHUNK_OVERLAP
        }
    }
}

/// Explicit cursor over a frame source. Holds at most one chunk plus the
/// 2-frame overlap carry; each returned chunk is owned by the caller and
/// released when dropped.
pub struct FrameChunker<S: FrameSource> {
    source: S,
    chunk_size: usize,
    carry: Vec<S::Frame>,
    frames_consumed: u64,
    finished: bool,
}

impl<S: FrameSource> FrameChunker<S>
where
    S::Frame: Clone,
{
    pub fn new(source: S, chunk_size: usize) -> Self {
        assert!(chunk_size > CHUNK_OVERLAP, "chunk size must exceed overlap");
        Self {
            source,
            chunk_size,
            carry: Vec::new(),
            frames_consumed: 0,
            finished: false,
        }
    }

    /// Pull the next chunk. Returns `None` once the source is exhausted;
    /// the final chunk may hold fewer than `chunk_size` fresh frames.
    pub fn next_chunk(&mut self) -> Result<Option<FrameChunk<S::Frame>>> {
        if self.finished {
            return Ok(None);
        }

        let mut frames: Vec<S::Frame> = std::mem::take(&mut self.carry);
        let overlap = frames.len() as u64;
        let start_index = self.frames_consumed - overlap;

        let mut fresh = 0usize;
        while fresh < self.chunk_size {
            match self.source.next_frame()? {
                Some(frame) => {
                    frames.push(frame);
                    fresh += 1;
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }
        self.frames_consumed += fresh as u64;

        if fresh == 0 {
            return Ok(None);
        }

        if !self.finished && frames.len() >= CHUNK_OVERLAP {
            self.carry = frames[frames.len() - CHUNK_OVERLAP..].to_vec();
        }

        Ok(Some(FrameChunk {
            frames,
            start_index,
        }))
    }
}
