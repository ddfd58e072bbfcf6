//! Append-only chunk accumulator for `f32` audio samples.
//!
//! The cpal callback delivers small fixed-size sample chunks while a
//! recording session is active; [`ChunkBuffer`] stores them in arrival order
//! and never reorders or drops any of them.  The device delivery path is
//! authoritative — there is no backpressure.  At stop time the whole session
//! is flattened into a single contiguous signal for encoding.
//!
//! # Example
//!
//! ```rust
//! use voicescreen::audio::ChunkBuffer;
//!
//! let mut buf = ChunkBuffer::new();
//! buf.push(vec![1.0, 2.0]);
//! buf.push(vec![3.0]);
//! assert_eq!(buf.flatten(), vec![1.0, 2.0, 3.0]);
//! ```

// ---------------------------------------------------------------------------
// ChunkBuffer
// ---------------------------------------------------------------------------

/// Ordered sequence of sample chunks, append-only during a session.
///
/// Chunk lengths are not validated — whatever the audio subsystem delivers
/// is accepted, and lengths may differ across calls (the final chunk of a
/// session is commonly shorter than the configured size).
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<f32>>,
    /// Total number of samples across all chunks (kept incrementally so
    /// `len()` is O(1)).
    total_samples: usize,
}

impl ChunkBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` to the end of the buffer, taking ownership.
    ///
    /// O(1) amortized; no side effects beyond the in-memory mutation.
    pub fn push(&mut self, chunk: Vec<f32>) {
        self.total_samples += chunk.len();
        self.chunks.push(chunk);
    }

    /// Discard all chunks.  Called at the start of a new session and on
    /// full state reset.
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.total_samples = 0;
    }

    /// Concatenate all chunks into one contiguous signal, in arrival order.
    ///
    /// The result's length equals the sum of all chunk lengths.  The buffer
    /// itself is left untouched; the controller calls [`reset`](Self::reset)
    /// separately when the session ends.
    pub fn flatten(&self) -> Vec<f32> {
        let mut signal = Vec::with_capacity(self.total_samples);
        for chunk in &self.chunks {
            signal.extend_from_slice(chunk);
        }
        signal
    }

    /// Total number of samples currently stored.
    pub fn len(&self) -> usize {
        self.total_samples
    }

    /// Returns `true` when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    /// Number of chunks received so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Current recording duration in seconds, assuming `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Ordering / concatenation ------------------------------------------

    #[test]
    fn flatten_preserves_arrival_order() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1.0, 2.0, 3.0]);
        buf.push(vec![4.0, 5.0]);
        buf.push(vec![6.0]);

        assert_eq!(buf.flatten(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn len_is_sum_of_chunk_lengths() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![0.0; 4096]);
        buf.push(vec![0.0; 4096]);
        buf.push(vec![0.0; 137]); // short final chunk

        assert_eq!(buf.len(), 4096 + 4096 + 137);
        assert_eq!(buf.chunk_count(), 3);
        assert_eq!(buf.flatten().len(), buf.len());
    }

    #[test]
    fn tolerates_non_uniform_chunk_lengths() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![0.1]);
        buf.push(vec![0.2, 0.3, 0.4, 0.5]);
        buf.push(vec![]);
        buf.push(vec![0.6, 0.7]);

        assert_eq!(buf.chunk_count(), 4);
        assert_eq!(buf.flatten(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]);
    }

    #[test]
    fn empty_chunk_does_not_affect_len() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![]);
        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 1);
    }

    // ---- Reset semantics ----------------------------------------------------

    #[test]
    fn reset_clears_everything() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1.0, 2.0]);
        buf.reset();

        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 0);
        assert_eq!(buf.flatten(), Vec::<f32>::new());
    }

    #[test]
    fn reusable_after_reset() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1.0]);
        buf.reset();
        buf.push(vec![9.0]);

        assert_eq!(buf.flatten(), vec![9.0]);
    }

    // ---- Empty session ------------------------------------------------------

    #[test]
    fn empty_buffer_flattens_to_empty_signal() {
        let buf = ChunkBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.flatten(), Vec::<f32>::new());
    }

    // ---- Duration helper ----------------------------------------------------

    #[test]
    fn duration_secs_calculation() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![0.0; 22_050]);
        // 22050 samples at 44.1 kHz = 0.5 seconds
        assert!((buf.duration_secs(44_100) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn duration_secs_zero_rate_is_zero() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![0.0; 100]);
        assert_eq!(buf.duration_secs(0), 0.0);
    }
}
