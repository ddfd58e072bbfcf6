//! Audio capture-and-encode pipeline — microphone → chunk accumulation →
//! PCM quantization → WAV container.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → chunk (mpsc) → ChunkBuffer
//!           └─ WaveformData / SpectrumData (cosmetic readout)
//!
//! on stop:  ChunkBuffer::flatten → quantize → write_wav → Vec<u8>
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use voicescreen::audio::{quantize, write_wav, ChunkBuffer};
//!
//! let mut buf = ChunkBuffer::new();
//! buf.push(vec![0.5, -0.5]);
//! let wav = write_wav(&quantize(&buf.flatten()), 44_100);
//! assert_eq!(wav.len(), 44 + 4);
//! ```

pub mod buffer;
pub mod capture;
pub mod encode;
pub mod wav;
pub mod waveform;

pub use buffer::ChunkBuffer;
pub use capture::{AudioCapture, CaptureError, StreamHandle};
pub use encode::quantize;
pub use wav::{write_wav, HEADER_LEN};
pub use waveform::{SpectrumData, WaveformData};
