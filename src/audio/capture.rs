//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Unlike a
//! general-purpose recorder it requests one fixed configuration — mono,
//! 44 100 Hz, 4096-sample buffers — and fails acquisition outright when the
//! platform refuses it; there is no resampling or format negotiation.
//!
//! Call [`AudioCapture::start`] to begin streaming sample chunks over an
//! mpsc channel.  The returned [`StreamHandle`] is a RAII guard — dropping
//! it stops the underlying cpal stream and releases the device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring or starting the audio capture.
///
/// All of these are fatal to the current session only; the controller
/// surfaces them to the UI and returns to idle without retrying.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream immediately.
/// The controller holds exactly one per session and drops it on stop or
/// reset, so the device is released exactly once.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use voicescreen::audio::AudioCapture;
///
/// let (tx, rx) = mpsc::channel::<Vec<f32>>();
/// let capture = AudioCapture::new(44_100, 4096).unwrap();
/// let _handle = capture.start(tx).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl AudioCapture {
    /// Acquire the system default input device, configured for mono capture
    /// at `sample_rate` Hz with fixed `chunk_size`-sample buffers.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available.
    /// An unsupported configuration surfaces later, from
    /// [`start`](Self::start), as a build-stream error.
    pub fn new(sample_rate: u32, chunk_size: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        log::info!(
            "using audio input device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".into())
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(chunk_size),
        };

        Ok(Self { device, config })
    }

    /// Start capturing and send each delivered chunk to `tx`.
    ///
    /// The cpal callback runs on a dedicated audio thread; every time the
    /// hardware delivers a buffer the raw `f32` samples are forwarded over
    /// the channel in arrival order.  Send errors (receiver dropped) are
    /// silently ignored so the audio thread never panics.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the requested configuration.
    pub fn start(&self, tx: mpsc::Sender<Vec<f32>>) -> Result<StreamHandle, CaptureError> {
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(data.to_vec());
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Sample rate the stream was configured with, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
