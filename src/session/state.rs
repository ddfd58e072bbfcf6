//! Session state machine and explicit session data.
//!
//! [`SessionPhase`] models the recording lifecycle as one enumerated state
//! with a table of valid transitions; commands arriving in a phase where
//! they are not legal are rejected by the controller.
//!
//! [`SessionData`] gathers everything a session produces or selects — the
//! recorded container buffer, the user-selected file and the report
//! filename — into a single structure with a defined
//! [`reset`](SessionData::reset) operation.

use crate::api::AudioSource;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Phases of a capture session.
///
/// ```text
/// Idle ──start──▶ Acquiring ──stream ok──▶ Recording ──stop──▶ Finalizing
///   ▲                  │                                           │
///   │                  └──device error──▶ Failed                   │
///   └──────────────── reset / immediate ◀──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session active; ready to start.
    #[default]
    Idle,
    /// Device stream requested; waiting for acquisition to succeed or fail.
    Acquiring,
    /// Stream live; chunks are flowing into the accumulator.
    Recording,
    /// Stream detached; flatten → quantize → container write in progress.
    Finalizing,
    /// Device acquisition failed.  Terminal for this session; a reset
    /// returns to `Idle`.
    Failed,
}

impl SessionPhase {
    /// Validity table for phase transitions.
    ///
    /// Any phase may transition to `Idle` — that is the reset path, which
    /// must work regardless of current state.
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (_, Idle)
                | (Idle, Acquiring)
                | (Acquiring, Recording)
                | (Acquiring, Failed)
                | (Recording, Finalizing)
        )
    }

    /// Returns `true` while the session holds (or is acquiring) the device.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Acquiring | SessionPhase::Recording | SessionPhase::Finalizing
        )
    }

    /// A short human-readable label for the UI status line.
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Acquiring => "Acquiring microphone",
            SessionPhase::Recording => "Recording",
            SessionPhase::Finalizing => "Finalizing",
            SessionPhase::Failed => "Microphone error",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionData
// ---------------------------------------------------------------------------

/// Everything the current session has produced or selected.
///
/// The recorded buffer is retained across failed analysis attempts so the
/// user can retry without re-recording; it is discarded only on
/// [`reset`](Self::reset) or when a new recording replaces it.
#[derive(Debug, Default)]
pub struct SessionData {
    /// The encoded container buffer from the last completed recording.
    pub recording: Option<Vec<u8>>,
    /// Duration of that recording in seconds.
    pub recording_secs: f32,
    /// A user-selected audio file (original name + raw bytes), used in
    /// place of the recording when present.
    pub selected_file: Option<(String, Vec<u8>)>,
    /// Report filename returned by the last successful analysis.
    pub pdf_filename: Option<String>,
}

impl SessionData {
    /// Returns `true` when an audio source is available for analysis.
    pub fn is_ready(&self) -> bool {
        self.recording.is_some() || self.selected_file.is_some()
    }

    /// The audio that would be submitted — a selected file takes priority
    /// over the recording.
    pub fn audio_source(&self) -> Option<AudioSource> {
        if let Some((name, bytes)) = &self.selected_file {
            return Some(AudioSource::File {
                name: name.clone(),
                bytes: bytes.clone(),
            });
        }
        self.recording
            .as_ref()
            .map(|wav| AudioSource::Recording(wav.clone()))
    }

    /// Drop all session artifacts.
    pub fn reset(&mut self) {
        self.recording = None;
        self.recording_secs = 0.0;
        self.selected_file = None;
        self.pdf_filename = None;
    }
}

// ---------------------------------------------------------------------------
// Elapsed-time display
// ---------------------------------------------------------------------------

/// Format a duration in whole seconds as the `MM:SS` recording timer.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
