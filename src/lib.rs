//! VoiceScreen — desktop client for voice-based health screening.
//!
//! Records a voice sample from the microphone (or takes an existing audio
//! file), packages it as a 16-bit mono WAV, and submits it together with
//! patient details to a classification backend.  Results, including a PDF
//! report, are surfaced in an egui window.
//!
//! # Module map
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`audio`] | Capture, chunk accumulation, quantization, WAV container |
//! | [`session`] | Recording state machine and controller thread |
//! | [`api`] | Backend HTTP client and data model |
//! | [`config`] | Settings, defaults, TOML persistence, paths |
//! | [`app`] | egui application and the backend network task |

pub mod api;
pub mod app;
pub mod audio;
pub mod config;
pub mod session;
