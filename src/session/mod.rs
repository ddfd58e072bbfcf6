//! Capture session orchestration — state machine, controller thread, and
//! session data.
//!
//! ```text
//! UI ──SessionCommand──▶ SessionController (own thread, owns cpal stream)
//!    ◀──SessionEvent───  │
//!                        └─▶ accumulator thread → ChunkBuffer + readout
//! ```

pub mod controller;
pub mod state;

pub use controller::{SessionCommand, SessionController, SessionEvent};
pub use state::{format_elapsed, SessionData, SessionPhase};
