//! Capture session controller — owns the device stream lifecycle.
//!
//! `cpal::Stream` is not `Send`, so the controller runs on its own thread
//! and owns every stream it acquires.  The UI talks to it over a
//! [`SessionCommand`] channel and drains [`SessionEvent`]s non-blocking on
//! each frame.
//!
//! Per session the controller:
//!
//! 1. acquires the microphone (mono, fixed rate, fixed chunk size);
//! 2. resets the accumulator and arms chunk delivery;
//! 3. on stop, disarms delivery **before** anything else (chunks arriving
//!    after the stop is processed are excluded), drops the stream handle
//!    (releasing the device exactly once), then flattens → quantizes →
//!    writes the container and emits the finished byte buffer.
//!
//! A cosmetic analysis tap rides on the same chunk stream: the accumulator
//! thread computes waveform and spectrum snapshots per chunk and emits them
//! as events.  Errors on that path are ignored — the readout must never
//! affect the encoded output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{quantize, write_wav, AudioCapture, ChunkBuffer, SpectrumData, StreamHandle,
    WaveformData};
use crate::config::CaptureConfig;

use super::state::SessionPhase;

/// Bars in the waveform snapshot sent to the UI.
const WAVEFORM_BARS: usize = 30;
/// Bins in the spectrum snapshot sent to the UI.
const SPECTRUM_BINS: usize = 32;

// ---------------------------------------------------------------------------
// Commands / events
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the controller thread.
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    /// Begin a new recording session (Idle → Acquiring).
    Start,
    /// Stop the active recording and finalize the container buffer.
    Stop,
    /// Forcibly release any held device stream and return to Idle.
    Reset,
    /// Terminate the controller thread (application exit).
    Shutdown,
}

/// Events delivered from the controller (and its accumulator thread) to
/// the UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Stream acquired; chunks are flowing.
    RecordingStarted,
    /// Once-per-second elapsed-time tick while recording.
    Tick { elapsed_secs: u64 },
    /// Live readout snapshot, sent per delivered chunk.
    Readout { bars: Vec<f32>, spectrum: Vec<f32> },
    /// Recording finished; the container byte buffer is ready.
    Finalized { wav: Vec<u8>, duration_secs: f32 },
    /// Device acquisition failed.  Fatal to this session only.
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Resources held while a session is active.
///
/// Dropping `stream` releases the hardware; `armed` gates the accumulator.
struct ActiveSession {
    stream: StreamHandle,
    armed: Arc<AtomicBool>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    accumulator: thread::JoinHandle<()>,
    started_at: Instant,
    last_tick_secs: u64,
}

/// Controller state machine, driven by [`SessionCommand`]s on a dedicated
/// thread.
pub struct SessionController {
    config: CaptureConfig,
    event_tx: Sender<SessionEvent>,
    phase: SessionPhase,
    active: Option<ActiveSession>,
}

impl SessionController {
    /// Spawn the controller thread.  Returns the command sender; the thread
    /// exits when it receives [`SessionCommand::Shutdown`] or when all
    /// command senders are dropped.
    pub fn spawn(config: CaptureConfig, event_tx: Sender<SessionEvent>) -> Sender<SessionCommand> {
        let (command_tx, command_rx) = mpsc::channel();

        thread::Builder::new()
            .name("session-controller".into())
            .spawn(move || {
                let mut controller = SessionController {
                    config,
                    event_tx,
                    phase: SessionPhase::Idle,
                    active: None,
                };
                controller.run(command_rx);
            })
            .expect("failed to spawn session-controller thread");

        command_tx
    }

    /// Command loop.  While recording, waits with a 250 ms timeout so the
    /// per-second tick and the max-duration guard stay responsive; otherwise
    /// blocks until the next command.
    fn run(&mut self, command_rx: Receiver<SessionCommand>) {
        loop {
            let cmd = if self.phase == SessionPhase::Recording {
                match command_rx.recv_timeout(Duration::from_millis(250)) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => {
                        self.on_timer();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match command_rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                }
            };

            match cmd {
                Some(SessionCommand::Start) => self.handle_start(),
                Some(SessionCommand::Stop) => self.handle_stop(),
                Some(SessionCommand::Reset) => self.handle_reset(),
                Some(SessionCommand::Shutdown) | None => break,
            }
        }

        // Release any held device on the way out.
        self.release_active();
        log::info!("session controller shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    fn handle_start(&mut self) {
        if !self.transition(SessionPhase::Acquiring) {
            return;
        }

        let capture = match AudioCapture::new(self.config.sample_rate, self.config.chunk_size) {
            Ok(capture) => capture,
            Err(e) => {
                self.fail(format!("{e}"));
                return;
            }
        };

        let armed = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<f32>>();

        let accumulator = {
            let armed = Arc::clone(&armed);
            let buffer = Arc::clone(&buffer);
            let events = self.event_tx.clone();
            thread::Builder::new()
                .name("session-accumulator".into())
                .spawn(move || run_accumulator(chunk_rx, armed, buffer, events))
                .expect("failed to spawn session-accumulator thread")
        };

        let stream = match capture.start(chunk_tx) {
            Ok(handle) => handle,
            Err(e) => {
                // The accumulator exits on its own once chunk_tx is dropped.
                self.fail(format!("{e}"));
                let _ = accumulator.join();
                return;
            }
        };

        self.active = Some(ActiveSession {
            stream,
            armed,
            buffer,
            accumulator,
            started_at: Instant::now(),
            last_tick_secs: 0,
        });
        self.transition(SessionPhase::Recording);
        let _ = self.event_tx.send(SessionEvent::RecordingStarted);
        log::info!(
            "recording started ({} Hz, {}-sample chunks)",
            self.config.sample_rate,
            self.config.chunk_size
        );
    }

    fn handle_stop(&mut self) {
        if !self.transition(SessionPhase::Finalizing) {
            return;
        }

        let Some(active) = self.active.take() else {
            // Finalizing was accepted, so an active session must exist.
            log::error!("finalize requested with no active session");
            self.transition(SessionPhase::Idle);
            return;
        };

        // Detach first: chunks delivered from here on are excluded.
        active.armed.store(false, Ordering::SeqCst);
        // Release the hardware immediately, not deferred.
        drop(active.stream);
        // The callback (and its sender) are gone; wait for the accumulator
        // to drain what was already in flight before the detach.
        let _ = active.accumulator.join();

        let (signal, duration_secs) = {
            let buf = active.buffer.lock().unwrap();
            (buf.flatten(), buf.duration_secs(self.config.sample_rate))
        };

        let wav = write_wav(&quantize(&signal), self.config.sample_rate);
        log::info!(
            "recording finalized: {:.1} s, {} samples, {} bytes",
            duration_secs,
            signal.len(),
            wav.len()
        );

        let _ = self.event_tx.send(SessionEvent::Finalized { wav, duration_secs });
        self.transition(SessionPhase::Idle);
    }

    fn handle_reset(&mut self) {
        self.release_active();
        self.transition(SessionPhase::Idle);
    }

    /// Per-second tick and max-duration guard, evaluated while recording.
    fn on_timer(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let elapsed_secs = active.started_at.elapsed().as_secs();
        if elapsed_secs > active.last_tick_secs {
            active.last_tick_secs = elapsed_secs;
            let _ = self.event_tx.send(SessionEvent::Tick { elapsed_secs });
        }

        if elapsed_secs >= u64::from(self.config.max_recording_secs) {
            log::warn!("recording auto-stopped after {elapsed_secs} s (max duration)");
            self.handle_stop();
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Apply a phase transition if the table allows it; otherwise log and
    /// leave the state untouched.
    fn transition(&mut self, next: SessionPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            log::warn!("rejected transition {:?} → {:?}", self.phase, next);
            return false;
        }
        log::debug!("session {:?} → {:?}", self.phase, next);
        self.phase = next;
        true
    }

    fn fail(&mut self, message: String) {
        log::error!("device acquisition failed: {message}");
        self.transition(SessionPhase::Failed);
        let _ = self.event_tx.send(SessionEvent::Failed { message });
        // Failed is Idle-equivalent apart from the surfaced message.
        self.transition(SessionPhase::Idle);
    }

    /// Disarm and drop any held stream, exactly once.
    fn release_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.armed.store(false, Ordering::SeqCst);
            drop(active.stream);
            let _ = active.accumulator.join();
            log::info!("device stream released");
        }
    }
}

// ---------------------------------------------------------------------------
// Accumulator thread
// ---------------------------------------------------------------------------

/// Drain delivered chunks into the shared buffer while `armed`, and emit a
/// readout snapshot per chunk.  Exits when the chunk channel disconnects
/// (stream handle dropped).
fn run_accumulator(
    chunk_rx: Receiver<Vec<f32>>,
    armed: Arc<AtomicBool>,
    buffer: Arc<Mutex<ChunkBuffer>>,
    events: Sender<SessionEvent>,
) {
    while let Ok(chunk) = chunk_rx.recv() {
        if !armed.load(Ordering::SeqCst) {
            continue;
        }

        // Cosmetic readout — computed before the move, failures ignored.
        let bars = WaveformData::compute(&chunk, WAVEFORM_BARS).bars;
        let spectrum = SpectrumData::compute(&chunk, SPECTRUM_BINS).bins;
        let _ = events.send(SessionEvent::Readout { bars, spectrum });

        buffer.lock().unwrap().push(chunk);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_accumulator(
        armed: &Arc<AtomicBool>,
        buffer: &Arc<Mutex<ChunkBuffer>>,
    ) -> (Sender<Vec<f32>>, Receiver<SessionEvent>, thread::JoinHandle<()>) {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = {
            let armed = Arc::clone(armed);
            let buffer = Arc::clone(buffer);
            thread::spawn(move || run_accumulator(chunk_rx, armed, buffer, event_tx))
        };
        (chunk_tx, event_rx, handle)
    }

    #[test]
    fn accumulator_appends_chunks_in_order() {
        let armed = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let (tx, _events, handle) = spawn_accumulator(&armed, &buffer);

        tx.send(vec![1.0, 2.0]).unwrap();
        tx.send(vec![3.0]).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(buffer.lock().unwrap().flatten(), vec![1.0, 2.0, 3.0]);
    }

    /// Chunks delivered after the stop action is processed (armed flag
    /// cleared) must be excluded from the session.
    #[test]
    fn chunks_after_disarm_are_excluded() {
        let armed = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let (tx, _events, handle) = spawn_accumulator(&armed, &buffer);

        tx.send(vec![1.0]).unwrap();
        tx.send(vec![2.0]).unwrap();

        // Wait until both chunks are in before disarming, then deliver one
        // more that must be dropped.
        while buffer.lock().unwrap().chunk_count() < 2 {
            thread::yield_now();
        }
        armed.store(false, Ordering::SeqCst);
        tx.send(vec![3.0]).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(buffer.lock().unwrap().flatten(), vec![1.0, 2.0]);
    }

    #[test]
    fn accumulator_emits_readout_per_chunk() {
        let armed = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let (tx, events, handle) = spawn_accumulator(&armed, &buffer);

        tx.send(vec![0.5; 4096]).unwrap();
        drop(tx);
        handle.join().unwrap();

        match events.try_recv() {
            Ok(SessionEvent::Readout { bars, spectrum }) => {
                assert_eq!(bars.len(), WAVEFORM_BARS);
                assert_eq!(spectrum.len(), SPECTRUM_BINS);
            }
            other => panic!("expected Readout event, got {other:?}"),
        }
    }

    /// A dropped event receiver must not stop accumulation — the readout is
    /// cosmetic.
    #[test]
    fn readout_failure_does_not_affect_accumulation() {
        let armed = Arc::new(AtomicBool::new(true));
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let (tx, events, handle) = spawn_accumulator(&armed, &buffer);
        drop(events); // kill the readout path

        tx.send(vec![1.0, 2.0]).unwrap();
        tx.send(vec![3.0]).unwrap();
        drop(tx);
        handle.join().unwrap();

        assert_eq!(buffer.lock().unwrap().flatten(), vec![1.0, 2.0, 3.0]);
    }

    /// Stop/Shutdown in Idle must be rejected without side effects, and the
    /// controller must exit cleanly on Shutdown.
    #[test]
    fn stop_in_idle_is_rejected_and_shutdown_exits() {
        let (event_tx, event_rx) = mpsc::channel();
        let command_tx = SessionController::spawn(CaptureConfig::default(), event_tx);

        command_tx.send(SessionCommand::Stop).unwrap();
        command_tx.send(SessionCommand::Shutdown).unwrap();

        // No Finalized (or any other) event may arrive from the rejected stop.
        assert!(event_rx
            .recv_timeout(Duration::from_millis(500))
            .is_err());
    }

    #[test]
    fn reset_in_idle_is_a_no_op() {
        let (event_tx, event_rx) = mpsc::channel();
        let command_tx = SessionController::spawn(CaptureConfig::default(), event_tx);

        command_tx.send(SessionCommand::Reset).unwrap();
        command_tx.send(SessionCommand::Shutdown).unwrap();

        assert!(event_rx
            .recv_timeout(Duration::from_millis(500))
            .is_err());
    }
}
