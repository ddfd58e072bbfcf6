//! Application entry point — VoiceScreen.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the backend client ([`BackendClient`]) from config.
//! 5. Create channels (session command/event, backend command/result).
//! 6. Spawn the capture controller on its own thread.
//! 7. Spawn the backend network task on the tokio runtime and queue an
//!    initial health probe.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use voicescreen::{
    api::{Analyzer, BackendClient},
    app::{run_backend, BackendCommand, BackendResult, VoiceScreenApp},
    config::AppConfig,
    session::{SessionController, SessionEvent},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([440.0, 640.0])
        .with_min_inner_size([380.0, 480.0]);

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("VoiceScreen starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime for the network task
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Backend client
    let analyzer: Arc<dyn Analyzer> = Arc::new(BackendClient::from_config(&config.backend));

    // 5. Channels
    let (session_event_tx, session_event_rx) = std::sync::mpsc::channel::<SessionEvent>();
    let (backend_tx, backend_cmd_rx) = mpsc::channel::<BackendCommand>(16);
    let (backend_result_tx, backend_result_rx) = mpsc::channel::<BackendResult>(32);

    // 6. Capture controller thread (owns the cpal stream)
    let session_tx = SessionController::spawn(config.audio.clone(), session_event_tx);

    // 7. Backend network task + initial health probe
    rt.spawn(run_backend(analyzer, backend_cmd_rx, backend_result_tx));
    if backend_tx.try_send(BackendCommand::CheckHealth).is_err() {
        log::warn!("could not queue initial health probe");
    }

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = VoiceScreenApp::new(
        session_tx,
        session_event_rx,
        backend_tx,
        backend_result_rx,
        config.clone(),
    );
    let options = native_options(&config);

    eframe::run_native(
        "VoiceScreen",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
