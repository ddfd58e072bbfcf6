//! VoiceScreen desktop window — egui/eframe application.
//!
//! # Architecture
//!
//! [`VoiceScreenApp`] is the top-level [`eframe::App`] that owns the UI
//! state and three channel endpoints:
//!
//! * `session_tx` — sends [`SessionCommand`] to the capture controller
//!   thread.
//! * `session_rx` — receives [`SessionEvent`] (ticks, readout frames, the
//!   finalized container buffer) from the controller.
//! * `backend_tx` / `backend_rx` — commands to and results from the async
//!   network task ([`run_backend`]) driving the classification server.
//!
//! All receivers are drained non-blocking once per frame; the UI never
//! waits on a channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::api::{AnalysisReport, Analyzer, AudioSource, PatientInfo, Prediction, ValidationError};
use crate::config::{AppConfig, AppPaths};
use crate::session::{format_elapsed, SessionCommand, SessionData, SessionEvent, SessionPhase};

// ---------------------------------------------------------------------------
// Backend task message types
// ---------------------------------------------------------------------------

/// Commands sent from the UI thread to the backend network task.
#[derive(Debug)]
pub enum BackendCommand {
    /// Submit audio + patient fields to `/analyze`.
    Analyze {
        source: AudioSource,
        patient: PatientInfo,
    },
    /// Fetch the PDF report for a completed analysis and write it to
    /// `dest_dir`.
    DownloadReport {
        pdf_filename: String,
        dest_dir: PathBuf,
    },
    /// Probe the server's `/health` endpoint.
    CheckHealth,
}

/// Results delivered from the backend network task to the UI.
#[derive(Debug)]
pub enum BackendResult {
    AnalysisComplete(AnalysisReport),
    AnalysisFailed { message: String },
    ReportSaved { path: PathBuf },
    ReportFailed { message: String },
    /// Health probe outcome; `online` is false on any transport error.
    Health { online: bool, detail: String },
}

/// Async loop driving the [`Analyzer`] from UI commands.
///
/// Runs on the tokio runtime; one command at a time, results sent back over
/// `result_tx`.  Taking the analyzer as `Arc<dyn Analyzer>` keeps the loop
/// testable against a mock without a running server.
pub async fn run_backend(
    analyzer: Arc<dyn Analyzer>,
    mut command_rx: mpsc::Receiver<BackendCommand>,
    result_tx: mpsc::Sender<BackendResult>,
) {
    while let Some(cmd) = command_rx.recv().await {
        match cmd {
            BackendCommand::Analyze { source, patient } => {
                let result = match analyzer.analyze(source, &patient).await {
                    Ok(report) => BackendResult::AnalysisComplete(report),
                    Err(e) => BackendResult::AnalysisFailed {
                        message: e.to_string(),
                    },
                };
                let _ = result_tx.send(result).await;
            }

            BackendCommand::DownloadReport {
                pdf_filename,
                dest_dir,
            } => {
                let result = match analyzer.download_report(&pdf_filename).await {
                    Ok(bytes) => match save_report(&dest_dir, &pdf_filename, &bytes) {
                        Ok(path) => BackendResult::ReportSaved { path },
                        Err(e) => BackendResult::ReportFailed {
                            message: format!("could not save the report: {e}"),
                        },
                    },
                    Err(e) => BackendResult::ReportFailed {
                        message: e.to_string(),
                    },
                };
                let _ = result_tx.send(result).await;
            }

            BackendCommand::CheckHealth => {
                let result = match analyzer.health().await {
                    Ok(health) => BackendResult::Health {
                        online: health.status == "healthy" && health.model_loaded,
                        detail: health.status,
                    },
                    Err(e) => BackendResult::Health {
                        online: false,
                        detail: e.to_string(),
                    },
                };
                let _ = result_tx.send(result).await;
            }
        }
    }
}

/// Write downloaded report bytes under `dest_dir`, creating it as needed.
fn save_report(dest_dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dest_dir)?;
    let path = dest_dir.join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// VoiceScreenApp
// ---------------------------------------------------------------------------

/// eframe application — the VoiceScreen client window.
pub struct VoiceScreenApp {
    // ── Session state ────────────────────────────────────────────────────
    /// Capture phase as last reported by (or optimistically ahead of) the
    /// controller thread.
    phase: SessionPhase,
    /// Recording / selection / report artifacts of the current session.
    session: SessionData,
    /// Elapsed whole seconds of the active recording, from `Tick` events.
    elapsed_secs: u64,

    // ── Readout ──────────────────────────────────────────────────────────
    /// Amplitude bars for the live waveform display.
    waveform: Vec<f32>,
    /// Frequency-bin magnitudes for the live spectrum display.
    spectrum: Vec<f32>,

    // ── Patient form ─────────────────────────────────────────────────────
    patient: PatientInfo,
    /// Validation failures from the last Analyze attempt, shown per field.
    field_errors: Vec<ValidationError>,

    // ── File selection ───────────────────────────────────────────────────
    /// Path typed into the "use an existing file" field.
    file_path_input: String,

    // ── Backend state ────────────────────────────────────────────────────
    /// An analysis request is in flight.
    analyzing: bool,
    /// A report download is in flight.
    downloading: bool,
    report: Option<AnalysisReport>,
    /// Where the last downloaded report was written.
    saved_report_path: Option<PathBuf>,
    /// Health probe outcome; `None` until the first probe answers.
    backend_online: Option<bool>,

    // ── Messages ─────────────────────────────────────────────────────────
    error_message: Option<String>,
    status_message: Option<String>,

    // ── Channels ─────────────────────────────────────────────────────────
    session_tx: std::sync::mpsc::Sender<SessionCommand>,
    session_rx: std::sync::mpsc::Receiver<SessionEvent>,
    backend_tx: mpsc::Sender<BackendCommand>,
    backend_rx: mpsc::Receiver<BackendResult>,

    // ── Configuration ────────────────────────────────────────────────────
    /// Application configuration (read-only after startup).
    pub config: AppConfig,
}

impl VoiceScreenApp {
    /// Create a new [`VoiceScreenApp`] wired to the controller thread and
    /// the backend task.
    pub fn new(
        session_tx: std::sync::mpsc::Sender<SessionCommand>,
        session_rx: std::sync::mpsc::Receiver<SessionEvent>,
        backend_tx: mpsc::Sender<BackendCommand>,
        backend_rx: mpsc::Receiver<BackendResult>,
        config: AppConfig,
    ) -> Self {
        Self {
            phase: SessionPhase::Idle,
            session: SessionData::default(),
            elapsed_secs: 0,
            waveform: Vec::new(),
            spectrum: Vec::new(),
            patient: PatientInfo::default(),
            field_errors: Vec::new(),
            file_path_input: String::new(),
            analyzing: false,
            downloading: false,
            report: None,
            saved_report_path: None,
            backend_online: None,
            error_message: None,
            status_message: None,
            session_tx,
            session_rx,
            backend_tx,
            backend_rx,
            config,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending session events (non-blocking).
    fn poll_session(&mut self) {
        while let Ok(event) = self.session_rx.try_recv() {
            match event {
                SessionEvent::RecordingStarted => {
                    self.phase = SessionPhase::Recording;
                    self.elapsed_secs = 0;
                }
                SessionEvent::Tick { elapsed_secs } => {
                    self.elapsed_secs = elapsed_secs;
                }
                SessionEvent::Readout { bars, spectrum } => {
                    self.waveform = bars;
                    self.spectrum = spectrum;
                }
                SessionEvent::Finalized { wav, duration_secs } => {
                    self.session.recording = Some(wav);
                    self.session.recording_secs = duration_secs;
                    // The fresh recording supersedes any earlier file choice.
                    self.session.selected_file = None;
                    self.phase = SessionPhase::Idle;
                    self.waveform.clear();
                    self.spectrum.clear();
                    self.status_message =
                        Some(format!("Recorded {:.1} s of audio", duration_secs));
                }
                SessionEvent::Failed { message } => {
                    self.phase = SessionPhase::Idle;
                    self.waveform.clear();
                    self.spectrum.clear();
                    self.error_message = Some(message);
                }
            }
        }
    }

    /// Drain all pending backend results (non-blocking).
    fn poll_backend(&mut self) {
        while let Ok(result) = self.backend_rx.try_recv() {
            match result {
                BackendResult::AnalysisComplete(report) => {
                    self.analyzing = false;
                    self.session.pdf_filename = Some(report.pdf_filename.clone());
                    self.report = Some(report);
                    self.error_message = None;
                }
                BackendResult::AnalysisFailed { message } => {
                    self.analyzing = false;
                    self.error_message = Some(message);
                }
                BackendResult::ReportSaved { path } => {
                    self.downloading = false;
                    self.saved_report_path = Some(path);
                }
                BackendResult::ReportFailed { message } => {
                    self.downloading = false;
                    self.error_message = Some(message);
                }
                BackendResult::Health { online, detail } => {
                    self.backend_online = Some(online);
                    if !online {
                        log::warn!("analysis server unavailable: {detail}");
                    }
                }
            }
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────

    fn start_recording(&mut self) {
        self.error_message = None;
        self.status_message = None;
        self.phase = SessionPhase::Acquiring;
        self.elapsed_secs = 0;
        let _ = self.session_tx.send(SessionCommand::Start);
    }

    fn stop_recording(&mut self) {
        self.phase = SessionPhase::Finalizing;
        let _ = self.session_tx.send(SessionCommand::Stop);
    }

    /// Read the typed file path into the session (replacing any previous
    /// selection).  The file is forwarded to the server verbatim, so no
    /// container validation happens here.
    fn load_selected_file(&mut self) {
        let path = PathBuf::from(self.file_path_input.trim());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        match std::fs::read(&path) {
            Ok(bytes) => {
                self.session.selected_file = Some((name.clone(), bytes));
                self.status_message = Some(format!("Loaded {name}"));
                self.error_message = None;
            }
            Err(e) => {
                self.error_message = Some(format!("could not read {}: {e}", path.display()));
            }
        }
    }

    /// Validate the patient form and, if clean, submit the session's audio
    /// for analysis.
    fn submit_analysis(&mut self) {
        match self.patient.validate() {
            Ok(()) => self.field_errors.clear(),
            Err(errors) => {
                self.field_errors = errors;
                return;
            }
        }

        let Some(source) = self.session.audio_source() else {
            self.error_message = Some("record audio or choose a file first".into());
            return;
        };

        self.analyzing = true;
        self.report = None;
        self.saved_report_path = None;
        self.error_message = None;
        let _ = self.backend_tx.try_send(BackendCommand::Analyze {
            source,
            patient: self.patient.clone(),
        });
    }

    fn download_report(&mut self) {
        let Some(pdf_filename) = self.session.pdf_filename.clone() else {
            return;
        };
        self.downloading = true;
        let _ = self.backend_tx.try_send(BackendCommand::DownloadReport {
            pdf_filename,
            dest_dir: AppPaths::new().reports_dir,
        });
    }

    /// Write the recorded container buffer to the reports directory.
    fn export_recording(&mut self) {
        let Some(wav) = self.session.recording.as_deref() else {
            return;
        };
        let dir = AppPaths::new().reports_dir;
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = dir.join(format!("recording_{stamp}.wav"));

        let result = std::fs::create_dir_all(&dir).and_then(|_| std::fs::write(&path, wav));
        match result {
            Ok(()) => self.status_message = Some(format!("Saved {}", path.display())),
            Err(e) => self.error_message = Some(format!("could not save recording: {e}")),
        }
    }

    /// Clear everything and return the controller to idle.
    fn reset_all(&mut self) {
        let _ = self.session_tx.send(SessionCommand::Reset);
        self.phase = SessionPhase::Idle;
        self.session.reset();
        self.elapsed_secs = 0;
        self.waveform.clear();
        self.spectrum.clear();
        self.patient = PatientInfo::default();
        self.field_errors.clear();
        self.file_path_input.clear();
        self.analyzing = false;
        self.downloading = false;
        self.report = None;
        self.saved_report_path = None;
        self.error_message = None;
        self.status_message = None;
    }

    fn field_error(&self, wanted: ValidationError) -> bool {
        self.field_errors.contains(&wanted)
    }

    // ── Panels ────────────────────────────────────────────────────────────

    /// Header row: title plus server status dot.
    fn draw_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("VoiceScreen");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (text, color) = match self.backend_online {
                    Some(true) => ("server online", egui::Color32::from_rgb(80, 200, 120)),
                    Some(false) => ("server offline", egui::Color32::from_rgb(255, 136, 68)),
                    None => ("checking server…", egui::Color32::from_rgb(140, 140, 140)),
                };
                ui.label(egui::RichText::new(text).color(color).size(11.0));
            });
        });
    }

    /// Patient details form with inline validation messages.
    fn draw_patient_form(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Patient details").strong());
        ui.add_space(2.0);

        egui::Grid::new("patient-form")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Name");
                ui.text_edit_singleline(&mut self.patient.name);
                ui.end_row();

                ui.label("Age");
                ui.add(
                    egui::TextEdit::singleline(&mut self.patient.age).desired_width(60.0),
                );
                ui.end_row();

                ui.label("Gender");
                egui::ComboBox::from_id_salt("gender")
                    .selected_text(match self.patient.gender {
                        crate::api::Gender::Unspecified => "select…",
                        crate::api::Gender::Male => "male",
                        crate::api::Gender::Female => "female",
                        crate::api::Gender::Other => "other",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut self.patient.gender,
                            crate::api::Gender::Male,
                            "male",
                        );
                        ui.selectable_value(
                            &mut self.patient.gender,
                            crate::api::Gender::Female,
                            "female",
                        );
                        ui.selectable_value(
                            &mut self.patient.gender,
                            crate::api::Gender::Other,
                            "other",
                        );
                    });
                ui.end_row();
            });

        for err in [
            ValidationError::MissingName,
            ValidationError::InvalidAge,
            ValidationError::MissingGender,
        ] {
            if self.field_error(err) {
                ui.label(
                    egui::RichText::new(err.to_string())
                        .color(egui::Color32::from_rgb(255, 136, 68))
                        .size(11.0),
                );
            }
        }
    }

    /// Recording controls: start/stop button, phase label, timer, readout.
    fn draw_recording_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Voice recording").strong());
        ui.add_space(2.0);

        ui.horizontal(|ui| {
            match self.phase {
                SessionPhase::Idle | SessionPhase::Failed => {
                    if ui.button("● Record").clicked() {
                        self.start_recording();
                    }
                }
                SessionPhase::Recording => {
                    if ui.button("■ Stop").clicked() {
                        self.stop_recording();
                    }
                }
                // Acquiring / Finalizing: transient, no button action.
                _ => {
                    ui.add_enabled(false, egui::Button::new("● Record"));
                }
            }

            ui.label(
                egui::RichText::new(self.phase.label())
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(12.0),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.phase == SessionPhase::Recording {
                    ui.label(
                        egui::RichText::new(format_elapsed(self.elapsed_secs))
                            .color(egui::Color32::from_rgb(255, 140, 140))
                            .size(13.0),
                    );
                }
            });
        });

        if self.phase == SessionPhase::Recording {
            ui.add_space(4.0);
            self.draw_waveform(ui);
            ui.add_space(2.0);
            self.draw_spectrum(ui);
        }

        if let Some(wav_kib) = self.session.recording.as_ref().map(|wav| wav.len() / 1024) {
            ui.add_space(2.0);
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!(
                        "Recording ready — {:.1} s, {} KiB",
                        self.session.recording_secs,
                        wav_kib
                    ))
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(11.0),
                );
                if ui.small_button("Save WAV").clicked() {
                    self.export_recording();
                }
            });
        }
    }

    /// "Use an existing file" row.
    fn draw_file_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Or use an existing audio file").strong());
        ui.add_space(2.0);

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.file_path_input)
                    .hint_text("/path/to/audio.wav")
                    .desired_width(260.0),
            );
            if ui.button("Load").clicked() {
                self.load_selected_file();
            }
        });

        if let Some((name, kib)) = self
            .session
            .selected_file
            .as_ref()
            .map(|(name, bytes)| (name.clone(), bytes.len() / 1024))
        {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("{name} ({} KiB)", kib))
                        .color(egui::Color32::from_rgb(80, 200, 120))
                        .size(11.0),
                );
                if ui.small_button("✕").clicked() {
                    self.session.selected_file = None;
                }
            });
        }
    }

    /// Analyze button plus the result card.
    fn draw_analysis_panel(&mut self, ui: &mut egui::Ui) {
        let ready = self.session.is_ready() && !self.analyzing && !self.phase.is_active();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(ready, egui::Button::new("Analyze voice"))
                .clicked()
            {
                self.submit_analysis();
            }
            if self.analyzing {
                ui.spinner();
                ui.label(
                    egui::RichText::new("analyzing…")
                        .color(egui::Color32::from_rgb(68, 136, 255))
                        .size(12.0),
                );
            }
            if ui.button("Reset").clicked() {
                self.reset_all();
            }
        });

        let Some(report) = self.report.clone() else {
            return;
        };

        ui.add_space(6.0);
        ui.separator();
        ui.add_space(4.0);

        let (headline, color) = match report.prediction {
            Prediction::Healthy => (
                report.prediction.label(),
                egui::Color32::from_rgb(80, 200, 120),
            ),
            Prediction::DiseaseDetected => (
                report.prediction.label(),
                egui::Color32::from_rgb(255, 136, 68),
            ),
        };
        ui.label(egui::RichText::new(headline).color(color).size(16.0).strong());
        ui.label(
            egui::RichText::new(format!("Confidence: {:.1}%", report.confidence * 100.0))
                .size(12.0),
        );

        if let (Some(healthy), Some(parkinsons)) =
            (report.probability_healthy, report.probability_parkinsons)
        {
            ui.label(
                egui::RichText::new(format!(
                    "P(healthy) {:.1}%   P(indicators) {:.1}%",
                    healthy * 100.0,
                    parkinsons * 100.0
                ))
                .color(egui::Color32::from_rgb(160, 160, 160))
                .size(11.0),
            );
        }

        if report.needs_review {
            ui.label(
                egui::RichText::new("Low-confidence result — clinical review recommended")
                    .color(egui::Color32::from_rgb(255, 200, 80))
                    .size(11.0),
            );
        }

        if !report.top_features.is_empty() {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Most influential measures").size(12.0).strong());
            egui::Grid::new("top-features")
                .num_columns(3)
                .spacing([12.0, 2.0])
                .show(ui, |ui| {
                    for feature in &report.top_features {
                        ui.label(egui::RichText::new(&feature.name).size(11.0));
                        ui.label(
                            egui::RichText::new(format!("{:.4}", feature.value)).size(11.0),
                        );
                        ui.label(
                            egui::RichText::new(format!("{:.1}%", feature.importance * 100.0))
                                .color(egui::Color32::from_rgb(140, 140, 140))
                                .size(11.0),
                        );
                        ui.end_row();
                    }
                });
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.downloading, egui::Button::new("Download PDF report"))
                .clicked()
            {
                self.download_report();
            }
            if self.downloading {
                ui.spinner();
            }
        });
        if let Some(path) = &self.saved_report_path {
            ui.label(
                egui::RichText::new(format!("Saved {}", path.display()))
                    .color(egui::Color32::from_rgb(80, 200, 120))
                    .size(11.0),
            );
        }
    }

    /// Error / status banners at the bottom of the window.
    fn draw_messages(&self, ui: &mut egui::Ui) {
        if let Some(msg) = &self.error_message {
            ui.label(
                egui::RichText::new(msg)
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
        }
        if let Some(msg) = &self.status_message {
            ui.label(
                egui::RichText::new(msg)
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .size(11.0),
            );
        }
    }

    // ── Readout painters ─────────────────────────────────────────────────

    /// Draw the amplitude bar chart shown while recording.
    fn draw_waveform(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 28.0),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let num_bars = self.waveform.len().max(1);
        let bar_width = rect.width() / num_bars as f32;

        for (i, &amplitude) in self.waveform.iter().enumerate() {
            let x = rect.left() + i as f32 * bar_width;
            let bar_height = (amplitude * rect.height()).max(2.0);
            let center_y = rect.center().y;

            painter.rect_filled(
                egui::Rect::from_center_size(
                    egui::pos2(x + bar_width / 2.0, center_y),
                    egui::vec2((bar_width * 0.65).max(1.0), bar_height),
                ),
                1.0,
                egui::Color32::from_rgb(80, 200, 120),
            );
        }
    }

    /// Draw the frequency-magnitude bars, anchored to the baseline.
    fn draw_spectrum(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 24.0),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let num_bins = self.spectrum.len().max(1);
        let bar_width = rect.width() / num_bins as f32;

        for (i, &magnitude) in self.spectrum.iter().enumerate() {
            let x = rect.left() + i as f32 * bar_width;
            let bar_height = (magnitude * rect.height()).max(1.0);

            painter.rect_filled(
                egui::Rect::from_min_size(
                    egui::pos2(x + bar_width * 0.2, rect.bottom() - bar_height),
                    egui::vec2((bar_width * 0.6).max(1.0), bar_height),
                ),
                1.0,
                egui::Color32::from_rgb(68, 136, 255),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VoiceScreenApp {
    /// Called every frame by eframe.  Polls channels, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_session();
        self.poll_backend();

        // Keep the timer and readout moving while the controller is busy,
        // and keep polling while network requests are in flight.
        if self.phase.is_active() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else if self.analyzing || self.downloading {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui);
            ui.separator();

            self.draw_patient_form(ui);
            ui.add_space(8.0);

            self.draw_recording_panel(ui);
            ui.add_space(8.0);

            self.draw_file_panel(ui);
            ui.add_space(8.0);
            ui.separator();

            self.draw_analysis_panel(ui);
            ui.add_space(4.0);
            self.draw_messages(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let _ = self.session_tx.send(SessionCommand::Shutdown);
        log::info!("VoiceScreen closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, BackendHealth, TopFeature};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted [`Analyzer`] double; records what it was asked to do.
    struct MockAnalyzer {
        analyze_result: Mutex<Option<Result<AnalysisReport, ApiError>>>,
        report_bytes: Vec<u8>,
        seen_sources: Mutex<Vec<String>>,
    }

    impl MockAnalyzer {
        fn returning(result: Result<AnalysisReport, ApiError>) -> Self {
            Self {
                analyze_result: Mutex::new(Some(result)),
                report_bytes: b"%PDF-1.4 stub".to_vec(),
                seen_sources: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Analyzer for MockAnalyzer {
        async fn analyze(
            &self,
            audio: AudioSource,
            _patient: &PatientInfo,
        ) -> Result<AnalysisReport, ApiError> {
            self.seen_sources
                .lock()
                .unwrap()
                .push(audio.file_name().to_string());
            self.analyze_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::Http(500)))
        }

        async fn download_report(&self, _pdf_filename: &str) -> Result<Vec<u8>, ApiError> {
            Ok(self.report_bytes.clone())
        }

        async fn health(&self) -> Result<BackendHealth, ApiError> {
            Ok(BackendHealth {
                status: "healthy".into(),
                model_loaded: true,
            })
        }
    }

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            prediction: Prediction::Healthy,
            confidence: 0.91,
            top_features: vec![TopFeature {
                name: "jitter".into(),
                value: 0.01,
                importance: 0.3,
            }],
            pdf_filename: "report.pdf".into(),
            probability_healthy: Some(0.91),
            probability_parkinsons: Some(0.09),
            needs_review: false,
        }
    }

    fn patient() -> PatientInfo {
        PatientInfo {
            name: "Jane".into(),
            age: "70".into(),
            gender: crate::api::Gender::Female,
        }
    }

    #[tokio::test]
    async fn analyze_command_yields_report() {
        let analyzer = Arc::new(MockAnalyzer::returning(Ok(sample_report())));
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (res_tx, mut res_rx) = mpsc::channel(4);
        let task = tokio::spawn(run_backend(analyzer.clone(), cmd_rx, res_tx));

        cmd_tx
            .send(BackendCommand::Analyze {
                source: AudioSource::Recording(vec![0; 44]),
                patient: patient(),
            })
            .await
            .unwrap();

        match res_rx.recv().await {
            Some(BackendResult::AnalysisComplete(report)) => {
                assert_eq!(report.pdf_filename, "report.pdf");
            }
            other => panic!("expected analysis result, got {other:?}"),
        }

        // The recording was submitted under its canonical filename.
        assert_eq!(
            *analyzer.seen_sources.lock().unwrap(),
            vec!["recording.wav".to_string()]
        );

        drop(cmd_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn analyze_failure_is_reported_as_message() {
        let analyzer = Arc::new(MockAnalyzer::returning(Err(ApiError::Backend(
            "Error processing audio file".into(),
        ))));
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (res_tx, mut res_rx) = mpsc::channel(4);
        tokio::spawn(run_backend(analyzer, cmd_rx, res_tx));

        cmd_tx
            .send(BackendCommand::Analyze {
                source: AudioSource::Recording(vec![0; 44]),
                patient: patient(),
            })
            .await
            .unwrap();

        match res_rx.recv().await {
            Some(BackendResult::AnalysisFailed { message }) => {
                assert_eq!(message, "Error processing audio file");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_writes_report_to_disk() {
        let analyzer = Arc::new(MockAnalyzer::returning(Ok(sample_report())));
        let dir = tempfile::tempdir().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (res_tx, mut res_rx) = mpsc::channel(4);
        tokio::spawn(run_backend(analyzer, cmd_rx, res_tx));

        cmd_tx
            .send(BackendCommand::DownloadReport {
                pdf_filename: "report.pdf".into(),
                dest_dir: dir.path().join("reports"),
            })
            .await
            .unwrap();

        match res_rx.recv().await {
            Some(BackendResult::ReportSaved { path }) => {
                assert!(path.ends_with("report.pdf"));
                assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 stub");
            }
            other => panic!("expected saved report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn health_probe_reports_online() {
        let analyzer = Arc::new(MockAnalyzer::returning(Ok(sample_report())));
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (res_tx, mut res_rx) = mpsc::channel(4);
        tokio::spawn(run_backend(analyzer, cmd_rx, res_tx));

        cmd_tx.send(BackendCommand::CheckHealth).await.unwrap();

        match res_rx.recv().await {
            Some(BackendResult::Health { online, .. }) => assert!(online),
            other => panic!("expected health result, got {other:?}"),
        }
    }

    fn app_with_channels() -> (
        VoiceScreenApp,
        std::sync::mpsc::Sender<SessionEvent>,
        mpsc::Sender<BackendResult>,
    ) {
        let (session_tx, _session_cmd_rx) = std::sync::mpsc::channel();
        let (session_event_tx, session_event_rx) = std::sync::mpsc::channel();
        let (backend_tx, _backend_cmd_rx) = mpsc::channel(4);
        let (backend_result_tx, backend_result_rx) = mpsc::channel(4);
        let app = VoiceScreenApp::new(
            session_tx,
            session_event_rx,
            backend_tx,
            backend_result_rx,
            AppConfig::default(),
        );
        (app, session_event_tx, backend_result_tx)
    }

    /// A failed analysis must leave the recorded buffer in place so the
    /// user can retry without re-recording.
    #[test]
    fn analysis_failure_retains_recording() {
        let (mut app, _session_events, backend_results) = app_with_channels();
        app.session.recording = Some(vec![1, 2, 3]);
        app.analyzing = true;

        backend_results
            .try_send(BackendResult::AnalysisFailed {
                message: "server unreachable".into(),
            })
            .unwrap();
        app.poll_backend();

        assert!(!app.analyzing);
        assert_eq!(app.error_message.as_deref(), Some("server unreachable"));
        assert_eq!(app.session.recording, Some(vec![1, 2, 3]));
        assert!(app.session.is_ready());
    }

    /// A finished recording replaces any earlier file selection and returns
    /// the UI to idle.
    #[test]
    fn finalized_recording_supersedes_selected_file() {
        let (mut app, session_events, _backend_results) = app_with_channels();
        app.phase = SessionPhase::Finalizing;
        app.session.selected_file = Some(("old.wav".into(), vec![9]));

        session_events
            .send(SessionEvent::Finalized {
                wav: vec![0; 44],
                duration_secs: 2.5,
            })
            .unwrap();
        app.poll_session();

        assert_eq!(app.phase, SessionPhase::Idle);
        assert!(app.session.selected_file.is_none());
        assert_eq!(app.session.recording_secs, 2.5);
        assert!(matches!(
            app.session.audio_source(),
            Some(AudioSource::Recording(_))
        ));
    }

    #[tokio::test]
    async fn backend_loop_exits_when_commands_close() {
        let analyzer = Arc::new(MockAnalyzer::returning(Ok(sample_report())));
        let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(1);
        let (res_tx, _res_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_backend(analyzer, cmd_rx, res_tx));

        drop(cmd_tx);
        task.await.unwrap();
    }
}
