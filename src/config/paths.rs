//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voicescreen\
//!   macOS:   ~/Library/Application Support/voicescreen/
//!   Linux:   ~/.config/voicescreen/
//!
//! Reports dir (downloaded PDFs and exported recordings):
//!   Windows: %USERPROFILE%\Downloads\voicescreen\
//!   macOS:   ~/Downloads/voicescreen/
//!   Linux:   ~/Downloads/voicescreen/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory where downloaded reports and exported WAV files land.
    pub reports_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voicescreen";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");

        let reports_dir = dirs::download_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            config_dir,
            settings_file,
            reports_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
