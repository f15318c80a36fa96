//! Settings file loading.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use convoy_core::AppConfig;
use convoy_rendering::SurfaceLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while turning a settings file into configuration.
#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    /// The file could not be read.
    #[error("failed to read settings file {}", path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file was not valid TOML for the settings schema.
    #[error("failed to parse settings file {}", path.display())]
    Parse {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying parser failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Window presentation knobs that only matter to the visual adapter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WindowSettings {
    /// On-screen size of a grid cell in pixels.
    pub(crate) cell_pixels: f32,
    /// Synchronises presentation with the display refresh rate.
    pub(crate) vsync: bool,
    /// Logs frame timing once per second.
    pub(crate) show_fps: bool,
    /// Shows the status panel at start-up.
    pub(crate) status_panel: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            cell_pixels: SurfaceLayout::DEFAULT_CELL_PIXELS,
            vsync: true,
            show_fps: false,
            status_panel: true,
        }
    }
}

/// Complete contents of a settings file; every table is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Settings {
    /// Simulator configuration read from the top-level tables.
    pub(crate) app: AppConfig,
    /// Window presentation knobs read from `[window]`.
    pub(crate) window: WindowSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WindowTable {
    window: WindowSettings,
}

/// Loads settings from `path`, or the defaults when no file is given.
pub(crate) fn load(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<Settings, SettingsError> {
    let parse_error = |source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let app: AppConfig = toml::from_str(text).map_err(parse_error)?;
    let WindowTable { window } = toml::from_str(text).map_err(parse_error)?;
    Ok(Settings { app, window })
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::{Mode, RulePreset};

    #[test]
    fn partial_files_fill_in_defaults() {
        let text = r#"
            mode = "cyclic"

            [audio]
            volume = 0.8

            [simulation.life]
            rules = "B3/S23"

            [window]
            vsync = false
        "#;
        let settings = parse(text, Path::new("convoy.toml")).expect("valid settings");
        assert_eq!(settings.app.mode, Mode::Cyclic);
        assert_eq!(settings.app.audio.volume, 0.8);
        assert!(settings.app.audio.muted);
        assert_eq!(settings.app.simulation.life.rules, RulePreset::Life.rules());
        assert!(!settings.window.vsync);
        assert_eq!(settings.window.cell_pixels, SurfaceLayout::DEFAULT_CELL_PIXELS);
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let text = "[simulation.life]\nrules = \"B9/S23\"\n";
        let error = parse(text, Path::new("bad.toml")).expect_err("rule digits above 8");
        assert!(matches!(error, SettingsError::Parse { .. }));
        assert!(error.to_string().contains("bad.toml"));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = load(Some(Path::new("/nonexistent/convoy.toml"))).expect_err("missing file");
        assert!(matches!(error, SettingsError::Read { .. }));
        assert_eq!(
            error.to_string(),
            "failed to read settings file /nonexistent/convoy.toml"
        );
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(load(None).expect("defaults"), Settings::default());
    }
}
