//! Settings file location and loading.

use shared::settings::AppSettings;
use std::fs;
use std::path::{Path, PathBuf};

/// `<config_dir>/data_helper/settings.json`
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Data Helper", "data_helper")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Settings from `path`, or defaults when the file is missing or unreadable.
///
/// The second value describes a file that exists but could not be used. It is
/// returned rather than logged because loading runs before logging is set up.
pub fn load_settings_or_default(path: Option<&Path>) -> (AppSettings, Option<String>) {
    let Some(path) = path else {
        return (AppSettings::default(), None);
    };
    if !path.exists() {
        return (AppSettings::default(), None);
    }

    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<AppSettings>(&bytes) {
            Ok(settings) => (settings, None),
            Err(e) => (
                AppSettings::default(),
                Some(format!("Ignoring invalid settings at {}: {}", path.display(), e)),
            ),
        },
        Err(e) => (
            AppSettings::default(),
            Some(format!("Could not read settings at {}: {}", path.display(), e)),
        ),
    }
}
