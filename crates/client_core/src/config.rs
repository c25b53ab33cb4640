use std::{fs, path::Path};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Origin of the dashboard web server, e.g. `http://localhost:7070`.
    pub server_url: String,
    /// `chrono` format string used for offline players' "last seen" column.
    pub last_seen_format: String,
    /// Capacity of the view-change broadcast and of the channel adapter queue.
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:7070".into(),
            last_seen_format: "%Y-%m-%d %H:%M".into(),
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    last_seen_format: Option<String>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if it exists, then environment
/// variables looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.server_url {
                    settings.server_url = v;
                }
                if let Some(v) = file_cfg.last_seen_format {
                    settings.last_seen_format = v;
                }
                if let Some(v) = file_cfg.event_capacity {
                    settings.event_capacity = v;
                }
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__LAST_SEEN_FORMAT") {
        settings.last_seen_format = v;
    }

    if let Some(v) = env("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }

    settings.server_url = settings.server_url.trim_end_matches('/').to_string();
    settings.event_capacity = settings.event_capacity.max(1);
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
