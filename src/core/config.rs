use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

use super::alerts::loader::AlertPaths;

/// Plugin toggles, persisted as `settings.json` in the config folder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub enable: bool,
    /// Run the per-tick modifier pass on the blocking pool.
    pub enable_multithreading: bool,
    pub show_path_alerts: bool,
    /// By default this covers things such as corrupting blood.
    pub show_beast_alerts: bool,
    pub show_mod_alerts: bool,
    pub play_sounds_for_alerts: bool,
    /// Plugin folder with the bundled rule files and `sounds/`.
    pub plugin_dir: PathBuf,
    /// Folder for user overrides of the rule files.
    pub config_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable: true,
            enable_multithreading: true,
            show_path_alerts: true,
            show_beast_alerts: false,
            show_mod_alerts: false,
            play_sounds_for_alerts: true,
            plugin_dir: PathBuf::from("plugin"),
            config_dir: PathBuf::from("config").join("ProximityAlert"),
        }
    }
}

impl Settings {
    pub fn alert_paths(&self) -> AlertPaths {
        AlertPaths::new(self.plugin_dir.clone(), self.config_dir.clone())
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!("Ignoring malformed {:?}: {}", self.config_path, e),
                },
                Err(e) => log::warn!("Unable to read {:?}: {}", self.config_path, e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
