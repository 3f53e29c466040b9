use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "TRANSLIT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Application settings, read from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Install a log subscriber at all.
    pub log: bool,
    /// Log to stderr instead of `log_dir`.
    pub show_log: bool,
    pub dictionaries_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Dictionary used when none is given on the command line.
    pub default_dictionary: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log: true,
            show_log: false,
            dictionaries_dir: PathBuf::from("dictionaries"),
            log_dir: PathBuf::from("temp").join("logs"),
            default_dictionary: "default.json".to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Reads settings from `path`. A missing or broken file yields the
    /// defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("settings file {:?} not read ({}), using defaults", path, e);
                return Settings::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("settings file {:?} is invalid ({}), using defaults", path, e);
                Settings::default()
            }
        }
    }

    /// Writes pretty JSON through a temp file and a rename.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(self)?)?;
        fs::rename(&temp_path, path)?;
        info!("saved settings to {:?}", path);
        Ok(())
    }

    /// Resolves a dictionary name: existing paths are used as given, anything
    /// else is looked up in `dictionaries_dir`.
    pub fn resolve_dictionary(&self, name: &str) -> PathBuf {
        let direct = Path::new(name);
        if direct.exists() {
            direct.to_path_buf()
        } else {
            self.dictionaries_dir.join(name)
        }
    }
}
