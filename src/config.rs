use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// On-disk layout: everything lives under a single `[settings]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: Settings,
}

/// Run-time options. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum occurrence count for a word or pseudo-label to be reported.
    pub min_frequency: u64,
    /// Count lines made only of `。` or `？` separately from words.
    pub enable_punctuation_stats: bool,
    pub wordcloud_max_words: usize,
    pub wordcloud_width: u32,
    pub wordcloud_height: u32,
    pub wordcloud_background_color: String,
    pub font_path: String,
    pub show_wordcloud: bool,
    pub save_wordcloud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_frequency: 20,
            enable_punctuation_stats: true,
            wordcloud_max_words: 200,
            wordcloud_width: 1200,
            wordcloud_height: 800,
            wordcloud_background_color: "white".to_string(),
            font_path: "C:/Windows/Fonts/simhei.ttf".to_string(),
            show_wordcloud: true,
            save_wordcloud: true,
        }
    }
}

/// Load settings from `path`, degrading to defaults on any problem.
///
/// A missing file is created with the defaults; a malformed one is left alone.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        info!("Config not found, using defaults - path={}", path.display());
        let settings = Settings::default();
        match write_settings(path, &settings) {
            Ok(()) => info!("Default config created - path={}", path.display()),
            Err(e) => warn!("Could not persist default config - {}", e),
        }
        return settings;
    }

    match read_settings(path) {
        Ok(settings) => {
            info!("Config loaded - path={}", path.display());
            debug!("Effective settings: {:?}", settings);
            settings
        }
        Err(e) => {
            warn!("Config unreadable, using defaults - {}", e);
            Settings::default()
        }
    }
}

pub fn read_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.settings)
}

pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let file = ConfigFile {
        settings: settings.clone(),
    };
    let body = toml::to_string_pretty(&file)?;
    fs::write(path, body).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `--create-config`: write the default config unless one already exists.
pub fn create_default_config(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.exists() {
        info!("Config already exists, leaving it untouched - path={}", path.display());
        return Ok(path.to_path_buf());
    }
    write_settings(path, &Settings::default())?;
    info!("Default config created - path={}", path.display());
    Ok(path.to_path_buf())
}
