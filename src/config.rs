use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::{OutputType, ReadOptions};
use crate::strip::{StripOptions, DEFAULT_KEYS_TO_KEEP};

/// Top-level configuration for the exif-tree batch tools.
///
/// Controls how images are read and written, which keys survive a strip,
/// and output behavior (dry run, backups).
///
/// # Loading
///
/// ```rust,no_run
/// use exif_tree::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.strip.keys_to_keep.push("{IPTC}".into());
/// config.output.dry_run = true;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How properties are read from and written to image files.
    pub codec: CodecConfig,
    /// Which top-level keys survive `--strip`.
    pub strip: StripConfig,
    /// Output behavior (dry run, backups).
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Forwarded to the codec with every read.
    pub should_cache: bool,
    /// `"source"` or a container type identifier such as `"public.jpeg"`.
    pub output_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    pub keys_to_keep: Vec<String>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, report what would change without modifying any files.
    pub dry_run: bool,
    /// If `true`, create a `.bak` backup before modifying an image.
    pub backup_originals: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            should_cache: false,
            output_type: OutputType::Source.name().to_string(),
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            keys_to_keep: DEFAULT_KEYS_TO_KEEP.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup_originals: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codec: CodecConfig::default(),
            strip: StripConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.output_type()?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            should_cache: self.codec.should_cache,
        }
    }

    /// The configured output container.
    pub fn output_type(&self) -> Result<OutputType> {
        OutputType::from_name(&self.codec.output_type).with_context(|| {
            format!("Unknown output type \"{}\"", self.codec.output_type)
        })
    }

    pub fn strip_options(&self) -> Result<StripOptions> {
        Ok(StripOptions {
            keys_to_keep: self.strip.keys_to_keep.clone(),
            output: self.output_type()?,
        })
    }
}
