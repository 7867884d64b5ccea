use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use crate::codec::{ImageSource, PropertyCodec};
use crate::config::Config;
use crate::formats::{self, ContainerFormat};
use crate::metadata::Metadata;
use crate::node::MetadataView;
use crate::strip::{clearing_dictionary, strip_with};
use crate::value::Value;

/// One `KEY=VALUE` edit from the command line.
///
/// `KEY` is a dotted key path such as `{Exif}.ISOSpeedRatings`. `VALUE` is
/// parsed as JSON, falling back to a plain string; JSON `null` clears the
/// key.
///
/// # Example
///
/// ```rust
/// use exif_tree::pipeline::Edit;
/// use exif_tree::value::Value;
///
/// let edit: Edit = "{Exif}.ISOSpeedRatings=[200]".parse().unwrap();
/// assert_eq!(edit.path, "{Exif}.ISOSpeedRatings");
/// assert_eq!(edit.value, Some(Value::Array(vec![Value::Integer(200)])));
///
/// let clear: Edit = "{GPS}=null".parse().unwrap();
/// assert_eq!(clear.value, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub path: String,
    /// `None` clears the key.
    pub value: Option<Value>,
}

impl FromStr for Edit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((path, raw)) = s.split_once('=') else {
            bail!("Expected KEY=VALUE, got \"{s}\"");
        };
        let path = path.trim();
        if path.is_empty() || path.split('.').any(str::is_empty) {
            bail!("Invalid key path \"{path}\"");
        }
        let value = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => Value::from_json(json),
            Err(_) => Value::String(raw.to_string()),
        };
        Ok(Self {
            path: path.to_string(),
            value: (!value.is_null()).then_some(value),
        })
    }
}

/// What [`process_image`] does with each file.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Edit(Vec<Edit>),
    Strip,
}

/// Result of processing a single image file.
#[derive(Debug, Default)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub format: Option<ContainerFormat>,
    /// Key paths that differ after the action (or would, on a dry run).
    pub changed_key_paths: Vec<String>,
    /// Whether the file on disk was rewritten.
    pub written: bool,
    pub backup_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files whose extension maps to a
/// supported container are included.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tree::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if formats::is_supported_path(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && formats::is_supported_path(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Read the metadata tree of one file with the configured read options.
pub fn read_metadata<C: PropertyCodec>(codec: &C, path: &Path, config: &Config) -> Result<Metadata> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_metadata(codec, path, &bytes, config)
}

fn parse_metadata<C: PropertyCodec>(
    codec: &C,
    path: &Path,
    bytes: &[u8],
    config: &Config,
) -> Result<Metadata> {
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    let dict = codec
        .read_properties(ImageSource::Bytes(bytes), &config.read_options())
        .with_context(|| format!("Failed to read metadata from {}", path.display()))?;
    Ok(Metadata::new(dict))
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Apply `action` to the image at `path`.
///
/// Errors are reported in [`ProcessResult::error`] so a batch can carry on
/// with the remaining files.
///
/// # Example
///
/// ```rust,no_run
/// use exif_tree::codec::ContainerCodec;
/// use exif_tree::config::Config;
/// use exif_tree::pipeline::{process_image, Action};
/// use std::path::Path;
///
/// let config = Config::default();
/// let edits = vec!["{Exif}.ISOSpeedRatings=[200]".parse().unwrap()];
/// let result = process_image(&ContainerCodec, Path::new("photo.jpg"), &Action::Edit(edits), &config);
/// println!("Changed: {:?}", result.changed_key_paths);
/// ```
pub fn process_image<C: PropertyCodec>(
    codec: &C,
    path: &Path,
    action: &Action,
    config: &Config,
) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        format: ContainerFormat::from_path(path),
        ..Default::default()
    };
    if let Err(e) = run(codec, path, action, config, &mut result) {
        result.error = Some(format!("{e:#}"));
    }
    result
}

fn run<C: PropertyCodec>(
    codec: &C,
    path: &Path,
    action: &Action,
    config: &Config,
    result: &mut ProcessResult,
) -> Result<()> {
    let image = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(format) = ContainerFormat::detect(&image) {
        result.format = Some(format);
    }
    let output = config.output_type()?;

    let updated = match action {
        Action::Edit(edits) => {
            let mut meta = parse_metadata(codec, path, &image, config)?;
            for edit in edits {
                if !meta.node_mut().set_value_at_path(&edit.path, edit.value.clone()) {
                    bail!("Cannot set {}: a parent key is not a dictionary", edit.path);
                }
            }
            result.changed_key_paths = meta.node().changed_key_paths();
            if result.changed_key_paths.is_empty() || config.output.dry_run {
                return Ok(());
            }
            meta.apply(codec, &image, output)?
        }
        Action::Strip => {
            let options = config.strip_options()?;
            let properties = parse_metadata(codec, path, &image, config)?.node().original().clone();
            result.changed_key_paths = clearing_dictionary(&properties, &options.keys_to_keep)
                .into_keys()
                .collect();
            if result.changed_key_paths.is_empty() || config.output.dry_run {
                return Ok(());
            }
            strip_with(codec, &image, &options)?
        }
    };

    if config.output.backup_originals {
        match backup_file(path) {
            Ok(backup) => result.backup_path = Some(backup),
            Err(e) => log::warn!("Failed to backup {}: {e}", path.display()),
        }
    }
    std::fs::write(path, updated).with_context(|| format!("Failed to write {}", path.display()))?;
    result.written = true;
    Ok(())
}
