//! Metadata stripping.
//!
//! The codec treats an omitted key as "leave unchanged", so stripping
//! builds a clearing dictionary that maps every removed key to
//! [`Value::Null`] explicitly.

use serde::{Deserialize, Serialize};

use crate::codec::{ImageSource, OutputType, PropertyCodec, ReadOptions};
use crate::error::{MetadataError, Result};
use crate::value::{Dictionary, Value};

/// Top-level keys kept by [`strip`].
pub const DEFAULT_KEYS_TO_KEEP: &[&str] = &["Orientation"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripOptions {
    /// Top-level keys left untouched.
    pub keys_to_keep: Vec<String>,
    #[serde(skip)]
    pub output: OutputType,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            keys_to_keep: DEFAULT_KEYS_TO_KEEP.iter().map(|k| k.to_string()).collect(),
            output: OutputType::Source,
        }
    }
}

/// Remove all metadata from `image` except its orientation.
pub fn strip<C: PropertyCodec>(codec: &C, image: &[u8]) -> Result<Vec<u8>> {
    strip_with(codec, image, &StripOptions::default())
}

/// Remove all top-level metadata from `image` except `options.keys_to_keep`.
pub fn strip_with<C: PropertyCodec>(
    codec: &C,
    image: &[u8],
    options: &StripOptions,
) -> Result<Vec<u8>> {
    if image.is_empty() {
        return Err(MetadataError::EmptyInput);
    }
    let properties = codec.read_properties(ImageSource::Bytes(image), &ReadOptions::default())?;
    let clearing = clearing_dictionary(&properties, &options.keys_to_keep);
    log::debug!(
        "Clearing {} of {} top-level keys",
        clearing.len(),
        properties.len()
    );
    Ok(codec.apply_properties(&clearing, image, options.output)?)
}

/// Map every key of `properties` outside `keys_to_keep` to [`Value::Null`].
pub fn clearing_dictionary(properties: &Dictionary, keys_to_keep: &[String]) -> Dictionary {
    properties
        .keys()
        .filter(|key| !keys_to_keep.iter().any(|k| k == *key))
        .map(|key| (key.clone(), Value::Null))
        .collect()
}
