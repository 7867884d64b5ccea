//! The image property codec boundary.
//!
//! A [`PropertyCodec`] turns an image container into a property
//! [`Dictionary`] and merges a dictionary back into a container. Write
//! semantics are shared by every implementation:
//!
//! - a present key overrides the stored value;
//! - [`Value::Null`](crate::value::Value::Null) removes the stored value;
//! - an omitted key leaves the stored value unchanged;
//! - a namespace dictionary is authoritative for the tags the codec can
//!   represent, so represented tags missing from it are removed.

mod iptc;
mod native;
mod tags;

pub use native::ContainerCodec;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formats::ContainerFormat;
use crate::value::Dictionary;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("cannot open image source: {0}")]
    CannotCreateSource(String),
    #[error("cannot extract image properties: {0}")]
    CannotExtractProperties(String),
    #[error("cannot determine source image type")]
    CannotDetermineSourceType,
    #[error("cannot create image destination: {0}")]
    CannotCreateDestination(String),
    #[error("cannot finalize image destination: {0}")]
    FinalizeFailed(String),
}

/// Where the codec reads an image from.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Options for [`PropertyCodec::read_properties`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Let the codec cache decoded data. Metadata reads never need it.
    #[serde(default)]
    pub should_cache: bool,
}

/// Container type of the serialized output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputType {
    /// Same container as the input image.
    #[default]
    Source,
    Container(ContainerFormat),
}

impl OutputType {
    /// Resolve against the detected source container.
    ///
    /// Re-encoding pixels into another container is not supported, so any
    /// explicit container must match the source.
    pub fn resolve(self, source: ContainerFormat) -> Result<ContainerFormat, CodecError> {
        match self {
            OutputType::Source => Ok(source),
            OutputType::Container(format) if format == source => Ok(format),
            OutputType::Container(format) => Err(CodecError::CannotCreateDestination(format!(
                "cannot convert {} to {}",
                source.type_identifier(),
                format.type_identifier()
            ))),
        }
    }

    /// Parse `"source"` or a container type identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("source") {
            return Some(OutputType::Source);
        }
        ContainerFormat::from_type_identifier(name).map(OutputType::Container)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputType::Source => "source",
            OutputType::Container(format) => format.type_identifier(),
        }
    }
}

/// Reads and writes the property dictionary of an image container.
pub trait PropertyCodec {
    /// Decode the property dictionary of the first image in `source`.
    fn read_properties(
        &self,
        source: ImageSource<'_>,
        options: &ReadOptions,
    ) -> Result<Dictionary, CodecError>;

    /// Merge `metadata` into `image` and return the re-encoded container.
    fn apply_properties(
        &self,
        metadata: &Dictionary,
        image: &[u8],
        output: OutputType,
    ) -> Result<Vec<u8>, CodecError>;
}

impl<C: PropertyCodec + ?Sized> PropertyCodec for &C {
    fn read_properties(
        &self,
        source: ImageSource<'_>,
        options: &ReadOptions,
    ) -> Result<Dictionary, CodecError> {
        (**self).read_properties(source, options)
    }

    fn apply_properties(
        &self,
        metadata: &Dictionary,
        image: &[u8],
        output: OutputType,
    ) -> Result<Vec<u8>, CodecError> {
        (**self).apply_properties(metadata, image, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_options_default_disables_cache() {
        assert!(!ReadOptions::default().should_cache);
    }

    #[test]
    fn output_type_defaults_to_source() {
        assert_eq!(OutputType::default(), OutputType::Source);
        assert_eq!(
            OutputType::Source.resolve(ContainerFormat::Png),
            Ok(ContainerFormat::Png)
        );
    }

    #[test]
    fn output_type_rejects_conversion() {
        let out = OutputType::Container(ContainerFormat::Png);
        assert_eq!(out.resolve(ContainerFormat::Png), Ok(ContainerFormat::Png));
        assert!(matches!(
            out.resolve(ContainerFormat::Jpeg),
            Err(CodecError::CannotCreateDestination(_))
        ));
    }

    #[test]
    fn output_type_names() {
        assert_eq!(OutputType::from_name("source"), Some(OutputType::Source));
        assert_eq!(
            OutputType::from_name("public.jpeg"),
            Some(OutputType::Container(ContainerFormat::Jpeg))
        );
        assert_eq!(OutputType::from_name("jpeg"), None);
        assert_eq!(OutputType::Container(ContainerFormat::Dng).name(), "com.adobe.raw-image");
    }
}
