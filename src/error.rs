use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;

/// Errors reported when building a metadata tree or writing it back.
///
/// Nothing is retried internally: every failure reaches the caller once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The photo library returned no image data for the asset.
    #[error("photo library returned no image data")]
    PhotoMissingData,
    #[error("not a file: {}", .0.display())]
    NotAFileSource(PathBuf),
    #[error("image data is empty")]
    EmptyInput,
    /// The codec could not open or parse the container.
    #[error("cannot create image source: {0}")]
    CannotCreateSource(String),
    #[error("cannot determine source image type")]
    CannotDetermineSourceType,
    /// The container opened but yielded no property dictionary for its first image.
    #[error("cannot extract properties of the first image: {0}")]
    PropertyExtractionFailed(String),
    #[error("cannot create image destination: {0}")]
    CannotCreateDestination(String),
    #[error("cannot finalize image destination: {0}")]
    FinalizeFailed(String),
}

impl From<CodecError> for MetadataError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::CannotCreateSource(msg) => MetadataError::CannotCreateSource(msg),
            CodecError::CannotExtractProperties(msg) => {
                MetadataError::PropertyExtractionFailed(msg)
            }
            CodecError::CannotDetermineSourceType => MetadataError::CannotDetermineSourceType,
            CodecError::CannotCreateDestination(msg) => {
                MetadataError::CannotCreateDestination(msg)
            }
            CodecError::FinalizeFailed(msg) => MetadataError::FinalizeFailed(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
