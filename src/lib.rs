//! # exif-tree
//!
//! Typed, nested metadata trees for image files. The property dictionary of
//! an image (EXIF, IPTC, GPS, maker notes, raw-format and container tags) is
//! read into a [`Metadata`](metadata::Metadata) tree, edited through typed
//! accessors or dotted key paths, and written back into the image without
//! touching its pixels.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_tree::codec::{ContainerCodec, OutputType};
//! use exif_tree::metadata::Metadata;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let codec = ContainerCodec::new();
//!     let path = Path::new("photo.jpg");
//!     let mut meta = Metadata::from_path(&codec, path)?;
//!
//!     // Child namespaces are independent copies until written back
//!     if let Some(mut exif) = meta.exif() {
//!         println!("ISO: {:?}", exif.iso_speed_ratings());
//!         exif.set_iso_speed_ratings(Some(vec![200]));
//!         meta.set_exif(Some(exif));
//!     }
//!
//!     let image = std::fs::read(path)?;
//!     let updated = meta.apply(&codec, &image, OutputType::Source)?;
//!     std::fs::write(path, updated)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Key Paths
//!
//! Every value is also reachable by a dotted path through the node:
//!
//! ```rust
//! use exif_tree::metadata::Metadata;
//! use exif_tree::node::MetadataView;
//! use exif_tree::value::{Dictionary, Value};
//!
//! let mut gps = Dictionary::new();
//! gps.insert("Latitude".into(), Value::Float(48.8584));
//! let mut root = Dictionary::new();
//! root.insert("{GPS}".into(), Value::Dictionary(gps));
//!
//! let mut meta = Metadata::new(root);
//! assert_eq!(meta.node().value_at_path("{GPS}.Latitude"), Some(&Value::Float(48.8584)));
//! meta.node_mut().set_value_at_path("{GPS}.LatitudeRef", Some(Value::String("N".into())));
//! assert_eq!(meta.node().changed_key_paths(), vec!["{GPS}", "{GPS}.LatitudeRef"]);
//! ```
//!
//! ## Supported Formats
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | JPEG | EXIF, IPTC, JFIF, dimensions | EXIF, IPTC |
//! | PNG | EXIF, text chunks, dimensions | EXIF, text chunks |
//! | WebP | EXIF, dimensions | EXIF |
//! | GIF | screen descriptor, dimensions | - |
//! | TIFF, CR2, NEF, DNG | EXIF | - |
//! | PSD | header, IPTC, EXIF, resolution | - |
//! | CRW | file size | - |
//!
//! ## Modules
//!
//! - [`value`] - The `Value` sum type and property dictionaries
//! - [`accessor`] - Typed reads and writes over a dictionary
//! - [`keypath`] - Dotted key-path enumeration, lookup and diffing
//! - [`node`] - The metadata tree node and view macros
//! - [`namespace`] - Registry of namespace keys and their child views
//! - [`metadata`] - The root view and typed namespace views
//! - [`codec`] - Reading and writing property dictionaries in image containers
//! - [`formats`] - Container identification and supported-type lists
//! - [`strip`] - Metadata removal
//! - [`asset`] - Photo-library asset access
//! - [`config`] - Configuration types and loading/saving
//! - [`pipeline`] - Batch processing of files and directories

pub mod accessor;
pub mod asset;
pub mod codec;
pub mod config;
pub mod error;
pub mod formats;
pub mod keypath;
pub mod metadata;
pub mod namespace;
pub mod node;
pub mod pipeline;
pub mod strip;
pub mod value;

pub use error::{MetadataError, Result};
