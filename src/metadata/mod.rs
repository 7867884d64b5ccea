//! Typed views over the metadata tree.
//!
//! [`Metadata`] is the root of the tree. It is built from a file, a byte
//! buffer or a photo-library asset, edited through typed accessors or key
//! paths, and finally serialized back into the image with
//! [`Metadata::apply`].

mod container;
mod exif;
mod gps;
mod iptc;
mod maker;
mod photoshop;
mod raw;
mod tiff;

pub use container::{MetadataGif, MetadataJfif, MetadataPng};
pub use exif::{MetadataExif, MetadataExifAux};
pub use gps::{AltitudeRef, LatitudeRef, LongitudeRef, MetadataGps};
pub use iptc::MetadataIptc;
pub use maker::{
    MetadataMakerApple, MetadataMakerCanon, MetadataMakerFuji, MetadataMakerMinolta,
    MetadataMakerNikon, MetadataMakerOlympus, MetadataMakerPentax,
};
pub use photoshop::Metadata8Bim;
pub use raw::{MetadataCiff, MetadataDng, MetadataRaw};
pub use tiff::MetadataTiff;

use std::path::Path;

use crate::accessor::{code_enum, string_enum};
use crate::asset::{AssetLibrary, AssetRequestOptions};
use crate::codec::{ImageSource, OutputType, PropertyCodec, ReadOptions};
use crate::error::{MetadataError, Result};
use crate::node::{accessors, MetadataNode, MetadataView};
use crate::value::Dictionary;

code_enum! {
    /// EXIF orientation of the stored pixels.
    pub enum Orientation {
        Up = 1,
        UpMirrored = 2,
        Down = 3,
        DownMirrored = 4,
        LeftMirrored = 5,
        Right = 6,
        RightMirrored = 7,
        Left = 8,
    }
}

string_enum! {
    pub enum ColorModel {
        Rgb = "RGB",
        Gray = "Gray",
        Cmyk = "CMYK",
        Lab = "Lab",
    }
}

/// The root of an image's metadata tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    node: MetadataNode,
}

impl MetadataView for Metadata {
    fn from_node(node: MetadataNode) -> Self {
        Self { node }
    }

    fn node(&self) -> &MetadataNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut MetadataNode {
        &mut self.node
    }

    fn into_node(self) -> MetadataNode {
        self.node
    }
}

macro_rules! children {
    ($($get:ident, $set:ident: $view:ty;)+) => {
        $(
            pub fn $get(&self) -> Option<$view> {
                self.node.typed_child()
            }

            pub fn $set(&mut self, value: Option<$view>) {
                self.node.set_typed_child(value)
            }
        )+
    };
}

impl Metadata {
    /// Wrap an already decoded property dictionary.
    pub fn new(dictionary: Dictionary) -> Self {
        Self::from_dictionary(dictionary)
    }

    /// Read the metadata of the image file at `path`.
    pub fn from_path<C: PropertyCodec>(codec: &C, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MetadataError::CannotCreateSource(format!(
                "{} does not exist",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(MetadataError::NotAFileSource(path.to_path_buf()));
        }
        let dict = codec.read_properties(ImageSource::Path(path), &ReadOptions::default())?;
        log::debug!("Read {} properties from {}", dict.len(), path.display());
        Ok(Self::new(dict))
    }

    /// Read the metadata of an in-memory image.
    pub fn from_bytes<C: PropertyCodec>(codec: &C, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(MetadataError::EmptyInput);
        }
        let dict = codec.read_properties(ImageSource::Bytes(bytes), &ReadOptions::default())?;
        Ok(Self::new(dict))
    }

    /// Fetch an asset's image data from a photo library and read its metadata.
    pub async fn from_asset<L, C>(
        library: &L,
        codec: &C,
        asset_id: &str,
        options: &AssetRequestOptions,
    ) -> Result<Self>
    where
        L: AssetLibrary + ?Sized,
        C: PropertyCodec,
    {
        let data = library
            .request_image_data(asset_id, options)
            .await
            .ok_or(MetadataError::PhotoMissingData)?;
        log::debug!("Asset {asset_id} returned {} bytes", data.len());
        Self::from_bytes(codec, &data)
    }

    /// Serialize the current tree into `image`.
    ///
    /// Consumes the tree: a node is written at most once. Keys removed since
    /// reading (including whole namespaces) are removed from the image. When
    /// both the root `Orientation` and `{TIFF}.Orientation` are present the
    /// root value is written.
    pub fn apply<C: PropertyCodec>(
        self,
        codec: &C,
        image: &[u8],
        output: OutputType,
    ) -> Result<Vec<u8>> {
        Self::apply_dictionary(codec, &self.node.into_update(), image, output)
    }

    /// Serialize an arbitrary property dictionary into `image`.
    pub fn apply_dictionary<C: PropertyCodec>(
        codec: &C,
        dictionary: &Dictionary,
        image: &[u8],
        output: OutputType,
    ) -> Result<Vec<u8>> {
        if image.is_empty() {
            return Err(MetadataError::EmptyInput);
        }
        Ok(codec.apply_properties(dictionary, image, output)?)
    }

    accessors! {
        get file_size: i64 = "FileSize";
        get pixel_height: i64 = "PixelHeight";
        get pixel_width: i64 = "PixelWidth";
        get dpi_height: i64 = "DPIHeight";
        get dpi_width: i64 = "DPIWidth";
        /// Bits per sample.
        get depth: i64 = "Depth";
        get orientation, set set_orientation: Orientation = "Orientation";
        get is_float: bool = "IsFloat";
        get is_indexed: bool = "IsIndexed";
        get has_alpha: bool = "HasAlpha";
        get color_model: ColorModel = "ColorModel";
        /// Name of the embedded color profile.
        get profile_name: String = "ProfileName";
        get picture_style, set set_picture_style: Dictionary = "{PictureStyle}";
    }

    children! {
        tiff, set_tiff: MetadataTiff;
        exif, set_exif: MetadataExif;
        exif_aux, set_exif_aux: MetadataExifAux;
        gif, set_gif: MetadataGif;
        jfif, set_jfif: MetadataJfif;
        png, set_png: MetadataPng;
        iptc, set_iptc: MetadataIptc;
        gps, set_gps: MetadataGps;
        raw, set_raw: MetadataRaw;
        ciff, set_ciff: MetadataCiff;
        maker_apple, set_maker_apple: MetadataMakerApple;
        maker_canon, set_maker_canon: MetadataMakerCanon;
        maker_nikon, set_maker_nikon: MetadataMakerNikon;
        maker_minolta, set_maker_minolta: MetadataMakerMinolta;
        maker_fuji, set_maker_fuji: MetadataMakerFuji;
        maker_olympus, set_maker_olympus: MetadataMakerOlympus;
        maker_pentax, set_maker_pentax: MetadataMakerPentax;
        photoshop, set_photoshop: Metadata8Bim;
        dng, set_dng: MetadataDng;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeCodec, FAKE_IMAGE};
    use super::*;
    use crate::value::Value;

    fn camera_properties() -> Dictionary {
        let mut exif = Dictionary::new();
        exif.insert(
            "ISOSpeedRatings".into(),
            Value::Array(vec![Value::Integer(100)]),
        );
        exif.insert("FNumber".into(), Value::Float(2.8));
        let mut gps = Dictionary::new();
        gps.insert("Latitude".into(), Value::Float(48.8584));
        gps.insert("LatitudeRef".into(), Value::String("N".into()));
        let mut root = Dictionary::new();
        root.insert("{Exif}".into(), Value::Dictionary(exif));
        root.insert("{GPS}".into(), Value::Dictionary(gps));
        root.insert("Orientation".into(), Value::Integer(6));
        root.insert("PixelWidth".into(), Value::Integer(4032));
        root.insert("PixelHeight".into(), Value::Integer(3024));
        root.insert("ColorModel".into(), Value::String("RGB".into()));
        root.insert("HasAlpha".into(), Value::Bool(false));
        root
    }

    #[test]
    fn root_accessors() {
        let meta = Metadata::new(camera_properties());
        assert_eq!(meta.orientation(), Some(Orientation::Right));
        assert_eq!(meta.pixel_width(), Some(4032));
        assert_eq!(meta.pixel_height(), Some(3024));
        assert_eq!(meta.color_model(), Some(ColorModel::Rgb));
        assert_eq!(meta.has_alpha(), Some(false));
        assert_eq!(meta.file_size(), None);
        assert_eq!(meta.profile_name(), None);
    }

    #[test]
    fn unknown_color_model_reads_as_absent() {
        let mut dict = camera_properties();
        dict.insert("ColorModel".into(), Value::String("rgb".into()));
        assert_eq!(Metadata::new(dict).color_model(), None);
    }

    #[test]
    fn orientation_write_and_clear() {
        let mut meta = Metadata::new(camera_properties());
        meta.set_orientation(Some(Orientation::Left));
        assert_eq!(meta.node().raw_value("Orientation"), Some(&Value::Integer(8)));
        meta.set_orientation(None);
        assert_eq!(meta.orientation(), None);
        assert!(meta.node().raw_value("Orientation").is_none());
    }

    #[test]
    fn picture_style_is_a_dictionary() {
        let mut meta = Metadata::new(Dictionary::new());
        let mut style = Dictionary::new();
        style.insert("Contrast".into(), Value::Integer(2));
        meta.set_picture_style(Some(style.clone()));
        assert_eq!(meta.picture_style(), Some(style));
    }

    #[test]
    fn iso_edit_end_to_end() {
        let codec = FakeCodec::with(camera_properties());
        let mut meta = Metadata::from_bytes(&codec, FAKE_IMAGE).unwrap();

        let mut exif = meta.exif().unwrap();
        assert_eq!(exif.iso_speed_ratings(), Some(vec![100]));
        exif.set_iso_speed_ratings(Some(vec![200]));
        meta.set_exif(Some(exif));

        let out = meta.apply(&codec, FAKE_IMAGE, OutputType::Source).unwrap();
        let reread = Metadata::from_bytes(&codec, &out).unwrap();
        assert_eq!(reread.exif().unwrap().iso_speed_ratings(), Some(vec![200]));
        assert_eq!(reread.gps().unwrap().latitude(), Some(48.8584));
        assert_eq!(reread.gps().unwrap().latitude_ref(), Some(LatitudeRef::North));
    }

    #[test]
    fn cleared_orientation_is_removed_from_the_image() {
        let codec = FakeCodec::with(camera_properties());
        let mut meta = Metadata::from_bytes(&codec, FAKE_IMAGE).unwrap();
        meta.set_orientation(None);

        let out = meta.apply(&codec, FAKE_IMAGE, OutputType::Source).unwrap();
        let reread = Metadata::from_bytes(&codec, &out).unwrap();
        assert_eq!(reread.orientation(), None);
        assert_eq!(reread.pixel_width(), Some(4032));
    }

    #[test]
    fn cleared_namespace_is_removed_from_the_image() {
        let codec = FakeCodec::with(camera_properties());
        let mut meta = Metadata::from_bytes(&codec, FAKE_IMAGE).unwrap();
        meta.set_gps(None);

        let out = meta.apply(&codec, FAKE_IMAGE, OutputType::Source).unwrap();
        let reread = Metadata::from_bytes(&codec, &out).unwrap();
        assert!(reread.gps().is_none());
        assert_eq!(reread.exif().unwrap().iso_speed_ratings(), Some(vec![100]));
    }

    #[test]
    fn cleared_nested_key_is_removed_from_the_image() {
        let codec = FakeCodec::with(camera_properties());
        let mut meta = Metadata::from_bytes(&codec, FAKE_IMAGE).unwrap();
        let mut exif = meta.exif().unwrap();
        exif.set_f_number(None);
        meta.set_exif(Some(exif));

        let out = meta.apply(&codec, FAKE_IMAGE, OutputType::Source).unwrap();
        let reread = Metadata::from_bytes(&codec, &out).unwrap();
        let exif = reread.exif().unwrap();
        assert_eq!(exif.f_number(), None);
        assert_eq!(exif.iso_speed_ratings(), Some(vec![100]));
    }

    #[test]
    fn reads_with_cache_disabled() {
        let codec = FakeCodec::with(camera_properties());
        Metadata::from_bytes(&codec, FAKE_IMAGE).unwrap();
        assert_eq!(
            *codec.last_options.borrow(),
            Some(ReadOptions { should_cache: false })
        );
    }

    #[test]
    fn rejects_empty_buffer() {
        let codec = FakeCodec::with(camera_properties());
        assert_eq!(
            Metadata::from_bytes(&codec, &[]),
            Err(MetadataError::EmptyInput)
        );
    }

    #[test]
    fn rejects_unparseable_buffer() {
        let codec = FakeCodec::with(camera_properties());
        assert!(matches!(
            Metadata::from_bytes(&codec, b"just some text"),
            Err(MetadataError::CannotCreateSource(_))
        ));
    }

    #[test]
    fn reports_missing_properties() {
        let codec = FakeCodec {
            refuse_extraction: true,
            ..Default::default()
        };
        assert!(matches!(
            Metadata::from_bytes(&codec, FAKE_IMAGE),
            Err(MetadataError::PropertyExtractionFailed(_))
        ));
    }

    #[test]
    fn from_path_requires_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let codec = FakeCodec::with(camera_properties());
        assert_eq!(
            Metadata::from_path(&codec, dir.path()),
            Err(MetadataError::NotAFileSource(dir.path().to_path_buf()))
        );
        assert!(matches!(
            Metadata::from_path(&codec, &dir.path().join("missing.jpg")),
            Err(MetadataError::CannotCreateSource(_))
        ));

        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, FAKE_IMAGE).unwrap();
        let meta = Metadata::from_path(&codec, &file).unwrap();
        assert_eq!(meta.orientation(), Some(Orientation::Right));
    }

    #[test]
    fn apply_requires_image_bytes() {
        let codec = FakeCodec::default();
        let meta = Metadata::new(Dictionary::new());
        assert_eq!(
            meta.apply(&codec, &[], OutputType::Source),
            Err(MetadataError::EmptyInput)
        );
    }

    #[test]
    fn typed_children_for_every_namespace() {
        let mut meta = Metadata::new(Dictionary::new());
        assert!(meta.tiff().is_none());
        meta.set_tiff(Some(MetadataTiff::from_dictionary(Dictionary::new())));
        meta.set_dng(Some(MetadataDng::from_dictionary(Dictionary::new())));
        meta.set_photoshop(Some(Metadata8Bim::from_dictionary(Dictionary::new())));
        assert!(meta.tiff().is_some());
        assert_eq!(
            meta.node().key_paths(),
            vec!["{8BIM}", "{DNG}", "{TIFF}"]
        );
        meta.set_tiff(None);
        assert!(meta.tiff().is_none());
    }
}
