use chrono::NaiveDateTime;

use super::Orientation;
use crate::node::{accessors, namespace_view};

namespace_view! {
    /// TIFF IFD0 tags: camera identity, authorship and resolution.
    MetadataTiff
}

impl MetadataTiff {
    accessors! {
        get compression: i64 = "Compression";
        get photometric_interpretation: i64 = "PhotometricInterpretation";
        get document_name, set set_document_name: String = "DocumentName";
        get image_description, set set_image_description: String = "ImageDescription";
        get make, set set_make: String = "Make";
        get model, set set_model: String = "Model";
        get orientation, set set_orientation: Orientation = "Orientation";
        get x_resolution, set set_x_resolution: f64 = "XResolution";
        get y_resolution, set set_y_resolution: f64 = "YResolution";
        /// 2 = inches, 3 = centimeters.
        get resolution_unit, set set_resolution_unit: i64 = "ResolutionUnit";
        get software, set set_software: String = "Software";
        get transfer_function: Vec<i64> = "TransferFunction";
        get date_time, set set_date_time: NaiveDateTime = "DateTime";
        get artist, set set_artist: String = "Artist";
        get host_computer, set set_host_computer: String = "HostComputer";
        get copyright, set set_copyright: String = "Copyright";
        get white_point: Vec<f64> = "WhitePoint";
        get primary_chromaticities: Vec<f64> = "PrimaryChromaticities";
        get tile_width: i64 = "TileWidth";
        get tile_length: i64 = "TileLength";
    }
}
