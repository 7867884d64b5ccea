use crate::node::{accessors, namespace_view};

namespace_view! {
    /// Photoshop image resources (`8BIM` blocks) and PSD header fields.
    Metadata8Bim
}

impl Metadata8Bim {
    accessors! {
        /// PSD file format version (1 = PSD, 2 = PSB).
        get version: i64 = "Version";
        get layer_names: Vec<String> = "LayerNames";
        get channels: i64 = "Channels";
        /// Photoshop color mode number (3 = RGB, 4 = CMYK, ...).
        get color_mode: i64 = "ColorMode";
        /// Ids of the image resources present in the file.
        get resource_ids: Vec<i64> = "ResourceIDs";
    }
}
