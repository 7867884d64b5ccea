//! Views for container-level namespaces: GIF, JFIF and PNG.

use crate::node::{accessors, namespace_view};
use crate::value::Value;

namespace_view! {
    MetadataGif
}

namespace_view! {
    /// JFIF APP0 header of a JPEG.
    MetadataJfif
}

namespace_view! {
    /// PNG chunks: text entries, gamma and physical pixel size.
    MetadataPng
}

impl MetadataGif {
    accessors! {
        get loop_count, set set_loop_count: i64 = "LoopCount";
        /// Seconds, clamped by the decoder.
        get delay_time: f64 = "DelayTime";
        get unclamped_delay_time: f64 = "UnclampedDelayTime";
        get has_global_color_map: bool = "HasGlobalColorMap";
        /// Raw palette bytes.
        get image_color_map: Value = "ImageColorMap";
        get canvas_pixel_width: i64 = "CanvasPixelWidth";
        get canvas_pixel_height: i64 = "CanvasPixelHeight";
    }
}

impl MetadataJfif {
    accessors! {
        get version: Vec<i64> = "JFIFVersion";
        get x_density, set set_x_density: i64 = "XDensity";
        get y_density, set set_y_density: i64 = "YDensity";
        /// 0 = aspect ratio only, 1 = dots per inch, 2 = dots per cm.
        get density_unit, set set_density_unit: i64 = "DensityUnit";
        get is_progressive: bool = "IsProgressive";
    }
}

impl MetadataPng {
    accessors! {
        get gamma: f64 = "Gamma";
        get interlace_type: i64 = "InterlaceType";
        get x_pixels_per_meter: i64 = "XPixelsPerMeter";
        get y_pixels_per_meter: i64 = "YPixelsPerMeter";
        get srgb_intent: i64 = "sRGBIntent";
        get chromaticities: Vec<f64> = "Chromaticities";
        get author, set set_author: String = "Author";
        get copyright, set set_copyright: String = "Copyright";
        get creation_time, set set_creation_time: String = "CreationTime";
        get description, set set_description: String = "Description";
        get modification_time: String = "ModificationTime";
        get software, set set_software: String = "Software";
        get title, set set_title: String = "Title";
        get comment, set set_comment: String = "Comment";
        get disclaimer: String = "Disclaimer";
        get warning: String = "Warning";
        get source: String = "Source";
        get loop_count: i64 = "LoopCount";
        get delay_time: f64 = "DelayTime";
    }
}
