//! Camera maker notes.
//!
//! Most maker dictionaries are keyed by vendor-specific names or tag
//! numbers; only Canon and Nikon carry well-known keys worth typing. The
//! rest are reachable through the generic accessors.

use crate::node::{accessors, namespace_view};

namespace_view! {
    /// Apple maker note, keyed by tag number (`"1"`, `"2"`, ...).
    MetadataMakerApple
}

namespace_view! {
    MetadataMakerCanon
}

namespace_view! {
    MetadataMakerNikon
}

namespace_view! {
    MetadataMakerMinolta
}

namespace_view! {
    MetadataMakerFuji
}

namespace_view! {
    MetadataMakerOlympus
}

namespace_view! {
    MetadataMakerPentax
}

impl MetadataMakerApple {
    /// Value of a numbered maker-note tag.
    pub fn tag(&self, number: u16) -> Option<crate::value::Value> {
        self.node.value(&number.to_string())
    }
}

impl MetadataMakerCanon {
    accessors! {
        get owner_name: String = "OwnerName";
        get camera_serial_number: i64 = "CameraSerialNumber";
        get image_serial_number: i64 = "ImageSerialNumber";
        get flash_exposure_comp: f64 = "FlashExposureComp";
        get continuous_drive: i64 = "ContinuousDrive";
        get lens_model: String = "LensModel";
        get firmware: String = "Firmware";
        get aspect_ratio_info: Vec<i64> = "AspectRatioInfo";
    }
}

impl MetadataMakerNikon {
    accessors! {
        get iso_setting: Vec<i64> = "ISOSetting";
        get color_mode: String = "ColorMode";
        get quality: String = "Quality";
        get white_balance_mode: String = "WhiteBalanceMode";
        get sharpen_mode: String = "SharpenMode";
        get focus_mode: String = "FocusMode";
        get flash_setting: String = "FlashSetting";
        get iso_selection: String = "ISOSelection";
        get flash_exposure_comp: f64 = "FlashExposureComp";
        get image_adjustment: String = "ImageAdjustment";
        get lens_adapter: i64 = "LensAdapter";
        get lens_type: i64 = "LensType";
        get lens_info: Vec<f64> = "LensInfo";
        get focus_distance: f64 = "FocusDistance";
        get digital_zoom: f64 = "DigitalZoom";
        get shooting_mode: i64 = "ShootingMode";
        get camera_serial_number: String = "CameraSerialNumber";
        get shutter_count: i64 = "ShutterCount";
    }
}
