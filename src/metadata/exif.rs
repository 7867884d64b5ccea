use chrono::NaiveDateTime;

use crate::node::{accessors, namespace_view};

namespace_view! {
    /// Exif sub-IFD: exposure, lens and capture settings.
    MetadataExif
}

namespace_view! {
    /// Auxiliary Exif data (lens and body details not in the Exif standard).
    MetadataExifAux
}

impl MetadataExif {
    accessors! {
        /// Seconds.
        get exposure_time, set set_exposure_time: f64 = "ExposureTime";
        get f_number, set set_f_number: f64 = "FNumber";
        get exposure_program, set set_exposure_program: i64 = "ExposureProgram";
        get spectral_sensitivity: String = "SpectralSensitivity";
        get iso_speed_ratings, set set_iso_speed_ratings: Vec<i64> = "ISOSpeedRatings";
        get sensitivity_type: i64 = "SensitivityType";
        get version: Vec<i64> = "ExifVersion";
        get date_time_original, set set_date_time_original: NaiveDateTime = "DateTimeOriginal";
        get date_time_digitized, set set_date_time_digitized: NaiveDateTime = "DateTimeDigitized";
        get offset_time, set set_offset_time: String = "OffsetTime";
        get offset_time_original, set set_offset_time_original: String = "OffsetTimeOriginal";
        get offset_time_digitized, set set_offset_time_digitized: String = "OffsetTimeDigitized";
        get components_configuration: Vec<i64> = "ComponentsConfiguration";
        get compressed_bits_per_pixel: f64 = "CompressedBitsPerPixel";
        get shutter_speed_value: f64 = "ShutterSpeedValue";
        get aperture_value, set set_aperture_value: f64 = "ApertureValue";
        get brightness_value: f64 = "BrightnessValue";
        get exposure_bias_value, set set_exposure_bias_value: f64 = "ExposureBiasValue";
        get max_aperture_value: f64 = "MaxApertureValue";
        get subject_distance: f64 = "SubjectDistance";
        get metering_mode, set set_metering_mode: i64 = "MeteringMode";
        get light_source: i64 = "LightSource";
        get flash, set set_flash: i64 = "Flash";
        /// Millimeters.
        get focal_length, set set_focal_length: f64 = "FocalLength";
        get subject_area: Vec<i64> = "SubjectArea";
        get user_comment, set set_user_comment: String = "UserComment";
        get subsec_time: String = "SubsecTime";
        get subsec_time_original: String = "SubsecTimeOriginal";
        get subsec_time_digitized: String = "SubsecTimeDigitized";
        get flash_pix_version: Vec<i64> = "FlashPixVersion";
        get color_space, set set_color_space: i64 = "ColorSpace";
        get pixel_x_dimension: i64 = "PixelXDimension";
        get pixel_y_dimension: i64 = "PixelYDimension";
        get focal_plane_x_resolution: f64 = "FocalPlaneXResolution";
        get focal_plane_y_resolution: f64 = "FocalPlaneYResolution";
        get focal_plane_resolution_unit: i64 = "FocalPlaneResolutionUnit";
        get exposure_index: f64 = "ExposureIndex";
        get sensing_method: i64 = "SensingMethod";
        get file_source: i64 = "FileSource";
        get scene_type: i64 = "SceneType";
        get custom_rendered: i64 = "CustomRendered";
        get exposure_mode, set set_exposure_mode: i64 = "ExposureMode";
        get white_balance, set set_white_balance: i64 = "WhiteBalance";
        get digital_zoom_ratio: f64 = "DigitalZoomRatio";
        get focal_len_in_35mm_film, set set_focal_len_in_35mm_film: i64 = "FocalLenIn35mmFilm";
        get scene_capture_type: i64 = "SceneCaptureType";
        get gain_control: i64 = "GainControl";
        get contrast: i64 = "Contrast";
        get saturation: i64 = "Saturation";
        get sharpness: i64 = "Sharpness";
        get subject_distance_range: i64 = "SubjectDistRange";
        get image_unique_id: String = "ImageUniqueID";
        get camera_owner_name, set set_camera_owner_name: String = "CameraOwnerName";
        get body_serial_number, set set_body_serial_number: String = "BodySerialNumber";
        get lens_specification: Vec<f64> = "LensSpecification";
        get lens_make, set set_lens_make: String = "LensMake";
        get lens_model, set set_lens_model: String = "LensModel";
        get lens_serial_number, set set_lens_serial_number: String = "LensSerialNumber";
        get gamma: f64 = "Gamma";
    }
}

impl MetadataExifAux {
    accessors! {
        get lens_info: Vec<f64> = "LensInfo";
        get lens_model: String = "LensModel";
        get serial_number: String = "SerialNumber";
        get lens_id: i64 = "LensID";
        get lens_serial_number: String = "LensSerialNumber";
        get image_number: i64 = "ImageNumber";
        get flash_compensation: f64 = "FlashCompensation";
        get owner_name, set set_owner_name: String = "OwnerName";
        get firmware: String = "Firmware";
    }
}
