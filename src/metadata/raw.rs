//! Raw-format namespaces: generic raw, Canon CIFF (CRW) and DNG.

use crate::node::{accessors, namespace_view};

namespace_view! {
    /// Generic raw-decoder properties. No keys are typed; use the generic
    /// accessors.
    MetadataRaw
}

namespace_view! {
    /// Canon CIFF heap records of CRW files.
    MetadataCiff
}

namespace_view! {
    MetadataDng
}

impl MetadataCiff {
    accessors! {
        get description: String = "Description";
        get firmware: String = "Firmware";
        get owner_name, set set_owner_name: String = "OwnerName";
        get image_name: String = "ImageName";
        get image_file_name: String = "ImageFileName";
        get release_method: i64 = "ReleaseMethod";
        get release_timing: i64 = "ReleaseTiming";
        get record_id: i64 = "RecordID";
        get self_timing_time: i64 = "SelfTimingTime";
        get camera_serial_number: i64 = "CameraSerialNumber";
        get image_serial_number: i64 = "ImageSerialNumber";
        get continuous_drive: i64 = "ContinuousDrive";
        get focus_mode: i64 = "FocusMode";
        get metering_mode: i64 = "MeteringMode";
        get shooting_mode: i64 = "ShootingMode";
        get lens_model: String = "LensModel";
        get lens_max_mm: i64 = "LensMaxMM";
        get lens_min_mm: i64 = "LensMinMM";
        get white_balance_index: i64 = "WhiteBalanceIndex";
        get flash_exposure_comp: f64 = "FlashExposureComp";
        get measured_ev: f64 = "MeasuredEV";
    }
}

impl MetadataDng {
    accessors! {
        get version: Vec<i64> = "DNGVersion";
        get backward_version: Vec<i64> = "DNGBackwardVersion";
        get unique_camera_model: String = "UniqueCameraModel";
        get localized_camera_model: String = "LocalizedCameraModel";
        get camera_serial_number, set set_camera_serial_number: String = "CameraSerialNumber";
        get lens_info: Vec<f64> = "LensInfo";
        get black_level: Vec<f64> = "BlackLevel";
        get white_level: Vec<i64> = "WhiteLevel";
        get calibration_illuminant1: i64 = "CalibrationIlluminant1";
        get calibration_illuminant2: i64 = "CalibrationIlluminant2";
        get color_matrix1: Vec<f64> = "ColorMatrix1";
        get color_matrix2: Vec<f64> = "ColorMatrix2";
        get camera_calibration1: Vec<f64> = "CameraCalibration1";
        get camera_calibration2: Vec<f64> = "CameraCalibration2";
        get as_shot_neutral: Vec<f64> = "AsShotNeutral";
        get as_shot_white_xy: Vec<f64> = "AsShotWhiteXY";
        get baseline_exposure: f64 = "BaselineExposure";
        get baseline_noise: f64 = "BaselineNoise";
        get baseline_sharpness: f64 = "BaselineSharpness";
        get private_data: String = "DNGPrivateData";
        get original_raw_file_name, set set_original_raw_file_name: String = "OriginalRawFileName";
    }
}
