use crate::accessor::{code_enum, string_enum};
use crate::node::{accessors, namespace_view};

string_enum! {
    pub enum LatitudeRef {
        North = "N",
        South = "S",
    }
}

string_enum! {
    pub enum LongitudeRef {
        East = "E",
        West = "W",
    }
}

code_enum! {
    pub enum AltitudeRef {
        AboveSeaLevel = 0,
        BelowSeaLevel = 1,
    }
}

namespace_view! {
    /// GPS position, stored as unsigned magnitudes plus hemisphere references.
    MetadataGps
}

impl MetadataGps {
    accessors! {
        get version: Vec<i64> = "GPSVersion";
        get latitude_ref, set set_latitude_ref: LatitudeRef = "LatitudeRef";
        /// Degrees, always non-negative; see [`latitude_ref`](Self::latitude_ref).
        get latitude, set set_latitude: f64 = "Latitude";
        get longitude_ref, set set_longitude_ref: LongitudeRef = "LongitudeRef";
        get longitude, set set_longitude: f64 = "Longitude";
        get altitude_ref, set set_altitude_ref: AltitudeRef = "AltitudeRef";
        /// Meters.
        get altitude, set set_altitude: f64 = "Altitude";
        get time_stamp, set set_time_stamp: String = "TimeStamp";
        get date_stamp, set set_date_stamp: String = "DateStamp";
        get satellites: String = "Satellites";
        get status: String = "Status";
        get measure_mode: String = "MeasureMode";
        get dop: f64 = "DOP";
        get speed_ref: String = "SpeedRef";
        get speed: f64 = "Speed";
        get track_ref: String = "TrackRef";
        get track: f64 = "Track";
        get img_direction_ref, set set_img_direction_ref: String = "ImgDirectionRef";
        get img_direction, set set_img_direction: f64 = "ImgDirection";
        get map_datum: String = "MapDatum";
        get dest_latitude_ref: String = "DestLatitudeRef";
        get dest_latitude: f64 = "DestLatitude";
        get dest_longitude_ref: String = "DestLongitudeRef";
        get dest_longitude: f64 = "DestLongitude";
        get processing_method: String = "ProcessingMethod";
        get area_information: String = "AreaInformation";
        get differential: i64 = "Differental";
        get h_positioning_error: f64 = "HPositioningError";
    }

    /// Signed decimal coordinate (south and west negative).
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        let mut lat = self.latitude()?;
        let mut lon = self.longitude()?;
        if self.latitude_ref() == Some(LatitudeRef::South) {
            lat = -lat;
        }
        if self.longitude_ref() == Some(LongitudeRef::West) {
            lon = -lon;
        }
        Some((lat, lon))
    }

    /// Store a signed decimal coordinate as magnitudes plus references.
    pub fn set_coordinate(&mut self, coordinate: Option<(f64, f64)>) {
        match coordinate {
            Some((lat, lon)) => {
                self.set_latitude_ref(Some(if lat < 0.0 {
                    LatitudeRef::South
                } else {
                    LatitudeRef::North
                }));
                self.set_latitude(Some(lat.abs()));
                self.set_longitude_ref(Some(if lon < 0.0 {
                    LongitudeRef::West
                } else {
                    LongitudeRef::East
                }));
                self.set_longitude(Some(lon.abs()));
            }
            None => {
                self.set_latitude_ref(None);
                self.set_latitude(None);
                self.set_longitude_ref(None);
                self.set_longitude(None);
            }
        }
    }

    /// Signed altitude in meters (below sea level negative).
    pub fn signed_altitude(&self) -> Option<f64> {
        let alt = self.altitude()?;
        match self.altitude_ref() {
            Some(AltitudeRef::BelowSeaLevel) => Some(-alt),
            _ => Some(alt),
        }
    }
}
