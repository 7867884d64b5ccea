//! Mapping between EXIF tags and namespace dictionary entries.
//!
//! Each row of the table names the namespace and key a tag is stored
//! under and the value shape it converts through. Tags without a row are
//! unknown to the dictionary; they are carried over untouched on rewrite.
//! Writable containers round-trip through `little_exif` tags; raw files
//! are read through `nom-exif` entries.

use little_exif::exif_tag::ExifTag;
use little_exif::rational::{iR64, uR64};
use nom_exif::EntryValue;

use crate::accessor::FromValue;
use crate::namespace::Namespace;
use crate::value::{Value, EXIF_DATE_FORMAT};

/// Conversion between one `little_exif` payload type and a [`Value`].
trait TagKind {
    type Raw;

    fn decode(raw: &Self::Raw) -> Option<Value>;

    fn encode(value: &Value) -> Option<Self::Raw>;

    fn from_entry(entry: &EntryValue) -> Option<Value>;
}

/// ASCII text; dates are accepted on write and formatted the EXIF way.
struct Text;
/// One SHORT, exposed as an integer.
struct Short;
/// SHORT array, exposed as an integer array.
struct Shorts;
/// One unsigned RATIONAL, exposed as a float.
struct Rational;
/// One signed RATIONAL, exposed as a float.
struct SRational;
/// Three RATIONALs (degrees, minutes, seconds), exposed as decimal degrees.
struct Dms;
/// One BYTE, exposed as an integer.
struct Byte;
/// UNDEFINED comment with an 8-byte character code prefix.
struct Comment;

impl TagKind for Text {
    type Raw = String;

    fn decode(raw: &String) -> Option<Value> {
        let text = raw.trim_end_matches('\0').trim();
        Some(Value::String(text.to_string()))
    }

    fn encode(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Date(d) => Some(d.format(EXIF_DATE_FORMAT).to_string()),
            _ => None,
        }
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        match entry {
            EntryValue::Text(s) => Self::decode(s),
            // nom-exif parses the three date tags
            EntryValue::NaiveDateTime(t) => Some(Value::String(t.format(EXIF_DATE_FORMAT).to_string())),
            EntryValue::Time(t) => Some(Value::String(
                t.naive_local().format(EXIF_DATE_FORMAT).to_string(),
            )),
            _ => None,
        }
    }
}

impl TagKind for Short {
    type Raw = Vec<u16>;

    fn decode(raw: &Vec<u16>) -> Option<Value> {
        raw.first().map(|v| Value::Integer(i64::from(*v)))
    }

    fn encode(value: &Value) -> Option<Vec<u16>> {
        u16::from_value(value).map(|v| vec![v])
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        let v = match entry {
            EntryValue::U16(v) => u32::from(*v),
            EntryValue::U16Array(a) => u32::from(*a.first()?),
            EntryValue::U8(v) => u32::from(*v),
            EntryValue::U32(v) => *v,
            _ => return None,
        };
        Some(Value::Integer(i64::from(v)))
    }
}

impl TagKind for Shorts {
    type Raw = Vec<u16>;

    fn decode(raw: &Vec<u16>) -> Option<Value> {
        Some(Value::Array(
            raw.iter().map(|v| Value::Integer(i64::from(*v))).collect(),
        ))
    }

    fn encode(value: &Value) -> Option<Vec<u16>> {
        Vec::<u16>::from_value(value).or_else(|| u16::from_value(value).map(|v| vec![v]))
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        match entry {
            EntryValue::U16Array(a) => Self::decode(a),
            EntryValue::U16(v) => Self::decode(&vec![*v]),
            _ => None,
        }
    }
}

impl TagKind for Rational {
    type Raw = Vec<uR64>;

    fn decode(raw: &Vec<uR64>) -> Option<Value> {
        raw.first().and_then(unsigned_to_f64).map(Value::Float)
    }

    fn encode(value: &Value) -> Option<Vec<uR64>> {
        let v = f64::from_value(value)?;
        f64_to_unsigned(v).map(|r| vec![r])
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        let r = match entry {
            EntryValue::URational(r) => *r,
            EntryValue::URationalArray(a) => *a.first()?,
            _ => return None,
        };
        ratio(f64::from(r.0), f64::from(r.1)).map(Value::Float)
    }
}

impl TagKind for SRational {
    type Raw = Vec<iR64>;

    fn decode(raw: &Vec<iR64>) -> Option<Value> {
        let r = raw.first()?;
        if r.denominator == 0 {
            return None;
        }
        Some(Value::Float(f64::from(r.nominator) / f64::from(r.denominator)))
    }

    fn encode(value: &Value) -> Option<Vec<iR64>> {
        let v = f64::from_value(value)?;
        if !v.is_finite() {
            return None;
        }
        let (nominator, denominator) = if v.fract() == 0.0 {
            (v as i32, 1)
        } else {
            ((v * 10000.0).round() as i32, 10000)
        };
        Some(vec![iR64 {
            nominator,
            denominator,
        }])
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        let (n, d) = match entry {
            EntryValue::IRational(r) => (f64::from(r.0), f64::from(r.1)),
            EntryValue::IRationalArray(a) => a.first().map(|r| (f64::from(r.0), f64::from(r.1)))?,
            EntryValue::URational(r) => (f64::from(r.0), f64::from(r.1)),
            _ => return None,
        };
        ratio(n, d).map(Value::Float)
    }
}

impl TagKind for Dms {
    type Raw = Vec<uR64>;

    fn decode(raw: &Vec<uR64>) -> Option<Value> {
        if raw.len() < 3 {
            return None;
        }
        let d = unsigned_to_f64(&raw[0])?;
        let m = unsigned_to_f64(&raw[1])?;
        let s = unsigned_to_f64(&raw[2])?;
        Some(Value::Float(dms_to_decimal(d, m, s)))
    }

    fn encode(value: &Value) -> Option<Vec<uR64>> {
        let v = f64::from_value(value)?;
        if !v.is_finite() {
            return None;
        }
        let (d, m, s_num, s_den) = decimal_to_dms(v);
        Some(vec![ur64(d, 1), ur64(m, 1), ur64(s_num, s_den)])
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        let EntryValue::URationalArray(a) = entry else {
            return None;
        };
        let raw: Vec<uR64> = a.iter().map(|r| ur64(r.0, r.1)).collect();
        Self::decode(&raw)
    }
}

impl TagKind for Byte {
    type Raw = Vec<u8>;

    fn decode(raw: &Vec<u8>) -> Option<Value> {
        raw.first().map(|v| Value::Integer(i64::from(*v)))
    }

    fn encode(value: &Value) -> Option<Vec<u8>> {
        u8::from_value(value).map(|v| vec![v])
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        match entry {
            EntryValue::U8(v) => Some(Value::Integer(i64::from(*v))),
            EntryValue::U8Array(a) => Self::decode(a),
            _ => None,
        }
    }
}

const ASCII_PREFIX: &[u8; 8] = b"ASCII\0\0\0";
const UNICODE_PREFIX: &[u8; 8] = b"UNICODE\0";

impl TagKind for Comment {
    type Raw = Vec<u8>;

    fn decode(raw: &Vec<u8>) -> Option<Value> {
        let text = if raw.len() >= 8 && raw[..8] == UNICODE_PREFIX[..] {
            let units: Vec<u16> = raw[8..]
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        } else if raw.len() >= 8 {
            String::from_utf8_lossy(&raw[8..]).to_string()
        } else {
            String::from_utf8_lossy(raw).to_string()
        };
        Some(Value::String(
            text.trim_end_matches('\0').trim().to_string(),
        ))
    }

    fn encode(value: &Value) -> Option<Vec<u8>> {
        let text = value.as_str()?;
        let mut bytes = ASCII_PREFIX.to_vec();
        bytes.extend_from_slice(text.as_bytes());
        Some(bytes)
    }

    fn from_entry(entry: &EntryValue) -> Option<Value> {
        match entry {
            EntryValue::Undefined(raw) | EntryValue::U8Array(raw) => Self::decode(raw),
            EntryValue::Text(s) => Some(Value::String(s.trim().to_string())),
            _ => None,
        }
    }
}

fn unsigned_to_f64(r: &uR64) -> Option<f64> {
    ratio(f64::from(r.nominator), f64::from(r.denominator))
}

fn ratio(nominator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| nominator / denominator)
}

fn f64_to_unsigned(v: f64) -> Option<uR64> {
    if !v.is_finite() || v < 0.0 || v > f64::from(u32::MAX) {
        return None;
    }
    if v.fract() == 0.0 {
        return Some(ur64(v as u32, 1));
    }
    // exposure times such as 1/250
    if v < 1.0 {
        let inverse = 1.0 / v;
        if (inverse - inverse.round()).abs() < 1e-9 {
            return Some(ur64(1, inverse.round() as u32));
        }
    }
    let scaled = (v * 10000.0).round();
    if scaled > f64::from(u32::MAX) {
        return Some(ur64(v.round() as u32, 1));
    }
    Some(ur64(scaled as u32, 10000))
}

pub(super) fn ur64(nominator: u32, denominator: u32) -> uR64 {
    uR64 {
        nominator,
        denominator,
    }
}

/// Convert decimal degrees to DMS (degrees, minutes, seconds numerator,
/// seconds denominator); seconds keep four decimal places.
pub(super) fn decimal_to_dms(decimal: f64) -> (u32, u32, u32, u32) {
    let d = decimal.abs();
    let degrees = d as u32;
    let minutes_full = (d - f64::from(degrees)) * 60.0;
    let minutes = minutes_full as u32;
    let seconds = (minutes_full - f64::from(minutes)) * 60.0;
    let seconds_num = (seconds * 10000.0).round() as u32;
    (degrees, minutes, seconds_num, 10000)
}

pub(super) fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

macro_rules! tag_table {
    ($($ns:ident $key:literal => $variant:ident: $kind:ident;)+) => {
        /// Every namespace entry the table can represent.
        pub(super) const REPRESENTED: &[(Namespace, &str)] = &[$((Namespace::$ns, $key)),+];

        /// Namespace, key and value of a known tag.
        pub(super) fn decode(tag: &ExifTag) -> Option<(Namespace, &'static str, Value)> {
            match tag {
                $(ExifTag::$variant(raw) => Some((Namespace::$ns, $key, $kind::decode(raw)?)),)+
                _ => None,
            }
        }

        /// The tag for a namespace entry; `None` when the entry has no tag
        /// or the value does not fit the tag's type.
        pub(super) fn encode(namespace: Namespace, key: &str, value: &Value) -> Option<ExifTag> {
            match (namespace, key) {
                $((Namespace::$ns, $key) => $kind::encode(value).map(ExifTag::$variant),)+
                _ => None,
            }
        }

        /// Namespace, key and value of a `nom-exif` entry from IFD0 or the
        /// Exif IFD. GPS codes overlap the interoperability IFD, so GPS rows
        /// never match here.
        pub(super) fn decode_entry(code: u16, entry: &EntryValue) -> Option<(Namespace, &'static str, Value)> {
            $(
                if Namespace::$ns != Namespace::Gps && ExifTag::$variant(Default::default()).as_u16() == code {
                    return Some((Namespace::$ns, $key, $kind::from_entry(entry)?));
                }
            )+
            None
        }
    };
}

tag_table! {
    Tiff "ImageDescription" => ImageDescription: Text;
    Tiff "Make" => Make: Text;
    Tiff "Model" => Model: Text;
    Tiff "Orientation" => Orientation: Short;
    Tiff "XResolution" => XResolution: Rational;
    Tiff "YResolution" => YResolution: Rational;
    Tiff "ResolutionUnit" => ResolutionUnit: Short;
    Tiff "Compression" => Compression: Short;
    Tiff "Software" => Software: Text;
    Tiff "DateTime" => ModifyDate: Text;
    Tiff "Artist" => Artist: Text;
    Tiff "Copyright" => Copyright: Text;

    Exif "ExposureTime" => ExposureTime: Rational;
    Exif "FNumber" => FNumber: Rational;
    Exif "ExposureProgram" => ExposureProgram: Short;
    Exif "ISOSpeedRatings" => ISO: Shorts;
    Exif "DateTimeOriginal" => DateTimeOriginal: Text;
    Exif "DateTimeDigitized" => CreateDate: Text;
    Exif "OffsetTime" => OffsetTime: Text;
    Exif "OffsetTimeOriginal" => OffsetTimeOriginal: Text;
    Exif "OffsetTimeDigitized" => OffsetTimeDigitized: Text;
    Exif "SubsecTime" => SubSecTime: Text;
    Exif "SubsecTimeOriginal" => SubSecTimeOriginal: Text;
    Exif "SubsecTimeDigitized" => SubSecTimeDigitized: Text;
    Exif "CompressedBitsPerPixel" => CompressedBitsPerPixel: Rational;
    Exif "ShutterSpeedValue" => ShutterSpeedValue: SRational;
    Exif "ApertureValue" => ApertureValue: Rational;
    Exif "BrightnessValue" => BrightnessValue: SRational;
    Exif "ExposureBiasValue" => ExposureCompensation: SRational;
    Exif "MaxApertureValue" => MaxApertureValue: Rational;
    Exif "SubjectDistance" => SubjectDistance: Rational;
    Exif "MeteringMode" => MeteringMode: Short;
    Exif "LightSource" => LightSource: Short;
    Exif "Flash" => Flash: Short;
    Exif "FocalLength" => FocalLength: Rational;
    Exif "UserComment" => UserComment: Comment;
    Exif "ColorSpace" => ColorSpace: Short;
    Exif "SensingMethod" => SensingMethod: Short;
    Exif "CustomRendered" => CustomRendered: Short;
    Exif "ExposureMode" => ExposureMode: Short;
    Exif "WhiteBalance" => WhiteBalance: Short;
    Exif "DigitalZoomRatio" => DigitalZoomRatio: Rational;
    Exif "FocalLenIn35mmFilm" => FocalLengthIn35mmFormat: Short;
    Exif "SceneCaptureType" => SceneCaptureType: Short;
    Exif "GainControl" => GainControl: Short;
    Exif "Contrast" => Contrast: Short;
    Exif "Saturation" => Saturation: Short;
    Exif "Sharpness" => Sharpness: Short;
    Exif "SubjectDistRange" => SubjectDistanceRange: Short;
    Exif "CameraOwnerName" => OwnerName: Text;
    Exif "BodySerialNumber" => SerialNumber: Text;
    Exif "LensMake" => LensMake: Text;
    Exif "LensModel" => LensModel: Text;
    Exif "LensSerialNumber" => LensSerialNumber: Text;

    Gps "LatitudeRef" => GPSLatitudeRef: Text;
    Gps "Latitude" => GPSLatitude: Dms;
    Gps "LongitudeRef" => GPSLongitudeRef: Text;
    Gps "Longitude" => GPSLongitude: Dms;
    Gps "AltitudeRef" => GPSAltitudeRef: Byte;
    Gps "Altitude" => GPSAltitude: Rational;
}

/// IFD pointers and thumbnail/strip layout, rebuilt by the serializer.
pub(super) fn is_structural(tag: &ExifTag) -> bool {
    matches!(
        tag,
        ExifTag::ExifOffset(_)
            | ExifTag::GPSInfo(_)
            | ExifTag::InteropOffset(_)
            | ExifTag::ThumbnailOffset(..)
            | ExifTag::ThumbnailLength(_)
            | ExifTag::StripOffsets(..)
            | ExifTag::StripByteCounts(_)
    )
}
