//! [`PropertyCodec`] over real image containers.
//!
//! Container structure goes through `img-parts` (segments and chunks are
//! preserved byte for byte), EXIF of writable containers through
//! `little_exif`, EXIF of raw files through `nom-exif`, and header-only
//! dimension reads through `image`.

use std::borrow::Cow;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use image::{ColorType, ImageDecoder, ImageReader};
use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::png::{Png, PngChunk};
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata as ExifMetadata;
use nom_exif::{ExifIter, GPSInfo, LatLng, MediaParser, MediaSource};

use super::iptc::{self, Resource};
use super::tags;
use super::{CodecError, ImageSource, OutputType, PropertyCodec, ReadOptions};
use crate::accessor::describe;
use crate::formats::ContainerFormat;
use crate::namespace::Namespace;
use crate::value::{Dictionary, Value};

// img-parts exif()/set_exif() carry just the TIFF data (after Exif\0\0),
// which is also what little_exif's encode() produces
const EXIF_PREFIX: &[u8] = b"Exif\0\0";
// GPS tag codes end here; entries at or below it belong to a sub-IFD
const LAST_GPS_TAG: u16 = 0x001F;

const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP13: u8 = 0xED;
const MARKER_SOF2: u8 = 0xC2;

/// PNG text keywords and the `{PNG}` keys they are stored under.
const PNG_TEXT_KEYS: &[(&str, &str)] = &[
    ("Title", "Title"),
    ("Author", "Author"),
    ("Description", "Description"),
    ("Copyright", "Copyright"),
    ("Creation Time", "CreationTime"),
    ("Software", "Software"),
    ("Disclaimer", "Disclaimer"),
    ("Warning", "Warning"),
    ("Source", "Source"),
    ("Comment", "Comment"),
];

/// Reads JPEG, PNG, GIF, WebP, TIFF, CR2, CRW, NEF, DNG and PSD; writes
/// JPEG, PNG and WebP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerCodec;

impl ContainerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl PropertyCodec for ContainerCodec {
    fn read_properties(
        &self,
        source: ImageSource<'_>,
        options: &ReadOptions,
    ) -> Result<Dictionary, CodecError> {
        if options.should_cache {
            log::debug!("Caching requested; metadata reads never decode pixels");
        }
        let (bytes, path_format) = match source {
            ImageSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    CodecError::CannotCreateSource(format!("{}: {e}", path.display()))
                })?;
                (Cow::Owned(bytes), ContainerFormat::from_path(path))
            }
            ImageSource::Bytes(bytes) => (Cow::Borrowed(bytes), None),
        };
        let detected = ContainerFormat::detect(&bytes).ok_or_else(|| {
            CodecError::CannotCreateSource("unrecognized image data".to_string())
        })?;
        // NEF and DNG carry a plain TIFF signature
        let format = match path_format {
            Some(f) if detected == ContainerFormat::Tiff && f.is_tiff_based() => f,
            _ => detected,
        };
        log::debug!("Reading properties of a {} container", format.type_identifier());
        read_container(format, &bytes)
    }

    fn apply_properties(
        &self,
        metadata: &Dictionary,
        image: &[u8],
        output: OutputType,
    ) -> Result<Vec<u8>, CodecError> {
        if image.is_empty() {
            return Err(CodecError::CannotCreateSource("image data is empty".to_string()));
        }
        let source = ContainerFormat::detect(image).ok_or(CodecError::CannotDetermineSourceType)?;
        let target = output.resolve(source)?;
        match target {
            ContainerFormat::Jpeg => write_jpeg(metadata, image),
            ContainerFormat::Png => write_png(metadata, image),
            ContainerFormat::WebP => write_webp(metadata, image),
            other => Err(CodecError::CannotCreateDestination(format!(
                "writing {} is not supported",
                other.type_identifier()
            ))),
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

fn read_container(format: ContainerFormat, bytes: &[u8]) -> Result<Dictionary, CodecError> {
    let mut dict = Dictionary::new();
    dict.insert("FileSize".into(), Value::Integer(bytes.len() as i64));

    if let Some(image_format) = format.image_format() {
        match read_header(&mut dict, image_format, bytes) {
            Ok(()) => {}
            // raw files often hold no primary image the TIFF decoder understands
            Err(e) if format.is_tiff_based() => {
                log::debug!("No decodable image header: {e}");
            }
            Err(e) => return Err(CodecError::CannotExtractProperties(e.to_string())),
        }
    }
    if format == ContainerFormat::Gif {
        dict.insert("IsIndexed".into(), Value::Bool(true));
    }

    match format {
        ContainerFormat::Jpeg => read_jpeg(&mut dict, bytes)?,
        ContainerFormat::Png => read_png(&mut dict, bytes)?,
        ContainerFormat::WebP => {
            let webp = WebP::from_bytes(Bytes::copy_from_slice(bytes))
                .map_err(|e| CodecError::CannotExtractProperties(e.to_string()))?;
            if let Some(blob) = webp.exif() {
                read_exif_blob(&mut dict, &blob);
            }
        }
        ContainerFormat::Gif => read_gif(&mut dict, bytes),
        ContainerFormat::Psd => read_psd(&mut dict, bytes)?,
        ContainerFormat::Crw => {
            log::debug!("CIFF heap records are not decoded");
        }
        ContainerFormat::Tiff | ContainerFormat::Cr2 | ContainerFormat::Nef | ContainerFormat::Dng => {
            read_raw_exif(&mut dict, bytes);
        }
    }
    Ok(dict)
}

/// Dimensions and sample layout without decoding pixels.
fn read_header(
    dict: &mut Dictionary,
    format: image::ImageFormat,
    bytes: &[u8],
) -> image::ImageResult<()> {
    let decoder = ImageReader::with_format(Cursor::new(bytes), format).into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    dict.insert("PixelWidth".into(), Value::Integer(i64::from(width)));
    dict.insert("PixelHeight".into(), Value::Integer(i64::from(height)));
    let channels = u16::from(color.channel_count()).max(1);
    dict.insert(
        "Depth".into(),
        Value::Integer(i64::from(color.bits_per_pixel() / channels)),
    );
    dict.insert("HasAlpha".into(), Value::Bool(color.has_alpha()));
    dict.insert(
        "IsFloat".into(),
        Value::Bool(matches!(color, ColorType::Rgb32F | ColorType::Rgba32F)),
    );
    let model = if color.has_color() { "RGB" } else { "Gray" };
    dict.insert("ColorModel".into(), Value::String(model.into()));
    Ok(())
}

fn read_jpeg(dict: &mut Dictionary, bytes: &[u8]) -> Result<(), CodecError> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(bytes))
        .map_err(|e| CodecError::CannotExtractProperties(e.to_string()))?;

    if let Some(blob) = jpeg.exif() {
        read_exif_blob(dict, &blob);
    }

    let mut jfif = Dictionary::new();
    for segment in jpeg.segments() {
        let contents = segment.contents();
        match segment.marker() {
            MARKER_APP0 if contents.len() >= 12 && contents.starts_with(b"JFIF\0") => {
                jfif.insert(
                    "JFIFVersion".into(),
                    Value::Array(vec![
                        Value::Integer(i64::from(contents[5])),
                        Value::Integer(i64::from(contents[6])),
                    ]),
                );
                jfif.insert("DensityUnit".into(), Value::Integer(i64::from(contents[7])));
                let x = u16::from_be_bytes([contents[8], contents[9]]);
                let y = u16::from_be_bytes([contents[10], contents[11]]);
                jfif.insert("XDensity".into(), Value::Integer(i64::from(x)));
                jfif.insert("YDensity".into(), Value::Integer(i64::from(y)));
            }
            MARKER_APP13 => {
                if let Some(resources) = iptc::parse_app13(contents) {
                    read_resources(dict, &resources);
                }
            }
            MARKER_SOF2 => {
                jfif.insert("IsProgressive".into(), Value::Bool(true));
            }
            _ => {}
        }
    }
    if !jfif.is_empty() {
        dict.insert(Namespace::Jfif.key().into(), Value::Dictionary(jfif));
    }
    Ok(())
}

fn read_png(dict: &mut Dictionary, bytes: &[u8]) -> Result<(), CodecError> {
    let png = Png::from_bytes(Bytes::copy_from_slice(bytes))
        .map_err(|e| CodecError::CannotExtractProperties(e.to_string()))?;
    if let Some(blob) = png.exif() {
        read_exif_blob(dict, &blob);
    }

    let mut text = Dictionary::new();
    for chunk in png.chunks() {
        if chunk.kind() != *b"tEXt" {
            continue;
        }
        let contents = chunk.contents();
        let Some(split) = contents.iter().position(|b| *b == 0) else {
            continue;
        };
        let keyword = String::from_utf8_lossy(&contents[..split]);
        if let Some((_, key)) = PNG_TEXT_KEYS.iter().find(|(k, _)| *k == keyword) {
            // tEXt is Latin-1
            let value: String = contents[split + 1..].iter().map(|b| char::from(*b)).collect();
            text.insert(key.to_string(), Value::String(value));
        }
    }
    if !text.is_empty() {
        dict.insert(Namespace::Png.key().into(), Value::Dictionary(text));
    }
    Ok(())
}

/// Logical screen descriptor plus the first loop and delay extensions.
fn read_gif(dict: &mut Dictionary, bytes: &[u8]) {
    if bytes.len() < 13 {
        return;
    }
    let mut gif = Dictionary::new();
    let width = u16::from_le_bytes([bytes[6], bytes[7]]);
    let height = u16::from_le_bytes([bytes[8], bytes[9]]);
    gif.insert("CanvasPixelWidth".into(), Value::Integer(i64::from(width)));
    gif.insert("CanvasPixelHeight".into(), Value::Integer(i64::from(height)));
    gif.insert(
        "HasGlobalColorMap".into(),
        Value::Bool(bytes[10] & 0x80 != 0),
    );
    if let Some(pos) = find(bytes, b"NETSCAPE2.0") {
        let sub = &bytes[pos + 11..];
        if sub.len() >= 4 && sub[0] == 3 && sub[1] == 1 {
            let count = u16::from_le_bytes([sub[2], sub[3]]);
            gif.insert("LoopCount".into(), Value::Integer(i64::from(count)));
        }
    }
    if let Some(pos) = find(bytes, &[0x21, 0xF9, 0x04]) {
        if let Some(delay) = bytes.get(pos + 4..pos + 6) {
            let centis = u16::from_le_bytes([delay[0], delay[1]]);
            let seconds = f64::from(centis) / 100.0;
            gif.insert("UnclampedDelayTime".into(), Value::Float(seconds));
            gif.insert("DelayTime".into(), Value::Float(seconds.max(0.1)));
        }
    }
    dict.insert(Namespace::Gif.key().into(), Value::Dictionary(gif));
}

fn read_psd(dict: &mut Dictionary, bytes: &[u8]) -> Result<(), CodecError> {
    let header_error = || CodecError::CannotExtractProperties("truncated PSD header".to_string());
    if bytes.len() < 30 {
        return Err(header_error());
    }
    let be16 = |at: usize| u16::from_be_bytes([bytes[at], bytes[at + 1]]);
    let be32 = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    let version = be16(4);
    let channels = be16(12);
    let height = be32(14);
    let width = be32(18);
    let depth = be16(22);
    let mode = be16(24);

    dict.insert("PixelWidth".into(), Value::Integer(i64::from(width)));
    dict.insert("PixelHeight".into(), Value::Integer(i64::from(height)));
    dict.insert("Depth".into(), Value::Integer(i64::from(depth)));
    dict.insert("IsFloat".into(), Value::Bool(depth == 32));
    dict.insert("IsIndexed".into(), Value::Bool(mode == 2));
    let model = match mode {
        1 | 8 => Some("Gray"),
        3 => Some("RGB"),
        4 => Some("CMYK"),
        9 => Some("Lab"),
        _ => None,
    };
    if let Some(model) = model {
        dict.insert("ColorModel".into(), Value::String(model.into()));
    }

    let mut info = Dictionary::new();
    info.insert("Version".into(), Value::Integer(i64::from(version)));
    info.insert("Channels".into(), Value::Integer(i64::from(channels)));
    info.insert("ColorMode".into(), Value::Integer(i64::from(mode)));

    let color_data_len = be32(26) as usize;
    let resources_at = 30usize.saturating_add(color_data_len);
    if resources_at + 4 <= bytes.len() {
        let len = be32(resources_at) as usize;
        let start = resources_at + 4;
        let end = start.saturating_add(len).min(bytes.len());
        let resources = iptc::parse_resources(&bytes[start..end]);
        info.insert(
            "ResourceIDs".into(),
            Value::Array(resources.iter().map(|r| Value::Integer(i64::from(r.id))).collect()),
        );
        read_resources(dict, &resources);
    }
    dict.insert(Namespace::Photoshop.key().into(), Value::Dictionary(info));
    Ok(())
}

/// IPTC, EXIF and resolution from Photoshop image resources.
fn read_resources(dict: &mut Dictionary, resources: &[Resource]) {
    for resource in resources {
        match resource.id {
            iptc::RESOURCE_IPTC => {
                let decoded = iptc::decode_iim(&resource.data);
                if !decoded.is_empty() {
                    dict.insert(Namespace::Iptc.key().into(), Value::Dictionary(decoded));
                }
            }
            iptc::RESOURCE_EXIF => read_exif_blob(dict, &resource.data),
            iptc::RESOURCE_RESOLUTION if resource.data.len() >= 12 => {
                let d = &resource.data;
                // 16.16 fixed point
                let h = u32::from_be_bytes([d[0], d[1], d[2], d[3]]) >> 16;
                let v = u32::from_be_bytes([d[8], d[9], d[10], d[11]]) >> 16;
                dict.entry("DPIWidth".into())
                    .or_insert(Value::Integer(i64::from(h)));
                dict.entry("DPIHeight".into())
                    .or_insert(Value::Integer(i64::from(v)));
            }
            _ => {}
        }
    }
}

/// Decode a bare TIFF-structured EXIF blob.
fn read_exif_blob(dict: &mut Dictionary, blob: &[u8]) {
    match parse_exif_blob(blob) {
        Some(exif) => distribute(dict, primary_tags(&exif).filter_map(tags::decode)),
        None => log::debug!("EXIF block present but unreadable ({} bytes)", blob.len()),
    }
}

/// Parse a TIFF-structured blob with little_exif.
fn parse_exif_blob(blob: &[u8]) -> Option<ExifMetadata> {
    let blob = blob.to_vec();
    match guarded(move || ExifMetadata::new_from_vec(&blob, FileExtension::TIFF)) {
        Some(Ok(exif)) => {
            log::debug!("little_exif loaded {} existing EXIF tags", primary_tags(&exif).count());
            Some(exif)
        }
        Some(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        None => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Tags of IFD0 and its sub-IFDs; the thumbnail IFD is left out.
fn primary_tags(exif: &ExifMetadata) -> impl Iterator<Item = &ExifTag> {
    exif.get_ifds()
        .iter()
        .filter(|ifd| ifd.get_generic_ifd_nr() == 0)
        .flat_map(|ifd| ifd.get_tags().iter())
}

/// EXIF of TIFF-family raw files, read with nom-exif.
fn read_raw_exif(dict: &mut Dictionary, bytes: &[u8]) {
    let mut parser = MediaParser::new();
    let parsed = MediaSource::seekable(Cursor::new(bytes)).and_then(|ms| parser.parse(ms));
    let iter: ExifIter = match parsed {
        Ok(iter) => iter,
        Err(e) => {
            log::debug!("No EXIF data found in raw file: {e}");
            return;
        }
    };

    // Parse GPS info before iterating (iteration consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let entries: Vec<_> = iter
        .filter(|entry| entry.ifd_index() == 0 && entry.tag_code() > LAST_GPS_TAG)
        .filter_map(|entry| tags::decode_entry(entry.tag_code(), entry.get_value()?))
        .collect();
    let gps = gps_info.map(|gps| gps_entries(&gps)).unwrap_or_default();
    distribute(dict, entries.into_iter().chain(gps));
}

/// `{GPS}` entries from nom-exif's GPS summary. Components nom-exif did
/// not find are left at zero denominators and skipped.
fn gps_entries(gps: &GPSInfo) -> Vec<(Namespace, &'static str, Value)> {
    let mut entries = Vec::new();
    let mut coordinate = |ref_key, key, reference: char, latlng: &LatLng| {
        if let Some(decimal) = latlng_to_decimal(latlng) {
            entries.push((Namespace::Gps, key, Value::Float(decimal)));
            if reference.is_ascii_alphabetic() {
                entries.push((Namespace::Gps, ref_key, Value::String(reference.to_string())));
            }
        }
    };
    coordinate("LatitudeRef", "Latitude", gps.latitude_ref, &gps.latitude);
    coordinate("LongitudeRef", "Longitude", gps.longitude_ref, &gps.longitude);
    if gps.altitude.1 != 0 {
        let altitude = f64::from(gps.altitude.0) / f64::from(gps.altitude.1);
        entries.push((Namespace::Gps, "Altitude", Value::Float(altitude)));
        entries.push((Namespace::Gps, "AltitudeRef", Value::Integer(i64::from(gps.altitude_ref))));
    }
    entries
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to unsigned
/// decimal degrees; the hemisphere stays in the reference key.
fn latlng_to_decimal(latlng: &LatLng) -> Option<f64> {
    let parts = [latlng.0, latlng.1, latlng.2];
    if parts.iter().any(|r| r.1 == 0) {
        return None;
    }
    let [d, m, s] = parts.map(|r| f64::from(r.0) / f64::from(r.1));
    Some(tags::dms_to_decimal(d, m, s))
}

/// Sort decoded entries into their namespaces and derive the root keys.
fn distribute(
    dict: &mut Dictionary,
    entries: impl IntoIterator<Item = (Namespace, &'static str, Value)>,
) {
    let mut namespaces: Vec<(Namespace, Dictionary)> = Vec::new();
    for (namespace, key, value) in entries {
        match namespaces.iter_mut().find(|(ns, _)| *ns == namespace) {
            Some((_, sub)) => {
                sub.insert(key.to_string(), value);
            }
            None => {
                let mut sub = Dictionary::new();
                sub.insert(key.to_string(), value);
                namespaces.push((namespace, sub));
            }
        }
    }

    if let Some((_, tiff)) = namespaces.iter().find(|(ns, _)| *ns == Namespace::Tiff) {
        if let Some(orientation) = tiff.get("Orientation") {
            dict.insert("Orientation".into(), orientation.clone());
        }
        // resolution unit 3 is centimeters
        let per_inch = if tiff.get("ResolutionUnit") == Some(&Value::Integer(3)) {
            2.54
        } else {
            1.0
        };
        for (tiff_key, root_key) in [("XResolution", "DPIWidth"), ("YResolution", "DPIHeight")] {
            if let Some(res) = tiff.get(tiff_key).and_then(Value::as_f64) {
                let dpi = (res * per_inch).round() as i64;
                dict.insert(root_key.into(), Value::Integer(dpi));
            }
        }
    }

    for (namespace, sub) in namespaces {
        dict.insert(namespace.key().into(), Value::Dictionary(sub));
    }
}

/// Run a little_exif call, turning a panic into `None`.
fn guarded<T>(f: impl FnOnce() -> T) -> Option<T> {
    // Suppress panics from little_exif
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(prev_hook);
    result.ok()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Writing
// ============================================================================

/// What to do with one represented EXIF entry.
#[derive(Debug, Clone)]
enum Action {
    Keep,
    Remove,
    Set(ExifTag),
}

/// Whether `metadata` says anything about EXIF at all.
fn touches_exif(metadata: &Dictionary) -> bool {
    metadata.contains_key("Orientation")
        || [Namespace::Tiff, Namespace::Exif, Namespace::Gps]
            .iter()
            .any(|ns| metadata.contains_key(ns.key()))
}

/// Encode one entry, falling back to keeping the stored tag.
fn set_or_keep(namespace: Namespace, key: &str, value: &Value) -> Action {
    match tags::encode(namespace, key, value) {
        Some(tag) => Action::Set(tag),
        None => {
            log::warn!(
                "{}.{key}: cannot store {}; keeping the stored value",
                namespace.key(),
                describe(Some(value))
            );
            Action::Keep
        }
    }
}

fn plan(metadata: &Dictionary, namespace: Namespace, key: &str) -> Action {
    // orientation is owned by the root key; the {TIFF} copy only applies
    // when the root key is omitted
    if namespace == Namespace::Tiff && key == "Orientation" {
        let nested = metadata
            .get(namespace.key())
            .and_then(Value::as_dictionary)
            .and_then(|tiff| tiff.get(key));
        return match metadata.get("Orientation") {
            Some(root) => {
                if nested.is_some_and(|nested| nested != root) {
                    log::debug!(
                        "Orientation {} overrides {{TIFF}}.Orientation {}",
                        describe(Some(root)),
                        describe(nested)
                    );
                }
                match root {
                    Value::Null => Action::Remove,
                    value => set_or_keep(namespace, key, value),
                }
            }
            None => match nested {
                Some(Value::Null) => Action::Remove,
                Some(value) => set_or_keep(namespace, key, value),
                None => Action::Keep,
            },
        };
    }
    match metadata.get(namespace.key()) {
        None => Action::Keep,
        Some(Value::Null) => Action::Remove,
        Some(Value::Dictionary(sub)) => match sub.get(key) {
            None | Some(Value::Null) => Action::Remove,
            Some(value) => set_or_keep(namespace, key, value),
        },
        Some(other) => {
            log::warn!(
                "{} is a {}, not a dictionary; left unchanged",
                namespace.key(),
                other.type_name()
            );
            Action::Keep
        }
    }
}

/// Rebuild a TIFF-structured EXIF blob from the stored tags and `metadata`.
///
/// Returns `None` when no tag remains.
fn rewrite_exif(existing: Option<&[u8]>, metadata: &Dictionary) -> Result<Option<Vec<u8>>, CodecError> {
    let drop_unknown = matches!(metadata.get(Namespace::Exif.key()), Some(Value::Null));

    let stored: Vec<ExifTag> = match existing.filter(|b| !b.is_empty()) {
        None => Vec::new(),
        Some(blob) => match parse_exif_blob(blob) {
            Some(exif) => primary_tags(&exif).cloned().collect(),
            None if drop_unknown => {
                log::warn!("Discarding an unreadable EXIF block");
                Vec::new()
            }
            None => {
                return Err(CodecError::CannotCreateDestination(
                    "stored EXIF block cannot be parsed".to_string(),
                ));
            }
        },
    };

    let actions: Vec<((Namespace, &str), Action)> = tags::REPRESENTED
        .iter()
        .map(|(ns, key)| ((*ns, *key), plan(metadata, *ns, key)))
        .collect();
    let action_for = |ns: Namespace, key: &str| {
        actions
            .iter()
            .find(|((n, k), _)| *n == ns && *k == key)
            .map(|(_, a)| a)
    };

    let mut fresh = ExifMetadata::new();
    let mut count = 0usize;
    for tag in stored {
        if tags::is_structural(&tag) {
            continue;
        }
        let keep = match tags::decode(&tag) {
            Some((ns, key, _)) => matches!(action_for(ns, key), Some(Action::Keep) | None),
            None => !drop_unknown,
        };
        if keep {
            fresh.set_tag(tag);
            count += 1;
        }
    }
    for (_, action) in actions {
        if let Action::Set(tag) = action {
            fresh.set_tag(tag);
            count += 1;
        }
    }
    log::debug!("Rewriting EXIF with {count} tags");

    if count == 0 {
        return Ok(None);
    }
    let bytes = guarded(move || fresh.encode())
        .ok_or_else(|| CodecError::FinalizeFailed("EXIF serialization panicked".to_string()))?
        .map_err(|e| CodecError::FinalizeFailed(e.to_string()))?;
    if bytes.len() <= 8 {
        return Err(CodecError::FinalizeFailed("EXIF serialization was empty".to_string()));
    }
    Ok(Some(bytes))
}

fn write_jpeg(metadata: &Dictionary, image: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(image))
        .map_err(|e| CodecError::CannotCreateSource(e.to_string()))?;

    if touches_exif(metadata) {
        let orig_exif_pos = find_exif_segment_pos(&jpeg);
        let existing = jpeg.exif();
        let rewritten = rewrite_exif(existing.as_deref(), metadata)?;
        jpeg.set_exif(rewritten.map(Bytes::from));

        // set_exif() inserts at position 3; move the segment back to where
        // it was so EXIF stays ahead of XMP
        if let (Some(target), Some(new_pos)) = (orig_exif_pos, find_exif_segment_pos(&jpeg)) {
            if target < new_pos {
                let segments = jpeg.segments_mut();
                let seg = segments.remove(new_pos);
                segments.insert(target, seg);
            }
        }
    }

    if let Some(value) = metadata.get(Namespace::Iptc.key()) {
        update_iptc(&mut jpeg, value);
    }

    Ok(jpeg.encoder().bytes().to_vec())
}

fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_PREFIX))
}

/// Replace (or with `Null`, remove) the IIM resource of the APP13 segment.
fn update_iptc(jpeg: &mut Jpeg, value: &Value) {
    let app13_pos = jpeg
        .segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP13 && s.contents().starts_with(iptc::APP13_HEADER));
    let mut resources = app13_pos
        .and_then(|pos| iptc::parse_app13(jpeg.segments()[pos].contents()))
        .unwrap_or_default();
    let existing_iim = resources
        .iter()
        .find(|r| r.id == iptc::RESOURCE_IPTC)
        .map(|r| r.data.clone());
    resources.retain(|r| r.id != iptc::RESOURCE_IPTC);

    match value {
        Value::Null => {}
        Value::Dictionary(dict) => {
            resources.push(Resource {
                id: iptc::RESOURCE_IPTC,
                name: vec![0, 0],
                data: iptc::encode_iim(dict, existing_iim.as_deref()),
            });
        }
        other => {
            log::warn!("{{IPTC}} is a {}, not a dictionary; left unchanged", other.type_name());
            return;
        }
    }

    let segments = jpeg.segments_mut();
    if resources.is_empty() {
        if let Some(pos) = app13_pos {
            segments.remove(pos);
        }
        return;
    }
    let segment = JpegSegment::new_with_contents(MARKER_APP13, Bytes::from(iptc::build_app13(&resources)));
    match app13_pos {
        Some(pos) => segments[pos] = segment,
        None => {
            // after the APP0/APP1 headers
            let insert_pos = segments
                .iter()
                .position(|s| !(MARKER_APP0..=MARKER_APP1).contains(&s.marker()))
                .unwrap_or(segments.len());
            segments.insert(insert_pos, segment);
        }
    }
}

fn write_png(metadata: &Dictionary, image: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut png = Png::from_bytes(Bytes::copy_from_slice(image))
        .map_err(|e| CodecError::CannotCreateSource(e.to_string()))?;

    if touches_exif(metadata) {
        let existing = png.exif();
        let rewritten = rewrite_exif(existing.as_deref(), metadata)?;
        png.set_exif(rewritten.map(Bytes::from));
    }

    match metadata.get(Namespace::Png.key()) {
        None => {}
        Some(Value::Null) => replace_png_text(&mut png, &Dictionary::new()),
        Some(Value::Dictionary(text)) => replace_png_text(&mut png, text),
        Some(other) => {
            log::warn!("{{PNG}} is a {}, not a dictionary; left unchanged", other.type_name());
        }
    }

    Ok(png.encoder().bytes().to_vec())
}

/// Replace the known `tEXt` entries with those in `text`.
fn replace_png_text(png: &mut Png, text: &Dictionary) {
    let chunks = png.chunks_mut();
    chunks.retain(|chunk| {
        if chunk.kind() != *b"tEXt" {
            return true;
        }
        let contents = chunk.contents();
        let keyword_end = contents.iter().position(|b| *b == 0).unwrap_or(contents.len());
        let keyword = &contents[..keyword_end];
        !PNG_TEXT_KEYS.iter().any(|(k, _)| k.as_bytes() == keyword)
    });

    // before IEND
    let mut insert_at = chunks.len().saturating_sub(1);
    for (keyword, key) in PNG_TEXT_KEYS {
        let Some(value) = text.get(*key) else {
            continue;
        };
        let Some(s) = value.as_str() else {
            if !value.is_null() {
                log::warn!("{{PNG}}.{key}: cannot store a {} value", value.type_name());
            }
            continue;
        };
        let mut contents = keyword.as_bytes().to_vec();
        contents.push(0);
        // Latin-1; anything outside it becomes '?'
        contents.extend(s.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')));
        chunks.insert(insert_at, PngChunk::new(*b"tEXt", Bytes::from(contents)));
        insert_at += 1;
    }
}

fn write_webp(metadata: &Dictionary, image: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut webp = WebP::from_bytes(Bytes::copy_from_slice(image))
        .map_err(|e| CodecError::CannotCreateSource(e.to_string()))?;
    if touches_exif(metadata) {
        let existing = webp.exif();
        let rewritten = rewrite_exif(existing.as_deref(), metadata)?;
        webp.set_exif(rewritten.map(Bytes::from));
    }
    Ok(webp.encoder().bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, MetadataGps, Orientation};
    use crate::node::MetadataView;
    use crate::strip::strip;
    use image::{ExtendedColorType, ImageEncoder, RgbImage};

    fn sample_rgb() -> RgbImage {
        RgbImage::from_fn(16, 8, |x, y| image::Rgb([(x * 16) as u8, (y * 32) as u8, 128]))
    }

    fn sample_jpeg() -> Vec<u8> {
        let img = sample_rgb();
        let mut out = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut out)
            .write_image(img.as_raw(), 16, 8, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn sample_png() -> Vec<u8> {
        let img = sample_rgb();
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(img.as_raw(), 16, 8, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn read(bytes: &[u8]) -> Dictionary {
        ContainerCodec
            .read_properties(ImageSource::Bytes(bytes), &ReadOptions::default())
            .unwrap()
    }

    fn camera_update() -> Dictionary {
        let mut exif = Dictionary::new();
        exif.insert("ISOSpeedRatings".into(), Value::Array(vec![Value::Integer(100)]));
        exif.insert("ExposureTime".into(), Value::Float(1.0 / 250.0));
        let mut gps = Dictionary::new();
        gps.insert("Latitude".into(), Value::Float(48.8584));
        gps.insert("LatitudeRef".into(), Value::String("N".into()));
        gps.insert("Longitude".into(), Value::Float(2.2945));
        gps.insert("LongitudeRef".into(), Value::String("E".into()));
        let mut tiff = Dictionary::new();
        tiff.insert("Make".into(), Value::String("Canon".into()));
        let mut root = Dictionary::new();
        root.insert("{Exif}".into(), Value::Dictionary(exif));
        root.insert("{GPS}".into(), Value::Dictionary(gps));
        root.insert("{TIFF}".into(), Value::Dictionary(tiff));
        root.insert("Orientation".into(), Value::Integer(6));
        root
    }

    fn camera_jpeg() -> Vec<u8> {
        ContainerCodec
            .apply_properties(&camera_update(), &sample_jpeg(), OutputType::Source)
            .unwrap()
    }

    #[test]
    fn reads_jpeg_header() {
        let jpeg = sample_jpeg();
        let dict = read(&jpeg);
        assert_eq!(dict.get("FileSize"), Some(&Value::Integer(jpeg.len() as i64)));
        assert_eq!(dict.get("PixelWidth"), Some(&Value::Integer(16)));
        assert_eq!(dict.get("PixelHeight"), Some(&Value::Integer(8)));
        assert_eq!(dict.get("Depth"), Some(&Value::Integer(8)));
        assert_eq!(dict.get("HasAlpha"), Some(&Value::Bool(false)));
        assert_eq!(dict.get("ColorModel"), Some(&Value::String("RGB".into())));
        assert!(!dict.contains_key("{Exif}"));
    }

    #[test]
    fn writes_and_reads_exif() {
        let dict = read(&camera_jpeg());
        let meta = Metadata::new(dict);
        assert_eq!(meta.orientation(), Some(Orientation::Right));
        let exif = meta.exif().unwrap();
        assert_eq!(exif.iso_speed_ratings(), Some(vec![100]));
        assert_eq!(exif.exposure_time(), Some(1.0 / 250.0));
        assert_eq!(meta.tiff().unwrap().make().as_deref(), Some("Canon"));
        let (lat, lon) = meta.gps().unwrap().coordinate().unwrap();
        assert!((lat - 48.8584).abs() < 1e-6);
        assert!((lon - 2.2945).abs() < 1e-6);
        // pixels untouched
        assert_eq!(meta.pixel_width(), Some(16));
    }

    #[test]
    fn iso_edit_keeps_gps() {
        let image = camera_jpeg();
        let codec = ContainerCodec::new();
        let mut meta = Metadata::from_bytes(&codec, &image).unwrap();
        let latitude = meta.gps().and_then(|g| g.latitude()).unwrap();

        let mut exif = meta.exif().unwrap();
        exif.set_iso_speed_ratings(Some(vec![200]));
        meta.set_exif(Some(exif));
        let out = meta.apply(&codec, &image, OutputType::Source).unwrap();

        let reread = Metadata::from_bytes(&codec, &out).unwrap();
        assert_eq!(reread.exif().unwrap().iso_speed_ratings(), Some(vec![200]));
        let gps: MetadataGps = reread.gps().unwrap();
        assert!((gps.latitude().unwrap() - latitude).abs() < 1e-6);
    }

    #[test]
    fn root_orientation_overrides_tiff_orientation() {
        let mut update = camera_update();
        let mut tiff = Dictionary::new();
        tiff.insert("Orientation".into(), Value::Integer(3));
        update.insert("{TIFF}".into(), Value::Dictionary(tiff));
        let out = ContainerCodec
            .apply_properties(&update, &sample_jpeg(), OutputType::Source)
            .unwrap();
        let meta = Metadata::new(read(&out));
        assert_eq!(meta.orientation(), Some(Orientation::Right));

        // without a root key the namespace value is used
        update.remove("Orientation");
        let out = ContainerCodec
            .apply_properties(&update, &sample_jpeg(), OutputType::Source)
            .unwrap();
        assert_eq!(Metadata::new(read(&out)).orientation(), Some(Orientation::Down));
    }

    #[test]
    fn reads_raw_tiff_exif() {
        let blob = rewrite_exif(None, &camera_update()).unwrap().unwrap();
        let dict = read_container(ContainerFormat::Tiff, &blob).unwrap();
        let meta = Metadata::new(dict);
        assert_eq!(meta.exif().unwrap().iso_speed_ratings(), Some(vec![100]));
        assert_eq!(meta.tiff().unwrap().make().as_deref(), Some("Canon"));
        assert_eq!(meta.orientation(), Some(Orientation::Right));
        let gps = meta.gps().unwrap();
        assert!((gps.latitude().unwrap() - 48.8584).abs() < 1e-4);
        assert_eq!(gps.latitude_ref(), Some(crate::metadata::LatitudeRef::North));
        assert!((gps.longitude().unwrap() - 2.2945).abs() < 1e-4);
    }

    #[test]
    fn raw_reader_skips_unparseable_exif() {
        let mut bytes = b"II*\0".to_vec();
        bytes.extend_from_slice(&[0xFF; 4]);
        let dict = read_container(ContainerFormat::Tiff, &bytes).unwrap();
        assert_eq!(dict.get("FileSize"), Some(&Value::Integer(8)));
        assert!(!dict.contains_key("{Exif}"));
    }

    #[test]
    fn omitted_namespaces_stay_unchanged() {
        let image = camera_jpeg();
        let mut update = Dictionary::new();
        let mut gps = Dictionary::new();
        gps.insert("Latitude".into(), Value::Float(10.5));
        gps.insert("LatitudeRef".into(), Value::String("S".into()));
        update.insert("{GPS}".into(), Value::Dictionary(gps));
        let out = ContainerCodec
            .apply_properties(&update, &image, OutputType::Source)
            .unwrap();

        let meta = Metadata::new(read(&out));
        assert_eq!(meta.exif().unwrap().iso_speed_ratings(), Some(vec![100]));
        let gps = meta.gps().unwrap();
        assert!((gps.latitude().unwrap() - 10.5).abs() < 1e-6);
        // {GPS} is authoritative: longitude was not in the update
        assert_eq!(gps.longitude(), None);
    }

    #[test]
    fn null_namespace_removes_its_tags() {
        let mut update = Dictionary::new();
        update.insert("{GPS}".into(), Value::Null);
        let out = ContainerCodec
            .apply_properties(&update, &camera_jpeg(), OutputType::Source)
            .unwrap();
        let dict = read(&out);
        assert!(!dict.contains_key("{GPS}"));
        assert!(dict.contains_key("{Exif}"));
    }

    #[test]
    fn strip_keeps_only_orientation() {
        let out = strip(&ContainerCodec, &camera_jpeg()).unwrap();
        let dict = read(&out);
        assert_eq!(dict.get("Orientation"), Some(&Value::Integer(6)));
        assert!(!dict.contains_key("{Exif}"));
        assert!(!dict.contains_key("{GPS}"));
        assert_eq!(dict.get("PixelWidth"), Some(&Value::Integer(16)));
    }

    #[test]
    fn strip_without_orientation_removes_exif_segment() {
        let mut update = camera_update();
        update.remove("Orientation");
        let image = ContainerCodec
            .apply_properties(&update, &sample_jpeg(), OutputType::Source)
            .unwrap();
        let out = strip(&ContainerCodec, &image).unwrap();
        let jpeg = Jpeg::from_bytes(Bytes::from(out)).unwrap();
        assert!(jpeg.exif().is_none());
    }

    #[test]
    fn iptc_round_trip_and_clear() {
        let mut iptc = Dictionary::new();
        iptc.insert(
            "Keywords".into(),
            Value::Array(vec![Value::String("harbor".into()), Value::String("dusk".into())]),
        );
        iptc.insert("Caption/Abstract".into(), Value::String("Boats".into()));
        let mut update = Dictionary::new();
        update.insert("{IPTC}".into(), Value::Dictionary(iptc.clone()));
        let out = ContainerCodec
            .apply_properties(&update, &sample_jpeg(), OutputType::Source)
            .unwrap();
        let meta = Metadata::new(read(&out));
        assert_eq!(meta.iptc().unwrap().node().current(), &iptc);

        let mut clear = Dictionary::new();
        clear.insert("{IPTC}".into(), Value::Null);
        let cleared = ContainerCodec
            .apply_properties(&clear, &out, OutputType::Source)
            .unwrap();
        assert!(!read(&cleared).contains_key("{IPTC}"));
    }

    #[test]
    fn png_exif_and_text() {
        let mut update = camera_update();
        let mut text = Dictionary::new();
        text.insert("Title".into(), Value::String("Harbor".into()));
        update.insert("{PNG}".into(), Value::Dictionary(text));
        let out = ContainerCodec
            .apply_properties(&update, &sample_png(), OutputType::Source)
            .unwrap();
        let meta = Metadata::new(read(&out));
        assert_eq!(meta.png().unwrap().title().as_deref(), Some("Harbor"));
        assert_eq!(meta.exif().unwrap().iso_speed_ratings(), Some(vec![100]));
        assert_eq!(meta.pixel_height(), Some(8));
    }

    #[test]
    fn rejects_text_input() {
        let err = ContainerCodec
            .read_properties(ImageSource::Bytes(b"hello world, not an image"), &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::CannotCreateSource(_)));
        assert_eq!(
            ContainerCodec.apply_properties(&Dictionary::new(), b"hello world", OutputType::Source),
            Err(CodecError::CannotDetermineSourceType)
        );
    }

    #[test]
    fn truncated_jpeg_has_no_properties() {
        let err = ContainerCodec
            .read_properties(ImageSource::Bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::CannotExtractProperties(_)));
    }

    #[test]
    fn unsupported_destinations() {
        assert!(matches!(
            ContainerCodec.apply_properties(&Dictionary::new(), b"GIF89a\x01\x00\x01\x00\x00\x00\x00;", OutputType::Source),
            Err(CodecError::CannotCreateDestination(_))
        ));
        assert!(matches!(
            ContainerCodec.apply_properties(
                &Dictionary::new(),
                &sample_jpeg(),
                OutputType::Container(ContainerFormat::Png)
            ),
            Err(CodecError::CannotCreateDestination(_))
        ));
    }

    #[test]
    fn empty_update_keeps_image_bytes() {
        let image = camera_jpeg();
        let out = ContainerCodec
            .apply_properties(&Dictionary::new(), &image, OutputType::Source)
            .unwrap();
        let (before, after) = (read(&image), read(&out));
        for key in ["Orientation", "{Exif}", "{GPS}", "{TIFF}", "PixelWidth"] {
            assert_eq!(after.get(key), before.get(key), "{key}");
        }
    }

    #[test]
    fn reads_psd_header_and_iptc() {
        let mut fields = Dictionary::new();
        fields.insert("City".into(), Value::String("Oslo".into()));
        let resources = iptc::write_resources(&[Resource {
            id: iptc::RESOURCE_IPTC,
            name: vec![0, 0],
            data: iptc::encode_iim(&fields, None),
        }]);
        let mut psd = b"8BPS".to_vec();
        psd.extend_from_slice(&1u16.to_be_bytes());
        psd.extend_from_slice(&[0; 6]);
        psd.extend_from_slice(&3u16.to_be_bytes());
        psd.extend_from_slice(&20u32.to_be_bytes());
        psd.extend_from_slice(&30u32.to_be_bytes());
        psd.extend_from_slice(&8u16.to_be_bytes());
        psd.extend_from_slice(&3u16.to_be_bytes());
        psd.extend_from_slice(&0u32.to_be_bytes());
        psd.extend_from_slice(&(resources.len() as u32).to_be_bytes());
        psd.extend_from_slice(&resources);

        let meta = Metadata::new(read(&psd));
        assert_eq!(meta.pixel_width(), Some(30));
        assert_eq!(meta.pixel_height(), Some(20));
        assert_eq!(meta.depth(), Some(8));
        assert_eq!(meta.iptc().unwrap().city().as_deref(), Some("Oslo"));
        let info = meta.photoshop().unwrap();
        assert_eq!(info.version(), Some(1));
        assert_eq!(info.resource_ids(), Some(vec![0x0404]));
    }

    #[test]
    fn reads_gif_screen_descriptor() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[4, 0, 2, 0, 0x80, 0, 0]);
        gif.extend_from_slice(b"\x21\xFF\x0BNETSCAPE2.0\x03\x01\x00\x00\x00");
        gif.push(0x3B);
        let mut dict = Dictionary::new();
        read_gif(&mut dict, &gif);
        let meta = Metadata::new(dict);
        let info = meta.gif().unwrap();
        assert_eq!(info.canvas_pixel_width(), Some(4));
        assert_eq!(info.has_global_color_map(), Some(true));
        assert_eq!(info.loop_count(), Some(0));
    }
}
