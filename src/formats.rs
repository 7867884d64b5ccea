//! Container formats and the lists that gate which inputs are attempted.
//!
//! Container types are named by uniform type identifiers. Inputs whose type
//! is in [`SUPPORTED_TYPES`] are read; types in [`UNSUPPORTED_TYPES`] are
//! recognized but skipped.

use std::path::Path;

/// Container types whose metadata can be read.
pub const SUPPORTED_TYPES: &[&str] = &[
    "public.jpeg",
    "public.png",
    "com.compuserve.gif",
    "public.tiff",
    "com.canon.cr2-raw-image",
    "com.canon.crw-raw-image",
    "com.nikon.raw-image",
    "com.adobe.raw-image",
    "com.adobe.photoshop-image",
    "org.webmproject.webp",
];

/// Image types that are recognized but not handled.
pub const UNSUPPORTED_TYPES: &[&str] = &[
    "public.heic",
    "public.heif",
    "public.avif",
    "com.microsoft.bmp",
    "com.microsoft.ico",
    "com.apple.icns",
    "public.pbm",
    "public.radiance",
    "com.truevision.tga-image",
    "com.ilm.openexr-image",
    "com.sony.arw-raw-image",
    "com.fuji.raw-image",
    "com.olympus.raw-image",
    "com.panasonic.rw2-raw-image",
    "com.pentax.raw-image",
    "com.canon.cr3-raw-image",
];

/// A supported image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    /// Plain TIFF.
    Tiff,
    /// Canon RAW v2 (TIFF based).
    Cr2,
    /// Canon RAW v1 (CIFF heap).
    Crw,
    /// Nikon RAW (TIFF based).
    Nef,
    /// Adobe Digital Negative (TIFF based).
    Dng,
    /// Photoshop document.
    Psd,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 10] = [
        ContainerFormat::Jpeg,
        ContainerFormat::Png,
        ContainerFormat::Gif,
        ContainerFormat::WebP,
        ContainerFormat::Tiff,
        ContainerFormat::Cr2,
        ContainerFormat::Crw,
        ContainerFormat::Nef,
        ContainerFormat::Dng,
        ContainerFormat::Psd,
    ];

    /// Uniform type identifier of this container.
    pub fn type_identifier(&self) -> &'static str {
        match self {
            ContainerFormat::Jpeg => "public.jpeg",
            ContainerFormat::Png => "public.png",
            ContainerFormat::Gif => "com.compuserve.gif",
            ContainerFormat::WebP => "org.webmproject.webp",
            ContainerFormat::Tiff => "public.tiff",
            ContainerFormat::Cr2 => "com.canon.cr2-raw-image",
            ContainerFormat::Crw => "com.canon.crw-raw-image",
            ContainerFormat::Nef => "com.nikon.raw-image",
            ContainerFormat::Dng => "com.adobe.raw-image",
            ContainerFormat::Psd => "com.adobe.photoshop-image",
        }
    }

    pub fn from_type_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.type_identifier() == identifier)
    }

    /// TIFF-structured containers (EXIF lives in the file's own IFDs).
    pub fn is_tiff_based(&self) -> bool {
        matches!(
            self,
            ContainerFormat::Tiff
                | ContainerFormat::Cr2
                | ContainerFormat::Nef
                | ContainerFormat::Dng
        )
    }

    /// Determine the container from a file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            "cr2" => Some(Self::Cr2),
            "crw" => Some(Self::Crw),
            "nef" => Some(Self::Nef),
            "dng" => Some(Self::Dng),
            "psd" => Some(Self::Psd),
            _ => None,
        }
    }

    /// Determine the container from its leading bytes.
    ///
    /// NEF and DNG are indistinguishable from TIFF by signature and are
    /// reported as [`ContainerFormat::Tiff`].
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"8BPS") {
            return Some(Self::Psd);
        }
        let tiff_order = bytes.starts_with(b"II") || bytes.starts_with(b"MM");
        if tiff_order && bytes.len() >= 14 && &bytes[6..14] == b"HEAPCCDR" {
            return Some(Self::Crw);
        }
        if bytes.starts_with(b"II*\0") && bytes.len() >= 10 && &bytes[8..10] == b"CR" {
            return Some(Self::Cr2);
        }
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            other => {
                log::debug!("Recognized but unsupported container: {other:?}");
                None
            }
        }
    }

    /// The `image` crate format used for header-only dimension reads.
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            ContainerFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ContainerFormat::Png => Some(image::ImageFormat::Png),
            ContainerFormat::Gif => Some(image::ImageFormat::Gif),
            ContainerFormat::WebP => Some(image::ImageFormat::WebP),
            ContainerFormat::Tiff
            | ContainerFormat::Cr2
            | ContainerFormat::Nef
            | ContainerFormat::Dng => Some(image::ImageFormat::Tiff),
            ContainerFormat::Crw | ContainerFormat::Psd => None,
        }
    }
}

/// Type identifier for a file extension, covering unsupported types too.
pub fn type_identifier_for_path(path: &Path) -> Option<&'static str> {
    if let Some(format) = ContainerFormat::from_path(path) {
        return Some(format.type_identifier());
    }
    let ext = path.extension()?.to_str()?.to_lowercase();
    let identifier = match ext.as_str() {
        "heic" => "public.heic",
        "heif" => "public.heif",
        "avif" => "public.avif",
        "bmp" => "com.microsoft.bmp",
        "ico" => "com.microsoft.ico",
        "icns" => "com.apple.icns",
        "pbm" => "public.pbm",
        "hdr" => "public.radiance",
        "tga" => "com.truevision.tga-image",
        "exr" => "com.ilm.openexr-image",
        "arw" => "com.sony.arw-raw-image",
        "raf" => "com.fuji.raw-image",
        "orf" => "com.olympus.raw-image",
        "rw2" => "com.panasonic.rw2-raw-image",
        "pef" => "com.pentax.raw-image",
        "cr3" => "com.canon.cr3-raw-image",
        _ => return None,
    };
    Some(identifier)
}

pub fn is_supported_type(identifier: &str) -> bool {
    SUPPORTED_TYPES.contains(&identifier)
}

/// Whether a file's extension names a supported container.
pub fn is_supported_path(path: &Path) -> bool {
    type_identifier_for_path(path).is_some_and(is_supported_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_is_case_insensitive() {
        assert_eq!(ContainerFormat::from_path(Path::new("a.JPG")), Some(ContainerFormat::Jpeg));
        assert_eq!(ContainerFormat::from_path(Path::new("a.jpeg")), Some(ContainerFormat::Jpeg));
        assert_eq!(ContainerFormat::from_path(Path::new("a.Nef")), Some(ContainerFormat::Nef));
        assert_eq!(ContainerFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(ContainerFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn every_format_is_in_the_supported_list() {
        for format in ContainerFormat::ALL {
            assert!(is_supported_type(format.type_identifier()), "{format:?}");
            assert_eq!(
                ContainerFormat::from_type_identifier(format.type_identifier()),
                Some(format)
            );
        }
    }

    #[test]
    fn lists_do_not_overlap() {
        for id in SUPPORTED_TYPES {
            assert!(!UNSUPPORTED_TYPES.contains(id), "{id}");
        }
    }

    #[test]
    fn supported_paths() {
        for name in ["a.jpg", "a.png", "a.gif", "a.tif", "a.cr2", "a.crw", "a.nef", "a.dng", "a.psd", "a.webp"] {
            assert!(is_supported_path(Path::new(name)), "{name}");
        }
        for name in ["a.heic", "a.bmp", "a.cr3", "a.txt", "noext"] {
            assert!(!is_supported_path(Path::new(name)), "{name}");
        }
        assert_eq!(type_identifier_for_path(Path::new("a.heic")), Some("public.heic"));
    }

    #[test]
    fn detect_by_signature() {
        assert_eq!(ContainerFormat::detect(b"8BPS\0\x01rest"), Some(ContainerFormat::Psd));
        assert_eq!(
            ContainerFormat::detect(b"II\x1a\0\0\0HEAPCCDR\0\0"),
            Some(ContainerFormat::Crw)
        );
        assert_eq!(
            ContainerFormat::detect(b"II*\0\x10\0\0\0CR\x02\0"),
            Some(ContainerFormat::Cr2)
        );
        assert_eq!(ContainerFormat::detect(b"II*\0\x08\0\0\0\0\0"), Some(ContainerFormat::Tiff));
        assert_eq!(
            ContainerFormat::detect(b"\x89PNG\r\n\x1a\n\0\0"),
            Some(ContainerFormat::Png)
        );
        assert_eq!(ContainerFormat::detect(b"\xFF\xD8\xFF\xE0"), Some(ContainerFormat::Jpeg));
        assert_eq!(ContainerFormat::detect(b"GIF89a"), Some(ContainerFormat::Gif));
    }

    #[test]
    fn detect_rejects_text() {
        assert_eq!(ContainerFormat::detect(b"hello, this is not an image"), None);
        assert_eq!(ContainerFormat::detect(b""), None);
    }

    #[test]
    fn tiff_family() {
        assert!(ContainerFormat::Dng.is_tiff_based());
        assert!(ContainerFormat::Cr2.is_tiff_based());
        assert!(!ContainerFormat::Crw.is_tiff_based());
        assert!(!ContainerFormat::Jpeg.is_tiff_based());
    }
}
