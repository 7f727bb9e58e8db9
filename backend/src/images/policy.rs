//! Server-side checks applied to a file before it is sent to the object store

use std::str::FromStr;

use strum::EnumString;
use thiserror::Error;

/// Largest accepted upload (15 MiB)
pub const MAX_IMAGE_BYTES: usize = 15_728_640;

/// Reasons an upload is refused before any record is created
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    /// The filename has no `.` or nothing after the last one
    #[error("Filename has no extension: {0}")]
    MissingExtension(String),

    /// The extension is not one of the accepted image formats
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Zero-byte upload
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// The file exceeds [`MAX_IMAGE_BYTES`]
    #[error("Uploaded file is {0} bytes, limit is {MAX_IMAGE_BYTES}")]
    PayloadTooLarge(usize),
}

/// Accepted image formats, keyed by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ImageFormat {
    /// Portable Network Graphics
    #[strum(serialize = "png")]
    Png,
    /// JPEG, under either common extension
    #[strum(serialize = "jpg", serialize = "jpeg")]
    Jpeg,
    /// Graphics Interchange Format
    #[strum(serialize = "gif")]
    Gif,
    /// `WebP`
    #[strum(serialize = "webp")]
    Webp,
}

impl ImageFormat {
    /// Content type sent with the object
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// An upload that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedImage {
    /// Extension as supplied by the client
    pub extension: String,
    /// Format the extension resolved to
    pub format: ImageFormat,
}

/// Returns the text after the last `.` of `file_name`
///
/// # Errors
///
/// Returns `UploadRejection::MissingExtension` if there is no `.` or the
/// extension would be empty
pub fn split_extension(file_name: &str) -> Result<&str, UploadRejection> {
    match file_name.rsplit_once('.') {
        Some((_, extension)) if !extension.is_empty() => Ok(extension),
        _ => Err(UploadRejection::MissingExtension(file_name.to_string())),
    }
}

/// Validates the filename and size of an upload
///
/// # Errors
///
/// Returns the first `UploadRejection` that applies
pub fn check_upload(file_name: &str, size: usize) -> Result<AcceptedImage, UploadRejection> {
    let extension = split_extension(file_name)?;

    let format = ImageFormat::from_str(extension)
        .map_err(|_| UploadRejection::UnsupportedFileType(extension.to_string()))?;

    if size == 0 {
        return Err(UploadRejection::EmptyFile);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(UploadRejection::PayloadTooLarge(size));
    }

    Ok(AcceptedImage {
        extension: extension.to_string(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension_uses_last_dot() {
        assert_eq!(split_extension("photo.png"), Ok("png"));
        assert_eq!(split_extension("archive.tar.gz"), Ok("gz"));
        assert_eq!(split_extension(".png"), Ok("png"));
    }

    #[test]
    fn test_split_extension_rejects_names_without_extension() {
        for name in ["photo", "photo.", ""] {
            assert_eq!(
                split_extension(name),
                Err(UploadRejection::MissingExtension(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_formats_are_case_insensitive() {
        assert_eq!(ImageFormat::from_str("PNG"), Ok(ImageFormat::Png));
        assert_eq!(ImageFormat::from_str("Jpg"), Ok(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_str("jpeg"), Ok(ImageFormat::Jpeg));
        assert!(ImageFormat::from_str("svg").is_err());
    }

    #[test]
    fn test_check_upload_keeps_original_extension() {
        let accepted = check_upload("Holiday.JPG", 10).unwrap();
        assert_eq!(accepted.extension, "JPG");
        assert_eq!(accepted.format.content_type(), "image/jpeg");
    }

    #[test]
    fn test_check_upload_rejects_unsupported_type() {
        assert_eq!(
            check_upload("script.exe", 10),
            Err(UploadRejection::UnsupportedFileType("exe".to_string()))
        );
    }

    #[test]
    fn test_check_upload_size_bounds() {
        assert_eq!(check_upload("a.png", 0), Err(UploadRejection::EmptyFile));
        assert!(check_upload("a.png", 1).is_ok());
        assert!(check_upload("a.png", MAX_IMAGE_BYTES).is_ok());
        assert_eq!(
            check_upload("a.png", MAX_IMAGE_BYTES + 1),
            Err(UploadRejection::PayloadTooLarge(MAX_IMAGE_BYTES + 1))
        );
    }
}
