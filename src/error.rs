//! Error types for unzotero library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unzotero operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for unzotero library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configured attachment storage directory does not exist.
    #[error("Storage directory not found or not a directory: {0}")]
    MissingStorage(PathBuf),

    /// The library source could not be reached or returned garbage.
    #[error("Library source error: {0}")]
    Source(String),

    /// HTTP error talking to the local API or downloading an image.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An embedded image could not be decoded.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// An HTML snapshot could not be turned into a screenshot.
    #[error("Snapshot rendering error: {0}")]
    Snapshot(String),

    /// ZIP archive error while writing DOCX output.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// XML writing error while producing DOCX output.
    #[error("XML error: {0}")]
    Xml(String),

    /// The output format is not supported.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Resource (image, attachment, etc.) not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}
