//! Error types for card loading and export

use thiserror::Error;

/// Result type alias for card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the card data could not be fetched or parsed
pub const DATA_ERROR_MESSAGE: &str = "Could not load card data";
/// Message shown when the card photo failed to load
pub const IMAGE_ERROR_MESSAGE: &str = "Image failed to load";
/// Message shown when exporting the card failed
pub const EXPORT_ERROR_MESSAGE: &str = "Could not download card";

/// Errors that can occur while loading or exporting a card
#[derive(Error, Debug)]
pub enum Error {
    /// No card key was supplied
    #[error("Missing card slug in URL (use ?card=...)")]
    MissingKey,

    /// The supplied key has no record in the mapping
    #[error("Card not found for slug \"{0}\"")]
    UnknownKey(String),

    /// Failed to fetch a source (data file, image, background)
    #[error("Failed to load {0}")]
    LoadError(String),

    /// Card data could not be fetched or parsed
    #[error("Card data error: {0}")]
    DataError(String),

    /// An image could not be fetched or decoded
    #[error("Image error: {0}")]
    ImageError(String),

    /// Failed while drawing or encoding the card
    #[error("Export failed: {0}")]
    ExportError(String),

    /// PNG serialization yielded no bytes
    #[error("Rendering produced no image data")]
    EmptyImage,

    /// Card markup is missing required elements or carries unusable styles
    #[error("Invalid template: {0}")]
    TemplateError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to set up a backend (HTTP client, base URL)
    #[error("Initialization failed: {0}")]
    InitializationError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of failures, one per user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unmatched key
    Input,
    /// Network or parse failure of the card data
    DataFetch,
    /// Image failed to load
    Asset,
    /// Draw, serialize or save failure
    Export,
    /// Bad configuration or template
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingKey | Error::UnknownKey(_) => ErrorKind::Input,
            Error::DataError(_) | Error::LoadError(_) => ErrorKind::DataFetch,
            Error::ImageError(_) => ErrorKind::Asset,
            Error::ExportError(_) | Error::EmptyImage | Error::Io(_) => ErrorKind::Export,
            Error::TemplateError(_) | Error::ConfigError(_) | Error::InitializationError(_) => {
                ErrorKind::Config
            }
        }
    }

    /// The single message to show in place of the card.
    ///
    /// Input errors keep their detail so a missing key can be told apart
    /// from an unknown one; everything else collapses to a generic text.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Input | ErrorKind::Config => self.to_string(),
            ErrorKind::DataFetch => DATA_ERROR_MESSAGE.to_string(),
            ErrorKind::Asset => IMAGE_ERROR_MESSAGE.to_string(),
            ErrorKind::Export => EXPORT_ERROR_MESSAGE.to_string(),
        }
    }
}
