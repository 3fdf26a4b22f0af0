use thiserror::Error;

/// Errors that can occur when reading from SharePoint
#[derive(Debug, Error)]
pub enum SharePointError {
    /// A configuration key outside the recognized set was supplied
    #[error("Unknown parameter: {name}, expected [\"url\", \"client_id\", \"client_secret\"]")]
    UnknownParameter { name: String },

    /// Configuration error (missing values, invalid URL, malformed config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (realm discovery, token acquisition, sign-in)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// File extension outside the supported set
    #[error("File of type {0}, not supported for extraction")]
    UnsupportedFormat(String),

    /// Non-success response from the SharePoint REST API
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Tabular parsing error from Polars
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Spreadsheet parsing error from calamine
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Type alias for Results using SharePointError
pub type Result<T> = std::result::Result<T, SharePointError>;
