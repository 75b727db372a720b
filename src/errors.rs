//! Error types for MusicXML conversion
//!
//! Only structural failures of the whole document are fatal. Everything
//! below the root element degrades to best-effort defaults and a log line
//! instead of an error.

use thiserror::Error;

/// Fatal conversion errors
#[derive(Debug, Clone, Error)]
pub enum ScoreError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Document root is not supported (e.g., timewise instead of partwise)
    #[error("Unsupported document root <{0}>: expected <score-partwise>")]
    UnsupportedRoot(String),
}
