//! Error types for theme loading.

/// Result type alias for style operations.
pub type Result<T> = std::result::Result<T, StyleError>;

/// Errors surfaced by [`Style::load`](crate::style::Style::load) and friends.
///
/// None of these leave a style half-built: a failed load keeps whatever was
/// loaded before.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// Unparsable markup.
    #[error("Theme document is malformed at byte {position}: {message}")]
    Document { message: String, position: u64 },

    /// The document parsed but is not a render theme.
    #[error("Expected <rendertheme> root element, found <{0}>")]
    UnexpectedRoot(String),

    /// Configuration file could not be read or deserialized.
    #[error("Invalid style configuration: {0}")]
    Config(#[from] ::config::ConfigError),
}
