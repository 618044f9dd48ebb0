use thiserror::Error;

/// Convenient result alias for the curbside library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when inserting a second depot-category point.
    #[error("a depot already exists as {node}")]
    DepotExists { node: String },

    /// Raised when planning a collection run without a depot in the store.
    #[error("no depot defined in the store")]
    DepotMissing,

    /// Raised when a node identifier could not be found in the store.
    #[error("unknown point: {node}{}", format_suggestions(.suggestions))]
    PointNotFound {
        node: String,
        suggestions: Vec<String>,
    },

    /// Raised when a fill percentage falls outside the 0-100 range.
    #[error("fill level {value} is out of range (0-100)")]
    FillOutOfRange { value: u8 },

    /// Raised when a textual category value is not recognised.
    #[error("unknown point category: {value}")]
    UnknownCategory { value: String },

    /// Raised when a textual status value is not recognised.
    #[error("unknown point status: {value}")]
    UnknownStatus { value: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for HTTP client construction errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
