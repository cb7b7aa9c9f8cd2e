//! Error types for the log router

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Level name not present in the registry
    #[error("unknown level: '{name}'")]
    InvalidLevel { name: String },

    /// Every ordinal of the level registry is taken
    #[error("level registry full: {max} levels registered")]
    LevelRegistryFull { max: usize },

    /// Output URL without a `scheme://` separator
    #[error("malformed URL: '{url}'")]
    MalformedUrl { url: String },

    /// Output URL whose scheme has no backend implementation
    #[error("unsupported scheme in URL: '{scheme}'")]
    UnsupportedScheme { scheme: String },

    /// Template parse failure or unknown field name
    #[error("template error at byte {position}: {message}")]
    Template { position: usize, message: String },

    /// A backend failed to write an entry
    #[error("backend '{backend}' failed to write: {source}")]
    BackendWrite {
        backend: String,
        #[source]
        source: std::io::Error,
    },

    /// A backend panicked while handling an entry
    #[error("backend '{backend}' panicked: {message}")]
    BackendPanic { backend: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Router was closed before the call
    #[error("router closed")]
    RouterClosed,

    /// Channel send error
    #[error("Failed to send message to the dispatch thread")]
    ChannelSendError,

    /// Channel receive error
    #[error("Failed to receive reply from the dispatch thread")]
    ChannelReceiveError,
}

impl RouterError {
    /// Create an unknown-level error
    pub fn invalid_level(name: impl Into<String>) -> Self {
        RouterError::InvalidLevel { name: name.into() }
    }

    /// Create a template error at the given byte offset
    pub fn template(position: usize, message: impl Into<String>) -> Self {
        RouterError::Template {
            position,
            message: message.into(),
        }
    }

    /// Create a backend write error
    pub fn backend_write(backend: impl Into<String>, source: std::io::Error) -> Self {
        RouterError::BackendWrite {
            backend: backend.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error was produced by a closed router
    pub fn is_closed(&self) -> bool {
        matches!(self, RouterError::RouterClosed)
    }
}
