use thiserror::Error;

/// Errors that can occur when interacting with the imagery service
/// or when compositing its results.
#[derive(Debug, Error)]
pub enum EarthdataError {
    /// A time range whose start lies after its end. Local validation,
    /// raised before any remote call is made.
    #[error("invalid time range: {0}")]
    InvalidRange(String),

    /// A non-positive composite window length. Local validation,
    /// raised before any remote call is made.
    #[error("invalid composite window: {0}")]
    InvalidWindow(String),

    /// HTTP transport or protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error (missing env vars, invalid URIs, etc.)
    #[error("configuration error: {0}")]
    Config(String),

    /// A remote query that failed for one specific composite window.
    /// The window index makes the failure attributable; other windows
    /// are unaffected.
    #[error("query for window {window} failed: {source}")]
    Query {
        window: usize,
        #[source]
        source: Box<EarthdataError>,
    },

    /// An image payload that could not be decoded
    #[error("failed to decode image payload: {0}")]
    Decode(String),

    /// Source images whose band grids disagree in shape
    #[error("band shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Error surfaced from the rendering/export stage
    #[error("export error: {0}")]
    Export(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl EarthdataError {
    /// Attribute an error to a specific composite window.
    pub fn for_window(self, window: usize) -> Self {
        match self {
            // Already attributed, keep the innermost index
            EarthdataError::Query { .. } => self,
            other => EarthdataError::Query {
                window,
                source: Box::new(other),
            },
        }
    }

    /// The window index this error is attributed to, if any.
    pub fn window(&self) -> Option<usize> {
        match self {
            EarthdataError::Query { window, .. } => Some(*window),
            _ => None,
        }
    }
}

/// Type alias for Results using EarthdataError
pub type Result<T> = std::result::Result<T, EarthdataError>;
