use std::fmt;

/// Failure of a single transport call to the upstream query interface.
///
/// A transport failure only ever costs one batch; the engine logs it and
/// moves on.
#[derive(Debug)]
pub enum TransportError {
    /// The child process could not be started.
    Spawn(std::io::Error),
    /// The process produced nothing on stdout.
    EmptyOutput { stderr: String },
    /// Stdout was not a JSON response.
    Malformed {
        source: serde_json::Error,
        stderr: String,
    },
    /// Valid JSON carrying neither `data` nor `errors`.
    MissingData { stderr: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Spawn(e) => write!(f, "failed to run query command: {}", e),
            TransportError::EmptyOutput { stderr } => {
                write!(f, "empty stdout. stderr: {}", stderr.trim())
            }
            TransportError::Malformed { source, stderr } => {
                write!(f, "failed to parse JSON ({}). stderr: {}", source, stderr.trim())
            }
            TransportError::MissingData { stderr } => {
                write!(f, "response has no data. stderr: {}", stderr.trim())
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Spawn(e) => Some(e),
            TransportError::Malformed { source, .. } => Some(source),
            TransportError::EmptyOutput { .. } | TransportError::MissingData { .. } => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Spawn(e)
    }
}

/// Failure of the per-package tag lookup used by the audit scanner.
#[derive(Debug)]
pub enum TagLookupError {
    /// The repository does not exist upstream.
    NotFound,
    /// Anything else; the message is shown to the user as-is.
    Other(String),
}

impl fmt::Display for TagLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagLookupError::NotFound => write!(f, "Not Found"),
            TagLookupError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TagLookupError {}

impl From<std::io::Error> for TagLookupError {
    fn from(e: std::io::Error) -> Self {
        TagLookupError::Other(e.to_string())
    }
}
