use thiserror::Error;

/// Fatal errors that stop a cleanup run
///
/// Per-subscriber failures (provisioning lookup, delete call) are not part of
/// this type, they are recorded in the run summary instead.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("{0}")]
    Config(String),

    #[error("Failed to connect MongoDB")]
    Connect(#[source] mongodb::error::Error),

    #[error("Failed to query")]
    Query(#[source] anyhow::Error),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl CleanupError {
    /// Process exit status for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Connect(_) | Self::HttpClient(_) => 1,
            Self::Query(_) => 2,
        }
    }
}

/// Map any error bubbling out of `cli::start` to an exit status
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CleanupError>()
        .map_or(1, CleanupError::exit_code)
}
