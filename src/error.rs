use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("feed fetch failed: {0}")]
    FetchMessage(String),
    #[error("feed decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

impl FeedError {
    /// True for transport-level failures, as opposed to malformed payloads
    /// or configuration problems.
    pub fn is_fetch(&self) -> bool {
        matches!(self, FeedError::Fetch(_) | FeedError::FetchMessage(_))
    }
}
