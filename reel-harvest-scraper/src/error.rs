use reel_harvest_core::UrlError;

/// A fetch that could not even be attempted.
///
/// Network and HTTP failures are not errors: [`Fetcher::fetch`] reports them
/// as `Ok(None)`. This type only covers malformed calls.
///
/// [`Fetcher::fetch`]: crate::fetcher::Fetcher::fetch
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlError,
    },
}

/// Errors that end a harvest-level operation.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] reel_harvest_checkpoint::CheckpointError),

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
