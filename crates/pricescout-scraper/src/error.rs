use thiserror::Error;

/// Failure of a single HTTP attempt inside the fetcher's retry loop.
///
/// Never crosses the public fetch API: [`crate::Fetcher`] logs these and
/// returns `None` once the retry policy gives up.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("blocked by {url} (HTTP {status})")]
    Blocked { status: u16, url: String },

    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("client error {status} from {url}")]
    ClientError { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Why a source adapter could not answer a search.
///
/// An adapter that reached its source and found nothing returns `Ok(vec![])`
/// instead; these variants mean the source itself was unusable.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{source_name} unavailable: could not fetch {url}")]
    Unavailable {
        source_name: &'static str,
        url: String,
    },

    #[error("{source_name} returned an unexpected response: {reason}")]
    UnexpectedResponse {
        source_name: &'static str,
        reason: String,
    },
}

impl AdapterError {
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Unavailable { source_name, .. } | Self::UnexpectedResponse { source_name, .. } => {
                source_name
            }
        }
    }
}
