use async_trait::async_trait;
use thiserror::Error;

/// One advisory as returned by the backing data source, before domain
/// validation. `score` is the raw wire value; the correlator turns it into
/// a bounded `CvssScore`.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub id: String,
    pub description: Option<String>,
    pub score: f32,
    pub published: Option<String>,
    pub last_modified: Option<String>,
}

/// Per-lookup failures. These never fail a whole analysis request; the
/// correlator recovers locally by marking the entry insufficient data.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("advisory source rate limited the request")]
    TooManyRequests,

    #[error("advisory source unavailable: {0}")]
    Unavailable(String),

    #[error("advisory lookup timed out")]
    Timeout,

    #[error("advisory source returned malformed data: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Whether the correlator should spend retry budget on this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LookupError::TooManyRequests | LookupError::Unavailable(_)
        )
    }
}

/// AdvisorySource port for querying a vulnerability database.
///
/// The backing source is keyword-based (free-text match on the component
/// name); `version` narrows the search where the source supports exact
/// version filtering.
///
/// Implementations must be `Send + Sync`: lookups for distinct BOM entries
/// are dispatched concurrently from a bounded worker pool.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    async fn search(
        &self,
        keyword: &str,
        version: Option<&str>,
    ) -> Result<Vec<Advisory>, LookupError>;
}
