//! Vulnerability correlation: one bounded-concurrency pass over the BOM.
//!
//! Lookups for distinct `name@version` keys run through the correlation
//! cache and a worker pool; a single failed or slow lookup never fails the
//! request, it degrades that entry to "insufficient data".

use crate::analysis::domain::{
    BomEntry, CvssScore, UnresolvedLookup, UnresolvedReason, VulnerabilityRecord,
};
use crate::analysis::policies::ranking;
use crate::application::correlation_cache::CorrelationCache;
use crate::ports::outbound::{Advisory, AdvisorySource, LookupError};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tuning for the correlation pass.
#[derive(Debug, Clone)]
pub struct CorrelationSettings {
    /// Worker pool width for concurrent lookups. Bounded to respect
    /// upstream rate limits.
    pub concurrency: usize,
    /// Per-entry lookup deadline.
    pub lookup_timeout: Duration,
    /// Retries spent on rate-limit/unavailable failures before the entry
    /// is marked degraded.
    pub retry_budget: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay: Duration,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            lookup_timeout: Duration::from_secs(30),
            retry_budget: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

enum LookupOutcome {
    Matched(Vec<VulnerabilityRecord>),
    Unresolved(UnresolvedLookup),
    /// The source returned nothing for this entry; not degraded.
    Clean,
}

pub struct CorrelateVulnerabilitiesUseCase<S: AdvisorySource + 'static> {
    source: Arc<S>,
    cache: Arc<CorrelationCache>,
    settings: CorrelationSettings,
}

impl<S: AdvisorySource + 'static> CorrelateVulnerabilitiesUseCase<S> {
    pub fn new(
        source: Arc<S>,
        cache: Arc<CorrelationCache>,
        settings: CorrelationSettings,
    ) -> Self {
        Self {
            source,
            cache,
            settings,
        }
    }

    /// Correlates every versioned BOM entry against the advisory source.
    ///
    /// Returns the ranked, merged vulnerability records plus the entries
    /// that could not be resolved. Cancelling `cancel` stops dispatching
    /// new lookups; already-dispatched upstream calls complete in the
    /// background and still populate the cache.
    pub async fn correlate(
        &self,
        entries: &[BomEntry],
        cancel: &CancellationToken,
    ) -> (Vec<VulnerabilityRecord>, Vec<UnresolvedLookup>) {
        let mut unresolved: Vec<UnresolvedLookup> = Vec::new();

        // Distinct correlation keys; several BOM entries may share one.
        let mut keys: BTreeMap<String, (String, String)> = BTreeMap::new();
        for entry in entries {
            match entry.correlation_key() {
                Some(key) => {
                    keys.entry(key).or_insert_with(|| {
                        (
                            entry.name.clone(),
                            entry.version.clone().unwrap_or_default(),
                        )
                    });
                }
                None => unresolved.push(UnresolvedLookup {
                    entry: entry.name.clone(),
                    reason: UnresolvedReason::MissingVersion,
                }),
            }
        }

        let outcomes: Vec<LookupOutcome> = stream::iter(keys)
            .map(|(key, (name, version))| self.lookup(key, name, version, cancel))
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut records = Vec::new();
        for outcome in outcomes {
            match outcome {
                LookupOutcome::Matched(mut matched) => records.append(&mut matched),
                LookupOutcome::Unresolved(entry) => unresolved.push(entry),
                LookupOutcome::Clean => {}
            }
        }

        unresolved.sort_by(|a, b| a.entry.cmp(&b.entry));
        (ranking::merge_and_rank(records), unresolved)
    }

    async fn lookup(
        &self,
        key: String,
        name: String,
        version: String,
        cancel: &CancellationToken,
    ) -> LookupOutcome {
        if cancel.is_cancelled() {
            return LookupOutcome::Unresolved(UnresolvedLookup {
                entry: key,
                reason: UnresolvedReason::Cancelled,
            });
        }

        let source = Arc::clone(&self.source);
        let (budget, base_delay) = (self.settings.retry_budget, self.settings.retry_base_delay);
        let fetch = move || search_with_retry(source, name, version, budget, base_delay);

        let attempt = tokio::time::timeout(
            self.settings.lookup_timeout,
            self.cache.get_or_fetch(&key, fetch),
        )
        .await;

        match attempt {
            Err(_) => {
                warn!(entry = %key, "advisory lookup exceeded its deadline");
                LookupOutcome::Unresolved(UnresolvedLookup {
                    entry: key,
                    reason: UnresolvedReason::LookupTimeout,
                })
            }
            Ok(Err(error)) => {
                warn!(entry = %key, %error, "advisory lookup failed past the retry budget");
                let reason = match error {
                    LookupError::TooManyRequests => UnresolvedReason::RateLimited,
                    LookupError::Timeout => UnresolvedReason::LookupTimeout,
                    LookupError::Unavailable(_) | LookupError::Malformed(_) => {
                        UnresolvedReason::SourceUnavailable
                    }
                };
                LookupOutcome::Unresolved(UnresolvedLookup { entry: key, reason })
            }
            Ok(Ok(advisories)) if advisories.is_empty() => {
                debug!(entry = %key, "no advisories matched");
                LookupOutcome::Clean
            }
            Ok(Ok(advisories)) => {
                let records = advisories
                    .into_iter()
                    .filter_map(|advisory| to_record(advisory, &key))
                    .collect();
                LookupOutcome::Matched(records)
            }
        }
    }
}

fn to_record(advisory: Advisory, entry_key: &str) -> Option<VulnerabilityRecord> {
    match CvssScore::new(advisory.score) {
        Ok(score) => Some(VulnerabilityRecord::new(
            advisory.id,
            advisory.description,
            score,
            entry_key.to_string(),
        )),
        Err(_) => {
            warn!(
                advisory = %advisory.id,
                score = advisory.score,
                "advisory carries an out-of-range score, skipping"
            );
            None
        }
    }
}

async fn search_with_retry<S: AdvisorySource>(
    source: Arc<S>,
    name: String,
    version: String,
    budget: u32,
    base_delay: Duration,
) -> Result<Vec<Advisory>, LookupError> {
    let mut attempt = 0;
    loop {
        match source.search(&name, Some(&version)).await {
            Ok(advisories) => return Ok(advisories),
            Err(error) if error.is_retryable() && attempt < budget => {
                let backoff = base_delay * 2u32.saturating_pow(attempt);
                let jitter_cap = (backoff.as_millis() as u64 / 2).max(1);
                let jitter = rand::thread_rng().gen_range(0..jitter_cap);
                debug!(%name, attempt, "retrying advisory lookup after backoff");
                tokio::time::sleep(backoff + Duration::from_millis(jitter)).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
