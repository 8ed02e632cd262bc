//! Reconciliation engine: orchestrates scrapers, tagging and store batches.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{PostingCandidate, RawRecord, SourceBoard, SourceInstance};
use jobsift_scrapers::{scraper_for, HttpFetcher, ScrapeError};
use jobsift_storage::{BatchCounts, JobStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobsift-sync";

/// Root of `sources.yaml`: the closed set of configured employer boards.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceInstance>,
}

pub fn load_source_registry(path: impl AsRef<Path>) -> Result<SourceRegistry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Which half of an instance's reconciliation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Store,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub company: String,
    pub source: SourceBoard,
    pub stage: FailureStage,
    pub error: String,
}

/// Outcome of one reconciliation run across all configured instances.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources_scraped: usize,
    pub inserted: u64,
    pub updated: u64,
    pub reactivated: u64,
    pub deactivated: u64,
    pub failed_sources: Vec<SourceFailure>,
}

impl RunReport {
    fn absorb(&mut self, counts: BatchCounts) {
        self.inserted += counts.inserted;
        self.updated += counts.updated;
        self.reactivated += counts.reactivated;
        self.deactivated += counts.deactivated;
    }
}

/// Fetch capability for one configured instance. Production dispatches to
/// the board scrapers; tests script outcomes directly.
#[async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, instance: &SourceInstance) -> Result<Vec<RawRecord>, ScrapeError>;
}

/// Live backend: one shared HTTP client, board dispatch by configuration.
pub struct HttpFetchBackend {
    http: HttpFetcher,
}

impl HttpFetchBackend {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FetchBackend for HttpFetchBackend {
    async fn fetch(&self, instance: &SourceInstance) -> Result<Vec<RawRecord>, ScrapeError> {
        scraper_for(&instance.board).fetch(&self.http, instance).await
    }
}

pub struct ReconcileEngine {
    store: Box<dyn JobStore>,
    backend: Box<dyn FetchBackend>,
}

impl ReconcileEngine {
    pub fn new(store: Box<dyn JobStore>, backend: Box<dyn FetchBackend>) -> Self {
        Self { store, backend }
    }

    /// Run one full reconciliation over `sources`.
    ///
    /// The run always completes: a fetch or store failure for one instance is
    /// recorded in the report and the remaining instances proceed. A failed
    /// instance gets no writes at all, so its stored postings keep their last
    /// known state instead of being falsely deactivated.
    pub async fn run(&self, sources: &[SourceInstance]) -> RunReport {
        let started_at = Utc::now();
        let mut report = RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: started_at,
            sources_scraped: 0,
            inserted: 0,
            updated: 0,
            reactivated: 0,
            deactivated: 0,
            failed_sources: Vec::new(),
        };

        for instance in sources.iter().filter(|instance| instance.enabled) {
            let scope = instance.scope();

            let records = match self.backend.fetch(instance).await {
                Ok(records) => records,
                Err(err) => {
                    warn!(
                        company = %instance.company,
                        source = %scope.source,
                        error = %err,
                        "fetch failed; keeping stored postings untouched"
                    );
                    report.failed_sources.push(SourceFailure {
                        company: instance.company.clone(),
                        source: scope.source,
                        stage: FailureStage::Fetch,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            let candidates: Vec<PostingCandidate> = records
                .into_iter()
                .map(|raw| PostingCandidate::from_raw(scope.source, raw))
                .collect();

            // The candidate set is complete for this instance before any
            // deactivation decision is made; partial results never reach the
            // store.
            match self.store.apply_batch(&scope, &candidates, started_at).await {
                Ok(counts) => {
                    info!(
                        company = %instance.company,
                        source = %scope.source,
                        inserted = counts.inserted,
                        updated = counts.updated,
                        reactivated = counts.reactivated,
                        deactivated = counts.deactivated,
                        "reconciled source instance"
                    );
                    report.sources_scraped += 1;
                    report.absorb(counts);
                }
                Err(err) => {
                    warn!(
                        company = %instance.company,
                        source = %scope.source,
                        error = %err,
                        "store batch failed; scope rolled back"
                    );
                    report.failed_sources.push(SourceFailure {
                        company: instance.company.clone(),
                        source: scope.source,
                        stage: FailureStage::Store,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.finished_at = Utc::now();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsift_core::BoardConfig;

    #[test]
    fn registry_yaml_parses_into_typed_board_configs() {
        let yaml = "\
sources:
  - company: Acme
    board: greenhouse
    board_token: acme
  - company: Initech
    enabled: false
    board: lever
    site: initech
  - company: Hooli
    board: workable
    subdomain: hooli
";
        let registry: SourceRegistry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(registry.sources.len(), 3);
        assert!(registry.sources[0].enabled);
        assert!(!registry.sources[1].enabled);
        assert_eq!(
            registry.sources[0].board,
            BoardConfig::Greenhouse {
                board_token: "acme".into()
            }
        );
        assert_eq!(registry.sources[2].board.source(), SourceBoard::Workable);
    }
}
