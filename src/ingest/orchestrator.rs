//! Fetch orchestration: bulk and single-source runs.
//!
//! Every run gets a run log that is persisted `in-progress` before any source
//! is touched and finalized once at the end. Sources are processed one at a
//! time in registry order; a failing source never stops the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{error, info, warn};

use super::router::SourceRouter;
use crate::error::IngestError;
use crate::models::{FetchBookkeeping, ProcessingSummary, RunLog, RunResult, Source};
use crate::repository::{RunLogStore, SourceRegistry};

/// Default per-run article limit.
pub const DEFAULT_ARTICLE_LIMIT: usize = 50;

/// Per-run options, passed explicitly into every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum items considered per source.
    pub article_limit: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            article_limit: DEFAULT_ARTICLE_LIMIT,
        }
    }
}

pub struct FetchOrchestrator {
    sources: Arc<dyn SourceRegistry>,
    runs: Arc<dyn RunLogStore>,
    router: SourceRouter,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl FetchOrchestrator {
    pub fn new(
        sources: Arc<dyn SourceRegistry>,
        runs: Arc<dyn RunLogStore>,
        router: SourceRouter,
    ) -> Self {
        Self {
            sources,
            runs,
            router,
        }
    }

    /// Fetch every enabled source.
    pub async fn run_all(&self, options: RunOptions) -> RunResult {
        let (mut log, run_id) = match self.start_run().await {
            Ok(started) => started,
            Err(result) => return result,
        };
        info!(run_id = %run_id, limit = options.article_limit, "Starting fetch run");

        let sources = match self.sources.list_enabled().await {
            Ok(sources) => sources,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Failed to load sources");
                log.push_error(format!("Failed to load sources: {}", e));
                Vec::new()
            }
        };

        if sources.is_empty() {
            info!(run_id = %run_id, "No enabled sources to fetch");
        }

        for source in &sources {
            self.fetch_into(&mut log, source, options).await;
        }

        self.finish_run(log, &run_id).await
    }

    /// Fetch one source by id.
    ///
    /// A missing or disabled source is an error and no run log is created.
    pub async fn run_single(
        &self,
        source_id: &str,
        options: RunOptions,
    ) -> Result<RunResult, IngestError> {
        let source = self
            .sources
            .get(source_id)
            .await?
            .ok_or_else(|| IngestError::SourceNotFound(source_id.to_string()))?;
        if !source.enabled {
            return Err(IngestError::SourceDisabled(source_id.to_string()));
        }

        let (mut log, run_id) = match self.start_run().await {
            Ok(started) => started,
            Err(result) => return Ok(result),
        };
        info!(run_id = %run_id, source_id, "Starting single-source fetch");

        self.fetch_into(&mut log, &source, options).await;
        Ok(self.finish_run(log, &run_id).await)
    }

    /// Create and persist the in-progress log.
    async fn start_run(&self) -> Result<(RunLog, String), RunResult> {
        let mut log = RunLog::start();
        match self.runs.create(&log).await {
            Ok(id) => {
                log.id = Some(id.clone());
                Ok((log, id))
            }
            Err(e) => {
                error!(error = %e, "Failed to create run log");
                Err(RunResult::creation_failed(format!(
                    "Failed to create run log: {}",
                    e
                )))
            }
        }
    }

    /// Process one source, write back its bookkeeping, record the summary.
    async fn fetch_into(&self, log: &mut RunLog, source: &Source, options: RunOptions) {
        let summary = self.process_source(source, options).await;

        let fetch = FetchBookkeeping {
            fetched_at: summary.finished_at,
            status: summary.status,
            message: summary.message.clone(),
            error: summary.last_error(),
        };
        if let Err(e) = self.sources.record_fetch(&source.id, &fetch).await {
            error!(source_id = %source.id, error = %e, "Failed to update source");
            log.push_error(format!("Failed to update source {}: {}", source.id, e));
        }

        log.record(summary);
    }

    /// The per-source routine. Always yields a summary.
    async fn process_source(&self, source: &Source, options: RunOptions) -> ProcessingSummary {
        let started_at = Utc::now();
        let route = self.router.route(source, options.article_limit, started_at);
        let routed = AssertUnwindSafe(route).catch_unwind().await;

        let attempt = ProcessingSummary::begin_at(source, started_at);
        let summary = match routed {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => attempt.into_failed(e.to_string()),
            Err(panic) => attempt.into_failed(format!(
                "Processing panicked: {}",
                panic_message(panic.as_ref())
            )),
        };

        if summary.is_failed() {
            warn!(
                source_id = %source.id,
                error = summary.fetch_error.as_deref().unwrap_or_default(),
                "Source failed"
            );
        } else {
            info!(
                source_id = %source.id,
                status = %summary.status,
                found = summary.items_found,
                added = summary.new_items_added,
                skipped = summary.items_skipped,
                errors = summary.errors.len(),
                "Source processed"
            );
        }
        summary
    }

    /// Finalize and persist the log exactly once.
    async fn finish_run(&self, mut log: RunLog, run_id: &str) -> RunResult {
        log.finish();
        if let Err(e) = self.runs.update(run_id, &log).await {
            error!(run_id, error = %e, "Failed to finalize run log");
            log.push_error(format!("Failed to finalize run log: {}", e));
            log.status = log.final_status();
        }

        info!(
            run_id,
            status = %log.status,
            sources = log.sources_total,
            failed = log.sources_failed,
            added = log.items_added,
            skipped = log.items_skipped,
            "Fetch run finished"
        );
        RunResult::from(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::models::{RunStatus, SourceKind};
    use crate::repository::{MemoryArticleStore, MemoryRunLogStore, MemorySourceRegistry};
    use crate::scrapers::browser::UnavailableLauncher;
    use crate::scrapers::{PageFetcher, StrategyPolicy, WebsiteRegistry};
    use async_trait::async_trait;

    struct NoNetwork;

    #[async_trait]
    impl PageFetcher for NoNetwork {
        async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
            Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 500,
            })
        }
    }

    fn orchestrator(sources: Vec<Source>) -> (FetchOrchestrator, Arc<MemoryRunLogStore>) {
        let runs = Arc::new(MemoryRunLogStore::new());
        let router = SourceRouter::build(
            Arc::new(NoNetwork),
            Arc::new(UnavailableLauncher),
            Arc::new(MemoryArticleStore::new()),
            Arc::new(WebsiteRegistry::default()),
            StrategyPolicy::default(),
        );
        (
            FetchOrchestrator::new(
                Arc::new(MemorySourceRegistry::new(sources)),
                runs.clone(),
                router,
            ),
            runs,
        )
    }

    fn source(id: &str, kind: SourceKind) -> Source {
        Source::new(id.into(), id.into(), format!("https://example.com/{}", id), kind)
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }

    #[tokio::test]
    async fn zero_sources_completes_cleanly() {
        let (o, runs) = orchestrator(vec![]);
        let result = o.run_all(RunOptions::default()).await;
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.orchestration_errors.is_empty());
        let id = result.run_id.unwrap();
        assert_eq!(runs.get(&id).unwrap().status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn failed_source_does_not_abort_run() {
        let (o, _) = orchestrator(vec![
            source("a", SourceKind::Rss),
            source("b", SourceKind::Other("atom".into())),
        ]);
        let result = o.run_all(RunOptions::default()).await;
        assert_eq!(result.summaries.len(), 2);
        assert_eq!(result.sources_failed, 2);
        assert_eq!(result.status, RunStatus::CompletedWithErrors);
        assert!(result.summaries[1]
            .fetch_error
            .as_deref()
            .unwrap()
            .contains("type"));
    }

    #[tokio::test]
    async fn single_rejects_missing_and_disabled_sources() {
        let mut disabled = source("off", SourceKind::Rss);
        disabled.enabled = false;
        let (o, runs) = orchestrator(vec![disabled]);

        assert!(matches!(
            o.run_single("nope", RunOptions::default()).await,
            Err(IngestError::SourceNotFound(_))
        ));
        assert!(matches!(
            o.run_single("off", RunOptions::default()).await,
            Err(IngestError::SourceDisabled(_))
        ));
        assert!(runs.recent(10).await.unwrap().is_empty());
    }
}
