//! Run bookkeeping models: per-source summaries and the per-run log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Source, SourceKind};
use crate::scrapers::StrategyKind;

/// Outcome of one source attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "partial_success" => Some(Self::PartialSuccess),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source outcome embedded in a run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub source_id: String,
    pub source_name: String,
    pub source_type: String,
    pub items_found: usize,
    /// Items left after the article cap was applied.
    pub items_considered: usize,
    pub items_processed: usize,
    pub new_items_added: usize,
    pub items_skipped: usize,
    /// Item-level errors; the source still reports `partial_success`.
    pub errors: Vec<String>,
    pub status: SourceStatus,
    pub message: String,
    /// Set when fetch, parse, configuration or strategy failed the whole source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProcessingSummary {
    /// Empty summary for a source attempt starting now.
    pub fn begin(source: &Source) -> Self {
        Self::begin_at(source, Utc::now())
    }

    /// Empty summary for a source attempt that started at `started_at`.
    pub fn begin_at(source: &Source, started_at: DateTime<Utc>) -> Self {
        Self {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            source_type: source.kind.as_str().to_string(),
            items_found: 0,
            items_considered: 0,
            items_processed: 0,
            new_items_added: 0,
            items_skipped: 0,
            errors: Vec::new(),
            status: SourceStatus::Success,
            message: String::new(),
            fetch_error: None,
            strategy: None,
            started_at,
            finished_at: started_at,
        }
    }

    /// Failed summary for a source-level error. Counters are zeroed since no
    /// partial item list is trusted.
    pub fn failed(source: &Source, error: impl Into<String>) -> Self {
        Self::begin(source).into_failed(error)
    }

    /// Convert an in-progress summary into a failed one.
    pub fn into_failed(mut self, error: impl Into<String>) -> Self {
        let error = error.into();
        self.items_found = 0;
        self.items_considered = 0;
        self.items_processed = 0;
        self.new_items_added = 0;
        self.items_skipped = 0;
        self.errors.clear();
        self.status = SourceStatus::Failed;
        self.message = format!("Fetch failed: {}", error);
        self.fetch_error = Some(error);
        self.finished_at = Utc::now();
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == SourceStatus::Failed
    }

    /// The value written to the source's `last_error` field.
    pub fn last_error(&self) -> Option<String> {
        if let Some(ref e) = self.fetch_error {
            return Some(e.clone());
        }
        match self.errors.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            [first, rest @ ..] => Some(format!("{} (+{} more)", first, rest.len())),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::parse(&self.source_type)
    }
}

/// Status of one orchestrator execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "completed_with_errors" => Some(Self::CompletedWithErrors),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auditable record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    /// Assigned once the log has been persisted.
    pub id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub sources_total: usize,
    pub sources_failed: usize,
    pub items_added: usize,
    pub items_skipped: usize,
    pub summaries: Vec<ProcessingSummary>,
    pub orchestration_errors: Vec<String>,
}

impl RunLog {
    /// A fresh in-progress log.
    pub fn start() -> Self {
        Self {
            id: None,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::InProgress,
            sources_total: 0,
            sources_failed: 0,
            items_added: 0,
            items_skipped: 0,
            summaries: Vec::new(),
            orchestration_errors: Vec::new(),
        }
    }

    /// Append a summary and fold it into the aggregates.
    pub fn record(&mut self, summary: ProcessingSummary) {
        self.sources_total += 1;
        if summary.is_failed() {
            self.sources_failed += 1;
        }
        self.items_added += summary.new_items_added;
        self.items_skipped += summary.items_skipped;
        self.summaries.push(summary);
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.orchestration_errors.push(error.into());
    }

    /// Status for a log that was successfully created.
    pub fn final_status(&self) -> RunStatus {
        if self.orchestration_errors.is_empty() && self.sources_failed == 0 {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    /// Stamp the end time and final status.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.status = self.final_status();
    }
}

/// Structured result handed back to whoever triggered the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Option<String>,
    pub status: RunStatus,
    pub summaries: Vec<ProcessingSummary>,
    pub orchestration_errors: Vec<String>,
    pub items_added: usize,
    pub items_skipped: usize,
    pub sources_failed: usize,
}

impl RunResult {
    /// Result for a run whose log could never be created.
    pub fn creation_failed(error: impl Into<String>) -> Self {
        Self {
            run_id: None,
            status: RunStatus::Failed,
            summaries: Vec::new(),
            orchestration_errors: vec![error.into()],
            items_added: 0,
            items_skipped: 0,
            sources_failed: 0,
        }
    }
}

impl From<RunLog> for RunResult {
    fn from(log: RunLog) -> Self {
        Self {
            run_id: log.id,
            status: log.status,
            summaries: log.summaries,
            orchestration_errors: log.orchestration_errors,
            items_added: log.items_added,
            items_skipped: log.items_skipped,
            sources_failed: log.sources_failed,
        }
    }
}
