//! Verification Runner
//!
//! One verification pass over every tracked project:
//!
//! 1. snapshot the head tracker
//! 2. per project, concurrently and bounded by the worker count:
//!    resolve head → walk → analyze
//! 3. barrier, then aggregate every finished project into a summary
//! 4. commit the observed heads back to the tracker
//!
//! Projects interrupted by cancellation are dropped from the pass; finished
//! projects are still aggregated.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use dag_core::{ChainIssue, ChainSummary, IntegrityAnalyzer, SummaryAggregator};

use crate::cancel::CancelSignal;
use crate::config::VerifierConfig;
use crate::error::VerifierResult;
use crate::fetcher::RateLimitedFetcher;
use crate::heads::{ApiHeadSource, HeadSource, LayeredHeadSource, StaticHeadSource};
use crate::store::IpfsHttpStore;
use crate::tracker::{HeadTracker, TrackedHead};
use crate::walker::{ChainWalker, WalkStop};

/// Findings for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_id: String,
    /// CID the walk started from
    pub head_cid: Option<String>,
    /// Height of the head node
    pub head_height: Option<i64>,
    /// Nodes visited by the walk
    pub nodes_walked: usize,
    /// Why the walk stopped
    pub stop: String,
    /// Whether the walk reached genesis or the verified boundary
    pub complete: bool,
    pub issues: Vec<ChainIssue>,
    /// Head lookup or walk error
    pub error: Option<String>,
}

impl ProjectReport {
    fn without_walk(project_id: &str, complete: bool, error: Option<String>) -> Self {
        Self {
            project_id: project_id.to_string(),
            head_cid: None,
            head_height: None,
            nodes_walked: 0,
            stop: if complete { "no_chain" } else { "head_unresolved" }.to_string(),
            complete,
            issues: Vec::new(),
            error,
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Result of one verification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: ChainSummary,
    /// Finished projects, ordered by id
    pub projects: Vec<ProjectReport>,
    /// Projects dropped by cancellation
    pub cancelled: Vec<String>,
}

impl RunReport {
    pub fn project(&self, project_id: &str) -> Option<&ProjectReport> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    pub fn was_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}

enum ProjectOutcome {
    Finished(ProjectReport),
    Cancelled(String),
}

/// Runs verification passes
pub struct VerificationRunner {
    walker: ChainWalker,
    heads: Arc<dyn HeadSource>,
    tracker: HeadTracker,
    analyzer: IntegrityAnalyzer,
    worker_count: usize,
    max_depth: usize,
    run_timeout: Duration,
}

impl VerificationRunner {
    pub fn new(
        walker: ChainWalker,
        heads: Arc<dyn HeadSource>,
        analyzer: IntegrityAnalyzer,
    ) -> Self {
        let defaults = VerifierConfig::default();
        Self {
            walker,
            heads,
            tracker: HeadTracker::new(),
            analyzer,
            worker_count: defaults.worker_count,
            max_depth: defaults.max_depth,
            run_timeout: defaults.run_timeout(),
        }
    }

    /// Build the production runner: IPFS store, configured heads, head API
    pub fn from_config(config: &VerifierConfig) -> VerifierResult<Self> {
        config.validate()?;

        let store = IpfsHttpStore::new(&config.store)?;
        let fetcher = RateLimitedFetcher::new(
            Arc::new(store),
            config.store.rate_limit(),
            config.store.timeout(),
        );

        let fallback: Option<Box<dyn HeadSource>> = match config.head_api_url.as_deref() {
            Some(url) => Some(Box::new(ApiHeadSource::new(url, config.store.timeout())?)),
            None => None,
        };
        let heads = LayeredHeadSource::new(StaticHeadSource::from_projects(&config.projects), fallback);

        Ok(Self::new(
            ChainWalker::new(fetcher),
            Arc::new(heads),
            IntegrityAnalyzer::new(config.stuck_threshold()),
        )
        .with_worker_count(config.worker_count)
        .with_max_depth(config.max_depth)
        .with_run_timeout(config.run_timeout()))
    }

    pub fn with_tracker(mut self, tracker: HeadTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn tracker(&self) -> &HeadTracker {
        &self.tracker
    }

    /// Run one pass bounded by the run timeout
    pub async fn run(&self, projects: &[String]) -> RunReport {
        self.run_until(projects, CancelSignal::never()).await
    }

    /// Run one pass, also stopping when `cancel` fires
    pub async fn run_until(&self, projects: &[String], cancel: CancelSignal) -> RunReport {
        self.run_at(projects, cancel, Utc::now()).await
    }

    /// Run one pass with `now` as the analysis time
    pub async fn run_at(
        &self,
        projects: &[String],
        cancel: CancelSignal,
        now: DateTime<Utc>,
    ) -> RunReport {
        let cancel = cancel.with_deadline(Instant::now() + self.run_timeout);
        let snapshot = self.tracker.snapshot().await;

        let mut seen = HashSet::new();
        let projects: Vec<&String> = projects.iter().filter(|p| seen.insert(*p)).collect();

        info!(
            projects = projects.len(),
            workers = self.worker_count,
            "Verification pass started"
        );

        let cancel = &cancel;
        let verifications: Vec<_> = projects
            .into_iter()
            .map(|project_id| {
                let tracked = snapshot.get(project_id).copied();
                async move { self.verify_project(project_id, tracked, now, cancel).await }
            })
            .collect();
        let outcomes: Vec<ProjectOutcome> = stream::iter(verifications)
            .buffer_unordered(self.worker_count)
            .collect()
            .await;

        let mut reports = Vec::new();
        let mut cancelled = Vec::new();
        for outcome in outcomes {
            match outcome {
                ProjectOutcome::Finished(report) => reports.push(report),
                ProjectOutcome::Cancelled(project_id) => cancelled.push(project_id),
            }
        }
        reports.sort_by(|a, b| a.project_id.cmp(&b.project_id));
        cancelled.sort();

        let summary = reports
            .iter()
            .fold(SummaryAggregator::new(), |mut acc, report| {
                acc.add_project(&report.issues, report.head_height, report.complete);
                acc
            })
            .summary();

        for report in &reports {
            if let Some(head_height) = report.head_height {
                self.tracker
                    .commit(&report.project_id, head_height, report.complete, now)
                    .await;
            }
        }

        if !cancelled.is_empty() {
            warn!(cancelled = cancelled.len(), "Projects dropped by cancellation");
        }
        info!(
            tracked = summary.projects_tracked_count,
            with_issues = summary.projects_with_issues_count,
            stuck = summary.projects_with_stuck_chain_count,
            gaps = summary.overall_dag_chain_gaps,
            duplicates = summary.overall_dag_chain_duplicates,
            min_height = summary.current_min_chain_height,
            "Verification pass finished"
        );

        RunReport {
            started_at: now,
            finished_at: Utc::now(),
            summary,
            projects: reports,
            cancelled,
        }
    }

    async fn verify_project(
        &self,
        project_id: &str,
        tracked: Option<TrackedHead>,
        now: DateTime<Utc>,
        cancel: &CancelSignal,
    ) -> ProjectOutcome {
        let head_cid = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ProjectOutcome::Cancelled(project_id.to_string()),
            head = self.heads.head_cid(project_id) => head,
        };

        let head_cid = match head_cid {
            Ok(Some(cid)) => cid,
            Ok(None) => {
                debug!(project_id, "No head to verify");
                return ProjectOutcome::Finished(ProjectReport::without_walk(project_id, true, None));
            }
            Err(e) => {
                warn!(project_id, error = %e, "Head lookup failed");
                return ProjectOutcome::Finished(ProjectReport::without_walk(
                    project_id,
                    false,
                    Some(e.to_string()),
                ));
            }
        };

        let verified_height = tracked.as_ref().and_then(|t| t.verified_height);
        let walk = self
            .walker
            .walk_until(project_id, &head_cid, self.max_depth, verified_height, cancel)
            .await;

        if walk.stop == WalkStop::Cancelled {
            return ProjectOutcome::Cancelled(project_id.to_string());
        }

        let mut issues = self
            .analyzer
            .analyze_traversal_at(project_id, &walk.heights, now);
        if let Some(head_height) = walk.head_height {
            let previous = tracked.as_ref().map(|t| &t.head);
            if let Some(stuck) = self
                .analyzer
                .detect_stuck(project_id, head_height, previous, now)
            {
                issues.push(stuck);
            }
        }

        if !walk.is_complete() {
            warn!(
                project_id,
                stop = walk.stop.label(),
                nodes = walk.heights.len(),
                "Incomplete walk"
            );
        }
        debug!(
            project_id,
            head = ?walk.head_height,
            nodes = walk.heights.len(),
            issues = issues.len(),
            "Project verified"
        );

        ProjectOutcome::Finished(ProjectReport {
            project_id: project_id.to_string(),
            head_cid: Some(head_cid),
            head_height: walk.head_height,
            nodes_walked: walk.heights.len(),
            stop: walk.stop.label().to_string(),
            complete: walk.is_complete(),
            error: walk.error().map(|e| e.to_string()),
            issues,
        })
    }
}
