//! Integrity Analyzer
//!
//! Scores the height sequence of one project's chain and reports structural
//! issues:
//! - GAP: heights missing between two linked nodes
//! - DUPLICATE: several nodes claiming one height, or a link whose
//!   predecessor is higher than its successor
//! - STUCK: the head has not advanced for longer than the staleness window
//!
//! Analysis is total over its inputs; it never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::types::ChainIssue;

/// Default staleness window before a non-advancing head is reported
pub const DEFAULT_STUCK_THRESHOLD: Duration = Duration::from_secs(30 * 60);

/// Last observed head of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRecord {
    /// Highest head height seen so far
    pub height: i64,
    /// When `height` was first observed
    pub last_advanced_at: DateTime<Utc>,
}

impl HeadRecord {
    pub fn new(height: i64, observed_at: DateTime<Utc>) -> Self {
        Self {
            height,
            last_advanced_at: observed_at,
        }
    }

    /// Fold a new head observation into the record
    ///
    /// The timestamp only moves when the head actually advances.
    pub fn observe(self, height: i64, observed_at: DateTime<Utc>) -> Self {
        if height > self.height {
            Self::new(height, observed_at)
        } else {
            self
        }
    }
}

/// Structural issue detector
#[derive(Debug, Clone)]
pub struct IntegrityAnalyzer {
    stuck_threshold: Duration,
}

impl Default for IntegrityAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_STUCK_THRESHOLD)
    }
}

impl IntegrityAnalyzer {
    pub fn new(stuck_threshold: Duration) -> Self {
        Self { stuck_threshold }
    }

    pub fn stuck_threshold(&self) -> Duration {
        self.stuck_threshold
    }

    /// Detect gaps and duplicates in an unordered height sequence
    pub fn analyze(&self, project_id: &str, heights: &[i64]) -> Vec<ChainIssue> {
        self.analyze_at(project_id, heights, Utc::now())
    }

    pub fn analyze_at(
        &self,
        project_id: &str,
        heights: &[i64],
        now: DateTime<Utc>,
    ) -> Vec<ChainIssue> {
        let identified_at = now.timestamp();
        let mut sorted = heights.to_vec();
        sorted.sort_unstable();

        let mut issues = Vec::new();
        for pair in sorted.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper == lower {
                debug!(project_id, height = lower, "Duplicate height");
                issues.push(ChainIssue::duplicate(lower, identified_at));
            } else if lower.checked_add(1) != Some(upper) {
                // upper > lower here, so neither bound can overflow
                let (start, end) = (lower + 1, upper - 1);
                debug!(project_id, start, end, "Height gap");
                issues.push(ChainIssue::gap(start, end, identified_at));
            }
        }
        issues
    }

    /// Analyze heights in walk order (head first, descending)
    ///
    /// On top of the sorted scan, every link whose predecessor sits above its
    /// successor is flagged at the predecessor height.
    pub fn analyze_traversal(&self, project_id: &str, heights: &[i64]) -> Vec<ChainIssue> {
        self.analyze_traversal_at(project_id, heights, Utc::now())
    }

    pub fn analyze_traversal_at(
        &self,
        project_id: &str,
        heights: &[i64],
        now: DateTime<Utc>,
    ) -> Vec<ChainIssue> {
        let identified_at = now.timestamp();
        let mut issues = Vec::new();

        for link in heights.windows(2) {
            let (successor, predecessor) = (link[0], link[1]);
            if predecessor > successor {
                debug!(
                    project_id,
                    successor, predecessor, "Predecessor above successor"
                );
                issues.push(ChainIssue::duplicate(predecessor, identified_at));
            }
        }

        issues.extend(self.analyze_at(project_id, heights, now));
        issues
    }

    /// Report a STUCK issue when the head has not advanced in time
    ///
    /// Without a previous record nothing can be stale.
    pub fn detect_stuck(
        &self,
        project_id: &str,
        current_head: i64,
        previous: Option<&HeadRecord>,
        now: DateTime<Utc>,
    ) -> Option<ChainIssue> {
        let previous = previous?;
        if current_head > previous.height {
            return None;
        }

        // negative elapsed time (clock skew) is never stale
        let elapsed = now.signed_duration_since(previous.last_advanced_at).to_std().ok()?;
        if elapsed <= self.stuck_threshold {
            return None;
        }

        debug!(
            project_id,
            height = current_head,
            stalled_secs = elapsed.as_secs(),
            "Chain head is stuck"
        );
        Some(ChainIssue::stuck(current_head, now.timestamp()))
    }
}
