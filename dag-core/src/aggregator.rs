//! Summary Aggregator
//!
//! Folds per-project findings into one [`ChainSummary`]. The fold is a
//! commutative monoid: [`SummaryAggregator::default`] is the identity and
//! [`SummaryAggregator::merge`] is associative, so partial results from
//! concurrently processed projects can be combined in any order.

use std::collections::{BTreeSet, HashMap};

use crate::types::{ChainIssue, ChainSummary, IssueType};

/// Running totals over a set of projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryAggregator {
    projects_tracked: usize,
    projects_with_issues: usize,
    projects_with_stuck_chain: usize,
    projects_with_incomplete_walk: usize,
    min_head_height: Option<i64>,
    issues: usize,
    gaps: usize,
    duplicates: usize,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one project's findings
    ///
    /// `head_height` is `None` when the head could not be resolved.
    /// `complete` is false when the walk stopped early.
    pub fn add_project(&mut self, issues: &[ChainIssue], head_height: Option<i64>, complete: bool) {
        self.projects_tracked += 1;

        if !issues.is_empty() {
            self.projects_with_issues += 1;
        }
        if issues.iter().any(|i| i.issue_type == IssueType::Stuck) {
            self.projects_with_stuck_chain += 1;
        }
        if !complete {
            self.projects_with_incomplete_walk += 1;
        }

        for issue in issues {
            self.issues += 1;
            match issue.issue_type {
                IssueType::Gap => self.gaps += 1,
                IssueType::Duplicate => self.duplicates += 1,
                IssueType::Stuck => {}
            }
        }

        self.min_head_height = min_option(self.min_head_height, head_height);
    }

    /// Combine two partial aggregates
    pub fn merge(mut self, other: SummaryAggregator) -> Self {
        self.projects_tracked += other.projects_tracked;
        self.projects_with_issues += other.projects_with_issues;
        self.projects_with_stuck_chain += other.projects_with_stuck_chain;
        self.projects_with_incomplete_walk += other.projects_with_incomplete_walk;
        self.min_head_height = min_option(self.min_head_height, other.min_head_height);
        self.issues += other.issues;
        self.gaps += other.gaps;
        self.duplicates += other.duplicates;
        self
    }

    pub fn projects_tracked(&self) -> usize {
        self.projects_tracked
    }

    pub fn min_head_height(&self) -> Option<i64> {
        self.min_head_height
    }

    pub fn summary(&self) -> ChainSummary {
        ChainSummary {
            projects_tracked_count: self.projects_tracked,
            projects_with_issues_count: self.projects_with_issues,
            projects_with_stuck_chain_count: self.projects_with_stuck_chain,
            projects_with_incomplete_walk_count: self.projects_with_incomplete_walk,
            current_min_chain_height: self.min_head_height.unwrap_or(0),
            overall_issue_count: self.issues,
            overall_dag_chain_gaps: self.gaps,
            overall_dag_chain_duplicates: self.duplicates,
        }
    }
}

fn min_option(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Build a summary from per-project maps
///
/// Every project present in either map counts as tracked.
pub fn aggregate(
    per_project_issues: &HashMap<String, Vec<ChainIssue>>,
    per_project_head_heights: &HashMap<String, i64>,
) -> ChainSummary {
    let projects: BTreeSet<&String> = per_project_issues
        .keys()
        .chain(per_project_head_heights.keys())
        .collect();

    projects
        .into_iter()
        .fold(SummaryAggregator::new(), |mut acc, project| {
            let issues = per_project_issues
                .get(project)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let head = per_project_head_heights.get(project).copied();
            acc.add_project(issues, head, true);
            acc
        })
        .summary()
}
