//! Global verification summary

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Aggregate counters for one verification run across all projects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    #[serde(rename = "projectsTracked_Count")]
    pub projects_tracked_count: usize,
    #[serde(rename = "projectsWithIssues_Count")]
    pub projects_with_issues_count: usize,
    #[serde(rename = "projectsWithStuckChain_Count")]
    pub projects_with_stuck_chain_count: usize,
    /// Projects whose walk stopped before reaching genesis or a verified height
    #[serde(rename = "projectsWithIncompleteWalk_Count", default)]
    pub projects_with_incomplete_walk_count: usize,
    /// Lowest head height across projects (global laggard)
    #[serde(rename = "currentMinChain_Height")]
    pub current_min_chain_height: i64,
    #[serde(rename = "overallIssue_Count")]
    pub overall_issue_count: usize,
    #[serde(rename = "overallDAGChainGaps")]
    pub overall_dag_chain_gaps: usize,
    #[serde(rename = "overallDAGChainDuplicates")]
    pub overall_dag_chain_duplicates: usize,
}

impl ChainSummary {
    /// Whether any project reported an issue
    pub fn has_issues(&self) -> bool {
        self.overall_issue_count > 0
    }

    /// Serialized form embedded in notifications
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wire_names() {
        let summary = ChainSummary {
            projects_tracked_count: 3,
            projects_with_issues_count: 2,
            projects_with_stuck_chain_count: 1,
            projects_with_incomplete_walk_count: 0,
            current_min_chain_height: 7,
            overall_issue_count: 2,
            overall_dag_chain_gaps: 1,
            overall_dag_chain_duplicates: 0,
        };

        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["projectsTracked_Count"], 3);
        assert_eq!(value["projectsWithIssues_Count"], 2);
        assert_eq!(value["projectsWithStuckChain_Count"], 1);
        assert_eq!(value["currentMinChain_Height"], 7);
        assert_eq!(value["overallIssue_Count"], 2);
        assert_eq!(value["overallDAGChainGaps"], 1);
        assert_eq!(value["overallDAGChainDuplicates"], 0);
        assert!(summary.has_issues());
    }
}
