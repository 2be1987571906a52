//! Structural chain issues

use serde::{Deserialize, Serialize};

/// Kind of structural issue found in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Missing range of heights between two linked nodes
    Gap,
    /// Two or more nodes claiming the same height, or a non-monotonic link
    Duplicate,
    /// Head height has not advanced within the staleness window
    Stuck,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gap => "GAP",
            Self::Duplicate => "DUPLICATE",
            Self::Stuck => "STUCK",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An issue detected in one project's chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainIssue {
    pub issue_type: IssueType,
    /// First missing height (gaps only)
    #[serde(rename = "missingBlockHeightStart")]
    pub missing_height_start: i64,
    /// Last missing height (gaps only)
    #[serde(rename = "missingBlockHeightEnd")]
    pub missing_height_end: i64,
    /// Unix seconds at which the analyzer found the issue
    pub timestamp_identified: i64,
    /// Height of the node the issue is attached to
    pub dag_block_height: i64,
}

impl ChainIssue {
    /// Gap of missing heights `start..=end`, found below the node at `end + 1`
    pub fn gap(start: i64, end: i64, identified_at: i64) -> Self {
        Self {
            issue_type: IssueType::Gap,
            missing_height_start: start,
            missing_height_end: end,
            timestamp_identified: identified_at,
            dag_block_height: end.saturating_add(1),
        }
    }

    pub fn duplicate(height: i64, identified_at: i64) -> Self {
        Self {
            issue_type: IssueType::Duplicate,
            missing_height_start: 0,
            missing_height_end: 0,
            timestamp_identified: identified_at,
            dag_block_height: height,
        }
    }

    pub fn stuck(head_height: i64, identified_at: i64) -> Self {
        Self {
            issue_type: IssueType::Stuck,
            missing_height_start: 0,
            missing_height_end: 0,
            timestamp_identified: identified_at,
            dag_block_height: head_height,
        }
    }

    /// Number of heights missing for a gap, zero otherwise
    pub fn missing_count(&self) -> i64 {
        match self.issue_type {
            IssueType::Gap => self
                .missing_height_end
                .saturating_sub(self.missing_height_start)
                .saturating_add(1)
                .max(0),
            IssueType::Duplicate | IssueType::Stuck => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_wire_format() {
        let issue = ChainIssue::gap(11, 12, 1_700_000_000);
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["issueType"], "GAP");
        assert_eq!(value["missingBlockHeightStart"], 11);
        assert_eq!(value["missingBlockHeightEnd"], 12);
        assert_eq!(value["timestampIdentified"], 1_700_000_000);
        assert_eq!(value["dagBlockHeight"], 13);
    }

    #[test]
    fn test_missing_count() {
        assert_eq!(ChainIssue::gap(6, 6, 0).missing_count(), 1);
        assert_eq!(ChainIssue::gap(11, 20, 0).missing_count(), 10);
        assert_eq!(ChainIssue::duplicate(5, 0).missing_count(), 0);
        assert_eq!(ChainIssue::stuck(5, 0).missing_count(), 0);
    }

    #[test]
    fn test_missing_count_saturates() {
        assert_eq!(ChainIssue::gap(i64::MIN, i64::MAX, 0).missing_count(), i64::MAX);
        assert_eq!(ChainIssue::gap(-3, -2, 0).missing_count(), 2);
        // inverted bounds from a malformed record
        assert_eq!(ChainIssue::gap(10, 4, 0).missing_count(), 0);
        assert_eq!(ChainIssue::gap(0, i64::MAX, 0).dag_block_height, i64::MAX);
    }
}
