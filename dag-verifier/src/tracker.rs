//! Head Tracker
//!
//! In-process memory of each project's head between verification passes.
//! Used for stuck detection and to bound walks at the height the previous
//! pass already covered. Nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use dag_core::HeadRecord;

/// What the tracker knows about one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedHead {
    /// Highest head seen and when it last advanced
    pub head: HeadRecord,
    /// Head height of the last complete walk
    pub verified_height: Option<i64>,
}

/// Shared head tracker
#[derive(Debug, Clone, Default)]
pub struct HeadTracker {
    records: Arc<RwLock<HashMap<String, TrackedHead>>>,
}

impl HeadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, project_id: &str) -> Option<TrackedHead> {
        self.records.read().await.get(project_id).copied()
    }

    /// Copy of every record, read once before a pass
    pub async fn snapshot(&self) -> HashMap<String, TrackedHead> {
        self.records.read().await.clone()
    }

    /// Record the outcome of a walk
    ///
    /// `complete` marks the head height as verified for the next pass.
    pub async fn commit(
        &self,
        project_id: &str,
        head_height: i64,
        complete: bool,
        observed_at: DateTime<Utc>,
    ) {
        let mut records = self.records.write().await;
        let entry = records.get(project_id).copied();

        let head = match entry {
            Some(tracked) => tracked.head.observe(head_height, observed_at),
            None => HeadRecord::new(head_height, observed_at),
        };

        let previous_verified = entry.and_then(|t| t.verified_height);
        let verified_height = if complete {
            Some(previous_verified.map_or(head_height, |v| v.max(head_height)))
        } else {
            previous_verified
        };

        records.insert(
            project_id.to_string(),
            TrackedHead {
                head,
                verified_height,
            },
        );
    }

    /// Seed a record, e.g. when restoring state by hand
    pub async fn seed(&self, project_id: &str, tracked: TrackedHead) {
        self.records
            .write()
            .await
            .insert(project_id.to_string(), tracked);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
