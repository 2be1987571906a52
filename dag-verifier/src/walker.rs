//! Chain Walker
//!
//! Follows `prevCid` links backwards from a project's head and records the
//! height of every node it visits. A walk stops, in priority order, at:
//!
//! 1. genesis (empty predecessor link)
//! 2. a height already verified by an earlier run (the boundary node is kept
//!    as the anchor for gap detection, its predecessor is not fetched)
//! 3. the depth bound, reported as a soft marker
//! 4. a fetch or decode failure, keeping the heights gathered so far
//!
//! Run cancellation interrupts the in-flight fetch.

use std::time::Duration;
use tracing::{debug, warn};

use dag_core::ChainNode;

use crate::cancel::CancelSignal;
use crate::error::WalkError;
use crate::fetcher::RateLimitedFetcher;

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStop {
    /// Reached the first node of the chain
    Genesis,
    /// Reached a height verified by an earlier run
    ReachedVerified { height: i64 },
    /// Fetched `depth` nodes without reaching either end
    DepthExceeded { depth: usize },
    /// A fetch or decode failed
    Failed(WalkError),
    /// The run was cancelled mid-walk
    Cancelled,
}

impl WalkStop {
    /// Whether the walk covered everything it was meant to
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Genesis | Self::ReachedVerified { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Genesis => "genesis",
            Self::ReachedVerified { .. } => "reached_verified",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Heights gathered by one walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkResult {
    pub project_id: String,
    /// Height of the head node, if it could be fetched
    pub head_height: Option<i64>,
    /// Heights in traversal order (descending from head)
    pub heights: Vec<i64>,
    pub stop: WalkStop,
}

impl WalkResult {
    pub fn is_complete(&self) -> bool {
        self.stop.is_complete()
    }

    pub fn error(&self) -> Option<&WalkError> {
        match &self.stop {
            WalkStop::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Walks chains through a rate limited fetcher
#[derive(Clone)]
pub struct ChainWalker {
    fetcher: RateLimitedFetcher,
    fetch_timeout: Duration,
}

impl ChainWalker {
    pub fn new(fetcher: RateLimitedFetcher) -> Self {
        let fetch_timeout = fetcher.timeout();
        Self {
            fetcher,
            fetch_timeout,
        }
    }

    /// Override the per-fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Walk one chain without cancellation
    pub async fn walk(
        &self,
        project_id: &str,
        head_cid: &str,
        max_depth: usize,
        known_min_height: Option<i64>,
    ) -> WalkResult {
        self.walk_until(
            project_id,
            head_cid,
            max_depth,
            known_min_height,
            &CancelSignal::never(),
        )
        .await
    }

    /// Walk one chain, giving up when `cancel` fires
    pub async fn walk_until(
        &self,
        project_id: &str,
        head_cid: &str,
        max_depth: usize,
        known_min_height: Option<i64>,
        cancel: &CancelSignal,
    ) -> WalkResult {
        let mut heights = Vec::new();
        let mut cid = head_cid.to_string();

        let stop = loop {
            if heights.len() >= max_depth {
                warn!(project_id, depth = max_depth, "Walk depth bound reached");
                break WalkStop::DepthExceeded { depth: max_depth };
            }

            let bytes = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(project_id, cid = %cid, "Walk cancelled");
                    break WalkStop::Cancelled;
                }
                fetched = self.fetcher.fetch(&cid, self.fetch_timeout) => fetched,
            };

            let bytes = match bytes {
                Ok(bytes) => bytes,
                Err(source) => {
                    warn!(project_id, cid = %cid, error = %source, "Walk truncated by fetch error");
                    break WalkStop::Failed(WalkError::Fetch { cid, source });
                }
            };

            let node = match ChainNode::from_slice(&bytes) {
                Ok(node) => node,
                Err(e) => {
                    warn!(project_id, cid = %cid, error = %e, "Walk truncated by undecodable node");
                    break WalkStop::Failed(WalkError::Decode {
                        cid,
                        reason: e.to_string(),
                    });
                }
            };

            debug!(
                project_id,
                cid = %cid,
                snapshot_cid = node.snapshot_cid(),
                height = node.height,
                "Visited node"
            );
            heights.push(node.height);

            let Some(prev) = node.prev_cid() else {
                break WalkStop::Genesis;
            };
            if let Some(verified) = known_min_height {
                if node.height <= verified {
                    break WalkStop::ReachedVerified {
                        height: node.height,
                    };
                }
            }
            cid = prev.to_string();
        };

        WalkResult {
            project_id: project_id.to_string(),
            head_height: heights.first().copied(),
            heights,
            stop,
        }
    }
}
