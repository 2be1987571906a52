//! DAG chain node types
//!
//! Nodes are JSON documents written to the content store by the audit
//! protocol. The layout is:
//!
//! ```text
//! {
//!   "data":      { "cid": "<snapshot cid>", "type": "HOT_IPFS" },
//!   "height":    42,
//!   "prevCid":   "<predecessor dag cid>" | { "/": "<cid>" } | "" | null,
//!   "timestamp": 1650000000,
//!   "txHash":    "0x...",
//!   "payload":   { "payloadCid": "...", "dagChainHeight": 42, "Data": { ... } }
//! }
//! ```
//!
//! An empty or missing `prevCid` marks the genesis node of a chain.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreResult;

/// Snapshot reference carried by a chain node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Snapshot CID
    #[serde(default)]
    pub cid: String,
    /// Storage tier tag (e.g. `HOT_IPFS`)
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Source chain block range covered by a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHeightRange {
    #[serde(default)]
    pub begin: i64,
    #[serde(default)]
    pub end: i64,
}

/// Body of a payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadData {
    /// Contract the snapshot was taken from
    #[serde(default)]
    pub contract: String,
    /// Source chain height range
    #[serde(rename = "chainHeightRange", default)]
    pub chain_height_range: ChainHeightRange,
    /// Broadcast identifier
    #[serde(rename = "broadcast_id", default)]
    pub broadcast_id: String,
    /// Snapshot timestamp (fractional unix seconds)
    #[serde(default)]
    pub timestamp: f64,
}

/// Payload owned by a chain node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// CID of the payload body
    #[serde(default)]
    pub payload_cid: String,
    /// DAG chain height the payload was committed at
    #[serde(default)]
    pub dag_chain_height: i64,
    /// Payload body
    #[serde(rename = "Data", default)]
    pub data: PayloadData,
}

impl Payload {
    pub fn contract(&self) -> &str {
        &self.data.contract
    }

    pub fn chain_height_range(&self) -> ChainHeightRange {
        self.data.chain_height_range
    }

    pub fn broadcast_id(&self) -> &str {
        &self.data.broadcast_id
    }

    pub fn timestamp(&self) -> f64 {
        self.data.timestamp
    }
}

/// A single node of a project's DAG chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainNode {
    /// Snapshot reference
    #[serde(default)]
    pub data: NodeData,
    /// Height of this node in the chain
    pub height: i64,
    /// CID of the predecessor node (empty at genesis)
    #[serde(default, deserialize_with = "deserialize_link")]
    pub prev_cid: String,
    /// Commit timestamp (unix seconds)
    #[serde(default)]
    pub timestamp: i64,
    /// Transaction hash of the commit
    #[serde(default)]
    pub tx_hash: String,
    /// Committed payload
    #[serde(default)]
    pub payload: Payload,
}

impl ChainNode {
    /// Decode a node from the raw bytes returned by the content store
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// CID of the snapshot this node commits to
    ///
    /// Not the node's own identity, which is the CID it was fetched under.
    pub fn snapshot_cid(&self) -> &str {
        &self.data.cid
    }

    /// Storage tier tag
    pub fn kind(&self) -> &str {
        &self.data.kind
    }

    /// Predecessor CID, if any
    pub fn prev_cid(&self) -> Option<&str> {
        let prev = self.prev_cid.trim();
        if prev.is_empty() {
            None
        } else {
            Some(prev)
        }
    }

    /// Whether this node starts its chain
    pub fn is_genesis(&self) -> bool {
        self.prev_cid().is_none()
    }
}

/// `prevCid` is written either as a plain string or as an IPLD link object
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Plain(String),
    Ipld {
        #[serde(rename = "/")]
        target: String,
    },
}

fn deserialize_link<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let link = Option::<LinkRepr>::deserialize(deserializer)?;
    Ok(match link {
        Some(LinkRepr::Plain(cid)) => cid,
        Some(LinkRepr::Ipld { target }) => target,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_node() {
        let raw = json!({
            "data": { "cid": "bafysnapshot", "type": "HOT_IPFS" },
            "height": 12,
            "prevCid": "bafyprev",
            "timestamp": 1650000000,
            "txHash": "0xabc",
            "payload": {
                "payloadCid": "bafypayload",
                "dagChainHeight": 12,
                "Data": {
                    "contract": "0xpair",
                    "chainHeightRange": { "begin": 100, "end": 109 },
                    "broadcast_id": "b-1",
                    "timestamp": 1650000000.5
                }
            }
        });

        let node = ChainNode::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(node.snapshot_cid(), "bafysnapshot");
        assert_eq!(node.kind(), "HOT_IPFS");
        assert_eq!(node.height, 12);
        assert_eq!(node.prev_cid(), Some("bafyprev"));
        assert_eq!(node.tx_hash, "0xabc");
        assert_eq!(node.payload.payload_cid, "bafypayload");
        assert_eq!(node.payload.contract(), "0xpair");
        assert_eq!(
            node.payload.chain_height_range(),
            ChainHeightRange { begin: 100, end: 109 }
        );
        assert_eq!(node.payload.broadcast_id(), "b-1");
        assert!(!node.is_genesis());
    }

    #[test]
    fn test_decode_ipld_link() {
        let raw = json!({ "height": 3, "prevCid": { "/": "bafylinked" } });
        let node = ChainNode::from_slice(raw.to_string().as_bytes()).unwrap();
        assert_eq!(node.prev_cid(), Some("bafylinked"));
    }

    #[test]
    fn test_genesis_variants() {
        for raw in [
            json!({ "height": 1 }),
            json!({ "height": 1, "prevCid": null }),
            json!({ "height": 1, "prevCid": "" }),
            json!({ "height": 1, "prevCid": "  " }),
        ] {
            let node = ChainNode::from_slice(raw.to_string().as_bytes()).unwrap();
            assert!(node.is_genesis(), "expected genesis for {}", raw);
        }
    }

    #[test]
    fn test_missing_height_is_rejected() {
        let raw = json!({ "prevCid": "bafyprev" });
        assert!(ChainNode::from_slice(raw.to_string().as_bytes()).is_err());
    }
}
