//! DAG Core - Chain Continuity Model
//!
//! This crate provides the core types and pure analysis routines used to
//! verify hash-linked DAG chains, one chain per tracked project:
//! - Chain node and payload wire types
//! - Structural issue detection (height gaps, duplicate heights, stuck chains)
//! - Associative aggregation of per-project findings into a global summary
//! - Normalization of content store addresses
//!
//! Nothing in this crate performs I/O. Fetching, walking and notification
//! live in `dag-verifier`.

pub mod address;
pub mod aggregator;
pub mod analyzer;
pub mod error;
pub mod types;

pub use address::normalize_store_address;
pub use aggregator::{aggregate, SummaryAggregator};
pub use analyzer::{HeadRecord, IntegrityAnalyzer};
pub use error::*;
pub use types::*;
