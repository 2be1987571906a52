//! DAG chain data model

pub mod issue;
pub mod node;
pub mod notify;
pub mod summary;

pub use issue::*;
pub use node::*;
pub use notify::*;
pub use summary::*;
