//! 内容寻址存储
//!
//! 按 CID 读取原始字节的存储接口和实现。
//!
//! # 设计原则
//!
//! - 存储层只负责取数据，不做限流和重试
//! - 错误必须分类为 NotFound / Transport，交由调用方决定

pub mod ipfs;
pub mod memory;

use async_trait::async_trait;

use crate::error::FetchError;

pub use ipfs::IpfsHttpStore;
pub use memory::MemoryStore;

/// 内容存储接口
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// 按 CID 获取内容
    async fn get(&self, cid: &str) -> Result<Vec<u8>, FetchError>;

    /// 存储名称（用于日志）
    fn name(&self) -> &str;
}
