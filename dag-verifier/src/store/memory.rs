//! 内存存储实现
//!
//! 提供基于内存的内容存储，主要用于测试和开发。

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::ContentStore;
use crate::error::FetchError;

/// 内存存储
///
/// 线程安全，可注入故障和延迟。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    reads: Arc<RwLock<HashMap<String, usize>>>,
}

impl MemoryStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入原始字节
    pub async fn put(&self, cid: &str, bytes: Vec<u8>) {
        self.blocks.write().await.insert(cid.to_string(), bytes);
    }

    /// 写入 JSON 对象
    pub async fn put_json<T: Serialize>(&self, cid: &str, value: &T) -> Result<(), serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        self.put(cid, bytes).await;
        Ok(())
    }

    /// 让指定 CID 返回传输错误
    pub async fn fail(&self, cid: &str) {
        self.failing.write().await.insert(cid.to_string());
    }

    /// 读取指定 CID 前先等待
    pub async fn delay(&self, cid: &str, delay: Duration) {
        self.delays.write().await.insert(cid.to_string(), delay);
    }

    /// 指定 CID 的读取次数
    pub async fn read_count(&self, cid: &str) -> usize {
        self.reads.read().await.get(cid).copied().unwrap_or(0)
    }

    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, cid: &str) -> Result<Vec<u8>, FetchError> {
        *self.reads.write().await.entry(cid.to_string()).or_insert(0) += 1;

        let delay = self.delays.read().await.get(cid).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(cid) {
            return Err(FetchError::Transport(format!("injected failure for {}", cid)));
        }

        self.blocks
            .read()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(cid.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        store.put("bafy1", b"hello".to_vec()).await;

        assert_eq!(store.get("bafy1").await.unwrap(), b"hello");
        assert_eq!(store.read_count("bafy1").await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_and_failing() {
        let store = MemoryStore::new();
        store.put("bafy1", b"{}".to_vec()).await;
        store.fail("bafy1").await;

        assert!(matches!(
            store.get("bafy1").await,
            Err(FetchError::Transport(_))
        ));
        assert_eq!(
            store.get("bafy2").await,
            Err(FetchError::NotFound("bafy2".to_string()))
        );
    }
}
