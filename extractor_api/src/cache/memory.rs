use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::api::MapAPI;

/// Keeps everything in memory, for as long as the cache lives.
#[derive(Default)]
pub struct MemoryCache {
    pools: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

#[async_trait]
impl MapAPI for MemoryCache {
    fn new() -> Self {
        MemoryCache::default()
    }

    async fn get(&self, pool: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .pools
            .read()
            .await
            .get(pool)
            .and_then(|p| p.get(key))
            .cloned())
    }

    async fn set(&self, pool: &str, key: &str, data: &[u8]) -> Result<()> {
        self.pools
            .write()
            .await
            .entry(pool.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn has(&self, pool: &str, key: &str) -> Result<bool> {
        Ok(self
            .pools
            .read()
            .await
            .get(pool)
            .map_or(false, |p| p.contains_key(key)))
    }

    async fn delete(&self, pool: &str, key: &str) -> Result<()> {
        if let Some(p) = self.pools.write().await.get_mut(pool) {
            p.remove(key);
        }
        Ok(())
    }
}
