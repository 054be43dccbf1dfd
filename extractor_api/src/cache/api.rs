use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Byte storage, split into named pools (like `peertube_instances`).
/// Values are opaque here, [`CacheAPI`] does the (de)serialization.
#[async_trait]
pub trait MapAPI: Send + Sync {
    fn new() -> Self
    where
        Self: Sized;

    async fn get(&self, pool: &str, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, pool: &str, key: &str, data: &[u8]) -> Result<()>;

    async fn has(&self, pool: &str, key: &str) -> Result<bool>;

    async fn delete(&self, pool: &str, key: &str) -> Result<()>;
}

/// Cheap to clone, all clones share the same storage.
#[derive(Clone)]
pub struct CacheAPI {
    map: Arc<dyn MapAPI>,
}

impl CacheAPI {
    pub fn new<M: MapAPI + 'static>(map: M) -> Self {
        CacheAPI { map: Arc::new(map) }
    }

    pub async fn get<T>(&self, pool: &str, key: &str) -> Result<Option<T>>
    where
        T: for<'a> Deserialize<'a>,
    {
        Ok(match self.map.get(pool, key).await? {
            Some(bytes) => Some(serde_json::from_slice(&bytes)?),
            None => None,
        })
    }

    pub async fn set<T>(&self, pool: &str, key: &str, data: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        self.map.set(pool, key, &serde_json::to_vec(data)?).await
    }

    pub async fn has(&self, pool: &str, key: &str) -> Result<bool> {
        self.map.has(pool, key).await
    }

    pub async fn delete(&self, pool: &str, key: &str) -> Result<()> {
        self.map.delete(pool, key).await
    }
}
