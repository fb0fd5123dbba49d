use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;

/// Uniform key-value interface every higher component is written against.
/// Values are JSON documents; callers always see explicit `Result`s.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Whether writes survive a process restart. The health endpoint reports
    /// this so clients know when they are talking to a dev instance.
    fn is_durable(&self) -> bool;
}

pub async fn get_json<T: DeserializeOwned>(store: &dyn Storage, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn put_json<T: Serialize>(store: &dyn Storage, key: &str, value: &T) -> Result<()> {
    store.put(key, serde_json::to_value(value)?).await
}

// ==================== REDIS BACKEND ====================

#[derive(Clone)]
pub struct RedisStorage {
    conn: redis::aio::ConnectionManager,
}

impl RedisStorage {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value.to_string()).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

// ==================== IN-MEMORY BACKEND ====================

/// Dev/test fallback. Shares state across requests within one process and
/// loses everything on restart; never acceptable in production.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

// ==================== PER-KEY WRITE LOCKS ====================

/// Serializes read-modify-write sequences on one key within this process.
/// Concurrent instances sharing one Redis still race last-write-wins; that
/// remaining window is the documented concurrency contract.
#[derive(Clone, Default)]
pub struct KeyLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().await;
        // Drop entries nothing holds anymore, otherwise every per-day
        // leaderboard key touched would pin a mutex for the process lifetime
        map.retain(|_, entry| Arc::strong_count(entry) > 1);
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ==================== KEY NAMESPACE ====================

pub mod keys {
    pub const RESET_TOKEN: &str = "sys:reset_token";

    pub fn user(id: &str) -> String {
        format!("user:{id}")
    }

    pub fn friend_code(code: &str) -> String {
        format!("fc:{code}")
    }

    pub fn lb_global(map_id: &str) -> String {
        format!("lb:global:map:{map_id}")
    }

    pub fn lb_daily(date: &str, map_id: &str) -> String {
        format!("lb:daily:{date}:map:{map_id}")
    }

    pub fn lb_daily_challenge(date: &str) -> String {
        format!("lb:daily_challenge:{date}")
    }

    pub fn lb_challenge_global(map_id: &str) -> String {
        format!("lb:challenge:global:map:{map_id}")
    }

    pub fn lb_challenge_daily(date: &str, map_id: &str) -> String {
        format!("lb:challenge:daily:{date}:map:{map_id}")
    }

    pub fn challenge(id: &str) -> String {
        format!("challenge:{id}")
    }

    pub fn user_challenges(user_id: &str) -> String {
        format!("user-challenges:{user_id}")
    }
}

/// Returns the server's reset token, minting it on first call. Clients that
/// hold a different token wipe local state, so the value is create-once and
/// never regenerated.
pub async fn ensure_reset_token(store: &dyn Storage, locks: &KeyLocks) -> Result<String> {
    let lock = locks.lock(keys::RESET_TOKEN).await;
    let _guard = lock.lock().await;

    if let Some(token) = get_json::<String>(store, keys::RESET_TOKEN).await? {
        return Ok(token);
    }

    let token = hex::encode(rand::random::<[u8; 16]>());
    put_json(store, keys::RESET_TOKEN, &token).await?;
    tracing::info!("Minted new reset token");
    Ok(token)
}
