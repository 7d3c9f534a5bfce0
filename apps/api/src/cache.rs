//! Short-lived state: revoked sessions, in-flight OAuth flows and
//! test-drive data. Redis in production, behind [`KeyValueStore`].

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// OAuth flows must complete within this window.
pub const OAUTH_FLOW_TTL_SECS: u64 = 600;

pub const TEST_DRIVE_ITEMS: [&str; 2] = ["scores", "report"];

/// String values with a per-key TTL.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), AppError>;

    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    async fn del(&self, keys: &[String]) -> Result<(), AppError>;
}

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), AppError> {
        let mut con = self.connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_secs.max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut con = self.connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let mut con = self.connection().await?;
        let found: bool = con.exists(key).await?;
        Ok(found)
    }

    async fn del(&self, keys: &[String]) -> Result<(), AppError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut con = self.connection().await?;
        con.del::<_, ()>(keys).await?;
        Ok(())
    }
}

pub fn revoked_session_key(sid: Uuid) -> String {
    format!("session:revoked:{sid}")
}

pub fn oauth_flow_key(flow_id: &str) -> String {
    format!("oauth:pkce:{flow_id}")
}

pub fn test_drive_key(sid: Uuid, item: &str) -> String {
    format!("testdrive:{sid}:{item}")
}

pub async fn revoke_session(store: &dyn KeyValueStore, sid: Uuid, ttl_secs: u64) -> Result<(), AppError> {
    store
        .set_ex(&revoked_session_key(sid), "1".to_string(), ttl_secs)
        .await
}

pub async fn is_session_revoked(store: &dyn KeyValueStore, sid: Uuid) -> Result<bool, AppError> {
    store.exists(&revoked_session_key(sid)).await
}

pub async fn store_pkce_verifier(
    store: &dyn KeyValueStore,
    flow_id: &str,
    verifier: &str,
) -> Result<(), AppError> {
    store
        .set_ex(&oauth_flow_key(flow_id), verifier.to_string(), OAUTH_FLOW_TTL_SECS)
        .await
}

/// Returns the verifier once; the flow key is deleted on read.
pub async fn take_pkce_verifier(
    store: &dyn KeyValueStore,
    flow_id: &str,
) -> Result<Option<String>, AppError> {
    let key = oauth_flow_key(flow_id);
    let verifier = store.get(&key).await?;
    if verifier.is_some() {
        store.del(&[key]).await?;
    }
    Ok(verifier)
}

pub async fn forget_test_drive(store: &dyn KeyValueStore, sid: Uuid) -> Result<(), AppError> {
    let keys: Vec<String> = TEST_DRIVE_ITEMS
        .iter()
        .map(|item| test_drive_key(sid, item))
        .collect();
    store.del(&keys).await
}

pub async fn store_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), AppError> {
    let raw = serde_json::to_string(value).map_err(anyhow::Error::from)?;
    store.set_ex(key, raw, ttl_secs).await
}

pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(anyhow::Error::from)?)),
        None => Ok(None),
    }
}

/// In-process store for tests. TTLs are ignored.
#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn set_ex(&self, key: &str, value: String, _ttl_secs: u64) -> Result<(), AppError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn exists(&self, key: &str) -> Result<bool, AppError> {
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        async fn del(&self, keys: &[String]) -> Result<(), AppError> {
            let mut entries = self.entries.lock().unwrap();
            for key in keys {
                entries.remove(key);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_keys_are_namespaced() {
        let sid = Uuid::nil();
        assert_eq!(
            revoked_session_key(sid),
            "session:revoked:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(oauth_flow_key("abc"), "oauth:pkce:abc");
        assert_eq!(
            test_drive_key(sid, "scores"),
            "testdrive:00000000-0000-0000-0000-000000000000:scores"
        );
    }

    #[tokio::test]
    async fn test_revoked_session_is_remembered() {
        let store = MemoryStore::default();
        let sid = Uuid::new_v4();

        assert!(!is_session_revoked(&store, sid).await.unwrap());
        revoke_session(&store, sid, 60).await.unwrap();
        assert!(is_session_revoked(&store, sid).await.unwrap());
        assert!(!is_session_revoked(&store, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_pkce_verifier_is_taken_once() {
        let store = MemoryStore::default();
        store_pkce_verifier(&store, "flow-1", "verifier").await.unwrap();

        assert_eq!(
            take_pkce_verifier(&store, "flow-1").await.unwrap().as_deref(),
            Some("verifier")
        );
        assert_eq!(take_pkce_verifier(&store, "flow-1").await.unwrap(), None);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        score: i32,
    }

    #[tokio::test]
    async fn test_forget_test_drive_drops_only_that_session() {
        let store = MemoryStore::default();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();

        for sid in [mine, other] {
            for item in TEST_DRIVE_ITEMS {
                store_json(&store, &test_drive_key(sid, item), &Blob { score: 150 }, 60)
                    .await
                    .unwrap();
            }
        }
        assert_eq!(
            load_json::<Blob>(&store, &test_drive_key(mine, "scores")).await.unwrap(),
            Some(Blob { score: 150 })
        );

        forget_test_drive(&store, mine).await.unwrap();

        assert_eq!(load_json::<Blob>(&store, &test_drive_key(mine, "report")).await.unwrap(), None);
        assert_eq!(store.keys().len(), 2);
        assert!(store.keys().iter().all(|k| k.contains(&other.to_string())));
    }
}
