//! Redis-backed hosting cache
//!
//! Shared between edge instances. Each entry is a JSON string with `EX` set to
//! the TTL; each tag is a Redis set of the keys written under it, expiring with
//! the last entry added to it.

use async_trait::async_trait;
use hostedge_shared::Hosting;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::cache::{CacheError, HostingCache};

const KEY_PREFIX: &str = "hostedge:";

#[derive(Clone)]
pub struct RedisHostingCache {
    conn: ConnectionManager,
}

impl RedisHostingCache {
    /// Connect to Redis at `redis_url`
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn entry_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    fn tag_key(tag: &str) -> String {
        format!("{}tag:{}", KEY_PREFIX, tag)
    }
}

#[async_trait]
impl HostingCache for RedisHostingCache {
    async fn get(&self, key: &str) -> Result<Option<Hosting>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::entry_key(key)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        hosting: &Hosting,
        ttl: Duration,
        tags: &[String],
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(hosting)?;
        let entry_key = Self::entry_key(key);
        let ttl_secs = ttl.as_secs().max(1);

        let mut pipe = redis::pipe();
        pipe.atomic().set_ex(&entry_key, json, ttl_secs).ignore();
        for tag in tags {
            let tag_key = Self::tag_key(tag);
            pipe.sadd(&tag_key, &entry_key)
                .ignore()
                .expire(&tag_key, ttl_secs as i64)
                .ignore();
        }

        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::entry_key(key)).await?;
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let tag_key = Self::tag_key(tag);
        let mut keys: Vec<String> = conn.smembers(&tag_key).await?;
        keys.push(tag_key);

        let _: () = conn.del(keys).await?;
        Ok(())
    }
}
