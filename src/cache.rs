use std::ops::DerefMut;
use std::time::Duration;

use r2d2_redis::r2d2;
use r2d2_redis::redis::{Commands, RedisError};
use r2d2_redis::RedisConnectionManager;
use thiserror::Error;

use crate::models::ItemAggregate;

pub type RedisPool = r2d2::Pool<RedisConnectionManager>;

const CACHE_POOL_MAX_OPEN: u32 = 16;
const CACHE_POOL_MIN_IDLE: u32 = 8;
const CACHE_POOL_EXPIRE_SECONDS: u64 = 60;
const CACHE_ENTRY_TTL_SECONDS: usize = 300;

const ALL_ITEMS_KEY: &str = "food_item:all";
const GENERATION_KEY: &str = "food_item:generation";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("invalid redis url: {0}")]
    Url(#[from] RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Version of the cached list. Every invalidation moves to a new
/// generation, and entries are keyed by the generation read before the
/// store was queried, so a list read before a write is never served after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    fn key(&self) -> String {
        format!("{}:{}", ALL_ITEMS_KEY, self.0)
    }
}

/// Redis copy of the `GET /food_item/all` payload. The cache is an
/// accelerator only: every failure is logged and treated as a miss.
#[derive(Clone, Default)]
pub struct ListCache {
    pool: Option<RedisPool>,
}

impl ListCache {
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    pub fn connect(url: &str) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(url)?;
        let pool = r2d2::Pool::builder()
            .max_size(CACHE_POOL_MAX_OPEN)
            .max_lifetime(Some(Duration::from_secs(CACHE_POOL_EXPIRE_SECONDS)))
            .min_idle(Some(CACHE_POOL_MIN_IDLE))
            .build(manager)?;
        Ok(Self { pool: Some(pool) })
    }

    /// Current generation, or `None` when there is no usable cache.
    pub fn generation(&self) -> Option<Generation> {
        let pool = self.pool.as_ref()?;
        let mut conn = pool.get().map_err(|e| log::warn!("cache unavailable: {}", e)).ok()?;
        let current: Result<Option<u64>, RedisError> = conn.deref_mut().get(GENERATION_KEY);
        match current {
            Ok(current) => Some(Generation(current.unwrap_or(0))),
            Err(e) => {
                log::warn!("cache read failed: {}", e);
                None
            }
        }
    }

    pub fn load(&self, generation: Generation) -> Option<Vec<ItemAggregate>> {
        let pool = self.pool.as_ref()?;
        let mut conn = pool.get().map_err(|e| log::warn!("cache unavailable: {}", e)).ok()?;
        let cached: Result<Vec<u8>, RedisError> = conn.deref_mut().get(generation.key());
        match cached {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => decode(&bytes)
                .map_err(|e| log::warn!("dropping unreadable cache entry: {}", e))
                .ok(),
            Err(e) => {
                log::warn!("cache read failed: {}", e);
                None
            }
        }
    }

    /// Stores `items` as read under `generation`. After an invalidation the
    /// entry is unreachable and simply expires.
    pub fn store(&self, generation: Generation, items: &[ItemAggregate]) {
        let Some(pool) = self.pool.as_ref() else {
            return;
        };
        let bytes = match encode(items) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("could not encode cache entry: {}", e);
                return;
            }
        };
        match pool.get() {
            Ok(mut conn) => {
                let written: Result<(), RedisError> =
                    conn.deref_mut().set_ex(generation.key(), bytes, CACHE_ENTRY_TTL_SECONDS);
                if let Err(e) = written {
                    log::warn!("cache write failed: {}", e);
                }
            }
            Err(e) => log::warn!("cache unavailable: {}", e),
        }
    }

    pub fn invalidate(&self) {
        let Some(pool) = self.pool.as_ref() else {
            return;
        };
        match pool.get() {
            Ok(mut conn) => {
                let bumped: Result<u64, RedisError> = conn.deref_mut().incr(GENERATION_KEY, 1);
                if let Err(e) = bumped {
                    log::warn!("cache invalidation failed: {}", e);
                }
            }
            Err(e) => log::warn!("cache unavailable, entry may be stale: {}", e),
        }
    }
}

fn encode(items: &[ItemAggregate]) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(items)
}

fn decode(bytes: &[u8]) -> Result<Vec<ItemAggregate>, bincode::Error> {
    bincode::deserialize(bytes)
}
