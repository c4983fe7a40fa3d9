//! Redis-backed quota store.

use async_trait::async_trait;
use gate_primitives::QuotaKey;
use redis::aio::MultiplexedConnection;
use tracing::debug;

use crate::error::{QuotaError, QuotaResult};
use crate::store::QuotaStore;

/// Quota store sharing sliding windows through Redis sorted sets.
///
/// Each quota key maps to one sorted set whose members are admissions and
/// whose scores are admission times in epoch seconds.
#[derive(Clone)]
pub struct RedisQuotaStore {
    connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQuotaStore").finish_non_exhaustive()
    }
}

impl RedisQuotaStore {
    /// Opens a multiplexed connection to the Redis instance at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Unreachable`] if the URL is malformed or the server
    /// cannot be reached.
    pub async fn connect(url: &str) -> QuotaResult<Self> {
        let client = redis::Client::open(url).map_err(|err| QuotaError::Unreachable {
            reason: err.to_string(),
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| QuotaError::Unreachable {
                reason: err.to_string(),
            })?;

        debug!(url, "connected to redis quota store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn ping(&self) -> QuotaResult<()> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }

    async fn admit(
        &self,
        key: &QuotaKey,
        member: &str,
        now: u64,
        interval_seconds: u64,
    ) -> QuotaResult<u64> {
        let key = key.to_string();
        let cutoff = i128::from(now) - i128::from(interval_seconds);
        let mut connection = self.connection.clone();

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(&key)
            .arg(0)
            .arg(cutoff.to_string())
            .ignore()
            .cmd("ZREM")
            .arg(&key)
            .arg(member)
            .ignore()
            .cmd("ZCARD")
            .arg(&key)
            .cmd("ZADD")
            .arg(&key)
            .arg(now)
            .arg(member)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(interval_seconds)
            .ignore()
            .query_async(&mut connection)
            .await?;

        Ok(count)
    }

    async fn oldest(&self, key: &QuotaKey) -> QuotaResult<Option<u64>> {
        let mut connection = self.connection.clone();
        let oldest: Vec<(String, u64)> = redis::cmd("ZRANGE")
            .arg(key.to_string())
            .arg(0)
            .arg(0)
            .arg("WITHSCORES")
            .query_async(&mut connection)
            .await?;

        Ok(oldest.into_iter().next().map(|(_, score)| score))
    }
}
