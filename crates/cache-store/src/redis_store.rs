//! Redis store backend
//!
//! Provides the list store over a Redis-compatible server with:
//! - A reconnecting connection manager shared by all callers
//! - Bounded connection establishment
//! - Atomic per-device replace via a server-side Lua script

use async_trait::async_trait;
use cache_core::{Error, Result, StoreConfig};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tracing::{debug, info, instrument};

use crate::ListStore;

/// Finds the first element whose decoded `ARGV[1]` field equals `ARGV[2]`,
/// removes it, then appends `ARGV[3]`. Returns 1 if an element was replaced.
///
/// Elements that are not JSON objects with a string or number id abort the
/// script with a `DECODE` error before anything is written. Integral ids
/// print without exponent or fraction so they compare like the memory store.
const REPLACE_WHERE_SCRIPT: &str = r#"
local function id_string(value)
    if type(value) == 'string' then
        return value
    end
    if type(value) == 'number' then
        if value == math.floor(value) and math.abs(value) < 2^53 then
            return string.format('%.0f', value)
        end
        return tostring(value)
    end
    return nil
end

local items = redis.call('LRANGE', KEYS[1], 0, -1)
local target = nil
for _, item in ipairs(items) do
    local ok, record = pcall(cjson.decode, item)
    if not ok or type(record) ~= 'table' then
        return redis.error_reply('DECODE list element is not a JSON object')
    end
    local found = id_string(record[ARGV[1]])
    if found == nil then
        return redis.error_reply('DECODE list element has no usable ' .. ARGV[1])
    end
    if target == nil and found == ARGV[2] then
        target = item
    end
end

local replaced = 0
if target ~= nil then
    redis.call('LREM', KEYS[1], 0, target)
    replaced = 1
end
redis.call('RPUSH', KEYS[1], ARGV[3])
return replaced
"#;

/// Redis-compatible list store
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    address: String,
    replace_script: Script,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Error code the replace script raises for malformed elements
const DECODE_ERROR_CODE: &str = "DECODE";

fn store_error(operation: &str, e: redis::RedisError) -> Error {
    reply_error(operation, e.code(), e.to_string())
}

fn reply_error(operation: &str, code: Option<&str>, message: String) -> Error {
    if code == Some(DECODE_ERROR_CODE) {
        return Error::decode(format!("{}: {}", operation, message));
    }
    Error::Store {
        message: format!("{} failed: {}", operation, message),
    }
}

impl RedisStore {
    /// Connect to the server named by `config`
    ///
    /// # Errors
    /// Returns `Error::Connection` if the server cannot be reached within
    /// the configured connect timeout.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let address = config.endpoint();
        let connection_error = |message: String| Error::Connection {
            address: address.clone(),
            message,
        };

        let client = Client::open(format!("redis://{}/", address))
            .map_err(|e| connection_error(e.to_string()))?;

        let connection =
            tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    connection_error(format!("timed out after {:?}", config.connect_timeout))
                })?
                .map_err(|e| connection_error(e.to_string()))?;

        info!(%address, "Connected to redis store");

        Ok(Self {
            connection,
            address,
            replace_script: Script::new(REPLACE_WHERE_SCRIPT),
        })
    }
}

#[async_trait]
impl ListStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    #[instrument(skip(self), fields(backend = "redis"))]
    async fn range(&self, key: &str) -> Result<Vec<String>> {
        let mut connection = self.connection.clone();
        connection
            .lrange(key, 0, -1)
            .await
            .map_err(|e| store_error("LRANGE", e))
    }

    #[instrument(skip(self, value), fields(backend = "redis"))]
    async fn remove(&self, key: &str, value: &str) -> Result<u64> {
        let mut connection = self.connection.clone();
        let removed: u64 = connection
            .lrem(key, 0, value)
            .await
            .map_err(|e| store_error("LREM", e))?;
        debug!(removed, "Removed list elements");
        Ok(removed)
    }

    #[instrument(skip(self, value), fields(backend = "redis"))]
    async fn push(&self, key: &str, value: String) -> Result<u64> {
        let mut connection = self.connection.clone();
        connection
            .rpush(key, value)
            .await
            .map_err(|e| store_error("RPUSH", e))
    }

    #[instrument(skip(self), fields(backend = "redis"))]
    async fn index(&self, key: &str, index: i64) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        connection
            .lindex(key, index as isize)
            .await
            .map_err(|e| store_error("LINDEX", e))
    }

    #[instrument(skip(self), fields(backend = "redis"))]
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut connection = self.connection.clone();
        connection
            .exists(key)
            .await
            .map_err(|e| store_error("EXISTS", e))
    }

    #[instrument(skip(self, value), fields(backend = "redis"))]
    async fn replace_where(
        &self,
        key: &str,
        field: &str,
        id: &str,
        value: String,
    ) -> Result<Option<bool>> {
        let mut connection = self.connection.clone();
        let replaced: i64 = self
            .replace_script
            .key(key)
            .arg(field)
            .arg(id)
            .arg(value)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| store_error("replace script", e))?;
        debug!(replaced = replaced == 1, "Replaced list element atomically");
        Ok(Some(replaced == 1))
    }
}
