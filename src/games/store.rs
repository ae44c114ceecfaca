use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, error};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::games::clock::Clock;
use crate::games::errors::GameError;
use crate::games::types::{user_key, UserRecord, USER_SCHEMA_VERSION};
use crate::logutil::escape_log;
use crate::storage::KvStore;

/// Guard held for the duration of one command against one user.
pub type UserLock = OwnedMutexGuard<()>;

/// Loads, creates and saves [`UserRecord`]s through a host [`KvStore`].
///
/// Records are JSON so that new `#[serde(default)]` fields keep older
/// records readable.
pub struct UserRecordStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    initial_points: u64,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserRecordStore {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>, initial_points: u64) -> Self {
        Self {
            kv,
            clock,
            initial_points,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialize read-modify-write cycles for one user.
    ///
    /// Slots nobody holds or waits on are pruned here, so the map only keeps
    /// users with a command in flight.
    pub async fn lock(&self, user_id: &str, platform: &str) -> UserLock {
        let key = user_key(user_id, platform);
        let slot = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn lock_slots(&self) -> usize {
        match self.locks.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Fetch the user's record, creating and persisting defaults on first contact.
    pub async fn get(&self, user_id: &str, platform: &str) -> Result<UserRecord, GameError> {
        let key = user_key(user_id, platform);
        match self.kv.get(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                error!("Corrupt user record {}: {}", escape_log(&key), e);
                GameError::Codec(e)
            }),
            None => {
                let record = UserRecord::new(
                    user_id,
                    platform,
                    self.initial_points,
                    self.clock.today(),
                );
                debug!("Creating user record {}", escape_log(&key));
                self.put(&record).await?;
                Ok(record)
            }
        }
    }

    /// Overwrite the stored record. Last writer wins.
    pub async fn put(&self, record: &UserRecord) -> Result<(), GameError> {
        let mut stamped = record.clone();
        stamped.schema_version = USER_SCHEMA_VERSION;
        let bytes = serde_json::to_vec(&stamped)?;
        let key = record.key();
        self.kv.put(&key, bytes).await.map_err(|e| {
            error!("Failed to save user record {}: {}", escape_log(&key), e);
            GameError::from(e)
        })
    }
}
