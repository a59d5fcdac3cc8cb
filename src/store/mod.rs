//! Persisted calculation history.
//!
//! Each category keeps a JSON array of records under its own key, newest
//! first and capped at [`HISTORY_CAP`] entries. Storage failures never reach
//! the caller: they are logged and surface as `None` / `false`, so a result
//! that was already computed is never lost to a storage problem.

use std::io;

use chrono::{DateTime, Local, Utc};
use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Calculation, Category, Record};

mod backend;
pub use backend::{FileStorage, MemoryStorage};

mod linkage;
pub use linkage::{LINKAGE_KEY, LinkedWithdrawal};

/// Maximum number of records kept per category; older ones are evicted.
pub const HISTORY_CAP: usize = 100;

/// Number of records returned by a history listing when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 50;

const CALCULATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("quota exceeded writing '{key}': {size} bytes over a {quota} byte quota")]
    QuotaExceeded {
        key: String,
        size: usize,
        quota: usize,
    },

    #[error("stored data under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string key-value store the history is persisted into.
pub trait Storage {
    /// Return the value under `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Source of the current local time.
pub type Clock = fn() -> DateTime<Local>;

/// Record collections for every category on top of a [`Storage`].
pub struct RecordStore<S> {
    storage: S,
    clock: Clock,
}

impl<S: Storage> RecordStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Local::now)
    }

    pub fn with_clock(storage: S, clock: Clock) -> Self {
        Self { storage, clock }
    }

    pub fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Store `fields` as a new record stamped with the current time.
    pub fn append<T: Calculation>(&mut self, fields: T) -> Option<Record<T>> {
        let now = self.now();
        self.append_at(fields, now)
    }

    /// Store `fields` as a new record stamped with `now`.
    ///
    /// The record is prepended and the category truncated to [`HISTORY_CAP`].
    /// Returns `None` if the category could not be persisted.
    pub fn append_at<T: Calculation>(&mut self, fields: T, now: DateTime<Local>) -> Option<Record<T>> {
        let category = T::CATEGORY;
        match self.try_append(fields, now) {
            Ok(record) => {
                debug!(category = %category, id = %record.id, "record saved");
                Some(record)
            }
            Err(e) => {
                warn!(category = %category, reason = %e, "record not saved");
                None
            }
        }
    }

    /// Return up to `limit` of the most recent records of `T`'s category.
    ///
    /// A missing or unreadable category reads as empty.
    pub fn list<T: Calculation>(&self, limit: usize) -> Vec<Record<T>> {
        let category = T::CATEGORY;
        let entries = match self.load_entries(category.storage_key()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(category = %category, reason = %e, "history unreadable, treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .take(limit)
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(category = %category, reason = %e, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    /// Drop the record with `id` from `category`.
    ///
    /// Returns whether the category was persisted; an unknown id is a successful no-op.
    pub fn remove(&mut self, category: Category, id: &str) -> bool {
        match self.try_remove(category, id) {
            Ok(()) => {
                debug!(category = %category, id = %id, "record removed");
                true
            }
            Err(e) => {
                warn!(category = %category, id = %id, reason = %e, "record not removed");
                false
            }
        }
    }
}

/// Private API
impl<S: Storage> RecordStore<S> {
    fn load_entries(&self, key: &str) -> Result<Vec<Value>, StorageError> {
        match self.storage.read(key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn try_append<T: Calculation>(
        &mut self,
        fields: T,
        now: DateTime<Local>,
    ) -> Result<Record<T>, StorageError> {
        let key = T::CATEGORY.storage_key();

        // corrupt history is left untouched rather than overwritten
        let mut entries = self.load_entries(key)?;

        let created_at = now.with_timezone(&Utc);
        let record = Record {
            id: generate_id(created_at),
            calculation_date: now.format(CALCULATION_DATE_FORMAT).to_string(),
            created_at,
            updated_at: created_at,
            fields,
        };

        entries.insert(0, serde_json::to_value(&record)?);
        entries.truncate(HISTORY_CAP);
        self.storage.write(key, &serde_json::to_string(&entries)?)?;

        Ok(record)
    }

    fn try_remove(&mut self, category: Category, id: &str) -> Result<(), StorageError> {
        let key = category.storage_key();
        let mut entries = self.load_entries(key)?;
        entries.retain(|entry| entry.get("id").and_then(Value::as_str) != Some(id));
        self.storage.write(key, &serde_json::to_string(&entries)?)
    }
}

/// Millisecond timestamp followed by a random base-36 suffix, so ids created
/// within the same millisecond still differ.
fn generate_id(created_at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{suffix}", created_at.timestamp_millis())
}
