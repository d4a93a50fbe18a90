use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::StoreError;
use crate::models::{Category, Customer, MenuItem, Order};

/// Named collections kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Categories,
    MenuItems,
    Orders,
    Customers,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Categories,
        Collection::MenuItems,
        Collection::Orders,
        Collection::Customers,
    ];

    /// Storage key the collection lives under.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Categories => "pos_categories",
            Collection::MenuItems => "pos_menu_items",
            Collection::Orders => "pos_orders",
            Collection::Customers => "pos_customers",
        }
    }

    /// Fails unless `value` decodes as this collection's records.
    fn check_records(self, value: &Value) -> Result<(), StoreError> {
        match self {
            Collection::Categories => Vec::<Category>::deserialize(value).map(drop),
            Collection::MenuItems => Vec::<MenuItem>::deserialize(value).map(drop),
            Collection::Orders => Vec::<Order>::deserialize(value).map(drop),
            Collection::Customers => Vec::<Customer>::deserialize(value).map(drop),
        }
        .map_err(|e| {
            tracing::warn!(collection = self.name(), error = %e, "snapshot collection rejected");
            StoreError::from(e)
        })
    }

    /// Logical name used in exported snapshots.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Categories => "categories",
            Collection::MenuItems => "menu_items",
            Collection::Orders => "orders",
            Collection::Customers => "customers",
        }
    }
}

/// Durable key/value store over a single SQLite table.
///
/// Values are JSON documents. The contract methods (`save`, `load`,
/// `remove`, `export_all`, `import_all`) never fail loudly: errors are
/// logged and reported as `false` or the caller's default. The `write`,
/// `read` and `write_batch` twins return the error instead.
pub struct Store {
    conn: Mutex<Connection>,
    quota_bytes: Option<usize>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened store");

        Ok(Store {
            conn: Mutex::new(conn),
            quota_bytes: None,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Store {
            conn: Mutex::new(Connection::open_in_memory()?),
            quota_bytes: None,
        })
    }

    /// Reject values whose serialized form is larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn encode<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, StoreError> {
        let text = serde_json::to_string(data)?;
        if let Some(quota) = self.quota_bytes {
            if text.len() > quota {
                return Err(StoreError::QuotaExceeded {
                    size: text.len(),
                    quota,
                });
            }
        }
        Ok(text)
    }

    fn put(conn: &Connection, key: &str, text: &str) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text, unix_millis()],
        )?;
        Ok(())
    }

    fn raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let text = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(text)
    }

    pub fn write<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), StoreError> {
        let text = self.encode(data)?;
        let conn = self.lock()?;
        Self::put(&conn, key, &text)
    }

    /// Write several keys in one transaction: all of them or none.
    pub fn write_batch(&self, entries: &[(&str, Value)]) -> Result<(), StoreError> {
        let encoded = entries
            .iter()
            .map(|(key, value)| self.encode(value).map(|text| (*key, text)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (key, text) in &encoded {
            Self::put(&tx, key, text)?;
        }
        tx.commit()?;

        Ok(())
    }

    /// `Ok(None)` when the key was never written.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.raw(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> bool {
        match self.write(key, data) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "store save failed");
                false
            }
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::error!(key, error = %e, "store load failed, using default");
                default
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.raw(key), Ok(Some(_)))
    }

    pub fn remove(&self, key: &str) -> bool {
        let result = self
            .lock()
            .and_then(|conn| Ok(conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?));
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "store remove failed");
                false
            }
        }
    }

    /// Drop every known collection.
    pub fn clear_all(&self) -> bool {
        Collection::ALL
            .iter()
            .fold(true, |ok, c| self.remove(c.key()) && ok)
    }

    /// Pretty-printed JSON object keyed by collection name; a collection
    /// that was never written exports as `null`.
    pub fn export_all(&self) -> String {
        let mut snapshot = Map::new();
        for collection in Collection::ALL {
            let value = self.load::<Value>(collection.key(), Value::Null);
            snapshot.insert(collection.name().to_string(), value);
        }

        serde_json::to_string_pretty(&Value::Object(snapshot)).unwrap_or_else(|e| {
            tracing::error!(error = %e, "export failed");
            "{}".to_string()
        })
    }

    pub fn import_all(&self, snapshot: &str) -> bool {
        match self.try_import(snapshot) {
            Ok(imported) => {
                tracing::info!(imported, "snapshot imported");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "snapshot import failed");
                false
            }
        }
    }

    fn try_import(&self, snapshot: &str) -> Result<usize, StoreError> {
        let parsed: Value = serde_json::from_str(snapshot)?;
        let Value::Object(mut data) = parsed else {
            return Err(StoreError::MalformedSnapshot);
        };

        let mut entries: Vec<(&str, Value)> = Vec::new();
        for collection in Collection::ALL {
            match data.remove(collection.name()) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    collection.check_records(&value)?;
                    entries.push((collection.key(), value));
                }
            }
        }

        self.write_batch(&entries)?;
        Ok(entries.len())
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// `<prefix>_` followed by a base-36 timestamp and 9 random base-36 chars.
pub fn generate_id(prefix: &str) -> String {
    let random = to_base36(uuid::Uuid::new_v4().as_u128());
    let suffix: String = random.chars().rev().take(9).collect();
    format!("{}_{}{}", prefix, to_base36(unix_millis() as u128), suffix)
}
