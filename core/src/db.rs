use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::models::{
    CUSTOM_FOODS_KEY, CUSTOM_TEMPLATES_KEY, CustomTemplates, DailyEntry, KEY_PREFIX,
    date_from_key, entry_key,
};

pub const SETTING_LAST_WRITE_AT: &str = "last_write_at";
pub const SETTING_LAST_BACKUP_AT: &str = "last_backup_at";

/// Day-keyed access to journal entries.
pub trait EntryRepository {
    fn get(&self, date: NaiveDate) -> Result<Option<DailyEntry>>;
    fn put(&self, date: NaiveDate, entry: &DailyEntry) -> Result<()>;
    /// Every stored day, keyed by store key.
    fn list_all(&self) -> Result<BTreeMap<String, DailyEntry>>;
    fn delete(&self, date: NaiveDate) -> Result<bool>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!("Opened journal store at {}", path.display());
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Raw documents ---

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn delete_raw(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// Keys and values under `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM kv WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let prefix_len = i64::try_from(prefix.len()).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![prefix, prefix_len], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // --- Custom foods & templates ---

    pub fn load_custom_foods(&self) -> Result<BTreeMap<String, f64>> {
        self.load_document(CUSTOM_FOODS_KEY)
    }

    pub fn save_custom_foods(&self, foods: &BTreeMap<String, f64>) -> Result<()> {
        self.put_raw(CUSTOM_FOODS_KEY, &serde_json::to_string(foods)?)
    }

    pub fn load_custom_templates(&self) -> Result<CustomTemplates> {
        self.load_document(CUSTOM_TEMPLATES_KEY)
    }

    pub fn save_custom_templates(&self, templates: &CustomTemplates) -> Result<()> {
        self.put_raw(CUSTOM_TEMPLATES_KEY, &serde_json::to_string(templates)?)
    }

    /// A missing or unreadable document loads as the empty default.
    fn load_document<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable document '{key}': {e}");
                Ok(T::default())
            }
        }
    }

    // --- Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_timestamp(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        self.set_setting(key, &at.to_rfc3339())
    }

    /// A stored value that is not RFC 3339 reads as unset.
    pub fn get_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_setting(key)?.and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }))
    }
}

impl EntryRepository for Database {
    fn get(&self, date: NaiveDate) -> Result<Option<DailyEntry>> {
        let key = entry_key(date);
        let Some(raw) = self.get_raw(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<DailyEntry>(&raw) {
            Ok(mut entry) => {
                entry.ensure_sections();
                Ok(Some(entry))
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable entry '{key}': {e}");
                Ok(None)
            }
        }
    }

    fn put(&self, date: NaiveDate, entry: &DailyEntry) -> Result<()> {
        self.put_raw(&entry_key(date), &serde_json::to_string(entry)?)?;
        self.set_timestamp(SETTING_LAST_WRITE_AT, Utc::now())
    }

    fn list_all(&self) -> Result<BTreeMap<String, DailyEntry>> {
        let mut entries = BTreeMap::new();
        for (key, raw) in self.scan_prefix(KEY_PREFIX)? {
            if date_from_key(&key).is_none() {
                continue;
            }
            match serde_json::from_str::<DailyEntry>(&raw) {
                Ok(mut entry) => {
                    entry.ensure_sections();
                    entries.insert(key, entry);
                }
                Err(e) => tracing::warn!("Ignoring unreadable entry '{key}': {e}"),
            }
        }
        Ok(entries)
    }

    fn delete(&self, date: NaiveDate) -> Result<bool> {
        let deleted = self.delete_raw(&entry_key(date))?;
        if deleted {
            self.set_timestamp(SETTING_LAST_WRITE_AT, Utc::now())?;
        }
        Ok(deleted)
    }
}
