//! SQLite implementation of the Store trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite; every
//! query runs on the blocking pool via `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use intentmail_core::{now_millis, PublicIdentity, StoredKeyMaterial};
use intentmail_perms::IntentDirectory;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex around the connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn row_to_key_material(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredKeyMaterial> {
    Ok(StoredKeyMaterial {
        signing_private_key: row.get("signing_private_key")?,
        signing_public_key: row.get("signing_public_key")?,
        agreement_private_key: row.get("agreement_private_key")?,
        agreement_public_key: row.get("agreement_public_key")?,
    })
}

fn decode_contact(json: &str) -> Result<PublicIdentity> {
    let contact: PublicIdentity = serde_json::from_str(json)?;
    contact.validate()?;
    Ok(contact)
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_key_material(&self, identity_id: &str) -> Result<Option<StoredKeyMaterial>> {
        let identity_id = identity_id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT signing_private_key, signing_public_key,
                        agreement_private_key, agreement_public_key
                 FROM key_material WHERE identity_id = ?1",
                params![identity_id],
                row_to_key_material,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn save_key_material(&self, identity_id: &str, keys: &StoredKeyMaterial) -> Result<()> {
        let identity_id = identity_id.to_string();
        let keys = keys.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO key_material (
                    identity_id, signing_private_key, signing_public_key,
                    agreement_private_key, agreement_public_key, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(identity_id) DO UPDATE SET
                    signing_private_key = excluded.signing_private_key,
                    signing_public_key = excluded.signing_public_key,
                    agreement_private_key = excluded.agreement_private_key,
                    agreement_public_key = excluded.agreement_public_key",
                params![
                    identity_id,
                    keys.signing_private_key,
                    keys.signing_public_key,
                    keys.agreement_private_key,
                    keys.agreement_public_key,
                    now_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_intent_directory(&self, identity_id: &str) -> Result<Option<IntentDirectory>> {
        let identity_id = identity_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT directory FROM intent_directories WHERE identity_id = ?1",
                    params![identity_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        json.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    async fn save_intent_directory(
        &self,
        identity_id: &str,
        directory: &IntentDirectory,
    ) -> Result<()> {
        let identity_id = identity_id.to_string();
        let json = serde_json::to_string(directory)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO intent_directories (identity_id, directory, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(identity_id) DO UPDATE SET
                    directory = excluded.directory,
                    updated_at = excluded.updated_at",
                params![identity_id, json, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_contacts(&self, identity_id: &str) -> Result<Vec<PublicIdentity>> {
        let identity_id = identity_id.to_string();
        let rows: Vec<String> = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT public_identity FROM contacts
                     WHERE identity_id = ?1 ORDER BY agent_id",
                )?;
                let rows = stmt
                    .query_map(params![identity_id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(rows)
            })
            .await?;

        rows.iter().map(|json| decode_contact(json)).collect()
    }

    async fn save_contact(&self, identity_id: &str, contact: &PublicIdentity) -> Result<()> {
        contact.validate()?;
        let identity_id = identity_id.to_string();
        let agent_id = contact.agent_id.clone();
        let fingerprint = contact.fingerprint.to_string();
        let json = serde_json::to_string(contact)?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO contacts (
                    identity_id, agent_id, fingerprint, public_identity, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(identity_id, agent_id) DO UPDATE SET
                    fingerprint = excluded.fingerprint,
                    public_identity = excluded.public_identity,
                    updated_at = excluded.updated_at",
                params![identity_id, agent_id, fingerprint, json, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_contact(
        &self,
        identity_id: &str,
        agent_id: &str,
    ) -> Result<Option<PublicIdentity>> {
        let identity_id = identity_id.to_string();
        let agent_id = agent_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT public_identity FROM contacts
                     WHERE identity_id = ?1 AND agent_id = ?2",
                    params![identity_id, agent_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        json.map(|json| decode_contact(&json)).transpose()
    }

    async fn remove_contact(&self, identity_id: &str, agent_id: &str) -> Result<bool> {
        let identity_id = identity_id.to_string();
        let agent_id = agent_id.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM contacts WHERE identity_id = ?1 AND agent_id = ?2",
                params![identity_id, agent_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn load_config(&self, identity_id: &str) -> Result<Option<Value>> {
        let identity_id = identity_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT config FROM configs WHERE identity_id = ?1",
                    params![identity_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        json.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    async fn save_config(&self, identity_id: &str, config: &Value) -> Result<()> {
        let identity_id = identity_id.to_string();
        let json = serde_json::to_string(config)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO configs (identity_id, config, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(identity_id) DO UPDATE SET
                    config = excluded.config,
                    updated_at = excluded.updated_at",
                params![identity_id, json, now_millis()],
            )?;
            Ok(())
        })
        .await
    }
}
