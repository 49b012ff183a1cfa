use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use async_trait::async_trait;
use chatline_crypto::MasterSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;
use tokio_sqlite::Value;

use crate::backend::SessionProvider;
use crate::chat::RenderOptions;
use crate::models::{Session, value_as_string_opt};
use crate::storage::Storage;

/// Settings read from the JSON configuration file. Every field has a default,
/// so a missing file or a partial one is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    // Directory holding the SQLite store.
    pub data_dir: PathBuf,
    // `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub render: RenderOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_filter: "chatline=info".to_string(),
            render: RenderOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load the configuration file, falling back to defaults when it does not
    /// exist.
    pub async fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config = serde_json::from_str(&data)
            .map_err(|e| anyhow!("Failed to parse config '{}': {}", path.display(), e))?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatline")
            .join("config.json")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatline")
}

/// Configuration manager backed by the `"config"` table.
/// Keys used:
/// - `"session"`: JSON-encoded `Session` of the signed-in user
/// - `"master_secret"`: hex-encoded secret conversation keys derive from
pub struct ConfigManager {
    storage: Arc<TokioMutex<Storage>>,
}

impl ConfigManager {
    pub fn new(storage: Arc<TokioMutex<Storage>>) -> Self {
        Self { storage }
    }

    /// Remember `session` as the signed-in user.
    pub async fn sign_in(&self, session: &Session) -> Result<(), anyhow::Error> {
        let raw = serde_json::to_string(session)
            .map_err(|e| anyhow!("Failed to serialize session: {}", e))?;
        self.write_setting("session", raw).await
    }

    pub async fn sign_out(&self) -> Result<(), anyhow::Error> {
        let mut storage = self.storage.lock().await;
        let conn = storage.connection().await;
        conn.execute(
            "DELETE FROM \"config\" WHERE \"key\" = ?1",
            vec![Value::Text("session".to_string())],
        )
        .await
        .map_err(|e| anyhow!("Failed to delete session: {}", e))?;
        Ok(())
    }

    pub async fn get_session(&self) -> Result<Option<Session>, anyhow::Error> {
        let Some(raw) = self.read_setting("session").await? else {
            return Ok(None);
        };
        let session =
            serde_json::from_str(&raw).map_err(|e| anyhow!("Failed to parse session: {}", e))?;
        Ok(Some(session))
    }

    /// Load the conversation master secret, generating and persisting one on
    /// first use.
    pub async fn master_secret(&self) -> Result<MasterSecret, anyhow::Error> {
        if let Some(raw) = self.read_setting("master_secret").await? {
            return MasterSecret::from_hex(&raw)
                .map_err(|e| anyhow!("Failed to parse master secret: {}", e));
        }
        tracing::info!("Generating conversation master secret");
        let secret = MasterSecret::generate();
        self.write_setting("master_secret", secret.to_hex()).await?;
        Ok(secret)
    }

    async fn read_setting(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut storage = self.storage.lock().await;
        let row = storage
            .connection()
            .await
            .query_row(
                "SELECT \"value\" FROM \"config\" WHERE \"key\" = ?1",
                vec![Value::Text(key.to_string())],
            )
            .await
            .with_context(|| format!("Failed to read setting '{}'", key))?;
        match row.map(|row| row.into_values()) {
            Some(values) => values
                .first()
                .map_or(Ok(None), value_as_string_opt)
                .with_context(|| format!("Malformed setting '{}'", key)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite one setting; `key` is unique in the table.
    async fn write_setting(&self, key: &str, value: String) -> Result<(), anyhow::Error> {
        let mut storage = self.storage.lock().await;
        storage
            .connection()
            .await
            .execute(
                "INSERT INTO \"config\" (\"key\", \"value\") VALUES (?1, ?2) \
                 ON CONFLICT (\"key\") DO UPDATE SET \"value\" = excluded.\"value\"",
                vec![Value::Text(key.to_string()), Value::Text(value)],
            )
            .await
            .with_context(|| format!("Failed to write setting '{}'", key))?;
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for ConfigManager {
    async fn current_session(&self) -> Result<Option<Session>, anyhow::Error> {
        self.get_session().await
    }
}
