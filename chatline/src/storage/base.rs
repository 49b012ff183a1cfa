use std::path::Path;

use anyhow::Context as _;
use tokio_sqlite::{Connection, Value};

/// SQLite database file backing the reference store.
pub struct Storage {
    connection: Connection,
}

impl Storage {
    /// Open (or create) the store in directory `path` and make sure every
    /// table exists.
    pub async fn open(path: &Path) -> Result<Self, anyhow::Error> {
        let path = path.to_owned();
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create store directory {}", path.display()))?;
        let data_path = path.join("data.db");
        let mut connection = Connection::open(&data_path).await?;
        Self::create_tables(&mut connection).await?;
        tracing::debug!(path = %data_path.display(), "Opened store");
        Ok(Self { connection })
    }

    pub async fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    async fn create_tables(conn: &mut Connection) -> Result<(), anyhow::Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS \"config\" (
                \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,
                \"key\" TEXT NOT NULL UNIQUE,
                \"value\" TEXT NOT NULL
            )",
            Vec::<Value>::new(),
        )
        .await
        .context("Failed to create config table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS \"user\" (
                \"id\" TEXT PRIMARY KEY NOT NULL,
                \"display_name\" TEXT NOT NULL,
                \"photo_url\" TEXT,
                \"username\" TEXT,
                \"email\" TEXT,
                \"about\" TEXT
            )",
            Vec::<Value>::new(),
        )
        .await
        .context("Failed to create user table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS \"message\" (
                \"seq\" INTEGER PRIMARY KEY AUTOINCREMENT,
                \"id\" TEXT NOT NULL UNIQUE,
                \"chat_id\" TEXT NOT NULL,
                \"sender_id\" TEXT,
                \"sender_name\" TEXT NOT NULL,
                \"content\" TEXT,
                \"file_url\" TEXT,
                \"file_type\" TEXT,
                \"file_name\" TEXT,
                \"time\" BIGINT,
                \"streak\" INTEGER,
                \"profile_pic\" TEXT
            )",
            Vec::<Value>::new(),
        )
        .await
        .context("Failed to create message table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS message__chat_id_time_idx
                 ON \"message\" (\"chat_id\", \"time\")",
            Vec::<Value>::new(),
        )
        .await
        .context("Failed to create message__chat_id_time_idx index")?;

        Ok(())
    }
}
