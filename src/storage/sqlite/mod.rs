#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

pub(crate) mod migration;

use async_trait::async_trait;
use eyre::{Context, Result};
use tokio_rusqlite::{Connection, named_params, params};

use super::{KeyValueStorage, check_capacity};

pub struct Sqlite {
    conn: Connection,
    max_value_bytes: Option<usize>,
}

impl Sqlite {
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open(path)
                .await
                .wrap_err(format!("opening database path: {}", path))?,
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        Ok(Self {
            conn,
            max_value_bytes: None,
        })
    }

    pub fn with_max_value_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_value_bytes = limit;
        self
    }

    pub async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| Ok(conn.execute_batch(migration::MIGRATION)?))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for Sqlite {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let value = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?")?;
                let mut rows = stmt.query(params![key])?;
                let value: Option<String> = match rows.next()? {
                    Some(row) => Some(row.get(0)?),
                    None => None,
                };
                Ok(value)
            })
            .await
            .wrap_err("reading key")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        check_capacity(key, value, self.max_value_bytes)?;

        let key = key.to_string();
        let value = value.to_string();
        let updated_at = chrono::Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (:key, :value, :updated_at)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    named_params! {
                        ":key": key,
                        ":value": value,
                        ":updated_at": updated_at,
                    },
                )?;
                Ok(())
            })
            .await
            .wrap_err("writing key")?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM kv WHERE key = ?", params![key])?;
                Ok(())
            })
            .await
            .wrap_err("removing key")?;
        Ok(())
    }
}
