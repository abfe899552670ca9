//! Community gallery queries: insert and list of shared model records.

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

/// Maximum number of records returned by [`list_models`].
pub const RECENT_MODELS_LIMIT: usize = 50;

/// A gallery record to insert.
#[derive(Debug, Clone)]
pub struct NewModel {
    pub model_url: String,
    pub prompt: String,
    /// Client-provided generation time; the insert time is used when
    /// absent.
    pub timestamp: Option<String>,
}

/// A stored gallery record, serialized with the wire field names the
/// gallery client expects.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRecord {
    pub id: i64,
    #[serde(rename = "modelUrl")]
    pub model_url: String,
    pub prompt: String,
    pub timestamp: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Errors from gallery queries.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("gallery query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Inserts a gallery record and returns its assigned identifier.
///
/// `created_at` is always server-assigned; a missing client `timestamp`
/// defaults to the same instant.
pub fn insert_model(conn: &Connection, model: &NewModel) -> Result<i64, GalleryError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let timestamp = model.timestamp.as_deref().unwrap_or(&now);

    conn.execute(
        "INSERT INTO models (model_url, prompt, timestamp, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        (&model.model_url, &model.prompt, timestamp, &now),
    )?;

    Ok(conn.last_insert_rowid())
}

/// Returns the most recently created records, newest first, capped at
/// [`RECENT_MODELS_LIMIT`]. The `id` tie-break keeps same-instant inserts
/// in insertion order.
pub fn list_models(conn: &Connection) -> Result<Vec<ModelRecord>, GalleryError> {
    let mut stmt = conn.prepare(
        "SELECT id, model_url, prompt, timestamp, created_at
         FROM models
         ORDER BY created_at DESC, id DESC
         LIMIT ?1",
    )?;

    let records = stmt
        .query_map([RECENT_MODELS_LIMIT as i64], |row| {
            Ok(ModelRecord {
                id: row.get(0)?,
                model_url: row.get(1)?,
                prompt: row.get(2)?,
                timestamp: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_migrations;
    use rusqlite::Connection;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        run_migrations(&conn).expect("migrations should succeed");
        conn
    }

    #[test]
    fn insert_assigns_id_and_creation_time() {
        let conn = test_conn();

        let id = insert_model(
            &conn,
            &NewModel {
                model_url: "https://cdn.example.com/m/1.glb".to_string(),
                prompt: "a small ceramic fox".to_string(),
                timestamp: None,
            },
        )
        .expect("insert should succeed");
        assert!(id > 0);

        let records = list_models(&conn).expect("list should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].prompt, "a small ceramic fox");
        // Defaulted timestamp matches the server-assigned creation time.
        assert_eq!(records[0].timestamp, records[0].created_at);
    }

    #[test]
    fn client_timestamp_is_preserved() {
        let conn = test_conn();

        insert_model(
            &conn,
            &NewModel {
                model_url: "https://cdn.example.com/m/2.glb".to_string(),
                prompt: "a brass compass".to_string(),
                timestamp: Some("2026-01-02T03:04:05Z".to_string()),
            },
        )
        .expect("insert should succeed");

        let records = list_models(&conn).expect("list should succeed");
        assert_eq!(records[0].timestamp, "2026-01-02T03:04:05Z");
        assert_ne!(records[0].created_at, records[0].timestamp);
    }

    #[test]
    fn list_orders_newest_first() {
        let conn = test_conn();

        // Explicit creation times so the ordering is independent of clock
        // granularity.
        for (url, created_at) in [
            ("https://cdn.example.com/m/old.glb", "2026-01-01T00:00:00Z"),
            ("https://cdn.example.com/m/new.glb", "2026-03-01T00:00:00Z"),
            ("https://cdn.example.com/m/mid.glb", "2026-02-01T00:00:00Z"),
        ] {
            conn.execute(
                "INSERT INTO models (model_url, prompt, timestamp, created_at)
                 VALUES (?1, 'p', ?2, ?2)",
                (url, created_at),
            )
            .expect("raw insert should succeed");
        }

        let records = list_models(&conn).expect("list should succeed");
        let urls: Vec<&str> = records.iter().map(|r| r.model_url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://cdn.example.com/m/new.glb",
                "https://cdn.example.com/m/mid.glb",
                "https://cdn.example.com/m/old.glb",
            ]
        );
    }

    #[test]
    fn list_caps_at_fifty_records() {
        let conn = test_conn();

        for i in 0..(RECENT_MODELS_LIMIT + 5) {
            insert_model(
                &conn,
                &NewModel {
                    model_url: format!("https://cdn.example.com/m/{i}.glb"),
                    prompt: format!("prompt {i}"),
                    timestamp: None,
                },
            )
            .expect("insert should succeed");
        }

        let records = list_models(&conn).expect("list should succeed");
        assert_eq!(records.len(), RECENT_MODELS_LIMIT);
        // Same-instant inserts fall back to id order, newest id first.
        assert_eq!(
            records[0].model_url,
            format!("https://cdn.example.com/m/{}.glb", RECENT_MODELS_LIMIT + 4)
        );
    }
}
