use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{NewSeries, Series, Settings};
use crate::reconcile::SeriesDelta;

use super::schema::{MIGRATIONS, SCHEMA};

const SERIES_COLUMNS: &str = "id, name, url, history, current, is_watched, is_tracking, created_at, updated_at, crawler_last_seen";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            for (table, column, ddl) in MIGRATIONS {
                if !column_exists(conn, table, column)? {
                    conn.execute_batch(ddl)?;
                }
            }
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Series operations

    pub async fn create_series(&self, series: NewSeries, now: DateTime<Utc>) -> Result<Series> {
        let id = self
            .conn
            .call(move |conn| {
                let stamp = now.to_rfc3339();
                conn.execute(
                    r#"INSERT INTO series (name, url, history, current, is_watched, is_tracking, created_at, updated_at)
                       VALUES (?1, ?2, '[]', '', 0, 1, ?3, ?3)"#,
                    params![series.name, series.url, stamp],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.get_series(id).await
    }

    pub async fn list_series(&self) -> Result<Vec<Series>> {
        let series = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SERIES_COLUMNS} FROM series ORDER BY is_tracking DESC, updated_at DESC"
                ))?;
                let series = stmt
                    .query_map([], series_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(series)
            })
            .await?;
        Ok(series)
    }

    pub async fn get_series(&self, id: i64) -> Result<Series> {
        let series = self
            .conn
            .call(move |conn| {
                let series = conn
                    .query_row(
                        &format!("SELECT {SERIES_COLUMNS} FROM series WHERE id = ?1"),
                        params![id],
                        series_from_row,
                    )
                    .optional()?;
                Ok(series)
            })
            .await?;
        series.ok_or_else(|| AppError::SeriesNotFound(format!("id {id}")))
    }

    pub async fn get_series_by_url(&self, url: &str) -> Result<Option<Series>> {
        let url = url.to_string();
        let series = self
            .conn
            .call(move |conn| {
                let series = conn
                    .query_row(
                        &format!("SELECT {SERIES_COLUMNS} FROM series WHERE url = ?1"),
                        params![url],
                        series_from_row,
                    )
                    .optional()?;
                Ok(series)
            })
            .await?;
        Ok(series)
    }

    /// User edit of name and URL. Does not count as a state change, so
    /// `updated_at` is left alone.
    pub async fn update_series(&self, id: i64, name: String, url: String) -> Result<Series> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE series SET name = ?1, url = ?2 WHERE id = ?3",
                    params![name, url, id],
                )?;
                Ok(changed)
            })
            .await?;
        expect_row(changed, id)?;
        self.get_series(id).await
    }

    pub async fn delete_series(&self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM series WHERE id = ?1", params![id])?;
                Ok(changed)
            })
            .await?;
        expect_row(changed, id)
    }

    pub async fn set_watched(&self, id: i64, is_watched: bool) -> Result<()> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE series SET is_watched = ?1 WHERE id = ?2",
                    params![is_watched, id],
                )?;
                Ok(changed)
            })
            .await?;
        expect_row(changed, id)
    }

    /// Flips `is_tracking` and returns the new value.
    pub async fn toggle_tracking(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE series SET is_tracking = NOT is_tracking WHERE id = ?1",
                    params![id],
                )?;
                Ok(changed)
            })
            .await?;
        expect_row(changed, id)?;
        Ok(self.get_series(id).await?.is_tracking)
    }

    pub async fn clear_history(&self, id: i64, now: DateTime<Utc>) -> Result<Series> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE series SET history = '[]', current = '', updated_at = ?1 WHERE id = ?2",
                    params![now.to_rfc3339(), id],
                )?;
                Ok(changed)
            })
            .await?;
        expect_row(changed, id)?;
        self.get_series(id).await
    }

    pub async fn get_tracking_urls(&self) -> Result<Vec<String>> {
        let urls = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT url FROM series WHERE is_tracking = 1 ORDER BY id")?;
                let urls = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await?;
        Ok(urls)
    }

    /// Writes the outcome of one reconciliation. Single-row, auto-committed.
    pub async fn apply_delta(&self, url: &str, delta: SeriesDelta, now: DateTime<Utc>) -> Result<()> {
        let key = url.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                let stamp = now.to_rfc3339();
                let changed = match delta {
                    SeriesDelta::Replace { history, current } => {
                        let history_json = serde_json::to_string(&history)
                            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
                        conn.execute(
                            r#"UPDATE series
                               SET history = ?1, current = ?2, is_watched = 0,
                                   updated_at = ?3, crawler_last_seen = ?3
                               WHERE url = ?4"#,
                            params![history_json, current, stamp, key],
                        )?
                    }
                    SeriesDelta::Status { current } => conn.execute(
                        r#"UPDATE series
                           SET current = ?1, is_watched = 0,
                               updated_at = ?2, crawler_last_seen = ?2
                           WHERE url = ?3"#,
                        params![current, stamp, key],
                    )?,
                    SeriesDelta::Seen => conn.execute(
                        "UPDATE series SET crawler_last_seen = ?1 WHERE url = ?2",
                        params![stamp, key],
                    )?,
                };
                Ok(changed)
            })
            .await?;

        if changed == 0 {
            return Err(AppError::SeriesNotFound(url.to_string()));
        }
        Ok(())
    }

    // Settings operations

    pub async fn get_settings(&self) -> Result<Settings> {
        let settings = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                })?;

                let mut settings = Settings::default();
                for row in rows {
                    let (key, value) = row?;
                    let value = value.unwrap_or_default();
                    match key.as_str() {
                        Settings::START_TIME_KEY => settings.crawler_start_time = value,
                        Settings::END_TIME_KEY => settings.crawler_end_time = value,
                        Settings::WEBHOOK_KEY => settings.notification_webhook = value,
                        _ => {}
                    }
                }
                Ok(settings)
            })
            .await?;
        Ok(settings)
    }

    /// Writes every key in one transaction; either all land or none do.
    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt =
                        tx.prepare("INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)")?;
                    stmt.execute(params![Settings::START_TIME_KEY, settings.crawler_start_time])?;
                    stmt.execute(params![Settings::END_TIME_KEY, settings.crawler_end_time])?;
                    stmt.execute(params![Settings::WEBHOOK_KEY, settings.notification_webhook])?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn column_exists(conn: &rusqlite::Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}

fn expect_row(changed: usize, id: i64) -> Result<()> {
    if changed == 0 {
        Err(AppError::SeriesNotFound(format!("id {id}")))
    } else {
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite's datetime('now') default
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn series_from_row(row: &Row) -> rusqlite::Result<Series> {
    let history_json: String = row.get(3)?;
    let history: Vec<String> = serde_json::from_str(&history_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Series {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        history,
        current: row.get(4)?,
        is_watched: row.get::<_, i64>(5)? != 0,
        is_tracking: row.get::<_, i64>(6)? != 0,
        created_at: row
            .get::<_, String>(7)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        updated_at: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        crawler_last_seen: row
            .get::<_, Option<String>>(9)?
            .and_then(|s| parse_datetime(&s)),
    })
}
