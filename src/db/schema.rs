pub const SCHEMA: &str = r#"
-- series table
CREATE TABLE IF NOT EXISTS series (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    history TEXT NOT NULL DEFAULT '[]',
    current TEXT NOT NULL DEFAULT '',
    is_watched INTEGER NOT NULL DEFAULT 0,
    is_tracking INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_series_is_tracking ON series(is_tracking);

-- settings table (key/value singleton)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

/// Columns added after the first release. Each is applied only when missing.
pub const MIGRATIONS: &[(&str, &str, &str)] = &[(
    "series",
    "crawler_last_seen",
    "ALTER TABLE series ADD COLUMN crawler_last_seen TEXT",
)];
