use anyhow::Result;
use rusqlite::Connection;

/// Tables the offline analysis pass writes. This crate only ever reads them.
pub const TABLES: [&str; 3] = ["nodes", "edges", "sources"];

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS nodes (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        name TEXT,
        package TEXT,
        file TEXT,
        line INTEGER,
        end_line INTEGER,
        type_info TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_nodes_kind ON nodes(kind);
    CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name);

    CREATE TABLE IF NOT EXISTS edges (
        source TEXT NOT NULL,
        target TEXT NOT NULL,
        kind TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source, kind);
    CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target, kind);

    CREATE TABLE IF NOT EXISTS sources (
        file TEXT PRIMARY KEY,
        content TEXT NOT NULL
    );
";

/// Create the store layout on a writable connection (fixtures, exporters).
pub fn create(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!("BEGIN;{SCHEMA}COMMIT;"))?;
    Ok(())
}
