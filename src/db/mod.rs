use crate::config::Config;
use crate::model::{
    Direction, Edge, EdgeKind, FunctionHit, NeighborRow, Node, NodeKind, SourceFile,
    StoreOverview, TargetNode,
};
use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod schema;

#[derive(Debug)]
struct ConnectionCustomizer {
    busy_timeout: Duration,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(())
    }

    fn on_release(&self, _conn: Connection) {}
}

/// Process-wide handle to the code property graph store.
///
/// Every pooled connection is opened `SQLITE_OPEN_READ_ONLY`; there is no
/// writer for the lifetime of the process, so the pool is shared by reference
/// between handlers without any application-level lock.
pub struct Db {
    db_path: PathBuf,
    read_pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.is_file() {
            anyhow::bail!("cpg store not found at {}", db_path.display());
        }

        let config = Config::get();
        log::info!(
            "Initializing read-only connection pool (size: {}, min_idle: {})",
            config.pool_size,
            config.pool_min_idle
        );

        let manager = SqliteConnectionManager::file(db_path).with_flags(
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        );
        let read_pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.pool_min_idle))
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(ConnectionCustomizer {
                busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            }))
            .build(manager)
            .with_context(|| format!("open cpg store at {}", db_path.display()))?;

        log::info!("Store {} opened read-only", db_path.display());

        Ok(Self {
            db_path: db_path.to_path_buf(),
            read_pool,
        })
    }

    pub fn read_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.read_pool
            .get()
            .with_context(|| "get read connection from pool")
    }

    /// Fail unless the tables written by the analysis pass are present.
    pub fn check_schema(&self) -> Result<()> {
        let conn = self.read_conn()?;
        let mut stmt =
            conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")?;
        let mut missing = Vec::new();
        for table in schema::TABLES {
            if !stmt.exists(params![table])? {
                missing.push(table);
            }
        }
        if !missing.is_empty() {
            anyhow::bail!(
                "{} is not a cpg store (missing tables: {})",
                self.db_path.display(),
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// `pattern` is an already-escaped `LIKE` fragment.
    pub fn search_functions(&self, pattern: &str, limit: usize) -> Result<Vec<FunctionHit>> {
        let like = format!("%{pattern}%");
        let limit = limit as i64;
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name
             FROM nodes
             WHERE kind = ?1
               AND name LIKE ?2 ESCAPE '\\'
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![NodeKind::Function.as_str(), like, limit], |row| {
            Ok(FunctionHit {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    pub fn get_function(&self, id: &str) -> Result<Option<TargetNode>> {
        self.read_conn()?
            .query_row(
                "SELECT id, name FROM nodes WHERE id = ?1 AND kind = ?2",
                params![id, NodeKind::Function.as_str()],
                |row| {
                    Ok(TargetNode {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn node_kind(&self, id: &str) -> Result<Option<NodeKind>> {
        let kind: Option<String> = self
            .read_conn()?
            .query_row("SELECT kind FROM nodes WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(kind.as_deref().map(NodeKind::parse))
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        self.read_conn()?
            .query_row(
                "SELECT id, kind, name, package, file, line, end_line, type_info
                 FROM nodes
                 WHERE id = ?",
                params![id],
                node_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Direct callers then callees of `id`, each direction ordered by name.
    pub fn neighbor_rows(&self, id: &str) -> Result<Vec<NeighborRow>> {
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(
            "SELECT 0 AS rank, n.id, n.name AS name
             FROM edges e
             JOIN nodes n ON n.id = e.source
             WHERE e.target = ?1 AND e.kind = ?2 AND n.kind = ?3
             UNION ALL
             SELECT 1 AS rank, n.id, n.name AS name
             FROM edges e
             JOIN nodes n ON n.id = e.target
             WHERE e.source = ?1 AND e.kind = ?2 AND n.kind = ?3
             ORDER BY rank, name",
        )?;
        let rows = stmt.query_map(
            params![id, EdgeKind::Call.as_str(), NodeKind::Function.as_str()],
            |row| {
                let rank: i64 = row.get(0)?;
                Ok(NeighborRow {
                    direction: if rank == 0 {
                        Direction::Caller
                    } else {
                        Direction::Callee
                    },
                    id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Every `call` edge with both endpoints in `ids`, in storage order.
    pub fn call_edges_among(&self, ids: &[String]) -> Result<Vec<Edge>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut placeholders = String::new();
        for idx in 1..=ids.len() {
            if idx > 1 {
                placeholders.push(',');
            }
            placeholders.push('?');
            placeholders.push_str(&idx.to_string());
        }
        let kind_param = ids.len() + 1;
        let sql = format!(
            "SELECT source, target, kind
             FROM edges
             WHERE kind = ?{kind_param}
               AND source IN ({placeholders})
               AND target IN ({placeholders})
             ORDER BY rowid"
        );
        let conn = self.read_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let call = EdgeKind::Call;
        let values = ids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(call.as_str()));
        let rows = stmt.query_map(params_from_iter(values), |row| {
            let kind: String = row.get(2)?;
            Ok(Edge {
                source: row.get(0)?,
                target: row.get(1)?,
                kind: EdgeKind::parse(&kind),
            })
        })?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    pub fn get_source_file(&self, file: &str) -> Result<Option<SourceFile>> {
        self.read_conn()?
            .query_row(
                "SELECT file, content FROM sources WHERE file = ?",
                params![file],
                |row| {
                    Ok(SourceFile {
                        file: row.get(0)?,
                        content: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn overview(&self) -> Result<StoreOverview> {
        let conn = self.read_conn()?;
        let mut nodes_by_kind = BTreeMap::new();
        let mut stmt =
            conn.prepare("SELECT kind, COUNT(*) FROM nodes GROUP BY kind ORDER BY kind")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (kind, count) = row?;
            nodes_by_kind.insert(kind, count);
        }
        let nodes: i64 = nodes_by_kind.values().sum();
        let edges = count(&conn, "SELECT COUNT(*) FROM edges")?;
        let call_edges: i64 = conn.query_row(
            "SELECT COUNT(*) FROM edges WHERE kind = ?1",
            params![EdgeKind::Call.as_str()],
            |row| row.get(0),
        )?;
        let source_files = count(&conn, "SELECT COUNT(*) FROM sources")?;

        Ok(StoreOverview {
            db_path: self.db_path.to_string_lossy().to_string(),
            nodes,
            nodes_by_kind,
            edges,
            call_edges,
            source_files,
        })
    }
}

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    conn.query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("count: {sql}"))
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    let kind: String = row.get(1)?;
    Ok(Node {
        id: row.get(0)?,
        kind: NodeKind::parse(&kind),
        name: row.get(2)?,
        package: row.get(3)?,
        file: row.get(4)?,
        line: row.get(5)?,
        end_line: row.get(6)?,
        type_info: row.get(7)?,
    })
}
