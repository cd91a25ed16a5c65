use crate::db::Db;
use crate::error::{QueryError, QueryResult};
use crate::model::{NeighborRow, NodeKind, TargetNode};
use serde::Serialize;

/// A function and its one-hop call neighborhood, callers first.
#[derive(Debug, Clone, Serialize)]
pub struct Neighborhood {
    pub target: TargetNode,
    pub rows: Vec<NeighborRow>,
}

/// Resolve direct callers and callees of a validated function id.
///
/// A miss on the function lookup is followed by a kind-agnostic lookup so an
/// unknown id and a non-function id surface as different errors.
pub fn resolve_neighborhood(db: &Db, id: &str) -> QueryResult<Neighborhood> {
    let target = match db.get_function(id)? {
        Some(target) => target,
        None => return Err(missing_function(db, id)?),
    };
    let rows = db.neighbor_rows(id)?;
    Ok(Neighborhood { target, rows })
}

fn missing_function(db: &Db, id: &str) -> QueryResult<QueryError> {
    Ok(match db.node_kind(id)? {
        None | Some(NodeKind::Function) => QueryError::NotFound { id: id.to_string() },
        Some(NodeKind::Other(kind)) => QueryError::WrongKind {
            id: id.to_string(),
            kind,
        },
    })
}
