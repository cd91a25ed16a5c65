use crate::db::Db;
use crate::error::QueryResult;
use crate::model::{EdgeKind, GraphEdge, GraphNode, GraphView, NeighborRow, TargetNode};
use crate::neighborhood::{Neighborhood, resolve_neighborhood};
use std::collections::HashSet;

/// Upper bound on nodes handed to the renderer, however large the fan-in/out.
pub const MAX_GRAPH_NODES: usize = 1000;

/// Target first, then neighbors in row order; repeated ids collapse and
/// anything past `max_nodes` is dropped.
pub fn collect_nodes(target: &TargetNode, rows: &[NeighborRow], max_nodes: usize) -> Vec<GraphNode> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::new();
    let candidates = std::iter::once((target.id.as_str(), target.name.as_deref()))
        .chain(rows.iter().map(|row| (row.id.as_str(), row.name.as_deref())));

    let mut distinct = 0usize;
    for (id, name) in candidates {
        if !seen.insert(id) {
            continue;
        }
        distinct += 1;
        if nodes.len() < max_nodes {
            nodes.push(GraphNode {
                id: id.to_string(),
                label: name.unwrap_or(id).to_string(),
            });
        }
    }
    if distinct > nodes.len() {
        log::debug!(
            "Neighborhood of {} capped at {} of {} nodes",
            target.id,
            nodes.len(),
            distinct
        );
    }
    nodes
}

/// Label induced edges by their position in the result (`edge-0`, `edge-1`, ...).
pub fn label_edges<I>(edges: I) -> Vec<GraphEdge>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut next_index = 0usize;
    let mut out = Vec::new();
    for (source, target) in edges {
        out.push(GraphEdge {
            id: format!("edge-{next_index}"),
            source,
            target,
        });
        next_index += 1;
    }
    out
}

/// Build the bounded node list and the `call` edges induced on it.
pub fn assemble(db: &Db, neighborhood: &Neighborhood) -> QueryResult<GraphView> {
    assemble_capped(db, &neighborhood.target, &neighborhood.rows, MAX_GRAPH_NODES)
}

pub fn assemble_capped(
    db: &Db,
    target: &TargetNode,
    rows: &[NeighborRow],
    max_nodes: usize,
) -> QueryResult<GraphView> {
    let nodes = collect_nodes(target, rows, max_nodes);
    if nodes.is_empty() {
        return Ok(GraphView::default());
    }
    let ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let induced = db.call_edges_among(&ids)?;
    let edges = label_edges(induced.into_iter().filter_map(|edge| match edge.kind {
        EdgeKind::Call => Some((edge.source, edge.target)),
        EdgeKind::Other(_) => None,
    }));
    Ok(GraphView { nodes, edges })
}

/// Resolve and assemble the one-hop graph around a validated function id.
pub fn get_neighborhood(db: &Db, id: &str) -> QueryResult<GraphView> {
    let neighborhood = resolve_neighborhood(db, id)?;
    assemble(db, &neighborhood)
}
