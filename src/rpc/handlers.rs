//! Handler functions for RPC methods.
//! Each function corresponds to a match arm in `handle_method`.

use super::*;
use crate::validate::{identifier_from_value, search_query_from_value};
use crate::{search, source, subgraph};

pub(super) fn handle_search_functions(db: &Db, params: SearchFunctionsParams) -> QueryResult<Value> {
    let term = search_query_from_value(params.query.as_ref())?;
    let hits = search::search_functions(db, &term)?;
    to_json(&hits)
}

pub(super) fn handle_get_neighborhood(db: &Db, params: NodeIdParams) -> QueryResult<Value> {
    let id = identifier_from_value(params.id.as_ref())?;
    let graph = subgraph::get_neighborhood(db, &id)?;
    to_json(&graph)
}

pub(super) fn handle_get_source(db: &Db, params: NodeIdParams) -> QueryResult<Value> {
    let id = identifier_from_value(params.id.as_ref())?;
    let slice = source::get_source(db, &id)?;
    to_json(&slice)
}
