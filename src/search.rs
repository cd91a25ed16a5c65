use crate::db::Db;
use crate::error::QueryResult;
use crate::model::FunctionHit;
use crate::validate::validate_search_query;

pub const MAX_SEARCH_RESULTS: usize = 50;

/// Substring search over function names. `term` must already be sanitized;
/// an empty term means no query has been typed yet and never touches the store.
pub fn search_functions(db: &Db, term: &str) -> QueryResult<Vec<FunctionHit>> {
    if term.is_empty() {
        return Ok(Vec::new());
    }
    Ok(db.search_functions(term, MAX_SEARCH_RESULTS)?)
}

/// Validate a raw term and run the search.
pub fn search_functions_raw(db: &Db, raw: &str) -> QueryResult<Vec<FunctionHit>> {
    let term = validate_search_query(raw)?;
    search_functions(db, &term)
}
