mod handlers;

use crate::config::Config;
use crate::db::Db;
use crate::error::{QueryError, QueryResult, UnavailableSource};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

#[derive(Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct RpcResponse {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Deserialize, Default, schemars::JsonSchema)]
struct SearchFunctionsParams {
    /// Substring of the function name; empty returns no results.
    #[serde(default, alias = "q", alias = "term")]
    query: Option<Value>,
}

#[derive(Deserialize, Default, schemars::JsonSchema)]
struct NodeIdParams {
    /// Node id as stored by the analysis pass (may be percent-encoded).
    #[serde(default, alias = "node_id", alias = "function_id")]
    id: Option<Value>,
}

struct MethodDoc {
    name: &'static str,
    summary: &'static str,
}

const METHOD_DOCS: &[MethodDoc] = &[
    MethodDoc {
        name: "search_functions",
        summary: "Up to 50 functions whose name contains `query`.",
    },
    MethodDoc {
        name: "get_neighborhood",
        summary: "Direct callers and callees of function `id` with the call edges among them.",
    },
    MethodDoc {
        name: "get_source",
        summary: "Source lines backing node `id`.",
    },
    MethodDoc {
        name: "overview",
        summary: "Node, edge and source file counts for the store.",
    },
    MethodDoc {
        name: "list_methods",
        summary: "List RPC methods with their parameter schemas.",
    },
];

const ALIASES: &[(&str, &str)] = &[
    ("search", "search_functions"),
    ("neighborhood", "get_neighborhood"),
    ("source", "get_source"),
];

fn canonical_method(method: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == method)
        .map(|(_, target)| *target)
        .unwrap_or(method)
}

// --- Per-method JSON Schema generation ---

fn schema_value<T: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let raw = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));
    simplify_schema(raw)
}

/// Return a simplified JSON Schema for the params struct of the given method.
pub fn method_param_schema(method: &str) -> Value {
    match canonical_method(method) {
        "search_functions" => schema_value::<SearchFunctionsParams>(),
        "get_neighborhood" | "get_source" => schema_value::<NodeIdParams>(),
        // Paramless methods
        _ => json!({"type": "object"}),
    }
}

/// Strip schemars noise that callers do not need.
fn simplify_schema(mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("definitions");
        obj.remove("title");
    }
    schema
}

fn method_list() -> Value {
    let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
    for (alias, target) in ALIASES {
        aliases.entry(*target).or_default().push(*alias);
    }
    let methods: Vec<Value> = METHOD_DOCS
        .iter()
        .map(|doc| {
            json!({
                "name": doc.name,
                "summary": doc.summary,
                "aliases": aliases.get(doc.name).cloned().unwrap_or_default(),
                "params": method_param_schema(doc.name),
            })
        })
        .collect();
    json!({ "methods": methods })
}

fn parse_params<T: for<'de> Deserialize<'de> + Default>(params: Value) -> QueryResult<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|err| QueryError::BadRequest(format!("invalid params: {err}")))
}

fn to_json<T: Serialize>(value: &T) -> QueryResult<Value> {
    Ok(serde_json::to_value(value).context("serialize response")?)
}

/// Run one method against the store.
pub fn handle_method(db: &Db, method: &str, params: Value) -> QueryResult<Value> {
    let start = Instant::now();
    log::debug!("dispatch {method}");
    let value = match canonical_method(method) {
        "search_functions" => handlers::handle_search_functions(db, parse_params(params)?)?,
        "get_neighborhood" => handlers::handle_get_neighborhood(db, parse_params(params)?)?,
        "get_source" => handlers::handle_get_source(db, parse_params(params)?)?,
        "overview" => to_json(&db.overview()?)?,
        "list_methods" => method_list(),
        other => {
            return Err(QueryError::BadRequest(format!("unknown method: {other}")));
        }
    };

    // Log slow queries
    let elapsed = start.elapsed();
    if elapsed.as_millis() > u128::from(Config::get().slow_query_ms) {
        log::warn!("Slow query: {} took {:?}", method, elapsed);
    }
    Ok(value)
}

fn error_data(err: &QueryError) -> Option<Value> {
    match err {
        QueryError::Validation(validation) => serde_json::to_value(validation).ok(),
        QueryError::NotFound { id } => Some(json!({ "id": id })),
        QueryError::WrongKind { id, kind } => Some(json!({ "id": id, "kind": kind })),
        QueryError::Unavailable(UnavailableSource::External(meta)) => Some(json!({
            "reason": "external",
            "name": meta.name,
            "package": meta.package,
            "type_info": meta.type_info,
        })),
        QueryError::Unavailable(UnavailableSource::NoFileMetadata { name, package }) => {
            Some(json!({
                "reason": "no_file",
                "name": name,
                "package": package,
            }))
        }
        QueryError::Unavailable(UnavailableSource::FileMissing { file }) => Some(json!({
            "reason": "file_missing",
            "file_name": file,
        })),
        QueryError::BadRequest(_) | QueryError::Internal(_) => None,
    }
}

fn error_response(id: Value, method: &str, err: &QueryError) -> RpcResponse {
    if let QueryError::Internal(inner) = err {
        log::error!("{method} failed: {inner:#}");
    }
    RpcResponse {
        id,
        result: None,
        error: Some(RpcError {
            code: err.code(),
            message: err.to_string(),
            data: error_data(err),
        }),
    }
}

struct App<'a> {
    db: &'a Db,
}

impl App<'_> {
    fn handle_request(&self, req: RpcRequest) -> RpcResponse {
        match handle_method(self.db, &req.method, req.params) {
            Ok(value) => RpcResponse {
                id: req.id,
                result: Some(value),
                error: None,
            },
            Err(err) => error_response(req.id, &req.method, &err),
        }
    }

    fn handle_line(&self, line: &str) -> RpcResponse {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle_request(request),
            Err(err) => error_response(
                Value::Null,
                "request",
                &QueryError::BadRequest(format!("invalid request: {err}")),
            ),
        }
    }
}

/// Answer one JSON line; exposed for embedding and tests.
pub fn respond(db: &Db, line: &str) -> Result<String> {
    let response = App { db }.handle_line(line);
    Ok(serde_json::to_string(&response)?)
}

fn open_store(db_path: &Path) -> Result<Db> {
    let db = Db::open(db_path)?;
    db.check_schema()?;
    Ok(db)
}

/// JSONL server over stdin/stdout.
pub fn serve(db_path: &Path) -> Result<()> {
    let db = open_store(db_path)?;
    let app = App { db: &db };
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(value) => value,
            Err(err) => {
                log::error!("stdin error: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = app.handle_line(&line);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }

    Ok(())
}

pub fn call(db_path: &Path, method: String, params_raw: &str, id_raw: &str) -> Result<String> {
    let params: Value = serde_json::from_str(params_raw).with_context(|| "parse params JSON")?;
    let id = parse_value(id_raw);
    let db = open_store(db_path)?;
    let response = App { db: &db }.handle_request(RpcRequest { id, method, params });
    Ok(serde_json::to_string(&response)?)
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(canonical_method("search"), "search_functions");
        assert_eq!(canonical_method("source"), "get_source");
        assert_eq!(canonical_method("overview"), "overview");
    }

    #[test]
    fn id_methods_publish_an_id_param() {
        let schema = method_param_schema("neighborhood");
        assert!(schema["properties"].get("id").is_some());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn parse_value_keeps_non_json_ids_as_strings() {
        assert_eq!(parse_value("7"), json!(7));
        assert_eq!(parse_value("abc"), json!("abc"));
    }

    #[test]
    fn internal_errors_carry_no_detail() {
        let err = QueryError::Internal(anyhow::anyhow!("disk I/O error at /secret/path"));
        let response = error_response(json!(1), "get_source", &err);
        let error = response.error.unwrap();
        assert_eq!(error.code, "internal_error");
        assert_eq!(error.message, "internal error");
        assert!(error.data.is_none());
    }
}
