use cpgraph::QueryError;
use cpgraph::db::{Db, schema};
use cpgraph::model::{Direction, EdgeKind};
use cpgraph::neighborhood::resolve_neighborhood;
use cpgraph::subgraph::{MAX_GRAPH_NODES, get_neighborhood};
use rusqlite::{Connection, params};
use std::collections::HashSet;
use tempfile::TempDir;

fn build_store(populate: impl FnOnce(&Connection)) -> (TempDir, Db) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cpg.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        schema::create(&conn).unwrap();
        conn.execute_batch("BEGIN").unwrap();
        populate(&conn);
        conn.execute_batch("COMMIT").unwrap();
    }
    let db = Db::open(&path).unwrap();
    (dir, db)
}

fn function(conn: &Connection, id: &str, name: &str) {
    conn.execute(
        "INSERT INTO nodes (id, kind, name, package, file, line, end_line)
         VALUES (?, 'function', ?, 'main', 'main.go', 1, 2)",
        params![id, name],
    )
    .unwrap();
}

fn node(conn: &Connection, id: &str, kind: &str) {
    conn.execute(
        "INSERT INTO nodes (id, kind, name) VALUES (?, ?, ?)",
        params![id, kind, id],
    )
    .unwrap();
}

fn edge(conn: &Connection, source: &str, target: &str, kind: &str) {
    conn.execute(
        "INSERT INTO edges (source, target, kind) VALUES (?, ?, ?)",
        params![source, target, kind],
    )
    .unwrap();
}

fn small_graph(conn: &Connection) {
    function(conn, "f:main", "main");
    function(conn, "f:serve", "serve");
    function(conn, "f:zeta", "zeta");
    function(conn, "f:alpha", "alpha");
    function(conn, "f:parse", "parse");
    function(conn, "f:unrelated", "unrelated");
    node(conn, "t:Config", "type");

    // callers of serve
    edge(conn, "f:zeta", "f:serve", "call");
    edge(conn, "f:main", "f:serve", "call");
    // callees of serve
    edge(conn, "f:serve", "f:parse", "call");
    edge(conn, "f:serve", "f:alpha", "call");
    edge(conn, "f:serve", "t:Config", "call");
    // among neighbors
    edge(conn, "f:main", "f:parse", "call");
    edge(conn, "f:zeta", "f:alpha", "ref");
    // outside the neighborhood
    edge(conn, "f:unrelated", "f:main", "call");
    // dangling
    edge(conn, "f:serve", "f:ghost", "call");
}

#[test]
fn callers_precede_callees_and_each_side_is_name_ordered() {
    let (_dir, db) = build_store(small_graph);
    let hood = resolve_neighborhood(&db, "f:serve").unwrap();
    assert_eq!(hood.target.name.as_deref(), Some("serve"));

    let tagged: Vec<(Direction, &str)> = hood
        .rows
        .iter()
        .map(|row| (row.direction, row.id.as_str()))
        .collect();
    assert_eq!(
        tagged,
        vec![
            (Direction::Caller, "f:main"),
            (Direction::Caller, "f:zeta"),
            (Direction::Callee, "f:alpha"),
            (Direction::Callee, "f:parse"),
        ]
    );
}

#[test]
fn graph_contains_induced_call_edges_only() {
    let (_dir, db) = build_store(small_graph);
    let graph = get_neighborhood(&db, "f:serve").unwrap();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["f:serve", "f:main", "f:zeta", "f:alpha", "f:parse"]);
    assert_eq!(graph.nodes[0].label, "serve");

    let pairs: HashSet<(&str, &str)> = graph
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert!(pairs.contains(&("f:main", "f:serve")));
    assert!(pairs.contains(&("f:serve", "f:parse")));
    assert!(pairs.contains(&("f:main", "f:parse")), "edge among neighbors");
    assert!(!pairs.contains(&("f:zeta", "f:alpha")), "non-call edge");
    assert!(!pairs.contains(&("f:unrelated", "f:main")), "outside node");
    assert!(!pairs.contains(&("f:serve", "f:ghost")), "dangling edge");
    assert_eq!(graph.edges.len(), 5);

    for (idx, edge) in graph.edges.iter().enumerate() {
        assert_eq!(edge.id, format!("edge-{idx}"));
    }
}

#[test]
fn induced_edges_carry_the_call_kind() {
    let (_dir, db) = build_store(small_graph);
    let ids: Vec<String> = ["f:main", "f:zeta", "f:alpha", "f:parse"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    let edges = db.call_edges_among(&ids).unwrap();
    let pairs: Vec<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    // The zeta -> alpha reference is not a call.
    assert_eq!(pairs, vec![("f:main", "f:parse")]);
    assert!(edges.iter().all(|e| e.kind == EdgeKind::Call));
}

#[test]
fn function_without_calls_is_a_single_node() {
    let (_dir, db) = build_store(small_graph);
    let graph = get_neighborhood(&db, "f:alpha").unwrap();
    assert_eq!(graph.nodes.len(), 2);

    let (_dir, db) = build_store(|conn| function(conn, "f:lonely", "lonely"));
    let graph = get_neighborhood(&db, "f:lonely").unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
}

#[test]
fn repeated_edges_do_not_duplicate_nodes() {
    let (_dir, db) = build_store(|conn| {
        function(conn, "f:a", "a");
        function(conn, "f:b", "b");
        edge(conn, "f:a", "f:b", "call");
        edge(conn, "f:a", "f:b", "call");
        edge(conn, "f:b", "f:a", "call");
    });
    let graph = get_neighborhood(&db, "f:a").unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 3);
}

#[test]
fn unknown_id_is_not_found() {
    let (_dir, db) = build_store(small_graph);
    let err = get_neighborhood(&db, "f:missing").unwrap_err();
    assert!(matches!(err, QueryError::NotFound { ref id } if id == "f:missing"));
}

#[test]
fn non_function_id_reports_its_kind() {
    let (_dir, db) = build_store(small_graph);
    let err = get_neighborhood(&db, "t:Config").unwrap_err();
    match err {
        QueryError::WrongKind { id, kind } => {
            assert_eq!(id, "t:Config");
            assert_eq!(kind, "type");
        }
        other => panic!("expected WrongKind, got {other:?}"),
    }
}

#[test]
fn large_fan_in_is_capped() {
    let (_dir, db) = build_store(|conn| {
        function(conn, "hub", "hub");
        for i in 0..1100 {
            let id = format!("c{i:04}");
            function(conn, &id, &id);
            edge(conn, &id, "hub", "call");
            if i > 0 {
                edge(conn, &format!("c{:04}", i - 1), &id, "call");
            }
        }
    });

    let graph = get_neighborhood(&db, "hub").unwrap();
    assert_eq!(graph.nodes.len(), MAX_GRAPH_NODES);
    assert_eq!(graph.nodes[0].id, "hub");
    assert_eq!(graph.nodes.last().unwrap().id, "c0998");

    let kept: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(
        graph
            .edges
            .iter()
            .all(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
    );
    // 999 callers into the hub plus the chain c0000 -> ... -> c0998.
    assert_eq!(graph.edges.len(), 999 + 998);
}

#[test]
fn store_is_shared_across_threads() {
    let (_dir, db) = build_store(small_graph);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| get_neighborhood(&db, "f:serve").unwrap()))
            .collect();
        for handle in handles {
            let graph = handle.join().unwrap();
            assert_eq!(graph.nodes.len(), 5);
        }
    });
}

#[test]
fn connections_refuse_writes() {
    let (_dir, db) = build_store(small_graph);
    let conn = db.read_conn().unwrap();
    assert!(conn.execute("DELETE FROM nodes", []).is_err());
    assert!(
        conn.execute("INSERT INTO edges (source, target, kind) VALUES ('a', 'b', 'call')", [])
            .is_err()
    );
}

#[test]
fn missing_store_is_not_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.sqlite");
    assert!(Db::open(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn foreign_database_fails_schema_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.sqlite");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE nodes (id TEXT);")
        .unwrap();
    let db = Db::open(&path).unwrap();
    let err = db.check_schema().unwrap_err().to_string();
    assert!(err.contains("edges"), "{err}");
    assert!(err.contains("sources"), "{err}");
}
