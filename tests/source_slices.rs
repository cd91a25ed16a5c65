use cpgraph::db::{Db, schema};
use cpgraph::model::NodeMeta;
use cpgraph::source::get_source;
use cpgraph::{QueryError, UnavailableSource};
use rusqlite::{Connection, params};
use tempfile::TempDir;

fn build_store(populate: impl FnOnce(&Connection)) -> (TempDir, Db) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cpg.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        schema::create(&conn).unwrap();
        populate(&conn);
    }
    let db = Db::open(&path).unwrap();
    (dir, db)
}

fn twenty_lines() -> String {
    (1..=20)
        .map(|n| format!("// line {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn store(conn: &Connection) {
    conn.execute(
        "INSERT INTO sources (file, content) VALUES ('pkg/server.go', ?)",
        params![twenty_lines()],
    )
    .unwrap();
    let rows: &[(&str, Option<&str>, Option<i64>, Option<i64>)] = &[
        ("f:range", Some("pkg/server.go"), Some(10), Some(12)),
        ("f:single", Some("pkg/server.go"), Some(5), None),
        ("f:whole", Some("pkg/server.go"), None, None),
        ("f:past_end", Some("pkg/server.go"), Some(40), Some(42)),
        ("f:no_file", None, Some(3), Some(4)),
        ("f:empty_file", Some(""), Some(3), Some(4)),
        ("f:lost_file", Some("pkg/deleted.go"), Some(1), Some(2)),
    ];
    for (id, file, line, end_line) in rows {
        conn.execute(
            "INSERT INTO nodes (id, kind, name, package, file, line, end_line)
             VALUES (?, 'function', ?, 'server', ?, ?, ?)",
            params![id, id.trim_start_matches("f:"), file, line, end_line],
        )
        .unwrap();
    }
    conn.execute(
        "INSERT INTO nodes (id, kind, name, package, type_info)
         VALUES ('ext::fmt.Println', 'function', 'Println', 'fmt', 'func(a ...any) (n int, err error)')",
        [],
    )
    .unwrap();
}

#[test]
fn returns_inclusive_line_range() {
    let (_dir, db) = build_store(store);
    let slice = get_source(&db, "f:range").unwrap();
    assert_eq!(slice.file_name, "pkg/server.go");
    assert_eq!(slice.start_line, 10);
    assert_eq!(slice.end_line, 12);
    assert_eq!(slice.code, "// line 10\n// line 11\n// line 12");
    assert_eq!(slice.code.lines().count(), 3);
}

#[test]
fn missing_end_line_returns_one_line() {
    let (_dir, db) = build_store(store);
    let slice = get_source(&db, "f:single").unwrap();
    assert_eq!((slice.start_line, slice.end_line), (5, 5));
    assert_eq!(slice.code, "// line 5");
}

#[test]
fn missing_both_lines_returns_whole_file() {
    let (_dir, db) = build_store(store);
    let slice = get_source(&db, "f:whole").unwrap();
    assert_eq!((slice.start_line, slice.end_line), (1, 20));
    assert_eq!(slice.code, twenty_lines());
}

#[test]
fn line_past_end_of_file_is_an_empty_slice() {
    let (_dir, db) = build_store(store);
    let slice = get_source(&db, "f:past_end").unwrap();
    assert_eq!(slice.start_line, 40);
    assert_eq!(slice.code, "");
}

#[test]
fn external_nodes_never_return_code() {
    let (_dir, db) = build_store(store);
    let err = get_source(&db, "ext::fmt.Println").unwrap_err();
    match err {
        QueryError::Unavailable(UnavailableSource::External(meta)) => {
            assert_eq!(meta.name.as_deref(), Some("Println"));
            assert_eq!(meta.package.as_deref(), Some("fmt"));
            assert!(meta.type_info.unwrap().starts_with("func("));
        }
        other => panic!("expected external, got {other:?}"),
    }

    let err = get_source(&db, "ext::unknown.Func").unwrap_err();
    assert!(matches!(
        err,
        QueryError::Unavailable(UnavailableSource::External(ref meta)) if *meta == NodeMeta::default()
    ));
}

#[test]
fn node_without_file_reports_display_metadata() {
    let (_dir, db) = build_store(store);
    for id in ["f:no_file", "f:empty_file"] {
        let err = get_source(&db, id).unwrap_err();
        match err {
            QueryError::Unavailable(UnavailableSource::NoFileMetadata { name, package }) => {
                assert_eq!(name.as_deref(), Some(id.trim_start_matches("f:")));
                assert_eq!(package.as_deref(), Some("server"));
            }
            other => panic!("expected no-file, got {other:?}"),
        }
    }
}

#[test]
fn missing_source_row_names_the_file() {
    let (_dir, db) = build_store(store);
    let err = get_source(&db, "f:lost_file").unwrap_err();
    assert!(matches!(
        err,
        QueryError::Unavailable(UnavailableSource::FileMissing { ref file }) if file == "pkg/deleted.go"
    ));
    assert_eq!(err.code(), "not_found");
}

#[test]
fn unknown_node_is_not_found() {
    let (_dir, db) = build_store(store);
    let err = get_source(&db, "f:nope").unwrap_err();
    assert!(matches!(err, QueryError::NotFound { .. }));
}
