//! End-to-end rebuild scenarios against a temporary store

mod common;

use std::fs;

use common::{empty_csv, sample_dir, write_data_dir};
use ether_dash::{ImportError, Relation, Store};
use rusqlite::Connection;

fn open(store: &Store) -> Connection {
    Connection::open(store.path()).expect("open store")
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count rows")
}

#[test]
fn test_rebuild_imports_every_relation() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("ethereum_tool.db"));

    let report = store.rebuild(data.path()).expect("rebuild");

    let relations: Vec<Relation> = report.files.iter().map(|f| f.relation).collect();
    assert_eq!(relations, Relation::IMPORT_ORDER.to_vec());
    assert_eq!(report.total_rows(), 10);

    let counts = store.row_counts().unwrap();
    assert_eq!(counts.len(), 9);
    assert_eq!(counts[0], (Relation::Users, 2));
    assert_eq!(counts[1], (Relation::Repositories, 1));
}

#[test]
fn test_stored_values_keep_types() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();
    let conn = open(&store);

    let (site_admin, name): (bool, String) = conn
        .query_row("SELECT site_admin, name FROM users WHERE id = 2", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert!(site_admin);
    assert_eq!(name, "dependabot");

    let (created, day, body): (String, String, String) = conn
        .query_row(
            "SELECT created_at, DATE(created_at), body FROM issues WHERE id = 100",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(created, "2020-01-01 10:00:00");
    assert_eq!(day, "2020-01-01");
    assert_eq!(body, "stack trace\nline two");

    let commit_id: Option<String> = conn
        .query_row("SELECT commit_id FROM comments WHERE id = 1000", [], |row| row.get(0))
        .unwrap();
    assert_eq!(commit_id.as_deref(), Some("abc123"));
}

#[test]
fn test_duplicate_users_keep_first_row() {
    let users = "id,type,site_admin,name\n1,User,False,first\n1,User,False,second\n";
    let repos = "id,name,full_name,owner_userfk,description,size,created_at,updated_at\n\
                 10,repo,owner/repo,1,,5,2021-01-01 00:00:00,2021-01-02 00:00:00\n";
    let data = sample_dir(&[(Relation::Users, users), (Relation::Repositories, repos)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    let report = store.rebuild(data.path()).unwrap();
    assert_eq!(report.files[0].rows_read, 2);
    assert_eq!(report.files[0].duplicates_dropped, 1);

    let conn = open(&store);
    assert_eq!(count(&conn, "users"), 1);
    let name: String = conn
        .query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "first");

    let owner: Option<i64> = conn
        .query_row("SELECT owner_userfk FROM repositories WHERE id = 10", [], |row| row.get(0))
        .unwrap();
    assert_eq!(owner, Some(1));
}

#[test]
fn test_duplicate_with_bad_cells_is_discarded_silently() {
    let users = "id,type,site_admin,name\n1,User,False,first\n1.0,User,notabool,second\n";
    let data = sample_dir(&[(Relation::Users, users)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    store.rebuild(data.path()).unwrap();
    assert_eq!(count(&open(&store), "users"), 1);
}

#[test]
fn test_missing_commits_file_aborts_after_earlier_files() {
    let data = sample_dir(&[]);
    fs::remove_file(data.path().join("commits.csv")).unwrap();
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    let err = store.rebuild(data.path()).unwrap_err();
    assert!(matches!(err, ImportError::MissingFile(ref path) if path.ends_with("commits.csv")));

    let conn = open(&store);
    assert_eq!(count(&conn, "users"), 2);
    assert_eq!(count(&conn, "repositories"), 1);
    assert_eq!(count(&conn, "issues"), 1);
    assert_eq!(count(&conn, "comments"), 1);
    assert_eq!(count(&conn, "commits"), 0);
    assert_eq!(count(&conn, "events"), 0);
}

#[test]
fn test_malformed_created_at_becomes_null() {
    let issues = "id,number,user_fk,repo_fk,state,locked,created_at,updated_at,author_association,title,comments,body\n\
                  100,1,1,10,open,False,not-a-date,2020-01-02 11:00:00,MEMBER,Crash,0,body\n";
    let data = sample_dir(&[(Relation::Issues, issues)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let row: (Option<String>, Option<String>, String, i64) = open(&store)
        .query_row(
            "SELECT created_at, updated_at, title, number FROM issues WHERE id = 100",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(row.0, None);
    assert_eq!(row.1.as_deref(), Some("2020-01-02 11:00:00"));
    assert_eq!(row.2, "Crash");
    assert_eq!(row.3, 1);
}

#[test]
fn test_updated_at_is_parsed_from_its_own_column() {
    let repos = "id,name,full_name,owner_userfk,description,size,created_at,updated_at\n\
                 10,repo,owner/repo,1,,5,2021-01-01 00:00:00,garbage\n\
                 11,repo2,owner/repo2,1,,5,garbage,2021-02-02 00:00:00\n";
    let data = sample_dir(&[(Relation::Repositories, repos)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let conn = open(&store);
    let mut stmt = conn
        .prepare("SELECT created_at, updated_at FROM repositories ORDER BY id")
        .unwrap();
    let rows: Vec<(Option<String>, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows[0], (Some("2021-01-01 00:00:00".to_string()), None));
    assert_eq!(rows[1], (None, Some("2021-02-02 00:00:00".to_string())));
}

#[test]
fn test_missing_foreign_keys_stay_null() {
    let commits = "id,user_fk,repo_fk,created_at\nabc123,,10.0,2020-01-03 09:00:00\n";
    let data = sample_dir(&[(Relation::Commits, commits)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let (user_fk, repo_fk): (Option<i64>, Option<i64>) = open(&store)
        .query_row("SELECT user_fk, repo_fk FROM commits", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(user_fk, None);
    assert_eq!(repo_fk, Some(10));
}

#[test]
fn test_missing_primary_key_rolls_back_file() {
    let events = "id,user_fk,event_type,commit_fk,created_at,issue_fk,repo_fk,total_count\n\
                  5000,1,closed,,2020-01-03 09:30:00,100,10,1\n\
                  ,1,closed,,2020-01-03 09:31:00,100,10,1\n";
    let data = sample_dir(&[(Relation::Events, events)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    let err = store.rebuild(data.path()).unwrap_err();
    assert!(matches!(err, ImportError::MissingPrimaryKey { line: 3, .. }));

    let conn = open(&store);
    assert_eq!(count(&conn, "commits"), 1);
    assert_eq!(count(&conn, "events"), 0);
}

#[test]
fn test_unknown_columns_are_ignored_and_absent_ones_null() {
    let users = "id,name,login,followers\n1,alice,alice,12\n";
    let data = sample_dir(&[(Relation::Users, users)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let (user_type, site_admin): (Option<String>, Option<bool>) = open(&store)
        .query_row("SELECT type, site_admin FROM users WHERE id = 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(user_type, None);
    assert_eq!(site_admin, None);
}

#[test]
fn test_rebuild_is_byte_identical() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    store.rebuild(data.path()).unwrap();
    let first = fs::read(store.path()).unwrap();
    store.rebuild(data.path()).unwrap();
    let second = fs::read(store.path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_rebuild_replaces_previous_contents() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    write_data_dir(data.path(), &[(Relation::Users, "id,name\n3,carol\n")]);
    store.rebuild(data.path()).unwrap();

    let conn = open(&store);
    assert_eq!(count(&conn, "users"), 1);
    let name: String = conn
        .query_row("SELECT name FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "carol");
}

#[test]
fn test_ensure_leaves_existing_store() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("nested").join("store.db"));

    let report = store.ensure(data.path()).unwrap();
    assert!(report.is_some());

    write_data_dir(data.path(), &[(Relation::Users, "id,name\n3,carol\n")]);
    assert!(store.ensure(data.path()).unwrap().is_none());
    assert_eq!(count(&open(&store), "users"), 2);
}

#[test]
fn test_repositories_ordered_by_name() {
    let repos = "id,name,full_name,owner_userfk,description,size,created_at,updated_at\n\
                 10,zeta,o/zeta,1,,1,,\n\
                 11,alpha,o/alpha,1,,1,,\n";
    let data = sample_dir(&[(Relation::Repositories, repos)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let names: Vec<Option<String>> = store
        .repositories()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec![Some("alpha".to_string()), Some("zeta".to_string())]);
}

#[test]
fn test_foreign_key_check_reports_dangling_rows() {
    let commits = "id,user_fk,repo_fk,created_at\nabc123,99,10,2020-01-03 09:00:00\n";
    let data = sample_dir(&[(Relation::Commits, commits)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).unwrap();

    let violations = store.foreign_key_violations().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].table, "commits");
    assert_eq!(violations[0].parent, "users");
}

#[test]
fn test_references_to_later_files_load_by_default() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));

    store.rebuild(data.path()).expect("rebuild");

    let conn = open(&store);
    let file_fk: String = conn
        .query_row("SELECT file_fk FROM file_commits WHERE id = 7", [], |row| row.get(0))
        .unwrap();
    assert_eq!(file_fk, "f1");
    assert!(store.foreign_key_violations().unwrap().is_empty());
}

#[test]
fn test_enforced_foreign_keys_accept_consistent_data() {
    let data = sample_dir(&[]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db")).with_foreign_keys(true);

    let report = store.rebuild(data.path()).expect("rebuild");
    assert_eq!(report.total_rows(), 10);
}

#[test]
fn test_enforced_foreign_keys_reject_dangling_rows() {
    let data = sample_dir(&[]);
    for relation in Relation::IMPORT_ORDER {
        if relation != Relation::Users && relation != Relation::Repositories {
            fs::write(data.path().join(relation.file_name()), empty_csv(relation)).unwrap();
        }
    }
    let repos = "id,name,full_name,owner_userfk,description,size,created_at,updated_at\n\
                 10,repo,o/repo,42,,1,,\n";
    fs::write(data.path().join("repositories.csv"), repos).unwrap();

    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db")).with_foreign_keys(true);

    let err = store.rebuild(data.path()).unwrap_err();
    assert!(matches!(
        err,
        ImportError::DanglingReferences { count: 1, ref table, ref parent }
            if table == "repositories" && parent == "users"
    ));
    assert_eq!(count(&open(&store), "repositories"), 1);
}

#[test]
fn test_unconvertible_cells_are_stored_as_null() {
    let issues = "id,number,user_fk,repo_fk,state,locked,created_at,updated_at,author_association,title,comments,body\n\
                  100,1,1,10,open,False,2020-01-01 10:00:00,,MEMBER,Crash,n/a,body\n";
    let data = sample_dir(&[(Relation::Issues, issues)]);
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("store.db"));
    store.rebuild(data.path()).expect("rebuild");

    let (comments, title): (Option<i64>, String) = open(&store)
        .query_row("SELECT comments, title FROM issues WHERE id = 100", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(comments, None);
    assert_eq!(title, "Crash");
}

#[test]
fn test_queries_require_existing_store() {
    let out = tempfile::tempdir().unwrap();
    let store = Store::new(out.path().join("absent.db"));
    assert!(matches!(store.row_counts(), Err(ImportError::MissingFile(_))));
}
