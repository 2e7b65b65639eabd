use broadcast_console_core::db::apply_migrations;
use rusqlite::Connection;

fn migrated() -> Connection {
    let conn = Connection::open_in_memory().expect("memory db");
    apply_migrations(&conn).expect("migrate");
    conn
}

fn object_exists(conn: &Connection, kind: &str, name: &str) -> bool {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = ?1 AND name = ?2;",
            [kind, name],
            |row| row.get(0),
        )
        .expect("master query");
    count == 1
}

#[test]
fn all_tables_exist() {
    let conn = migrated();
    for table in ["lists", "contacts", "templates", "broadcasts", "reports", "settings"] {
        assert!(object_exists(&conn, "table", table), "{} missing", table);
    }
}

#[test]
fn lookup_indexes_exist() {
    let conn = migrated();
    assert!(object_exists(&conn, "index", "idx_contacts_list_id"));
    assert!(object_exists(&conn, "index", "idx_broadcasts_sent_at"));
}

#[test]
fn contact_state_columns_must_agree() {
    let conn = migrated();
    let inconsistent = conn.execute(
        "INSERT INTO contacts (name, whatsapp_number, email, list_id, created_at, is_deleted, deleted_at) \
         VALUES ('a', '', '', 1, 0, 1, NULL);",
        [],
    );
    assert!(inconsistent.is_err());
}

#[test]
fn read_reports_need_read_at() {
    let conn = migrated();
    conn.execute(
        "INSERT INTO broadcasts (id, list_id, message, sent_at, total_recipients) VALUES (1, 1, 'm', 0, 1);",
        [],
    )
    .expect("broadcast");
    let missing = conn.execute(
        "INSERT INTO reports (broadcast_id, contact_id, status, read_at) VALUES (1, 1, 'read', NULL);",
        [],
    );
    assert!(missing.is_err());
    let early = conn.execute(
        "INSERT INTO reports (broadcast_id, contact_id, status, read_at) VALUES (1, 1, 'sent', 5);",
        [],
    );
    assert!(early.is_err());
}

#[test]
fn user_version_tracks_migrations() {
    let conn = migrated();
    apply_migrations(&conn).expect("migrate again");
    let version: i64 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .expect("version");
    assert_eq!(version, 2);
}
