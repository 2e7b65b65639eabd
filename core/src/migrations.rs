pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS lists (
      id INTEGER PRIMARY KEY,
      name TEXT NOT NULL,
      contact_count INTEGER NOT NULL DEFAULT 0,
      created_at INTEGER NOT NULL,
      updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS contacts (
      id INTEGER PRIMARY KEY,
      name TEXT NOT NULL,
      whatsapp_number TEXT NOT NULL,
      email TEXT NOT NULL,
      list_id INTEGER NOT NULL,
      created_at INTEGER NOT NULL,
      is_deleted INTEGER NOT NULL DEFAULT 0,
      deleted_at INTEGER,
      CHECK ((is_deleted = 1) = (deleted_at IS NOT NULL))
    );

    CREATE INDEX IF NOT EXISTS idx_contacts_list_id ON contacts(list_id, is_deleted);

    CREATE TABLE IF NOT EXISTS templates (
      id INTEGER PRIMARY KEY,
      name TEXT NOT NULL,
      description TEXT NOT NULL DEFAULT '',
      content TEXT NOT NULL,
      category TEXT NOT NULL,
      created_at INTEGER NOT NULL,
      updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS broadcasts (
      id INTEGER PRIMARY KEY,
      list_id INTEGER NOT NULL,
      message TEXT NOT NULL,
      sent_at INTEGER NOT NULL,
      total_recipients INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_broadcasts_sent_at ON broadcasts(sent_at DESC, id DESC);

    CREATE TABLE IF NOT EXISTS reports (
      broadcast_id INTEGER NOT NULL,
      contact_id INTEGER NOT NULL,
      status TEXT NOT NULL,
      read_at INTEGER,
      PRIMARY KEY (broadcast_id, contact_id),
      FOREIGN KEY (broadcast_id) REFERENCES broadcasts(id) ON DELETE CASCADE,
      CHECK ((status = 'read') = (read_at IS NOT NULL))
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
      id INTEGER PRIMARY KEY,
      category TEXT NOT NULL UNIQUE,
      credentials_json TEXT NOT NULL,
      connection_status TEXT NOT NULL DEFAULT 'not_tested',
      last_tested INTEGER,
      created_at INTEGER NOT NULL,
      updated_at INTEGER NOT NULL
    );
    "#,
];
