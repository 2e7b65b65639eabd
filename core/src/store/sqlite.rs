use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{in_transaction, open_console_db, open_in_memory};
use crate::error::CoreError;
use crate::models::{
    now_millis, Broadcast, ConnectionStatus, Contact, ContactList, ContactState, NewBroadcast,
    NewContact, NewSetting, Report, Setting, Template, TemplateDraft,
};

use super::{BroadcastStore, ContactStore, ListStore, ReportStore, SettingStore, TemplateStore};

const CONTACT_COLUMNS: &str =
    "id, name, whatsapp_number, email, list_id, created_at, is_deleted, deleted_at";
const TEMPLATE_COLUMNS: &str = "id, name, description, content, category, created_at, updated_at";
const SETTING_COLUMNS: &str =
    "id, category, credentials_json, connection_status, last_tested, created_at, updated_at";

/// SQLite-backed store. The connection sits behind a mutex so one store can
/// be shared between threads; every multi-row write runs in one transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self, CoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let db = open_console_db(path)?;
        Self::new(db.conn)
    }

    pub fn in_memory() -> Result<Self, CoreError> {
        Self::new(open_in_memory()?)
    }

    /// Runs `f` against the raw connection, e.g. for seeding.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Connection) -> Result<T, CoreError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::InvalidState("store connection poisoned".to_string()))
    }
}

// ===== Row mapping =====

struct ContactRow {
    id: i64,
    name: String,
    whatsapp_number: String,
    email: String,
    list_id: i64,
    created_at: i64,
    is_deleted: bool,
    deleted_at: Option<i64>,
}

impl ContactRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            whatsapp_number: row.get(2)?,
            email: row.get(3)?,
            list_id: row.get(4)?,
            created_at: row.get(5)?,
            is_deleted: row.get::<_, i64>(6)? != 0,
            deleted_at: row.get(7)?,
        })
    }

    fn into_contact(self) -> Result<Contact, CoreError> {
        Ok(Contact {
            id: self.id,
            name: self.name,
            whatsapp_number: self.whatsapp_number,
            email: self.email,
            list_id: self.list_id,
            created_at: self.created_at,
            state: ContactState::from_columns(self.is_deleted, self.deleted_at)?,
        })
    }
}

struct TemplateRow {
    id: i64,
    name: String,
    description: String,
    content: String,
    category: String,
    created_at: i64,
    updated_at: i64,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_template(self) -> Result<Template, CoreError> {
        Ok(Template {
            id: self.id,
            name: self.name,
            description: self.description,
            content: self.content,
            category: self.category.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

struct SettingRow {
    id: i64,
    category: String,
    credentials_json: String,
    connection_status: String,
    last_tested: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl SettingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category: row.get(1)?,
            credentials_json: row.get(2)?,
            connection_status: row.get(3)?,
            last_tested: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_setting(self) -> Result<Setting, CoreError> {
        let credentials: BTreeMap<String, String> = serde_json::from_str(&self.credentials_json)?;
        Ok(Setting {
            id: self.id,
            category: self.category.parse()?,
            credentials,
            connection_status: self.connection_status.parse()?,
            last_tested: self.last_tested,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<ContactList> {
    Ok(ContactList {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_count: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn broadcast_from_row(row: &Row<'_>) -> rusqlite::Result<Broadcast> {
    Ok(Broadcast {
        id: row.get(0)?,
        list_id: row.get(1)?,
        message: row.get(2)?,
        sent_at: row.get(3)?,
        total_recipients: row.get(4)?,
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, i64, String, Option<i64>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_report(raw: (i64, i64, String, Option<i64>)) -> Result<Report, CoreError> {
    let (broadcast_id, contact_id, status, read_at) = raw;
    Ok(Report {
        broadcast_id,
        contact_id,
        status: status.parse()?,
        read_at,
    })
}

// ===== Single-connection helpers =====

fn fetch_list(conn: &Connection, id: i64) -> Result<ContactList, CoreError> {
    conn.query_row(
        "SELECT id, name, contact_count, created_at, updated_at FROM lists WHERE id = ?1;",
        params![id],
        list_from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("list", id))
}

fn fetch_contact(conn: &Connection, id: i64) -> Result<Contact, CoreError> {
    conn.query_row(
        &format!("SELECT {} FROM contacts WHERE id = ?1;", CONTACT_COLUMNS),
        params![id],
        ContactRow::from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("contact", id))?
    .into_contact()
}

fn fetch_template(conn: &Connection, id: i64) -> Result<Template, CoreError> {
    conn.query_row(
        &format!("SELECT {} FROM templates WHERE id = ?1;", TEMPLATE_COLUMNS),
        params![id],
        TemplateRow::from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("template", id))?
    .into_template()
}

fn fetch_broadcast(conn: &Connection, id: i64) -> Result<Broadcast, CoreError> {
    conn.query_row(
        "SELECT id, list_id, message, sent_at, total_recipients FROM broadcasts WHERE id = ?1;",
        params![id],
        broadcast_from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("broadcast", id))
}

fn fetch_setting(conn: &Connection, id: i64) -> Result<Setting, CoreError> {
    conn.query_row(
        &format!("SELECT {} FROM settings WHERE id = ?1;", SETTING_COLUMNS),
        params![id],
        SettingRow::from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("setting", id))?
    .into_setting()
}

fn insert_contact_row(conn: &Connection, contact: &NewContact, now: i64) -> Result<Contact, CoreError> {
    conn.execute(
        "INSERT INTO contacts (name, whatsapp_number, email, list_id, created_at, is_deleted, deleted_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL);",
        params![contact.name, contact.whatsapp_number, contact.email, contact.list_id, now],
    )?;
    Ok(Contact {
        id: conn.last_insert_rowid(),
        name: contact.name.clone(),
        whatsapp_number: contact.whatsapp_number.clone(),
        email: contact.email.clone(),
        list_id: contact.list_id,
        created_at: now,
        state: ContactState::Active,
    })
}

// ===== Lists =====

impl ListStore for SqliteStore {
    fn all_lists(&self) -> Result<Vec<ContactList>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, contact_count, created_at, updated_at FROM lists ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([], list_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_by_id(&self, id: i64) -> Result<ContactList, CoreError> {
        let conn = self.lock()?;
        fetch_list(&conn, id)
    }

    fn insert_list(&self, name: &str) -> Result<ContactList, CoreError> {
        let conn = self.lock()?;
        let now = now_millis();
        conn.execute(
            "INSERT INTO lists (name, contact_count, created_at, updated_at) VALUES (?1, 0, ?2, ?2);",
            params![name, now],
        )?;
        Ok(ContactList {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            contact_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_list(&self, id: i64, list: &ContactList) -> Result<ContactList, CoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE lists SET name = ?1, contact_count = ?2, updated_at = ?3 WHERE id = ?4;",
            params![list.name, list.contact_count, now_millis(), id],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("list", id));
        }
        fetch_list(&conn, id)
    }

    fn remove_list(&self, id: i64) -> Result<ContactList, CoreError> {
        let conn = self.lock()?;
        let existing = fetch_list(&conn, id)?;
        conn.execute("DELETE FROM lists WHERE id = ?1;", params![id])?;
        Ok(existing)
    }

    fn remove_list_cascade(&self, id: i64) -> Result<(ContactList, usize), CoreError> {
        let conn = self.lock()?;
        in_transaction(&conn, |conn| {
            let existing = fetch_list(conn, id)?;
            let removed = conn.execute("DELETE FROM contacts WHERE list_id = ?1;", params![id])?;
            conn.execute("DELETE FROM lists WHERE id = ?1;", params![id])?;
            Ok((existing, removed))
        })
    }
}

// ===== Contacts =====

impl ContactStore for SqliteStore {
    fn all_contacts(&self) -> Result<Vec<Contact>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contacts ORDER BY id ASC;",
            CONTACT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], ContactRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ContactRow::into_contact).collect()
    }

    fn contact_by_id(&self, id: i64) -> Result<Contact, CoreError> {
        let conn = self.lock()?;
        fetch_contact(&conn, id)
    }

    fn contacts_for_list(&self, list_id: i64) -> Result<Vec<Contact>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contacts WHERE list_id = ?1 ORDER BY id ASC;",
            CONTACT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![list_id], ContactRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ContactRow::into_contact).collect()
    }

    fn insert_contact(&self, contact: &NewContact) -> Result<Contact, CoreError> {
        let conn = self.lock()?;
        insert_contact_row(&conn, contact, now_millis())
    }

    fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<Contact>, CoreError> {
        let conn = self.lock()?;
        let now = now_millis();
        in_transaction(&conn, |conn| {
            contacts
                .iter()
                .map(|contact| insert_contact_row(conn, contact, now))
                .collect()
        })
    }

    fn update_contact(&self, id: i64, contact: &Contact) -> Result<Contact, CoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE contacts \
             SET name = ?1, whatsapp_number = ?2, email = ?3, list_id = ?4, is_deleted = ?5, deleted_at = ?6 \
             WHERE id = ?7;",
            params![
                contact.name,
                contact.whatsapp_number,
                contact.email,
                contact.list_id,
                contact.is_deleted() as i64,
                contact.deleted_at(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("contact", id));
        }
        fetch_contact(&conn, id)
    }

    fn remove_contact(&self, id: i64) -> Result<Contact, CoreError> {
        let conn = self.lock()?;
        let existing = fetch_contact(&conn, id)?;
        conn.execute("DELETE FROM contacts WHERE id = ?1;", params![id])?;
        Ok(existing)
    }
}

// ===== Templates =====

impl TemplateStore for SqliteStore {
    fn all_templates(&self) -> Result<Vec<Template>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM templates ORDER BY id ASC;",
            TEMPLATE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TemplateRow::into_template).collect()
    }

    fn template_by_id(&self, id: i64) -> Result<Template, CoreError> {
        let conn = self.lock()?;
        fetch_template(&conn, id)
    }

    fn insert_template(&self, draft: &TemplateDraft) -> Result<Template, CoreError> {
        let conn = self.lock()?;
        let now = now_millis();
        conn.execute(
            "INSERT INTO templates (name, description, content, category, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![draft.name, draft.description, draft.content, draft.category.as_str(), now],
        )?;
        Ok(Template {
            id: conn.last_insert_rowid(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            content: draft.content.clone(),
            category: draft.category,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_template(&self, id: i64, draft: &TemplateDraft) -> Result<Template, CoreError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE templates \
             SET name = ?1, description = ?2, content = ?3, category = ?4, updated_at = ?5 \
             WHERE id = ?6;",
            params![
                draft.name,
                draft.description,
                draft.content,
                draft.category.as_str(),
                now_millis(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("template", id));
        }
        fetch_template(&conn, id)
    }

    fn remove_template(&self, id: i64) -> Result<Template, CoreError> {
        let conn = self.lock()?;
        let existing = fetch_template(&conn, id)?;
        conn.execute("DELETE FROM templates WHERE id = ?1;", params![id])?;
        Ok(existing)
    }
}

// ===== Broadcasts & reports =====

impl BroadcastStore for SqliteStore {
    fn all_broadcasts(&self) -> Result<Vec<Broadcast>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, list_id, message, sent_at, total_recipients FROM broadcasts ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([], broadcast_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn broadcast_by_id(&self, id: i64) -> Result<Broadcast, CoreError> {
        let conn = self.lock()?;
        fetch_broadcast(&conn, id)
    }

    fn insert_broadcast(&self, broadcast: &NewBroadcast) -> Result<Broadcast, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO broadcasts (list_id, message, sent_at, total_recipients) VALUES (?1, ?2, ?3, ?4);",
            params![
                broadcast.list_id,
                broadcast.message,
                broadcast.sent_at,
                broadcast.total_recipients
            ],
        )?;
        Ok(Broadcast {
            id: conn.last_insert_rowid(),
            list_id: broadcast.list_id,
            message: broadcast.message.clone(),
            sent_at: broadcast.sent_at,
            total_recipients: broadcast.total_recipients,
        })
    }

    fn remove_broadcast(&self, id: i64) -> Result<Broadcast, CoreError> {
        let conn = self.lock()?;
        let existing = fetch_broadcast(&conn, id)?;
        in_transaction(&conn, |conn| {
            conn.execute("DELETE FROM reports WHERE broadcast_id = ?1;", params![id])?;
            conn.execute("DELETE FROM broadcasts WHERE id = ?1;", params![id])?;
            Ok(())
        })?;
        Ok(existing)
    }
}

impl ReportStore for SqliteStore {
    fn all_reports(&self) -> Result<Vec<Report>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT broadcast_id, contact_id, status, read_at FROM reports ORDER BY rowid ASC;",
        )?;
        let rows = stmt
            .query_map([], report_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_report).collect()
    }

    fn reports_for_broadcast(&self, broadcast_id: i64) -> Result<Vec<Report>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT broadcast_id, contact_id, status, read_at FROM reports \
             WHERE broadcast_id = ?1 ORDER BY rowid ASC;",
        )?;
        let rows = stmt
            .query_map(params![broadcast_id], report_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_report).collect()
    }

    fn insert_reports(&self, reports: &[Report]) -> Result<Vec<Report>, CoreError> {
        let conn = self.lock()?;
        in_transaction(&conn, |conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO reports (broadcast_id, contact_id, status, read_at) VALUES (?1, ?2, ?3, ?4);",
            )?;
            for report in reports {
                stmt.execute(params![
                    report.broadcast_id,
                    report.contact_id,
                    report.status.as_str(),
                    report.read_at
                ])?;
            }
            Ok(())
        })?;
        Ok(reports.to_vec())
    }
}

// ===== Settings =====

impl SettingStore for SqliteStore {
    fn all_settings(&self) -> Result<Vec<Setting>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM settings ORDER BY id ASC;",
            SETTING_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], SettingRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(SettingRow::into_setting).collect()
    }

    fn setting_by_id(&self, id: i64) -> Result<Setting, CoreError> {
        let conn = self.lock()?;
        fetch_setting(&conn, id)
    }

    fn insert_setting(&self, setting: &NewSetting) -> Result<Setting, CoreError> {
        let conn = self.lock()?;
        let now = now_millis();
        let credentials_json = serde_json::to_string(&setting.credentials)?;
        conn.execute(
            "INSERT INTO settings (category, credentials_json, connection_status, last_tested, created_at, updated_at) \
             VALUES (?1, ?2, ?3, NULL, ?4, ?4);",
            params![
                setting.category.as_str(),
                credentials_json,
                ConnectionStatus::NotTested.as_str(),
                now
            ],
        )?;
        Ok(Setting {
            id: conn.last_insert_rowid(),
            category: setting.category,
            credentials: setting.credentials.clone(),
            connection_status: ConnectionStatus::NotTested,
            last_tested: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_setting(&self, id: i64, setting: &Setting) -> Result<Setting, CoreError> {
        let conn = self.lock()?;
        let credentials_json = serde_json::to_string(&setting.credentials)?;
        let changed = conn.execute(
            "UPDATE settings \
             SET credentials_json = ?1, connection_status = ?2, last_tested = ?3, updated_at = ?4 \
             WHERE id = ?5;",
            params![
                credentials_json,
                setting.connection_status.as_str(),
                setting.last_tested,
                now_millis(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("setting", id));
        }
        fetch_setting(&conn, id)
    }

    fn remove_setting(&self, id: i64) -> Result<Setting, CoreError> {
        let conn = self.lock()?;
        let existing = fetch_setting(&conn, id)?;
        conn.execute("DELETE FROM settings WHERE id = ?1;", params![id])?;
        Ok(existing)
    }
}
