use rusqlite::{params, Connection};

use crate::db::in_transaction;
use crate::error::CoreError;
use crate::models::TemplateCategory;

const DEMO_LISTS: &[&str] = &["Customers", "Newsletter Subscribers", "Event Attendees"];

const DEMO_TEMPLATES: &[(&str, &str, &str, TemplateCategory)] = &[
    (
        "Welcome Message",
        "Greets new contacts",
        "Hi {{Name}}! *Welcome* aboard. We'll keep you posted at {{Email}}.",
        TemplateCategory::Welcome,
    ),
    (
        "Event Reminder",
        "Sent the day before an event",
        "Hello {{Name}}, a reminder that our event starts _tomorrow_ at 10am.",
        TemplateCategory::Reminder,
    ),
    (
        "Spring Sale",
        "Seasonal promotion",
        "{{Name}}, our spring sale is live: ~20%~ *30% off* everything!",
        TemplateCategory::Marketing,
    ),
];

/// Loads demo lists, contacts, templates and a WhatsApp setting.
/// `contacts_per_list` contacts are created in every list. Rows are
/// inserted with fixed ids, so running it twice changes nothing.
pub fn seed_demo(conn: &Connection, contacts_per_list: i64) -> Result<(), CoreError> {
    in_transaction(conn, |conn| {
        let base_ts = 1_700_000_000_000i64;

        let mut list_stmt = conn.prepare(
            "INSERT OR IGNORE INTO lists (id, name, contact_count, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4);",
        )?;
        let mut contact_stmt = conn.prepare(
            "INSERT OR IGNORE INTO contacts \
             (id, name, whatsapp_number, email, list_id, created_at, is_deleted, deleted_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL);",
        )?;

        let mut contact_id = 0i64;
        for (idx, name) in DEMO_LISTS.iter().enumerate() {
            let list_id = idx as i64 + 1;
            let created_at = base_ts + list_id * 60_000;
            list_stmt.execute(params![list_id, name, contacts_per_list, created_at])?;
            for n in 0..contacts_per_list {
                contact_id += 1;
                contact_stmt.execute(params![
                    contact_id,
                    format!("Demo Contact {}", contact_id),
                    format!("+1555{:07}", contact_id),
                    format!("contact{}@example.com", contact_id),
                    list_id,
                    created_at + n * 1_000,
                ])?;
            }
        }

        let mut template_stmt = conn.prepare(
            "INSERT OR IGNORE INTO templates (id, name, description, content, category, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
        )?;
        for (idx, (name, description, content, category)) in DEMO_TEMPLATES.iter().enumerate() {
            let id = idx as i64 + 1;
            template_stmt.execute(params![
                id,
                name,
                description,
                content,
                category.as_str(),
                base_ts + id * 60_000
            ])?;
        }

        conn.execute(
            "INSERT OR IGNORE INTO settings \
             (id, category, credentials_json, connection_status, last_tested, created_at, updated_at) \
             VALUES (1, 'whatsapp', ?1, 'not_tested', NULL, ?2, ?2);",
            params![
                r#"{"apiUrl":"https://graph.facebook.com/v17.0","apiKey":"","phoneNumberId":""}"#,
                base_ts
            ],
        )?;

        Ok(())
    })
}
