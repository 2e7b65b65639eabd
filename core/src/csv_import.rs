use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lists::reconcile_contact_count;
use crate::models::{Contact, NewContact};
use crate::store::{ContactStore, ListStore};

/// One data row pulled out of an uploaded CSV file. Values are taken as-is;
/// nothing checks that the number or address is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedContact {
    pub name: String,
    pub whatsapp_number: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    name: usize,
    whatsapp: usize,
    email: usize,
}

impl ColumnLayout {
    fn from_header(header: &str) -> Result<Self, CoreError> {
        let headers: Vec<String> = header.split(',').map(|h| h.trim().to_lowercase()).collect();
        let name = first_column(&headers, |h| h.contains("name"));
        let whatsapp = first_column(&headers, |h| h.contains("whatsapp") || h.contains("phone"));
        let email = first_column(&headers, |h| h.contains("email"));
        match (name, whatsapp, email) {
            (Some(name), Some(whatsapp), Some(email)) => Ok(Self {
                name,
                whatsapp,
                email,
            }),
            _ => Err(CoreError::Format(
                "CSV must contain Name, WhatsApp/Phone, and Email columns".to_string(),
            )),
        }
    }

    fn min_columns(&self) -> usize {
        self.name.max(self.whatsapp).max(self.email) + 1
    }
}

fn first_column<F>(headers: &[String], pred: F) -> Option<usize>
where
    F: Fn(&str) -> bool,
{
    headers.iter().position(|h| pred(h.as_str()))
}

/// Parses uploaded CSV text into contact rows.
///
/// The first line is the header. Cells are split on bare commas and lose
/// every `"` character; quoted commas are not supported. Rows too short to
/// reach all three resolved columns are skipped.
pub fn parse_contacts(raw: &str) -> Result<Vec<ParsedContact>, CoreError> {
    let lines: Vec<&str> = raw.trim().split('\n').collect();
    if lines.len() < 2 {
        return Err(CoreError::Format(
            "CSV must have at least a header row and one data row".to_string(),
        ));
    }
    let layout = ColumnLayout::from_header(lines[0])?;
    let min_columns = layout.min_columns();

    let mut contacts = Vec::with_capacity(lines.len() - 1);
    for line in &lines[1..] {
        let values: Vec<String> = line
            .split(',')
            .map(|v| v.trim().replace('"', ""))
            .collect();
        if values.len() < min_columns {
            continue;
        }
        contacts.push(ParsedContact {
            name: values[layout.name].clone(),
            whatsapp_number: values[layout.whatsapp].clone(),
            email: values[layout.email].clone(),
        });
    }
    Ok(contacts)
}

/// Parses `raw` and adds every row to `list_id` in one batch, then refreshes
/// the list's contact count.
pub fn import_contacts<S>(store: &S, list_id: i64, raw: &str) -> Result<Vec<Contact>, CoreError>
where
    S: ListStore + ContactStore,
{
    let parsed = parse_contacts(raw)?;
    store.list_by_id(list_id)?;
    if parsed.is_empty() {
        return Err(CoreError::Validation("no valid contacts to upload".to_string()));
    }
    let drafts: Vec<NewContact> = parsed
        .into_iter()
        .map(|row| NewContact {
            name: row.name,
            whatsapp_number: row.whatsapp_number,
            email: row.email,
            list_id,
        })
        .collect();
    let created = store.insert_contacts(&drafts)?;
    reconcile_contact_count(store, list_id)?;
    tracing::info!(list_id, imported = created.len(), "imported contacts from csv");
    Ok(created)
}
