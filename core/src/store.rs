//! Persistence contract for the console.
//!
//! Every component depends on these per-entity traits rather than on a
//! concrete database. All reads hand back owned records, so mutating a
//! returned value never touches stored state; `update_*` always keeps the
//! id it was called with, whatever the record argument carries.

use crate::error::CoreError;
use crate::models::{
    Broadcast, Contact, ContactList, NewBroadcast, NewContact, NewSetting, Report, Setting,
    Template, TemplateDraft,
};

#[path = "store/sqlite.rs"]
mod sqlite;

pub use sqlite::SqliteStore;

pub trait ListStore {
    fn all_lists(&self) -> Result<Vec<ContactList>, CoreError>;
    fn list_by_id(&self, id: i64) -> Result<ContactList, CoreError>;
    fn insert_list(&self, name: &str) -> Result<ContactList, CoreError>;
    /// Replaces name and contact count and bumps `updated_at`.
    fn update_list(&self, id: i64, list: &ContactList) -> Result<ContactList, CoreError>;
    fn remove_list(&self, id: i64) -> Result<ContactList, CoreError>;
    /// Removes the list and every contact pointing at it, in any state, as
    /// one unit. Returns the list and how many contacts went with it.
    fn remove_list_cascade(&self, id: i64) -> Result<(ContactList, usize), CoreError>;
}

pub trait ContactStore {
    /// Every contact, soft-deleted ones included, ordered by id.
    fn all_contacts(&self) -> Result<Vec<Contact>, CoreError>;
    fn contact_by_id(&self, id: i64) -> Result<Contact, CoreError>;
    /// Every contact of one list, soft-deleted ones included.
    fn contacts_for_list(&self, list_id: i64) -> Result<Vec<Contact>, CoreError>;
    fn insert_contact(&self, contact: &NewContact) -> Result<Contact, CoreError>;
    /// Inserts all contacts or none of them.
    fn insert_contacts(&self, contacts: &[NewContact]) -> Result<Vec<Contact>, CoreError>;
    fn update_contact(&self, id: i64, contact: &Contact) -> Result<Contact, CoreError>;
    fn remove_contact(&self, id: i64) -> Result<Contact, CoreError>;
}

pub trait TemplateStore {
    fn all_templates(&self) -> Result<Vec<Template>, CoreError>;
    fn template_by_id(&self, id: i64) -> Result<Template, CoreError>;
    fn insert_template(&self, draft: &TemplateDraft) -> Result<Template, CoreError>;
    fn update_template(&self, id: i64, draft: &TemplateDraft) -> Result<Template, CoreError>;
    fn remove_template(&self, id: i64) -> Result<Template, CoreError>;
}

pub trait BroadcastStore {
    fn all_broadcasts(&self) -> Result<Vec<Broadcast>, CoreError>;
    fn broadcast_by_id(&self, id: i64) -> Result<Broadcast, CoreError>;
    fn insert_broadcast(&self, broadcast: &NewBroadcast) -> Result<Broadcast, CoreError>;
    /// Removes the broadcast together with any reports stored for it.
    fn remove_broadcast(&self, id: i64) -> Result<Broadcast, CoreError>;
}

/// Reports are write-once: there is no update or single-row delete.
pub trait ReportStore {
    fn all_reports(&self) -> Result<Vec<Report>, CoreError>;
    fn reports_for_broadcast(&self, broadcast_id: i64) -> Result<Vec<Report>, CoreError>;
    /// Inserts the whole batch or nothing.
    fn insert_reports(&self, reports: &[Report]) -> Result<Vec<Report>, CoreError>;
}

pub trait SettingStore {
    fn all_settings(&self) -> Result<Vec<Setting>, CoreError>;
    fn setting_by_id(&self, id: i64) -> Result<Setting, CoreError>;
    fn insert_setting(&self, setting: &NewSetting) -> Result<Setting, CoreError>;
    /// Replaces credentials, connection status and last-tested time.
    fn update_setting(&self, id: i64, setting: &Setting) -> Result<Setting, CoreError>;
    fn remove_setting(&self, id: i64) -> Result<Setting, CoreError>;
}
