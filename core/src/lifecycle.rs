//! Contact lifecycle: `Active -> Deleted -> Active` via soft delete and
//! restore, and `Deleted -> removed` via permanent delete. Every transition
//! re-reads the contact from the store and then refreshes the owning list's
//! contact count.

use crate::error::CoreError;
use crate::lists::reconcile_contact_count;
use crate::models::{now_millis, Contact, ContactState, NewContact};
use crate::store::{ContactStore, ListStore};

/// Contacts whose name, email or WhatsApp number contains `query`, ignoring
/// case. A blank query keeps every contact.
pub fn search_contacts(contacts: Vec<Contact>, query: &str) -> Vec<Contact> {
    if query.trim().is_empty() {
        return contacts;
    }
    let needle = query.to_lowercase();
    contacts
        .into_iter()
        .filter(|contact| {
            contact.name.to_lowercase().contains(&needle)
                || contact.email.to_lowercase().contains(&needle)
                || contact.whatsapp_number.to_lowercase().contains(&needle)
        })
        .collect()
}

pub struct ContactLifecycle<'a, S> {
    store: &'a S,
}

impl<'a, S> ContactLifecycle<'a, S>
where
    S: ContactStore + ListStore,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: &NewContact) -> Result<Contact, CoreError> {
        if draft.name.trim().is_empty() {
            return Err(CoreError::Validation("contact name is required".to_string()));
        }
        self.store.list_by_id(draft.list_id)?;
        let contact = self.store.insert_contact(draft)?;
        self.refresh_count(contact.list_id)?;
        Ok(contact)
    }

    /// Contacts that are not soft-deleted.
    pub fn list_active(&self) -> Result<Vec<Contact>, CoreError> {
        Ok(self
            .store
            .all_contacts()?
            .into_iter()
            .filter(|contact| !contact.is_deleted())
            .collect())
    }

    pub fn list_deleted(&self) -> Result<Vec<Contact>, CoreError> {
        Ok(self
            .store
            .all_contacts()?
            .into_iter()
            .filter(Contact::is_deleted)
            .collect())
    }

    /// Active contacts of one list.
    pub fn list_for_list(&self, list_id: i64) -> Result<Vec<Contact>, CoreError> {
        Ok(self
            .store
            .contacts_for_list(list_id)?
            .into_iter()
            .filter(|contact| !contact.is_deleted())
            .collect())
    }

    pub fn soft_delete(&self, id: i64) -> Result<Contact, CoreError> {
        let mut contact = self.store.contact_by_id(id)?;
        if contact.is_deleted() {
            return Err(CoreError::InvalidState(format!("contact {} is already deleted", id)));
        }
        contact.state = ContactState::Deleted {
            deleted_at: now_millis(),
        };
        let contact = self.store.update_contact(id, &contact)?;
        self.refresh_count(contact.list_id)?;
        tracing::info!(contact_id = id, "soft-deleted contact");
        Ok(contact)
    }

    pub fn restore(&self, id: i64) -> Result<Contact, CoreError> {
        let mut contact = self.store.contact_by_id(id)?;
        if !contact.is_deleted() {
            return Err(CoreError::InvalidState(format!("contact {} is not deleted", id)));
        }
        contact.state = ContactState::Active;
        let contact = self.store.update_contact(id, &contact)?;
        self.refresh_count(contact.list_id)?;
        tracing::info!(contact_id = id, "restored contact");
        Ok(contact)
    }

    /// Only soft-deleted contacts may be removed for good.
    pub fn permanent_delete(&self, id: i64) -> Result<Contact, CoreError> {
        let contact = self.store.contact_by_id(id)?;
        if !contact.is_deleted() {
            return Err(CoreError::InvalidState(format!(
                "contact {} must be deleted before it can be removed permanently",
                id
            )));
        }
        let removed = self.store.remove_contact(id)?;
        self.refresh_count(removed.list_id)?;
        tracing::info!(contact_id = id, "permanently deleted contact");
        Ok(removed)
    }

    // The owning list may already be gone; that is not an error here.
    fn refresh_count(&self, list_id: i64) -> Result<(), CoreError> {
        match reconcile_contact_count(self.store, list_id) {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }
}
