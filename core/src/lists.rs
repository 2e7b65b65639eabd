use crate::error::CoreError;
use crate::models::ContactList;
use crate::store::{ContactStore, ListStore};

fn clean_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("list name is required".to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn create_list<S: ListStore>(store: &S, name: &str) -> Result<ContactList, CoreError> {
    let name = clean_name(name)?;
    let list = store.insert_list(&name)?;
    tracing::info!(list_id = list.id, "created list");
    Ok(list)
}

pub fn rename_list<S: ListStore>(store: &S, id: i64, name: &str) -> Result<ContactList, CoreError> {
    let name = clean_name(name)?;
    let mut list = store.list_by_id(id)?;
    list.name = name;
    store.update_list(id, &list)
}

/// Sets `contact_count` to the number of active contacts in the list.
///
/// The count is stored rather than derived, so every operation that adds,
/// removes, deletes or restores contacts calls this afterwards.
pub fn reconcile_contact_count<S>(store: &S, id: i64) -> Result<ContactList, CoreError>
where
    S: ListStore + ContactStore,
{
    let mut list = store.list_by_id(id)?;
    let active = store
        .contacts_for_list(id)?
        .iter()
        .filter(|contact| !contact.is_deleted())
        .count() as i64;
    if list.contact_count == active {
        return Ok(list);
    }
    list.contact_count = active;
    store.update_list(id, &list)
}

/// Deletes a list and, since the store keeps no referential integrity,
/// permanently removes every contact that points at it. Both happen in one
/// store call, so a failure leaves the list and its contacts untouched.
/// Returns how many contacts went with it.
pub fn delete_list<S: ListStore>(store: &S, id: i64) -> Result<usize, CoreError> {
    let (_, removed) = store.remove_list_cascade(id)?;
    tracing::info!(list_id = id, removed_contacts = removed, "deleted list");
    Ok(removed)
}
