//! Provider settings and the stubbed connection test.
//!
//! No provider is ever contacted. A connection "succeeds" when every
//! credential field its category requires is filled in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{now_millis, ConnectionStatus, NewSetting, Setting, SettingCategory};
use crate::store::SettingStore;

/// Credential fields each provider needs before it counts as connected.
pub const REQUIRED_FIELDS: &[(SettingCategory, &[&str])] = &[
    (SettingCategory::Whatsapp, &["apiUrl", "apiKey", "phoneNumberId"]),
    (SettingCategory::Postmark, &["serverToken", "fromEmail"]),
    (SettingCategory::Smtp2go, &["apiKey", "senderEmail"]),
    (SettingCategory::Twilio, &["accountSid", "authToken", "fromNumber"]),
];

pub fn required_fields(category: SettingCategory) -> &'static [&'static str] {
    REQUIRED_FIELDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// Required fields that are absent or blank.
pub fn missing_fields(category: SettingCategory, credentials: &BTreeMap<String, String>) -> Vec<&'static str> {
    required_fields(category)
        .iter()
        .copied()
        .filter(|field| {
            credentials
                .get(*field)
                .map_or(true, |value| value.trim().is_empty())
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub status: ConnectionStatus,
    pub message: String,
}

pub fn list_settings<S: SettingStore>(store: &S) -> Result<Vec<Setting>, CoreError> {
    store.all_settings()
}

pub fn setting_for<S: SettingStore>(store: &S, category: SettingCategory) -> Result<Option<Setting>, CoreError> {
    Ok(store
        .all_settings()?
        .into_iter()
        .find(|setting| setting.category == category))
}

/// Stores credentials for a category, replacing any earlier ones. The
/// connection status goes back to `not_tested`.
pub fn save_setting<S: SettingStore>(
    store: &S,
    category: SettingCategory,
    credentials: BTreeMap<String, String>,
) -> Result<Setting, CoreError> {
    match setting_for(store, category)? {
        Some(mut existing) => {
            existing.credentials = credentials;
            existing.connection_status = ConnectionStatus::NotTested;
            existing.last_tested = None;
            store.update_setting(existing.id, &existing)
        }
        None => store.insert_setting(&NewSetting {
            category,
            credentials,
        }),
    }
}

pub fn delete_setting<S: SettingStore>(store: &S, id: i64) -> Result<Setting, CoreError> {
    store.remove_setting(id)
}

/// Checks required-field presence and records the outcome on the setting.
pub fn test_connection<S: SettingStore>(store: &S, id: i64) -> Result<ConnectionTestResult, CoreError> {
    let mut setting = store.setting_by_id(id)?;
    let missing = missing_fields(setting.category, &setting.credentials);
    let success = missing.is_empty();
    let status = if success {
        ConnectionStatus::Connected
    } else {
        ConnectionStatus::Failed
    };

    setting.connection_status = status;
    setting.last_tested = Some(now_millis());
    store.update_setting(id, &setting)?;

    tracing::info!(
        setting_id = id,
        category = %setting.category,
        status = status.as_str(),
        missing = ?missing,
        "tested provider connection"
    );

    let message = if success {
        "Connection successful"
    } else {
        "Connection failed - check your credentials"
    };
    Ok(ConnectionTestResult {
        success,
        status,
        message: message.to_string(),
    })
}
