use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Lifecycle of a contact. A deleted contact always carries the moment it
/// was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ContactState {
    Active,
    Deleted { deleted_at: i64 },
}

impl ContactState {
    pub fn is_deleted(&self) -> bool {
        matches!(self, ContactState::Deleted { .. })
    }

    pub fn deleted_at(&self) -> Option<i64> {
        match self {
            ContactState::Active => None,
            ContactState::Deleted { deleted_at } => Some(*deleted_at),
        }
    }

    /// Rebuilds the state from the flat storage columns.
    pub fn from_columns(is_deleted: bool, deleted_at: Option<i64>) -> Result<Self, CoreError> {
        match (is_deleted, deleted_at) {
            (false, None) => Ok(ContactState::Active),
            (true, Some(deleted_at)) => Ok(ContactState::Deleted { deleted_at }),
            (true, None) => Err(CoreError::InvalidState(
                "contact marked deleted without a deletion time".to_string(),
            )),
            (false, Some(_)) => Err(CoreError::InvalidState(
                "active contact carries a deletion time".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub list_id: i64,
    pub created_at: i64,
    pub state: ContactState,
}

impl Contact {
    pub fn is_deleted(&self) -> bool {
        self.state.is_deleted()
    }

    pub fn deleted_at(&self) -> Option<i64> {
        self.state.deleted_at()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub list_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    pub id: i64,
    pub name: String,
    pub contact_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    General,
    Marketing,
    Event,
    Reminder,
    Welcome,
    FollowUp,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 6] = [
        TemplateCategory::General,
        TemplateCategory::Marketing,
        TemplateCategory::Event,
        TemplateCategory::Reminder,
        TemplateCategory::Welcome,
        TemplateCategory::FollowUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::General => "general",
            TemplateCategory::Marketing => "marketing",
            TemplateCategory::Event => "event",
            TemplateCategory::Reminder => "reminder",
            TemplateCategory::Welcome => "welcome",
            TemplateCategory::FollowUp => "follow-up",
        }
    }
}

impl FromStr for TemplateCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::Format(format!("unknown template category: {}", s)))
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub content: String,
    pub category: TemplateCategory,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub description: String,
    pub content: String,
    pub category: TemplateCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: i64,
    pub list_id: i64,
    pub message: String,
    pub sent_at: i64,
    pub total_recipients: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBroadcast {
    pub list_id: i64,
    pub message: String,
    pub sent_at: i64,
    pub total_recipients: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Sent,
        DeliveryStatus::Delivered,
        DeliveryStatus::Read,
        DeliveryStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Format(format!("unknown delivery status: {}", s)))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-recipient outcome of one broadcast, keyed by `(broadcast_id, contact_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub broadcast_id: i64,
    pub contact_id: i64,
    pub status: DeliveryStatus,
    pub read_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingCategory {
    Whatsapp,
    Postmark,
    Smtp2go,
    Twilio,
}

impl SettingCategory {
    pub const ALL: [SettingCategory; 4] = [
        SettingCategory::Whatsapp,
        SettingCategory::Postmark,
        SettingCategory::Smtp2go,
        SettingCategory::Twilio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingCategory::Whatsapp => "whatsapp",
            SettingCategory::Postmark => "postmark",
            SettingCategory::Smtp2go => "smtp2go",
            SettingCategory::Twilio => "twilio",
        }
    }
}

impl FromStr for SettingCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::Format(format!("unknown setting category: {}", s)))
    }
}

impl fmt::Display for SettingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    NotTested,
    Connected,
    Failed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::NotTested => "not_tested",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Failed => "failed",
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_tested" => Ok(ConnectionStatus::NotTested),
            "connected" => Ok(ConnectionStatus::Connected),
            "failed" => Ok(ConnectionStatus::Failed),
            other => Err(CoreError::Format(format!("unknown connection status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub category: SettingCategory,
    pub credentials: BTreeMap<String, String>,
    pub connection_status: ConnectionStatus,
    pub last_tested: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSetting {
    pub category: SettingCategory,
    pub credentials: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_state_rejects_inconsistent_columns() {
        assert!(ContactState::from_columns(true, None).is_err());
        assert!(ContactState::from_columns(false, Some(5)).is_err());
        assert_eq!(
            ContactState::from_columns(true, Some(5)).expect("deleted"),
            ContactState::Deleted { deleted_at: 5 }
        );
    }

    #[test]
    fn template_category_uses_kebab_case() {
        assert_eq!(TemplateCategory::FollowUp.as_str(), "follow-up");
        assert_eq!(
            "follow-up".parse::<TemplateCategory>().expect("parse"),
            TemplateCategory::FollowUp
        );
        assert!("Follow-Up".parse::<TemplateCategory>().is_err());
        let json = serde_json::to_string(&TemplateCategory::FollowUp).expect("json");
        assert_eq!(json, "\"follow-up\"");
    }

    #[test]
    fn delivery_status_round_trips_through_str() {
        for status in DeliveryStatus::ALL {
            assert_eq!(status.as_str().parse::<DeliveryStatus>().expect("parse"), status);
        }
    }
}
