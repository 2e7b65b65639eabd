use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::broadcast::latest_broadcast;
use crate::error::CoreError;
use crate::models::{Broadcast, Contact, ContactList, DeliveryStatus, Report};
use crate::store::{BroadcastStore, ContactStore, ListStore, ReportStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySummary {
    pub total: usize,
    pub sent: usize,
    pub delivered: usize,
    pub read: usize,
    pub failed: usize,
}

impl DeliverySummary {
    pub fn count(&self, status: DeliveryStatus) -> usize {
        match status {
            DeliveryStatus::Sent => self.sent,
            DeliveryStatus::Delivered => self.delivered,
            DeliveryStatus::Read => self.read,
            DeliveryStatus::Failed => self.failed,
        }
    }

    /// Percentage of recipients that read the message, rounded.
    pub fn engagement_rate(&self) -> u32 {
        percent(self.read, self.total)
    }

    /// Percentage that reached the device (delivered or read), rounded.
    pub fn delivery_rate(&self) -> u32 {
        percent(self.delivered + self.read, self.total)
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn summarize(reports: &[Report]) -> DeliverySummary {
    let mut summary = DeliverySummary {
        total: reports.len(),
        ..DeliverySummary::default()
    };
    for report in reports {
        match report.status {
            DeliveryStatus::Sent => summary.sent += 1,
            DeliveryStatus::Delivered => summary.delivered += 1,
            DeliveryStatus::Read => summary.read += 1,
            DeliveryStatus::Failed => summary.failed += 1,
        }
    }
    summary
}

/// Recipient details shown next to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientInfo {
    pub name: String,
    pub whatsapp_number: String,
    pub email: String,
}

impl RecipientInfo {
    fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            whatsapp_number: String::new(),
            email: String::new(),
        }
    }
}

impl From<&Contact> for RecipientInfo {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            whatsapp_number: contact.whatsapp_number.clone(),
            email: contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub report: Report,
    pub recipient: RecipientInfo,
}

/// Reports of one broadcast joined with their contacts. Contacts removed
/// since the send show up as "Unknown".
pub fn report_rows<S>(store: &S, broadcast_id: i64) -> Result<Vec<ReportRow>, CoreError>
where
    S: ReportStore + ContactStore,
{
    let reports = store.reports_for_broadcast(broadcast_id)?;
    let contacts: HashMap<i64, Contact> = store
        .all_contacts()?
        .into_iter()
        .map(|contact| (contact.id, contact))
        .collect();
    Ok(reports
        .into_iter()
        .map(|report| {
            let recipient = contacts
                .get(&report.contact_id)
                .map(RecipientInfo::from)
                .unwrap_or_else(RecipientInfo::unknown);
            ReportRow { report, recipient }
        })
        .collect())
}

/// `None` keeps every row.
pub fn filter_rows(rows: Vec<ReportRow>, status: Option<DeliveryStatus>) -> Vec<ReportRow> {
    match status {
        None => rows,
        Some(status) => rows
            .into_iter()
            .filter(|row| row.report.status == status)
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Status,
    ReadAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Stable sort. Names compare case-insensitively, statuses by their text and
/// unread rows sort as if read at time zero.
pub fn sort_rows(rows: &mut [ReportRow], key: SortKey, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare(a: &ReportRow, b: &ReportRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a
            .recipient
            .name
            .to_lowercase()
            .cmp(&b.recipient.name.to_lowercase()),
        SortKey::Status => a.report.status.as_str().cmp(b.report.status.as_str()),
        SortKey::ReadAt => a
            .report
            .read_at
            .unwrap_or(0)
            .cmp(&b.report.read_at.unwrap_or(0)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub broadcast: Broadcast,
    /// The list the broadcast went to; `None` once that list is deleted.
    pub list: Option<ContactList>,
    pub summary: DeliverySummary,
    pub rows: Vec<ReportRow>,
}

/// Report for the most recent broadcast, or `None` before the first send.
pub fn latest_report<S>(store: &S) -> Result<Option<BroadcastReport>, CoreError>
where
    S: BroadcastStore + ReportStore + ContactStore + ListStore,
{
    let Some(broadcast) = latest_broadcast(store)? else {
        return Ok(None);
    };
    let list = match store.list_by_id(broadcast.list_id) {
        Ok(list) => Some(list),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err),
    };
    let rows = report_rows(store, broadcast.id)?;
    let reports: Vec<Report> = rows.iter().map(|row| row.report.clone()).collect();
    Ok(Some(BroadcastReport {
        summary: summarize(&reports),
        broadcast,
        list,
        rows,
    }))
}
