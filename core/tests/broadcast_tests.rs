use std::cell::RefCell;
use std::fs;

use broadcast_console_core::broadcast::latest_broadcast;
use broadcast_console_core::csv_import::import_contacts;
use broadcast_console_core::lists::{create_list, delete_list};
use broadcast_console_core::models::{
    Broadcast, Contact, ContactList, DeliveryStatus, NewBroadcast, Report,
};
use broadcast_console_core::personalize::{render, MergeContext};
use broadcast_console_core::store::{BroadcastStore, ListStore, ReportStore};
use broadcast_console_core::{BroadcastOrchestrator, ContactLifecycle, CoreError, DeliverySimulator, SqliteStore};

const CSV: &str = "Name,WhatsApp,Email\nAnn,+1555,ann@x.com\nBob,+1666,bob@x.com\nCy,+1777,cy@x.com";

fn setup() -> (SqliteStore, i64, Vec<Contact>) {
    let store = SqliteStore::in_memory().expect("store");
    let list = create_list(&store, "Customers").expect("list");
    let contacts = import_contacts(&store, list.id, CSV).expect("import");
    (store, list.id, contacts)
}

#[test]
fn send_creates_broadcast_and_one_report_per_recipient() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator =
        BroadcastOrchestrator::with_simulator(&store, DeliverySimulator::seeded(1));

    let outcome = orchestrator.send(list_id, "  msg  ", &contacts).expect("send");
    assert_eq!(outcome.broadcast.total_recipients, 3);
    assert_eq!(outcome.broadcast.message, "msg");
    assert_eq!(outcome.reports.len(), 3);
    for (report, contact) in outcome.reports.iter().zip(&contacts) {
        assert_eq!(report.broadcast_id, outcome.broadcast.id);
        assert_eq!(report.contact_id, contact.id);
        assert!(DeliveryStatus::ALL.contains(&report.status));
        assert_eq!(report.read_at.is_some(), report.status == DeliveryStatus::Read);
    }

    let stored = store
        .reports_for_broadcast(outcome.broadcast.id)
        .expect("stored reports");
    assert_eq!(stored, outcome.reports);
}

#[test]
fn message_keeps_merge_tags_for_later_personalization() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    let outcome = orchestrator
        .send(list_id, "Hi {{Name}}", &contacts)
        .expect("send");
    assert_eq!(outcome.broadcast.message, "Hi {{Name}}");
    assert_eq!(
        render(&outcome.broadcast.message, &MergeContext::for_contact(&contacts[0])),
        "Hi Ann"
    );
}

#[test]
fn total_recipients_is_not_recomputed() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    let outcome = orchestrator.send(list_id, "msg", &contacts).expect("send");

    ContactLifecycle::new(&store)
        .soft_delete(contacts[0].id)
        .expect("soft delete");
    let stored = store.broadcast_by_id(outcome.broadcast.id).expect("broadcast");
    assert_eq!(stored.total_recipients, 3);
}

#[test]
fn send_rejects_missing_preconditions() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator = BroadcastOrchestrator::new(&store);

    let err = orchestrator.send(999, "msg", &contacts).expect_err("no list");
    assert!(matches!(err, CoreError::Validation(_)));
    let err = orchestrator.send(list_id, "   ", &contacts).expect_err("blank");
    assert!(matches!(err, CoreError::Validation(_)));
    let err = orchestrator.send(list_id, "msg", &[]).expect_err("no recipients");
    assert!(matches!(err, CoreError::Validation(_)));

    assert!(store.all_broadcasts().expect("broadcasts").is_empty());
}

#[test]
fn repeated_recipient_is_rejected_before_writing() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    let recipients = vec![contacts[0].clone(), contacts[1].clone(), contacts[0].clone()];

    let err = orchestrator.send(list_id, "msg", &recipients).expect_err("duplicate");
    match err {
        CoreError::Validation(message) => {
            assert!(message.contains(&contacts[0].id.to_string()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(store.all_broadcasts().expect("broadcasts").is_empty());
    assert!(store.all_reports().expect("reports").is_empty());
}

#[test]
fn send_after_list_deleted_is_rejected() {
    let (store, list_id, contacts) = setup();
    delete_list(&store, list_id).expect("delete list");
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    let err = orchestrator.send(list_id, "msg", &contacts).expect_err("list gone");
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn progress_runs_from_zero_to_hundred() {
    let (store, list_id, contacts) = setup();
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    let seen = RefCell::new(Vec::new());
    orchestrator
        .send_with_progress(list_id, "msg", &contacts, |p| seen.borrow_mut().push(p))
        .expect("send");
    assert_eq!(
        seen.into_inner(),
        vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
    );
}

#[test]
fn latest_broadcast_picks_newest() {
    let (store, list_id, contacts) = setup();
    assert!(latest_broadcast(&store).expect("latest").is_none());
    let mut orchestrator = BroadcastOrchestrator::new(&store);
    orchestrator.send(list_id, "first", &contacts).expect("first");
    let second = orchestrator.send(list_id, "second", &contacts).expect("second");
    let latest = latest_broadcast(&store).expect("latest").expect("some");
    assert_eq!(latest.id, second.broadcast.id);
}

/// Delegates to a real store but refuses every report batch. With
/// `stuck_broadcasts` set, removing a broadcast fails as well.
struct FailingReports {
    inner: SqliteStore,
    stuck_broadcasts: bool,
}

impl FailingReports {
    fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            stuck_broadcasts: false,
        }
    }
}

impl ListStore for FailingReports {
    fn all_lists(&self) -> Result<Vec<ContactList>, CoreError> {
        self.inner.all_lists()
    }
    fn list_by_id(&self, id: i64) -> Result<ContactList, CoreError> {
        self.inner.list_by_id(id)
    }
    fn insert_list(&self, name: &str) -> Result<ContactList, CoreError> {
        self.inner.insert_list(name)
    }
    fn update_list(&self, id: i64, list: &ContactList) -> Result<ContactList, CoreError> {
        self.inner.update_list(id, list)
    }
    fn remove_list(&self, id: i64) -> Result<ContactList, CoreError> {
        self.inner.remove_list(id)
    }
    fn remove_list_cascade(&self, id: i64) -> Result<(ContactList, usize), CoreError> {
        self.inner.remove_list_cascade(id)
    }
}

impl BroadcastStore for FailingReports {
    fn all_broadcasts(&self) -> Result<Vec<Broadcast>, CoreError> {
        self.inner.all_broadcasts()
    }
    fn broadcast_by_id(&self, id: i64) -> Result<Broadcast, CoreError> {
        self.inner.broadcast_by_id(id)
    }
    fn insert_broadcast(&self, broadcast: &NewBroadcast) -> Result<Broadcast, CoreError> {
        self.inner.insert_broadcast(broadcast)
    }
    fn remove_broadcast(&self, id: i64) -> Result<Broadcast, CoreError> {
        if self.stuck_broadcasts {
            return Err(CoreError::InvalidState("broadcast table is read-only".to_string()));
        }
        self.inner.remove_broadcast(id)
    }
}

impl ReportStore for FailingReports {
    fn all_reports(&self) -> Result<Vec<Report>, CoreError> {
        self.inner.all_reports()
    }
    fn reports_for_broadcast(&self, broadcast_id: i64) -> Result<Vec<Report>, CoreError> {
        self.inner.reports_for_broadcast(broadcast_id)
    }
    fn insert_reports(&self, _reports: &[Report]) -> Result<Vec<Report>, CoreError> {
        Err(CoreError::InvalidState("report storage unavailable".to_string()))
    }
}

#[test]
fn failed_report_batch_rolls_back_broadcast() {
    let (inner, list_id, contacts) = setup();
    let store = FailingReports::new(inner);
    let logs = tempfile::tempdir().expect("temp");
    let mut orchestrator = BroadcastOrchestrator::new(&store).with_diagnostics(logs.path().to_path_buf());

    let err = orchestrator.send(list_id, "msg", &contacts).expect_err("partial");
    match err {
        CoreError::PartialFailure { reason, .. } => {
            assert!(reason.contains("report storage unavailable"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(store.all_broadcasts().expect("broadcasts").is_empty());
    assert!(store.all_reports().expect("reports").is_empty());

    let log = fs::read_to_string(logs.path().join("diagnostics.log")).expect("log");
    assert!(log.contains("broadcast_partial_failure"));
}

#[test]
fn failed_rollback_names_both_failures() {
    let (inner, list_id, contacts) = setup();
    let mut store = FailingReports::new(inner);
    store.stuck_broadcasts = true;
    let mut orchestrator = BroadcastOrchestrator::new(&store);

    let err = orchestrator.send(list_id, "msg", &contacts).expect_err("partial");
    let CoreError::PartialFailure { broadcast_id, reason } = err else {
        panic!("expected a partial failure");
    };
    assert!(reason.contains("report storage unavailable"));
    assert!(reason.contains("broadcast table is read-only"));

    let left = store.all_broadcasts().expect("broadcasts");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, broadcast_id);
}

#[test]
fn unwritable_diagnostics_dir_does_not_mask_the_failure() {
    let (inner, list_id, contacts) = setup();
    let store = FailingReports::new(inner);
    let dir = tempfile::tempdir().expect("temp");
    let not_a_dir = dir.path().join("occupied");
    fs::write(&not_a_dir, "file").expect("file");
    let mut orchestrator = BroadcastOrchestrator::new(&store).with_diagnostics(not_a_dir);

    let err = orchestrator.send(list_id, "msg", &contacts).expect_err("partial");
    assert!(matches!(err, CoreError::PartialFailure { .. }));
    assert!(store.all_broadcasts().expect("broadcasts").is_empty());
}
