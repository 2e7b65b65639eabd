use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConsoleConfig;
use crate::diagnostics;
use crate::error::CoreError;
use crate::models::{now_millis, Broadcast, Contact, NewBroadcast, Report};
use crate::simulator::DeliverySimulator;
use crate::store::{BroadcastStore, ListStore, ReportStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub broadcast: Broadcast,
    pub reports: Vec<Report>,
}

/// Sends a message to a set of recipients: records the broadcast and one
/// simulated report per recipient. Personalization is not applied here;
/// the stored message keeps its merge tags.
pub struct BroadcastOrchestrator<'a, S, R = StdRng> {
    store: &'a S,
    simulator: DeliverySimulator<R>,
    pacing: Duration,
    log_dir: Option<PathBuf>,
}

impl<'a, S> BroadcastOrchestrator<'a, S, StdRng>
where
    S: ListStore + BroadcastStore + ReportStore,
{
    pub fn new(store: &'a S) -> Self {
        Self::with_simulator(store, DeliverySimulator::new())
    }

    pub fn from_config(store: &'a S, config: &ConsoleConfig) -> Self {
        let simulator = match config.simulator_seed {
            Some(seed) => DeliverySimulator::seeded(seed),
            None => DeliverySimulator::new(),
        };
        Self::with_simulator(store, simulator)
            .with_pacing(config.send_pacing)
            .with_diagnostics(config.log_dir.clone())
    }
}

impl<'a, S, R> BroadcastOrchestrator<'a, S, R>
where
    S: ListStore + BroadcastStore + ReportStore,
    R: Rng,
{
    pub fn with_simulator(store: &'a S, simulator: DeliverySimulator<R>) -> Self {
        Self {
            store,
            simulator,
            pacing: Duration::ZERO,
            log_dir: None,
        }
    }

    /// Delay between progress steps. Purely cosmetic: it is not a rate
    /// limit and nothing is retried.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Failed sends are also written to the diagnostics log in `log_dir`.
    pub fn with_diagnostics(mut self, log_dir: impl Into<Option<PathBuf>>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn send(
        &mut self,
        list_id: i64,
        message: &str,
        recipients: &[Contact],
    ) -> Result<SendOutcome, CoreError> {
        self.send_with_progress(list_id, message, recipients, |_| {})
    }

    /// Like [`send`](Self::send), reporting paced progress from 0 to 100 in
    /// steps of 10 before anything is written.
    pub fn send_with_progress<F>(
        &mut self,
        list_id: i64,
        message: &str,
        recipients: &[Contact],
        progress: F,
    ) -> Result<SendOutcome, CoreError>
    where
        F: Fn(u8),
    {
        let message = self.validate(list_id, message, recipients)?;
        let total_recipients = recipients.len() as i64;

        for percent in (0..=100u8).step_by(10) {
            progress(percent);
            if !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }
        }

        let sent_at = now_millis();
        let broadcast = self.store.insert_broadcast(&NewBroadcast {
            list_id,
            message,
            sent_at,
            total_recipients,
        })?;

        let deliveries = self.simulator.simulate(recipients.len(), sent_at);
        let reports: Vec<Report> = recipients
            .iter()
            .zip(deliveries)
            .map(|(contact, delivery)| Report {
                broadcast_id: broadcast.id,
                contact_id: contact.id,
                status: delivery.status,
                read_at: delivery.read_at,
            })
            .collect();

        let reports = match self.store.insert_reports(&reports) {
            Ok(stored) => stored,
            Err(err) => return Err(self.roll_back(broadcast.id, err)),
        };

        tracing::info!(
            broadcast_id = broadcast.id,
            list_id,
            recipients = total_recipients,
            "broadcast sent"
        );
        Ok(SendOutcome { broadcast, reports })
    }

    fn validate(&self, list_id: i64, message: &str, recipients: &[Contact]) -> Result<String, CoreError> {
        match self.store.list_by_id(list_id) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                return Err(CoreError::Validation(format!("list {} does not exist", list_id)));
            }
            Err(err) => return Err(err),
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::Validation("message is required".to_string()));
        }
        if recipients.is_empty() {
            return Err(CoreError::Validation("broadcast has no recipients".to_string()));
        }
        // One report per (broadcast, contact): a repeated contact could never be stored.
        let mut seen = HashSet::with_capacity(recipients.len());
        if let Some(repeated) = recipients.iter().find(|contact| !seen.insert(contact.id)) {
            return Err(CoreError::Validation(format!(
                "contact {} appears more than once in the recipients",
                repeated.id
            )));
        }
        Ok(message.to_string())
    }

    fn roll_back(&self, broadcast_id: i64, cause: CoreError) -> CoreError {
        tracing::warn!(broadcast_id, error = %cause, "report batch failed, removing broadcast");
        let reason = match self.store.remove_broadcast(broadcast_id) {
            Ok(_) => format!("report batch failed: {}", cause),
            Err(rollback) => format!(
                "report batch failed: {}; removing the broadcast also failed: {}",
                cause, rollback
            ),
        };
        if let Some(log_dir) = &self.log_dir {
            let message = format!("broadcast {} rolled back: {}", broadcast_id, reason);
            if let Err(err) = diagnostics::log_event(log_dir, "broadcast_partial_failure", &message) {
                tracing::warn!(error = %err, "diagnostics log write failed");
            }
        }
        CoreError::PartialFailure {
            broadcast_id,
            reason,
        }
    }
}

/// Most recent broadcast by send time; the higher id wins a tie.
pub fn latest_broadcast<S: BroadcastStore>(store: &S) -> Result<Option<Broadcast>, CoreError> {
    Ok(store
        .all_broadcasts()?
        .into_iter()
        .max_by_key(|broadcast| (broadcast.sent_at, broadcast.id)))
}
