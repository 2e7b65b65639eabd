pub mod broadcast;
pub mod config;
pub mod csv_import;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod lists;
pub mod models;
pub mod personalize;
pub mod reports;
pub mod seed;
pub mod settings;
pub mod simulator;
pub mod store;
pub mod templates;
mod migrations;

pub use broadcast::{BroadcastOrchestrator, SendOutcome};
pub use config::{open_console, ConsoleConfig};
pub use db::{open_console_db, ConsoleDb};
pub use error::CoreError;
pub use lifecycle::ContactLifecycle;
pub use simulator::DeliverySimulator;
pub use store::SqliteStore;
