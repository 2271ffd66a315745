//! Stockroom - office-supply inventory ledger
//!
//! This library keeps stock quantities consistent under concurrent
//! deliveries and restocks, derives alerts from the ledger, and protects it
//! with scheduled, validated backups and an exclusive restore.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Items, employees, deliveries and alerts
//! - `storage`: Transactional JSON ledger store
//! - `services`: Stock ledger, deliveries, alert engine
//! - `audit`: Audit logging system
//! - `backup`: Backup scheduler, retention and restore
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use stockroom::config::{paths::StockroomPaths, settings::Settings};
//! use stockroom::services::{AlertEngine, DeliveryService};
//! use stockroom::storage::{LockPolicy, Store};
//!
//! let paths = StockroomPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = Store::open(paths, LockPolicy::from(settings.lock.clone()))?;
//!
//! let alerts = AlertEngine::new(&store, &settings.alert);
//! let deliveries = DeliveryService::new(&store, &alerts);
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{StockroomError, StockroomResult};
