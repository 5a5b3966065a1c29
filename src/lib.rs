//! Freshledger
//!
//! Multi-tenant inventory ledger and reservation engine for perishable
//! goods: per-record quantity and cost state, per-lot expiration state with
//! FEFO allocation, and an append-only movement ledger, kept consistent
//! under concurrent order placement, cancellation and manual adjustment.
//!
//! The crate is consumed in-process. Transport, authentication, catalog and
//! order lifecycle live with the embedding application; the engine receives
//! a [`services::TenantContext`] on every call and exposes plain async
//! service APIs.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod allocation;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::alerts::AlertService;
use crate::services::inventory::InventoryService;
use crate::services::movements::MovementLedgerService;
use crate::services::reservations::ReservationService;

/// Bundles the engine's services over one connection pool, configuration
/// and event channel. The embedding application builds one of these at
/// startup and hands out clones.
#[derive(Clone)]
pub struct InventoryCore {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: EventSender,
    pub inventory: InventoryService,
    pub reservations: ReservationService,
    pub movements: MovementLedgerService,
    pub alerts: AlertService,
}

impl InventoryCore {
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig, event_sender: EventSender) -> Self {
        let config = Arc::new(config);
        Self {
            inventory: InventoryService::new(db.clone(), event_sender.clone(), config.clone()),
            reservations: ReservationService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            ),
            movements: MovementLedgerService::new(db.clone()),
            alerts: AlertService::new(db.clone()),
            db,
            config,
            event_sender,
        }
    }
}

/// Initializes the global tracing subscriber from configuration. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
