use std::sync::Arc;

use chrono::NaiveDate;
use freshledger::config::AppConfig;
use freshledger::db;
use freshledger::entities::inventory_record;
use freshledger::events::{self, EventSender};
use freshledger::services::inventory::{CreateInventoryInput, CreateLotInput};
use freshledger::services::TenantContext;
use freshledger::InventoryCore;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Harness spinning up an [`InventoryCore`] backed by an in-memory SQLite
/// database. Each call gets a fresh database.
pub struct TestCore {
    pub core: InventoryCore,
    pub ctx: TenantContext,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestCore {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        // a single pooled connection keeps the in-memory database alive
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.auto_migrate = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let core = InventoryCore::new(db_arc, cfg, event_sender);
        let ctx = TenantContext {
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };

        Self {
            core,
            ctx,
            _event_task: event_task,
        }
    }

    /// A second tenant context against the same database, for isolation tests.
    #[allow(dead_code)]
    pub fn other_tenant(&self) -> TenantContext {
        TenantContext {
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
    }

    /// Seeds a plain (lot-less) record.
    #[allow(dead_code)]
    pub async fn seed_record(
        &self,
        sku: &str,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> inventory_record::Model {
        self.core
            .inventory
            .create_inventory(
                &self.ctx,
                CreateInventoryInput {
                    product_id: Uuid::new_v4(),
                    product_sku: sku.to_string(),
                    product_name: format!("Product {sku}"),
                    variant_sku: None,
                    initial_quantity: quantity,
                    unit_cost,
                    lots: Vec::new(),
                    reorder_point: None,
                    max_stock_level: None,
                    warehouse: None,
                },
            )
            .await
            .expect("seed record")
    }

    /// Seeds a perishable record whose stock is spread over the given lots
    /// (lot number, quantity, expiration date).
    #[allow(dead_code)]
    pub async fn seed_perishable(
        &self,
        sku: &str,
        unit_cost: Decimal,
        lots: &[(&str, Decimal, Option<NaiveDate>)],
    ) -> inventory_record::Model {
        let total: Decimal = lots.iter().map(|(_, quantity, _)| *quantity).sum();
        let today = chrono::Utc::now().date_naive();
        self.core
            .inventory
            .create_inventory(
                &self.ctx,
                CreateInventoryInput {
                    product_id: Uuid::new_v4(),
                    product_sku: sku.to_string(),
                    product_name: format!("Product {sku}"),
                    variant_sku: None,
                    initial_quantity: total,
                    unit_cost,
                    lots: lots
                        .iter()
                        .map(|(number, quantity, expiration)| CreateLotInput {
                            lot_number: number.to_string(),
                            quantity: *quantity,
                            cost_price: unit_cost,
                            received_date: today,
                            expiration_date: *expiration,
                            manufacturing_date: None,
                            supplier_id: None,
                        })
                        .collect(),
                    reorder_point: None,
                    max_stock_level: None,
                    warehouse: None,
                },
            )
            .await
            .expect("seed perishable record")
    }
}

impl Drop for TestCore {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
