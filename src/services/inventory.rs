use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::entities::inventory_lot::{self, LotStatus};
use crate::entities::inventory_movement::MovementType;
use crate::entities::inventory_record::{self, Balances};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::movements::{append, NewMovement};
use crate::services::{
    find_record_for_mutation_by_id, find_record_for_mutation_by_sku, load_lots,
    save_lot, save_record_versioned, TenantContext,
};

/// A new batch arriving with an `In` movement. Quantity and cost come from
/// the movement itself.
#[derive(Debug, Clone, Validate)]
pub struct NewLotInput {
    #[validate(length(min = 1))]
    pub lot_number: String,
    pub expiration_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Inbound,
    Outbound,
}

/// One movement against one record. The Coordinator is a total match over
/// this type; the pairing of the two halves of a cross-location transfer is
/// the caller's responsibility (link them via `reference`).
#[derive(Debug, Clone)]
pub enum StockMovement {
    In {
        quantity: Decimal,
        unit_cost: Decimal,
        lot: Option<NewLotInput>,
    },
    Out {
        quantity: Decimal,
        lot_number: Option<String>,
    },
    Adjustment {
        new_total_quantity: Decimal,
        new_cost_price: Option<Decimal>,
    },
    Transfer {
        quantity: Decimal,
        direction: TransferDirection,
        unit_cost: Option<Decimal>,
    },
}

#[derive(Debug, Clone, Validate)]
pub struct MovementInput {
    pub record_id: Uuid,
    pub movement: StockMovement,
    #[validate(length(min = 1, message = "a reason is required"))]
    pub reason: String,
    pub reference: Option<String>,
    pub order_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateLotInput {
    #[validate(length(min = 1))]
    pub lot_number: String,
    pub quantity: Decimal,
    pub cost_price: Decimal,
    pub received_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateInventoryInput {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub product_sku: String,
    #[validate(length(min = 1))]
    pub product_name: String,
    pub variant_sku: Option<String>,
    pub initial_quantity: Decimal,
    pub unit_cost: Decimal,
    pub lots: Vec<CreateLotInput>,
    pub reorder_point: Option<Decimal>,
    pub max_stock_level: Option<Decimal>,
    pub warehouse: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct AdjustInput {
    pub record_id: Uuid,
    pub new_total_quantity: Decimal,
    #[validate(length(min = 1, message = "a reason is required"))]
    pub reason: String,
    pub new_cost_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct BulkAdjustItem {
    pub product_sku: String,
    pub variant_sku: Option<String>,
    pub new_total_quantity: Decimal,
}

/// Result of a bulk absolute correction. Unknown skus are skipped, not
/// failed, so a partially stale count sheet still applies cleanly.
#[derive(Debug, Clone)]
pub struct BulkAdjustOutcome {
    pub adjusted: u64,
    pub skipped_skus: Vec<String>,
}

struct MovementEffects {
    balances: Balances,
    sku: String,
    low_stock_crossed: bool,
    near_expiration_lot: Option<String>,
    movement_type: MovementType,
    quantity: Decimal,
}

/// Coordinator for inventory records: creation, single movements, absolute
/// adjustments and the read side of record state. Every mutating operation
/// runs as one transaction that updates the record (and its lots) and
/// appends the documenting ledger entry together.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, config: Arc<AppConfig>) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Registers initial stock for a (tenant, product, variant).
    #[instrument(skip(self, input), fields(sku = %input.product_sku))]
    pub async fn create_inventory(
        &self,
        ctx: &TenantContext,
        input: CreateInventoryInput,
    ) -> Result<inventory_record::Model, ServiceError> {
        input.validate()?;
        validate_create_input(&input)?;

        let ctx = *ctx;
        let near_expiration_days = self.config.near_expiration_days;

        let record = self
            .db
            .transaction::<_, inventory_record::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut existing = inventory_record::Entity::find()
                        .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
                        .filter(inventory_record::Column::ProductSku.eq(input.product_sku.clone()));
                    existing = match &input.variant_sku {
                        Some(variant) => existing
                            .filter(inventory_record::Column::VariantSku.eq(variant.clone())),
                        None => existing.filter(inventory_record::Column::VariantSku.is_null()),
                    };
                    if existing.one(txn).await?.is_some() {
                        return Err(ServiceError::DuplicateRecord(format!(
                            "inventory already exists for sku {}",
                            input.variant_sku.as_deref().unwrap_or(&input.product_sku)
                        )));
                    }

                    let now = Utc::now();
                    let today = now.date_naive();
                    let record_id = Uuid::new_v4();

                    let lot_models: Vec<inventory_lot::Model> = input
                        .lots
                        .iter()
                        .map(|lot| inventory_lot::Model {
                            id: 0,
                            record_id,
                            tenant_id: ctx.tenant_id,
                            lot_number: lot.lot_number.clone(),
                            quantity: lot.quantity,
                            original_quantity: lot.quantity,
                            available_quantity: lot.quantity,
                            reserved_quantity: Decimal::ZERO,
                            cost_price: lot.cost_price,
                            received_date: lot.received_date,
                            expiration_date: lot.expiration_date,
                            manufacturing_date: lot.manufacturing_date,
                            supplier_id: lot.supplier_id,
                            status: LotStatus::Available.as_str().to_string(),
                            created_by: ctx.user_id,
                            created_at: now,
                            updated_at: now,
                        })
                        .collect();

                    let mut record = inventory_record::Model {
                        id: record_id,
                        tenant_id: ctx.tenant_id,
                        product_id: input.product_id,
                        product_sku: input.product_sku.clone(),
                        product_name: input.product_name.clone(),
                        variant_sku: input.variant_sku.clone(),
                        total_quantity: input.initial_quantity,
                        available_quantity: input.initial_quantity,
                        reserved_quantity: Decimal::ZERO,
                        committed_quantity: Decimal::ZERO,
                        average_cost_price: input.unit_cost,
                        last_cost_price: input.unit_cost,
                        reorder_point: input.reorder_point,
                        max_stock_level: input.max_stock_level,
                        warehouse: input.warehouse.clone(),
                        low_stock_alert: false,
                        near_expiration_alert: false,
                        expired_alert: false,
                        overstock_alert: false,
                        is_active: true,
                        version: 1,
                        created_by: ctx.user_id,
                        created_at: now,
                        updated_at: now,
                    };
                    record.refresh_alert_flags(&lot_models, near_expiration_days, today);

                    let active: inventory_record::ActiveModel = record.clone().into();
                    active.reset_all().insert(txn).await?;

                    for lot in &lot_models {
                        new_lot_active(lot).insert(txn).await?;
                    }

                    if input.initial_quantity > Decimal::ZERO {
                        append(
                            txn,
                            NewMovement {
                                record: &record,
                                movement_type: MovementType::In,
                                quantity: input.initial_quantity,
                                unit_cost: input.unit_cost,
                                lot_number: None,
                                reason: "Initial stock".to_string(),
                                reference: None,
                                order_id: None,
                                supplier_id: None,
                                expires_at: None,
                                created_by: ctx.user_id,
                            },
                        )
                        .await?;
                    }

                    Ok(record)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(record_id = %record.id, sku = %record.effective_sku(), "inventory record created");

        self.event_sender
            .send_or_log(Event::InventoryCreated {
                record_id: record.id,
                product_sku: record.effective_sku().to_string(),
            })
            .await;

        Ok(record)
    }

    /// Applies one movement to one record, atomically with its ledger entry.
    #[instrument(skip(self, input), fields(record_id = %input.record_id))]
    pub async fn apply_movement(
        &self,
        ctx: &TenantContext,
        input: MovementInput,
    ) -> Result<Balances, ServiceError> {
        input.validate()?;
        validate_movement(&input.movement)?;

        let ctx = *ctx;
        let record_id = input.record_id;
        let near_expiration_days = self.config.near_expiration_days;

        let effects = self
            .db
            .transaction::<_, MovementEffects, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut record =
                        find_record_for_mutation_by_id(txn, ctx.tenant_id, input.record_id).await?;
                    let mut lots = load_lots(txn, record.id).await?;
                    let today = Utc::now().date_naive();
                    for lot in &mut lots {
                        lot.refresh_status(today);
                    }

                    let low_stock_before = record.low_stock_alert;
                    let near_expiration_before = record.near_expiration_alert;

                    let mut dirty_lot_ids: Vec<i64> = Vec::new();
                    let mut new_lot: Option<inventory_lot::Model> = None;

                    let (movement_type, ledger_quantity, ledger_unit_cost, ledger_lot_number) =
                        match &input.movement {
                            StockMovement::In {
                                quantity,
                                unit_cost,
                                lot,
                            } => {
                                if let Some(lot_input) = lot {
                                    if lots.iter().any(|l| l.lot_number == lot_input.lot_number) {
                                        return Err(ServiceError::Validation(format!(
                                            "lot {} already exists for this record",
                                            lot_input.lot_number
                                        )));
                                    }
                                    let now = Utc::now();
                                    new_lot = Some(inventory_lot::Model {
                                        id: 0,
                                        record_id: record.id,
                                        tenant_id: ctx.tenant_id,
                                        lot_number: lot_input.lot_number.clone(),
                                        quantity: *quantity,
                                        original_quantity: *quantity,
                                        available_quantity: *quantity,
                                        reserved_quantity: Decimal::ZERO,
                                        cost_price: *unit_cost,
                                        received_date: today,
                                        expiration_date: lot_input.expiration_date,
                                        manufacturing_date: lot_input.manufacturing_date,
                                        supplier_id: input.supplier_id,
                                        status: LotStatus::Available.as_str().to_string(),
                                        created_by: ctx.user_id,
                                        created_at: now,
                                        updated_at: now,
                                    });
                                }
                                record.receive(*quantity, *unit_cost);
                                (
                                    MovementType::In,
                                    *quantity,
                                    *unit_cost,
                                    lot.as_ref().map(|l| l.lot_number.clone()),
                                )
                            }
                            StockMovement::Out {
                                quantity,
                                lot_number,
                            } => {
                                record.ensure_available(*quantity)?;
                                if let Some(number) = lot_number {
                                    let lot = lots
                                        .iter_mut()
                                        .find(|l| &l.lot_number == number)
                                        .ok_or_else(|| {
                                            ServiceError::NotFound(format!("lot {number}"))
                                        })?;
                                    if lot.available_quantity < *quantity {
                                        return Err(ServiceError::InsufficientStock {
                                            sku: record.effective_sku().to_string(),
                                            requested: *quantity,
                                            available: lot.available_quantity,
                                        });
                                    }
                                    lot.consume(*quantity)?;
                                    lot.refresh_status(today);
                                    dirty_lot_ids.push(lot.id);
                                }
                                record.issue(*quantity)?;
                                (
                                    MovementType::Out,
                                    *quantity,
                                    record.average_cost_price,
                                    lot_number.clone(),
                                )
                            }
                            StockMovement::Adjustment {
                                new_total_quantity,
                                new_cost_price,
                            } => {
                                let delta =
                                    record.apply_absolute_adjustment(*new_total_quantity)?;
                                if let Some(cost) = new_cost_price {
                                    record.average_cost_price = *cost;
                                    record.last_cost_price = *cost;
                                }
                                (
                                    MovementType::Adjustment,
                                    delta.abs(),
                                    record.average_cost_price,
                                    None,
                                )
                            }
                            StockMovement::Transfer {
                                quantity,
                                direction,
                                unit_cost,
                            } => {
                                match direction {
                                    TransferDirection::Outbound => record.issue(*quantity)?,
                                    TransferDirection::Inbound => {
                                        let cost =
                                            unit_cost.unwrap_or(record.average_cost_price);
                                        record.receive(*quantity, cost);
                                    }
                                }
                                (
                                    MovementType::Transfer,
                                    *quantity,
                                    unit_cost.unwrap_or(record.average_cost_price),
                                    None,
                                )
                            }
                        };

                    if let Some(lot) = &new_lot {
                        new_lot_active(lot).insert(txn).await?;
                        lots.push(lot.clone());
                    }

                    record.refresh_alert_flags(&lots, near_expiration_days, today);
                    let record = save_record_versioned(txn, record).await?;

                    for lot in lots.iter().filter(|l| dirty_lot_ids.contains(&l.id)) {
                        save_lot(txn, lot.clone()).await?;
                    }

                    append(
                        txn,
                        NewMovement {
                            record: &record,
                            movement_type,
                            quantity: ledger_quantity,
                            unit_cost: ledger_unit_cost,
                            lot_number: ledger_lot_number,
                            reason: input.reason.clone(),
                            reference: input.reference.clone(),
                            order_id: input.order_id,
                            supplier_id: input.supplier_id,
                            expires_at: None,
                            created_by: ctx.user_id,
                        },
                    )
                    .await?;

                    let near_expiration_lot = if record.near_expiration_alert
                        && !near_expiration_before
                    {
                        first_near_expiration_lot(&lots, near_expiration_days, today)
                    } else {
                        None
                    };

                    Ok(MovementEffects {
                        balances: record.balances(),
                        sku: record.effective_sku().to_string(),
                        low_stock_crossed: record.low_stock_alert && !low_stock_before,
                        near_expiration_lot,
                        movement_type,
                        quantity: ledger_quantity,
                    })
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        self.emit_movement_events(record_id, &effects).await;

        Ok(effects.balances)
    }

    /// Absolute correction from a physical count. A zero-delta adjustment
    /// is legal and still ledgered, so a reason can be recorded without a
    /// quantity change.
    #[instrument(skip(self, input), fields(record_id = %input.record_id))]
    pub async fn adjust(
        &self,
        ctx: &TenantContext,
        input: AdjustInput,
    ) -> Result<Balances, ServiceError> {
        input.validate()?;
        self.apply_movement(
            ctx,
            MovementInput {
                record_id: input.record_id,
                movement: StockMovement::Adjustment {
                    new_total_quantity: input.new_total_quantity,
                    new_cost_price: input.new_cost_price,
                },
                reason: input.reason,
                reference: None,
                order_id: None,
                supplier_id: None,
            },
        )
        .await
    }

    /// Applies many absolute corrections in one transaction. Records that
    /// cannot be found are skipped and reported, matching how a bulk count
    /// sheet is applied in practice.
    #[instrument(skip(self, items))]
    pub async fn bulk_adjust(
        &self,
        ctx: &TenantContext,
        items: Vec<BulkAdjustItem>,
        reason: String,
    ) -> Result<BulkAdjustOutcome, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::Validation("a reason is required".to_string()));
        }
        if items.is_empty() {
            return Err(ServiceError::Validation(
                "bulk adjustment requires at least one item".to_string(),
            ));
        }
        for item in &items {
            if item.new_total_quantity < Decimal::ZERO {
                return Err(ServiceError::Validation(format!(
                    "new total quantity for {} must not be negative",
                    item.product_sku
                )));
            }
        }

        let ctx = *ctx;
        let near_expiration_days = self.config.near_expiration_days;

        let outcome = self
            .db
            .transaction::<_, BulkAdjustOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut adjusted = 0u64;
                    let mut skipped_skus = Vec::new();
                    let today = Utc::now().date_naive();

                    for item in items {
                        let found = find_record_for_mutation_by_sku(
                            txn,
                            ctx.tenant_id,
                            &item.product_sku,
                            item.variant_sku.as_deref(),
                        )
                        .await;
                        let mut record = match found {
                            Ok(record) => record,
                            Err(ServiceError::NotFound(_)) => {
                                warn!(sku = %item.product_sku, "skipping unknown sku in bulk adjustment");
                                skipped_skus.push(item.product_sku);
                                continue;
                            }
                            Err(other) => return Err(other),
                        };

                        let delta =
                            record.apply_absolute_adjustment(item.new_total_quantity)?;
                        let lots = load_lots(txn, record.id).await?;
                        record.refresh_alert_flags(&lots, near_expiration_days, today);
                        let record = save_record_versioned(txn, record).await?;

                        append(
                            txn,
                            NewMovement {
                                record: &record,
                                movement_type: MovementType::Adjustment,
                                quantity: delta.abs(),
                                unit_cost: record.average_cost_price,
                                lot_number: None,
                                reason: reason.clone(),
                                reference: None,
                                order_id: None,
                                supplier_id: None,
                                expires_at: None,
                                created_by: ctx.user_id,
                            },
                        )
                        .await?;
                        adjusted += 1;
                    }

                    Ok(BulkAdjustOutcome {
                        adjusted,
                        skipped_skus,
                    })
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(
            adjusted = outcome.adjusted,
            skipped = outcome.skipped_skus.len(),
            "bulk adjustment applied"
        );

        Ok(outcome)
    }

    /// Read one record by id within the tenant's scope.
    #[instrument(skip(self))]
    pub async fn get_record(
        &self,
        ctx: &TenantContext,
        record_id: Uuid,
    ) -> Result<Option<inventory_record::Model>, ServiceError> {
        Ok(inventory_record::Entity::find_by_id(record_id)
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .one(&*self.db)
            .await?)
    }

    /// Read one record by sku within the tenant's scope.
    #[instrument(skip(self))]
    pub async fn find_by_sku(
        &self,
        ctx: &TenantContext,
        product_sku: &str,
        variant_sku: Option<&str>,
    ) -> Result<Option<inventory_record::Model>, ServiceError> {
        let mut query = inventory_record::Entity::find()
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_record::Column::ProductSku.eq(product_sku));
        query = match variant_sku {
            Some(variant) => query.filter(inventory_record::Column::VariantSku.eq(variant)),
            None => query.filter(inventory_record::Column::VariantSku.is_null()),
        };
        Ok(query.one(&*self.db).await?)
    }

    /// Lots of a record in insertion order.
    #[instrument(skip(self))]
    pub async fn get_lots(
        &self,
        ctx: &TenantContext,
        record_id: Uuid,
    ) -> Result<Vec<inventory_lot::Model>, ServiceError> {
        // scope check before exposing lots
        find_record_for_mutation_by_id(&*self.db, ctx.tenant_id, record_id).await?;
        load_lots(&*self.db, record_id).await
    }

    /// Deactivates a record. Records are never hard-deleted; history stays
    /// reconstructable from the ledger.
    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        ctx: &TenantContext,
        record_id: Uuid,
    ) -> Result<(), ServiceError> {
        let ctx = *ctx;
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut record =
                        find_record_for_mutation_by_id(txn, ctx.tenant_id, record_id).await?;
                    record.is_active = false;
                    save_record_versioned(txn, record).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_transaction_error)
    }

    async fn emit_movement_events(&self, record_id: Uuid, effects: &MovementEffects) {
        self.event_sender
            .send_or_log(Event::MovementRecorded {
                record_id,
                movement_type: effects.movement_type.as_str().to_string(),
                quantity: effects.quantity,
            })
            .await;

        if effects.low_stock_crossed {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    record_id,
                    product_sku: effects.sku.clone(),
                    available: effects.balances.available_quantity,
                })
                .await;
        }

        if let Some(lot_number) = &effects.near_expiration_lot {
            self.event_sender
                .send_or_log(Event::NearExpirationDetected {
                    record_id,
                    product_sku: effects.sku.clone(),
                    lot_number: lot_number.clone(),
                })
                .await;
        }
    }
}

fn validate_create_input(input: &CreateInventoryInput) -> Result<(), ServiceError> {
    if input.initial_quantity < Decimal::ZERO {
        return Err(ServiceError::Validation(
            "initial quantity must not be negative".to_string(),
        ));
    }
    if input.unit_cost < Decimal::ZERO {
        return Err(ServiceError::Validation(
            "unit cost must not be negative".to_string(),
        ));
    }
    let mut lot_total = Decimal::ZERO;
    for lot in &input.lots {
        lot.validate()?;
        if lot.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "lot {} quantity must be positive",
                lot.lot_number
            )));
        }
        if lot.cost_price < Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "lot {} cost must not be negative",
                lot.lot_number
            )));
        }
        validate_lot_dates(&lot.lot_number, lot.expiration_date, lot.manufacturing_date)?;
        lot_total += lot.quantity;
    }
    if !input.lots.is_empty() && lot_total != input.initial_quantity {
        return Err(ServiceError::Validation(format!(
            "lot quantities sum to {} but initial quantity is {}",
            lot_total, input.initial_quantity
        )));
    }
    Ok(())
}

fn validate_movement(movement: &StockMovement) -> Result<(), ServiceError> {
    match movement {
        StockMovement::In {
            quantity,
            unit_cost,
            lot,
        } => {
            require_positive_quantity(*quantity)?;
            if *unit_cost < Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "unit cost must not be negative".to_string(),
                ));
            }
            if let Some(lot) = lot {
                lot.validate()?;
                validate_lot_dates(&lot.lot_number, lot.expiration_date, lot.manufacturing_date)?;
            }
            Ok(())
        }
        StockMovement::Out { quantity, .. } => require_positive_quantity(*quantity),
        StockMovement::Adjustment {
            new_total_quantity, ..
        } => {
            if *new_total_quantity < Decimal::ZERO {
                return Err(ServiceError::Validation(
                    "new total quantity must not be negative".to_string(),
                ));
            }
            Ok(())
        }
        StockMovement::Transfer { quantity, .. } => require_positive_quantity(*quantity),
    }
}

fn require_positive_quantity(quantity: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::Validation(
            "quantity must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_lot_dates(
    lot_number: &str,
    expiration: Option<NaiveDate>,
    manufacturing: Option<NaiveDate>,
) -> Result<(), ServiceError> {
    if let (Some(expiration), Some(manufacturing)) = (expiration, manufacturing) {
        if expiration <= manufacturing {
            return Err(ServiceError::Validation(format!(
                "lot {lot_number}: expiration date must be after manufacturing date"
            )));
        }
    }
    Ok(())
}

fn first_near_expiration_lot(
    lots: &[inventory_lot::Model],
    near_expiration_days: i64,
    today: NaiveDate,
) -> Option<String> {
    let horizon = today + chrono::Duration::days(near_expiration_days);
    lots.iter()
        .find(|lot| {
            lot.available_quantity > Decimal::ZERO
                && lot
                    .expiration_date
                    .map_or(false, |exp| exp >= today && exp <= horizon)
        })
        .map(|lot| lot.lot_number.clone())
}

fn new_lot_active(lot: &inventory_lot::Model) -> inventory_lot::ActiveModel {
    inventory_lot::ActiveModel {
        id: ActiveValue::NotSet,
        record_id: Set(lot.record_id),
        tenant_id: Set(lot.tenant_id),
        lot_number: Set(lot.lot_number.clone()),
        quantity: Set(lot.quantity),
        original_quantity: Set(lot.original_quantity),
        available_quantity: Set(lot.available_quantity),
        reserved_quantity: Set(lot.reserved_quantity),
        cost_price: Set(lot.cost_price),
        received_date: Set(lot.received_date),
        expiration_date: Set(lot.expiration_date),
        manufacturing_date: Set(lot.manufacturing_date),
        supplier_id: Set(lot.supplier_id),
        status: Set(lot.status.clone()),
        created_by: Set(lot.created_by),
        created_at: Set(lot.created_at),
        updated_at: Set(lot.updated_at),
    }
}

pub(crate) fn unwrap_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::Database(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
