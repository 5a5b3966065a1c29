use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::allocation::{self, LotAllocation};
use crate::config::AppConfig;
use crate::entities::inventory_lot::{self, find_available};
use crate::entities::inventory_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::inventory::unwrap_transaction_error;
use crate::services::movements::{append, NewMovement};
use crate::services::{
    find_record_for_mutation_by_id, find_record_for_mutation_by_sku, load_lots, save_lot,
    save_record_versioned, TenantContext,
};

/// One line of a reservation request.
#[derive(Debug, Clone)]
pub struct ReserveItem {
    pub product_sku: String,
    pub variant_sku: Option<String>,
    pub quantity: Decimal,
    /// Allocate specific lots oldest-expiration-first. On by default for
    /// perishable stock; records without lots reserve at record level only.
    pub use_fefo: bool,
}

#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub order_id: Uuid,
    pub items: Vec<ReserveItem>,
    /// Advisory expiry window; clamped to 1..=1440 minutes, configured
    /// default when absent.
    pub expiration_minutes: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ItemReservation {
    pub record_id: Uuid,
    pub product_sku: String,
    pub quantity: Decimal,
    pub allocations: Vec<LotAllocation>,
}

#[derive(Debug, Clone)]
pub struct ReservationOutcome {
    pub order_id: Uuid,
    pub items: Vec<ItemReservation>,
    /// Hint for collaborators: the engine itself never acts on it. An
    /// external scheduler calls `sweep_expired_reservations` to enforce it.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub order_id: Uuid,
    /// When present, only reservations for these skus are reversed.
    pub product_skus: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub order_id: Uuid,
    pub entries_reversed: u64,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub orders_swept: u64,
    pub entries_reversed: u64,
}

/// Orchestrates multi-item reservation and release tied to an external
/// order id. Each public call is one transaction: a failing item aborts the
/// whole call with no partial reservation across items.
#[derive(Clone)]
pub struct ReservationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl ReservationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Reserves stock for every item of the request, in caller-supplied
    /// order, all-or-nothing.
    #[instrument(skip(self, request), fields(order_id = %request.order_id, items = request.items.len()))]
    pub async fn reserve(
        &self,
        ctx: &TenantContext,
        request: ReserveRequest,
    ) -> Result<ReservationOutcome, ServiceError> {
        validate_reserve_request(&request)?;

        let ctx = *ctx;
        let order_id = request.order_id;
        let near_expiration_days = self.config.near_expiration_days;
        let minutes = self
            .config
            .effective_expiry_minutes(request.expiration_minutes);
        let expires_at = Utc::now() + Duration::minutes(i64::from(minutes));

        let items = self
            .db
            .transaction::<_, Vec<ItemReservation>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let today = Utc::now().date_naive();
                    let mut reserved_items = Vec::with_capacity(request.items.len());

                    for item in request.items {
                        let mut record = find_record_for_mutation_by_sku(
                            txn,
                            ctx.tenant_id,
                            &item.product_sku,
                            item.variant_sku.as_deref(),
                        )
                        .await?;
                        record.ensure_available(item.quantity)?;

                        let mut lots = load_lots(txn, record.id).await?;
                        for lot in &mut lots {
                            lot.refresh_status(today);
                        }

                        let allocations = if item.use_fefo && !lots.is_empty() {
                            let plan = {
                                let candidates = find_available(&lots);
                                allocation::plan(record.effective_sku(), item.quantity, &candidates)?
                            };
                            apply_reservation_plan(&mut lots, &plan, today)?;
                            plan
                        } else {
                            Vec::new()
                        };

                        record.reserve(item.quantity)?;
                        record.refresh_alert_flags(&lots, near_expiration_days, today);
                        let record = save_record_versioned(txn, record).await?;

                        let dirty: Vec<&inventory_lot::Model> = lots
                            .iter()
                            .filter(|lot| {
                                allocations.iter().any(|a| a.lot_number == lot.lot_number)
                            })
                            .collect();
                        for lot in dirty {
                            save_lot(txn, lot.clone()).await?;
                        }

                        if allocations.is_empty() {
                            append(
                                txn,
                                NewMovement {
                                    record: &record,
                                    movement_type: MovementType::Reservation,
                                    quantity: item.quantity,
                                    unit_cost: record.average_cost_price,
                                    lot_number: None,
                                    reason: "Reservation for order".to_string(),
                                    reference: Some(order_id.to_string()),
                                    order_id: Some(order_id),
                                    supplier_id: None,
                                    expires_at: Some(expires_at),
                                    created_by: ctx.user_id,
                                },
                            )
                            .await?;
                        } else {
                            for allocation in &allocations {
                                append(
                                    txn,
                                    NewMovement {
                                        record: &record,
                                        movement_type: MovementType::Reservation,
                                        quantity: allocation.quantity,
                                        unit_cost: record.average_cost_price,
                                        lot_number: Some(allocation.lot_number.clone()),
                                        reason: "Reservation for order".to_string(),
                                        reference: Some(order_id.to_string()),
                                        order_id: Some(order_id),
                                        supplier_id: None,
                                        expires_at: Some(expires_at),
                                        created_by: ctx.user_id,
                                    },
                                )
                                .await?;
                            }
                        }

                        reserved_items.push(ItemReservation {
                            record_id: record.id,
                            product_sku: record.effective_sku().to_string(),
                            quantity: item.quantity,
                            allocations,
                        });
                    }

                    Ok(reserved_items)
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(order_id = %order_id, items = items.len(), "stock reserved");

        self.event_sender
            .send_or_log(Event::StockReserved {
                order_id,
                items: items.len(),
                expires_at,
            })
            .await;

        Ok(ReservationOutcome {
            order_id,
            items,
            expires_at,
        })
    }

    /// Reverses every still-open reservation entry for the order, optionally
    /// restricted to a subset of skus. Releasing an order twice is a no-op
    /// the second time: it fails with `NothingToRelease` and leaves balances
    /// unchanged.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn release(
        &self,
        ctx: &TenantContext,
        request: ReleaseRequest,
    ) -> Result<ReleaseOutcome, ServiceError> {
        let ctx = *ctx;
        let order_id = request.order_id;
        let near_expiration_days = self.config.near_expiration_days;

        let entries_reversed = self
            .db
            .transaction::<_, u64, ServiceError>(move |txn| {
                Box::pin(async move {
                    release_order(txn, &ctx, order_id, request.product_skus.as_deref(), near_expiration_days)
                        .await
                })
            })
            .await
            .map_err(unwrap_transaction_error)?;

        info!(order_id = %order_id, entries_reversed, "reservations released");

        self.event_sender
            .send_or_log(Event::StockReleased {
                order_id,
                entries_reversed,
            })
            .await;

        Ok(ReleaseOutcome {
            order_id,
            entries_reversed,
        })
    }

    /// Releases every order whose open reservations are past their advisory
    /// `expires_at`. This is the explicit enforcement hook for the external
    /// scheduler collaborator; nothing inside the engine schedules it.
    #[instrument(skip(self))]
    pub async fn sweep_expired_reservations(
        &self,
        ctx: &TenantContext,
    ) -> Result<SweepOutcome, ServiceError> {
        let now = Utc::now();

        let expired = inventory_movement::Entity::find()
            .filter(inventory_movement::Column::TenantId.eq(ctx.tenant_id))
            .filter(
                inventory_movement::Column::MovementType.eq(MovementType::Reservation.as_str()),
            )
            .filter(inventory_movement::Column::ExpiresAt.lt(now))
            .order_by_asc(inventory_movement::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut order_ids: Vec<Uuid> = Vec::new();
        for entry in &expired {
            if let Some(order_id) = entry.order_id {
                if !order_ids.contains(&order_id) {
                    order_ids.push(order_id);
                }
            }
        }

        let mut orders_swept = 0u64;
        let mut entries_reversed = 0u64;
        for order_id in order_ids {
            match self
                .release(
                    ctx,
                    ReleaseRequest {
                        order_id,
                        product_skus: None,
                    },
                )
                .await
            {
                Ok(outcome) => {
                    orders_swept += 1;
                    entries_reversed += outcome.entries_reversed;
                }
                // already explicitly released; nothing open to sweep
                Err(ServiceError::NothingToRelease(_)) => {}
                Err(other) => return Err(other),
            }
        }

        info!(orders_swept, entries_reversed, "expired reservation sweep finished");

        self.event_sender
            .send_or_log(Event::ReservationSweepCompleted {
                orders_swept,
                entries_reversed,
            })
            .await;

        Ok(SweepOutcome {
            orders_swept,
            entries_reversed,
        })
    }
}

fn validate_reserve_request(request: &ReserveRequest) -> Result<(), ServiceError> {
    if request.items.is_empty() {
        return Err(ServiceError::Validation(
            "a reservation requires at least one item".to_string(),
        ));
    }
    for item in &request.items {
        if item.product_sku.trim().is_empty() {
            return Err(ServiceError::Validation(
                "item sku must not be empty".to_string(),
            ));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(format!(
                "quantity for {} must be positive",
                item.product_sku
            )));
        }
    }
    Ok(())
}

fn apply_reservation_plan(
    lots: &mut [inventory_lot::Model],
    plan: &[LotAllocation],
    today: chrono::NaiveDate,
) -> Result<(), ServiceError> {
    for allocation in plan {
        let lot = lots
            .iter_mut()
            .find(|lot| lot.lot_number == allocation.lot_number)
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "allocation refers to unknown lot {}",
                    allocation.lot_number
                ))
            })?;
        lot.move_available_to_reserved(allocation.quantity)?;
        lot.refresh_status(today);
    }
    Ok(())
}

/// Open reservation quantity per (record, lot), derived from the ledger.
struct OpenGroup {
    record_id: Uuid,
    lot_number: Option<String>,
    unit_cost: Decimal,
    open_quantity: Decimal,
}

async fn release_order(
    txn: &sea_orm::DatabaseTransaction,
    ctx: &TenantContext,
    order_id: Uuid,
    sku_filter: Option<&[String]>,
    near_expiration_days: i64,
) -> Result<u64, ServiceError> {
    let reservations = inventory_movement::Entity::find()
        .filter(inventory_movement::Column::TenantId.eq(ctx.tenant_id))
        .filter(inventory_movement::Column::OrderId.eq(order_id))
        .filter(inventory_movement::Column::MovementType.eq(MovementType::Reservation.as_str()))
        .order_by_asc(inventory_movement::Column::CreatedAt)
        .all(txn)
        .await?;

    if reservations.is_empty() {
        return Err(ServiceError::NothingToRelease(format!(
            "no reservations found for order {order_id}"
        )));
    }

    let releases = inventory_movement::Entity::find()
        .filter(inventory_movement::Column::TenantId.eq(ctx.tenant_id))
        .filter(inventory_movement::Column::OrderId.eq(order_id))
        .filter(inventory_movement::Column::MovementType.eq(MovementType::Release.as_str()))
        .all(txn)
        .await?;

    let mut released: HashMap<(Uuid, Option<String>), Decimal> = HashMap::new();
    for entry in &releases {
        *released
            .entry((entry.record_id, entry.lot_number.clone()))
            .or_default() += entry.quantity;
    }

    // Net out reservations against releases per (record, lot), keeping the
    // first-seen order so reversals are deterministic.
    let mut groups: Vec<OpenGroup> = Vec::new();
    for entry in &reservations {
        if let Some(filter) = sku_filter {
            if !filter.iter().any(|sku| sku == &entry.product_sku) {
                continue;
            }
        }
        let key = (entry.record_id, entry.lot_number.clone());
        if let Some(group) = groups
            .iter_mut()
            .find(|g| g.record_id == key.0 && g.lot_number == key.1)
        {
            group.open_quantity += entry.quantity;
        } else {
            groups.push(OpenGroup {
                record_id: entry.record_id,
                lot_number: entry.lot_number.clone(),
                unit_cost: entry.unit_cost,
                open_quantity: entry.quantity
                    - released.get(&key).copied().unwrap_or(Decimal::ZERO),
            });
        }
    }

    let today = Utc::now().date_naive();
    let mut entries_reversed = 0u64;

    for group in groups {
        if group.open_quantity <= Decimal::ZERO {
            continue;
        }

        let mut record =
            find_record_for_mutation_by_id(txn, ctx.tenant_id, group.record_id).await?;
        record.release(group.open_quantity)?;

        let mut lots = load_lots(txn, record.id).await?;
        if let Some(lot_number) = &group.lot_number {
            let lot = lots
                .iter_mut()
                .find(|lot| &lot.lot_number == lot_number)
                .ok_or_else(|| {
                    ServiceError::Internal(format!(
                        "reservation entry refers to unknown lot {lot_number}"
                    ))
                })?;
            lot.move_reserved_to_available(group.open_quantity)?;
            lot.refresh_status(today);
            let lot = lot.clone();
            save_lot(txn, lot).await?;
        }

        record.refresh_alert_flags(&lots, near_expiration_days, today);
        let record = save_record_versioned(txn, record).await?;

        append(
            txn,
            NewMovement {
                record: &record,
                movement_type: MovementType::Release,
                quantity: group.open_quantity,
                unit_cost: group.unit_cost,
                lot_number: group.lot_number.clone(),
                reason: "Reservation release".to_string(),
                reference: Some(order_id.to_string()),
                order_id: Some(order_id),
                supplier_id: None,
                expires_at: None,
                created_by: ctx.user_id,
            },
        )
        .await?;

        entries_reversed += 1;
    }

    if entries_reversed == 0 {
        return Err(ServiceError::NothingToRelease(format!(
            "no open reservations for order {order_id}"
        )));
    }

    Ok(entries_reversed)
}
