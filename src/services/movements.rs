use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::inventory_movement::{self, MovementType};
use crate::entities::inventory_record;
use crate::errors::ServiceError;
use crate::services::{validate_pagination, Page, TenantContext};

/// Draft of a ledger entry. The record is passed in its post-mutation state
/// so the balance snapshot captures quantities at the instant the entry is
/// written.
pub(crate) struct NewMovement<'a> {
    pub record: &'a inventory_record::Model,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub lot_number: Option<String>,
    pub reason: String,
    pub reference: Option<String>,
    pub order_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

/// Appends one entry inside the caller's transaction. This is the only
/// write path into the ledger; no update or delete exists.
pub(crate) async fn append<C: ConnectionTrait>(
    conn: &C,
    movement: NewMovement<'_>,
) -> Result<inventory_movement::Model, ServiceError> {
    let record = movement.record;
    let entry = inventory_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        record_id: Set(record.id),
        tenant_id: Set(record.tenant_id),
        product_id: Set(record.product_id),
        product_sku: Set(record.effective_sku().to_string()),
        lot_number: Set(movement.lot_number),
        movement_type: Set(movement.movement_type.as_str().to_string()),
        quantity: Set(movement.quantity),
        unit_cost: Set(movement.unit_cost),
        total_cost: Set(movement.quantity * movement.unit_cost),
        reason: Set(movement.reason),
        reference: Set(movement.reference),
        order_id: Set(movement.order_id),
        supplier_id: Set(movement.supplier_id),
        balance_total: Set(record.total_quantity),
        balance_available: Set(record.available_quantity),
        balance_reserved: Set(record.reserved_quantity),
        balance_average_cost: Set(record.average_cost_price),
        expires_at: Set(movement.expires_at),
        created_by: Set(movement.created_by),
        created_at: Set(Utc::now()),
    };

    Ok(entry.insert(conn).await?)
}

/// Filters for ledger queries. All optional; absent filters match everything
/// in the tenant's scope.
#[derive(Debug, Clone)]
pub struct MovementQuery {
    pub record_id: Option<Uuid>,
    pub product_sku: Option<String>,
    pub movement_type: Option<MovementType>,
    pub order_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: u64,
    pub limit: u64,
}

impl Default for MovementQuery {
    fn default() -> Self {
        Self {
            record_id: None,
            product_sku: None,
            movement_type: None,
            order_id: None,
            date_from: None,
            date_to: None,
            page: 1,
            limit: 20,
        }
    }
}

/// Read side of the movement ledger.
#[derive(Clone)]
pub struct MovementLedgerService {
    db: Arc<DatabaseConnection>,
}

impl MovementLedgerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists ledger entries, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        ctx: &TenantContext,
        query: MovementQuery,
    ) -> Result<Page<inventory_movement::Model>, ServiceError> {
        validate_pagination(query.page, query.limit)?;

        let mut select = inventory_movement::Entity::find()
            .filter(inventory_movement::Column::TenantId.eq(ctx.tenant_id));

        if let Some(record_id) = query.record_id {
            select = select.filter(inventory_movement::Column::RecordId.eq(record_id));
        }
        if let Some(sku) = &query.product_sku {
            select = select.filter(inventory_movement::Column::ProductSku.eq(sku.clone()));
        }
        if let Some(movement_type) = query.movement_type {
            select = select
                .filter(inventory_movement::Column::MovementType.eq(movement_type.as_str()));
        }
        if let Some(order_id) = query.order_id {
            select = select.filter(inventory_movement::Column::OrderId.eq(order_id));
        }
        if let Some(from) = query.date_from {
            select = select.filter(inventory_movement::Column::CreatedAt.gte(from));
        }
        if let Some(to) = query.date_to {
            select = select.filter(inventory_movement::Column::CreatedAt.lte(to));
        }

        let select = select
            .order_by_desc(inventory_movement::Column::CreatedAt)
            .order_by_desc(inventory_movement::Column::Id);

        let paginator = select.paginate(&*self.db, query.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page - 1).await?;

        Ok(Page::new(items, query.page, query.limit, total))
    }
}
