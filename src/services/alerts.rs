use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::entities::inventory_lot::{self, LotStatus};
use crate::entities::inventory_record;
use crate::errors::ServiceError;
use crate::services::{validate_pagination, Page, TenantContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySort {
    ProductName,
    AvailableQuantity,
    LastUpdated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filters for the inventory listing. Absent filters match everything in
/// the tenant's scope.
#[derive(Debug, Clone)]
pub struct InventoryQuery {
    pub search: Option<String>,
    pub warehouse: Option<String>,
    pub low_stock: Option<bool>,
    pub near_expiration: Option<bool>,
    pub expired: Option<bool>,
    pub min_available: Option<Decimal>,
    pub sort_by: InventorySort,
    pub sort_order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl Default for InventoryQuery {
    fn default() -> Self {
        Self {
            search: None,
            warehouse: None,
            low_stock: None,
            near_expiration: None,
            expired: None,
            min_available: None,
            sort_by: InventorySort::LastUpdated,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub total_records: u64,
    pub low_stock_count: u64,
    pub near_expiration_count: u64,
    pub total_value: Decimal,
}

/// Read-side queries over alert flags, expirations and stock value. All
/// reads are live against current record state; flags flip as part of each
/// mutating transaction, so no restart or cache invalidation is involved.
#[derive(Clone)]
pub struct AlertService {
    db: Arc<DatabaseConnection>,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records currently flagged low on stock.
    #[instrument(skip(self))]
    pub async fn get_low_stock_alerts(
        &self,
        ctx: &TenantContext,
    ) -> Result<Vec<inventory_record::Model>, ServiceError> {
        Ok(inventory_record::Entity::find()
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_record::Column::IsActive.eq(true))
            .filter(inventory_record::Column::LowStockAlert.eq(true))
            .order_by_asc(inventory_record::Column::ProductSku)
            .all(&*self.db)
            .await?)
    }

    /// Records holding an available lot that expires within `days` days.
    #[instrument(skip(self))]
    pub async fn get_expiration_alerts(
        &self,
        ctx: &TenantContext,
        days: i64,
    ) -> Result<Vec<inventory_record::Model>, ServiceError> {
        if days < 0 {
            return Err(ServiceError::Validation(
                "days must not be negative".to_string(),
            ));
        }
        let horizon = Utc::now().date_naive() + Duration::days(days);

        let lots = inventory_lot::Entity::find()
            .filter(inventory_lot::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_lot::Column::Status.eq(LotStatus::Available.as_str()))
            .filter(inventory_lot::Column::AvailableQuantity.gt(Decimal::ZERO))
            .filter(inventory_lot::Column::ExpirationDate.lte(horizon))
            .all(&*self.db)
            .await?;

        let mut record_ids: Vec<uuid::Uuid> = Vec::new();
        for lot in &lots {
            if !record_ids.contains(&lot.record_id) {
                record_ids.push(lot.record_id);
            }
        }
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(inventory_record::Entity::find()
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_record::Column::Id.is_in(record_ids))
            .order_by_asc(inventory_record::Column::ProductSku)
            .all(&*self.db)
            .await?)
    }

    /// Headline numbers for the tenant's stock position.
    #[instrument(skip(self))]
    pub async fn get_inventory_summary(
        &self,
        ctx: &TenantContext,
    ) -> Result<InventorySummary, ServiceError> {
        let records = inventory_record::Entity::find()
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_record::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let mut summary = InventorySummary {
            total_records: records.len() as u64,
            low_stock_count: 0,
            near_expiration_count: 0,
            total_value: Decimal::ZERO,
        };
        for record in &records {
            if record.low_stock_alert {
                summary.low_stock_count += 1;
            }
            if record.near_expiration_alert {
                summary.near_expiration_count += 1;
            }
            summary.total_value += record.total_quantity * record.average_cost_price;
        }

        Ok(summary)
    }

    /// Filtered, sorted, paginated listing of records.
    #[instrument(skip(self, query))]
    pub async fn list_inventory(
        &self,
        ctx: &TenantContext,
        query: InventoryQuery,
    ) -> Result<Page<inventory_record::Model>, ServiceError> {
        validate_pagination(query.page, query.limit)?;

        let mut select = inventory_record::Entity::find()
            .filter(inventory_record::Column::TenantId.eq(ctx.tenant_id))
            .filter(inventory_record::Column::IsActive.eq(true));

        if let Some(search) = &query.search {
            select = select.filter(
                Condition::any()
                    .add(inventory_record::Column::ProductSku.contains(search.as_str()))
                    .add(inventory_record::Column::ProductName.contains(search.as_str()))
                    .add(inventory_record::Column::VariantSku.contains(search.as_str())),
            );
        }
        if let Some(warehouse) = &query.warehouse {
            select = select.filter(inventory_record::Column::Warehouse.eq(warehouse.clone()));
        }
        if let Some(low_stock) = query.low_stock {
            select = select.filter(inventory_record::Column::LowStockAlert.eq(low_stock));
        }
        if let Some(near_expiration) = query.near_expiration {
            select =
                select.filter(inventory_record::Column::NearExpirationAlert.eq(near_expiration));
        }
        if let Some(expired) = query.expired {
            select = select.filter(inventory_record::Column::ExpiredAlert.eq(expired));
        }
        if let Some(min_available) = query.min_available {
            select =
                select.filter(inventory_record::Column::AvailableQuantity.gte(min_available));
        }

        let column = match query.sort_by {
            InventorySort::ProductName => inventory_record::Column::ProductName,
            InventorySort::AvailableQuantity => inventory_record::Column::AvailableQuantity,
            InventorySort::LastUpdated => inventory_record::Column::UpdatedAt,
        };
        let select = match query.sort_order {
            SortOrder::Asc => select.order_by_asc(column),
            SortOrder::Desc => select.order_by_desc(column),
        };

        let paginator = select.paginate(&*self.db, query.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(query.page - 1).await?;

        Ok(Page::new(items, query.page, query.limit, total))
    }
}
