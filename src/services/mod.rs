use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{inventory_lot, inventory_record};
use crate::errors::ServiceError;

pub mod alerts;
pub mod inventory;
pub mod movements;
pub mod reservations;

/// Identity attached to every mutation for the audit trail, supplied by the
/// surrounding tenant/auth context (an external collaborator).
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

pub(crate) fn validate_pagination(page: u64, limit: u64) -> Result<(), ServiceError> {
    if page == 0 {
        return Err(ServiceError::Validation(
            "page number must be greater than 0".to_string(),
        ));
    }
    if limit == 0 || limit > 100 {
        return Err(ServiceError::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Loads a record for mutation inside the caller's transaction. Tenant
/// mismatch and deactivated records surface as `NotFound`.
pub(crate) async fn find_record_for_mutation_by_id<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    record_id: Uuid,
) -> Result<inventory_record::Model, ServiceError> {
    inventory_record::Entity::find_by_id(record_id)
        .filter(inventory_record::Column::TenantId.eq(tenant_id))
        .filter(inventory_record::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory record {record_id}")))
}

pub(crate) async fn find_record_for_mutation_by_sku<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    product_sku: &str,
    variant_sku: Option<&str>,
) -> Result<inventory_record::Model, ServiceError> {
    let mut query = inventory_record::Entity::find()
        .filter(inventory_record::Column::TenantId.eq(tenant_id))
        .filter(inventory_record::Column::ProductSku.eq(product_sku))
        .filter(inventory_record::Column::IsActive.eq(true));

    query = match variant_sku {
        Some(variant) => query.filter(inventory_record::Column::VariantSku.eq(variant)),
        None => query.filter(inventory_record::Column::VariantSku.is_null()),
    };

    query.one(conn).await?.ok_or_else(|| {
        ServiceError::NotFound(format!(
            "inventory record for sku {}",
            variant_sku.unwrap_or(product_sku)
        ))
    })
}

/// Persists a mutated record, guarding against a concurrent writer with the
/// optimistic version counter. The loser of a race sees `Conflict` and can
/// retry the original request: its transaction rolled back without effects.
pub(crate) async fn save_record_versioned<C: ConnectionTrait>(
    conn: &C,
    mut record: inventory_record::Model,
) -> Result<inventory_record::Model, ServiceError> {
    debug_assert!(record.invariant_holds());

    let expected_version = record.version;
    record.version += 1;
    record.updated_at = Utc::now();

    let active: inventory_record::ActiveModel = record.clone().into();
    let result = inventory_record::Entity::update_many()
        .set(active.reset_all())
        .filter(inventory_record::Column::Id.eq(record.id))
        .filter(inventory_record::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::Conflict(format!(
            "inventory record {} was modified concurrently",
            record.id
        )));
    }

    Ok(record)
}

/// All lots of a record in insertion order (the FEFO tie-break order).
pub(crate) async fn load_lots<C: ConnectionTrait>(
    conn: &C,
    record_id: Uuid,
) -> Result<Vec<inventory_lot::Model>, ServiceError> {
    Ok(inventory_lot::Entity::find()
        .filter(inventory_lot::Column::RecordId.eq(record_id))
        .order_by_asc(inventory_lot::Column::Id)
        .all(conn)
        .await?)
}

pub(crate) async fn save_lot<C: ConnectionTrait>(
    conn: &C,
    mut lot: inventory_lot::Model,
) -> Result<(), ServiceError> {
    debug_assert!(lot.invariant_holds());

    lot.updated_at = Utc::now();
    let id = lot.id;
    let active: inventory_lot::ActiveModel = lot.into();
    inventory_lot::Entity::update_many()
        .set(active.reset_all())
        .filter(inventory_lot::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}
