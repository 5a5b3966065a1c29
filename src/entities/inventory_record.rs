use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// One inventory record per (tenant, product, variant-or-none). The record
/// is the aggregate root: its lots and ledger entries are only ever mutated
/// while the record itself is loaded inside one transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    pub variant_sku: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub available_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reserved_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub committed_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub average_cost_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub last_cost_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reorder_point: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub max_stock_level: Option<Decimal>,
    pub warehouse: Option<String>,
    pub low_stock_alert: bool,
    pub near_expiration_alert: bool,
    pub expired_alert: bool,
    pub overstock_alert: bool,
    pub is_active: bool,
    pub version: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_lot::Entity")]
    InventoryLots,
    #[sea_orm(has_many = "super::inventory_movement::Entity")]
    InventoryMovements,
}

impl Related<super::inventory_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLots.def()
    }
}

impl Related<super::inventory_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Point-in-time quantity/cost snapshot, written into every ledger entry
/// and returned from mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub total_quantity: Decimal,
    pub available_quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub committed_quantity: Decimal,
    pub average_cost_price: Decimal,
    pub last_cost_price: Decimal,
}

impl Model {
    /// The sku a human sees in errors and alerts: the variant sku when the
    /// record tracks a variant, the product sku otherwise.
    pub fn effective_sku(&self) -> &str {
        self.variant_sku.as_deref().unwrap_or(&self.product_sku)
    }

    pub fn balances(&self) -> Balances {
        Balances {
            total_quantity: self.total_quantity,
            available_quantity: self.available_quantity,
            reserved_quantity: self.reserved_quantity,
            committed_quantity: self.committed_quantity,
            average_cost_price: self.average_cost_price,
            last_cost_price: self.last_cost_price,
        }
    }

    /// `total == available + reserved` must hold at rest.
    pub fn invariant_holds(&self) -> bool {
        self.total_quantity == self.available_quantity + self.reserved_quantity
            && self.total_quantity >= Decimal::ZERO
            && self.available_quantity >= Decimal::ZERO
            && self.reserved_quantity >= Decimal::ZERO
    }

    pub fn ensure_available(&self, requested: Decimal) -> Result<(), ServiceError> {
        if self.available_quantity < requested {
            return Err(ServiceError::InsufficientStock {
                sku: self.effective_sku().to_string(),
                requested,
                available: self.available_quantity,
            });
        }
        Ok(())
    }

    /// Inbound stock: raises total and available, recomputes the average
    /// cost as a quantity-weighted moving average and records the last cost.
    pub fn receive(&mut self, quantity: Decimal, unit_cost: Decimal) {
        let old_value = self.total_quantity * self.average_cost_price;
        self.total_quantity += quantity;
        self.available_quantity += quantity;
        self.average_cost_price = if self.total_quantity > Decimal::ZERO {
            (old_value + quantity * unit_cost) / self.total_quantity
        } else {
            unit_cost
        };
        self.last_cost_price = unit_cost;
    }

    /// Outbound stock: lowers total and available. Cost basis is unchanged.
    pub fn issue(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        self.ensure_available(quantity)?;
        self.total_quantity -= quantity;
        self.available_quantity -= quantity;
        Ok(())
    }

    /// Moves quantity from available to reserved; total is unchanged.
    pub fn reserve(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        self.ensure_available(quantity)?;
        self.available_quantity -= quantity;
        self.reserved_quantity += quantity;
        Ok(())
    }

    /// Reverses a reservation: reserved back to available.
    pub fn release(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        if self.reserved_quantity < quantity {
            return Err(ServiceError::Validation(format!(
                "release of {} exceeds reserved quantity {} for {}",
                quantity,
                self.reserved_quantity,
                self.effective_sku()
            )));
        }
        self.reserved_quantity -= quantity;
        self.available_quantity += quantity;
        Ok(())
    }

    /// Absolute correction (physical count): sets the new total and applies
    /// the signed delta to available, leaving reserved untouched. Returns
    /// the delta. A zero delta is legal.
    pub fn apply_absolute_adjustment(&mut self, new_total: Decimal) -> Result<Decimal, ServiceError> {
        let delta = new_total - self.total_quantity;
        if delta < Decimal::ZERO && self.available_quantity < -delta {
            return Err(ServiceError::InsufficientStock {
                sku: self.effective_sku().to_string(),
                requested: -delta,
                available: self.available_quantity,
            });
        }
        self.total_quantity = new_total;
        self.available_quantity += delta;
        Ok(delta)
    }

    /// Recomputes the alert flags from current quantities and lot state.
    /// Called after every mutation so alert reads are always live.
    pub fn refresh_alert_flags(
        &mut self,
        lots: &[super::inventory_lot::Model],
        near_expiration_days: i64,
        today: NaiveDate,
    ) {
        self.low_stock_alert = self
            .reorder_point
            .map_or(false, |threshold| self.available_quantity <= threshold);
        self.overstock_alert = self
            .max_stock_level
            .map_or(false, |ceiling| self.total_quantity > ceiling);

        let horizon = today + Duration::days(near_expiration_days);
        let mut expired = false;
        let mut near = false;
        for lot in lots {
            if lot.available_quantity <= Decimal::ZERO {
                continue;
            }
            if let Some(expiration) = lot.expiration_date {
                if expiration < today {
                    expired = true;
                } else if expiration <= horizon {
                    near = true;
                }
            }
        }
        self.expired_alert = expired;
        self.near_expiration_alert = near;
    }
}
