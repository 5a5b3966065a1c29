use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// A received batch of stock belonging to one inventory record.
///
/// `quantity` is the batch's current quantity and decays as stock is
/// consumed; `original_quantity` keeps the amount received, so
/// consumed = original - current. Rows are never deleted: a fully consumed
/// lot stays with quantity zero and status `depleted`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_lots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub record_id: Uuid,
    pub tenant_id: Uuid,
    pub lot_number: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub original_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub available_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reserved_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_price: Decimal,
    pub received_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_record::Entity",
        from = "Column::RecordId",
        to = "super::inventory_record::Column::Id"
    )]
    InventoryRecord,
}

impl Related<super::inventory_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle of a lot. Stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotStatus {
    Available,
    Reserved,
    Expired,
    Depleted,
    Quarantined,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Available => "available",
            LotStatus::Reserved => "reserved",
            LotStatus::Expired => "expired",
            LotStatus::Depleted => "depleted",
            LotStatus::Quarantined => "quarantined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(LotStatus::Available),
            "reserved" => Some(LotStatus::Reserved),
            "expired" => Some(LotStatus::Expired),
            "depleted" => Some(LotStatus::Depleted),
            "quarantined" => Some(LotStatus::Quarantined),
            _ => None,
        }
    }
}

/// Candidate set for allocation: available status with stock on hand,
/// in insertion order (the FEFO tie-break order).
pub fn find_available(lots: &[Model]) -> Vec<&Model> {
    lots.iter()
        .filter(|lot| {
            lot.status == LotStatus::Available.as_str() && lot.available_quantity > Decimal::ZERO
        })
        .collect()
}

impl Model {
    fn arithmetic_error(&self, op: &str, quantity: Decimal) -> ServiceError {
        ServiceError::Validation(format!(
            "lot {}: cannot {op} {quantity} (quantity {}, available {}, reserved {})",
            self.lot_number, self.quantity, self.available_quantity, self.reserved_quantity
        ))
    }

    pub fn decrement_available(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        if self.available_quantity < quantity {
            return Err(self.arithmetic_error("decrement available by", quantity));
        }
        self.available_quantity -= quantity;
        Ok(())
    }

    pub fn increment_available(&mut self, quantity: Decimal) {
        self.available_quantity += quantity;
    }

    pub fn move_available_to_reserved(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        self.decrement_available(quantity)?;
        self.reserved_quantity += quantity;
        Ok(())
    }

    pub fn move_reserved_to_available(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        if self.reserved_quantity < quantity {
            return Err(self.arithmetic_error("unreserve", quantity));
        }
        self.reserved_quantity -= quantity;
        self.available_quantity += quantity;
        Ok(())
    }

    /// Consumption: the stock leaves the batch entirely.
    pub fn consume(&mut self, quantity: Decimal) -> Result<(), ServiceError> {
        self.decrement_available(quantity)?;
        self.quantity -= quantity;
        Ok(())
    }

    /// `available + reserved <= quantity` must hold at rest.
    pub fn invariant_holds(&self) -> bool {
        self.available_quantity + self.reserved_quantity <= self.quantity
            && self.available_quantity >= Decimal::ZERO
            && self.reserved_quantity >= Decimal::ZERO
            && self.quantity >= Decimal::ZERO
            && self.quantity <= self.original_quantity
    }

    /// Derives the status from current quantities and the calendar.
    /// Quarantine is a manual state and is never left automatically.
    pub fn refresh_status(&mut self, today: NaiveDate) {
        if self.status == LotStatus::Quarantined.as_str() {
            return;
        }
        let next = if self.quantity <= Decimal::ZERO {
            LotStatus::Depleted
        } else if self.expiration_date.map_or(false, |exp| exp < today) {
            LotStatus::Expired
        } else if self.available_quantity <= Decimal::ZERO
            && self.reserved_quantity > Decimal::ZERO
        {
            LotStatus::Reserved
        } else {
            LotStatus::Available
        };
        self.status = next.as_str().to_string();
    }
}
