use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Kinds of ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Transfer,
    Reservation,
    Release,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
            MovementType::Reservation => "reservation",
            MovementType::Release => "release",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "adjustment" => Some(MovementType::Adjustment),
            "transfer" => Some(MovementType::Transfer),
            "reservation" => Some(MovementType::Reservation),
            "release" => Some(MovementType::Release),
            _ => None,
        }
    }
}

/// One row per quantity change, written in the same transaction as the
/// record mutation it documents. The ledger is append-only: no update or
/// delete path exists anywhere in the crate, so history can always be
/// reconstructed from the `balance_*` snapshot columns.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub record_id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub product_sku: String,
    pub lot_number: Option<String>,
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: Decimal,
    pub reason: String,
    pub reference: Option<String>,
    pub order_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_available: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_reserved: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance_average_cost: Decimal,
    /// Advisory expiry hint, set on `reservation` entries only. The engine
    /// never acts on it by itself (see `sweep_expired_reservations`).
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
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

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}

impl Model {
    pub fn movement_type(&self) -> Option<MovementType> {
        MovementType::from_str(&self.movement_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips() {
        for ty in [
            MovementType::In,
            MovementType::Out,
            MovementType::Adjustment,
            MovementType::Transfer,
            MovementType::Reservation,
            MovementType::Release,
        ] {
            assert_eq!(MovementType::from_str(ty.as_str()), Some(ty));
        }
        assert_eq!(MovementType::from_str("void"), None);
    }
}
