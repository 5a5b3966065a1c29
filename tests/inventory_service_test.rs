mod common;

use assert_matches::assert_matches;
use common::TestCore;
use freshledger::entities::inventory_movement::MovementType;
use freshledger::errors::ServiceError;
use freshledger::services::inventory::{
    AdjustInput, BulkAdjustItem, MovementInput, NewLotInput, StockMovement, TransferDirection,
};
use freshledger::services::movements::MovementQuery;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn movement(record_id: Uuid, movement: StockMovement, reason: &str) -> MovementInput {
    MovementInput {
        record_id,
        movement,
        reason: reason.to_string(),
        reference: None,
        order_id: None,
        supplier_id: None,
    }
}

#[tokio::test]
async fn create_registers_initial_stock_and_ledger_entry() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-CREATE", dec!(25), dec!(3)).await;

    assert_eq!(record.total_quantity, dec!(25));
    assert_eq!(record.available_quantity, dec!(25));
    assert_eq!(record.reserved_quantity, dec!(0));
    assert_eq!(record.average_cost_price, dec!(3));
    assert_eq!(record.last_cost_price, dec!(3));
    assert!(record.is_active);

    let page = t
        .core
        .movements
        .list_movements(
            &t.ctx,
            MovementQuery {
                record_id: Some(record.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let entry = &page.items[0];
    assert_eq!(entry.movement_type, "in");
    assert_eq!(entry.quantity, dec!(25));
    assert_eq!(entry.balance_total, dec!(25));
    assert_eq!(entry.balance_available, dec!(25));
    assert_eq!(entry.balance_reserved, dec!(0));
}

#[tokio::test]
async fn create_with_zero_quantity_writes_no_ledger_entry() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-EMPTY", dec!(0), dec!(0)).await;

    let page = t
        .core
        .movements
        .list_movements(
            &t.ctx,
            MovementQuery {
                record_id: Some(record.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn duplicate_create_is_rejected() {
    let t = TestCore::new().await;
    t.seed_record("SKU-DUP", dec!(5), dec!(1)).await;

    let result = t
        .core
        .inventory
        .create_inventory(
            &t.ctx,
            freshledger::services::inventory::CreateInventoryInput {
                product_id: Uuid::new_v4(),
                product_sku: "SKU-DUP".to_string(),
                product_name: "Duplicate".to_string(),
                variant_sku: None,
                initial_quantity: dec!(1),
                unit_cost: dec!(1),
                lots: Vec::new(),
                reorder_point: None,
                max_stock_level: None,
                warehouse: None,
            },
        )
        .await;

    assert_matches!(result, Err(ServiceError::DuplicateRecord(_)));
}

#[tokio::test]
async fn in_movement_recomputes_weighted_average_cost() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-AVG", dec!(100), dec!(10)).await;

    let balances = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::In {
                    quantity: dec!(50),
                    unit_cost: dec!(16),
                    lot: None,
                },
                "Supplier delivery",
            ),
        )
        .await
        .unwrap();

    assert_eq!(balances.total_quantity, dec!(150));
    assert_eq!(balances.available_quantity, dec!(150));
    // (100*10 + 50*16) / 150
    assert_eq!(balances.average_cost_price, dec!(12));
    assert_eq!(balances.last_cost_price, dec!(16));
}

#[tokio::test]
async fn out_movement_fails_on_insufficient_stock_without_mutation() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-OUT", dec!(10), dec!(2)).await;

    let err = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(11),
                    lot_number: None,
                },
                "Oversell attempt",
            ),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock { .. });
    assert_eq!(err.shortfall(), Some(dec!(1)));

    let unchanged = t
        .core
        .inventory
        .get_record(&t.ctx, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.total_quantity, dec!(10));
    assert_eq!(unchanged.available_quantity, dec!(10));

    // and the failed attempt left no ledger entry
    let page = t
        .core
        .movements
        .list_movements(
            &t.ctx,
            MovementQuery {
                record_id: Some(record.id),
                movement_type: Some(MovementType::Out),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn out_movement_keeps_cost_basis() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-OUT2", dec!(10), dec!(4)).await;

    let balances = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(3),
                    lot_number: None,
                },
                "Sold",
            ),
        )
        .await
        .unwrap();

    assert_eq!(balances.total_quantity, dec!(7));
    assert_eq!(balances.average_cost_price, dec!(4));
}

#[tokio::test]
async fn adjustment_applies_delta_and_zero_delta_is_ledgered() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-ADJ", dec!(50), dec!(2)).await;

    let balances = t
        .core
        .inventory
        .adjust(
            &t.ctx,
            AdjustInput {
                record_id: record.id,
                new_total_quantity: dec!(45),
                reason: "Physical count".to_string(),
                new_cost_price: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(balances.total_quantity, dec!(45));
    assert_eq!(balances.available_quantity, dec!(45));

    // zero-delta: records the reason without changing quantities
    let balances = t
        .core
        .inventory
        .adjust(
            &t.ctx,
            AdjustInput {
                record_id: record.id,
                new_total_quantity: dec!(45),
                reason: "Recount confirmed".to_string(),
                new_cost_price: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(balances.total_quantity, dec!(45));

    let page = t
        .core
        .movements
        .list_movements(
            &t.ctx,
            MovementQuery {
                record_id: Some(record.id),
                movement_type: Some(MovementType::Adjustment),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().any(|e| e.quantity == dec!(0)));
    assert!(page.items.iter().any(|e| e.quantity == dec!(5)));
}

#[tokio::test]
async fn adjustment_can_overwrite_cost_prices() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-COST", dec!(10), dec!(2)).await;

    let balances = t
        .core
        .inventory
        .adjust(
            &t.ctx,
            AdjustInput {
                record_id: record.id,
                new_total_quantity: dec!(10),
                reason: "Cost correction".to_string(),
                new_cost_price: Some(dec!(9)),
            },
        )
        .await
        .unwrap();
    assert_eq!(balances.average_cost_price, dec!(9));
    assert_eq!(balances.last_cost_price, dec!(9));
}

#[tokio::test]
async fn in_movement_with_lot_creates_batch_and_out_consumes_it() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-LOT", dec!(0), dec!(0)).await;
    let expiration = chrono::Utc::now().date_naive() + chrono::Duration::days(30);

    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::In {
                    quantity: dec!(12),
                    unit_cost: dec!(2),
                    lot: Some(NewLotInput {
                        lot_number: "B-001".to_string(),
                        expiration_date: Some(expiration),
                        manufacturing_date: None,
                    }),
                },
                "Goods receipt",
            ),
        )
        .await
        .unwrap();

    let lots = t.core.inventory.get_lots(&t.ctx, record.id).await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].lot_number, "B-001");
    assert_eq!(lots[0].quantity, dec!(12));
    assert_eq!(lots[0].available_quantity, dec!(12));
    assert_eq!(lots[0].status, "available");

    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(12),
                    lot_number: Some("B-001".to_string()),
                },
                "Sold out batch",
            ),
        )
        .await
        .unwrap();

    let lots = t.core.inventory.get_lots(&t.ctx, record.id).await.unwrap();
    assert_eq!(lots[0].quantity, dec!(0));
    assert_eq!(lots[0].original_quantity, dec!(12));
    assert_eq!(lots[0].status, "depleted");
}

#[tokio::test]
async fn duplicate_lot_number_on_receipt_is_rejected() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-LOTDUP", dec!(0), dec!(0)).await;

    let receipt = |qty| {
        movement(
            record.id,
            StockMovement::In {
                quantity: qty,
                unit_cost: dec!(1),
                lot: Some(NewLotInput {
                    lot_number: "B-1".to_string(),
                    expiration_date: None,
                    manufacturing_date: None,
                }),
            },
            "Goods receipt",
        )
    };

    t.core
        .inventory
        .apply_movement(&t.ctx, receipt(dec!(5)))
        .await
        .unwrap();
    let result = t.core.inventory.apply_movement(&t.ctx, receipt(dec!(5))).await;
    assert_matches!(result, Err(ServiceError::Validation(_)));
}

#[tokio::test]
async fn transfer_halves_move_stock_between_records() {
    let t = TestCore::new().await;
    let source = t.seed_record("SKU-TRF-A", dec!(30), dec!(5)).await;
    let target = t.seed_record("SKU-TRF-B", dec!(0), dec!(0)).await;
    let reference = Some("TRF-42".to_string());

    let out = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            MovementInput {
                record_id: source.id,
                movement: StockMovement::Transfer {
                    quantity: dec!(10),
                    direction: TransferDirection::Outbound,
                    unit_cost: None,
                },
                reason: "Transfer to second warehouse".to_string(),
                reference: reference.clone(),
                order_id: None,
                supplier_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(out.total_quantity, dec!(20));

    let inb = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            MovementInput {
                record_id: target.id,
                movement: StockMovement::Transfer {
                    quantity: dec!(10),
                    direction: TransferDirection::Inbound,
                    unit_cost: Some(dec!(5)),
                },
                reason: "Transfer from first warehouse".to_string(),
                reference,
                order_id: None,
                supplier_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(inb.total_quantity, dec!(10));
    assert_eq!(inb.average_cost_price, dec!(5));

    let page = t
        .core
        .movements
        .list_movements(
            &t.ctx,
            MovementQuery {
                movement_type: Some(MovementType::Transfer),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page
        .items
        .iter()
        .all(|e| e.reference.as_deref() == Some("TRF-42")));
}

#[tokio::test]
async fn bulk_adjust_skips_unknown_skus() {
    let t = TestCore::new().await;
    t.seed_record("SKU-BULK-1", dec!(10), dec!(1)).await;
    t.seed_record("SKU-BULK-2", dec!(10), dec!(1)).await;

    let outcome = t
        .core
        .inventory
        .bulk_adjust(
            &t.ctx,
            vec![
                BulkAdjustItem {
                    product_sku: "SKU-BULK-1".to_string(),
                    variant_sku: None,
                    new_total_quantity: dec!(7),
                },
                BulkAdjustItem {
                    product_sku: "SKU-MISSING".to_string(),
                    variant_sku: None,
                    new_total_quantity: dec!(3),
                },
                BulkAdjustItem {
                    product_sku: "SKU-BULK-2".to_string(),
                    variant_sku: None,
                    new_total_quantity: dec!(12),
                },
            ],
            "Stocktake".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.adjusted, 2);
    assert_eq!(outcome.skipped_skus, vec!["SKU-MISSING".to_string()]);

    let first = t
        .core
        .inventory
        .find_by_sku(&t.ctx, "SKU-BULK-1", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.total_quantity, dec!(7));
}

#[tokio::test]
async fn movements_require_positive_quantity_and_reason() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-VAL", dec!(10), dec!(1)).await;

    let result = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(0),
                    lot_number: None,
                },
                "Zero out",
            ),
        )
        .await;
    assert_matches!(result, Err(ServiceError::Validation(_)));

    let result = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::In {
                    quantity: dec!(1),
                    unit_cost: dec!(1),
                    lot: None,
                },
                "",
            ),
        )
        .await;
    assert_matches!(result, Err(ServiceError::Validation(_)));
}

#[tokio::test]
async fn tenant_scope_hides_foreign_records() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-TENANT", dec!(10), dec!(1)).await;
    let stranger = t.other_tenant();

    let result = t
        .core
        .inventory
        .apply_movement(
            &stranger,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(1),
                    lot_number: None,
                },
                "Cross-tenant out",
            ),
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    assert!(t
        .core
        .inventory
        .get_record(&stranger, record.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn deactivated_record_rejects_movements() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-DEACT", dec!(10), dec!(1)).await;

    t.core.inventory.deactivate(&t.ctx, record.id).await.unwrap();

    let result = t
        .core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(1),
                    lot_number: None,
                },
                "Out after deactivation",
            ),
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    // still readable: records are never hard-deleted
    let read = t
        .core
        .inventory
        .get_record(&t.ctx, record.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!read.is_active);
    assert_eq!(read.total_quantity, dec!(10));
}

#[tokio::test]
async fn record_invariant_holds_after_mixed_operations() {
    let t = TestCore::new().await;
    let record = t.seed_record("SKU-INV", dec!(0), dec!(0)).await;

    for (qty, cost) in [(dec!(10), dec!(2)), (dec!(5), dec!(4)), (dec!(20), dec!(1))] {
        t.core
            .inventory
            .apply_movement(
                &t.ctx,
                movement(
                    record.id,
                    StockMovement::In {
                        quantity: qty,
                        unit_cost: cost,
                        lot: None,
                    },
                    "Receipt",
                ),
            )
            .await
            .unwrap();
    }
    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(12),
                    lot_number: None,
                },
                "Issue",
            ),
        )
        .await
        .unwrap();

    let rec = t
        .core
        .inventory
        .get_record(&t.ctx, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        rec.total_quantity,
        rec.available_quantity + rec.reserved_quantity
    );
    assert_eq!(rec.total_quantity, dec!(23));
    assert!(rec.average_cost_price > Decimal::ZERO);
}
