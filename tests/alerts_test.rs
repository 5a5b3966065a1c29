mod common;

use chrono::{Duration, Utc};
use common::TestCore;
use freshledger::services::alerts::{InventoryQuery, InventorySort, SortOrder};
use freshledger::services::inventory::{
    CreateInventoryInput, MovementInput, StockMovement,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_with_reorder_point(
    t: &TestCore,
    sku: &str,
    quantity: rust_decimal::Decimal,
    reorder_point: rust_decimal::Decimal,
) -> freshledger::entities::inventory_record::Model {
    t.core
        .inventory
        .create_inventory(
            &t.ctx,
            CreateInventoryInput {
                product_id: Uuid::new_v4(),
                product_sku: sku.to_string(),
                product_name: format!("Product {sku}"),
                variant_sku: None,
                initial_quantity: quantity,
                unit_cost: dec!(2),
                lots: Vec::new(),
                reorder_point: Some(reorder_point),
                max_stock_level: None,
                warehouse: None,
            },
        )
        .await
        .unwrap()
}

fn movement(record_id: Uuid, movement: StockMovement) -> MovementInput {
    MovementInput {
        record_id,
        movement,
        reason: "Alert flow".to_string(),
        reference: None,
        order_id: None,
        supplier_id: None,
    }
}

#[tokio::test]
async fn low_stock_alert_flips_live_with_stock_level() {
    let t = TestCore::new().await;
    let record = seed_with_reorder_point(&t, "SKU-LOW", dec!(10), dec!(5)).await;

    // above threshold: not listed
    let alerts = t.core.alerts.get_low_stock_alerts(&t.ctx).await.unwrap();
    assert!(alerts.is_empty());

    // drop to the boundary: available (4) <= reorder point (5)
    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::Out {
                    quantity: dec!(6),
                    lot_number: None,
                },
            ),
        )
        .await
        .unwrap();

    let alerts = t.core.alerts.get_low_stock_alerts(&t.ctx).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, record.id);
    assert!(alerts[0].low_stock_alert);

    // restock: the flag flips off and the record disappears from the read
    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::In {
                    quantity: dec!(10),
                    unit_cost: dec!(2),
                    lot: None,
                },
            ),
        )
        .await
        .unwrap();

    let alerts = t.core.alerts.get_low_stock_alerts(&t.ctx).await.unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn overstock_flag_follows_max_stock_level() {
    let t = TestCore::new().await;
    let record = t
        .core
        .inventory
        .create_inventory(
            &t.ctx,
            CreateInventoryInput {
                product_id: Uuid::new_v4(),
                product_sku: "SKU-OVER".to_string(),
                product_name: "Overstocked".to_string(),
                variant_sku: None,
                initial_quantity: dec!(10),
                unit_cost: dec!(1),
                lots: Vec::new(),
                reorder_point: None,
                max_stock_level: Some(dec!(15)),
                warehouse: None,
            },
        )
        .await
        .unwrap();
    assert!(!record.overstock_alert);

    t.core
        .inventory
        .apply_movement(
            &t.ctx,
            movement(
                record.id,
                StockMovement::In {
                    quantity: dec!(10),
                    unit_cost: dec!(1),
                    lot: None,
                },
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
    assert!(rec.overstock_alert);
}

#[tokio::test]
async fn expiration_alerts_report_records_with_lots_inside_the_horizon() {
    let t = TestCore::new().await;
    let today = Utc::now().date_naive();
    let near = t
        .seed_perishable(
            "SKU-NEAR",
            dec!(1),
            &[("L1", dec!(5), Some(today + Duration::days(3)))],
        )
        .await;
    t.seed_perishable(
        "SKU-FAR",
        dec!(1),
        &[("L1", dec!(5), Some(today + Duration::days(60)))],
    )
    .await;

    let alerts = t.core.alerts.get_expiration_alerts(&t.ctx, 7).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, near.id);

    // a wider horizon catches both
    let alerts = t
        .core
        .alerts
        .get_expiration_alerts(&t.ctx, 90)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 2);
}

#[tokio::test]
async fn near_expiration_flag_is_set_from_creation() {
    let t = TestCore::new().await;
    let today = Utc::now().date_naive();
    let record = t
        .seed_perishable(
            "SKU-FLAG",
            dec!(1),
            &[("L1", dec!(5), Some(today + Duration::days(3)))],
        )
        .await;
    // within the default 7-day horizon
    assert!(record.near_expiration_alert);
}

#[tokio::test]
async fn summary_counts_and_values_stock() {
    let t = TestCore::new().await;
    t.seed_record("SKU-SUM-1", dec!(10), dec!(2)).await; // value 20
    t.seed_record("SKU-SUM-2", dec!(5), dec!(4)).await; // value 20
    seed_with_reorder_point(&t, "SKU-SUM-3", dec!(2), dec!(5)).await; // low stock, value 4

    let summary = t.core.alerts.get_inventory_summary(&t.ctx).await.unwrap();
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.low_stock_count, 1);
    assert_eq!(summary.total_value, dec!(44));
}

#[tokio::test]
async fn listing_filters_and_sorts() {
    let t = TestCore::new().await;
    t.seed_record("APPLE-1", dec!(3), dec!(1)).await;
    t.seed_record("APPLE-2", dec!(9), dec!(1)).await;
    t.seed_record("PEAR-1", dec!(6), dec!(1)).await;

    let apples = t
        .core
        .alerts
        .list_inventory(
            &t.ctx,
            InventoryQuery {
                search: Some("APPLE".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(apples.total, 2);

    let plenty = t
        .core
        .alerts
        .list_inventory(
            &t.ctx,
            InventoryQuery {
                min_available: Some(dec!(5)),
                sort_by: InventorySort::AvailableQuantity,
                sort_order: SortOrder::Asc,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(plenty.total, 2);
    assert_eq!(plenty.items[0].product_sku, "PEAR-1");
    assert_eq!(plenty.items[1].product_sku, "APPLE-2");
}

#[tokio::test]
async fn alert_reads_are_tenant_scoped() {
    let t = TestCore::new().await;
    seed_with_reorder_point(&t, "SKU-TEN", dec!(1), dec!(5)).await;

    let alerts = t.core.alerts.get_low_stock_alerts(&t.ctx).await.unwrap();
    assert_eq!(alerts.len(), 1);

    let foreign = t
        .core
        .alerts
        .get_low_stock_alerts(&t.other_tenant())
        .await
        .unwrap();
    assert!(foreign.is_empty());
}
