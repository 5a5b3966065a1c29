use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted by the engine after a transaction commits. Delivery is
/// best-effort and carries no transactional guarantees; collaborators that
/// need durable history read the movement ledger instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    InventoryCreated {
        record_id: Uuid,
        product_sku: String,
    },
    MovementRecorded {
        record_id: Uuid,
        movement_type: String,
        quantity: Decimal,
    },
    StockReserved {
        order_id: Uuid,
        items: usize,
        expires_at: DateTime<Utc>,
    },
    StockReleased {
        order_id: Uuid,
        entries_reversed: u64,
    },
    ReservationSweepCompleted {
        orders_swept: u64,
        entries_reversed: u64,
    },
    LowStockDetected {
        record_id: Uuid,
        product_sku: String,
        available: Decimal,
    },
    NearExpirationDetected {
        record_id: Uuid,
        product_sku: String,
        lot_number: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Used after commit, where the operation itself already succeeded.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!(error = %e, "event delivery failed");
        }
    }
}

/// Drains the event channel, logging each event as structured JSON.
/// Embedders that fan events out to their own consumers replace this task
/// with their own receiver.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(event = %payload, "event processed"),
            Err(e) => error!(error = %e, "failed to serialize event"),
        }
    }
}
