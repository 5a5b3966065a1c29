//! First-Expired-First-Out lot selection.
//!
//! Planning is a pure function over the candidate lots: it never mutates
//! anything. The Coordinator and Reservation Manager apply the returned
//! plan to lot and record state inside their own transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::inventory_lot;
use crate::errors::ServiceError;

/// How much to take from one lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotAllocation {
    pub lot_number: String,
    pub quantity: Decimal,
}

/// Chooses which lots satisfy `requested`, oldest expiration first.
///
/// Lots without an expiration date sort last (they never expire). Lots with
/// identical expiration dates are consumed in the order given, which is the
/// Lot Store's insertion order — deterministic, so exact allocations can be
/// asserted.
///
/// Fails with `InsufficientStock` (carrying the shortfall) when the
/// candidates cannot cover the request.
pub fn plan(
    sku: &str,
    requested: Decimal,
    candidates: &[&inventory_lot::Model],
) -> Result<Vec<LotAllocation>, ServiceError> {
    if requested <= Decimal::ZERO {
        return Err(ServiceError::Validation(format!(
            "allocation for {sku} requires a positive quantity, got {requested}"
        )));
    }

    let total_available: Decimal = candidates.iter().map(|lot| lot.available_quantity).sum();
    if total_available < requested {
        return Err(ServiceError::InsufficientStock {
            sku: sku.to_string(),
            requested,
            available: total_available,
        });
    }

    let mut ordered: Vec<&inventory_lot::Model> = candidates.to_vec();
    // Stable sort: equal expirations keep insertion order.
    ordered.sort_by_key(|lot| (lot.expiration_date.is_none(), lot.expiration_date));

    let mut allocations = Vec::new();
    let mut remaining = requested;
    for lot in ordered {
        if remaining == Decimal::ZERO {
            break;
        }
        let take = remaining.min(lot.available_quantity);
        if take > Decimal::ZERO {
            allocations.push(LotAllocation {
                lot_number: lot.lot_number.clone(),
                quantity: take,
            });
            remaining -= take;
        }
    }

    debug_assert_eq!(remaining, Decimal::ZERO);
    Ok(allocations)
}
