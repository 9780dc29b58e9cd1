//! Day-1 Q_min seeding.
//!
//! Before the first daily pass, each destination is pushed towards its Q_min
//! target (a fraction of annual demand). Destinations are visited in the
//! policy's seeding order; for each one, every relation ending there is tried
//! richest origin first, profitable or not.

use tracing::debug;

use crate::network::RelationOrder;
use crate::ordering::OrderingPolicy;
use crate::shipment::ShipmentPhase;
use crate::sim::{DailyBudgets, SimState};
use crate::units::{Tons, is_negligible};

/// What the seeding pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeedingSummary {
    pub shipments: u32,
    pub shipped_tons: Tons,
    /// Destinations whose target was met.
    pub destinations_met: u32,
    /// Destinations left short of their target.
    pub destinations_short: u32,
}

/// Run the seeding pass on the current day, drawing on `budgets`.
pub fn seed_q_min(
    state: &mut SimState,
    policy: &OrderingPolicy,
    budgets: &mut DailyBudgets,
) -> SeedingSummary {
    let eps = state.epsilon;
    let mut summary = SeedingSummary::default();

    for dest_key in policy.seeding_order(&state.network) {
        let Some(dest) = state.network.destination(dest_key) else {
            continue;
        };
        let mut needed = dest.q_min_outstanding_tons();
        if is_negligible(needed, eps) {
            continue;
        }

        let relations = state
            .network
            .relations_to(dest_key, RelationOrder::OriginStockDescending);
        for rel_key in relations {
            if is_negligible(needed, eps) {
                break;
            }
            let Some(rel) = state.network.relation(rel_key).copied() else {
                continue;
            };
            let stock = state
                .network
                .origin(rel.origin)
                .map_or(0.0, |o| o.current_available_product_tons());
            if is_negligible(budgets.origin(rel.origin), eps)
                || is_negligible(budgets.destination(dest_key), eps)
                || is_negligible(stock, eps)
            {
                continue;
            }

            let outcome =
                state.attempt_on_relation(rel_key, needed, budgets, ShipmentPhase::QminSeeding);
            if outcome.is_shipped() {
                needed -= outcome.quantity();
                summary.shipments += 1;
                summary.shipped_tons += outcome.quantity();
            }
        }

        if is_negligible(needed, eps) {
            summary.destinations_met += 1;
        } else {
            summary.destinations_short += 1;
        }
    }

    debug!(
        day = state.day,
        shipments = summary.shipments,
        tons = summary.shipped_tons,
        met = summary.destinations_met,
        short = summary.destinations_short,
        "q_min seeding done"
    );
    summary
}
