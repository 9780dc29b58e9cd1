//! Run metrics derived from the shipment log and the final network state.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Profit | Σ quantity × relation distance (tonne-km) |
//! | Satisfaction | Σ delivered / Σ annual demand |
//! | Destination satisfaction | delivered / annual demand, per destination |
//! | Origin usage | 1 − current stock / initial stock, per origin |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::shipment::{ShipmentPhase, ShipmentRecord};
use crate::units::{Km, Tons};

/// Delivery progress of one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationSatisfaction {
    pub id: String,
    pub annual_demand_tons: Tons,
    pub delivered_tons: Tons,
    pub q_min_target_tons: Tons,
    pub q_min_delivered_tons: Tons,
    /// `delivered / annual_demand`, 0 when the destination demands nothing.
    pub satisfaction_rate: f64,
}

/// Stock drawdown of one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginUsage {
    pub id: String,
    pub initial_tons: Tons,
    pub remaining_tons: Tons,
    /// `1 - remaining / initial`, 0 when the origin started empty.
    pub usage_rate: f64,
}

/// Aggregate indicators of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub profit_tonne_km: f64,
    /// Fraction of total annual demand delivered (0.0..1.0). A network that
    /// demands nothing counts as fully satisfied.
    pub satisfaction_rate: f64,
    pub total_shipped_tons: Tons,
    pub total_annual_demand_tons: Tons,
    pub unmet_demand_tons: Tons,
    pub shipment_count: usize,
    /// Sum of wagons over all shipments.
    pub wagon_trips: u64,
    pub seeding_tons: Tons,
    pub destinations: Vec<DestinationSatisfaction>,
    pub origins: Vec<OriginUsage>,
}

impl RunMetrics {
    pub fn calculate(network: &Network, shipments: &[ShipmentRecord]) -> Self {
        let total_annual_demand_tons = network.total_annual_demand_tons();
        let total_delivered = network.total_delivered_tons();

        let destinations = network
            .destinations()
            .map(|(_, d)| DestinationSatisfaction {
                id: d.id.clone(),
                annual_demand_tons: d.annual_demand_tons,
                delivered_tons: d.delivered_so_far_tons(),
                q_min_target_tons: d.q_min_initial_target_tons(),
                q_min_delivered_tons: d.q_min_initial_delivered_tons(),
                satisfaction_rate: ratio_or_zero(d.delivered_so_far_tons(), d.annual_demand_tons),
            })
            .collect();
        let origins = network
            .origins()
            .map(|(_, o)| OriginUsage {
                id: o.id.clone(),
                initial_tons: o.initial_available_product_tons,
                remaining_tons: o.current_available_product_tons(),
                usage_rate: if o.initial_available_product_tons > 0.0 {
                    1.0 - o.current_available_product_tons() / o.initial_available_product_tons
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            profit_tonne_km: profit_tonne_km(network, shipments),
            satisfaction_rate: satisfaction_rate(total_delivered, total_annual_demand_tons),
            total_shipped_tons: shipments.iter().map(|s| s.quantity_tons).sum(),
            total_annual_demand_tons,
            unmet_demand_tons: network
                .destinations()
                .map(|(_, d)| d.remaining_annual_demand_tons())
                .sum(),
            shipment_count: shipments.len(),
            wagon_trips: shipments.iter().map(|s| u64::from(s.wagons_used)).sum(),
            seeding_tons: shipments
                .iter()
                .filter(|s| s.phase == ShipmentPhase::QminSeeding)
                .map(|s| s.quantity_tons)
                .sum(),
            destinations,
            origins,
        }
    }
}

/// Tonne-km over the log, joined to relation distances by id pair. A pair
/// with no relation contributes 0 km.
pub fn profit_tonne_km(network: &Network, shipments: &[ShipmentRecord]) -> f64 {
    let mut distances: HashMap<(&str, &str), Km> = HashMap::new();
    for (_, rel) in network.relations() {
        if let (Some(o), Some(d)) = (network.origin(rel.origin), network.destination(rel.destination)) {
            distances.insert((o.id.as_str(), d.id.as_str()), rel.distance_km);
        }
    }
    shipments
        .iter()
        .map(|s| {
            let km = distances
                .get(&(s.origin.as_str(), s.destination.as_str()))
                .copied()
                .unwrap_or(0.0);
            s.quantity_tons * km
        })
        .sum()
}

/// `delivered / demand`, or 1.0 when there is no demand at all.
pub fn satisfaction_rate(delivered: Tons, demand: Tons) -> f64 {
    if demand > 0.0 { delivered / demand } else { 1.0 }
}

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
