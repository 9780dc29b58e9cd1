//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::network::{DestinationInput, Network, NetworkInput, OriginInput, RelationInput};
use crate::units::{Km, Tons};

// ===========================================================================
// Row constructors
// ===========================================================================

pub fn origin(id: &str, daily_loading_capacity_tons: Tons, stock_tons: Tons) -> OriginInput {
    OriginInput {
        id: id.to_string(),
        daily_loading_capacity_tons,
        initial_available_product_tons: stock_tons,
    }
}

pub fn destination(id: &str, daily_unloading_capacity_tons: Tons, annual_demand_tons: Tons) -> DestinationInput {
    DestinationInput {
        id: id.to_string(),
        daily_unloading_capacity_tons,
        annual_demand_tons,
    }
}

pub fn relation(origin: &str, destination: &str, distance_km: Km, profitable: bool) -> RelationInput {
    RelationInput {
        origin: origin.to_string(),
        destination: destination.to_string(),
        distance_km,
        profitable,
    }
}

/// Build a network from input that is known to be valid.
pub fn network(input: NetworkInput) -> Network {
    match Network::from_input(&input) {
        Ok(network) => network,
        Err(err) => panic!("test network is invalid: {err}"),
    }
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

/// One origin (1000 t, 200 t/day), one destination (500 t, 200 t/day),
/// 100 km apart on a profitable relation.
pub fn scenario_a_input() -> NetworkInput {
    NetworkInput {
        origins: vec![origin("O1", 200.0, 1_000.0)],
        destinations: vec![destination("D1", 200.0, 500.0)],
        relations: vec![relation("O1", "D1", 100.0, true)],
    }
}

pub fn scenario_a_network() -> Network {
    network(scenario_a_input())
}

/// Scenario A plus a destination no relation reaches.
pub fn scenario_d_input() -> NetworkInput {
    let mut input = scenario_a_input();
    input.destinations.push(destination("ISLAND", 100.0, 800.0));
    input
}

/// Two mines competing for two customers: a far, profitable port and a near
/// plant, with one unprofitable link that only seeding uses.
pub fn two_by_two_input() -> NetworkInput {
    NetworkInput {
        origins: vec![origin("MINE-N", 300.0, 4_000.0), origin("MINE-S", 250.0, 2_500.0)],
        destinations: vec![
            destination("PORT", 350.0, 3_000.0),
            destination("PLANT", 200.0, 1_500.0),
        ],
        relations: vec![
            relation("MINE-N", "PORT", 620.0, true),
            relation("MINE-S", "PORT", 410.0, true),
            relation("MINE-N", "PLANT", 180.0, true),
            relation("MINE-S", "PLANT", 90.0, false),
        ],
    }
}

// ===========================================================================
// Synthetic networks
// ===========================================================================

/// A dense `origins × destinations` network with deterministic, varied
/// capacities and distances. Every third relation is unprofitable.
pub fn synthetic_input(origins: usize, destinations: usize) -> NetworkInput {
    let origin_rows = (0..origins)
        .map(|i| {
            origin(
                &format!("O{i}"),
                150.0 + 40.0 * (i % 5) as f64,
                5_000.0 + 1_500.0 * (i % 7) as f64,
            )
        })
        .collect();
    let destination_rows = (0..destinations)
        .map(|j| {
            destination(
                &format!("D{j}"),
                120.0 + 30.0 * (j % 4) as f64,
                2_000.0 + 900.0 * (j % 6) as f64,
            )
        })
        .collect();
    let mut relation_rows = Vec::with_capacity(origins * destinations);
    for i in 0..origins {
        for j in 0..destinations {
            let k = i * destinations + j;
            relation_rows.push(relation(
                &format!("O{i}"),
                &format!("D{j}"),
                60.0 + ((k * 137) % 900) as f64,
                k % 3 != 2,
            ));
        }
    }
    NetworkInput {
        origins: origin_rows,
        destinations: destination_rows,
        relations: relation_rows,
    }
}

pub fn synthetic_network(origins: usize, destinations: usize) -> Network {
    network(synthetic_input(origins, destinations))
}
