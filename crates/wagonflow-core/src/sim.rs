//! Run-scoped simulation state.
//!
//! Everything a run mutates lives in one [`SimState`] that is passed
//! explicitly through seeding, the daily loop and the shipment processor.
//! Nothing is global, so independent runs never interfere.

use slotmap::SecondaryMap;

use crate::config::{SimConfig, WagonParams};
use crate::fleet::{FleetDayRecord, WagonFleet};
use crate::id::{DestinationKey, OriginKey};
use crate::network::Network;
use crate::shipment::{ShipmentPhase, ShipmentRecord, Shipped};
use crate::units::{Day, Tons};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable state of a single run.
#[derive(Debug, Clone)]
pub struct SimState {
    pub(crate) network: Network,
    pub(crate) fleet: WagonFleet,
    pub(crate) wagon: WagonParams,
    pub(crate) epsilon: f64,
    /// Current simulated day. Zero before day 1 starts.
    pub(crate) day: Day,
    pub(crate) shipments: Vec<ShipmentRecord>,
    pub(crate) fleet_log: Vec<FleetDayRecord>,
}

impl SimState {
    /// Fresh state over a private copy of `network`, with Q_min targets set
    /// from the config and every wagon idle.
    pub fn new(mut network: Network, config: &SimConfig) -> Self {
        network.set_q_min_fraction(config.q_min_fraction);
        Self {
            network,
            fleet: WagonFleet::new(config.fleet_size),
            wagon: config.wagon.clone(),
            epsilon: config.epsilon,
            day: 0,
            shipments: Vec::new(),
            fleet_log: Vec::new(),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn fleet(&self) -> &WagonFleet {
        &self.fleet
    }

    pub fn wagon(&self) -> &WagonParams {
        &self.wagon
    }

    pub fn day(&self) -> Day {
        self.day
    }

    /// Append-only shipment log.
    pub fn shipments(&self) -> &[ShipmentRecord] {
        &self.shipments
    }

    pub fn fleet_log(&self) -> &[FleetDayRecord] {
        &self.fleet_log
    }

    /// Deterministic hash of the shipment log and the final node and fleet
    /// state. Two runs agree on it iff they made the same moves.
    pub fn fingerprint(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u64(self.shipments.len() as u64);
        for s in &self.shipments {
            h.write_u32(s.ship_day);
            h.write_u32(s.arrival_day);
            h.write_str(&s.origin);
            h.write_str(&s.destination);
            h.write_f64(s.quantity_tons);
            h.write_u32(s.wagons_used);
            h.write_u8(match s.phase {
                ShipmentPhase::QminSeeding => 0,
                ShipmentPhase::Daily => 1,
            });
        }
        for (_, origin) in self.network.origins() {
            h.write_str(&origin.id);
            h.write_f64(origin.current_available_product_tons());
        }
        for (_, dest) in self.network.destinations() {
            h.write_str(&dest.id);
            h.write_f64(dest.remaining_annual_demand_tons());
            h.write_f64(dest.q_min_initial_delivered_tons());
        }
        h.write_u32(self.fleet.idle());
        for record in self.fleet.in_transit() {
            h.write_u32(record.return_day);
            h.write_u32(record.num_wagons);
        }
        h.finish()
    }
}

// ---------------------------------------------------------------------------
// Daily budgets
// ---------------------------------------------------------------------------

/// Per-day remaining loading and unloading throughput, owned by the phase
/// that issues shipments.
#[derive(Debug, Clone, Default)]
pub struct DailyBudgets {
    origins: SecondaryMap<OriginKey, Tons>,
    destinations: SecondaryMap<DestinationKey, Tons>,
}

impl DailyBudgets {
    /// Budgets reset to the static daily caps.
    pub fn from_caps(network: &Network) -> Self {
        let mut budgets = Self::default();
        for (key, origin) in network.origins() {
            budgets.origins.insert(key, origin.daily_loading_capacity_tons);
        }
        for (key, dest) in network.destinations() {
            budgets.destinations.insert(key, dest.daily_unloading_capacity_tons);
        }
        budgets
    }

    pub fn origin(&self, key: OriginKey) -> Tons {
        self.origins.get(key).copied().unwrap_or(0.0)
    }

    pub fn destination(&self, key: DestinationKey) -> Tons {
        self.destinations.get(key).copied().unwrap_or(0.0)
    }

    /// Store the remaining caps reported by a successful shipment.
    pub(crate) fn apply(&mut self, origin: OriginKey, destination: DestinationKey, shipped: &Shipped) {
        self.origins.insert(origin, shipped.origin_cap_remaining);
        self.destinations.insert(destination, shipped.dest_cap_remaining);
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Run fingerprint accumulator behind [`SimState::fingerprint`].
///
/// Folds the shipment log (days, endpoints, tonnage bits, wagons, phase) and
/// the end-of-run ledgers and fleet into one FNV-1a 64-bit value. Floats are
/// hashed by bit pattern, so two runs match only if every tonne matches
/// exactly. Not suitable as a cryptographic digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash {
    state: u64,
}

const FNV1A_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME: u64 = 0x0000_0100_0000_01b3;

impl StateHash {
    pub fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.state = bytes.iter().fold(self.state, |acc, &byte| {
            (acc ^ u64::from(byte)).wrapping_mul(FNV1A_PRIME)
        });
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Tonnage and distance go in by bit pattern.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Length-prefixed, so `("ab", "c")` and `("a", "bc")` differ.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub fn finish(self) -> u64 {
        self.state
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn new_state_starts_before_day_one() {
        let state = SimState::new(scenario_a_network(), &SimConfig::default().with_fleet_size(10));
        assert_eq!(state.day(), 0);
        assert!(state.shipments().is_empty());
        assert_eq!(state.fleet().idle(), 10);
        let dest = state.network().destination_by_id("D1").unwrap();
        assert!((dest.q_min_initial_target_tons() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn budgets_start_at_static_caps() {
        let net = scenario_a_network();
        let budgets = DailyBudgets::from_caps(&net);
        let o = net.origin_key("O1").unwrap();
        let d = net.destination_key("D1").unwrap();
        assert_eq!(budgets.origin(o), 200.0);
        assert_eq!(budgets.destination(d), 200.0);
    }

    #[test]
    fn identical_states_hash_equal() {
        let config = SimConfig::default();
        let a = SimState::new(scenario_a_network(), &config);
        let b = SimState::new(scenario_a_network(), &config);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn state_hash_matches_fnv1a_vectors() {
        assert_eq!(StateHash::new().finish(), 0xcbf2_9ce4_8422_2325);
        let mut h = StateHash::new();
        h.write_bytes(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn state_hash_sees_float_bits() {
        let mut h1 = StateHash::new();
        h1.write_f64(0.0);
        let mut h2 = StateHash::new();
        h2.write_f64(-0.0);
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_strings_are_length_prefixed() {
        let mut h1 = StateHash::new();
        h1.write_str("ab");
        h1.write_str("c");
        let mut h2 = StateHash::new();
        h2.write_str("a");
        h2.write_str("bc");
        assert_ne!(h1.finish(), h2.finish());
    }
}
