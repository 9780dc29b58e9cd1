//! The daily allocation loop shared by every heuristic.
//!
//! A [`Simulation`] owns a validated network and a config. Each call to
//! [`run`](Simulation::run) works on a fresh copy of the network, so one
//! `Simulation` can be run any number of times, from any number of threads.
//!
//! Per day, in order:
//!
//! 1. Returning wagons are released.
//! 2. Daily loading/unloading budgets reset to the static caps.
//! 3. On day 1 only, the Q_min seeding pass runs.
//! 4. Profitable relations are visited in the policy's order and each gets a
//!    greedy shipment attempt for everything it could still use.
//! 5. The day's fleet line is logged.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SeedingBudget, SimConfig};
use crate::error::ConfigError;
use crate::fleet::FleetDayRecord;
use crate::network::{Network, NetworkInput};
use crate::ordering::OrderingPolicy;
use crate::report::RunResult;
use crate::seeding::seed_q_min;
use crate::shipment::ShipmentPhase;
use crate::sim::{DailyBudgets, SimState};
use crate::units::Day;

// ---------------------------------------------------------------------------
// Stop reason
// ---------------------------------------------------------------------------

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every day of the horizon was simulated.
    HorizonReached,
    /// A day shipped nothing with the whole fleet at home; no later day can
    /// ship anything either.
    Exhausted,
    /// The cancel flag was raised. The snapshot covers the days completed.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Simulation {
    network: Network,
    config: SimConfig,
    policy: OrderingPolicy,
}

impl Simulation {
    /// Validate `config` and take a private copy of `network`.
    pub fn new(network: &Network, config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = config.heuristic.policy();
        Ok(Self {
            network: network.clone(),
            config,
            policy,
        })
    }

    /// Validate and build both network and simulation in one step.
    pub fn from_input(input: &NetworkInput, config: SimConfig) -> Result<Self, ConfigError> {
        let network = Network::from_input(input)?;
        Self::new(&network, config)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn policy(&self) -> &OrderingPolicy {
        &self.policy
    }

    /// Run to the horizon or until nothing more can move.
    pub fn run(&self) -> RunResult {
        self.run_until(&AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), checking `cancel` before every day.
    pub fn run_until(&self, cancel: &AtomicBool) -> RunResult {
        let config = &self.config;
        let mut state = SimState::new(self.network.clone(), config);
        info!(
            heuristic = config.heuristic.name(),
            fleet = config.fleet_size,
            horizon = config.horizon_days,
            origins = state.network.origin_count(),
            destinations = state.network.destination_count(),
            relations = state.network.relation_count(),
            "simulation started"
        );

        let mut stop_reason = StopReason::HorizonReached;
        let mut terminal_day: Day = 0;

        for day in 1..=config.horizon_days {
            if cancel.load(Ordering::Relaxed) {
                stop_reason = StopReason::Cancelled;
                break;
            }
            let record = self.step_day(&mut state, day);
            terminal_day = day;

            let exhausted = record.shipments == 0 && record.in_transit_end_of_day == 0;
            state.fleet_log.push(record);
            if config.stop_when_exhausted && exhausted {
                stop_reason = StopReason::Exhausted;
                break;
            }
        }

        let result = RunResult::from_state(state, config, terminal_day, stop_reason);
        info!(
            heuristic = %result.heuristic,
            terminal_day,
            stop = ?stop_reason,
            profit_tonne_km = result.metrics.profit_tonne_km,
            satisfaction = result.metrics.satisfaction_rate,
            "simulation finished"
        );
        result
    }

    /// Simulate one day and return its fleet log line.
    fn step_day(&self, state: &mut SimState, day: Day) -> FleetDayRecord {
        state.day = day;
        let released = state.fleet.advance_day(day);
        let idle_after_release = state.fleet.idle();
        let log_start = state.shipments.len();

        let mut budgets = DailyBudgets::from_caps(&state.network);
        if day == 1 {
            match self.config.seeding_budget {
                SeedingBudget::Independent => {
                    let mut seeding_budgets = DailyBudgets::from_caps(&state.network);
                    seed_q_min(state, &self.policy, &mut seeding_budgets);
                }
                SeedingBudget::SharedWithDayOne => {
                    seed_q_min(state, &self.policy, &mut budgets);
                }
            }
        }

        for rel_key in self.policy.daily_relations(&state.network) {
            let Some(rel) = state.network.relation(rel_key).copied() else {
                continue;
            };
            let remaining = state
                .network
                .destination(rel.destination)
                .map_or(0.0, |d| d.remaining_annual_demand_tons());
            let stock = state
                .network
                .origin(rel.origin)
                .map_or(0.0, |o| o.current_available_product_tons());
            state.attempt_on_relation(rel_key, remaining.min(stock), &mut budgets, ShipmentPhase::Daily);
        }

        let today = &state.shipments[log_start..];
        let record = FleetDayRecord {
            day,
            released,
            idle_after_release,
            idle_end_of_day: state.fleet.idle(),
            in_transit_end_of_day: state.fleet.in_transit_wagons(),
            shipments: today.len() as u32,
            shipped_tons: today.iter().map(|s| s.quantity_tons).sum(),
        };
        debug!(
            day,
            released,
            shipments = record.shipments,
            tons = record.shipped_tons,
            idle = record.idle_end_of_day,
            in_transit = record.in_transit_end_of_day,
            "day complete"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::Heuristic;
    use crate::test_utils::*;

    fn scenario_a(config: SimConfig) -> RunResult {
        Simulation::new(&scenario_a_network(), config).unwrap().run()
    }

    #[test]
    fn scenario_a_meets_demand_and_returns_the_fleet() {
        let result = scenario_a(SimConfig::default().with_fleet_size(10));

        let d1 = &result.destinations[0];
        assert!(d1.remaining_annual_demand_tons.abs() < 1e-9);
        let last_delivery = result.shipments.iter().map(|s| s.ship_day).max().unwrap();
        assert!(last_delivery <= 3);

        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert!(result.terminal_day <= 5);
        assert_eq!(result.fleet.idle, 10);
        assert!(result.fleet.in_transit.is_empty());
    }

    #[test]
    fn scenario_a_day_one_shipments() {
        let result = scenario_a(SimConfig::default().with_fleet_size(10));
        let day_one: Vec<_> = result.shipments.iter().filter(|s| s.ship_day == 1).collect();
        assert_eq!(day_one.len(), 2);
        assert_eq!(day_one[0].phase, ShipmentPhase::QminSeeding);
        assert!((day_one[0].quantity_tons - 100.0).abs() < 1e-9);
        assert_eq!(day_one[1].phase, ShipmentPhase::Daily);
        assert!((day_one[1].quantity_tons - 200.0).abs() < 1e-9);
    }

    #[test]
    fn shared_seeding_budget_limits_day_one() {
        let config = SimConfig::default()
            .with_fleet_size(10)
            .with_seeding_budget(SeedingBudget::SharedWithDayOne);
        let result = scenario_a(config);
        let day_one: f64 = result
            .shipments
            .iter()
            .filter(|s| s.ship_day == 1)
            .map(|s| s.quantity_tons)
            .sum();
        assert!((day_one - 200.0).abs() < 1e-9);
    }

    #[test]
    fn without_early_stop_runs_the_whole_horizon() {
        let config = SimConfig::default()
            .with_fleet_size(10)
            .with_horizon(12)
            .without_early_stop();
        let result = scenario_a(config);
        assert_eq!(result.terminal_day, 12);
        assert_eq!(result.stop_reason, StopReason::HorizonReached);
        assert_eq!(result.fleet_log.len(), 12);
    }

    #[test]
    fn fleet_log_tracks_release_and_dispatch() {
        let result = scenario_a(SimConfig::default().with_fleet_size(10));
        let log = &result.fleet_log;
        assert_eq!(log[0].day, 1);
        assert_eq!(log[0].released, 0);
        assert_eq!(log[0].idle_end_of_day, 4);
        assert_eq!(log[0].in_transit_end_of_day, 6);
        assert_eq!(log[2].released, 6);
        for line in log {
            assert_eq!(line.idle_end_of_day + line.in_transit_end_of_day, 10);
        }
    }

    #[test]
    fn unreturnable_trip_keeps_wagons_out_until_the_horizon() {
        let mut input = scenario_a_input();
        input.relations[0].distance_km = 1e12;
        let config = SimConfig::default().with_fleet_size(10).with_horizon(10);
        let result = Simulation::new(&network(input), config).unwrap().run();

        assert_eq!(result.shipments.len(), 3);
        assert!(result.shipments.iter().all(|s| s.arrival_day == Day::MAX));
        assert_eq!(result.stop_reason, StopReason::HorizonReached);
        assert_eq!(result.terminal_day, 10);
        assert_eq!(result.fleet.idle, 0);
        assert!(result.fleet.in_transit.iter().all(|r| r.return_day == Day::MAX));
    }

    #[test]
    fn cancelled_before_start_returns_empty_snapshot() {
        let sim = Simulation::new(&scenario_a_network(), SimConfig::default()).unwrap();
        let cancel = AtomicBool::new(true);
        let result = sim.run_until(&cancel);
        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.terminal_day, 0);
        assert!(result.shipments.is_empty());
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let err = Simulation::new(&scenario_a_network(), SimConfig::default().with_horizon(0));
        assert!(matches!(err, Err(ConfigError::ZeroHorizon)));
    }

    #[test]
    fn runs_are_repeatable_from_one_simulation() {
        let sim = Simulation::new(
            &scenario_a_network(),
            SimConfig::default().with_heuristic(Heuristic::h2(["D1"])),
        )
        .unwrap();
        let a = sim.run();
        let b = sim.run();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.shipments, b.shipments);
    }
}
