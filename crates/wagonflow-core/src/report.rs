//! The run snapshot handed to callers.
//!
//! Everything here is plain serde data keyed by external ids. No slotmap key
//! or other engine-internal type crosses this boundary.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::StopReason;
use crate::fleet::{FleetDayRecord, FleetState};
use crate::metrics::RunMetrics;
use crate::shipment::ShipmentRecord;
use crate::sim::SimState;
use crate::units::{Day, Tons};

// ---------------------------------------------------------------------------
// Final node state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginState {
    pub id: String,
    pub daily_loading_capacity_tons: Tons,
    pub initial_available_product_tons: Tons,
    pub current_available_product_tons: Tons,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationState {
    pub id: String,
    pub daily_unloading_capacity_tons: Tons,
    pub annual_demand_tons: Tons,
    pub remaining_annual_demand_tons: Tons,
    pub delivered_so_far_tons: Tons,
    pub q_min_initial_target_tons: Tons,
    pub q_min_initial_delivered_tons: Tons,
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

/// Complete outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// `"H1"` or `"H2"`.
    pub heuristic: String,
    pub config: SimConfig,
    pub metrics: RunMetrics,
    pub shipments: Vec<ShipmentRecord>,
    pub origins: Vec<OriginState>,
    pub destinations: Vec<DestinationState>,
    pub fleet: FleetState,
    pub fleet_log: Vec<FleetDayRecord>,
    /// Last day simulated; 0 if the run was cancelled before day 1.
    pub terminal_day: Day,
    pub stop_reason: StopReason,
    /// FNV-1a hash of the log and final state.
    pub fingerprint: u64,
}

impl RunResult {
    pub(crate) fn from_state(
        state: SimState,
        config: &SimConfig,
        terminal_day: Day,
        stop_reason: StopReason,
    ) -> Self {
        let metrics = RunMetrics::calculate(&state.network, &state.shipments);
        let fingerprint = state.fingerprint();
        let origins = state
            .network
            .origins()
            .map(|(_, o)| OriginState {
                id: o.id.clone(),
                daily_loading_capacity_tons: o.daily_loading_capacity_tons,
                initial_available_product_tons: o.initial_available_product_tons,
                current_available_product_tons: o.current_available_product_tons(),
            })
            .collect();
        let destinations = state
            .network
            .destinations()
            .map(|(_, d)| DestinationState {
                id: d.id.clone(),
                daily_unloading_capacity_tons: d.daily_unloading_capacity_tons,
                annual_demand_tons: d.annual_demand_tons,
                remaining_annual_demand_tons: d.remaining_annual_demand_tons(),
                delivered_so_far_tons: d.delivered_so_far_tons(),
                q_min_initial_target_tons: d.q_min_initial_target_tons(),
                q_min_initial_delivered_tons: d.q_min_initial_delivered_tons(),
            })
            .collect();

        Self {
            heuristic: config.heuristic.name().to_string(),
            config: config.clone(),
            metrics,
            fleet: state.fleet.snapshot(),
            shipments: state.shipments,
            origins,
            destinations,
            fleet_log: state.fleet_log,
            terminal_day,
            stop_reason,
            fingerprint,
        }
    }

    pub fn destination(&self, id: &str) -> Option<&DestinationState> {
        self.destinations.iter().find(|d| d.id == id)
    }

    pub fn origin(&self, id: &str) -> Option<&OriginState> {
        self.origins.iter().find(|o| o.id == id)
    }

    /// Serialize the snapshot for a dashboard or a file.
    #[cfg(feature = "json")]
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Heuristic comparison
// ---------------------------------------------------------------------------

/// Headline numbers of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub heuristic: String,
    pub profit_tonne_km: f64,
    pub satisfaction_rate: f64,
    pub terminal_day: Day,
    pub total_shipped_tons: Tons,
}

impl From<&RunResult> for RunSummary {
    fn from(result: &RunResult) -> Self {
        Self {
            heuristic: result.heuristic.clone(),
            profit_tonne_km: result.metrics.profit_tonne_km,
            satisfaction_rate: result.metrics.satisfaction_rate,
            terminal_day: result.terminal_day,
            total_shipped_tons: result.metrics.total_shipped_tons,
        }
    }
}

/// Two runs side by side. Deltas are `challenger - baseline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicComparison {
    pub baseline: RunSummary,
    pub challenger: RunSummary,
    pub profit_delta: f64,
    pub satisfaction_delta: f64,
    pub terminal_day_delta: i64,
}

impl HeuristicComparison {
    pub fn compare(baseline: &RunResult, challenger: &RunResult) -> Self {
        let baseline = RunSummary::from(baseline);
        let challenger = RunSummary::from(challenger);
        Self {
            profit_delta: challenger.profit_tonne_km - baseline.profit_tonne_km,
            satisfaction_delta: challenger.satisfaction_rate - baseline.satisfaction_rate,
            terminal_day_delta: i64::from(challenger.terminal_day) - i64::from(baseline.terminal_day),
            baseline,
            challenger,
        }
    }

    /// The run with the higher tonne-km profit, or `None` on a tie.
    pub fn more_profitable(&self) -> Option<&RunSummary> {
        if self.profit_delta > 0.0 {
            Some(&self.challenger)
        } else if self.profit_delta < 0.0 {
            Some(&self.baseline)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Simulation;
    use crate::ordering::Heuristic;
    use crate::test_utils::*;

    fn run(config: SimConfig) -> RunResult {
        Simulation::new(&scenario_a_network(), config).unwrap().run()
    }

    #[test]
    fn snapshot_uses_external_ids() {
        let result = run(SimConfig::default().with_fleet_size(10));
        assert_eq!(result.heuristic, "H1");
        assert!(result.origin("O1").is_some());
        let d1 = result.destination("D1").unwrap();
        assert!((d1.delivered_so_far_tons - 500.0).abs() < 1e-9);
        assert!((d1.q_min_initial_delivered_tons - 100.0).abs() < 1e-9);
        assert!(result.destination("O1").is_none());
    }

    #[test]
    fn comparing_a_run_with_itself_is_a_tie() {
        let a = run(SimConfig::default());
        let cmp = HeuristicComparison::compare(&a, &a);
        assert_eq!(cmp.profit_delta, 0.0);
        assert_eq!(cmp.terminal_day_delta, 0);
        assert!(cmp.more_profitable().is_none());
    }

    #[test]
    fn comparison_labels_both_heuristics() {
        let h1 = run(SimConfig::default());
        let h2 = run(SimConfig::default().with_heuristic(Heuristic::h2(["D1"])));
        let cmp = HeuristicComparison::compare(&h1, &h2);
        assert_eq!(cmp.baseline.heuristic, "H1");
        assert_eq!(cmp.challenger.heuristic, "H2");
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_snapshot_round_trips() {
        let result = run(SimConfig::default());
        let json = result.to_json_pretty().unwrap();
        let back: RunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shipments.len(), result.shipments.len());
        assert_eq!(back.fingerprint, result.fingerprint);
        assert_eq!(back.stop_reason, result.stop_reason);
        assert_eq!(back.config.heuristic, result.config.heuristic);
    }
}
