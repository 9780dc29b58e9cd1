//! Independent runs over one network: parameter sweeps and H1/H2 pairs.
//!
//! Every entry validates its own config and simulates on its own copy of the
//! network. A bad config yields an `Err` in its slot and the other entries
//! still run. With the `parallel` feature the entries run on the rayon pool;
//! results keep the input order either way.

use std::sync::atomic::AtomicBool;

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::warn;

use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::error::ConfigError;
use crate::network::Network;
use crate::report::{HeuristicComparison, RunResult};

/// Run every config against `network`.
pub fn run_batch(network: &Network, configs: &[SimConfig]) -> Vec<Result<RunResult, ConfigError>> {
    run_batch_until(network, configs, &AtomicBool::new(false))
}

/// Like [`run_batch`], sharing one cancel flag. Runs already in progress
/// stop at their next day boundary; runs not yet started return an empty
/// cancelled snapshot.
pub fn run_batch_until(
    network: &Network,
    configs: &[SimConfig],
    cancel: &AtomicBool,
) -> Vec<Result<RunResult, ConfigError>> {
    let run_one = |config: &SimConfig| {
        let result = Simulation::new(network, config.clone()).map(|sim| sim.run_until(cancel));
        if let Err(err) = &result {
            warn!(%err, "batch entry rejected");
        }
        result
    };

    #[cfg(feature = "parallel")]
    {
        configs.par_iter().map(run_one).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        configs.iter().map(run_one).collect()
    }
}

/// Run two configs, typically H1 and H2, and compare them. With the
/// `parallel` feature both runs proceed at once.
pub fn compare_heuristics(
    network: &Network,
    baseline: SimConfig,
    challenger: SimConfig,
) -> Result<(RunResult, RunResult, HeuristicComparison), ConfigError> {
    let baseline = Simulation::new(network, baseline)?;
    let challenger = Simulation::new(network, challenger)?;

    #[cfg(feature = "parallel")]
    let (a, b) = rayon::join(|| baseline.run(), || challenger.run());
    #[cfg(not(feature = "parallel"))]
    let (a, b) = (baseline.run(), challenger.run());

    let comparison = HeuristicComparison::compare(&a, &b);
    Ok((a, b, comparison))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StopReason;
    use crate::ordering::Heuristic;
    use crate::test_utils::*;

    #[test]
    fn bad_entry_does_not_poison_the_batch() {
        let net = scenario_a_network();
        let configs = vec![
            SimConfig::default().with_fleet_size(10),
            SimConfig::default().with_horizon(0),
            SimConfig::default().with_fleet_size(0),
        ];
        let results = run_batch(&net, &configs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err(), &ConfigError::ZeroHorizon);
        let empty_fleet = results[2].as_ref().unwrap();
        assert!(empty_fleet.shipments.is_empty());
    }

    #[test]
    fn batch_entries_match_solo_runs() {
        let net = scenario_a_network();
        let config = SimConfig::default().with_fleet_size(3);
        let solo = Simulation::new(&net, config.clone()).unwrap().run();
        let batch = run_batch(&net, &[config.clone(), config]);
        for entry in batch {
            assert_eq!(entry.unwrap().fingerprint, solo.fingerprint);
        }
    }

    #[test]
    fn raised_flag_cancels_every_entry() {
        let net = scenario_a_network();
        let cancel = AtomicBool::new(true);
        let results = run_batch_until(&net, &[SimConfig::default(), SimConfig::default()], &cancel);
        for r in results {
            assert_eq!(r.unwrap().stop_reason, StopReason::Cancelled);
        }
    }

    #[test]
    fn compare_heuristics_pairs_results() {
        let net = scenario_a_network();
        let (h1, h2, cmp) = compare_heuristics(
            &net,
            SimConfig::default(),
            SimConfig::default().with_heuristic(Heuristic::h2(["D1"])),
        )
        .unwrap();
        assert_eq!(h1.heuristic, "H1");
        assert_eq!(h2.heuristic, "H2");
        assert_eq!(cmp.profit_delta, h2.metrics.profit_tonne_km - h1.metrics.profit_tonne_km);
    }
}
