//! Loading the bundled scenario directory and running it end to end.

use std::path::PathBuf;

use wagonflow_core::config::SimConfig;
use wagonflow_core::engine::StopReason;
use wagonflow_core::network::RelationOrder;
use wagonflow_core::ordering::{DestinationOrder, DestinationSortKey, Heuristic, SortDirection};
use wagonflow_core::report::RunResult;
use wagonflow_data::{DataLoadError, load_scenario};

fn two_mines_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../wagonflow-data/scenarios/two_mines")
}

#[test]
fn bundled_scenario_loads_mixed_formats() {
    let scenario = load_scenario(&two_mines_dir()).unwrap();

    assert_eq!(scenario.network.origin_count(), 2);
    assert_eq!(scenario.network.destination_count(), 3);
    assert_eq!(scenario.network.relation_count(), 4);
    assert_eq!(scenario.network.relations_by_profitability(false).len(), 1);

    assert_eq!(scenario.config.fleet_size, 40);
    assert_eq!(
        scenario.config.heuristic,
        Heuristic::H1 {
            seeding: DestinationOrder::SortBy {
                key: DestinationSortKey::AnnualDemand,
                direction: SortDirection::Descending,
            },
            relations: RelationOrder::DistanceDescending,
        }
    );
}

#[test]
fn bundled_scenario_runs_and_leaves_depot_unserved() {
    let scenario = load_scenario(&two_mines_dir()).unwrap();
    let result = scenario.simulation().unwrap().run();

    assert_ne!(result.stop_reason, StopReason::Cancelled);
    let depot = result.destination("DEPOT").unwrap();
    assert_eq!(depot.delivered_so_far_tons, 0.0);
    assert!(result.metrics.satisfaction_rate < 1.0);
    assert!(result.metrics.profit_tonne_km > 0.0);
    assert_eq!(result.fleet.idle + result.fleet.in_transit_wagons(), 40);
}

#[test]
fn snapshot_serializes_to_plain_json() {
    let scenario = load_scenario(&two_mines_dir()).unwrap();
    let result = scenario
        .simulation_with(SimConfig::default().with_heuristic(Heuristic::h2(["PLANT", "PORT"])))
        .unwrap()
        .run();

    let json = result.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["heuristic"], "H2");
    assert!(value["shipments"].is_array());
    assert_eq!(value["config"]["heuristic"]["priority"][0], "PLANT");
    assert_eq!(value["stop_reason"], serde_json::json!(result.stop_reason));

    let back: RunResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.terminal_day, result.terminal_day);
}

#[test]
fn missing_directory_reports_missing_table() {
    let err = load_scenario(&two_mines_dir().join("does-not-exist")).unwrap_err();
    assert!(matches!(err, DataLoadError::MissingRequired { file: "origins", .. }));
}
