//! Wagonflow Core -- a discrete-time rail transport allocation simulator.
//!
//! Given a bipartite network of origins (supply) and destinations (demand)
//! linked by relations, and a finite fleet of returning wagons, the engine
//! decides day by day how much product moves on which relation. Loading and
//! unloading throughput, remaining stock, remaining demand and idle wagons
//! all bound every shipment.
//!
//! # Daily Pipeline
//!
//! Each simulated day runs through the same steps:
//!
//! 1. **Release** -- Wagons whose round trip ends today return to the yard.
//! 2. **Reset** -- Per-origin and per-destination daily budgets refill.
//! 3. **Seed** (day 1 only) -- Each destination is pushed towards its Q_min
//!    target, richest origin first.
//! 4. **Allocate** -- Profitable relations are visited in the heuristic's
//!    order, each taking a greedy shipment.
//! 5. **Log** -- The day's fleet line is recorded.
//!
//! # Running a Simulation
//!
//! ```rust,ignore
//! let network = Network::from_input(&input)?;
//! let config = SimConfig::default().with_heuristic(Heuristic::h2(["PORT"]));
//! let result = Simulation::new(&network, config)?.run();
//! println!("{} t.km, {:.1}%", result.metrics.profit_tonne_km,
//!          result.metrics.satisfaction_rate * 100.0);
//! ```
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- One validated network plus config; each run
//!   works on its own copy.
//! - [`network::Network`] -- Origins, destinations and relations, keyed by
//!   slotmap ids and looked up by external id.
//! - [`sim::SimState`] -- All mutable state of one run.
//! - [`shipment`] -- The shipment processor, the only writer of run state.
//! - [`ordering::Heuristic`] -- H1 and H2, lowered to an
//!   [`ordering::OrderingPolicy`].
//! - [`report::RunResult`] -- Plain-data snapshot of a finished run.
//! - [`batch`] -- Independent runs, in parallel with the `parallel` feature.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod id;
pub mod metrics;
pub mod network;
pub mod ordering;
pub mod report;
pub mod seeding;
pub mod shipment;
pub mod sim;
pub mod units;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
