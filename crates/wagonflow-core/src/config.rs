//! Run configuration.
//!
//! Every field has a default, so a scenario file only needs to name what it
//! changes. [`SimConfig::validate`] is called before any run state exists.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ordering::Heuristic;
use crate::units::{Day, Km, Tons};

/// Default wagon capacity in tonnes.
pub const WAGON_CAPACITY_TONS: Tons = 50.0;
/// Fraction of a wagon that must be filled for a shipment to be issued.
pub const MIN_WAGON_UTILIZATION: f64 = 0.30;
/// Distance a wagon covers per day, used for transit delays.
pub const KM_PER_DAY: Km = 200.0;
/// Fraction of annual demand targeted by the day-1 seeding pass.
pub const Q_MIN_FRACTION: f64 = 0.20;
/// Default simulation horizon.
pub const MAX_SIMULATION_DAYS: Day = 120;
/// Default fleet size.
pub const DEFAULT_FLEET_SIZE: u32 = 50;
/// Numerical zero for tonnage comparisons.
pub const EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Wagon parameters
// ---------------------------------------------------------------------------

/// Physical parameters shared by every wagon of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WagonParams {
    pub capacity_tons: Tons,
    pub min_utilization: f64,
    pub km_per_day: Km,
}

impl Default for WagonParams {
    fn default() -> Self {
        Self {
            capacity_tons: WAGON_CAPACITY_TONS,
            min_utilization: MIN_WAGON_UTILIZATION,
            km_per_day: KM_PER_DAY,
        }
    }
}

impl WagonParams {
    /// Smallest quantity worth a wagon (`MIN_SHIPMENT_FOR_ONE_WAGON_TONS`).
    #[inline]
    pub fn min_batch_tons(&self) -> Tons {
        self.capacity_tons * self.min_utilization
    }

    /// One-way transit time: `ceil(distance / km_per_day)`, at least one day.
    #[inline]
    pub fn one_way_days(&self, distance_km: Km) -> Day {
        ((distance_km / self.km_per_day).ceil() as Day).max(1)
    }
}

// ---------------------------------------------------------------------------
// Seeding budget
// ---------------------------------------------------------------------------

/// How the day-1 seeding pass accounts for loading/unloading throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingBudget {
    /// Seeding uses its own trackers seeded from the static daily caps; the
    /// daily loop then starts day 1 with full caps again.
    #[default]
    Independent,
    /// Seeding draws on the same day-1 trackers the daily loop uses.
    SharedWithDayOne,
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

/// Everything a run needs besides the network itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wagons in the fleet. Zero is accepted and yields a run without shipments.
    pub fleet_size: u32,
    /// Last simulated day (`MAX_SIMULATION_DAYS`).
    pub horizon_days: Day,
    pub wagon: WagonParams,
    pub q_min_fraction: f64,
    pub epsilon: f64,
    pub seeding_budget: SeedingBudget,
    /// Stop before the horizon once a day ships nothing and no wagon is out.
    pub stop_when_exhausted: bool,
    pub heuristic: Heuristic,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fleet_size: DEFAULT_FLEET_SIZE,
            horizon_days: MAX_SIMULATION_DAYS,
            wagon: WagonParams::default(),
            q_min_fraction: Q_MIN_FRACTION,
            epsilon: EPSILON,
            seeding_budget: SeedingBudget::default(),
            stop_when_exhausted: true,
            heuristic: Heuristic::default(),
        }
    }
}

impl SimConfig {
    pub fn with_fleet_size(mut self, fleet_size: u32) -> Self {
        self.fleet_size = fleet_size;
        self
    }

    pub fn with_horizon(mut self, horizon_days: Day) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_seeding_budget(mut self, budget: SeedingBudget) -> Self {
        self.seeding_budget = budget;
        self
    }

    pub fn with_wagon(mut self, wagon: WagonParams) -> Self {
        self.wagon = wagon;
        self
    }

    /// Run every day of the horizon even when nothing can move any more.
    pub fn without_early_stop(mut self) -> Self {
        self.stop_when_exhausted = false;
        self
    }

    /// Check ranges. Fleet size needs no check: zero is a legal degenerate fleet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_days == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        let cap = self.wagon.capacity_tons;
        if !(cap.is_finite() && cap > 0.0) {
            return Err(ConfigError::InvalidWagonCapacity(cap));
        }
        let util = self.wagon.min_utilization;
        if !(util > 0.0 && util <= 1.0) {
            return Err(ConfigError::InvalidUtilization(util));
        }
        let speed = self.wagon.km_per_day;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidSpeed(speed));
        }
        if !(0.0..=1.0).contains(&self.q_min_fraction) {
            return Err(ConfigError::InvalidQminFraction(self.q_min_fraction));
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }
}
