//! Wagon fleet: idle wagons, wagons out on a round trip, and the daily
//! release of returning wagons.
//!
//! The fleet is conserved. `idle + in transit == total` holds after every
//! operation; wagons are never created or destroyed after construction.

use serde::{Deserialize, Serialize};

use crate::config::WagonParams;
use crate::units::{Day, Km, Tons};

// ---------------------------------------------------------------------------
// Transit
// ---------------------------------------------------------------------------

/// A batch of wagons away from the yard until `return_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitRecord {
    pub return_day: Day,
    pub num_wagons: u32,
}

/// Arrival and return days of a trip shipped on `ship_day`.
///
/// Days saturate at `Day::MAX`: a trip too long to represent never returns
/// within any horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripTiming {
    pub one_way_days: Day,
    pub arrival_day: Day,
    pub return_day: Day,
}

impl TripTiming {
    pub fn new(ship_day: Day, distance_km: Km, wagon: &WagonParams) -> Self {
        let one_way_days = wagon.one_way_days(distance_km);
        Self {
            one_way_days,
            arrival_day: ship_day.saturating_add(one_way_days),
            return_day: ship_day.saturating_add(one_way_days.saturating_mul(2)),
        }
    }
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WagonFleet {
    total: u32,
    idle: u32,
    in_transit: Vec<TransitRecord>,
}

impl WagonFleet {
    /// A fleet with every wagon idle.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            idle: total,
            in_transit: Vec::new(),
        }
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[inline]
    pub fn idle(&self) -> u32 {
        self.idle
    }

    /// Outstanding transit records, in dispatch order.
    pub fn in_transit(&self) -> &[TransitRecord] {
        &self.in_transit
    }

    pub fn in_transit_wagons(&self) -> u32 {
        self.in_transit.iter().map(|r| r.num_wagons).sum()
    }

    /// Take `n` wagons out of the yard. The caller has already capped `n` at
    /// [`idle`](Self::idle).
    pub(crate) fn reserve(&mut self, n: u32) {
        debug_assert!(n <= self.idle, "reserve({n}) with only {} idle", self.idle);
        self.idle -= n;
    }

    /// Record `n` reserved wagons as travelling until `return_day`.
    pub(crate) fn dispatch(&mut self, n: u32, return_day: Day) {
        self.in_transit.push(TransitRecord {
            return_day,
            num_wagons: n,
        });
    }

    /// Release every batch due back on or before `day`. Returns the number of
    /// wagons released. Called once per day before that day's allocation.
    pub fn advance_day(&mut self, day: Day) -> u32 {
        let mut released = 0;
        self.in_transit.retain(|record| {
            if record.return_day <= day {
                released += record.num_wagons;
                false
            } else {
                true
            }
        });
        self.idle += released;
        released
    }

    pub fn is_conserved(&self) -> bool {
        self.idle + self.in_transit_wagons() == self.total
    }

    pub fn snapshot(&self) -> FleetState {
        FleetState {
            total: self.total,
            idle: self.idle,
            in_transit: self.in_transit.clone(),
        }
    }
}

/// Plain copy of the fleet for the run snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetState {
    pub total: u32,
    pub idle: u32,
    pub in_transit: Vec<TransitRecord>,
}

impl FleetState {
    pub fn in_transit_wagons(&self) -> u32 {
        self.in_transit.iter().map(|r| r.num_wagons).sum()
    }
}

/// One line of the daily wagon log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetDayRecord {
    pub day: Day,
    /// Wagons back in the yard this morning.
    pub released: u32,
    pub idle_after_release: u32,
    pub idle_end_of_day: u32,
    pub in_transit_end_of_day: u32,
    pub shipments: u32,
    pub shipped_tons: Tons,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_timing_saturates_on_extreme_distance() {
        let wagon = WagonParams::default();
        let trip = TripTiming::new(7, 1e12, &wagon);
        assert_eq!(trip.one_way_days, Day::MAX);
        assert_eq!(trip.arrival_day, Day::MAX);
        assert_eq!(trip.return_day, Day::MAX);
    }

    #[test]
    fn reserve_and_dispatch_conserve_wagons() {
        let mut fleet = WagonFleet::new(10);
        fleet.reserve(4);
        fleet.dispatch(4, 3);
        assert_eq!(fleet.idle(), 6);
        assert_eq!(fleet.in_transit_wagons(), 4);
        assert!(fleet.is_conserved());
    }

    #[test]
    fn advance_day_releases_due_batches_only() {
        let mut fleet = WagonFleet::new(10);
        fleet.reserve(3);
        fleet.dispatch(3, 3);
        fleet.reserve(2);
        fleet.dispatch(2, 5);

        assert_eq!(fleet.advance_day(2), 0);
        assert_eq!(fleet.advance_day(3), 3);
        assert_eq!(fleet.idle(), 8);
        assert_eq!(fleet.in_transit().len(), 1);

        // A skipped day still releases everything overdue.
        assert_eq!(fleet.advance_day(9), 2);
        assert_eq!(fleet.idle(), 10);
        assert!(fleet.is_conserved());
    }

    #[test]
    fn trip_timing_follows_distance() {
        let wagon = WagonParams::default();
        let short = TripTiming::new(1, 100.0, &wagon);
        assert_eq!((short.arrival_day, short.return_day), (2, 3));

        let long = TripTiming::new(4, 850.0, &wagon);
        assert_eq!(long.one_way_days, 5);
        assert_eq!((long.arrival_day, long.return_day), (9, 14));
    }

    #[test]
    fn empty_fleet_is_conserved() {
        let mut fleet = WagonFleet::new(0);
        assert_eq!(fleet.advance_day(1), 0);
        assert!(fleet.is_conserved());
        assert_eq!(fleet.snapshot().in_transit_wagons(), 0);
    }
}
