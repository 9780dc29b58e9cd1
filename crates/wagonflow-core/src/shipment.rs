//! The shipment processor: the one state transition of the engine.
//!
//! [`SimState::attempt_shipment`] moves product along one relation on one
//! day. It is the only code that writes origin stock, destination demand or
//! fleet state, so every conservation property of a run reduces to the
//! checks made here.
//!
//! A shipment that cannot be made is not an error. It comes back as
//! [`ShipmentOutcome::Rejected`] with the first [`Rejection`] that applied,
//! checked in this order:
//!
//! 1. [`Rejection::Empty`]: the desired quantity is numerically zero.
//! 2. [`Rejection::TooSmall`]: the desired quantity is below the minimum
//!    batch (`capacity × min_utilization`).
//! 3. [`Rejection::UnknownId`]: origin or destination is not in the network.
//! 4. [`Rejection::CapacityExhausted`]: stock, remaining demand or the
//!    caller's daily budgets leave less than the minimum batch.
//! 5. [`Rejection::NoWagons`]: no wagon is idle.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::UnknownNodeError;
use crate::fleet::TripTiming;
use crate::id::{DestinationKey, OriginKey, RelationKey};
use crate::sim::{DailyBudgets, SimState};
use crate::units::{Day, Km, Tons, is_negligible, wagons_for};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Which phase issued a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentPhase {
    /// Day-1 Q_min pre-delivery.
    QminSeeding,
    /// The daily allocation loop.
    Daily,
}

/// One entry of the append-only shipment log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub ship_day: Day,
    pub arrival_day: Day,
    pub origin: String,
    pub destination: String,
    pub quantity_tons: Tons,
    pub wagons_used: u32,
    pub phase: ShipmentPhase,
}

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// Arguments of one shipment attempt, addressed by external ids.
#[derive(Debug, Clone, Copy)]
pub struct ShipmentRequest<'a> {
    pub day: Day,
    pub origin: &'a str,
    pub destination: &'a str,
    pub distance_km: Km,
    pub desired_tons: Tons,
    /// Loading throughput the origin has left today.
    pub origin_cap_remaining: Tons,
    /// Unloading throughput the destination has left today.
    pub dest_cap_remaining: Tons,
    pub phase: ShipmentPhase,
}

/// Why an attempt shipped nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Empty,
    TooSmall,
    UnknownId(UnknownNodeError),
    CapacityExhausted,
    NoWagons,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => f.write_str("nothing requested"),
            Rejection::TooSmall => f.write_str("request below minimum batch"),
            Rejection::UnknownId(err) => write!(f, "{err}"),
            Rejection::CapacityExhausted => f.write_str("feasible quantity below minimum batch"),
            Rejection::NoWagons => f.write_str("no idle wagons"),
        }
    }
}

/// A successful shipment and the caller's updated daily budgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shipped {
    pub quantity_tons: Tons,
    pub wagons_used: u32,
    pub origin_cap_remaining: Tons,
    pub dest_cap_remaining: Tons,
    pub arrival_day: Day,
    pub return_day: Day,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShipmentOutcome {
    Shipped(Shipped),
    Rejected(Rejection),
}

impl ShipmentOutcome {
    /// Tonnes shipped; zero when rejected.
    pub fn quantity(&self) -> Tons {
        match self {
            ShipmentOutcome::Shipped(s) => s.quantity_tons,
            ShipmentOutcome::Rejected(_) => 0.0,
        }
    }

    /// Wagons used; zero when rejected.
    pub fn wagons(&self) -> u32 {
        match self {
            ShipmentOutcome::Shipped(s) => s.wagons_used,
            ShipmentOutcome::Rejected(_) => 0,
        }
    }

    pub fn is_shipped(&self) -> bool {
        matches!(self, ShipmentOutcome::Shipped(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ShipmentOutcome::Shipped(_) => None,
            ShipmentOutcome::Rejected(r) => Some(r),
        }
    }

    /// Remaining `(origin, destination)` budgets after this outcome. A
    /// rejection leaves the inputs unchanged.
    pub fn caps_after(&self, origin_cap: Tons, dest_cap: Tons) -> (Tons, Tons) {
        match self {
            ShipmentOutcome::Shipped(s) => (s.origin_cap_remaining, s.dest_cap_remaining),
            ShipmentOutcome::Rejected(_) => (origin_cap, dest_cap),
        }
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Relation-level inputs after the ids have been resolved.
struct Leg {
    day: Day,
    origin: OriginKey,
    destination: DestinationKey,
    distance_km: Km,
    desired_tons: Tons,
    origin_cap: Tons,
    dest_cap: Tons,
    phase: ShipmentPhase,
}

impl SimState {
    /// Attempt to move `desired_tons` along one relation on one day.
    pub fn attempt_shipment(&mut self, req: &ShipmentRequest<'_>) -> ShipmentOutcome {
        if let Some(rejection) = self.screen_request(req.desired_tons) {
            return self.reject(req.day, req.origin, req.destination, rejection);
        }
        let keys = self
            .network
            .origin_key(req.origin)
            .and_then(|o| self.network.destination_key(req.destination).map(|d| (o, d)));
        let (origin, destination) = match keys {
            Ok(keys) => keys,
            Err(err) => {
                return self.reject(req.day, req.origin, req.destination, Rejection::UnknownId(err));
            }
        };
        self.execute(Leg {
            day: req.day,
            origin,
            destination,
            distance_km: req.distance_km,
            desired_tons: req.desired_tons,
            origin_cap: req.origin_cap_remaining,
            dest_cap: req.dest_cap_remaining,
            phase: req.phase,
        })
    }

    /// Attempt a shipment on a known relation, drawing on and updating
    /// `budgets`.
    pub(crate) fn attempt_on_relation(
        &mut self,
        relation: RelationKey,
        desired_tons: Tons,
        budgets: &mut DailyBudgets,
        phase: ShipmentPhase,
    ) -> ShipmentOutcome {
        let Some(rel) = self.network.relation(relation).copied() else {
            return ShipmentOutcome::Rejected(Rejection::UnknownId(UnknownNodeError::origin(
                format!("{relation:?}"),
            )));
        };
        if let Some(rejection) = self.screen_request(desired_tons) {
            return ShipmentOutcome::Rejected(rejection);
        }
        let outcome = self.execute(Leg {
            day: self.day,
            origin: rel.origin,
            destination: rel.destination,
            distance_km: rel.distance_km,
            desired_tons,
            origin_cap: budgets.origin(rel.origin),
            dest_cap: budgets.destination(rel.destination),
            phase,
        });
        if let ShipmentOutcome::Shipped(shipped) = &outcome {
            budgets.apply(rel.origin, rel.destination, shipped);
        }
        outcome
    }

    /// Checks that need nothing but the requested quantity.
    fn screen_request(&self, desired_tons: Tons) -> Option<Rejection> {
        if is_negligible(desired_tons, self.epsilon) {
            Some(Rejection::Empty)
        } else if desired_tons < self.wagon.min_batch_tons() - self.epsilon {
            Some(Rejection::TooSmall)
        } else {
            None
        }
    }

    fn execute(&mut self, leg: Leg) -> ShipmentOutcome {
        let eps = self.epsilon;
        let capacity = self.wagon.capacity_tons;
        let min_batch = self.wagon.min_batch_tons();

        let (Some(origin), Some(dest)) = (
            self.network.origin(leg.origin),
            self.network.destination(leg.destination),
        ) else {
            return ShipmentOutcome::Rejected(Rejection::UnknownId(UnknownNodeError::origin(
                format!("{:?}", leg.origin),
            )));
        };

        let loadable = leg
            .desired_tons
            .min(leg.origin_cap)
            .min(origin.current_available_product_tons());
        let unloadable = leg
            .desired_tons
            .min(leg.dest_cap)
            .min(dest.remaining_annual_demand_tons());
        let feasible = loadable.min(unloadable);
        if feasible < min_batch - eps {
            trace!(
                day = leg.day,
                origin = %origin.id,
                destination = %dest.id,
                feasible,
                "shipment rejected: capacity exhausted"
            );
            return ShipmentOutcome::Rejected(Rejection::CapacityExhausted);
        }

        let idle = self.fleet.idle();
        if idle == 0 {
            trace!(day = leg.day, origin = %origin.id, destination = %dest.id, "shipment rejected: no wagons");
            return ShipmentOutcome::Rejected(Rejection::NoWagons);
        }

        let ideal = wagons_for(feasible, capacity, eps);
        let capped = ideal.min(idle);
        let quantity = feasible.min(f64::from(capped) * capacity);
        let wagons_used = wagons_for(quantity, capacity, eps);
        if wagons_used == 0 || wagons_used > idle {
            return ShipmentOutcome::Rejected(Rejection::NoWagons);
        }

        let timing = TripTiming::new(leg.day, leg.distance_km, &self.wagon);
        let origin_id = origin.id.clone();
        let dest_id = dest.id.clone();

        if let Some(origin) = self.network.origin_mut(leg.origin) {
            origin.current_available_product_tons =
                (origin.current_available_product_tons - quantity).max(0.0);
        }
        if let Some(dest) = self.network.destination_mut(leg.destination) {
            dest.remaining_annual_demand_tons = (dest.remaining_annual_demand_tons - quantity).max(0.0);
            dest.delivered_so_far_tons += quantity;
            if leg.phase == ShipmentPhase::QminSeeding {
                dest.q_min_initial_delivered_tons = (dest.q_min_initial_delivered_tons + quantity)
                    .min(dest.q_min_initial_target_tons);
            }
        }
        self.fleet.reserve(wagons_used);
        self.fleet.dispatch(wagons_used, timing.return_day);

        debug!(
            day = leg.day,
            origin = %origin_id,
            destination = %dest_id,
            tons = quantity,
            wagons = wagons_used,
            return_day = timing.return_day,
            phase = ?leg.phase,
            "shipment issued"
        );
        self.shipments.push(ShipmentRecord {
            ship_day: leg.day,
            arrival_day: timing.arrival_day,
            origin: origin_id,
            destination: dest_id,
            quantity_tons: quantity,
            wagons_used,
            phase: leg.phase,
        });

        ShipmentOutcome::Shipped(Shipped {
            quantity_tons: quantity,
            wagons_used,
            origin_cap_remaining: leg.origin_cap - quantity,
            dest_cap_remaining: leg.dest_cap - quantity,
            arrival_day: timing.arrival_day,
            return_day: timing.return_day,
        })
    }

    fn reject(&self, day: Day, origin: &str, destination: &str, rejection: Rejection) -> ShipmentOutcome {
        trace!(day, origin, destination, %rejection, "shipment rejected");
        ShipmentOutcome::Rejected(rejection)
    }
}
