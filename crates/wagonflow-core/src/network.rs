//! The bipartite rail network: origins, destinations and the relations
//! between them.
//!
//! A [`Network`] is built once from validated [`NetworkInput`] rows and then
//! cloned for every run, so concurrent runs never share mutable state. The
//! per-run fields (stock, remaining demand, Q_min progress) are only written
//! by the shipment processor.
//!
//! Iteration follows input order. Ids are resolved through hash maps, but no
//! hash map is ever iterated, which keeps relation ordering reproducible.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{ConfigError, UnknownNodeError};
use crate::id::{DestinationKey, OriginKey, RelationKey};
use crate::units::{Km, Tons};
use crate::validation::validate_network_input;

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One origin row as delivered by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginInput {
    pub id: String,
    pub daily_loading_capacity_tons: Tons,
    pub initial_available_product_tons: Tons,
}

/// One destination row as delivered by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationInput {
    pub id: String,
    pub daily_unloading_capacity_tons: Tons,
    pub annual_demand_tons: Tons,
}

/// One relation row as delivered by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationInput {
    pub origin: String,
    pub destination: String,
    pub distance_km: Km,
    pub profitable: bool,
}

/// The three input tables, already cleaned and typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInput {
    pub origins: Vec<OriginInput>,
    pub destinations: Vec<DestinationInput>,
    pub relations: Vec<RelationInput>,
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A supply node with a depletable stock.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub id: String,
    pub daily_loading_capacity_tons: Tons,
    pub initial_available_product_tons: Tons,
    pub(crate) current_available_product_tons: Tons,
}

impl Origin {
    /// Product still available for loading.
    #[inline]
    pub fn current_available_product_tons(&self) -> Tons {
        self.current_available_product_tons
    }

    /// Product loaded so far in this run.
    #[inline]
    pub fn shipped_tons(&self) -> Tons {
        self.initial_available_product_tons - self.current_available_product_tons
    }
}

/// A demand node with an annual target and a day-1 Q_min target.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub id: String,
    pub daily_unloading_capacity_tons: Tons,
    pub annual_demand_tons: Tons,
    pub(crate) remaining_annual_demand_tons: Tons,
    pub(crate) delivered_so_far_tons: Tons,
    pub(crate) q_min_initial_target_tons: Tons,
    pub(crate) q_min_initial_delivered_tons: Tons,
}

impl Destination {
    #[inline]
    pub fn remaining_annual_demand_tons(&self) -> Tons {
        self.remaining_annual_demand_tons
    }

    #[inline]
    pub fn delivered_so_far_tons(&self) -> Tons {
        self.delivered_so_far_tons
    }

    #[inline]
    pub fn q_min_initial_target_tons(&self) -> Tons {
        self.q_min_initial_target_tons
    }

    #[inline]
    pub fn q_min_initial_delivered_tons(&self) -> Tons {
        self.q_min_initial_delivered_tons
    }

    /// Q_min tonnage still missing.
    #[inline]
    pub fn q_min_outstanding_tons(&self) -> Tons {
        (self.q_min_initial_target_tons - self.q_min_initial_delivered_tons).max(0.0)
    }
}

/// A permitted origin-destination link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relation {
    pub origin: OriginKey,
    pub destination: DestinationKey,
    pub distance_km: Km,
    pub profitable: bool,
}

// ---------------------------------------------------------------------------
// Relation ordering
// ---------------------------------------------------------------------------

/// Order in which a set of relations is visited.
///
/// Every variant is a stable sort over input order, so equal keys keep the
/// order in which the relations were listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationOrder {
    /// Input order.
    Listed,
    DistanceAscending,
    /// Longest haul first: the greedy choice for a tonne-km objective.
    #[default]
    DistanceDescending,
    /// Richest source first, by current stock.
    OriginStockDescending,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Origins, destinations and relations of one run.
#[derive(Debug, Clone)]
pub struct Network {
    origins: SlotMap<OriginKey, Origin>,
    destinations: SlotMap<DestinationKey, Destination>,
    relations: SlotMap<RelationKey, Relation>,
    origin_index: HashMap<String, OriginKey>,
    destination_index: HashMap<String, DestinationKey>,
}

impl Network {
    /// Validate and build a network. Q_min targets start at zero until
    /// [`set_q_min_fraction`](Self::set_q_min_fraction) is applied for a run.
    pub fn from_input(input: &NetworkInput) -> Result<Self, ConfigError> {
        validate_network_input(input).map_err(ConfigError::InvalidNetwork)?;

        let mut origins = SlotMap::with_key();
        let mut origin_index = HashMap::with_capacity(input.origins.len());
        for row in &input.origins {
            let key = origins.insert(Origin {
                id: row.id.clone(),
                daily_loading_capacity_tons: row.daily_loading_capacity_tons,
                initial_available_product_tons: row.initial_available_product_tons,
                current_available_product_tons: row.initial_available_product_tons,
            });
            origin_index.insert(row.id.clone(), key);
        }

        let mut destinations = SlotMap::with_key();
        let mut destination_index = HashMap::with_capacity(input.destinations.len());
        for row in &input.destinations {
            let key = destinations.insert(Destination {
                id: row.id.clone(),
                daily_unloading_capacity_tons: row.daily_unloading_capacity_tons,
                annual_demand_tons: row.annual_demand_tons,
                remaining_annual_demand_tons: row.annual_demand_tons,
                delivered_so_far_tons: 0.0,
                q_min_initial_target_tons: 0.0,
                q_min_initial_delivered_tons: 0.0,
            });
            destination_index.insert(row.id.clone(), key);
        }

        let mut relations = SlotMap::with_key();
        for row in &input.relations {
            // Validation guarantees both ends resolve.
            let (Some(&origin), Some(&destination)) = (
                origin_index.get(&row.origin),
                destination_index.get(&row.destination),
            ) else {
                continue;
            };
            relations.insert(Relation {
                origin,
                destination,
                distance_km: row.distance_km,
                profitable: row.profitable,
            });
        }

        Ok(Self {
            origins,
            destinations,
            relations,
            origin_index,
            destination_index,
        })
    }

    /// Set each destination's Q_min target to `fraction` of its annual demand.
    pub fn set_q_min_fraction(&mut self, fraction: f64) {
        for (_, dest) in &mut self.destinations {
            dest.q_min_initial_target_tons = fraction * dest.annual_demand_tons;
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn origin_key(&self, id: &str) -> Result<OriginKey, UnknownNodeError> {
        self.origin_index
            .get(id)
            .copied()
            .ok_or_else(|| UnknownNodeError::origin(id))
    }

    pub fn destination_key(&self, id: &str) -> Result<DestinationKey, UnknownNodeError> {
        self.destination_index
            .get(id)
            .copied()
            .ok_or_else(|| UnknownNodeError::destination(id))
    }

    pub fn origin(&self, key: OriginKey) -> Option<&Origin> {
        self.origins.get(key)
    }

    pub fn destination(&self, key: DestinationKey) -> Option<&Destination> {
        self.destinations.get(key)
    }

    pub fn relation(&self, key: RelationKey) -> Option<&Relation> {
        self.relations.get(key)
    }

    pub fn origin_by_id(&self, id: &str) -> Result<&Origin, UnknownNodeError> {
        let key = self.origin_key(id)?;
        self.origins
            .get(key)
            .ok_or_else(|| UnknownNodeError::origin(id))
    }

    pub fn destination_by_id(&self, id: &str) -> Result<&Destination, UnknownNodeError> {
        let key = self.destination_key(id)?;
        self.destinations
            .get(key)
            .ok_or_else(|| UnknownNodeError::destination(id))
    }

    pub(crate) fn origin_mut(&mut self, key: OriginKey) -> Option<&mut Origin> {
        self.origins.get_mut(key)
    }

    pub(crate) fn destination_mut(&mut self, key: DestinationKey) -> Option<&mut Destination> {
        self.destinations.get_mut(key)
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    pub fn origins(&self) -> impl Iterator<Item = (OriginKey, &Origin)> {
        self.origins.iter()
    }

    pub fn destinations(&self) -> impl Iterator<Item = (DestinationKey, &Destination)> {
        self.destinations.iter()
    }

    pub fn relations(&self) -> impl Iterator<Item = (RelationKey, &Relation)> {
        self.relations.iter()
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Relations ending at `destination`, in the requested order.
    pub fn relations_to(&self, destination: DestinationKey, order: RelationOrder) -> Vec<RelationKey> {
        let mut keys: Vec<RelationKey> = self
            .relations
            .iter()
            .filter(|(_, rel)| rel.destination == destination)
            .map(|(key, _)| key)
            .collect();
        self.sort_relations(&mut keys, order);
        keys
    }

    /// Relations whose profitability flag equals `profitable`, in input order.
    pub fn relations_by_profitability(&self, profitable: bool) -> Vec<RelationKey> {
        self.relations
            .iter()
            .filter(|(_, rel)| rel.profitable == profitable)
            .map(|(key, _)| key)
            .collect()
    }

    /// Stable sort of `keys` by `order`. Unknown keys sort last.
    pub fn sort_relations(&self, keys: &mut [RelationKey], order: RelationOrder) {
        match order {
            RelationOrder::Listed => {}
            RelationOrder::DistanceAscending => {
                keys.sort_by(|&a, &b| self.distance_of(a).total_cmp(&self.distance_of(b)));
            }
            RelationOrder::DistanceDescending => {
                keys.sort_by(|&a, &b| self.distance_of(b).total_cmp(&self.distance_of(a)));
            }
            RelationOrder::OriginStockDescending => {
                keys.sort_by(|&a, &b| self.stock_behind(b).total_cmp(&self.stock_behind(a)));
            }
        }
    }

    fn distance_of(&self, key: RelationKey) -> Km {
        self.relations
            .get(key)
            .map_or(f64::INFINITY, |rel| rel.distance_km)
    }

    fn stock_behind(&self, key: RelationKey) -> Tons {
        self.relations
            .get(key)
            .and_then(|rel| self.origins.get(rel.origin))
            .map_or(f64::NEG_INFINITY, |o| o.current_available_product_tons)
    }

    /// Shortest relation ending at `destination`, if it has any.
    pub fn min_distance_to(&self, destination: DestinationKey) -> Option<Km> {
        self.relations
            .values()
            .filter(|rel| rel.destination == destination)
            .map(|rel| rel.distance_km)
            .min_by(f64::total_cmp)
    }

    /// Distance of the relation between two external ids.
    pub fn distance_between(&self, origin_id: &str, destination_id: &str) -> Option<Km> {
        let origin = self.origin_key(origin_id).ok()?;
        let destination = self.destination_key(destination_id).ok()?;
        self.relations
            .values()
            .find(|rel| rel.origin == origin && rel.destination == destination)
            .map(|rel| rel.distance_km)
    }

    // -----------------------------------------------------------------------
    // Totals
    // -----------------------------------------------------------------------

    pub fn total_annual_demand_tons(&self) -> Tons {
        self.destinations.values().map(|d| d.annual_demand_tons).sum()
    }

    pub fn total_delivered_tons(&self) -> Tons {
        self.destinations.values().map(|d| d.delivered_so_far_tons).sum()
    }

    pub fn total_available_product_tons(&self) -> Tons {
        self.origins
            .values()
            .map(|o| o.current_available_product_tons)
            .sum()
    }
}
