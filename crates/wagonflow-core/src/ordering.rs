//! Ordering policies: which destination is seeded first, and which relation
//! gets first claim on stock, capacity and wagons each day.
//!
//! H1 and H2 are two values of [`Heuristic`]. Both reduce to an
//! [`OrderingPolicy`] that the one shared engine consumes, so the heuristics
//! can only differ in the orders they produce.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::id::{DestinationKey, RelationKey};
use crate::network::{Destination, Network, RelationOrder};

// ---------------------------------------------------------------------------
// Destination ordering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Destination field a [`DestinationOrder::SortBy`] policy sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSortKey {
    QminTarget,
    AnnualDemand,
    RemainingDemand,
    /// Shortest relation ending at the destination. Unreachable destinations
    /// count as infinitely far.
    MinDistance,
}

/// Order in which the seeding pass visits destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationOrder {
    /// Exactly these destinations, in this order. Unknown ids are skipped.
    Fixed { ids: Vec<String> },
    /// Every destination, stably sorted on one field.
    SortBy {
        key: DestinationSortKey,
        direction: SortDirection,
    },
}

impl Default for DestinationOrder {
    fn default() -> Self {
        DestinationOrder::SortBy {
            key: DestinationSortKey::QminTarget,
            direction: SortDirection::Descending,
        }
    }
}

impl DestinationOrder {
    /// Resolve the policy against the current network state.
    pub fn resolve(&self, network: &Network) -> Vec<DestinationKey> {
        match self {
            DestinationOrder::Fixed { ids } => {
                let mut seen = HashSet::new();
                known_keys(network, ids)
                    .filter(|key| seen.insert(*key))
                    .collect()
            }
            DestinationOrder::SortBy { key, direction } => {
                let mut keyed: Vec<(DestinationKey, f64)> = network
                    .destinations()
                    .map(|(k, dest)| (k, sort_value(network, k, dest, *key)))
                    .collect();
                keyed.sort_by(|a, b| match direction {
                    SortDirection::Ascending => a.1.total_cmp(&b.1),
                    SortDirection::Descending => b.1.total_cmp(&a.1),
                });
                keyed.into_iter().map(|(k, _)| k).collect()
            }
        }
    }
}

fn sort_value(
    network: &Network,
    key: DestinationKey,
    dest: &Destination,
    field: DestinationSortKey,
) -> f64 {
    match field {
        DestinationSortKey::QminTarget => dest.q_min_initial_target_tons(),
        DestinationSortKey::AnnualDemand => dest.annual_demand_tons,
        DestinationSortKey::RemainingDemand => dest.remaining_annual_demand_tons(),
        DestinationSortKey::MinDistance => {
            network.min_distance_to(key).unwrap_or(f64::INFINITY)
        }
    }
}

/// Keys of the ids the network knows, in list order. Unknown ids are logged.
fn known_keys<'a>(
    network: &'a Network,
    ids: &'a [String],
) -> impl Iterator<Item = DestinationKey> + 'a {
    ids.iter().filter_map(move |id| match network.destination_key(id) {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(%err, "skipping destination in ordering list");
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// A named ordering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Heuristic {
    /// Seeding order chosen from the [`DestinationOrder`] menu; the daily
    /// loop visits profitable relations in `relations` order.
    H1 {
        #[serde(default)]
        seeding: DestinationOrder,
        #[serde(default)]
        relations: RelationOrder,
    },
    /// A caller-supplied destination priority that both phases honor.
    /// Seeding visits only the listed destinations, like
    /// [`DestinationOrder::Fixed`]; the daily loop serves listed destinations
    /// first and the rest after them. An empty list means the default order.
    H2 {
        #[serde(default)]
        priority: Vec<String>,
        #[serde(default)]
        relations: RelationOrder,
    },
}

impl Default for Heuristic {
    fn default() -> Self {
        Heuristic::H1 {
            seeding: DestinationOrder::default(),
            relations: RelationOrder::default(),
        }
    }
}

impl Heuristic {
    pub fn h1(seeding: DestinationOrder) -> Self {
        Heuristic::H1 {
            seeding,
            relations: RelationOrder::default(),
        }
    }

    pub fn h2<S: Into<String>>(priority: impl IntoIterator<Item = S>) -> Self {
        Heuristic::H2 {
            priority: priority.into_iter().map(Into::into).collect(),
            relations: RelationOrder::default(),
        }
    }

    /// Replace the daily relation order.
    pub fn with_relation_order(mut self, order: RelationOrder) -> Self {
        match &mut self {
            Heuristic::H1 { relations, .. } | Heuristic::H2 { relations, .. } => {
                *relations = order;
            }
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::H1 { .. } => "H1",
            Heuristic::H2 { .. } => "H2",
        }
    }

    /// Lower the heuristic to the policy the engine runs.
    pub fn policy(&self) -> OrderingPolicy {
        match self {
            Heuristic::H1 { seeding, relations } => OrderingPolicy {
                seeding: seeding.clone(),
                relations: *relations,
                destination_priority: None,
            },
            Heuristic::H2 {
                priority,
                relations,
            } if priority.is_empty() => OrderingPolicy {
                seeding: DestinationOrder::default(),
                relations: *relations,
                destination_priority: None,
            },
            Heuristic::H2 {
                priority,
                relations,
            } => OrderingPolicy {
                seeding: DestinationOrder::Fixed {
                    ids: priority.clone(),
                },
                relations: *relations,
                destination_priority: Some(priority.clone()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Ordering policy
// ---------------------------------------------------------------------------

/// The single input that distinguishes one heuristic run from another.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingPolicy {
    pub seeding: DestinationOrder,
    pub relations: RelationOrder,
    /// When set, groups daily relations by the rank of their destination in
    /// this list. Unlisted destinations come last.
    pub destination_priority: Option<Vec<String>>,
}

impl OrderingPolicy {
    /// Destinations in the order the seeding pass visits them.
    pub fn seeding_order(&self, network: &Network) -> Vec<DestinationKey> {
        self.seeding.resolve(network)
    }

    /// Profitable relations in the order the daily loop visits them today.
    pub fn daily_relations(&self, network: &Network) -> Vec<RelationKey> {
        let mut keys = network.relations_by_profitability(true);
        network.sort_relations(&mut keys, self.relations);
        if let Some(priority) = &self.destination_priority {
            let ranks = priority_ranks(network, priority);
            keys.sort_by_key(|&k| {
                network
                    .relation(k)
                    .and_then(|rel| ranks.get(&rel.destination).copied())
                    .unwrap_or(usize::MAX)
            });
        }
        keys
    }
}

/// Rank of each listed destination. The first mention of an id wins.
fn priority_ranks(network: &Network, priority: &[String]) -> HashMap<DestinationKey, usize> {
    let mut ranks = HashMap::new();
    for key in known_keys(network, priority) {
        let next = ranks.len();
        ranks.entry(key).or_insert(next);
    }
    ranks
}
