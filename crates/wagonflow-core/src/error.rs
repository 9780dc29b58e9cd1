//! Error types for the engine.
//!
//! Only configuration problems are errors. A shipment that cannot be made is
//! an ordinary [`Rejection`](crate::shipment::Rejection), and demand left
//! unmet at the end of a run is reported through the metrics.

use crate::id::NodeKind;

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// An external id that is not present in the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} id '{id}'")]
pub struct UnknownNodeError {
    pub kind: NodeKind,
    pub id: String,
}

impl UnknownNodeError {
    pub fn origin(id: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Origin,
            id: id.into(),
        }
    }

    pub fn destination(id: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Destination,
            id: id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input issues
// ---------------------------------------------------------------------------

/// A single structural problem found while validating network input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkIssue {
    #[error("{kind} row {row} has an empty id")]
    EmptyId { kind: NodeKind, row: usize },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: NodeKind, id: String },

    #[error("relation row {row} references unknown {kind} '{id}'")]
    UnknownReference {
        row: usize,
        kind: NodeKind,
        id: String,
    },

    #[error("relation {origin} -> {destination} is listed more than once")]
    DuplicateRelation { origin: String, destination: String },

    #[error("relation {origin} -> {destination} has invalid distance {distance_km} km")]
    InvalidDistance {
        origin: String,
        destination: String,
        distance_km: f64,
    },

    #[error("{kind} '{id}' has invalid {field}: {value}")]
    InvalidQuantity {
        kind: NodeKind,
        id: String,
        field: &'static str,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A run could not start. Nothing has been simulated when this is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("network input has {} issue(s): {}", .0.len(), join_issues(.0))]
    InvalidNetwork(Vec<NetworkIssue>),

    #[error("simulation horizon must be at least one day")]
    ZeroHorizon,

    #[error("wagon capacity must be positive and finite, got {0} t")]
    InvalidWagonCapacity(f64),

    #[error("minimum wagon utilization must be in (0, 1], got {0}")]
    InvalidUtilization(f64),

    #[error("wagon speed must be positive and finite, got {0} km/day")]
    InvalidSpeed(f64),

    #[error("q_min fraction must be in [0, 1], got {0}")]
    InvalidQminFraction(f64),

    #[error("epsilon must be in (0, 1), got {0}")]
    InvalidEpsilon(f64),
}

fn join_issues(issues: &[NetworkIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
