//! Whole-input checks run before a network is built.
//!
//! Every problem is collected, not just the first one, so a caller fixing a
//! data file sees the full list in a single [`ConfigError::InvalidNetwork`].
//!
//! [`ConfigError::InvalidNetwork`]: crate::error::ConfigError::InvalidNetwork

use std::collections::HashSet;

use crate::error::NetworkIssue;
use crate::id::NodeKind;
use crate::network::NetworkInput;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Validate the three input tables. Returns every issue found.
pub fn validate_network_input(input: &NetworkInput) -> Result<(), Vec<NetworkIssue>> {
    let mut issues = Vec::new();

    let origin_ids = check_nodes(
        NodeKind::Origin,
        input.origins.iter().map(|o| {
            (
                o.id.as_str(),
                [
                    ("daily_loading_capacity_tons", o.daily_loading_capacity_tons),
                    ("initial_available_product_tons", o.initial_available_product_tons),
                ],
            )
        }),
        &mut issues,
    );
    let destination_ids = check_nodes(
        NodeKind::Destination,
        input.destinations.iter().map(|d| {
            (
                d.id.as_str(),
                [
                    ("daily_unloading_capacity_tons", d.daily_unloading_capacity_tons),
                    ("annual_demand_tons", d.annual_demand_tons),
                ],
            )
        }),
        &mut issues,
    );

    let mut pairs = HashSet::new();
    for (row, rel) in input.relations.iter().enumerate() {
        if !origin_ids.contains(rel.origin.as_str()) {
            issues.push(NetworkIssue::UnknownReference {
                row,
                kind: NodeKind::Origin,
                id: rel.origin.clone(),
            });
        }
        if !destination_ids.contains(rel.destination.as_str()) {
            issues.push(NetworkIssue::UnknownReference {
                row,
                kind: NodeKind::Destination,
                id: rel.destination.clone(),
            });
        }
        if !(rel.distance_km.is_finite() && rel.distance_km > 0.0) {
            issues.push(NetworkIssue::InvalidDistance {
                origin: rel.origin.clone(),
                destination: rel.destination.clone(),
                distance_km: rel.distance_km,
            });
        }
        if !pairs.insert((rel.origin.as_str(), rel.destination.as_str())) {
            issues.push(NetworkIssue::DuplicateRelation {
                origin: rel.origin.clone(),
                destination: rel.destination.clone(),
            });
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check ids and quantities of one node table, returning the set of ids seen.
fn check_nodes<'a>(
    kind: NodeKind,
    rows: impl Iterator<Item = (&'a str, [(&'static str, f64); 2])>,
    issues: &mut Vec<NetworkIssue>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for (row, (id, quantities)) in rows.enumerate() {
        if id.trim().is_empty() {
            issues.push(NetworkIssue::EmptyId { kind, row });
            continue;
        }
        if !seen.insert(id) {
            issues.push(NetworkIssue::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
        for (field, value) in quantities {
            if !(value.is_finite() && value >= 0.0) {
                issues.push(NetworkIssue::InvalidQuantity {
                    kind,
                    id: id.to_string(),
                    field,
                    value,
                });
            }
        }
    }
    seen
}
