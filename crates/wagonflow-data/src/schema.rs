//! Serde data file structs for scenario definitions.
//!
//! These structs define the on-disk format of the three network tables. They
//! are deserialized from RON, JSON, or TOML data files and then converted
//! into engine input rows by the loader. Values must already be typed:
//! locale-formatted numbers are rejected as parse errors.

use serde::Deserialize;
use wagonflow_core::network::{DestinationInput, NetworkInput, OriginInput, RelationInput};

// ===========================================================================
// Origins
// ===========================================================================

/// An origin row in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct OriginData {
    pub id: String,
    pub daily_loading_capacity_tons: f64,
    pub initial_available_product_tons: f64,
}

// ===========================================================================
// Destinations
// ===========================================================================

/// A destination row in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationData {
    pub id: String,
    pub daily_unloading_capacity_tons: f64,
    pub annual_demand_tons: f64,
}

// ===========================================================================
// Relations
// ===========================================================================

/// A profitability flag, written either as a boolean or as `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProfitabilityFlag {
    Bool(bool),
    Int(i64),
}

impl ProfitabilityFlag {
    /// `None` for integers other than 0 and 1.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            ProfitabilityFlag::Bool(b) => Some(b),
            ProfitabilityFlag::Int(0) => Some(false),
            ProfitabilityFlag::Int(1) => Some(true),
            ProfitabilityFlag::Int(_) => None,
        }
    }
}

/// A relation row in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationData {
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub profitability: ProfitabilityFlag,
}

// ===========================================================================
// Conversion
// ===========================================================================

/// Strip surrounding whitespace from an identifier.
fn clean_id(id: &str) -> String {
    id.trim().to_string()
}

impl From<OriginData> for OriginInput {
    fn from(row: OriginData) -> Self {
        OriginInput {
            id: clean_id(&row.id),
            daily_loading_capacity_tons: row.daily_loading_capacity_tons,
            initial_available_product_tons: row.initial_available_product_tons,
        }
    }
}

impl From<DestinationData> for DestinationInput {
    fn from(row: DestinationData) -> Self {
        DestinationInput {
            id: clean_id(&row.id),
            daily_unloading_capacity_tons: row.daily_unloading_capacity_tons,
            annual_demand_tons: row.annual_demand_tons,
        }
    }
}

impl RelationData {
    /// Convert to an engine row. `None` if the profitability flag is not
    /// a boolean, 0 or 1.
    pub fn into_input(self) -> Option<RelationInput> {
        Some(RelationInput {
            origin: clean_id(&self.origin),
            destination: clean_id(&self.destination),
            distance_km: self.distance_km,
            profitable: self.profitability.as_bool()?,
        })
    }
}

/// Assemble the three tables. Relations are converted by the caller, which
/// owns error reporting for bad flags.
pub fn network_input(
    origins: Vec<OriginData>,
    destinations: Vec<DestinationData>,
    relations: Vec<RelationInput>,
) -> NetworkInput {
    NetworkInput {
        origins: origins.into_iter().map(Into::into).collect(),
        destinations: destinations.into_iter().map(Into::into).collect(),
        relations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_bool_and_binary_int() {
        let flags: Vec<ProfitabilityFlag> = serde_json::from_str("[true, false, 1, 0, 7]").unwrap();
        let decoded: Vec<Option<bool>> = flags.into_iter().map(ProfitabilityFlag::as_bool).collect();
        assert_eq!(decoded, vec![Some(true), Some(false), Some(true), Some(false), None]);
    }

    #[test]
    fn ids_are_trimmed() {
        let row = OriginData {
            id: "  MINE-A ".into(),
            daily_loading_capacity_tons: 1.0,
            initial_available_product_tons: 2.0,
        };
        assert_eq!(OriginInput::from(row).id, "MINE-A");

        let rel = RelationData {
            origin: " A".into(),
            destination: "B ".into(),
            distance_km: 10.0,
            profitability: ProfitabilityFlag::Int(1),
        };
        let input = rel.into_input().unwrap();
        assert_eq!((input.origin.as_str(), input.destination.as_str()), ("A", "B"));
        assert!(input.profitable);
    }

    #[test]
    fn relation_row_from_ron() {
        let rows: Vec<RelationData> = ron::from_str(
            r#"[(origin: "A", destination: "B", distance_km: 120.0, profitability: true)]"#,
        )
        .unwrap();
        assert_eq!(rows[0].profitability, ProfitabilityFlag::Bool(true));
    }
}
