use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies an origin (supply node) in the network.
    pub struct OriginKey;

    /// Identifies a destination (demand node) in the network.
    pub struct DestinationKey;

    /// Identifies a relation (permitted origin-destination link).
    pub struct RelationKey;
}

/// Which side of the bipartite network an external id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Origin,
    Destination,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Origin => f.write_str("origin"),
            NodeKind::Destination => f.write_str("destination"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn keys_are_distinct_per_insert() {
        let mut map: SlotMap<OriginKey, &str> = SlotMap::with_key();
        let a = map.insert("MINE-A");
        let b = map.insert("MINE-B");
        assert_ne!(a, b);
        assert_eq!(map[a], "MINE-A");
    }

    #[test]
    fn keys_are_hashable() {
        use std::collections::HashMap;
        let mut map: SlotMap<DestinationKey, ()> = SlotMap::with_key();
        let k = map.insert(());
        let mut lookup = HashMap::new();
        lookup.insert(k, "PORT");
        assert_eq!(lookup[&k], "PORT");
    }

    #[test]
    fn node_kind_display() {
        assert_eq!(NodeKind::Origin.to_string(), "origin");
        assert_eq!(NodeKind::Destination.to_string(), "destination");
    }
}
