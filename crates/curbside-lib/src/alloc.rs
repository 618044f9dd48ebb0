use crate::model::{Category, NodeId, DEPOT_NODE};

/// Prefix used for non-depot node identifiers.
const BIN_PREFIX: &str = "Bin";

/// Allocate the node identifier for a new point.
///
/// The depot always receives the reserved `Depot` identifier; the caller is
/// responsible for having already enforced the single-depot invariant.
/// Every other category receives the lowest unused positive integer suffix
/// (`Bin1`, `Bin2`, ...), so identifiers freed by deletion are reused.
///
/// This is a plain O(n) scan over the current identifiers with no
/// reservation. Concurrent insertions must be serialized by the store.
pub fn next_node_id(category: Category, existing: &[NodeId]) -> NodeId {
    if category == Category::Depot {
        return DEPOT_NODE.to_string();
    }

    let mut index = 1usize;
    loop {
        let candidate = format!("{BIN_PREFIX}{index}");
        if !existing.iter().any(|node| node == &candidate) {
            return candidate;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(values: &[&str]) -> Vec<NodeId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn depot_uses_reserved_identifier() {
        assert_eq!(next_node_id(Category::Depot, &nodes(&["Bin1"])), "Depot");
    }

    #[test]
    fn first_bin_starts_at_one() {
        assert_eq!(next_node_id(Category::Residential, &[]), "Bin1");
    }

    #[test]
    fn allocation_fills_the_lowest_gap() {
        let existing = nodes(&["Depot", "Bin1", "Bin2", "Bin4"]);
        assert_eq!(next_node_id(Category::School, &existing), "Bin3");
    }

    #[test]
    fn allocation_appends_when_dense() {
        let existing = nodes(&["Bin1", "Bin2", "Bin3"]);
        assert_eq!(next_node_id(Category::Public, &existing), "Bin4");
    }
}
