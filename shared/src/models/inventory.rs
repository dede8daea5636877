//! Inventory ledger models

use serde::{Deserialize, Serialize};

/// Types of inventory movements
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Stock increase (restock, restore, sale cancellation)
    In,
    /// Stock decrease (sale, soft delete, manual reduction)
    Out,
    /// Absolute correction to a counted value
    Adjustment,
    /// Opening stock recorded at product creation
    Initial,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Initial => "initial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "adjustment" => Some(MovementType::Adjustment),
            "initial" => Some(MovementType::Initial),
            _ => None,
        }
    }

    /// Derive the movement for a stock change: `in` when stock rose,
    /// `out` when it fell, with `quantity = |new - old|`. Returns `None`
    /// when the stock did not change.
    pub fn for_stock_delta(previous: i32, new: i32) -> Option<(MovementType, i32)> {
        match new.cmp(&previous) {
            std::cmp::Ordering::Greater => Some((MovementType::In, new - previous)),
            std::cmp::Ordering::Less => Some((MovementType::Out, previous - new)),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Snapshot consistency check for a movement row:
/// new_stock must equal previous_stock +/- quantity depending on type.
pub fn movement_is_consistent(
    movement_type: MovementType,
    quantity: i32,
    previous_stock: i32,
    new_stock: i32,
) -> bool {
    match movement_type {
        MovementType::In | MovementType::Initial => previous_stock + quantity == new_stock,
        MovementType::Out => previous_stock - quantity == new_stock,
        // Adjustments set an absolute value; quantity records the delta size
        MovementType::Adjustment => (previous_stock - new_stock).abs() == quantity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_derivation() {
        assert_eq!(
            MovementType::for_stock_delta(8, 3),
            Some((MovementType::Out, 5))
        );
        assert_eq!(
            MovementType::for_stock_delta(3, 8),
            Some((MovementType::In, 5))
        );
        assert_eq!(MovementType::for_stock_delta(5, 5), None);
    }

    #[test]
    fn consistency_check() {
        assert!(movement_is_consistent(MovementType::Out, 5, 8, 3));
        assert!(movement_is_consistent(MovementType::In, 5, 3, 8));
        assert!(movement_is_consistent(MovementType::Initial, 10, 0, 10));
        assert!(movement_is_consistent(MovementType::Adjustment, 3, 10, 7));
        assert!(!movement_is_consistent(MovementType::Out, 5, 8, 4));
    }
}
