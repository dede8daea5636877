//! Inventory ledger tests
//!
//! Covers movement derivation and the snapshot invariants:
//! - movement type from a stock delta
//! - previous/new stock consistency
//! - stock never negative across operation sequences

use proptest::prelude::*;
use shared::models::{movement_is_consistent, MovementType};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// PATCH stock 8 -> 3 appends one `out` movement of 5
    #[test]
    fn test_patch_stock_decrease() {
        let (movement_type, quantity) = MovementType::for_stock_delta(8, 3).unwrap();
        assert_eq!(movement_type, MovementType::Out);
        assert_eq!(quantity, 5);
        assert!(movement_is_consistent(movement_type, quantity, 8, 3));
    }

    /// Restock 3 -> 8 appends one `in` movement of 5
    #[test]
    fn test_stock_increase() {
        let (movement_type, quantity) = MovementType::for_stock_delta(3, 8).unwrap();
        assert_eq!(movement_type, MovementType::In);
        assert_eq!(quantity, 5);
        assert!(movement_is_consistent(movement_type, quantity, 3, 8));
    }

    /// An unchanged stock writes no movement
    #[test]
    fn test_no_movement_without_delta() {
        assert_eq!(MovementType::for_stock_delta(7, 7), None);
    }

    /// Soft delete of a product at stock 5 records out/5 down to zero
    #[test]
    fn test_soft_delete_movement() {
        let stock = 5;
        let (movement_type, quantity) = MovementType::for_stock_delta(stock, 0).unwrap();
        assert_eq!(movement_type, MovementType::Out);
        assert_eq!(quantity, 5);
        assert!(movement_is_consistent(movement_type, quantity, stock, 0));
    }

    /// Initial stock at creation records initial/qty from zero
    #[test]
    fn test_initial_movement() {
        assert!(movement_is_consistent(MovementType::Initial, 10, 0, 10));
        assert!(!movement_is_consistent(MovementType::Initial, 10, 5, 10));
    }

    /// Inconsistent snapshots are detected
    #[test]
    fn test_snapshot_consistency_violations() {
        assert!(!movement_is_consistent(MovementType::Out, 5, 8, 4));
        assert!(!movement_is_consistent(MovementType::In, 5, 3, 9));
        assert!(!movement_is_consistent(MovementType::Adjustment, 2, 10, 7));
    }

    #[test]
    fn test_movement_type_round_trip() {
        for t in [
            MovementType::In,
            MovementType::Out,
            MovementType::Adjustment,
            MovementType::Initial,
        ] {
            assert_eq!(MovementType::parse(t.as_str()), Some(t));
        }
        assert_eq!(MovementType::parse("transfer"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Quantity always equals the absolute delta
        #[test]
        fn prop_quantity_is_absolute_delta(previous in 0i32..10_000, new in 0i32..10_000) {
            match MovementType::for_stock_delta(previous, new) {
                Some((_, quantity)) => {
                    prop_assert_eq!(quantity, (new - previous).abs());
                    prop_assert!(quantity > 0);
                }
                None => prop_assert_eq!(previous, new),
            }
        }

        /// The derived movement always passes the consistency check
        #[test]
        fn prop_derived_movement_consistent(previous in 0i32..10_000, new in 0i32..10_000) {
            if let Some((movement_type, quantity)) = MovementType::for_stock_delta(previous, new) {
                prop_assert!(movement_is_consistent(movement_type, quantity, previous, new));
            }
        }

        /// Replaying a ledger from its snapshots reproduces the final stock
        #[test]
        fn prop_ledger_replay(levels in prop::collection::vec(0i32..1_000, 2..20)) {
            let mut stock = levels[0];
            for window in levels.windows(2) {
                let (previous, new) = (window[0], window[1]);
                prop_assert_eq!(stock, previous);
                if let Some((movement_type, quantity)) =
                    MovementType::for_stock_delta(previous, new)
                {
                    stock = match movement_type {
                        MovementType::In | MovementType::Initial => stock + quantity,
                        MovementType::Out => stock - quantity,
                        MovementType::Adjustment => new,
                    };
                }
                prop_assert_eq!(stock, new);
            }
        }
    }
}

// ============================================================================
// Stock invariant simulation
// ============================================================================

#[cfg(test)]
mod stock_invariant {
    use super::*;

    /// Guarded stock mutation mirroring the service rules: outgoing
    /// movements are rejected rather than driving stock negative
    fn apply(stock: i32, movement_type: MovementType, quantity: i32) -> Result<i32, &'static str> {
        if quantity <= 0 {
            return Err("quantity must be positive");
        }
        match movement_type {
            MovementType::In | MovementType::Initial => Ok(stock + quantity),
            MovementType::Out => {
                if quantity > stock {
                    Err("insufficient stock")
                } else {
                    Ok(stock - quantity)
                }
            }
            MovementType::Adjustment => Ok(quantity),
        }
    }

    #[test]
    fn test_out_rejected_beyond_stock() {
        assert_eq!(apply(10, MovementType::Out, 4), Ok(6));
        assert!(apply(10, MovementType::Out, 11).is_err());
        assert_eq!(apply(10, MovementType::Out, 10), Ok(0));
    }

    proptest! {
        /// Stock stays non-negative under any accepted movement sequence
        #[test]
        fn prop_stock_never_negative(
            ops in prop::collection::vec((0u8..3, 1i32..100), 1..50)
        ) {
            let mut stock = 0i32;
            for (kind, quantity) in ops {
                let movement_type = match kind {
                    0 => MovementType::In,
                    1 => MovementType::Out,
                    _ => MovementType::Adjustment,
                };
                if let Ok(new_stock) = apply(stock, movement_type, quantity) {
                    stock = new_stock;
                }
                prop_assert!(stock >= 0);
            }
        }
    }
}
