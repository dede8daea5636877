//! Sale flow tests
//!
//! Covers the money math and lifecycle rules behind sale creation:
//! - line and sale totals
//! - discount and quantity validation
//! - status transitions
//! - sale number sequencing

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{PaymentMethod, SaleStatus};
use shared::validation::{
    default_tax_rate, line_totals, sale_totals, validate_discount_percentage, validate_quantity,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The worked example: 2 units at 100.00, 16% tax
    #[test]
    fn test_reference_sale_totals() {
        let line = line_totals(dec("100.00"), 2, Decimal::ZERO);
        assert_eq!(line.subtotal, dec("200.00"));

        let totals = sale_totals(&[line.subtotal], Decimal::ZERO, default_tax_rate());
        assert_eq!(totals.subtotal, dec("200.00"));
        assert_eq!(totals.tax_amount, dec("32.00"));
        assert_eq!(totals.total, dec("232.00"));
    }

    /// Line discount applies before the sale-level discount
    #[test]
    fn test_line_discount_independent_of_sale_discount() {
        let line = line_totals(dec("100.00"), 1, dec("50"));
        assert_eq!(line.discount_amount, dec("50.00"));
        assert_eq!(line.subtotal, dec("50.00"));

        let totals = sale_totals(&[line.subtotal], dec("10.00"), dec("0.16"));
        // taxable = 50 - 10 = 40, tax = 6.40
        assert_eq!(totals.tax_amount, dec("6.40"));
        assert_eq!(totals.total, dec("46.40"));
    }

    /// Multiple lines accumulate into the sale subtotal
    #[test]
    fn test_multi_line_subtotal() {
        let lines = vec![
            line_totals(dec("10.00"), 3, Decimal::ZERO).subtotal,
            line_totals(dec("25.50"), 2, Decimal::ZERO).subtotal,
            line_totals(dec("5.00"), 1, dec("20")).subtotal,
        ];
        let totals = sale_totals(&lines, Decimal::ZERO, Decimal::ZERO);
        // 30 + 51 + 4 = 85
        assert_eq!(totals.subtotal, dec("85.00"));
        assert_eq!(totals.total, dec("85.00"));
    }

    /// A zero tax rate leaves the total at the discounted subtotal
    #[test]
    fn test_zero_tax_rate() {
        let totals = sale_totals(&[dec("100.00")], dec("20.00"), Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, dec("80.00"));
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_discount_percentage_range() {
        assert!(validate_discount_percentage(dec("0")).is_ok());
        assert!(validate_discount_percentage(dec("100")).is_ok());
        assert!(validate_discount_percentage(dec("101")).is_err());
        assert!(validate_discount_percentage(dec("-1")).is_err());
    }

    #[test]
    fn test_payment_methods() {
        for method in ["cash", "card", "transfer", "credit"] {
            assert!(PaymentMethod::parse(method).is_some());
        }
        assert!(PaymentMethod::parse("check").is_none());
        assert!(PaymentMethod::parse("CASH").is_none());
    }

    /// Quotes can complete or cancel; completed sales can cancel or refund
    #[test]
    fn test_lifecycle_transitions() {
        assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Completed));
        assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Refunded));

        // Terminal states stay terminal
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Completed));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Draft));
        assert!(!SaleStatus::Refunded.can_transition_to(SaleStatus::Cancelled));
    }

    #[test]
    fn test_only_completed_sales_touch_stock() {
        assert!(SaleStatus::Completed.affects_stock());
        assert!(!SaleStatus::Draft.affects_stock());
    }

    /// Sale numbers within a year are sequential from 0001
    #[test]
    fn test_sale_number_sequence() {
        let numbers: Vec<String> = (1..=3).map(|n| format!("V-2025-{:04}", n)).collect();
        assert_eq!(numbers, vec!["V-2025-0001", "V-2025-0002", "V-2025-0003"]);

        // The next number parses the numeric suffix, not the string order
        let max: u32 = numbers
            .iter()
            .filter_map(|n| n.rsplit('-').next()?.parse().ok())
            .max()
            .unwrap();
        assert_eq!(max + 1, 4);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for unit prices (0.01 to 1000.00)
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for quantities
    fn quantity_strategy() -> impl Strategy<Value = i32> {
        1i32..=500
    }

    /// Strategy for discount percentages in [0, 100]
    fn discount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// subtotal = unit_price * quantity - discount_amount, always
        #[test]
        fn prop_line_subtotal_identity(
            price in price_strategy(),
            quantity in quantity_strategy(),
            pct in discount_strategy()
        ) {
            let line = line_totals(price, quantity, pct);
            let gross = price * Decimal::from(quantity);
            prop_assert_eq!(line.subtotal, gross - line.discount_amount);
        }

        /// A line discount never exceeds the gross amount
        #[test]
        fn prop_line_discount_bounded(
            price in price_strategy(),
            quantity in quantity_strategy(),
            pct in discount_strategy()
        ) {
            let line = line_totals(price, quantity, pct);
            let gross = price * Decimal::from(quantity);
            prop_assert!(line.discount_amount >= Decimal::ZERO);
            prop_assert!(line.discount_amount <= gross);
            prop_assert!(line.subtotal >= Decimal::ZERO);
        }

        /// total = subtotal - discount + tax for every cart shape
        #[test]
        fn prop_sale_total_identity(
            subtotals in prop::collection::vec(price_strategy(), 1..10),
            discount in (0i64..=1000i64).prop_map(|n| Decimal::new(n, 2))
        ) {
            let totals = sale_totals(&subtotals, discount, dec("0.16"));
            let expected_subtotal: Decimal = subtotals.iter().copied().sum();
            prop_assert_eq!(totals.subtotal, expected_subtotal);
            prop_assert_eq!(
                totals.total,
                totals.subtotal - totals.discount_amount + totals.tax_amount
            );
        }

        /// Tax is proportional to the discounted subtotal
        #[test]
        fn prop_tax_on_discounted_base(
            subtotal in price_strategy(),
            rate in (0i64..=50i64).prop_map(|n| Decimal::new(n, 2))
        ) {
            let totals = sale_totals(&[subtotal], Decimal::ZERO, rate);
            prop_assert_eq!(totals.tax_amount, (subtotal * rate).round_dp(2));
        }

        /// A full 100% line discount zeroes the line
        #[test]
        fn prop_full_discount_zeroes_line(
            price in price_strategy(),
            quantity in quantity_strategy()
        ) {
            let line = line_totals(price, quantity, dec("100"));
            prop_assert_eq!(line.subtotal, Decimal::ZERO);
        }

        /// Every status has exactly the allowed transitions and no more
        #[test]
        fn prop_transition_matrix_closed(from_idx in 0usize..4, to_idx in 0usize..4) {
            let states = [
                SaleStatus::Draft,
                SaleStatus::Completed,
                SaleStatus::Cancelled,
                SaleStatus::Refunded,
            ];
            let from = states[from_idx];
            let to = states[to_idx];

            let allowed = matches!(
                (from, to),
                (SaleStatus::Draft, SaleStatus::Completed)
                    | (SaleStatus::Draft, SaleStatus::Cancelled)
                    | (SaleStatus::Completed, SaleStatus::Cancelled)
                    | (SaleStatus::Completed, SaleStatus::Refunded)
            );
            prop_assert_eq!(from.can_transition_to(to), allowed);
        }
    }
}

// ============================================================================
// Stock validation simulation
// ============================================================================

#[cfg(test)]
mod stock_validation {
    use super::*;

    /// Mirror of the all-or-nothing cart check: any failing line rejects
    /// the whole sale
    fn validate_cart(lines: &[(i32, i32)]) -> Result<(), Vec<usize>> {
        let failing: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, (requested, stock))| requested > stock || *requested <= 0)
            .map(|(idx, _)| idx)
            .collect();
        if failing.is_empty() {
            Ok(())
        } else {
            Err(failing)
        }
    }

    #[test]
    fn test_cart_accepted_when_stock_suffices() {
        assert!(validate_cart(&[(2, 10), (1, 1)]).is_ok());
    }

    #[test]
    fn test_cart_rejected_as_a_whole() {
        // One bad line rejects everything, and every bad line is reported
        let result = validate_cart(&[(2, 10), (5, 3), (0, 10)]);
        assert_eq!(result.unwrap_err(), vec![1, 2]);
    }

    #[test]
    fn test_exact_stock_is_sellable() {
        assert!(validate_cart(&[(10, 10)]).is_ok());
        assert!(validate_cart(&[(11, 10)]).is_err());
    }
}
