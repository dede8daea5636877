//! Validation rules and money math for the PrismaTech platform
//!
//! Everything here is pure so sale totals and catalog rules can be
//! exercised without a database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default sales tax rate (16%)
pub fn default_tax_rate() -> Decimal {
    Decimal::new(16, 2)
}

/// Computed amounts for a single sale line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
}

/// Compute a line's discount and subtotal:
/// `discount = unit_price * quantity * pct / 100`,
/// `subtotal = unit_price * quantity - discount`.
/// Computed once at sale creation and never recomputed.
pub fn line_totals(unit_price: Decimal, quantity: i32, discount_percentage: Decimal) -> LineTotals {
    let gross = unit_price * Decimal::from(quantity);
    let discount_amount = (gross * discount_percentage / Decimal::from(100)).round_dp(2);
    LineTotals {
        discount_amount,
        subtotal: gross - discount_amount,
    }
}

/// Computed amounts for a whole sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Compute sale totals from line subtotals, a sale-level discount and the
/// tax rate: tax applies to the discounted subtotal.
pub fn sale_totals(
    line_subtotals: &[Decimal],
    discount_amount: Decimal,
    tax_rate: Decimal,
) -> SaleTotals {
    let subtotal: Decimal = line_subtotals.iter().copied().sum();
    let taxable = subtotal - discount_amount;
    let tax_amount = (taxable * tax_rate).round_dp(2);
    SaleTotals {
        subtotal,
        discount_amount,
        tax_amount,
        total: taxable + tax_amount,
    }
}

/// Validate a line discount percentage is within [0, 100]
pub fn validate_discount_percentage(pct: Decimal) -> Result<(), &'static str> {
    if pct < Decimal::ZERO || pct > Decimal::from(100) {
        return Err("Discount percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a quantity is a positive integer
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

/// Validate a price is strictly positive
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be greater than zero");
    }
    Ok(())
}

/// Build a URL slug from a display name: lowercase ASCII alphanumerics
/// joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn line_totals_without_discount() {
        let t = line_totals(dec("100.00"), 2, Decimal::ZERO);
        assert_eq!(t.discount_amount, Decimal::ZERO);
        assert_eq!(t.subtotal, dec("200.00"));
    }

    #[test]
    fn line_totals_with_discount() {
        let t = line_totals(dec("50.00"), 4, dec("10"));
        // 200 gross, 10% = 20 off
        assert_eq!(t.discount_amount, dec("20.00"));
        assert_eq!(t.subtotal, dec("180.00"));
    }

    #[test]
    fn sale_totals_reference_example() {
        // Two units at 100.00, default 16% tax
        let lines = vec![line_totals(dec("100.00"), 2, Decimal::ZERO).subtotal];
        let t = sale_totals(&lines, Decimal::ZERO, default_tax_rate());
        assert_eq!(t.subtotal, dec("200.00"));
        assert_eq!(t.tax_amount, dec("32.00"));
        assert_eq!(t.total, dec("232.00"));
    }

    #[test]
    fn sale_totals_with_sale_level_discount() {
        let lines = vec![dec("100.00"), dec("50.00")];
        let t = sale_totals(&lines, dec("30.00"), default_tax_rate());
        assert_eq!(t.subtotal, dec("150.00"));
        // taxable 120, tax 19.20
        assert_eq!(t.tax_amount, dec("19.20"));
        assert_eq!(t.total, dec("139.20"));
    }

    #[test]
    fn discount_percentage_bounds() {
        assert!(validate_discount_percentage(Decimal::ZERO).is_ok());
        assert!(validate_discount_percentage(dec("100")).is_ok());
        assert!(validate_discount_percentage(dec("100.01")).is_err());
        assert!(validate_discount_percentage(dec("-0.01")).is_err());
    }

    #[test]
    fn quantity_and_price_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_price(dec("0.01")).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Brake Pad Set"), "brake-pad-set");
        assert_eq!(slugify("  Óleo 5W-30 (1L) "), "leo-5w-30-1l");
        assert_eq!(slugify("---"), "");
    }
}
