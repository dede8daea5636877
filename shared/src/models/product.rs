//! Product catalog models

use serde::{Deserialize, Serialize};

/// Active/inactive status used by products, categories and customers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    #[default]
    Active,
    Inactive,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EntityStatus::Active),
            "inactive" => Some(EntityStatus::Inactive),
            _ => None,
        }
    }
}

/// Stock level bucket derived from current stock and the minimum threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Normal,
}

impl StockStatus {
    /// Classify a stock level against its minimum threshold
    pub fn classify(stock: i32, min_stock: i32) -> Self {
        if stock <= 0 {
            StockStatus::OutOfStock
        } else if stock <= min_stock {
            StockStatus::LowStock
        } else {
            StockStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::Normal => "normal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "out_of_stock" => Some(StockStatus::OutOfStock),
            "low_stock" => Some(StockStatus::LowStock),
            "normal" => Some(StockStatus::Normal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_status_classification() {
        assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(-1, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(3, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(6, 5), StockStatus::Normal);
    }

    #[test]
    fn entity_status_round_trip() {
        assert_eq!(EntityStatus::parse("active"), Some(EntityStatus::Active));
        assert_eq!(EntityStatus::parse("inactive"), Some(EntityStatus::Inactive));
        assert_eq!(EntityStatus::parse("deleted"), None);
        assert_eq!(EntityStatus::Active.as_str(), "active");
    }
}
