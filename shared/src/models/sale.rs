//! Sale lifecycle models

use serde::{Deserialize, Serialize};

/// Accepted payment methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "transfer" => Some(PaymentMethod::Transfer),
            "credit" => Some(PaymentMethod::Credit),
            _ => None,
        }
    }
}

/// Payment settlement state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
        }
    }
}

/// Sale lifecycle state
///
/// A draft ("quote") has no stock effect. Completing a draft applies the
/// stock decrement; cancelling or refunding a completed sale restores it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Draft,
    Completed,
    Cancelled,
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SaleStatus::Draft),
            "completed" => Some(SaleStatus::Completed),
            "cancelled" => Some(SaleStatus::Cancelled),
            "refunded" => Some(SaleStatus::Refunded),
            _ => None,
        }
    }

    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Draft, SaleStatus::Completed)
                | (SaleStatus::Draft, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Refunded)
        )
    }

    /// Whether sales in this state count toward stock and customer totals
    pub fn affects_stock(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_transitions() {
        assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Completed));
        assert!(SaleStatus::Draft.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Refunded));
    }

    #[test]
    fn rejected_transitions() {
        assert!(!SaleStatus::Draft.can_transition_to(SaleStatus::Refunded));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Completed));
        assert!(!SaleStatus::Refunded.can_transition_to(SaleStatus::Completed));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Draft));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Completed));
    }

    #[test]
    fn payment_method_parsing() {
        assert_eq!(PaymentMethod::parse("cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::parse("bitcoin"), None);
    }

    #[test]
    fn only_completed_affects_stock() {
        assert!(SaleStatus::Completed.affects_stock());
        assert!(!SaleStatus::Draft.affects_stock());
        assert!(!SaleStatus::Cancelled.affects_stock());
        assert!(!SaleStatus::Refunded.affects_stock());
    }
}
