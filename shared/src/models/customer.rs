//! Customer models

use serde::{Deserialize, Serialize};

/// Customer classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Retail,
    Wholesale,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Retail => "retail",
            CustomerType::Wholesale => "wholesale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "retail" => Some(CustomerType::Retail),
            "wholesale" => Some(CustomerType::Wholesale),
            _ => None,
        }
    }
}
