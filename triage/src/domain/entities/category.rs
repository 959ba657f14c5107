//! Ticket category
//!
//! The closed set of categories a ticket can be classified into.

use serde::{Deserialize, Serialize};

/// Support ticket category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Billing,
    Account,
    FeatureRequest,
    BugReport,
    General,
}

impl Category {
    /// Every category, in prompt order
    pub const ALL: [Category; 6] = [
        Category::Technical,
        Category::Billing,
        Category::Account,
        Category::FeatureRequest,
        Category::BugReport,
        Category::General,
    ];

    /// Stable snake_case key used in storage and in completion responses
    pub fn key(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Billing => "billing",
            Category::Account => "account",
            Category::FeatureRequest => "feature_request",
            Category::BugReport => "bug_report",
            Category::General => "general",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Technical => "Technical Support",
            Category::Billing => "Billing & Payment",
            Category::Account => "Account Management",
            Category::FeatureRequest => "Feature Request",
            Category::BugReport => "Bug Report",
            Category::General => "General Inquiry",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| format!("Unknown ticket category: {}", s))
    }
}
