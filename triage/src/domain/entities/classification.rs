//! Classification result
//!
//! Transient value produced per classifier call and written back onto a ticket.

use serde::{Deserialize, Serialize};

use super::category::Category;

/// Maximum stored explanation length, in characters
pub const MAX_EXPLANATION_CHARS: usize = 100;

/// Category used when the completion names a category outside the fixed set
pub const DEFAULT_CATEGORY: Category = Category::General;

/// Result of classifying one ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub explanation: String,
    pub confidence: f64,
}

impl Classification {
    /// Build a classification from loosely-typed completion output
    ///
    /// Unknown categories map to [`DEFAULT_CATEGORY`], confidence is clamped to
    /// [0, 1] and the explanation is trimmed then cut to [`MAX_EXPLANATION_CHARS`].
    pub fn normalized(category: &str, explanation: &str, confidence: f64) -> Self {
        let category = category.parse().unwrap_or(DEFAULT_CATEGORY);
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        let explanation = explanation
            .trim()
            .chars()
            .take(MAX_EXPLANATION_CHARS)
            .collect();

        Self {
            category,
            explanation,
            confidence,
        }
    }
}

/// Partial ticket update written by a classification run
///
/// `category` is `None` when the ticket's category must be left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationUpdate {
    pub category: Option<Category>,
    pub explanation: String,
    pub confidence: f64,
}
