//! Keyword categorization
//!
//! Case-insensitive substring matching against fixed keyword sets, checked
//! in priority order. The first set with a hit decides the category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse document category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Finance,
    Legal,
    Technical,
    #[serde(rename = "HR")]
    Hr,
    General,
}

/// Keyword sets in priority order
const RULES: &[(Category, &[&str])] = &[
    (Category::Finance, &["invoice", "payment", "salary", "budget"]),
    (Category::Legal, &["legal", "contract", "agreement", "compliance"]),
    (Category::Technical, &["technical", "engineering", "specification", "design"]),
    (Category::Hr, &["employee", "leave", "recruitment", "policy"]),
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Legal => "Legal",
            Category::Technical => "Technical",
            Category::Hr => "HR",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assign a category to document text
pub fn categorize(text: &str) -> Category {
    let text = text.to_lowercase();

    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}
