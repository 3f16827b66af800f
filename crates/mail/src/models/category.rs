//! Canonical category table and normalization
//!
//! Categories are a small fixed vocabulary. All three query consumers (the
//! filter compiler, the search compiler, and the client predicate) normalize
//! through the same table; the predicate merely differs in what it does when
//! normalization fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a category value cannot be normalized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("category value is empty")]
    Empty,
    #[error("unknown category: '{0}'")]
    Unknown(String),
}

/// A canonical mailbox category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Finance,
    Travel,
    Newsletters,
    Social,
}

impl Category {
    /// Canonical display value, as stored on messages by the remote API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Finance => "Finance",
            Self::Travel => "Travel",
            Self::Newsletters => "Newsletters",
            Self::Social => "Social",
        }
    }
}

/// Immutable lookup table mapping accepted inputs to canonical categories.
///
/// Constructed rather than global so tests can substitute an alternate
/// vocabulary.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: &'static [(&'static str, Category)],
}

const STANDARD_CATEGORIES: &[(&str, Category)] = &[
    ("work", Category::Work),
    ("personal", Category::Personal),
    ("finance", Category::Finance),
    ("travel", Category::Travel),
    ("newsletters", Category::Newsletters),
    ("social", Category::Social),
];

impl CategoryTable {
    /// The standard six-category vocabulary
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_CATEGORIES,
        }
    }

    /// Build a table over an alternate vocabulary (keys must be lowercase)
    pub fn new(entries: &'static [(&'static str, Category)]) -> Self {
        Self { entries }
    }

    /// Normalize an input value to its canonical category.
    ///
    /// Input is trimmed and matched case-insensitively. Empty or
    /// whitespace-only input and values outside the table fail fast.
    pub fn normalize(&self, input: &str) -> Result<Category, CategoryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::Empty);
        }
        let lowered = trimmed.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == lowered)
            .map(|(_, category)| *category)
            .ok_or_else(|| CategoryError::Unknown(trimmed.to_string()))
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}
