use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::transaction::TransactionKind;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Shopping",
    "Transport",
    "Housing",
    "Entertainment",
    "Bills",
    "Healthcare",
    "Education",
    "Utilities",
    "Travel",
    "Insurance",
    "Personal Care",
    "Gifts",
    "Investments",
    "Other",
];

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Business",
    "Investments",
    "Freelance",
    "Gifts",
    "Rental",
    "Refunds",
    "Other",
];

/// Icon shown for categories without a dedicated one.
pub const FALLBACK_ICON: &str = "help-circle";

/// Icon shown on the "all categories" chip.
pub const ALL_ICON: &str = "apps";

static ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("food", "restaurant"),
        ("bills", "shield"),
        ("shopping", "cart"),
        ("transport", "car"),
        ("housing", "home"),
        ("entertainment", "game-controller"),
        ("healthcare", "medical"),
        ("education", "school"),
        ("utilities", "flash"),
        ("travel", "airplane"),
        ("insurance", "shield-checkmark"),
        ("personal care", "person"),
        ("gifts", "gift"),
        ("investments", "trending-up"),
        ("salary", "cash"),
        ("business", "briefcase"),
        ("freelance", "laptop"),
        ("rental", "key"),
        ("refunds", "return-up-back"),
        ("other", "ellipsis-horizontal"),
    ])
});

/// Which side of the catalog to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryScope {
    Income,
    Expense,
    All,
}

impl From<TransactionKind> for CategoryScope {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => CategoryScope::Income,
            TransactionKind::Expense => CategoryScope::Expense,
        }
    }
}

/// Categories offered for a scope. `All` merges both lists, income first, keeping
/// the first appearance of names shared by both sides.
pub fn categories_by_type(scope: CategoryScope) -> Vec<&'static str> {
    match scope {
        CategoryScope::Income => INCOME_CATEGORIES.to_vec(),
        CategoryScope::Expense => EXPENSE_CATEGORIES.to_vec(),
        CategoryScope::All => {
            let mut merged: Vec<&'static str> = Vec::new();
            for name in INCOME_CATEGORIES.iter().chain(EXPENSE_CATEGORIES) {
                if !merged.contains(name) {
                    merged.push(*name);
                }
            }
            merged
        }
    }
}

/// Returns the canonical spelling when `name` belongs to the catalog for `scope`.
pub fn canonical_category(name: &str, scope: CategoryScope) -> Option<&'static str> {
    let needle = name.trim();
    categories_by_type(scope)
        .into_iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(needle))
}

pub fn icon_for(category: &str) -> &'static str {
    ICONS
        .get(category.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(FALLBACK_ICON)
}

/// Category chip selection: everything, or a single category by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn from_selection(selected: Option<&str>) -> Self {
        match selected.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(name) if name.eq_ignore_ascii_case("all") => CategoryFilter::All,
            Some(name) => CategoryFilter::Only(name.to_string()),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(name) => name.trim().eq_ignore_ascii_case(category.trim()),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(name) => Some(name.as_str()),
        }
    }
}
