use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::super::domain::Category;
use super::rules::{predicate_for, Predicate};

/// Scoring policy for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub weight: u8,
    pub critical: bool,
    pub details: String,
}

impl CategoryPolicy {
    fn default_for(category: Category) -> Self {
        Self {
            weight: category.default_weight(),
            critical: category.default_critical(),
            details: category.default_details().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PolicyOverride {
    weight: u8,
    critical: bool,
    #[serde(default)]
    details: Option<String>,
}

/// Immutable rule table keyed by category. Iteration follows category declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    policies: BTreeMap<Category, CategoryPolicy>,
}

impl Default for RuleTable {
    fn default() -> Self {
        let policies = Category::ALL
            .into_iter()
            .map(|category| (category, CategoryPolicy::default_for(category)))
            .collect();
        Self { policies }
    }
}

impl RuleTable {
    pub fn new(policies: BTreeMap<Category, CategoryPolicy>) -> Result<Self, RuleTableError> {
        for category in Category::ALL {
            let policy = policies
                .get(&category)
                .ok_or(RuleTableError::MissingCategory(category))?;
            if policy.details.trim().is_empty() {
                return Err(RuleTableError::EmptyDetails(category));
            }
        }

        let total: u32 = policies.values().map(|policy| u32::from(policy.weight)).sum();
        if total > 100 {
            return Err(RuleTableError::WeightOverflow(total));
        }

        Ok(Self { policies })
    }

    /// Parse a JSON mapping of category label to `{weight, critical, details?}`.
    pub fn from_json(raw: &str) -> Result<Self, RuleTableError> {
        let overrides: BTreeMap<Category, PolicyOverride> = serde_json::from_str(raw)?;
        let policies = overrides
            .into_iter()
            .map(|(category, value)| {
                let policy = CategoryPolicy {
                    weight: value.weight,
                    critical: value.critical,
                    details: value
                        .details
                        .unwrap_or_else(|| category.default_details().to_string()),
                };
                (category, policy)
            })
            .collect();
        Self::new(policies)
    }

    pub fn from_path(path: &Path) -> Result<Self, RuleTableError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RuleTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn policy(&self, category: Category) -> Option<&CategoryPolicy> {
        self.policies.get(&category)
    }

    pub fn total_weight(&self) -> u32 {
        self.policies
            .values()
            .map(|policy| u32::from(policy.weight))
            .sum()
    }

    /// Materialize the ordered rule list consumed by the aggregator.
    pub fn rules(&self) -> Vec<CategoryRule> {
        self.policies
            .iter()
            .map(|(category, policy)| CategoryRule {
                category: *category,
                weight: policy.weight,
                critical: policy.critical,
                details: policy.details.clone(),
                predicate: predicate_for(*category),
            })
            .collect()
    }
}

/// One row of the rule table with its pass predicate attached.
#[derive(Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub weight: u8,
    pub critical: bool,
    pub details: String,
    pub predicate: Predicate,
}

impl std::fmt::Debug for CategoryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryRule")
            .field("category", &self.category)
            .field("weight", &self.weight)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}

/// Error raised while loading or validating a rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("rule table is missing category {0}")]
    MissingCategory(Category),
    #[error("rule table details for {0} must not be empty")]
    EmptyDetails(Category),
    #[error("rule table weights sum to {0}, which exceeds 100")]
    WeightOverflow(u32),
    #[error("rule table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to read rule table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
