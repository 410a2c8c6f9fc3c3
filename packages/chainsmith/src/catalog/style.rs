//! The compiled category table and other catalog-wide settings.

use std::collections::{HashMap, HashSet};

use color_eyre::eyre::{Result, bail};
use itertools::Itertools;

use crate::syntax::Chain;

use super::{Category, CatalogConfig, GroupingEntry};

/// Catalog-wide settings shared by every rule.
#[derive(Debug, Clone)]
pub struct Style {
    constructors: Vec<String>,
    ranks: HashMap<Category, usize>,
    categories: HashMap<String, Category>,
    exempt: HashSet<String>,
    grouping: Vec<GroupingEntry>,
}

impl Style {
    /// Compile the catalog-wide settings from a configuration.
    pub fn compile(config: &CatalogConfig) -> Result<Self> {
        let order = &config.categories.order;
        let missing = Category::ALL
            .iter()
            .filter(|category| !order.contains(category))
            .collect_vec();
        if !missing.is_empty() || order.len() != Category::ALL.len() {
            bail!(
                "category order must list each of the {} categories exactly once; missing: [{}]",
                Category::ALL.len(),
                missing.iter().join(", "),
            );
        }

        let mut categories = HashMap::new();
        for (category, calls) in &config.categories.calls {
            for call in calls {
                if let Some(existing) = categories.insert(call.clone(), *category) {
                    bail!("call `{call}` is assigned to both {existing} and {category}");
                }
            }
        }

        if config.constructors.is_empty() {
            bail!("at least one constructor name is required");
        }

        for entry in &config.grouping {
            if entry.min_fields < 2 {
                bail!(
                    "grouping entry {:?} must have min_fields of at least 2, got {}",
                    entry.section,
                    entry.min_fields
                );
            }
        }

        Ok(Self {
            constructors: config.constructors.clone(),
            ranks: order
                .iter()
                .enumerate()
                .map(|(rank, category)| (*category, rank))
                .collect(),
            categories,
            exempt: config.categories.exempt.iter().cloned().collect(),
            grouping: config.grouping.clone(),
        })
    }

    /// The category of a call name.
    pub fn category(&self, call: &str) -> Category {
        self.categories
            .get(call)
            .copied()
            .unwrap_or(Category::Other)
    }

    /// The canonical position of a category.
    pub fn rank(&self, category: Category) -> usize {
        self.ranks.get(&category).copied().unwrap_or(usize::MAX)
    }

    /// Whether the call keeps its absolute position in a chain.
    pub fn is_exempt(&self, call: &str) -> bool {
        self.exempt.contains(call)
    }

    /// Names of the static calls that start a declaration.
    pub fn constructors(&self) -> &[String] {
        &self.constructors
    }

    /// Whether the chain is a declaration.
    pub fn is_declaration(&self, chain: &Chain) -> bool {
        chain.is_declaration(&self.constructors)
    }

    /// Configured field groups.
    pub fn grouping(&self) -> &[GroupingEntry] {
        &self.grouping
    }
}
