//! Catalog loading and lookups.
//!
//! Provides two loading methods:
//! - `KnowledgeBase::builtin()` - The catalog compiled into the binary
//! - `load_knowledge_base(path)` - A replacement catalog from a file path
//!
//! Every lookup is total: unknown keys yield empty results.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, warn};

use super::types::*;
use crate::error::{Result, TuneplanError};

/// Default catalog embedded in the binary at compile time.
/// Loaded from `config/knowledge_base.toml`.
const DEFAULT_CATALOG: &str = include_str!("../../config/knowledge_base.toml");

static BUILTIN: OnceLock<KnowledgeBase> = OnceLock::new();

/// Immutable catalog of modification options, grouped by category.
///
/// Options keep the order they were declared in within their category,
/// which the engine relies on for tie-breaking.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    options: BTreeMap<Category, Vec<ModificationOption>>,
    compatibility: BTreeMap<Category, Vec<Category>>,
    budget_ranges: BTreeMap<BudgetRange, CostRange>,
    safety_guidelines: BTreeMap<String, Vec<String>>,
}

impl KnowledgeBase {
    /// The embedded catalog, parsed once per process.
    ///
    /// # Panics
    /// Panics if the embedded TOML is invalid (this would be a build-time bug).
    pub fn builtin() -> &'static KnowledgeBase {
        BUILTIN.get_or_init(|| {
            KnowledgeBase::from_toml_str(DEFAULT_CATALOG)
                .expect("embedded knowledge_base.toml must be a valid catalog")
        })
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(text)
            .map_err(|e| TuneplanError::KnowledgeBase(format!("Invalid catalog TOML: {}", e)))?;
        Self::from_config(config)
    }

    /// Build typed lookups from a deserialized catalog, checking each option.
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let mut options: BTreeMap<Category, Vec<ModificationOption>> = BTreeMap::new();
        for option in config.options {
            check_option(&option)?;
            options.entry(option.category).or_default().push(option);
        }

        let mut compatibility = BTreeMap::new();
        for (key, compatible) in config.compatibility {
            match key.parse::<Category>() {
                Ok(category) => {
                    compatibility.insert(category, compatible);
                }
                Err(e) => warn!("Skipping compatibility entry: {}", e),
            }
        }

        let mut budget_ranges = BTreeMap::new();
        for (key, range) in config.budget_ranges {
            match key.parse::<BudgetRange>() {
                Ok(tier) => {
                    check_cost_range(&format!("budget range '{}'", key), &range)?;
                    budget_ranges.insert(tier, range);
                }
                Err(e) => warn!("Skipping budget range entry: {}", e),
            }
        }

        let kb = KnowledgeBase {
            options,
            compatibility,
            budget_ranges,
            safety_guidelines: config.safety_guidelines,
        };
        debug!(
            "Loaded knowledge base: {} options across {} categories",
            kb.option_count(),
            kb.options.len()
        );
        Ok(kb)
    }

    /// All options of a category, in catalog order.
    pub fn options_for_category(&self, category: Category) -> &[ModificationOption] {
        self.options
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories that combine well with `category`.
    pub fn compatible_categories(&self, category: Category) -> &[Category] {
        self.compatibility
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Same as [`compatible_categories`](Self::compatible_categories) but keyed
    /// by the raw category string.
    pub fn compatible_categories_for_key(&self, key: &str) -> &[Category] {
        match key.parse::<Category>() {
            Ok(category) => self.compatible_categories(category),
            Err(_) => &[],
        }
    }

    /// USD bounds of a budget tier; `{0, 0}` when the catalog has no entry.
    pub fn budget_range(&self, range: BudgetRange) -> CostRange {
        self.budget_ranges
            .get(&range)
            .copied()
            .unwrap_or(CostRange::EMPTY)
    }

    /// Guideline text for a topic such as `"general"` or `"brakes"`.
    pub fn safety_guidelines(&self, topic: &str) -> &[String] {
        self.safety_guidelines
            .get(topic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn guideline_topics(&self) -> Vec<&str> {
        self.safety_guidelines.keys().map(|s| s.as_str()).collect()
    }

    /// Categories that have at least one option.
    pub fn categories(&self) -> Vec<Category> {
        self.options.keys().copied().collect()
    }

    pub fn option_count(&self) -> usize {
        self.options.values().map(Vec::len).sum()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        KnowledgeBase::builtin().clone()
    }
}

/// Load a replacement catalog from a TOML file at the given path.
///
/// # Example
/// ```ignore
/// let kb = load_knowledge_base(Path::new("/etc/tuneplan/catalog.toml"))?;
/// ```
pub fn load_knowledge_base(path: &Path) -> Result<KnowledgeBase> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TuneplanError::KnowledgeBase(format!("Failed to read {}: {}", path.display(), e))
    })?;
    KnowledgeBase::from_toml_str(&content)
}

fn check_option(option: &ModificationOption) -> Result<()> {
    if option.name.trim().is_empty() {
        return Err(TuneplanError::KnowledgeBase(format!(
            "Option in category '{}' has an empty name",
            option.category
        )));
    }
    check_cost_range(&format!("option '{}'", option.name), &option.cost_range)?;
    if !(0.0..=10.0).contains(&option.priority_score) {
        return Err(TuneplanError::KnowledgeBase(format!(
            "Option '{}' has priority score {} outside 0-10",
            option.name, option.priority_score
        )));
    }
    Ok(())
}

fn check_cost_range(what: &str, range: &CostRange) -> Result<()> {
    let valid = range.min.is_finite()
        && range.max.is_finite()
        && range.min >= 0.0
        && range.min <= range.max;
    if valid {
        Ok(())
    } else {
        Err(TuneplanError::KnowledgeBase(format!(
            "{} has invalid cost range {}-{}",
            what, range.min, range.max
        )))
    }
}
