//! Type definitions for the modification knowledge base.
//!
//! These types support both TOML deserialization (for loading the catalog)
//! and JSON serialization (for reports handed to presentation layers).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// A grouping of modification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EcuRemapping,
    ExhaustSystem,
    Suspension,
    AirIntake,
    TiresWheels,
    BrakeSystem,
    Cosmetic,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::EcuRemapping,
        Category::ExhaustSystem,
        Category::Suspension,
        Category::AirIntake,
        Category::TiresWheels,
        Category::BrakeSystem,
        Category::Cosmetic,
    ];

    /// The lowercase key used in catalogs and serialized reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EcuRemapping => "ecu_remapping",
            Category::ExhaustSystem => "exhaust_system",
            Category::Suspension => "suspension",
            Category::AirIntake => "air_intake",
            Category::TiresWheels => "tires_wheels",
            Category::BrakeSystem => "brake_system",
            Category::Cosmetic => "cosmetic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: '{}'", s))
    }
}

/// Ordinal risk classification, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Low,
    Medium,
    High,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Low => "low",
            SafetyLevel::Medium => "medium",
            SafetyLevel::High => "high",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named spending bracket. The knowledge base maps each one to USD bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetRange {
    Budget,
    Moderate,
    Premium,
    Unlimited,
}

impl BudgetRange {
    pub const ALL: [BudgetRange; 4] = [
        BudgetRange::Budget,
        BudgetRange::Moderate,
        BudgetRange::Premium,
        BudgetRange::Unlimited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetRange::Budget => "budget",
            BudgetRange::Moderate => "moderate",
            BudgetRange::Premium => "premium",
            BudgetRange::Unlimited => "unlimited",
        }
    }
}

impl fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BudgetRange::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown budget range: '{}'. Expected one of: budget, moderate, premium, unlimited",
                    s
                )
            })
    }
}

// =============================================================================
// CATALOG ENTRIES
// =============================================================================

/// A USD interval. `min <= max`, both non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

impl CostRange {
    pub const EMPTY: CostRange = CostRange { min: 0.0, max: 0.0 };
}

/// Impact text that marks a warranty/emissions/insurance field as
/// irrelevant for the legal summary.
pub const NO_IMPACT: &str = "No impact";

/// One aftermarket modification as described by the editorial catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationOption {
    pub category: Category,
    pub name: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub cost_range: CostRange,
    pub compatibility_notes: Vec<String>,
    pub prerequisites: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub legal_considerations: Vec<String>,
    pub warranty_impact: String,
    pub emissions_impact: String,
    pub insurance_impact: String,
    /// Base relevance on a 0-10 scale, before per-request adjustment
    pub priority_score: f64,
    pub safety_level: SafetyLevel,
    pub installation_difficulty: String,
    pub professional_required: bool,
}

// =============================================================================
// CONFIGURATION ROOT (loaded from TOML)
// =============================================================================

/// Root of `knowledge_base.toml`.
///
/// Table keys stay strings here; [`super::KnowledgeBase`] resolves them
/// into typed lookups when the catalog is built.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub budget_ranges: BTreeMap<String, CostRange>,
    #[serde(default)]
    pub compatibility: BTreeMap<String, Vec<Category>>,
    #[serde(default)]
    pub safety_guidelines: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub options: Vec<ModificationOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_level_ordering() {
        assert!(SafetyLevel::Low < SafetyLevel::Medium);
        assert!(SafetyLevel::Medium < SafetyLevel::High);
        assert_eq!(
            [SafetyLevel::High, SafetyLevel::Low].iter().max(),
            Some(&SafetyLevel::High)
        );
    }

    #[test]
    fn test_category_serializes_to_snake_case() {
        let json = serde_json::to_string(&Category::TiresWheels).unwrap();
        assert_eq!(json, r#""tires_wheels""#);

        let parsed: Category = serde_json::from_str(r#""ecu_remapping""#).unwrap();
        assert_eq!(parsed, Category::EcuRemapping);
    }

    #[test]
    fn test_category_from_str_matches_serde_tags() {
        for category in Category::ALL {
            let tag = serde_json::to_value(category).unwrap();
            assert_eq!(tag.as_str(), Some(category.as_str()));
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("turbo".parse::<Category>().is_err());
    }

    #[test]
    fn test_budget_range_from_str() {
        assert_eq!("premium".parse::<BudgetRange>(), Ok(BudgetRange::Premium));
        let err = "cheap".parse::<BudgetRange>().unwrap_err();
        assert!(err.contains("cheap"));
    }

    #[test]
    fn test_option_deserialize_from_toml() {
        let toml_text = r#"
            category = "cosmetic"
            name = "Window Tint"
            description = "Tinted film"
            benefits = ["Privacy"]
            cost_range = { min = 100.0, max = 300.0 }
            compatibility_notes = []
            prerequisites = []
            safety_warnings = ["Check visibility"]
            legal_considerations = ["Tint limits vary"]
            warranty_impact = "No impact"
            emissions_impact = "No impact"
            insurance_impact = "No impact"
            priority_score = 2.5
            safety_level = "low"
            installation_difficulty = "Easy"
            professional_required = false
        "#;
        let option: ModificationOption = toml::from_str(toml_text).unwrap();
        assert_eq!(option.category, Category::Cosmetic);
        assert_eq!(option.cost_range, CostRange { min: 100.0, max: 300.0 });
        assert_eq!(option.safety_level, SafetyLevel::Low);
    }
}
