//! Request and report types for the recommendation engine.
//!
//! Every enum serializes to its lowercase tag (`"petrol"`, `"track_use"`,
//! `"medium"`), so a [`Report`] round-trips through JSON without loss.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::knowledge::{BudgetRange, Category, CostRange, ModificationOption, SafetyLevel};

// =============================================================================
// INPUT TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

impl EngineType {
    pub const ALL: [EngineType; 4] = [
        EngineType::Petrol,
        EngineType::Diesel,
        EngineType::Hybrid,
        EngineType::Electric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Petrol => "petrol",
            EngineType::Diesel => "diesel",
            EngineType::Hybrid => "hybrid",
            EngineType::Electric => "electric",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineType::ALL
            .into_iter()
            .find(|e| e.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                format!(
                    "Unknown engine type: '{}'. Expected one of: petrol, diesel, hybrid, electric",
                    s
                )
            })
    }
}

/// A user-selected driving objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingGoal {
    Performance,
    FuelEconomy,
    DailyComfort,
    TrackUse,
    OffRoading,
}

impl DrivingGoal {
    pub const ALL: [DrivingGoal; 5] = [
        DrivingGoal::Performance,
        DrivingGoal::FuelEconomy,
        DrivingGoal::DailyComfort,
        DrivingGoal::TrackUse,
        DrivingGoal::OffRoading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrivingGoal::Performance => "performance",
            DrivingGoal::FuelEconomy => "fuel_economy",
            DrivingGoal::DailyComfort => "daily_comfort",
            DrivingGoal::TrackUse => "track_use",
            DrivingGoal::OffRoading => "off_roading",
        }
    }
}

impl fmt::Display for DrivingGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrivingGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        DrivingGoal::ALL
            .into_iter()
            .find(|g| g.as_str() == key)
            .ok_or_else(|| {
                format!(
                    "Unknown driving goal: '{}'. Expected one of: performance, fuel_economy, daily_comfort, track_use, off_roading",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Beginner,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExperienceLevel::ALL
            .into_iter()
            .find(|e| e.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                format!(
                    "Unknown experience level: '{}'. Expected one of: beginner, intermediate, advanced",
                    s
                )
            })
    }
}

/// The vehicle being modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub make: String,
    pub model: String,
    /// Model year, 1900-2030 once validated
    pub year: i32,
    pub engine_type: EngineType,
    /// Free-text list of modifications already fitted
    #[serde(default)]
    pub current_modifications: Vec<String>,
}

/// What the owner wants out of the build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Goals in priority order; drives iteration order and tie-breaking
    pub primary_goals: Vec<DrivingGoal>,
    pub budget_range: BudgetRange,
    pub experience_level: ExperienceLevel,
    /// Authoritative spending cap in USD; falls back to the tier's upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<f64>,
}

/// A complete request as accepted by the CLI's `from-file` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(alias = "car_info")]
    pub vehicle: VehicleInfo,
    #[serde(alias = "user_preferences")]
    pub preferences: Preferences,
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// A catalog option selected for this request, with its adjusted score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
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
    /// Request-specific score on a 0-10 scale
    pub priority_score: f64,
    pub safety_level: SafetyLevel,
    pub installation_difficulty: String,
    pub professional_required: bool,
    /// Amount charged against the budget during selection
    pub allocated_cost: f64,
    /// True when only the floor of the cost range fit the remaining budget
    pub min_fit: bool,
}

impl Recommendation {
    /// Copy an option's fields. The score starts at the base score and the
    /// allocation at the list maximum; the engine adjusts both.
    pub fn from_option(option: &ModificationOption) -> Self {
        Self {
            category: option.category,
            name: option.name.clone(),
            description: option.description.clone(),
            benefits: option.benefits.clone(),
            cost_range: option.cost_range,
            compatibility_notes: option.compatibility_notes.clone(),
            prerequisites: option.prerequisites.clone(),
            safety_warnings: option.safety_warnings.clone(),
            legal_considerations: option.legal_considerations.clone(),
            warranty_impact: option.warranty_impact.clone(),
            emissions_impact: option.emissions_impact.clone(),
            insurance_impact: option.insurance_impact.clone(),
            priority_score: option.priority_score,
            safety_level: option.safety_level,
            installation_difficulty: option.installation_difficulty.clone(),
            professional_required: option.professional_required,
            allocated_cost: option.cost_range.max,
            min_fit: false,
        }
    }
}

/// Aggregate cost of the selected recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Sum of every recommendation's cost floor
    pub min: f64,
    /// Sum of allocated costs; never above the resolved budget
    pub max: f64,
    /// Sum of every recommendation's list maximum
    pub list_max: f64,
    pub currency: String,
}

/// Safety warnings bucketed by the owning recommendation's safety level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetySummary {
    pub high_risk: Vec<String>,
    pub medium_risk: Vec<String>,
    pub low_risk: Vec<String>,
}

/// Warranty/emissions/insurance impacts plus all legal considerations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalSummary {
    pub warranty_impacts: Vec<String>,
    pub emissions_impacts: Vec<String>,
    pub insurance_impacts: Vec<String>,
    pub legal_considerations: Vec<String>,
}

/// Complete per-request output bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub vehicle: VehicleInfo,
    pub preferences: Preferences,
    /// Selected recommendations, highest priority first
    pub recommendations: Vec<Recommendation>,
    pub total_estimated_cost: CostEstimate,
    /// Recommendation name -> categories it combines well with
    pub compatibility_matrix: BTreeMap<String, Vec<Category>>,
    pub safety_summary: SafetySummary,
    pub legal_summary: LegalSummary,
    pub disclaimer: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_tags() {
        let json = serde_json::to_string(&DrivingGoal::TrackUse).unwrap();
        assert_eq!(json, r#""track_use""#);
        assert_eq!("off-roading".parse::<DrivingGoal>(), Ok(DrivingGoal::OffRoading));
        assert_eq!("Fuel Economy".parse::<DrivingGoal>(), Ok(DrivingGoal::FuelEconomy));
        assert!("drifting".parse::<DrivingGoal>().is_err());
    }

    #[test]
    fn test_engine_and_experience_parse() {
        assert_eq!("Electric".parse::<EngineType>(), Ok(EngineType::Electric));
        assert_eq!("advanced".parse::<ExperienceLevel>(), Ok(ExperienceLevel::Advanced));
        assert!("steam".parse::<EngineType>().unwrap_err().contains("steam"));
    }

    #[test]
    fn test_request_accepts_legacy_keys() {
        let json = r#"{
            "car_info": {
                "make": "BMW",
                "model": "3 Series",
                "year": 2021,
                "engine_type": "petrol",
                "current_modifications": ["Sport exhaust"]
            },
            "user_preferences": {
                "primary_goals": ["performance", "track_use"],
                "budget_range": "premium",
                "experience_level": "advanced",
                "max_budget": 15000.0
            }
        }"#;
        let request: RecommendationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.vehicle.engine_type, EngineType::Petrol);
        assert_eq!(
            request.preferences.primary_goals,
            vec![DrivingGoal::Performance, DrivingGoal::TrackUse]
        );
        assert_eq!(request.preferences.max_budget, Some(15000.0));
    }

    #[test]
    fn test_missing_modifications_default_to_empty() {
        let json = r#"{"make": "Tesla", "model": "Model 3", "year": 2022, "engine_type": "electric"}"#;
        let vehicle: VehicleInfo = serde_json::from_str(json).unwrap();
        assert!(vehicle.current_modifications.is_empty());
    }

    #[test]
    fn test_recommendation_from_option_copies_fields() {
        let option = crate::knowledge::KnowledgeBase::builtin()
            .options_for_category(Category::BrakeSystem)[1]
            .clone();
        let rec = Recommendation::from_option(&option);
        assert_eq!(rec.name, "Big Brake Kit");
        assert_eq!(rec.priority_score, option.priority_score);
        assert_eq!(rec.allocated_cost, 5000.0);
        assert!(!rec.min_fit);
    }
}
