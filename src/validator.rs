//! Request validation that runs before the engine.
//!
//! Errors block a request; warnings flag unusual but allowed combinations
//! (an electric car asking for fuel economy, a beginner asking for track
//! parts) and are only logged.

use serde::Serialize;

use crate::engine::{DrivingGoal, EngineType, ExperienceLevel, Preferences, VehicleInfo};
use crate::error::{Result, TuneplanError};
use crate::knowledge::{BudgetRange, KnowledgeBase};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2030;
const MAX_SUGGESTIONS: usize = 5;

const KNOWN_MAKES: &[&str] = &[
    "Toyota", "Honda", "Ford", "Chevrolet", "Nissan", "BMW", "Mercedes-Benz", "Audi",
    "Volkswagen", "Hyundai", "Kia", "Mazda", "Subaru", "Mitsubishi", "Lexus", "Infiniti",
    "Acura", "Volvo", "Saab", "Peugeot", "Renault", "Fiat", "Alfa Romeo", "Ferrari",
    "Lamborghini", "Porsche", "Aston Martin", "Bentley", "Rolls-Royce", "McLaren", "Bugatti",
    "Koenigsegg", "Pagani", "Tesla", "Rivian", "Lucid", "Polestar", "NIO", "BYD", "Rimac",
];

/// Makes that are accepted with any engine type.
const COMMON_MAKES: &[&str] = &[
    "Toyota", "Honda", "Ford", "BMW", "Mercedes-Benz", "Audi", "Volkswagen", "Hyundai", "Kia",
];

const LUXURY_MAKES: &[&str] = &["BMW", "Mercedes-Benz", "Audi", "Porsche", "Ferrari", "Lamborghini"];

const FORBIDDEN_MODIFICATION_WORDS: &[&str] = &["illegal", "unsafe", "dangerous", "void"];

/// Known models for the makes we can check. Other makes accept any model.
fn models_for_make(make: &str) -> Option<&'static [&'static str]> {
    let models: &'static [&'static str] = match canonical_make(make)? {
        "Toyota" => &["Camry", "Corolla", "Prius", "RAV4", "Highlander", "Tacoma", "Tundra", "Supra", "86"],
        "Honda" => &["Civic", "Accord", "CR-V", "Pilot", "Ridgeline", "NSX", "S2000"],
        "Ford" => &["F-150", "Mustang", "Focus", "Fusion", "Escape", "Explorer", "Bronco", "GT"],
        "BMW" => &["3 Series", "5 Series", "7 Series", "X3", "X5", "M3", "M5", "i3", "i8"],
        "Mercedes-Benz" => &["C-Class", "E-Class", "S-Class", "GLC", "GLE", "AMG GT", "EQS"],
        "Audi" => &["A3", "A4", "A6", "Q3", "Q5", "Q7", "RS3", "RS6", "e-tron"],
        "Tesla" => &["Model S", "Model 3", "Model X", "Model Y", "Cybertruck", "Roadster"],
        "Porsche" => &["911", "Cayman", "Boxster", "Cayenne", "Macan", "Panamera", "Taycan"],
        _ => return None,
    };
    Some(models)
}

/// Makes typically sold with each engine type.
fn makes_for_engine(engine_type: EngineType) -> &'static [&'static str] {
    match engine_type {
        EngineType::Petrol => &["Toyota", "Honda", "Ford", "BMW", "Mercedes-Benz", "Audi", "Porsche"],
        EngineType::Diesel => &["BMW", "Mercedes-Benz", "Audi", "Volkswagen", "Volvo"],
        EngineType::Hybrid => &["Toyota", "Honda", "Ford", "BMW", "Mercedes-Benz", "Audi"],
        EngineType::Electric => &["Tesla", "BMW", "Mercedes-Benz", "Audi", "Porsche", "Rivian", "Lucid"],
    }
}

fn canonical_make(make: &str) -> Option<&'static str> {
    KNOWN_MAKES
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(make.trim()))
}

fn contains_make(list: &[&str], make: &str) -> bool {
    list.iter().any(|m| m.eq_ignore_ascii_case(make.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Input field the finding is about (e.g., "year", "primary_goals")
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Error,
        }
    }

    fn warning(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Warning,
        }
    }
}

/// Outcome of validating a whole request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Warnings when valid, otherwise `TuneplanError::Validation` with every
    /// error message.
    pub fn into_result(self) -> Result<Vec<ValidationIssue>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(TuneplanError::Validation(
                self.errors.into_iter().map(|e| e.message).collect(),
            ))
        }
    }

    fn absorb(&mut self, issues: Vec<ValidationIssue>) {
        for issue in issues {
            match issue.severity {
                Severity::Error => self.errors.push(issue),
                Severity::Warning => self.warnings.push(issue),
            }
        }
    }
}

/// Check make, model, year, engine pairing and current modifications.
pub fn validate_vehicle(vehicle: &VehicleInfo) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if canonical_make(&vehicle.make).is_none() {
        issues.push(ValidationIssue::error(
            "make",
            format!("Invalid car make: {}", vehicle.make),
        ));
    }

    if let Some(models) = models_for_make(&vehicle.make) {
        if !models.iter().any(|m| m.eq_ignore_ascii_case(vehicle.model.trim())) {
            issues.push(ValidationIssue::error(
                "model",
                format!(
                    "Invalid model '{}' for make '{}'",
                    vehicle.model, vehicle.make
                ),
            ));
        }
    }

    if !(MIN_YEAR..=MAX_YEAR).contains(&vehicle.year) {
        issues.push(ValidationIssue::error(
            "year",
            format!(
                "Invalid year: {}. Must be between {} and {}",
                vehicle.year, MIN_YEAR, MAX_YEAR
            ),
        ));
    }

    let typical = contains_make(COMMON_MAKES, &vehicle.make)
        || contains_make(makes_for_engine(vehicle.engine_type), &vehicle.make);
    if !typical {
        issues.push(ValidationIssue::warning(
            "engine_type",
            format!(
                "Engine type '{}' may not be typical for {}",
                vehicle.engine_type, vehicle.make
            ),
        ));
    }

    for modification in &vehicle.current_modifications {
        if !is_acceptable_modification(modification) {
            issues.push(ValidationIssue::error(
                "current_modifications",
                format!("Invalid modification: {}", modification),
            ));
        }
    }

    issues
}

fn is_acceptable_modification(modification: &str) -> bool {
    let len = modification.chars().count();
    if !(3..=100).contains(&len) {
        return false;
    }
    let lower = modification.to_lowercase();
    !FORBIDDEN_MODIFICATION_WORDS
        .iter()
        .any(|word| lower.contains(word))
}

/// Check goals and the explicit budget against the chosen tier.
pub fn validate_preferences(prefs: &Preferences, kb: &KnowledgeBase) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if prefs.primary_goals.is_empty() {
        issues.push(ValidationIssue::error(
            "primary_goals",
            "At least one primary goal must be specified".to_string(),
        ));
    }

    if let Some(max_budget) = prefs.max_budget {
        let tier = kb.budget_range(prefs.budget_range);
        if !max_budget.is_finite() || max_budget < tier.min || max_budget > tier.max {
            issues.push(ValidationIssue::error(
                "max_budget",
                format!(
                    "Max budget ${} is outside the {} range (${}-${})",
                    max_budget, prefs.budget_range, tier.min, tier.max
                ),
            ));
        }
    }

    issues
}

/// Combinations that are allowed but worth a second look.
pub fn cross_validate(vehicle: &VehicleInfo, prefs: &Preferences) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let goals = &prefs.primary_goals;

    if vehicle.engine_type == EngineType::Electric {
        if goals.contains(&DrivingGoal::FuelEconomy) {
            issues.push(ValidationIssue::warning(
                "primary_goals",
                "Fuel economy goal is not applicable for electric vehicles".to_string(),
            ));
        }
        if goals.contains(&DrivingGoal::TrackUse) {
            issues.push(ValidationIssue::warning(
                "primary_goals",
                "Track use modifications for electric vehicles may have limited options"
                    .to_string(),
            ));
        }
    }

    if prefs.budget_range == BudgetRange::Budget && contains_make(LUXURY_MAKES, &vehicle.make) {
        issues.push(ValidationIssue::warning(
            "budget_range",
            "Budget range may be too low for luxury vehicle modifications".to_string(),
        ));
    }

    if prefs.experience_level == ExperienceLevel::Beginner
        && goals.contains(&DrivingGoal::TrackUse)
    {
        issues.push(ValidationIssue::warning(
            "experience_level",
            "Track use modifications may be too complex for beginners".to_string(),
        ));
    }

    issues
}

/// Validate a complete request. Cross-checks only run when the vehicle and
/// preferences are individually valid.
pub fn validate_request(
    vehicle: &VehicleInfo,
    prefs: &Preferences,
    kb: &KnowledgeBase,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.absorb(validate_vehicle(vehicle));
    report.absorb(validate_preferences(prefs, kb));
    if report.is_valid() {
        report.absorb(cross_validate(vehicle, prefs));
    }
    report
}

/// Known makes containing `partial` (case-insensitive), at most five.
pub fn suggest_makes(partial: &str) -> Vec<&'static str> {
    let needle = partial.to_lowercase();
    KNOWN_MAKES
        .iter()
        .copied()
        .filter(|make| make.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Known models of `make` containing `partial`, at most five.
pub fn suggest_models(make: &str, partial: &str) -> Vec<&'static str> {
    let needle = partial.to_lowercase();
    models_for_make(make)
        .unwrap_or(&[])
        .iter()
        .copied()
        .filter(|model| model.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .collect()
}

pub fn known_makes() -> &'static [&'static str] {
    KNOWN_MAKES
}

/// Engine types the make is typically sold with.
pub fn compatible_engine_types(make: &str) -> Vec<EngineType> {
    EngineType::ALL
        .into_iter()
        .filter(|engine| contains_make(makes_for_engine(*engine), make))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bmw() -> VehicleInfo {
        VehicleInfo {
            make: "BMW".to_string(),
            model: "3 Series".to_string(),
            year: 2021,
            engine_type: EngineType::Petrol,
            current_modifications: vec!["Sport exhaust".to_string()],
        }
    }

    fn prefs(goals: &[DrivingGoal], budget_range: BudgetRange, max: Option<f64>) -> Preferences {
        Preferences {
            primary_goals: goals.to_vec(),
            budget_range,
            experience_level: ExperienceLevel::Intermediate,
            max_budget: max,
        }
    }

    #[test]
    fn test_valid_vehicle_has_no_issues() {
        assert!(validate_vehicle(&bmw()).is_empty());
    }

    #[test]
    fn test_make_is_case_insensitive() {
        let mut v = bmw();
        v.make = "bmw".to_string();
        assert!(validate_vehicle(&v).is_empty());
    }

    #[test]
    fn test_unknown_make_and_model() {
        let mut v = bmw();
        v.model = "Model T".to_string();
        let issues = validate_vehicle(&v);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "model");

        v.make = "Trabant".to_string();
        let issues = validate_vehicle(&v);
        assert!(issues.iter().any(|i| i.field == "make"));
        // Unknown makes have no model list to check against
        assert!(!issues.iter().any(|i| i.field == "model"));
    }

    #[test]
    fn test_year_bounds() {
        let mut v = bmw();
        v.year = 1899;
        assert!(validate_vehicle(&v).iter().any(|i| i.field == "year"));
        v.year = 2031;
        assert!(validate_vehicle(&v).iter().any(|i| i.field == "year"));
        v.year = 1900;
        assert!(validate_vehicle(&v).is_empty());
    }

    #[test]
    fn test_unusual_engine_is_warning_only() {
        let v = VehicleInfo {
            make: "Tesla".to_string(),
            model: "Model 3".to_string(),
            year: 2022,
            engine_type: EngineType::Diesel,
            current_modifications: vec![],
        };
        let issues = validate_vehicle(&v);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_modification_text_rules() {
        assert!(is_acceptable_modification("Cold air intake"));
        assert!(!is_acceptable_modification("ab"));
        assert!(!is_acceptable_modification(&"x".repeat(101)));
        assert!(!is_acceptable_modification("Illegal straight pipe"));
    }

    #[test]
    fn test_preferences_budget_must_sit_in_tier() {
        let kb = KnowledgeBase::builtin();
        let ok = prefs(&[DrivingGoal::Performance], BudgetRange::Premium, Some(15000.0));
        assert!(validate_preferences(&ok, kb).is_empty());

        let too_low = prefs(&[DrivingGoal::Performance], BudgetRange::Premium, Some(6000.0));
        let issues = validate_preferences(&too_low, kb);
        assert_eq!(issues[0].field, "max_budget");
    }

    #[test]
    fn test_empty_goals_is_error() {
        let kb = KnowledgeBase::builtin();
        let issues = validate_preferences(&prefs(&[], BudgetRange::Budget, None), kb);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_cross_validation_warnings() {
        let tesla = VehicleInfo {
            make: "Tesla".to_string(),
            model: "Model 3".to_string(),
            year: 2022,
            engine_type: EngineType::Electric,
            current_modifications: vec![],
        };
        let p = prefs(
            &[DrivingGoal::FuelEconomy, DrivingGoal::TrackUse],
            BudgetRange::Moderate,
            None,
        );
        let issues = cross_validate(&tesla, &p);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));

        let mut beginner = prefs(&[DrivingGoal::TrackUse], BudgetRange::Budget, None);
        beginner.experience_level = ExperienceLevel::Beginner;
        let issues = cross_validate(&bmw(), &beginner);
        assert!(issues.iter().any(|i| i.field == "budget_range"));
        assert!(issues.iter().any(|i| i.field == "experience_level"));
    }

    #[test]
    fn test_validate_request_into_result() {
        let kb = KnowledgeBase::builtin();
        let good = validate_request(
            &bmw(),
            &prefs(&[DrivingGoal::Performance], BudgetRange::Premium, Some(15000.0)),
            kb,
        );
        assert!(good.is_valid());
        assert!(good.into_result().unwrap().is_empty());

        let mut v = bmw();
        v.year = 1800;
        let bad = validate_request(&v, &prefs(&[], BudgetRange::Budget, None), kb);
        assert_eq!(bad.errors.len(), 2);
        match bad.into_result() {
            Err(TuneplanError::Validation(messages)) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(suggest_makes("BM"), vec!["BMW"]);
        assert!(suggest_makes("a").len() <= 5);
        assert_eq!(suggest_models("Tesla", "model").len(), 4);
        assert!(suggest_models("Trabant", "601").is_empty());
    }

    #[test]
    fn test_compatible_engine_types() {
        assert_eq!(compatible_engine_types("Tesla"), vec![EngineType::Electric]);
        assert_eq!(compatible_engine_types("bmw").len(), 4);
        assert!(compatible_engine_types("Trabant").is_empty());
    }
}
