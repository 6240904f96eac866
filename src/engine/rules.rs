//! Fixed rule tables: which categories serve each goal, how much risk each
//! experience level may take on, and the score adjustment factors.

use crate::knowledge::{Category, SafetyLevel};

use super::types::{DrivingGoal, ExperienceLevel};

/// Multiplier for candidates generated from one of the user's goals.
pub const GOAL_MATCH_BOOST: f64 = 1.2;
/// Multiplier for high-risk options when the user is a beginner.
pub const BEGINNER_HIGH_RISK_FACTOR: f64 = 0.7;
/// Multiplier for options under [`BUDGET_FRIENDLY_CEILING`] on the budget tier.
pub const BUDGET_FRIENDLY_BOOST: f64 = 1.1;
/// List price below which an option counts as budget friendly.
pub const BUDGET_FRIENDLY_CEILING: f64 = 1000.0;
/// Upper bound of any priority score.
pub const MAX_PRIORITY_SCORE: f64 = 10.0;
/// Maximum number of recommendations in a report.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Categories relevant to a goal, most relevant first.
pub fn goal_categories(goal: DrivingGoal) -> &'static [Category] {
    use Category::*;
    match goal {
        DrivingGoal::Performance => &[
            EcuRemapping,
            ExhaustSystem,
            AirIntake,
            TiresWheels,
            BrakeSystem,
            Suspension,
            Cosmetic,
        ],
        DrivingGoal::FuelEconomy => &[EcuRemapping, AirIntake, TiresWheels, Cosmetic],
        DrivingGoal::DailyComfort => &[Suspension, TiresWheels, Cosmetic],
        DrivingGoal::TrackUse => &[
            EcuRemapping,
            BrakeSystem,
            Suspension,
            TiresWheels,
            ExhaustSystem,
            AirIntake,
            Cosmetic,
        ],
        DrivingGoal::OffRoading => &[Suspension, TiresWheels, BrakeSystem, Cosmetic],
    }
}

/// Risk limits applied to every candidate for a given experience level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperienceFilter {
    pub max_safety_level: SafetyLevel,
    pub max_priority_score: f64,
    /// Advisory only: the text report suggests a professional fit for every
    /// recommendation, never used to reject
    pub prefer_professional_installation: bool,
    pub avoid_high_risk: bool,
}

pub fn experience_filter(level: ExperienceLevel) -> ExperienceFilter {
    match level {
        ExperienceLevel::Beginner => ExperienceFilter {
            max_safety_level: SafetyLevel::Medium,
            max_priority_score: 7.0,
            prefer_professional_installation: true,
            avoid_high_risk: true,
        },
        ExperienceLevel::Intermediate => ExperienceFilter {
            max_safety_level: SafetyLevel::High,
            max_priority_score: 8.5,
            prefer_professional_installation: false,
            avoid_high_risk: false,
        },
        ExperienceLevel::Advanced => ExperienceFilter {
            max_safety_level: SafetyLevel::High,
            max_priority_score: 10.0,
            prefer_professional_installation: false,
            avoid_high_risk: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_roading_skips_engine_work() {
        let categories = goal_categories(DrivingGoal::OffRoading);
        assert!(!categories.contains(&Category::EcuRemapping));
        assert!(!categories.contains(&Category::ExhaustSystem));
        assert_eq!(categories[0], Category::Suspension);
    }

    #[test]
    fn test_performance_puts_cosmetics_last() {
        let categories = goal_categories(DrivingGoal::Performance);
        assert_eq!(categories.first(), Some(&Category::EcuRemapping));
        assert_eq!(categories.last(), Some(&Category::Cosmetic));
        assert_eq!(categories.len(), Category::ALL.len());
    }

    #[test]
    fn test_every_goal_has_categories() {
        for goal in DrivingGoal::ALL {
            assert!(!goal_categories(goal).is_empty(), "{} has no categories", goal);
        }
    }

    #[test]
    fn test_only_beginners_avoid_high_risk() {
        assert!(experience_filter(ExperienceLevel::Beginner).avoid_high_risk);
        assert!(!experience_filter(ExperienceLevel::Intermediate).avoid_high_risk);
        assert!(!experience_filter(ExperienceLevel::Advanced).avoid_high_risk);
    }

    #[test]
    fn test_score_ceilings_rise_with_experience() {
        let beginner = experience_filter(ExperienceLevel::Beginner);
        let intermediate = experience_filter(ExperienceLevel::Intermediate);
        let advanced = experience_filter(ExperienceLevel::Advanced);
        assert_eq!(beginner.max_safety_level, SafetyLevel::Medium);
        assert_eq!(intermediate.max_safety_level, SafetyLevel::High);
        assert!(beginner.max_priority_score < intermediate.max_priority_score);
        assert!(intermediate.max_priority_score < advanced.max_priority_score);
    }
}
