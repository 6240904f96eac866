//! Recommendation engine.
//!
//! The `RecommendationEngine` walks the knowledge base in goal/category
//! order, screens each option against the user's experience and budget,
//! scores the survivors, and greedily fills the budget with the best of them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{Result, TuneplanError};
use crate::knowledge::{
    BudgetRange, Category, KnowledgeBase, ModificationOption, SafetyLevel, NO_IMPACT,
};

use super::rules::*;
use super::types::*;

/// Fixed legal text attached to every report.
pub const DISCLAIMER: &str = "\
IMPORTANT DISCLAIMER:

This report provides general recommendations for car modifications and should not be considered as professional automotive advice.

SAFETY WARNINGS:
- All modifications should be performed by qualified professionals
- Modifications may affect vehicle safety and handling characteristics
- Test all modifications in safe conditions before regular use
- Some modifications may void vehicle warranty
- Performance modifications may affect emissions compliance

LEGAL CONSIDERATIONS:
- Check local laws and regulations before making modifications
- Some modifications may be illegal for road use
- Notify your insurance company of any modifications
- Ensure modifications meet local safety standards

PROFESSIONAL CONSULTATION:
- Always consult with qualified automotive professionals
- Have modifications inspected by certified technicians
- Keep original parts for potential reversion
- Regular maintenance is critical for modified vehicles

The authors are not responsible for any damage, injury, or legal issues resulting from these modifications.";

/// Why an option was screened out before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    SafetyCeiling,
    ScoreCeiling,
    HighRisk,
    OverBudget,
    EngineIncompatible,
}

/// The recommendation engine.
///
/// Holds an immutable knowledge base and no other state, so one instance
/// can serve any number of concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    kb: KnowledgeBase,
}

impl RecommendationEngine {
    /// Create an engine over the given catalog
    /// (typically `KnowledgeBase::builtin().clone()` or `load_knowledge_base()`).
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// The spending cap for a request: `max_budget` when given, otherwise
    /// the upper bound of the budget tier.
    pub fn resolve_budget(&self, prefs: &Preferences) -> f64 {
        prefs
            .max_budget
            .unwrap_or_else(|| self.kb.budget_range(prefs.budget_range).max)
    }

    /// Produce a ranked, budget-bounded report for one vehicle.
    ///
    /// # Errors
    /// `TuneplanError::InvalidPreferences` when the goal list is empty or the
    /// explicit budget is negative or not a number. Nothing else fails.
    pub fn generate(&self, vehicle: &VehicleInfo, prefs: &Preferences) -> Result<Report> {
        if prefs.primary_goals.is_empty() {
            return Err(TuneplanError::InvalidPreferences(
                "at least one primary goal is required".to_string(),
            ));
        }
        if let Some(cap) = prefs.max_budget {
            if !cap.is_finite() || cap < 0.0 {
                return Err(TuneplanError::InvalidPreferences(format!(
                    "max budget must be a non-negative amount, got {}",
                    cap
                )));
            }
        }

        let max_budget = self.resolve_budget(prefs);
        let filter = experience_filter(prefs.experience_level);

        let candidates = self.collect_candidates(vehicle, prefs, &filter, max_budget);
        let mut unique = deduplicate(candidates);
        sort_by_priority(&mut unique);
        let recommendations = select_within_budget(unique, max_budget);

        let total_estimated_cost = total_cost(&recommendations);
        let compatibility_matrix = self.compatibility_matrix(&recommendations);
        let safety_summary = safety_summary(&recommendations);
        let legal_summary = legal_summary(&recommendations);

        info!(
            "Generated {} recommendations for {} {} {} (budget {:.0}, allocated {:.0})",
            recommendations.len(),
            vehicle.year,
            vehicle.make,
            vehicle.model,
            max_budget,
            total_estimated_cost.max
        );

        Ok(Report {
            vehicle: vehicle.clone(),
            preferences: prefs.clone(),
            recommendations,
            total_estimated_cost,
            compatibility_matrix,
            safety_summary,
            legal_summary,
            disclaimer: DISCLAIMER.to_string(),
            generated_at: Utc::now(),
        })
    }

    /// Walk goals, then their categories, then options, emitting one scored
    /// candidate per surviving (goal, option) pair.
    fn collect_candidates(
        &self,
        vehicle: &VehicleInfo,
        prefs: &Preferences,
        filter: &ExperienceFilter,
        max_budget: f64,
    ) -> Vec<Recommendation> {
        let mut candidates = Vec::new();

        for &goal in &prefs.primary_goals {
            for &category in goal_categories(goal) {
                for option in self.kb.options_for_category(category) {
                    if let Some(reason) = screen(option, filter, max_budget, vehicle.engine_type) {
                        debug!("Rejected '{}' for {}: {:?}", option.name, goal, reason);
                        continue;
                    }

                    let mut rec = Recommendation::from_option(option);
                    rec.priority_score = adjust_priority(&rec, goal, prefs);
                    candidates.push(rec);
                }
            }
        }

        candidates
    }

    fn compatibility_matrix(&self, recs: &[Recommendation]) -> BTreeMap<String, Vec<Category>> {
        recs.iter()
            .map(|rec| {
                (
                    rec.name.clone(),
                    self.kb.compatible_categories(rec.category).to_vec(),
                )
            })
            .collect()
    }
}

/// Check an option against experience limits, the budget cap and the
/// engine type. Returns the first failing rule.
fn screen(
    option: &ModificationOption,
    filter: &ExperienceFilter,
    max_budget: f64,
    engine_type: EngineType,
) -> Option<Rejection> {
    if option.safety_level > filter.max_safety_level {
        return Some(Rejection::SafetyCeiling);
    }
    if option.priority_score > filter.max_priority_score {
        return Some(Rejection::ScoreCeiling);
    }
    if filter.avoid_high_risk && option.safety_level == SafetyLevel::High {
        return Some(Rejection::HighRisk);
    }
    if option.cost_range.max > max_budget {
        return Some(Rejection::OverBudget);
    }
    if !is_engine_compatible(option, engine_type) {
        return Some(Rejection::EngineIncompatible);
    }
    None
}

/// ECU work is meaningless on an electric drivetrain; everything else fits
/// every engine type.
pub fn is_engine_compatible(option: &ModificationOption, engine_type: EngineType) -> bool {
    !(engine_type == EngineType::Electric && option.name.contains("ECU"))
}

/// Score a candidate for this request, starting from its base score.
///
/// Candidates are only ever generated from one of the user's goals, so the
/// goal boost applies to all of them during `generate`.
pub fn adjust_priority(rec: &Recommendation, goal: DrivingGoal, prefs: &Preferences) -> f64 {
    let mut score = rec.priority_score;

    if prefs.primary_goals.contains(&goal) {
        score *= GOAL_MATCH_BOOST;
    }
    if prefs.experience_level == ExperienceLevel::Beginner && rec.safety_level == SafetyLevel::High
    {
        score *= BEGINNER_HIGH_RISK_FACTOR;
    }
    if prefs.budget_range == BudgetRange::Budget && rec.cost_range.max < BUDGET_FRIENDLY_CEILING {
        score *= BUDGET_FRIENDLY_BOOST;
    }

    score.min(MAX_PRIORITY_SCORE)
}

/// Keep the first candidate for each (category, name), preserving order.
fn deduplicate(candidates: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|rec| seen.insert((rec.category, rec.name.clone())))
        .collect()
}

/// Highest score first. Stable, so equal scores keep goal/category order.
fn sort_by_priority(recs: &mut [Recommendation]) {
    recs.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
}

/// Greedy single pass over priority-sorted candidates.
///
/// A candidate is charged its list maximum when that fits; otherwise its
/// floor when that fits (marked `min_fit`); otherwise it is skipped and the
/// scan continues. At most [`MAX_RECOMMENDATIONS`] are accepted.
pub fn select_within_budget(sorted: Vec<Recommendation>, max_budget: f64) -> Vec<Recommendation> {
    let mut selected = Vec::new();
    let mut spent = 0.0;

    for mut rec in sorted {
        if selected.len() >= MAX_RECOMMENDATIONS {
            break;
        }

        if spent + rec.cost_range.max <= max_budget {
            rec.allocated_cost = rec.cost_range.max;
            rec.min_fit = false;
        } else if spent + rec.cost_range.min <= max_budget {
            debug!(
                "'{}' only fits at its floor ({:.0} spent of {:.0})",
                rec.name, spent, max_budget
            );
            rec.allocated_cost = rec.cost_range.min;
            rec.min_fit = true;
        } else {
            debug!("Skipping '{}': over remaining budget", rec.name);
            continue;
        }

        spent += rec.allocated_cost;
        selected.push(rec);
    }

    selected
}

fn total_cost(recs: &[Recommendation]) -> CostEstimate {
    CostEstimate {
        min: recs.iter().map(|r| r.cost_range.min).sum(),
        max: recs.iter().map(|r| r.allocated_cost).sum(),
        list_max: recs.iter().map(|r| r.cost_range.max).sum(),
        currency: "USD".to_string(),
    }
}

fn safety_summary(recs: &[Recommendation]) -> SafetySummary {
    let mut high = BTreeSet::new();
    let mut medium = BTreeSet::new();
    let mut low = BTreeSet::new();

    for rec in recs {
        let bucket = match rec.safety_level {
            SafetyLevel::High => &mut high,
            SafetyLevel::Medium => &mut medium,
            SafetyLevel::Low => &mut low,
        };
        bucket.extend(rec.safety_warnings.iter().cloned());
    }

    SafetySummary {
        high_risk: high.into_iter().collect(),
        medium_risk: medium.into_iter().collect(),
        low_risk: low.into_iter().collect(),
    }
}

fn legal_summary(recs: &[Recommendation]) -> LegalSummary {
    let mut warranty = BTreeSet::new();
    let mut emissions = BTreeSet::new();
    let mut insurance = BTreeSet::new();
    let mut considerations = BTreeSet::new();

    for rec in recs {
        if rec.warranty_impact != NO_IMPACT {
            warranty.insert(format!("{}: {}", rec.name, rec.warranty_impact));
        }
        if rec.emissions_impact != NO_IMPACT {
            emissions.insert(format!("{}: {}", rec.name, rec.emissions_impact));
        }
        if rec.insurance_impact != NO_IMPACT {
            insurance.insert(format!("{}: {}", rec.name, rec.insurance_impact));
        }
        considerations.extend(rec.legal_considerations.iter().cloned());
    }

    LegalSummary {
        warranty_impacts: warranty.into_iter().collect(),
        emissions_impacts: emissions.into_iter().collect(),
        insurance_impacts: insurance.into_iter().collect(),
        legal_considerations: considerations.into_iter().collect(),
    }
}
