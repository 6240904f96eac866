//! Prompts for the enhancement and custom-suggestion LLM calls.

use crate::engine::{Preferences, Report, VehicleInfo};

/// System prompt shared by every provider.
pub const SYSTEM_PROMPT: &str = "You are an expert automotive engineer and car tuning specialist \
with deep knowledge of engine tuning, suspension and handling, brake upgrades, exhaust and intake \
systems, tire and wheel selection, safety, legal compliance, modification costs and compatibility \
between modifications. Always prioritize safety and legal compliance while maximizing value for \
the owner's goals and budget. Always respond with valid JSON only, no markdown formatting or code blocks.";

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn vehicle_and_preferences_block(vehicle: &VehicleInfo, prefs: &Preferences) -> String {
    let goals: Vec<&str> = prefs.primary_goals.iter().map(|g| g.as_str()).collect();
    let max_budget = prefs
        .max_budget
        .map(|b| format!("${:.0}", b))
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        r#"VEHICLE:
- Make: {make}
- Model: {model}
- Year: {year}
- Engine Type: {engine}
- Current Modifications: {mods}

OWNER PREFERENCES:
- Primary Goals: {goals}
- Budget Range: {range}
- Experience Level: {experience}
- Max Budget: {max_budget}
"#,
        make = vehicle.make,
        model = vehicle.model,
        year = vehicle.year,
        engine = vehicle.engine_type,
        mods = join_or_none(&vehicle.current_modifications),
        goals = goals.join(", "),
        range = prefs.budget_range,
        experience = prefs.experience_level,
        max_budget = max_budget,
    )
}

/// Build the prompt asking the model to enrich an engine-generated report.
///
/// Recommendations are listed with zero-based indices, which the response
/// refers back to through `original_index`.
pub fn build_enhancement_prompt(report: &Report) -> String {
    let mut prompt = String::from(
        "Analyze the following car modification plan and provide enhanced insights.\n\n",
    );
    prompt.push_str(&vehicle_and_preferences_block(
        &report.vehicle,
        &report.preferences,
    ));
    prompt.push_str("\nCURRENT RECOMMENDATIONS:\n");

    for (index, rec) in report.recommendations.iter().enumerate() {
        prompt.push_str(&format!(
            r#"
[{index}] {name}
   - Category: {category}
   - Cost: ${min:.0} - ${max:.0}
   - Priority Score: {score:.1}/10
   - Safety Level: {safety}
   - Description: {description}
   - Benefits: {benefits}
   - Safety Warnings: {warnings}
"#,
            index = index,
            name = rec.name,
            category = rec.category,
            min = rec.cost_range.min,
            max = rec.cost_range.max,
            score = rec.priority_score,
            safety = rec.safety_level,
            description = rec.description,
            benefits = join_or_none(&rec.benefits),
            warnings = join_or_none(&rec.safety_warnings),
        ));
    }

    let total = &report.total_estimated_cost;
    prompt.push_str(&format!(
        r#"
TOTAL ESTIMATED COST: ${min:.0} - ${max:.0}

Respond with JSON in exactly this shape:
{{
  "enhanced_recommendations": [
    {{
      "original_index": 0,
      "enhanced_description": "Detailed technical description",
      "additional_benefits": ["..."],
      "enhanced_safety_warnings": ["..."],
      "installation_tips": ["..."],
      "maintenance_considerations": ["..."]
    }}
  ],
  "overall_analysis": {{
    "summary": "Overall assessment of the plan",
    "risk_assessment": "Safety and legal risk analysis",
    "value_analysis": "Cost-benefit analysis",
    "professional_advice": "When to consult a professional"
  }}
}}

Do not invent new recommendations and do not change costs or categories."#,
        min = total.min,
        max = total.max,
    ));

    prompt
}

/// Build the prompt asking for free-form suggestions outside the catalog.
pub fn build_custom_prompt(vehicle: &VehicleInfo, prefs: &Preferences) -> String {
    format!(
        r#"Suggest custom car modifications for the following vehicle and preferences.

{block}
Provide 5-8 suggestions as JSON in exactly this shape:
{{
  "recommendations": [
    {{
      "name": "Modification name",
      "category": "ecu_remapping|exhaust_system|air_intake|suspension|tires_wheels|brake_system|cosmetic",
      "description": "What the modification involves",
      "cost_range": {{"min": 1000, "max": 3000}},
      "priority_score": 8.5,
      "safety_level": "low|medium|high",
      "installation_difficulty": "Easy|Moderate|Advanced",
      "benefits": ["..."],
      "safety_warnings": ["..."],
      "legal_considerations": ["..."],
      "compatibility_notes": "Compatibility with other modifications",
      "professional_installation_required": true
    }}
  ]
}}

Favor safety, legal compliance, value within the budget and suitability for the owner's experience level."#,
        block = vehicle_and_preferences_block(vehicle, prefs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DrivingGoal, EngineType, ExperienceLevel, RecommendationEngine};
    use crate::knowledge::BudgetRange;

    fn sample() -> (VehicleInfo, Preferences) {
        (
            VehicleInfo {
                make: "Honda".to_string(),
                model: "Civic".to_string(),
                year: 2019,
                engine_type: EngineType::Petrol,
                current_modifications: vec![],
            },
            Preferences {
                primary_goals: vec![DrivingGoal::DailyComfort],
                budget_range: BudgetRange::Moderate,
                experience_level: ExperienceLevel::Intermediate,
                max_budget: None,
            },
        )
    }

    #[test]
    fn test_enhancement_prompt_indexes_recommendations() {
        let (vehicle, prefs) = sample();
        let report = RecommendationEngine::default()
            .generate(&vehicle, &prefs)
            .unwrap();
        let prompt = build_enhancement_prompt(&report);

        assert!(prompt.contains("- Make: Honda"));
        assert!(prompt.contains("Current Modifications: None"));
        assert!(prompt.contains("Max Budget: Not specified"));
        assert!(prompt.contains(&format!("[0] {}", report.recommendations[0].name)));
        assert!(prompt.contains("original_index"));
    }

    #[test]
    fn test_custom_prompt_mentions_goals() {
        let (vehicle, prefs) = sample();
        let prompt = build_custom_prompt(&vehicle, &prefs);
        assert!(prompt.contains("Primary Goals: daily_comfort"));
        assert!(prompt.contains("professional_installation_required"));
    }
}
