//! Parsing of model responses and the pure merge step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Report;
use crate::error::{Result, TuneplanError};
use crate::knowledge::CostRange;

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Model-supplied enrichment for one recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationEnhancement {
    /// Zero-based index into the report's recommendation list
    pub original_index: usize,
    pub enhanced_description: String,
    pub additional_benefits: Vec<String>,
    pub enhanced_safety_warnings: Vec<String>,
    pub installation_tips: Vec<String>,
    pub maintenance_considerations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallAnalysis {
    pub summary: String,
    pub risk_assessment: String,
    pub value_analysis: String,
    pub professional_advice: String,
}

impl OverallAnalysis {
    fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.risk_assessment.is_empty()
            && self.value_analysis.is_empty()
            && self.professional_advice.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementResponse {
    pub enhanced_recommendations: Vec<RecommendationEnhancement>,
    pub overall_analysis: OverallAnalysis,
}

/// A model-suggested modification that is not in the catalog.
///
/// Kept loosely typed: the model may use category names the catalog does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSuggestion {
    pub name: String,
    pub category: String,
    pub description: String,
    pub cost_range: Option<CostRange>,
    pub priority_score: Option<f64>,
    pub safety_level: String,
    pub installation_difficulty: String,
    pub benefits: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub legal_considerations: Vec<String>,
    pub compatibility_notes: String,
    pub professional_installation_required: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CustomSuggestionList {
    recommendations: Vec<CustomSuggestion>,
}

// =============================================================================
// PARSING
// =============================================================================

/// Strip markdown code fences from an LLM response if present.
pub fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    // Drop the opening fence along with any language tag
    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    let cleaned = after_open.trim_end();
    cleaned
        .strip_suffix("```")
        .unwrap_or(cleaned)
        .trim()
        .to_string()
}

/// The JSON object in a model response: fences stripped, and any prose
/// before the first `{` or after the last `}` dropped.
fn json_payload(raw: &str) -> String {
    let cleaned = strip_markdown_json(raw);
    if cleaned.starts_with('{') {
        return cleaned;
    }
    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => cleaned[start..=end].to_string(),
        _ => cleaned,
    }
}

pub fn parse_enhancement(raw: &str) -> Result<EnhancementResponse> {
    let cleaned = json_payload(raw);
    serde_json::from_str(&cleaned)
        .map_err(|e| TuneplanError::Enhancement(format!("Failed to parse enhancement JSON: {}", e)))
}

pub fn parse_custom_suggestions(raw: &str) -> Result<Vec<CustomSuggestion>> {
    let cleaned = json_payload(raw);
    let list: CustomSuggestionList = serde_json::from_str(&cleaned).map_err(|e| {
        TuneplanError::Enhancement(format!("Failed to parse custom suggestions JSON: {}", e))
    })?;
    Ok(list.recommendations)
}

// =============================================================================
// MERGE
// =============================================================================

/// Merge a model response into a copy of `report`.
///
/// Only descriptive text changes. Category, costs, priority score, safety
/// level and the report-level summaries are left exactly as the engine
/// produced them. Entries whose `original_index` is out of range are ignored.
pub fn apply_enhancements(report: &Report, response: &EnhancementResponse) -> Report {
    let mut enhanced = report.clone();

    for (index, rec) in enhanced.recommendations.iter_mut().enumerate() {
        let Some(enh) = response
            .enhanced_recommendations
            .iter()
            .find(|e| e.original_index == index)
        else {
            continue;
        };

        if !enh.enhanced_description.trim().is_empty() {
            rec.description = enh.enhanced_description.clone();
        }
        rec.benefits.extend(enh.additional_benefits.iter().cloned());
        rec.safety_warnings
            .extend(enh.enhanced_safety_warnings.iter().cloned());
        if !enh.installation_tips.is_empty() {
            rec.legal_considerations
                .push(format!("Installation: {}", enh.installation_tips.join("; ")));
        }
        if !enh.maintenance_considerations.is_empty() {
            rec.legal_considerations.push(format!(
                "Maintenance: {}",
                enh.maintenance_considerations.join("; ")
            ));
        }
        debug!("Applied enhancement to recommendation {} ({})", index, rec.name);
    }

    let overall = &response.overall_analysis;
    if !overall.is_empty() {
        enhanced.disclaimer.push_str("\n\nAI-Enhanced Analysis:\n");
        for (label, text) in [
            ("Summary", &overall.summary),
            ("Risk Assessment", &overall.risk_assessment),
            ("Value Analysis", &overall.value_analysis),
            ("Professional Advice", &overall.professional_advice),
        ] {
            if !text.is_empty() {
                enhanced.disclaimer.push_str(&format!("{}: {}\n", label, text));
            }
        }
    }

    enhanced
}
