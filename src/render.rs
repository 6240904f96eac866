//! Plain-text rendering of a report for terminal output.

use std::fmt::Write;

use crate::engine::rules::experience_filter;
use crate::engine::Report;

const RULE_WIDTH: usize = 72;

/// "track_use" -> "Track Use"
fn title_case(tag: &str) -> String {
    tag.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn money(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Render `report` as human-readable text.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let vehicle = &report.vehicle;
    let prefs = &report.preferences;
    let total = &report.total_estimated_cost;
    let suggest_professional =
        experience_filter(prefs.experience_level).prefer_professional_installation;

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "MODIFICATION PLAN");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "Vehicle:    {} {} {}",
        vehicle.year, vehicle.make, vehicle.model
    );
    let _ = writeln!(out, "Engine:     {}", title_case(vehicle.engine_type.as_str()));
    let goals: Vec<String> = prefs
        .primary_goals
        .iter()
        .map(|g| title_case(g.as_str()))
        .collect();
    let _ = writeln!(out, "Goals:      {}", goals.join(", "));
    let budget = prefs
        .max_budget
        .map(|b| format!(" (max {})", money(b)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "Budget:     {}{}",
        title_case(prefs.budget_range.as_str()),
        budget
    );
    let _ = writeln!(
        out,
        "Experience: {}",
        title_case(prefs.experience_level.as_str())
    );
    let _ = writeln!(
        out,
        "Estimated:  {} - {} {} (list maximum {})",
        money(total.min),
        money(total.max),
        total.currency,
        money(total.list_max)
    );

    let _ = writeln!(out, "\nRECOMMENDATIONS ({})", report.recommendations.len());
    if report.recommendations.is_empty() {
        let _ = writeln!(
            out,
            "  No catalog modification fits these goals, experience level and budget."
        );
    }

    for (i, rec) in report.recommendations.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, rec.name);
        let _ = writeln!(out, "   Category:     {}", title_case(rec.category.as_str()));
        let _ = writeln!(out, "   Description:  {}", rec.description);
        let _ = writeln!(
            out,
            "   Cost:         {} - {}",
            money(rec.cost_range.min),
            money(rec.cost_range.max)
        );
        if rec.min_fit {
            let _ = writeln!(
                out,
                "   Budgeted:     {} (entry-level option only)",
                money(rec.allocated_cost)
            );
        }
        let _ = writeln!(out, "   Priority:     {:.1}/10", rec.priority_score);
        let _ = writeln!(out, "   Safety Level: {}", title_case(rec.safety_level.as_str()));
        let professional = if rec.professional_required {
            ", professional installation required"
        } else if suggest_professional {
            ", professional fitting recommended at this experience level"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "   Installation: {}{}",
            rec.installation_difficulty, professional
        );
        for (label, items) in [
            ("Benefits", &rec.benefits),
            ("Prerequisites", &rec.prerequisites),
            ("Safety Warnings", &rec.safety_warnings),
            ("Legal Considerations", &rec.legal_considerations),
        ] {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "   {}:", label);
            for item in items {
                let _ = writeln!(out, "     - {}", item);
            }
        }
        if let Some(compatible) = report.compatibility_matrix.get(&rec.name) {
            if !compatible.is_empty() {
                let names: Vec<String> =
                    compatible.iter().map(|c| title_case(c.as_str())).collect();
                let _ = writeln!(out, "   Pairs well with: {}", names.join(", "));
            }
        }
    }

    section(&mut out, "HIGH RISK WARNINGS", &report.safety_summary.high_risk);
    section(&mut out, "WARRANTY IMPACTS", &report.legal_summary.warranty_impacts);
    section(&mut out, "EMISSIONS IMPACTS", &report.legal_summary.emissions_impacts);
    section(&mut out, "INSURANCE IMPACTS", &report.legal_summary.insurance_impacts);

    let _ = writeln!(out, "\nDISCLAIMER");
    let _ = writeln!(out, "{}", report.disclaimer.trim_end());
    out
}
