//! Recommendation engine for aftermarket vehicle modifications.
//!
//! Turns a vehicle description and the owner's goals, budget and experience
//! into a ranked, costed list of modifications with safety and legal
//! summaries.
//!
//! # Pipeline
//!
//! - **Candidates**: goals -> prioritized categories -> catalog options
//! - **Screening**: experience limits, single-item budget cap, engine type
//! - **Scoring**: base score adjusted per goal, experience and budget tier
//! - **Selection**: dedup, stable sort by score, greedy budget fill (max 10)
//! - **Summaries**: cost totals, compatibility matrix, safety and legal tiers
//!
//! # Example
//!
//! ```ignore
//! use tuneplan::engine::*;
//! use tuneplan::knowledge::BudgetRange;
//!
//! let engine = RecommendationEngine::default();
//! let vehicle = VehicleInfo {
//!     make: "BMW".to_string(),
//!     model: "3 Series".to_string(),
//!     year: 2021,
//!     engine_type: EngineType::Petrol,
//!     current_modifications: vec![],
//! };
//! let prefs = Preferences {
//!     primary_goals: vec![DrivingGoal::Performance, DrivingGoal::TrackUse],
//!     budget_range: BudgetRange::Premium,
//!     experience_level: ExperienceLevel::Advanced,
//!     max_budget: Some(15000.0),
//! };
//!
//! let report = engine.generate(&vehicle, &prefs)?;
//! for rec in &report.recommendations {
//!     println!("{} ({:.1}/10): ${}", rec.name, rec.priority_score, rec.allocated_cost);
//! }
//! ```

mod recommender;
pub mod rules;
mod types;

pub use recommender::{
    adjust_priority, is_engine_compatible, select_within_budget, RecommendationEngine, DISCLAIMER,
};
pub use types::*;
