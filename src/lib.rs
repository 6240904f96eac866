pub mod cli;
pub mod config;
pub mod engine;
pub mod enhancer;
mod error;
pub mod knowledge;
pub mod render;
pub mod validator;

pub use engine::{Preferences, Recommendation, RecommendationEngine, Report, VehicleInfo};
pub use error::{Result, TuneplanError};
