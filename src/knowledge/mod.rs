//! Static knowledge base of aftermarket modifications.
//!
//! The catalog is editorial content kept in TOML and embedded in the binary.
//! It supplies, per category, the modification options the engine ranks,
//! plus category compatibility pairs, budget-tier bounds and safety
//! guideline text.
//!
//! # Example
//!
//! ```ignore
//! use tuneplan::knowledge::{Category, KnowledgeBase};
//!
//! let kb = KnowledgeBase::builtin();
//! for option in kb.options_for_category(Category::Suspension) {
//!     println!("{}: ${}-${}", option.name, option.cost_range.min, option.cost_range.max);
//! }
//! ```

mod catalog;
mod types;

pub use catalog::{load_knowledge_base, KnowledgeBase};
pub use types::*;
