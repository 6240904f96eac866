// Command-line interface for tuneplan.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{self, Settings};
use crate::engine::{
    DrivingGoal, EngineType, ExperienceLevel, Preferences, RecommendationEngine,
    RecommendationRequest, VehicleInfo,
};
use crate::enhancer::{enhance_or_original, CustomSuggestion, LlmEnhancer, SUPPORTED_PROVIDERS};
use crate::knowledge::{load_knowledge_base, BudgetRange, Category, KnowledgeBase};
use crate::render::render_text;
use crate::validator::{self, validate_request};

/// tuneplan - budget-bounded modification planner for road cars
#[derive(Parser, Debug)]
#[command(name = "tuneplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rank aftermarket car modifications against your goals, experience and budget", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to <config dir>/tuneplan/config.toml)
    #[arg(global = true, long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Print the report as JSON instead of text
    #[arg(global = true, long = "json")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that produces a report
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct ReportFlags {
    /// Refine descriptions with the configured LLM provider
    #[arg(long = "enhance")]
    pub enhance: bool,

    /// Also ask the LLM provider for modifications outside the catalog
    #[arg(long = "custom")]
    pub custom: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a plan from command-line flags
    Recommend {
        #[arg(long)]
        make: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        year: i32,

        /// petrol, diesel, hybrid or electric
        #[arg(long = "engine")]
        engine_type: EngineType,

        /// Goals in priority order (comma separated or repeated)
        #[arg(long = "goal", required = true, value_delimiter = ',')]
        goals: Vec<DrivingGoal>,

        /// budget, moderate, premium or unlimited
        #[arg(long = "budget-range")]
        budget_range: BudgetRange,

        /// beginner, intermediate or advanced
        #[arg(long = "experience")]
        experience_level: ExperienceLevel,

        /// Spending cap in USD (defaults to the budget range's upper bound)
        #[arg(long = "max-budget")]
        max_budget: Option<f64>,

        /// Modification already fitted (repeatable)
        #[arg(long = "current-mod")]
        current_modifications: Vec<String>,

        #[command(flatten)]
        flags: ReportFlags,
    },

    /// Build a plan from a JSON request file
    FromFile {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[command(flatten)]
        flags: ReportFlags,
    },

    /// Build a plan for the built-in sample request (2021 BMW 3 Series)
    Sample {
        #[command(flatten)]
        flags: ReportFlags,
    },

    /// List accepted values for every request field
    Options {
        /// Show only makes matching this text, with their engine types and models
        #[arg(long)]
        make: Option<String>,

        /// Narrow the listed models of matched makes
        #[arg(long, requires = "make")]
        model: Option<String>,

        /// Show the categories that pair well with this one
        #[arg(long)]
        category: Option<String>,
    },

    /// Manage provider API keys in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Store an API key (read from stdin when omitted)
    Set {
        provider: String,
        key: Option<String>,
    },
    /// Remove a stored API key
    Delete { provider: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose);

        let settings = config::load_settings_or_default(self.config.as_deref())?;
        let json = self.json;

        match self.command {
            Commands::Recommend {
                make,
                model,
                year,
                engine_type,
                goals,
                budget_range,
                experience_level,
                max_budget,
                current_modifications,
                flags,
            } => {
                let request = RecommendationRequest {
                    vehicle: VehicleInfo {
                        make,
                        model,
                        year,
                        engine_type,
                        current_modifications,
                    },
                    preferences: Preferences {
                        primary_goals: goals,
                        budget_range,
                        experience_level,
                        max_budget,
                    },
                };
                cmd_report(request, &settings, flags, json).await
            }
            Commands::FromFile { path, flags } => {
                let request = read_request(&path)?;
                cmd_report(request, &settings, flags, json).await
            }
            Commands::Sample { flags } => cmd_report(sample_request(), &settings, flags, json).await,
            Commands::Options {
                make,
                model,
                category,
            } => cmd_options(&settings, make.as_deref(), model.as_deref(), category.as_deref(), json),
            Commands::Key { action } => cmd_key(action),
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// The request used by `tuneplan sample`.
pub fn sample_request() -> RecommendationRequest {
    RecommendationRequest {
        vehicle: VehicleInfo {
            make: "BMW".to_string(),
            model: "3 Series".to_string(),
            year: 2021,
            engine_type: EngineType::Petrol,
            current_modifications: vec!["Sport exhaust".to_string(), "Lowered suspension".to_string()],
        },
        preferences: Preferences {
            primary_goals: vec![DrivingGoal::Performance, DrivingGoal::TrackUse],
            budget_range: BudgetRange::Premium,
            experience_level: ExperienceLevel::Advanced,
            max_budget: Some(15000.0),
        },
    }
}

fn read_request(path: &Path) -> Result<RecommendationRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request file {}", path.display()))
}

fn knowledge_base(settings: &Settings) -> Result<KnowledgeBase> {
    match &settings.knowledge_base {
        Some(path) => {
            info!("Using knowledge base from {}", path.display());
            Ok(load_knowledge_base(path)?)
        }
        None => Ok(KnowledgeBase::default()),
    }
}

/// Build the configured LLM enhancer, or `None` when no API key is available.
///
/// Key lookup failures only disable enhancement; the engine report is still
/// printed.
fn llm_enhancer(settings: &Settings) -> Option<LlmEnhancer> {
    enhancer_from_key(settings, config::api_key_for(&settings.enhancer.provider))
}

fn enhancer_from_key(
    settings: &Settings,
    key_lookup: crate::Result<Option<String>>,
) -> Option<LlmEnhancer> {
    let enhancer = &settings.enhancer;
    match key_lookup {
        Ok(Some(api_key)) => Some(LlmEnhancer::new(
            &enhancer.provider,
            &enhancer.model(),
            &api_key,
            enhancer.timeout(),
        )),
        Ok(None) => {
            warn!(
                "No API key configured for '{}'; run `tuneplan key set {}` or set {}",
                enhancer.provider,
                enhancer.provider,
                config::api_key_env_var(&enhancer.provider).unwrap_or("the provider's key variable")
            );
            None
        }
        Err(e) => {
            eprintln!(
                "warning: API key lookup for '{}' failed, showing base recommendations: {}",
                enhancer.provider, e
            );
            None
        }
    }
}

async fn cmd_report(
    request: RecommendationRequest,
    settings: &Settings,
    flags: ReportFlags,
    json: bool,
) -> Result<()> {
    let kb = knowledge_base(settings)?;
    let validation = validate_request(&request.vehicle, &request.preferences, &kb);
    for warning in &validation.warnings {
        warn!("{}: {}", warning.field, warning.message);
    }
    validation.into_result()?;

    let engine = RecommendationEngine::new(kb);
    let mut report = engine.generate(&request.vehicle, &request.preferences)?;

    let wants_llm = flags.enhance || flags.custom || settings.enhancer.enabled;
    let enhancer = if wants_llm { llm_enhancer(settings) } else { None };

    let mut custom = Vec::new();
    if let Some(enhancer) = &enhancer {
        if flags.enhance || settings.enhancer.enabled {
            let (enhanced, warning) =
                enhance_or_original(enhancer, report, settings.enhancer.timeout()).await;
            if let Some(warning) = warning {
                eprintln!("warning: {}", warning);
            }
            report = enhanced;
        }
        if flags.custom {
            match enhancer
                .suggest_custom(&request.vehicle, &request.preferences)
                .await
            {
                Ok(suggestions) => custom = suggestions,
                Err(e) => eprintln!("warning: custom suggestions unavailable: {}", e),
            }
        }
    }

    if json {
        let mut value = serde_json::to_value(&report)?;
        if flags.custom {
            value["custom_suggestions"] = serde_json::to_value(&custom)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render_text(&report));
        if flags.custom {
            print!("{}", render_custom(&custom));
        }
    }
    Ok(())
}

fn render_custom(suggestions: &[CustomSuggestion]) -> String {
    let mut out = format!("\nCUSTOM SUGGESTIONS ({}, not in catalog)\n", suggestions.len());
    for (i, s) in suggestions.iter().enumerate() {
        out.push_str(&format!("\n{}. {} [{}]\n", i + 1, s.name, s.category));
        if !s.description.is_empty() {
            out.push_str(&format!("   {}\n", s.description));
        }
        if let Some(cost) = s.cost_range {
            out.push_str(&format!("   Cost: ${:.0} - ${:.0}\n", cost.min, cost.max));
        }
        if !s.safety_level.is_empty() {
            out.push_str(&format!("   Safety Level: {}\n", s.safety_level));
        }
    }
    out
}

#[derive(Debug, Serialize)]
struct BudgetBounds {
    range: &'static str,
    min: f64,
    max: f64,
}

#[derive(Debug, Serialize)]
struct MakeListing {
    make: &'static str,
    engine_types: Vec<&'static str>,
    models: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct CategoryPairing {
    category: String,
    pairs_well_with: Vec<&'static str>,
}

/// Everything `tuneplan options` prints, shared by the text and JSON output.
#[derive(Debug, Serialize)]
struct OptionsListing {
    engine_types: Vec<&'static str>,
    driving_goals: Vec<&'static str>,
    experience_levels: Vec<&'static str>,
    budget_ranges: Vec<BudgetBounds>,
    categories: Vec<&'static str>,
    makes: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    make_details: Vec<MakeListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compatibility: Option<CategoryPairing>,
    safety_guidelines: BTreeMap<String, Vec<String>>,
    providers: &'static [&'static str],
}

fn options_listing(
    kb: &KnowledgeBase,
    make: Option<&str>,
    model: Option<&str>,
    category: Option<&str>,
) -> OptionsListing {
    let makes = match make {
        Some(partial) => validator::suggest_makes(partial),
        None => validator::known_makes().to_vec(),
    };
    let make_details = if make.is_some() {
        makes
            .iter()
            .map(|&name| MakeListing {
                make: name,
                engine_types: validator::compatible_engine_types(name)
                    .iter()
                    .map(|e| e.as_str())
                    .collect(),
                models: validator::suggest_models(name, model.unwrap_or("")),
            })
            .collect()
    } else {
        Vec::new()
    };
    let compatibility = category.map(|key| CategoryPairing {
        category: key.to_string(),
        pairs_well_with: kb
            .compatible_categories_for_key(key)
            .iter()
            .map(|c| c.as_str())
            .collect(),
    });
    let safety_guidelines = kb
        .guideline_topics()
        .into_iter()
        .map(|topic| (topic.to_string(), kb.safety_guidelines(topic).to_vec()))
        .collect();

    OptionsListing {
        engine_types: EngineType::ALL.iter().map(|e| e.as_str()).collect(),
        driving_goals: DrivingGoal::ALL.iter().map(|g| g.as_str()).collect(),
        experience_levels: ExperienceLevel::ALL.iter().map(|e| e.as_str()).collect(),
        budget_ranges: BudgetRange::ALL
            .into_iter()
            .map(|range| {
                let bounds = kb.budget_range(range);
                BudgetBounds {
                    range: range.as_str(),
                    min: bounds.min,
                    max: bounds.max,
                }
            })
            .collect(),
        categories: Category::ALL.iter().map(|c| c.as_str()).collect(),
        makes,
        make_details,
        compatibility,
        safety_guidelines,
        providers: &SUPPORTED_PROVIDERS,
    }
}

fn render_options(listing: &OptionsListing) -> String {
    let mut out = String::new();
    out.push_str(&format!("Engine types:      {}\n", listing.engine_types.join(", ")));
    out.push_str(&format!("Driving goals:     {}\n", listing.driving_goals.join(", ")));
    out.push_str(&format!("Experience levels: {}\n", listing.experience_levels.join(", ")));
    out.push_str("Budget ranges:\n");
    for bounds in &listing.budget_ranges {
        out.push_str(&format!("  {:<10} ${:.0} - ${:.0}\n", bounds.range, bounds.min, bounds.max));
    }
    out.push_str(&format!("Categories:        {}\n", listing.categories.join(", ")));
    if listing.makes.is_empty() {
        out.push_str("Makes:             (no match)\n");
    } else {
        out.push_str(&format!("Makes:             {}\n", listing.makes.join(", ")));
    }
    for details in &listing.make_details {
        out.push_str(&format!("  {}\n", details.make));
        out.push_str(&format!("    engines: {}\n", details.engine_types.join(", ")));
        if !details.models.is_empty() {
            out.push_str(&format!("    models:  {}\n", details.models.join(", ")));
        }
    }
    if let Some(pairing) = &listing.compatibility {
        let pairs = if pairing.pairs_well_with.is_empty() {
            "none".to_string()
        } else {
            pairing.pairs_well_with.join(", ")
        };
        out.push_str(&format!("Pairs with {}: {}\n", pairing.category, pairs));
    }
    out.push_str("Safety guidelines:\n");
    for (topic, lines) in &listing.safety_guidelines {
        out.push_str(&format!("  {}:\n", topic));
        for line in lines {
            out.push_str(&format!("    - {}\n", line));
        }
    }
    out.push_str(&format!("LLM providers:     {}\n", listing.providers.join(", ")));
    out
}

fn cmd_options(
    settings: &Settings,
    make: Option<&str>,
    model: Option<&str>,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let kb = knowledge_base(settings)?;
    let listing = options_listing(&kb, make, model, category);
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print!("{}", render_options(&listing));
    }
    Ok(())
}

fn cmd_key(action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { provider, key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    eprintln!("Enter API key for {}:", provider);
                    let mut line = String::new();
                    std::io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("Failed to read API key from stdin")?;
                    line.trim().to_string()
                }
            };
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            config::set_api_key(&provider, &key)?;
            println!("Stored API key for {}", provider);
        }
        KeyAction::Delete { provider } => {
            config::delete_api_key(&provider)?;
            println!("Deleted API key for {}", provider);
        }
    }
    Ok(())
}

/// Parse arguments and run.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend_flags() {
        let cli = Cli::try_parse_from([
            "tuneplan",
            "recommend",
            "--make",
            "Honda",
            "--model",
            "Civic",
            "--year",
            "2019",
            "--engine",
            "petrol",
            "--goal",
            "performance,daily-comfort",
            "--budget-range",
            "moderate",
            "--experience",
            "beginner",
            "--current-mod",
            "Short shifter",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Recommend {
                goals,
                budget_range,
                max_budget,
                current_modifications,
                flags,
                ..
            } => {
                assert_eq!(goals, vec![DrivingGoal::Performance, DrivingGoal::DailyComfort]);
                assert_eq!(budget_range, BudgetRange::Moderate);
                assert_eq!(max_budget, None);
                assert_eq!(current_modifications, vec!["Short shifter".to_string()]);
                assert!(!flags.enhance);
            }
            other => panic!("expected recommend, got {:?}", other),
        }
    }

    #[test]
    fn test_recommend_requires_a_goal() {
        let result = Cli::try_parse_from([
            "tuneplan", "recommend", "--make", "Honda", "--model", "Civic", "--year", "2019",
            "--engine", "petrol", "--budget-range", "moderate", "--experience", "beginner",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_key_and_file_commands() {
        let cli = Cli::try_parse_from(["tuneplan", "key", "delete", "gemini"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Key { action: KeyAction::Delete { ref provider } } if provider == "gemini"
        ));

        let cli = Cli::try_parse_from(["tuneplan", "from-file", "req.json", "--enhance"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::FromFile { flags: ReportFlags { enhance: true, .. }, .. }
        ));
    }

    #[test]
    fn test_sample_request_is_valid() {
        let request = sample_request();
        let report = validate_request(
            &request.vehicle,
            &request.preferences,
            KnowledgeBase::builtin(),
        );
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_read_request_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, serde_json::to_string(&sample_request()).unwrap()).unwrap();
        assert_eq!(read_request(&path).unwrap(), sample_request());

        std::fs::write(&path, "{not json").unwrap();
        let err = read_request(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse request file"));
    }

    #[test]
    fn test_render_custom_lists_suggestions() {
        let suggestions = vec![CustomSuggestion {
            name: "Strut brace".to_string(),
            category: "suspension".to_string(),
            ..Default::default()
        }];
        let text = render_custom(&suggestions);
        assert!(text.contains("CUSTOM SUGGESTIONS (1, not in catalog)"));
        assert!(text.contains("1. Strut brace [suspension]"));
    }

    #[test]
    fn test_key_lookup_failure_disables_enhancement() {
        let settings = Settings::default();
        let lookup = Err(crate::error::TuneplanError::Keychain(
            "Platform secure storage failure".to_string(),
        ));
        assert!(enhancer_from_key(&settings, lookup).is_none());
        assert!(enhancer_from_key(&settings, Ok(None)).is_none());

        let enhancer = enhancer_from_key(&settings, Ok(Some("sk-test".to_string()))).unwrap();
        assert_eq!(enhancer.provider(), "claude");
        assert_eq!(enhancer.model(), settings.enhancer.model());
    }

    #[test]
    fn test_parse_options_filters() {
        let cli = Cli::try_parse_from([
            "tuneplan", "options", "--make", "tes", "--model", "model", "--category", "suspension",
        ])
        .unwrap();
        match cli.command {
            Commands::Options { make, model, category } => {
                assert_eq!(make.as_deref(), Some("tes"));
                assert_eq!(model.as_deref(), Some("model"));
                assert_eq!(category.as_deref(), Some("suspension"));
            }
            other => panic!("expected options, got {:?}", other),
        }

        assert!(Cli::try_parse_from(["tuneplan", "options", "--model", "Civic"]).is_err());
    }

    #[test]
    fn test_options_listing_without_filters() {
        let listing = options_listing(KnowledgeBase::builtin(), None, None, None);
        assert_eq!(listing.makes, validator::known_makes().to_vec());
        assert!(listing.make_details.is_empty());
        assert!(listing.compatibility.is_none());
        assert_eq!(
            listing.safety_guidelines.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["brakes", "general", "performance", "suspension"]
        );
        assert_eq!(listing.budget_ranges[1].range, "moderate");
        assert_eq!(listing.budget_ranges[1].max, 8000.0);

        let value = serde_json::to_value(&listing).unwrap();
        assert!(value.get("make_details").is_none());
        assert!(value.get("compatibility").is_none());
        assert_eq!(value["safety_guidelines"]["general"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_options_listing_with_filters() {
        let kb = KnowledgeBase::builtin();
        let listing = options_listing(kb, Some("tes"), Some("model"), Some("air_intake"));
        assert_eq!(listing.makes, vec!["Tesla"]);
        assert_eq!(listing.make_details.len(), 1);
        assert_eq!(listing.make_details[0].engine_types, vec!["electric"]);
        assert_eq!(listing.make_details[0].models.len(), 4);

        let pairing = listing.compatibility.as_ref().unwrap();
        assert_eq!(pairing.pairs_well_with, vec!["ecu_remapping", "exhaust_system"]);

        let text = render_options(&listing);
        assert!(text.contains("Makes:             Tesla"));
        assert!(text.contains("    engines: electric"));
        assert!(text.contains("Pairs with air_intake: ecu_remapping, exhaust_system"));
        assert!(text.contains("  brakes:"));

        let unknown = options_listing(kb, Some("Trabant"), None, Some("nitrous"));
        assert!(unknown.makes.is_empty());
        let text = render_options(&unknown);
        assert!(text.contains("Makes:             (no match)"));
        assert!(text.contains("Pairs with nitrous: none"));
    }
}
