//! Optional LLM post-processing of engine reports.
//!
//! Enhancement only rewrites descriptive text. Selection, scoring and costs
//! are owned by the engine, and any failure falls back to the unmodified
//! report.

pub mod apply;
mod llm;
pub mod prompts;

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::Report;
use crate::error::Result;

pub use apply::{apply_enhancements, strip_markdown_json, CustomSuggestion, EnhancementResponse};
pub use llm::{default_model, LlmEnhancer, SUPPORTED_PROVIDERS};

/// Post-processor that returns an enriched copy of a report.
pub trait Enhancer {
    fn enhance(&self, report: &Report) -> impl Future<Output = Result<Report>> + Send;
}

/// Enhancer that returns the report unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnhancer;

impl Enhancer for NoopEnhancer {
    async fn enhance(&self, report: &Report) -> Result<Report> {
        Ok(report.clone())
    }
}

/// Run `enhancer` with a deadline.
///
/// Returns the enhanced report and `None`, or the original report and a
/// warning message when enhancement failed or timed out.
pub async fn enhance_or_original<E: Enhancer>(
    enhancer: &E,
    report: Report,
    timeout: Duration,
) -> (Report, Option<String>) {
    let outcome = tokio::time::timeout(timeout, enhancer.enhance(&report)).await;
    match outcome {
        Ok(Ok(enhanced)) => {
            info!("Report enhancement succeeded");
            (enhanced, None)
        }
        Ok(Err(e)) => {
            let msg = format!("Enhancement failed, showing base recommendations: {}", e);
            warn!("{}", msg);
            (report, Some(msg))
        }
        Err(_) => {
            let msg = format!(
                "Enhancement timed out after {}s, showing base recommendations",
                timeout.as_secs()
            );
            warn!("{}", msg);
            (report, Some(msg))
        }
    }
}
