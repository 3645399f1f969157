//! Extraction/summarization stage
//!
//! Turns fetched page text into structured summary items with one
//! generation request. Model availability and quota vary per deployment
//! and per request, so an ordered list of candidate models is tried most
//! to least capable; the task tolerates a weaker fallback. The first
//! candidate returning any non-empty text wins.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::services::GenerativeClient;
use crate::util::char_prefix;

/// Target label used when neither a keyword nor a store id was supplied
const DEFAULT_TARGET: &str = "local highlights";

/// Every candidate model failed or returned empty output
#[derive(Debug, Error)]
#[error("extraction failed: every candidate model failed or returned empty output")]
pub struct ExtractionError;

/// Model-backed extraction over an ordered candidate list
pub struct ExtractionStage {
    genai: Arc<dyn GenerativeClient>,
    candidates: Vec<String>,
    max_input_chars: usize,
}

impl ExtractionStage {
    pub fn new(
        genai: Arc<dyn GenerativeClient>,
        candidates: Vec<String>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            genai,
            candidates,
            max_input_chars,
        }
    }

    /// Run the extraction prompt against the candidate models in order.
    ///
    /// Returns the winning model's raw output text; parsing is the next
    /// stage's concern.
    pub async fn run(&self, markdown: &str, target: Option<&str>) -> Result<String, ExtractionError> {
        let target = target.unwrap_or(DEFAULT_TARGET);
        let prompt = build_prompt(target, char_prefix(markdown, self.max_input_chars));

        for model in &self.candidates {
            match self.genai.generate(model, &prompt, true).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("Extraction succeeded with model {}", model);
                    return Ok(text);
                }
                Ok(_) => {
                    debug!("Model {} returned empty output, trying next", model);
                }
                Err(e) => {
                    warn!("Model {} failed: {}, trying next", model, e);
                }
            }
        }

        Err(ExtractionError)
    }
}

/// The fixed extraction prompt.
///
/// Asks for at most one best image matching the business category's visual
/// convention, an explicit reason for the pick or rejection, a short
/// summary, and a coarse category, returned as a JSON array.
fn build_prompt(target: &str, content: &str) -> String {
    format!(
        r#"You are a local content analyst for small businesses.
Target: "{target}"

Mission: from the Markdown body below, pick the single best photo that fits
the business type, and summarize the content.

Selection criteria:
- restaurant: close-up of the main dish.
- cafe: drink, dessert, or interior shot.
- lodging: room or exterior view.

Exclude: maps, menu boards, blurry photos, and text-overlaid thumbnails.

Report (JSON):
- image_url: the chosen image URL (null if none qualified)
- reason: why that image was chosen, or the concrete reason the page had no
  qualifying image. Always fill this in.

Return format (JSON array):
[
  {{
    "title": "{target}",
    "content": "an appealing summary of the place, menu and atmosphere in at most 3 sentences",
    "category": "restaurant",
    "image_url": "https://...",
    "reason": "selection or rejection rationale"
  }}
]

Content: {content}"#
    )
}
