//! Resume classification: one JSON-mode model call over the extracted text.

use crate::error::ModelError;
use crate::pipeline::llm::ModelClient;
use crate::prompts::classification_prompt;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ask the classifier model to evaluate `resume_text`.
///
/// Returns the model's raw answer. It is meant to be a JSON object but nothing
/// here checks that; see [`crate::pipeline::normalize`].
pub async fn classify(model: &dyn ModelClient, resume_text: &str) -> Result<String, ModelError> {
    let prompt = classification_prompt(resume_text);
    debug!(
        "Classification prompt: {} bytes ({} bytes of resume text)",
        prompt.len(),
        resume_text.len()
    );

    let start = Instant::now();
    match model.complete_json(&prompt).await {
        Ok(answer) => {
            info!(
                "Classification answered in {:?} ({} bytes)",
                start.elapsed(),
                answer.len()
            );
            Ok(answer)
        }
        Err(e) => {
            error!("Classification call failed: {}", e);
            Err(e)
        }
    }
}
