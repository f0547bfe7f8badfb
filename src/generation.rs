use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::models::{GenerationRequest, GenerationResult};
use crate::prompts::format_prompt;
use crate::score_helper::extract_score;
use tracing::{debug, info};

/// Formatter, then the active provider, then score extraction for evaluations.
pub async fn run_generation(
    manager: &ConnectionManager,
    request: &GenerationRequest,
) -> Result<GenerationResult> {
    let prompt = format_prompt(request);
    debug!("Generated {} prompt:\n{}", request.label(), prompt);

    let text = manager.generate(&prompt).await?;
    debug!("Raw LLM response: '{}'", text);

    let score = match request {
        GenerationRequest::Eval(_) => Some(extract_score(&text)),
        _ => None,
    };

    info!("{} generation completed", request.label());
    Ok(GenerationResult { text, score })
}
