//! Prompt templates for claim extraction.

/// System prompt instructing the model to extract verifiable claims as a
/// JSON object, one array entry per claim.
pub fn extraction_system_prompt() -> String {
    "You audit machine learning model cards. Given a section of a model \
     card, extract every checkable factual claim: performance numbers, \
     architecture details, dataset composition, or training procedure. \
     Ignore marketing language and claims with no way to check them \
     against source code. Respond with a JSON object: \
     {\"claims\": [{\"text\": string, \"category\": \
     \"performance\"|\"architecture\"|\"dataset\"|\"training\"|\"other\"}]}. \
     If there are no checkable claims, respond with {\"claims\": []}."
        .to_string()
}

/// User prompt carrying the chunk text to extract claims from.
pub fn extraction_user_prompt(heading_path: &[String], chunk_text: &str) -> String {
    if heading_path.is_empty() {
        format!("Model card section:\n\n{chunk_text}")
    } else {
        format!(
            "Model card section (under {}):\n\n{chunk_text}",
            heading_path.join(" > ")
        )
    }
}
