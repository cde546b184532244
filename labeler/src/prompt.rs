/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a text classification assistant. Given a text, classify it into a concise category label.

Rules:
- Return ONLY the category label, nothing else
- Use lowercase with underscores (e.g., \"technical_question\", \"expressing_gratitude\")
- Keep labels short and descriptive (2-5 words max)
- Be consistent: similar texts should get the same label";

/// Builds the user turn for `text`.
pub fn user_prompt(text: &str) -> String {
    format!("Text to classify: \"{text}\"")
}
