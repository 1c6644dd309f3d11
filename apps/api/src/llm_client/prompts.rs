// Shared prompt constants and prompt-building utilities.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

use crate::models::Language;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction pinning the reply language.
pub fn language_instruction(language: Language) -> String {
    format!(
        "You MUST write your entire reply in {} (language code `{}`), \
        regardless of the language the candidate uses.",
        language.display_name(),
        language.as_str()
    )
}
