//! Prompt text for the generative-model translation backend.
//!
//! Kept in one place so prompt changes never touch the backend's error
//! handling, and so tests can inspect the exact text sent to the model.

/// Instruction sent as the system message. `{source}` and `{target}` are
/// replaced with the configured language names.
pub const TRANSLATION_SYSTEM_PROMPT: &str = "You are a translator. Your job is to translate the following text from {source} to {target}. \
Be as literal as possible with the words, because your output will be used to learn vocabulary.\n\
Output ONLY the translation. Do NOT add quotes, notes or explanations.";

/// Build the system message for a language pair.
pub fn system_prompt(source_lang: &str, target_lang: &str) -> String {
    TRANSLATION_SYSTEM_PROMPT
        .replace("{source}", source_lang)
        .replace("{target}", target_lang)
}

/// Build the user message carrying the unit text.
pub fn user_prompt(text: &str) -> String {
    format!("Text: {}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_names_both_languages() {
        let p = system_prompt("English", "Danish");
        assert!(p.contains("from English to Danish"), "got: {p}");
        assert!(!p.contains("{source}"));
        assert!(!p.contains("{target}"));
    }

    #[test]
    fn user_prompt_carries_text_verbatim() {
        assert_eq!(user_prompt("Hello there."), "Text: Hello there.");
    }
}
