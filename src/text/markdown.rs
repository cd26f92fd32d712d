/*!
 * Markdown helpers: fenced code block protection and bilingual output.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Fenced code block with an optional language tag
static CODE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```\w*\n(.*?)```").unwrap());

/// Lift fenced code blocks out of the text, leaving `[CODE_BLOCK_i]` tokens.
///
/// Returns the rewritten text and the block bodies in order of appearance.
pub fn extract_code_blocks(markdown: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();

    let processed = CODE_BLOCK_REGEX.replace_all(markdown, |caps: &regex::Captures| {
        blocks.push(caps[1].to_string());
        format!("[CODE_BLOCK_{}]", blocks.len() - 1)
    });

    (processed.into_owned(), blocks)
}

/// Put code blocks back in place of their tokens
pub fn restore_code_blocks(text: &str, blocks: &[String]) -> String {
    let mut restored = text.to_string();
    for (i, code) in blocks.iter().enumerate() {
        restored = restored.replace(&format!("[CODE_BLOCK_{}]", i), &format!("```\n{}```", code));
    }
    restored
}

/// Translation followed by the original text
pub fn merge_translations(original: &str, translated: &str) -> String {
    format!("{}\n\n原文：\n{}", translated, original)
}
