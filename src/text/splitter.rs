/*!
 * Paragraph and sentence splitting.
 *
 * Paragraphs are the unit the chunker packs; sentences are only used for
 * auxiliary checks and are never on the translation path.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// A blank line: newline, any whitespace, newline
static PARAGRAPH_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Terminal punctuation followed by the whitespace that ends a sentence
static SENTENCE_END_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?。！？]\s+").unwrap());

/// Characters that end a sentence
pub const SENTENCE_END_MARKS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Split text into trimmed, non-empty paragraphs on blank-line boundaries
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK_REGEX
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split text into sentences after terminal punctuation followed by whitespace.
///
/// The punctuation stays with the sentence it ends; the whitespace run is dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_END_REGEX.find_iter(text) {
        // The match begins with exactly one punctuation character
        let punct_len = text[boundary.start()..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0);

        sentences.push(&text[start..boundary.start() + punct_len]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check that a sentence ends with terminal punctuation and has balanced
/// brackets and quotes
pub fn is_sentence_complete(text: &str) -> bool {
    let Some(last) = text.chars().last() else {
        return false;
    };

    let mut stack: Vec<char> = Vec::new();
    for c in text.chars() {
        match c {
            '"' | '\'' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                } else {
                    stack.push(c);
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let opener = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(opener) {
                    return false;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && SENTENCE_END_MARKS.contains(&last)
}
