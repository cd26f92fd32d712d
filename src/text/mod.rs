/*!
 * Text processing for the translation pipeline.
 *
 * - `splitter`: paragraph and sentence splitting
 * - `chunker`: packing paragraphs into size-bounded chunks
 * - `placeholder`: protecting paragraph breaks across a backend call
 * - `markdown`: fenced code block protection and bilingual output
 */

pub mod chunker;
pub mod markdown;
pub mod placeholder;
pub mod splitter;

pub use self::chunker::{merge_chunks, PARAGRAPH_SEPARATOR};
pub use self::markdown::{extract_code_blocks, merge_translations, restore_code_blocks};
pub use self::placeholder::{PlaceholderCodec, PARAGRAPH_BREAK_MARKER};
pub use self::splitter::{is_sentence_complete, split_paragraphs, split_sentences};

/// Length of a text in characters, the unit all chunk sizes are measured in
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
