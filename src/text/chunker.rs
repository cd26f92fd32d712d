/*!
 * Paragraph-aligned chunk packing.
 */

/// Separator placed between paragraphs inside a chunk
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Length of [`PARAGRAPH_SEPARATOR`] in characters
const SEPARATOR_LEN: usize = 2;

/// Greedily pack paragraphs into chunks of at most `chunk_size` characters.
///
/// Paragraphs are never split: one that is longer than `chunk_size` on its own
/// becomes a single oversized chunk. Chunk order follows paragraph order.
pub fn merge_chunks<S: AsRef<str>>(paragraphs: &[S], chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0;

    for paragraph in paragraphs {
        let paragraph = paragraph.as_ref();
        let paragraph_size = paragraph.chars().count();

        if current_size + paragraph_size + SEPARATOR_LEN > chunk_size && !current.is_empty() {
            chunks.push(current.join(PARAGRAPH_SEPARATOR));
            current.clear();
            current_size = 0;
        }

        current.push(paragraph);
        current_size += paragraph_size + SEPARATOR_LEN;
    }

    if !current.is_empty() {
        chunks.push(current.join(PARAGRAPH_SEPARATOR));
    }

    chunks
}
