/*!
 * Paragraph-break placeholder codec.
 *
 * Some backends collapse or rewrite blank lines. Before a call every `"\n\n"`
 * is replaced by an opaque marker and the marker is turned back afterwards,
 * so paragraph structure rides through the backend as ordinary text.
 */

/// Reserved token standing in for a paragraph break
pub const PARAGRAPH_BREAK_MARKER: &str = "<<PARAGRAPH_BREAK>>";

const PARAGRAPH_BREAK: &str = "\n\n";

/// Encoder/decoder for the paragraph-break marker
pub struct PlaceholderCodec;

impl PlaceholderCodec {
    /// Replace every paragraph break with the marker
    pub fn encode(text: &str) -> String {
        text.replace(PARAGRAPH_BREAK, PARAGRAPH_BREAK_MARKER)
    }

    /// Replace every marker with a paragraph break
    pub fn decode(text: &str) -> String {
        text.replace(PARAGRAPH_BREAK_MARKER, PARAGRAPH_BREAK)
    }

    /// Whether the text already contains the marker literally.
    ///
    /// Such input does not survive an encode/decode round trip unchanged.
    pub fn contains_marker(text: &str) -> bool {
        text.contains(PARAGRAPH_BREAK_MARKER)
    }
}
