/// Split text into fixed-width chunks of at most `max_chars` characters.
///
/// The split is purely positional: no overlap, no separator or word-boundary
/// awareness, so a chunk can end mid-word. The cut counts characters rather
/// than bytes, which keeps multi-byte titles and synopses intact. The same
/// input always produces the same chunks.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
