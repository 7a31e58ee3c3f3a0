/// Splits `text` on whitespace and regroups the words into chunks of at most
/// `max_words` words joined by single spaces. The last chunk may be shorter.
///
/// Text without words produces no chunks. A `max_words` of zero is treated as one.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .map(|group| group.join(" "))
        .collect()
}
