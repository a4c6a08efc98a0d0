//! Whitespace-token chunker.
//!
//! Tokens are accumulated while the joined length (single spaces between
//! tokens) stays within the character budget. A token that is longer than
//! the budget on its own still gets a chunk of its own: tokens are never
//! split, so joining the chunks with spaces gives back the token sequence.

use super::ChunkerConfig;

/// Split `text` into passages of at most `config.size` characters.
pub fn chunk_words(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for token in text.split_whitespace() {
        let token_len = token.chars().count();
        let extended = joined_len(current_len, current.is_empty(), token_len);

        if extended > config.size && !current.is_empty() {
            chunks.push(current.join(" "));

            current = overlap_seed(&current, config, token_len);
            let seed_len = current.iter().map(|t| t.chars().count()).sum::<usize>()
                + current.len().saturating_sub(1);
            current_len = joined_len(seed_len, current.is_empty(), token_len);
        } else {
            current_len = extended;
        }
        current.push(token);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn joined_len(current_len: usize, empty: bool, token_len: usize) -> usize {
    if empty {
        token_len
    } else {
        current_len + 1 + token_len
    }
}

/// Trailing tokens of a closed chunk to repeat at the start of the next one.
///
/// The seed never covers the whole closed chunk and always leaves room for
/// the incoming token, so every new chunk makes progress.
fn overlap_seed<'a>(closed: &[&'a str], config: &ChunkerConfig, next_len: usize) -> Vec<&'a str> {
    if config.overlap == 0 {
        return Vec::new();
    }

    let mut seed_len = 0usize;
    let mut start = closed.len();

    for (i, token) in closed.iter().enumerate().skip(1).rev() {
        let candidate = joined_len(seed_len, seed_len == 0, token.chars().count());
        if candidate > config.overlap || candidate + 1 + next_len > config.size {
            break;
        }
        seed_len = candidate;
        start = i;
    }

    closed[start..].to_vec()
}
