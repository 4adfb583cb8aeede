//! Rejects listings whose title does not plausibly match the query.
//!
//! Model codes (tokens mixing letters and digits) dominate: when the query
//! has any, each must match the title, with long codes matched by prefix so
//! that `UE55AU7100UXXH` still matches a title saying `UE55AU7100`. Queries
//! without codes fall back to full-word matching of the remaining words.

/// Codes at least this long are matched by prefix.
const LONG_CODE_LEN: usize = 6;

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_model_code(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit()) && token.chars().any(char::is_alphabetic)
}

/// Minimum shared prefix for a long code: two thirds of its length.
fn required_prefix(code_len: usize) -> usize {
    (code_len * 2).div_ceil(3).max(LONG_CODE_LEN)
}

fn code_matches(code: &str, title_compact: &str, title_words: &[String]) -> bool {
    let len = code.chars().count();
    if len < LONG_CODE_LEN {
        return title_words.iter().any(|w| w == code) || title_compact.contains(code);
    }
    let prefix: String = code.chars().take(required_prefix(len)).collect();
    title_compact.contains(&prefix)
}

/// Whether `title` plausibly describes the product `query` asks for.
#[must_use]
pub fn is_relevant(query: &str, title: &str) -> bool {
    let title_words = words(title);
    let title_compact = compact(title);

    let mut codes = Vec::new();
    let mut plain = Vec::new();
    for token in query.split_whitespace() {
        let token_compact = compact(token);
        if token_compact.is_empty() {
            continue;
        }
        if is_model_code(&token_compact) {
            codes.push(token_compact);
        } else {
            plain.extend(words(token).into_iter().filter(|w| w.chars().count() >= 2));
        }
    }

    if !codes.is_empty() {
        return codes
            .iter()
            .all(|code| code_matches(code, &title_compact, &title_words));
    }
    if plain.is_empty() {
        return true;
    }
    let hits = plain.iter().filter(|w| title_words.contains(w)).count();
    hits * 2 >= plain.len()
}
