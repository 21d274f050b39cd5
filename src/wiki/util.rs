//! Text helpers for fetched content.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::PAGE_URL;

static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("valid regex"));

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Turns free-form user input into a page title: ASCII punctuation removed,
/// whitespace collapsed, each word capitalized.
pub fn normalize_topic(topic: &str) -> String {
    let stripped: String = topic.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    stripped
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Browser URL of a page title.
pub fn page_url(title: &str) -> String {
    format!("{}{}", PAGE_URL, title.replace(' ', "_"))
}

/// Replaces every run of newlines with a single newline.
pub fn collapse_newlines(text: &str) -> String {
    NEWLINE_RUNS.replace_all(&text.replace("\r\n", "\n"), "\n").into_owned()
}

/// Cuts `text` at the last period before `limit` characters, keeping the
/// period. Falls back to a hard cut when there is no period in range.
pub fn truncate_at_nearest_period(text: &str, limit: usize) -> &str {
    let head = truncate_chars(text, limit);
    if head.len() == text.len() {
        return text;
    }
    match head.rfind('.') {
        Some(idx) => &text[..idx + 1],
        None => head,
    }
}

/// The first `limit` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Summary length used when the caller does not ask for one: longer inputs
/// get a longer summary.
pub fn default_target_words(text: &str) -> usize {
    if text.chars().count() > 1000 {
        300
    } else {
        150
    }
}

/// Caps `text` at `max_chars` and picks the summary length. Without an
/// explicit request the default is decided by the capped text, not the
/// whole article.
pub fn summarization_input(
    text: &str,
    max_chars: usize,
    requested_words: Option<usize>,
) -> (&str, usize) {
    let input = truncate_chars(text, max_chars);
    let target = requested_words.unwrap_or_else(|| default_target_words(input));
    (input, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_topic() {
        assert_eq!(normalize_topic("  the nile river!! "), "The Nile River");
        assert_eq!(normalize_topic("rock-and-roll"), "Rockandroll");
        assert_eq!(normalize_topic("MARIE curie?"), "Marie Curie");
        assert_eq!(normalize_topic("?!."), "");
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("a\n\n\nb\r\n\r\nc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_truncate_at_nearest_period() {
        let text = "First sentence. Second sentence. Third";
        assert_eq!(truncate_at_nearest_period(text, 100), text);
        assert_eq!(truncate_at_nearest_period(text, 35), "First sentence. Second sentence.");
        assert_eq!(truncate_at_nearest_period(text, 20), "First sentence.");
        assert_eq!(truncate_at_nearest_period("no periods here", 5), "no pe");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("Zürich", 2), "Zü");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_default_target_words() {
        assert_eq!(default_target_words(&"a".repeat(1001)), 300);
        assert_eq!(default_target_words(&"a".repeat(1000)), 150);
    }

    #[test]
    fn test_default_target_follows_capped_input() {
        let article = "Sentence text. ".repeat(2000);

        let (input, target) = summarization_input(&article, 800, None);
        assert_eq!(input.chars().count(), 800);
        assert_eq!(target, 150);

        let (_, target) = summarization_input(&article, 10_000, None);
        assert_eq!(target, 300);

        let (_, target) = summarization_input(&article, 800, Some(90));
        assert_eq!(target, 90);
    }

    #[test]
    fn test_url_detection_and_page_urls() {
        assert!(is_valid_url("https://example.org/article"));
        assert!(!is_valid_url("Alan Turing"));
        assert!(!is_valid_url("ftp://example.org/file"));
        assert_eq!(page_url("Alan Turing"), "https://en.wikipedia.org/wiki/Alan_Turing");
    }
}
