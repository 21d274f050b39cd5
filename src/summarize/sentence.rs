//! Sentence segmentation.
//!
//! Boundaries come from Unicode UAX #29, which already keeps decimal numbers
//! and most URLs intact. UAX #29 still breaks after abbreviations followed
//! by a capitalized word ("Dr. Smith"), so segments ending in a known
//! abbreviation or inside a run of single-letter initials are joined with
//! the next one.

use unicode_segmentation::UnicodeSegmentation;

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "vs", "e.g", "i.e", "inc",
    "ltd", "corp", "co", "fig", "approx", "gen", "col", "lt", "sgt", "gov", "sen", "rep", "rev",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s",
    "u.k", "c", "ca",
];

/// Splits `text` into trimmed sentences, in order. Whitespace-only segments
/// are dropped; nothing else is lost.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut pending = String::new();

    let segments: Vec<&str> = text.split_sentence_bounds().collect();
    for (index, segment) in segments.iter().enumerate() {
        pending.push_str(segment);

        let paragraph_break = segment
            .trim_end_matches(|c: char| c == ' ' || c == '\t')
            .ends_with(|c: char| c == '\n' || c == '\r');
        let next = segments.get(index + 1).copied().unwrap_or("");
        if !paragraph_break && continues_after_period(pending.trim_end(), next) {
            continue;
        }

        push_trimmed(&mut sentences, &pending);
        pending.clear();
    }
    push_trimmed(&mut sentences, &pending);

    if sentences.is_empty() && !text.trim().is_empty() {
        sentences.push(text.trim().to_string());
    }
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn continues_after_period(text: &str, next: &str) -> bool {
    let Some(stem) = text.strip_suffix('.') else {
        return false;
    };
    let mut words = stem.split_whitespace().rev().map(strip_leading_punctuation);
    let word = words.next().unwrap_or("");

    if word.is_empty() {
        return false;
    }

    // A lone capital ends a sentence ("World War I.") unless it sits in a
    // run of initials ("J. R. R. Tolkien").
    if is_single_capital(word) {
        let previous_is_initial = words
            .next()
            .and_then(|w| w.strip_suffix('.'))
            .is_some_and(is_single_capital);
        let next_is_initial = next
            .split_whitespace()
            .next()
            .and_then(|w| w.strip_suffix('.'))
            .is_some_and(is_single_capital);
        return previous_is_initial || next_is_initial;
    }

    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

fn strip_leading_punctuation(word: &str) -> &str {
    word.trim_start_matches(|c: char| !c.is_alphanumeric())
}

fn is_single_capital(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(first), None) if first.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sentences() {
        let sentences = split_sentences("Hello world. How are you? I am fine!");
        assert_eq!(sentences, vec!["Hello world.", "How are you?", "I am fine!"]);
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let sentences =
            split_sentences("Dr. Smith moved to St. Louis in 1901. He practiced there for decades.");
        assert_eq!(sentences.len(), 2, "{:?}", sentences);
        assert!(sentences[0].starts_with("Dr. Smith"));
    }

    #[test]
    fn test_initials_do_not_split() {
        let sentences = split_sentences("The author J. R. R. Tolkien wrote it. It sold well.");
        assert_eq!(sentences.len(), 2, "{:?}", sentences);
    }

    #[test]
    fn test_single_letter_sentence_end_splits() {
        let sentences = split_sentences("It began after World War I. The treaty followed.");
        assert_eq!(sentences, vec!["It began after World War I.", "The treaty followed."]);

        let sentences = split_sentences("Citrus is rich in vitamin C. Sailors knew it.");
        assert_eq!(sentences.len(), 2, "{:?}", sentences);
    }

    #[test]
    fn test_decimal_numbers_stay_whole() {
        let sentences = split_sentences("Pi is roughly 3.14159 in value. It is irrational.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("3.14159"));
    }

    #[test]
    fn test_text_without_terminator_is_one_sentence() {
        assert_eq!(split_sentences("  no ending here  "), vec!["no ending here"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences(" \n\t ").is_empty());
    }

    #[test]
    fn test_no_characters_lost() {
        let text = "Geography\nThe river is 6,650 km long. Its basin covers 11 countries! \
                    Is it the longest? Most sources say so, e.g. the U.S. survey.";
        let sentences = split_sentences(text);
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&sentences.concat()), strip(text));
    }

    #[test]
    fn test_headings_end_at_line_breaks() {
        let sentences = split_sentences("History\nThe city was founded in 1200.");
        assert_eq!(sentences, vec!["History", "The city was founded in 1200."]);
    }
}
