const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Normalizes generated text and cuts it back to its last complete sentence.
///
/// Control characters, zero-width characters and replacement characters are
/// removed and whitespace runs collapse to a single space. If the text has
/// no sentence terminator at all it is returned trimmed rather than emptied.
/// Applying it twice gives the same result as applying it once.
pub fn clean_summary(text: &str) -> String {
    let normalized = normalize(text);
    match normalized.rfind(&TERMINATORS[..]) {
        // Terminators are ASCII, so `idx + 1` is a char boundary.
        Some(idx) => normalized[..idx + 1].to_string(),
        None => normalized,
    }
}

fn normalize(text: &str) -> String {
    let visible: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| !is_noise(c))
        .collect();
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_noise(c: char) -> bool {
    c.is_control() || matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_trailing_fragment() {
        assert_eq!(
            clean_summary("The river floods yearly. Farmers depend on it. The delta is"),
            "The river floods yearly. Farmers depend on it."
        );
    }

    #[test]
    fn test_keeps_all_terminator_kinds() {
        assert_eq!(clean_summary("Really? Yes! It works. and"), "Really? Yes! It works.");
    }

    #[test]
    fn test_without_terminator_returns_trimmed_input() {
        assert_eq!(clean_summary("  a heading without end  "), "a heading without end");
        assert_eq!(clean_summary(""), "");
    }

    #[test]
    fn test_strips_control_and_noise_characters() {
        let cleaned = clean_summary("Line one.\u{0007}\n\n Line\u{200B} two\t\tends here.\u{FFFD} tail");
        assert_eq!(cleaned, "Line one. Line two ends here.");
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let samples = [
            "",
            "   ",
            "no terminator at all",
            "One. Two! Three? four",
            "Ends cleanly.",
            "  \u{0000}Mixed \n\r\n whitespace. and junk\u{FEFF}",
            "Ellipsis... then more",
            "Trailing space after end.   ",
        ];
        for sample in samples {
            let once = clean_summary(sample);
            assert_eq!(clean_summary(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_result_ends_with_terminator_when_one_exists() {
        for sample in ["A b c. d e", "Is it? maybe", "Stop! go on and on"] {
            let cleaned = clean_summary(sample);
            assert!(cleaned.ends_with(&TERMINATORS[..]), "{:?}", cleaned);
        }
    }
}
