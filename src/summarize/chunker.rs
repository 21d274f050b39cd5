use tracing::debug;

use super::sentence::split_sentences;
use crate::model::TokenCounter;
use crate::TARGET_PIPELINE;

/// Consecutive sentences fed to one model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub sentences: Vec<String>,
    /// Sum of the per-sentence model-token counts.
    pub token_count: usize,
}

impl Chunk {
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }

    /// A single sentence longer than the ceiling is kept whole rather than
    /// truncated.
    pub fn is_oversized(&self, max_tokens: usize) -> bool {
        self.token_count > max_tokens
    }
}

/// Groups the sentences of `text` into chunks of at most `max_tokens` model
/// tokens without splitting a sentence.
pub fn chunk_text<C>(text: &str, max_tokens: usize, counter: &C) -> Vec<Chunk>
where
    C: TokenCounter + ?Sized,
{
    let mut chunks = Vec::new();
    let mut current = Chunk {
        sentences: Vec::new(),
        token_count: 0,
    };

    for sentence in split_sentences(text) {
        let tokens = counter.count_tokens(&sentence);

        if !current.sentences.is_empty() && current.token_count + tokens > max_tokens {
            chunks.push(std::mem::replace(
                &mut current,
                Chunk {
                    sentences: Vec::new(),
                    token_count: 0,
                },
            ));
        }

        current.sentences.push(sentence);
        current.token_count += tokens;
    }

    if !current.sentences.is_empty() {
        chunks.push(current);
    }

    debug!(target: TARGET_PIPELINE,
        "Split {} characters into {} chunks (ceiling {} tokens, {} oversized)",
        text.len(),
        chunks.len(),
        max_tokens,
        chunks.iter().filter(|c| c.is_oversized(max_tokens)).count()
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WordTokens;

    impl TokenCounter for WordTokens {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    // Sentences start with a capital so UAX #29 breaks between them.
    fn sentence(words: usize, tag: usize) -> String {
        let mut parts = vec![format!("Item{}", tag)];
        parts.extend((2..words).map(|i| format!("w{}x{}", tag, i)));
        parts.push(format!("end{}.", tag));
        parts.join(" ")
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_text("", 50, &WordTokens).is_empty());
        assert!(chunk_text("   ", 50, &WordTokens).is_empty());
    }

    #[test]
    fn test_non_blank_input_always_yields_a_chunk() {
        for text in ["...", "!!!", "no terminator", "\u{200B}", "\"quoted\""] {
            let chunks = chunk_text(text, 50, &WordTokens);
            assert_eq!(chunks.len(), 1, "{:?}", text);
            let joined: String = chunks[0].sentences.concat();
            assert_eq!(joined.replace(' ', ""), text.replace(' ', ""));
        }
    }

    #[test]
    fn test_chunks_preserve_sentence_sequence() {
        let originals: Vec<String> = (0..40).map(|i| sentence(3 + i % 7, i)).collect();
        let text = originals.join(" ");

        let chunks = chunk_text(&text, 25, &WordTokens);
        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.sentences.iter().cloned())
            .collect();

        assert_eq!(rejoined, split_sentences(&text));
        assert_eq!(rejoined, originals);
    }

    #[test]
    fn test_chunks_respect_ceiling() {
        let text: String = (0..30)
            .map(|i| sentence(4 + i % 5, i))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = chunk_text(&text, 20, &WordTokens);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 20, "{:?}", chunk);
            assert_eq!(chunk.token_count, WordTokens.count_tokens(&chunk.text()));
        }
    }

    #[test]
    fn test_oversized_sentence_becomes_own_chunk() {
        let text = format!("{} {} {}", sentence(5, 1), sentence(40, 2), sentence(5, 3));

        let chunks = chunk_text(&text, 20, &WordTokens);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].sentences.len(), 1);
        assert!(chunks[1].is_oversized(20));
        assert!(!chunks[0].is_oversized(20));
        assert!(!chunks[2].is_oversized(20));
    }

    #[test]
    fn test_sentences_fill_chunk_up_to_ceiling() {
        let text: String = (0..4).map(|i| sentence(10, i)).collect::<Vec<_>>().join(" ");

        let chunks = chunk_text(&text, 20, &WordTokens);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].token_count, 20);
        assert_eq!(chunks[1].token_count, 20);
    }
}
