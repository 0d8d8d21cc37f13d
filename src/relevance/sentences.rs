use once_cell::sync::Lazy;
use regex::Regex;

// `. ! ?` followed by whitespace or end of text. Abbreviations such as
// "Dr. Smith" over-split, which only makes filtering slightly finer.
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("valid sentence regex"));

/// Capability to split text into sentences
pub trait SentenceSplitter: Send + Sync {
    fn sentences(&self, text: &str) -> Vec<String>;
}

/// Punctuation-based splitter
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexSentenceSplitter;

impl SentenceSplitter for RegexSentenceSplitter {
    fn sentences(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in SENTENCE_END.find_iter(text) {
            push_trimmed(&mut sentences, &text[start..boundary.end()]);
            start = boundary.end();
        }
        // Trailing text without closing punctuation
        push_trimmed(&mut sentences, &text[start..]);

        sentences
    }
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() {
        sentences.push(candidate.to_string());
    }
}
