//! Token counting
//!
//! Counting is a capability chosen once at startup: an exact HuggingFace
//! tokenizer when a `tokenizer.json` is configured, a word-count estimate
//! otherwise.

use crate::config::TokenizerConfig;
use crate::document::DocumentSource;
use crate::error::{ChunkerError, Result};
use tokenizers::Tokenizer;

/// Counts tokens in chunk text
pub enum TokenCounter {
    /// Exact counts from a loaded tokenizer
    Exact(Box<Tokenizer>),
    /// `round(words × tokens_per_word)`
    Approximate { tokens_per_word: f64 },
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenCounter::Exact(_) => f.write_str("TokenCounter::Exact"),
            TokenCounter::Approximate { tokens_per_word } => f
                .debug_struct("TokenCounter::Approximate")
                .field("tokens_per_word", tokens_per_word)
                .finish(),
        }
    }
}

impl TokenCounter {
    /// Select the counter described by the configuration
    ///
    /// A configured tokenizer that cannot be loaded is a configuration error,
    /// never a silent switch to the estimate.
    pub fn from_config(config: &TokenizerConfig) -> Result<Self> {
        match &config.tokenizer_path {
            Some(path) => {
                let tokenizer = Tokenizer::from_file(path).map_err(|e| {
                    ChunkerError::Config(format!(
                        "Failed to load tokenizer from {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                log::info!("Loaded tokenizer from {:?}", path);
                Ok(TokenCounter::Exact(Box::new(tokenizer)))
            }
            None => Ok(TokenCounter::Approximate {
                tokens_per_word: config.tokens_per_word,
            }),
        }
    }

    /// Word-count estimate with the default ratio
    pub fn approximate() -> Self {
        TokenCounter::Approximate {
            tokens_per_word: TokenizerConfig::default().tokens_per_word,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenCounter::Exact(_) => "exact",
            TokenCounter::Approximate { .. } => "approximate",
        }
    }

    pub fn count(&self, text: &str) -> Result<usize> {
        match self {
            TokenCounter::Exact(tokenizer) => tokenizer
                .encode(text, false)
                .map(|encoding| encoding.len())
                .map_err(|e| ChunkerError::Tokenizer(e.to_string())),
            TokenCounter::Approximate { tokens_per_word } => {
                let words = text.split_whitespace().count();
                Ok((words as f64 * tokens_per_word).round() as usize)
            }
        }
    }
}

/// Per-page token counts with prefix sums for O(1) range estimates
///
/// Used while planning chunk sizes; the final count of a materialized chunk
/// is taken on its actual text.
#[derive(Debug, Clone, Default)]
pub struct PageTokenMeter {
    prefix: Vec<usize>,
}

impl PageTokenMeter {
    /// Count every page of a document once
    pub fn measure<D: DocumentSource + ?Sized>(source: &D, counter: &TokenCounter) -> Result<Self> {
        let mut counts = Vec::with_capacity(source.total_pages() as usize);
        for page in 1..=source.total_pages() {
            counts.push(counter.count(&source.page_text(page)?)?);
        }
        Ok(Self::from_page_counts(counts))
    }

    /// Build from known per-page counts, page 1 first
    pub fn from_page_counts(counts: Vec<usize>) -> Self {
        let mut prefix = Vec::with_capacity(counts.len() + 1);
        prefix.push(0);
        let mut total = 0;
        for count in counts {
            total += count;
            prefix.push(total);
        }
        Self { prefix }
    }

    /// Estimated tokens in `[start_page, end_page_exclusive)`
    pub fn tokens(&self, start_page: u32, end_page_exclusive: u32) -> usize {
        let last = self.prefix.len() - 1;
        let start = (start_page.max(1) as usize - 1).min(last);
        let end = (end_page_exclusive.max(1) as usize - 1).min(last);
        self.prefix[end].saturating_sub(self.prefix[start])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    #[test]
    fn test_approximate_rounds() {
        let counter = TokenCounter::approximate();
        assert_eq!(counter.count("").unwrap(), 0);
        // 3 words * 1.3 = 3.9
        assert_eq!(counter.count("one two three").unwrap(), 4);
        // 10 words * 1.3 = 13
        assert_eq!(counter.count(&"w ".repeat(10)).unwrap(), 13);
    }

    #[test]
    fn test_missing_tokenizer_is_configuration_error() {
        let config = TokenizerConfig {
            tokenizer_path: Some("/no/such/tokenizer.json".into()),
            ..TokenizerConfig::default()
        };
        assert!(matches!(
            TokenCounter::from_config(&config),
            Err(ChunkerError::Config(_))
        ));
    }

    #[test]
    fn test_meter_ranges() {
        let meter = PageTokenMeter::from_page_counts(vec![10, 20, 30]);
        assert_eq!(meter.tokens(1, 4), 60);
        assert_eq!(meter.tokens(2, 3), 20);
        assert_eq!(meter.tokens(3, 3), 0);
        assert_eq!(meter.tokens(2, 99), 50);
    }

    #[test]
    fn test_meter_measures_document() {
        let doc = MemoryDocument::from_text("a b c d e f g h i j\x0Ck l");
        let meter = PageTokenMeter::measure(&doc, &TokenCounter::approximate()).unwrap();
        assert_eq!(meter.tokens(1, 2), 13);
        assert_eq!(meter.tokens(2, 3), 3);
    }
}
