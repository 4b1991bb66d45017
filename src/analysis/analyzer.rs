use rust_stemmers::Algorithm;

use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Text analysis pipeline: a tokenizer followed by a chain of filters.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        tokens
    }

    /// The default pipeline backing `Hooks::standard_english()`: Unicode
    /// word tokenization, lowercasing, English stop-word removal, Snowball
    /// stemming.
    pub fn standard_english() -> Self {
        Analyzer::new(
            "standard_english".to_string(),
            Box::new(StandardTokenizer::default()),
        )
        .add_filter(Box::new(LowercaseFilter))
        .add_filter(Box::new(StopWordFilter::english()))
        .add_filter(Box::new(StemmerFilter::new(Algorithm::English)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_english_strips_stopwords_and_stems() {
        let analyzer = Analyzer::standard_english();
        let tokens: Vec<String> = analyzer
            .analyze("The Runners are running quickly")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"are".to_string()));
        assert!(tokens.contains(&"run".to_string()) || tokens.contains(&"runner".to_string()));
    }
}
