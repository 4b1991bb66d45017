use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::Tokenizer;
use crate::core::types::{FieldValue, LogLevel, ProcessedTerm};

pub type ExtractId<D, ID> = Arc<dyn Fn(&D) -> Option<ID> + Send + Sync>;
pub type ExtractField<D> = Arc<dyn Fn(&D, &str) -> Option<FieldValue> + Send + Sync>;
pub type TokenizeFn = Arc<dyn Fn(&str, Option<&str>) -> Vec<String> + Send + Sync>;
pub type ProcessTermFn = Arc<dyn Fn(&str, Option<&str>) -> ProcessedTerm + Send + Sync>;
pub type LoggerFn = Arc<dyn Fn(LogLevel, &str, Option<&str>) + Send + Sync>;

/// Host-provided collaborator closures the engine calls during indexing and
/// search; the only way the engine reaches into an arbitrary document type.
pub struct Hooks<D, ID> {
    pub extract_id: ExtractId<D, ID>,
    pub extract_field: ExtractField<D>,
    pub tokenize: TokenizeFn,
    pub process_term: ProcessTermFn,
    pub logger: LoggerFn,
}

impl<D, ID> Clone for Hooks<D, ID> {
    fn clone(&self) -> Self {
        Hooks {
            extract_id: self.extract_id.clone(),
            extract_field: self.extract_field.clone(),
            tokenize: self.tokenize.clone(),
            process_term: self.process_term.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<D, ID> Hooks<D, ID> {
    /// Builds a `Hooks` bundle around host-supplied `extract_id`/`extract_field`,
    /// defaulting `tokenize`/`process_term`/`logger` to `Analyzer::standard_english`'s
    /// pipeline (split across the two hooks: `tokenize` runs its tokenizer stage
    /// alone, so `fieldLength` still counts pre-filter tokens per §4.3, and
    /// `process_term` runs its lowercase/stopword/stemmer filter chain over one
    /// token at a time) and a no-op logger.
    pub fn standard_english(extract_id: ExtractId<D, ID>, extract_field: ExtractField<D>) -> Self {
        Hooks {
            extract_id,
            extract_field,
            tokenize: default_tokenize(),
            process_term: default_process_term(),
            logger: default_logger(),
        }
    }

    pub fn with_tokenize(mut self, tokenize: TokenizeFn) -> Self {
        self.tokenize = tokenize;
        self
    }

    pub fn with_process_term(mut self, process_term: ProcessTermFn) -> Self {
        self.process_term = process_term;
        self
    }

    pub fn with_logger(mut self, logger: LoggerFn) -> Self {
        self.logger = logger;
        self
    }
}

/// Runs only `Analyzer::standard_english`'s tokenizer stage: `process_term`
/// (not this hook) is where its filter chain runs, so that a token dropped
/// as a stopword is still counted toward `fieldLength` here, matching the
/// pre-filter token count §4.3 specifies.
fn default_tokenize() -> TokenizeFn {
    let analyzer = Analyzer::standard_english();
    Arc::new(move |text: &str, _field: Option<&str>| {
        analyzer.tokenizer.tokenize(text).into_iter().map(|t| t.text).collect()
    })
}

/// Runs `Analyzer::standard_english`'s filter chain (lowercase, English
/// stop words, Snowball stemming) over a single token, since `process_term`
/// is invoked per-token rather than over the whole text.
fn default_process_term() -> ProcessTermFn {
    let analyzer = Analyzer::standard_english();
    Arc::new(move |term: &str, _field: Option<&str>| {
        let mut tokens = vec![Token::new(term.to_string(), 0, 0)];
        for filter in &analyzer.filters {
            tokens = filter.filter(tokens);
        }
        match tokens.into_iter().next() {
            Some(token) => ProcessedTerm::One(token.text),
            None => ProcessedTerm::Drop,
        }
    })
}

fn default_logger() -> LoggerFn {
    Arc::new(|_level, _message, _code| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_english_drops_stopwords_and_stems() {
        let hooks: Hooks<(), u32> = Hooks::standard_english(
            Arc::new(|_: &()| None),
            Arc::new(|_: &(), _: &str| None),
        );
        let tokens = (hooks.tokenize)("The Runners are running", None);
        assert!(tokens.contains(&"runners".to_string()));

        let processed = (hooks.process_term)("the", None);
        assert!(matches!(processed, ProcessedTerm::Drop));

        let processed = (hooks.process_term)("running", None);
        assert!(matches!(processed, ProcessedTerm::One(_)));
    }
}
