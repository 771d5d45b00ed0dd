//! Detection of explicit "remember this" requests in user text.

use regex::Regex;
use relay_common::{RelayError, Result};

/// Trigger phrases in priority order. The capture is the fact to keep.
const TRIGGER_PATTERNS: &[&str] = &[
    r"(?i)remember that (.+)",
    r"(?i)remember (.+)",
    r"(?i)don['’]t forget (.+)",
    r"(?i)keep in mind (.+)",
    r"(?i)note that (.+)",
    r"(?i)save this: (.+)",
];

/// Outcome of scanning one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub should_remember: bool,
    /// Input with the matched trigger span removed and trimmed
    pub cleaned_text: String,
    /// Trimmed capture of the winning trigger; empty when nothing matched
    pub fact_text: String,
}

impl Extraction {
    fn unmatched(text: &str) -> Self {
        Self {
            should_remember: false,
            cleaned_text: text.to_string(),
            fact_text: String::new(),
        }
    }
}

/// Ordered rule table of trigger phrases, compiled once.
#[derive(Debug, Clone)]
pub struct MemoryExtractor {
    rules: Vec<Regex>,
}

impl MemoryExtractor {
    pub fn new() -> Result<Self> {
        let rules = TRIGGER_PATTERNS
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    RelayError::Config(format!("invalid trigger pattern {p:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Extract at most one fact from `text`. The first matching rule wins.
    pub fn extract(&self, text: &str) -> Extraction {
        for rule in &self.rules {
            let Some(caps) = rule.captures(text) else {
                continue;
            };
            let (Some(span), Some(fact)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let mut cleaned = String::with_capacity(text.len());
            cleaned.push_str(&text[..span.start()]);
            cleaned.push_str(&text[span.end()..]);

            return Extraction {
                should_remember: true,
                cleaned_text: cleaned.trim().to_string(),
                fact_text: fact.as_str().trim().to_string(),
            };
        }

        Extraction::unmatched(text)
    }
}
