//! Free-text query parsing: one module token plus error-code fragments

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::kb::KnowledgeBase;

/// Separators users put between codes: whitespace or any run of `+ - . ,`.
static CODE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s+\-.,]+").expect("valid separator pattern"));

/// Result of parsing one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedQuery {
    /// Display-cased module name, if any token matched a module. When several
    /// tokens match, the last occurrence wins.
    pub module: Option<String>,
    /// Candidate error codes in input order, duplicates preserved.
    pub codes: Vec<String>,
}

/// Lowercase and whitespace-split an inbound message.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Split tokens into a module name and candidate error codes.
///
/// A token that matches a module name (case-insensitively) selects that
/// module; every other token is a code source. Code sources get their leading
/// zeros stripped, then are re-split on separator runs, dropping empty
/// pieces. `"007"` therefore queries as `"7"`, and a lone `"0"` vanishes.
pub fn parse(tokens: &[String], kb: &KnowledgeBase) -> ParsedQuery {
    let mut module = None;
    let mut fragments: Vec<String> = Vec::new();

    for token in tokens {
        if let Some(table) = kb.module(token) {
            module = Some(table.name.clone());
        } else {
            let stripped = token.trim_start_matches('0');
            // Tokens are already whitespace-free; the inner split keeps that
            // contract explicit for code sources arriving pre-joined.
            fragments.extend(stripped.split_whitespace().map(str::to_string));
        }
    }

    let codes = fragments
        .iter()
        .flat_map(|fragment| CODE_SEPARATORS.split(fragment))
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();

    ParsedQuery { module, codes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::test_fixtures::sample_kb;

    fn parse_text(text: &str) -> ParsedQuery {
        let kb = sample_kb();
        parse(&tokenize(text), &kb)
    }

    #[test]
    fn test_module_and_codes() {
        let parsed = parse_text("motorA 12 34");
        assert_eq!(parsed.module.as_deref(), Some("MotorA"));
        assert_eq!(parsed.codes, vec!["12", "34"]);
    }

    #[test]
    fn test_module_casing_does_not_matter() {
        let parsed = parse_text("MOTORA 12");
        assert_eq!(parsed.module.as_deref(), Some("MotorA"));
    }

    #[test]
    fn test_last_module_token_wins() {
        let parsed = parse_text("motora 12 display");
        assert_eq!(parsed.module.as_deref(), Some("Display"));
        assert_eq!(parsed.codes, vec!["12"]);
    }

    #[test]
    fn test_leading_zeros_stripped_from_codes() {
        let parsed = parse_text("motora 007 0");
        // "007" queries as "7"; a lone "0" strips to nothing and is dropped.
        assert_eq!(parsed.codes, vec!["7"]);
    }

    #[test]
    fn test_codes_split_on_separator_runs() {
        let parsed = parse_text("motora 12+34,56.78-90");
        assert_eq!(parsed.codes, vec!["12", "34", "56", "78", "90"]);
    }

    #[test]
    fn test_zero_stripping_applies_per_token_not_per_code() {
        // Zeros are stripped before the separator split, so only the first
        // code of a compound token loses its padding.
        let parsed = parse_text("motora 007+12 12+007");
        assert_eq!(parsed.codes, vec!["7", "12", "12", "007"]);
    }

    #[test]
    fn test_duplicate_codes_preserved() {
        let parsed = parse_text("motora 12 12");
        assert_eq!(parsed.codes, vec!["12", "12"]);
    }

    #[test]
    fn test_no_module_still_collects_codes() {
        let parsed = parse_text("hoe reset ik");
        assert_eq!(parsed.module, None);
        assert_eq!(parsed.codes, vec!["hoe", "reset", "ik"]);
    }

    #[test]
    fn test_single_module_with_codes_always_parses() {
        for text in ["motora 12", "12 motora", "display e5 12"] {
            let parsed = parse_text(text);
            assert!(parsed.module.is_some(), "no module for {:?}", text);
            assert!(!parsed.codes.is_empty(), "no codes for {:?}", text);
        }
    }
}
