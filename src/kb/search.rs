//! Keyword fallback over the general Q&A sheet
//! Bag-of-words overlap scoring; no term weighting, no length normalization

use std::collections::HashSet;

use super::QaRow;

/// Keyword fallback engine.
pub struct KeywordFallback;

impl KeywordFallback {
    /// Pick the best-matching answer for a free-text question.
    ///
    /// Every row's question is scored by the number of distinct lowercase
    /// words it shares with the input. The highest score wins; on a tie the
    /// earliest row in table order is kept. Zero overlap means no answer.
    pub fn answer<'a>(question: &str, qa: &'a [QaRow]) -> Option<&'a str> {
        let words = word_set(question);

        let mut best: Option<(usize, &QaRow)> = None;
        for row in qa {
            let overlap = overlap_count(&words, &row.question);
            // Strictly-greater keeps the first row among equal scores.
            if best.map_or(true, |(score, _)| overlap > score) {
                best = Some((overlap, row));
            }
        }

        match best {
            Some((score, row)) if score > 0 => Some(&row.answer),
            _ => None,
        }
    }

    /// Overlap score for a single row, exposed for the CLI's `ask` output.
    pub fn score(question: &str, candidate: &str) -> usize {
        overlap_count(&word_set(question), candidate)
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn overlap_count(words: &HashSet<String>, candidate: &str) -> usize {
    word_set(candidate)
        .iter()
        .filter(|word| words.contains(*word))
        .count()
}
