//! Heuristic text engine.
//!
//! Sentence segmentation plus the two derived views used when no language
//! model backend is available: a lead-sentence summary and a three-band
//! structured decomposition (summary / claims / evidence).

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

/// Sentences kept by [`summarize`] when the caller has no preference.
pub const DEFAULT_SUMMARY_SENTENCES: usize = 3;

const SUMMARY_BAND: Range<usize> = 0..2;
const CLAIMS_BAND: Range<usize> = 2..5;
const EVIDENCE_BAND: Range<usize> = 5..8;

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern compiles"))
}

/// Lazy iterator over the trimmed, non-empty sentences of a text.
///
/// Cloning forks the iterator at its current position; call [`sentences`]
/// again to start over.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while !self.rest.is_empty() {
            let (segment, rest) = match sentence_boundary().find(self.rest) {
                // The terminal mark is ASCII; keep it with the sentence it ends.
                Some(m) => (&self.rest[..m.start() + 1], &self.rest[m.end()..]),
                None => (self.rest, ""),
            };
            self.rest = rest;
            let sentence = segment.trim();
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Sentences<'_> {}

/// Split `text` on `.`, `!` or `?` followed by whitespace.
///
/// Best effort only: abbreviations, decimals followed by a space and quoted
/// punctuation all end a sentence.
pub fn sentences(text: &str) -> Sentences<'_> {
    Sentences { rest: text }
}

/// Validate untyped upstream input as text.
pub fn decode_text(bytes: &[u8]) -> Result<&str, AppError> {
    std::str::from_utf8(bytes).map_err(|e| {
        AppError::new(codes::TEXT_INVALID_INPUT, "Input is not valid UTF-8 text")
            .with_details(format!("valid_up_to={}", e.valid_up_to()))
    })
}

/// Join the first `max_sentences` sentences with single spaces.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    sentences(text)
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Three-band decomposition of a text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuredResult {
    pub summary: String,
    pub claims: Vec<String>,
    pub evidence: Vec<String>,
}

impl StructuredResult {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.claims.is_empty() && self.evidence.is_empty()
    }
}

/// Positional heuristic: lead sentences summarize, the next three are claims,
/// the three after that are evidence. Anything past the eighth sentence is
/// ignored.
pub fn structured_reasoning(text: &str) -> StructuredResult {
    let all: Vec<&str> = sentences(text).take(EVIDENCE_BAND.end).collect();

    StructuredResult {
        summary: band(&all, SUMMARY_BAND).join(" "),
        claims: band(&all, CLAIMS_BAND),
        evidence: band(&all, EVIDENCE_BAND),
    }
}

fn band(all: &[&str], range: Range<usize>) -> Vec<String> {
    all.iter()
        .skip(range.start)
        .take(range.len())
        .map(|s| s.to_string())
        .collect()
}

/// First `n_lines` non-empty lines, each rendered as a `- ` bullet.
pub fn line_digest(text: &str, n_lines: usize) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(n_lines)
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
