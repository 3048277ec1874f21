//! Text preparation: normalization, sentence segmentation and structure.
//!
//! # Algorithm
//!
//! 1. **Normalization**: curly quotes become ASCII so `I’m` matches `i'm`
//! 2. **Line splitting**: every line break ends a sentence; list items count
//!    as their own sentence with the enumeration prefix stripped
//! 3. **Sentence splitting**: within a line, split after `.` `!` `?` followed
//!    by whitespace (fancy-regex lookbehind)
//! 4. **Filtering**: segments without a letter or digit are dropped
//!
//! Word, paragraph and list counts are taken from the same normalized text.

use std::collections::HashSet;

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n").expect("Invalid line split regex"));

// Use fancy-regex for lookbehind support
static SENTENCE_SPLIT: Lazy<FancyRegex> = Lazy::new(|| {
    // Split after . ! ? followed by whitespace
    FancyRegex::new(r"(?<=[.!?])\s+").expect("Invalid sentence split regex")
});

// Numbered (`1.` / `2)`), lettered (`a.` / `b)`) and bulleted (`-` `*` `•`) items.
static ENUMERATED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)(?:(\d+[.)]|[a-z][.)])|[-*•])\s+\S").expect("Invalid enumeration regex")
});

static PARAGRAPH_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").expect("Invalid paragraph split regex"));

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Alphabetic}+(?:'\p{Alphabetic}+)*").expect("Invalid word regex")
});

static ENUMERATION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[a-z][.)]|[-*•])\s+").expect("Invalid enumeration prefix regex")
});

/// Enumerated list items found in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// All enumerated lines.
    pub items: usize,
    /// Enumerated lines with leading indentation.
    pub nested: usize,
    /// Numbered or lettered lines.
    pub ordered: usize,
    /// Bulleted lines.
    pub bulleted: usize,
}

/// Word statistics over alphabetic tokens, case-folded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordStats {
    pub words: usize,
    pub distinct: usize,
}

/// A response prepared once and shared by every detector.
#[derive(Debug, Clone)]
pub struct PreparedText {
    normalized: String,
    sentence_count: usize,
    enumeration: Enumeration,
    words: WordStats,
    paragraphs: usize,
}

impl PreparedText {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let sentence_count = split_into_sentences(&normalized).len();
        let enumeration = count_enumeration(&normalized);
        let words = count_words(&normalized);
        let paragraphs = count_paragraphs(&normalized);
        Self {
            normalized,
            sentence_count,
            enumeration,
            words,
            paragraphs,
        }
    }

    pub fn text(&self) -> &str {
        &self.normalized
    }

    pub fn sentence_count(&self) -> usize {
        self.sentence_count
    }

    pub fn enumeration(&self) -> Enumeration {
        self.enumeration
    }

    pub fn words(&self) -> WordStats {
        self.words
    }

    /// Blocks separated by blank lines that contain a letter or digit.
    pub fn paragraphs(&self) -> usize {
        self.paragraphs
    }

    pub fn is_blank(&self) -> bool {
        self.sentence_count == 0
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect()
}

/// Split text into sentences: line breaks first, then terminal punctuation.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    for line in LINE_SPLIT.split(text) {
        // `1. Do x` is one sentence, not `1.` and `Do x`
        let start = ENUMERATION_PREFIX.find(line).map_or(0, |m| m.end());
        let line = &line[start..];
        // no split() on fancy-regex; walk the matches
        let mut last_end = 0;
        let mut finder = SENTENCE_SPLIT.find_iter(line);
        while let Some(Ok(m)) = finder.next() {
            push_sentence(&mut result, &line[last_end..m.start()]);
            last_end = m.end();
        }
        push_sentence(&mut result, &line[last_end..]);
    }
    result
}

fn push_sentence<'a>(out: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        out.push(trimmed);
    }
}

fn count_enumeration(text: &str) -> Enumeration {
    let mut enumeration = Enumeration::default();
    for line in LINE_SPLIT.split(text) {
        if let Some(caps) = ENUMERATED_LINE.captures(line) {
            enumeration.items += 1;
            if caps.get(2).is_some() {
                enumeration.ordered += 1;
            } else {
                enumeration.bulleted += 1;
            }
            if caps.get(1).is_some_and(|indent| !indent.as_str().is_empty()) {
                enumeration.nested += 1;
            }
        }
    }
    enumeration
}

fn count_words(text: &str) -> WordStats {
    let mut seen = HashSet::new();
    let mut words = 0;
    for m in WORD.find_iter(text) {
        words += 1;
        seen.insert(m.as_str().to_lowercase());
    }
    WordStats {
        words,
        distinct: seen.len(),
    }
}

fn count_paragraphs(text: &str) -> usize {
    PARAGRAPH_SPLIT
        .split(text)
        .filter(|block| block.chars().any(char::is_alphanumeric))
        .count()
}
