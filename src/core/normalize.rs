//! Cell text normalization and content-kind classification
//!
//! Every cell is normalized once, when its table is built:
//!
//! ```text
//! raw text -> whitespace collapse -> case fold -> kind + numeric tokens + skeleton
//! ```
//!
//! Tokens are unsigned decimal literals (`\d+(\.\d+)?`). A leading `+` or `-`
//! belongs to a token only at the start of the text or after whitespace or
//! one of `( [ / = , ;`, so `10-20` reads as two positive tokens while
//! `(-1.5)` reads as one negative token. The percent sign stays in the
//! skeleton. `1,234` is two tokens.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// A whole cell holding one signed decimal literal
    static ref NUMERIC_LITERAL: Regex =
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();

    /// Numeric substrings inside composite text
    static ref NUMBER_TOKEN: Regex = Regex::new(r"[+-]?\d+(?:\.\d+)?").unwrap();
}

/// Placeholder standing in for each number in a composite skeleton
pub const TOKEN_PLACEHOLDER: char = '#';

/// Kind of content held by a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Empty,
    Numeric,
    Composite,
    String,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Empty => "empty",
            ContentKind::Numeric => "numeric",
            ContentKind::Composite => "composite",
            ContentKind::String => "string",
        }
    }

    /// Whether tokens are compared under tolerance for this kind
    pub fn has_tokens(&self) -> bool {
        matches!(self, ContentKind::Numeric | ContentKind::Composite)
    }
}

/// Canonical form of a cell's text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedCell {
    /// Trimmed, whitespace-collapsed text with original case
    pub display: String,
    /// Case-folded `display`, used for every equality test
    pub folded: String,
    pub kind: ContentKind,
    /// Numeric values in reading order
    pub tokens: Vec<f64>,
    /// `folded` with every token replaced by [`TOKEN_PLACEHOLDER`]
    pub skeleton: String,
}

impl NormalizedCell {
    pub fn is_empty(&self) -> bool {
        self.kind == ContentKind::Empty
    }
}

/// Trim and collapse whitespace runs; non-breaking spaces and the Unicode
/// minus sign are canonicalized first.
pub fn normalize_text(raw: &str) -> String {
    let canonical: String = raw
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
            '\u{2212}' => '-',
            other => other,
        })
        .collect();
    canonical.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded equality key of a piece of text
pub fn fold(text: &str) -> String {
    normalize_text(text).to_lowercase()
}

/// Normalize raw cell text and classify its content kind
pub fn normalize(raw: &str) -> NormalizedCell {
    let display = normalize_text(raw);
    let folded = display.to_lowercase();

    if folded.is_empty() {
        return NormalizedCell {
            display,
            folded,
            kind: ContentKind::Empty,
            tokens: Vec::new(),
            skeleton: String::new(),
        };
    }

    if NUMERIC_LITERAL.is_match(&folded) {
        if let Some(value) = parse_finite(&folded) {
            return NormalizedCell {
                display,
                skeleton: TOKEN_PLACEHOLDER.to_string(),
                folded,
                kind: ContentKind::Numeric,
                tokens: vec![value],
            };
        }
    }

    let (tokens, skeleton) = tokenize(&folded);
    let kind = if tokens.is_empty() {
        ContentKind::String
    } else {
        ContentKind::Composite
    };

    NormalizedCell {
        display,
        folded,
        kind,
        tokens,
        skeleton,
    }
}

/// Split text into its numeric tokens and the non-numeric skeleton
pub fn tokenize(text: &str) -> (Vec<f64>, String) {
    let mut tokens = Vec::new();
    let mut skeleton = String::with_capacity(text.len());
    let mut cursor = 0;

    for m in NUMBER_TOKEN.find_iter(text) {
        let mut start = m.start();
        let literal = m.as_str();
        let signed = literal.starts_with(['+', '-']);
        if signed && !sign_allowed(&text[..start]) {
            start += 1;
        }

        let token = &text[start..m.end()];
        // Digit runs beyond f64 range stay in the skeleton as text
        let Some(value) = parse_finite(token) else {
            continue;
        };

        skeleton.push_str(&text[cursor..start]);
        skeleton.push(TOKEN_PLACEHOLDER);
        cursor = m.end();
        tokens.push(value);
    }
    skeleton.push_str(&text[cursor..]);

    (tokens, skeleton)
}

fn parse_finite(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// A sign binds to the following digits only after a separator
fn sign_allowed(before: &str) -> bool {
    match before.chars().next_back() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | '/' | '=' | ',' | ';'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_collapse_and_fold() {
        let cell = normalize("  Grade \t 3\n Events ");
        assert_eq!(cell.display, "Grade 3 Events");
        assert_eq!(cell.folded, "grade 3 events");
        assert_eq!(fold("GRADE   3 events"), cell.folded);
    }

    #[test]
    fn test_numeric_kind() {
        for raw in ["42", "-1.5", "+3", "0.25", ".5", "1e3"] {
            let cell = normalize(raw);
            assert_eq!(cell.kind, ContentKind::Numeric, "{}", raw);
            assert_eq!(cell.tokens.len(), 1);
        }
        assert_eq!(normalize("-1.5").tokens, vec![-1.5]);
        assert_eq!(normalize("\u{2212}2").tokens, vec![-2.0]);
    }

    #[test]
    fn test_composite_n_percent() {
        let cell = normalize("50 (58.1%)");
        assert_eq!(cell.kind, ContentKind::Composite);
        assert_eq!(cell.tokens, vec![50.0, 58.1]);
        assert_eq!(cell.skeleton, "# (#%)");
    }

    #[test]
    fn test_composite_mean_sd() {
        let cell = normalize("65.3 (10.2)");
        assert_eq!(cell.kind, ContentKind::Composite);
        assert_eq!(cell.tokens, vec![65.3, 10.2]);
        assert_eq!(cell.skeleton, "# (#)");
    }

    #[test]
    fn test_range_is_not_negative() {
        let (tokens, skeleton) = tokenize("10-20");
        assert_eq!(tokens, vec![10.0, 20.0]);
        assert_eq!(skeleton, "#-#");

        let (tokens, _) = tokenize("min, max: (-1.5, 4)");
        assert_eq!(tokens, vec![-1.5, 4.0]);
    }

    #[test]
    fn test_string_and_empty_kinds() {
        assert_eq!(normalize("Placebo").kind, ContentKind::String);
        assert_eq!(normalize("n/a").kind, ContentKind::String);
        assert!(normalize("   ").is_empty());
        assert_eq!(normalize("").skeleton, "");
    }

    #[test]
    fn test_label_with_number_is_composite() {
        let cell = normalize("Placebo (N=60)");
        assert_eq!(cell.kind, ContentKind::Composite);
        assert_eq!(cell.tokens, vec![60.0]);
        assert_eq!(cell.skeleton, "placebo (n=#)");
    }

    #[test]
    fn test_out_of_range_literal_is_not_a_number() {
        let cell = normalize("1e400");
        assert_ne!(cell.kind, ContentKind::Numeric);
        assert!(cell.tokens.iter().all(|t| t.is_finite()));

        let long = "9".repeat(400);
        let (tokens, skeleton) = tokenize(&format!("{} (5.0)", long));
        assert_eq!(tokens, vec![5.0]);
        assert_eq!(skeleton, format!("{} (#)", long));
    }

    #[test]
    fn test_non_breaking_space() {
        assert_eq!(normalize_text("12\u{00A0}(4.0)"), "12 (4.0)");
    }
}
