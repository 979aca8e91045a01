//! PGN movetext: writing a SAN list and reading one back.
//!
//! Only the movetext section matters here. Tag pairs, comments, variations
//! and NAGs are accepted on input and dropped.

use std::sync::LazyLock;

use regex::Regex;

static TAG_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("tag pattern compiles"));
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment pattern compiles"));
static VARIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation pattern compiles"));
static MOVE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+").expect("move number pattern compiles"));

pub const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// `1. e4 e5 2. Nf3 *`
pub fn write_movetext(sans: &[String], result: &str) -> String {
    let mut out = String::new();
    for (ply, san) in sans.iter().enumerate() {
        if ply % 2 == 0 {
            out.push_str(&format!("{}. ", ply / 2 + 1));
        }
        out.push_str(san);
        out.push(' ');
    }
    out.push_str(result);
    out
}

/// SAN tokens of the main line, in order.
pub fn parse_movetext(text: &str) -> Vec<String> {
    let text = TAG_PAIR.replace_all(text, " ");
    let text = COMMENT.replace_all(&text, " ");
    let mut text = text.into_owned();
    // Nested variations unwrap from the inside out.
    while VARIATION.is_match(&text) {
        text = VARIATION.replace_all(&text, " ").into_owned();
    }

    text.split_whitespace()
        .filter_map(|token| {
            let token = MOVE_NUMBER.replace(token, "");
            let token = token.trim();
            let skip = token.is_empty()
                || token.starts_with('$')
                || RESULT_TOKENS.contains(&token);
            (!skip).then(|| token.to_string())
        })
        .collect()
}

/// The result token at the end of the movetext, if any.
pub fn movetext_result(text: &str) -> Option<&'static str> {
    let last = text.split_whitespace().last()?;
    RESULT_TOKENS.iter().copied().find(|&r| r == last)
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;
