//! Row-level text clean-up and tokenization. Every function here works on a
//! single cell; `ArticleTable` applies them column by column.

use compact_str::CompactString;
use fnv::FnvHashSet;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::path::Path;

pub type Token = CompactString;
pub type StopWords = FnvHashSet<Token>;

static NOT_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-zA-Z]+").unwrap());

/// Deletes newlines and tabs, decodes HTML entities and drops URL tokens.
///
/// Only entities closed by `;` are decoded: `&copy 2013` and `a&ampb` come
/// through unchanged.
pub fn remove_noise(text: &str) -> String {
    let text = strip_control(text);
    let text = html_escape::decode_html_entities(&text);
    remove_urls(&text)
}

// A deleted run of \n / \t between two visible characters leaves one space behind.
fn strip_control(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut gap = false;
    for c in text.chars() {
        if c == '\n' || c == '\t' {
            gap = true;
            continue;
        }
        if gap {
            let after_word = out.chars().last().map(|p| !p.is_whitespace()).unwrap_or(false);
            if after_word && !c.is_whitespace() {
                out.push(' ');
            }
            gap = false;
        }
        out.push(c);
    }
    out
}

/// Drops every space-separated token starting with `http` or `www`. Runs of
/// spaces are kept as they are, only the URL itself goes.
pub fn remove_urls(text: &str) -> String {
    text.split(' ')
        .filter(|token| !token.starts_with("http") && !token.starts_with("www"))
        .join(" ")
}

/// Replaces each run of characters outside `[0-9a-zA-Z]` with `replacement`.
/// Non-ASCII letters count as punctuation here, so accented words get split.
pub fn replace_punctuations(text: &str, replacement: &str) -> String {
    NOT_ALPHANUMERIC
        .replace_all(text, NoExpand(replacement))
        .into_owned()
}

/// Splits trimmed text on `sep`, or on whitespace runs when no separator is
/// given. An empty `sep` also splits on whitespace; `Articles::tokenize`
/// rejects it before getting here.
pub fn tokenize(text: &str, sep: Option<&str>, lower: bool) -> Vec<Token> {
    let to_token = |piece: &str| {
        if lower {
            Token::from(piece.to_lowercase())
        } else {
            Token::from(piece)
        }
    };
    let text = text.trim();
    match sep {
        Some(sep) if !sep.is_empty() => text.split(sep).map(to_token).collect(),
        _ => text.split_whitespace().map(to_token).collect(),
    }
}

pub fn has_digit(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
}

/// Keeps tokens that are neither stop words nor carry an ASCII digit.
pub fn remove_stop_words(tokens: &[Token], stop_words: &StopWords) -> Vec<Token> {
    tokens
        .iter()
        .filter(|token| !stop_words.contains(*token) && !has_digit(token))
        .cloned()
        .collect()
}

/// A pluggable lemmatization step. Nothing is provided by default.
pub trait Lemmatizer: Sync {
    fn lemmatize(&self, token: &str) -> Token;
}

impl<F> Lemmatizer for F
where
    F: Fn(&str) -> Token + Sync,
{
    fn lemmatize(&self, token: &str) -> Token {
        self(token)
    }
}

pub fn lemmatize<L: Lemmatizer + ?Sized>(tokens: &[Token], lemmatizer: &L) -> Vec<Token> {
    tokens.iter().map(|token| lemmatizer.lemmatize(token)).collect()
}

/// Reads a stop-word list, one word per line.
pub fn load_stop_words(path: &Path) -> std::io::Result<StopWords> {
    let words = std::fs::read_to_string(path)?;
    Ok(stop_words_from_lines(&words))
}

pub fn stop_words_from_lines(words: &str) -> StopWords {
    words
        .lines()
        .map(|word| word.trim())
        .filter(|word| !word.is_empty())
        .map(Token::from)
        .collect()
}

#[cfg(test)]
fn tokens(words: &[&str]) -> Vec<Token> {
    words.iter().map(|w| Token::from(*w)).collect()
}

#[test]
fn test_remove_noise() {
    assert_eq!(remove_noise("check http://x.com now\nplease"), "check now please");
    assert_eq!(remove_noise("line one \nline\ttwo"), "line one line two");
    assert_eq!(remove_noise("Tom &amp; Jerry &lt;3"), "Tom & Jerry <3");
    assert_eq!(remove_noise("see www.reuters.com or https://x.y/z"), "see or");
    // only whole tokens go, runs of spaces survive
    assert_eq!(remove_noise("a  b"), "a  b");
    assert_eq!(remove_noise("shttp stays"), "shttp stays");
    // entities without the closing semicolon stay
    assert_eq!(remove_noise("&copy 2013"), "&copy 2013");
    assert_eq!(remove_noise("a&ampb"), "a&ampb");
    assert_eq!(remove_noise("&copy; 2013"), "\u{a9} 2013");
}

#[test]
fn test_replace_punctuations() {
    assert_eq!(replace_punctuations("Hello, world!", " "), "Hello world ");
    assert_eq!(replace_punctuations("U.S.-China", "_"), "U_S_China");
    assert_eq!(replace_punctuations("costs $5", "$1"), "costs$15");
    // non-ASCII letters are treated like punctuation
    assert_eq!(replace_punctuations("café naïve", " "), "caf na ve");
    assert_eq!(replace_punctuations("Zürich", ""), "Zrich");
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("  Stocks RALLY\ttoday ", None, true), tokens(&["stocks", "rally", "today"]));
    assert_eq!(tokenize("a,B,,c", Some(","), true), tokens(&["a", "b", "", "c"]));
    assert!(tokenize("   ", None, true).is_empty());
    assert_eq!(tokenize(" a  b ", Some(""), true), tokens(&["a", "b"]));
}

#[test]
fn test_tokenize_keeps_case_when_asked() {
    assert_eq!(tokenize("Fed Raises Rates", None, false), tokens(&["Fed", "Raises", "Rates"]));
    assert_eq!(tokenize("Fed Raises Rates", None, true), tokens(&["fed", "raises", "rates"]));
}

#[test]
fn test_remove_stop_words() {
    let stop_words = stop_words_from_lines("the\n a \n\nof\n");
    assert_eq!(stop_words.len(), 3);
    let filtered = remove_stop_words(
        &tokens(&["the", "price", "of", "oil", "2013", "q3", "a", "rose"]),
        &stop_words,
    );
    assert_eq!(filtered, tokens(&["price", "oil", "rose"]));
    // digits are dropped even with an empty list
    let filtered = remove_stop_words(&tokens(&["g20", "summit"]), &StopWords::default());
    assert_eq!(filtered, tokens(&["summit"]));
}

#[test]
fn test_lemmatize() {
    let strip_plural = |token: &str| Token::from(token.strip_suffix('s').unwrap_or(token));
    assert_eq!(
        lemmatize(&tokens(&["banks", "rates", "oil"]), &strip_plural),
        tokens(&["bank", "rate", "oil"])
    );
}
