//! Trend scoring: three per-token statistics accumulated over the token
//! lists of a date-filtered set of rows, and their rankings.
//!
//! * count - weighted number of occurrences
//! * text  - weighted number of token lists containing the token
//! * norm  - weighted sum of in-list term frequency (occurrences / list length)

use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::normalize::Token;
use crate::table::{ArticleTable, DateRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Count,
    Text,
    Norm,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Count, Method::Text, Method::Norm];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Count => "count",
            Method::Text => "text",
            Method::Norm => "norm",
        }
    }

    /// Name of the file the scores of this method are saved under, before any date prefix.
    pub fn file_name(&self) -> &'static str {
        match self {
            Method::Count => "trend_count_score.json",
            Method::Text => "trend_text_score.json",
            Method::Norm => "trend_norm_score.json",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Method> {
        Method::ALL
            .iter()
            .find(|m| m.name() == s)
            .copied()
            .ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub type ScoreMap = FnvHashMap<Token, f64>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendScores {
    pub count: ScoreMap,
    pub text: ScoreMap,
    pub norm: ScoreMap,
}

impl TrendScores {
    pub fn get(&self, method: Method) -> &ScoreMap {
        match method {
            Method::Count => &self.count,
            Method::Text => &self.text,
            Method::Norm => &self.norm,
        }
    }

    pub fn get_mut(&mut self, method: Method) -> &mut ScoreMap {
        match method {
            Method::Count => &mut self.count,
            Method::Text => &mut self.text,
            Method::Norm => &mut self.norm,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty() && self.text.is_empty() && self.norm.is_empty()
    }

    /// Adds one row's token list. Every occurrence counts towards `count`;
    /// `text` and `norm` are bumped once per distinct token, on its first
    /// occurrence, with frequencies taken over the whole list.
    pub fn accumulate(&mut self, tokens: &[Token], weight: f64) {
        if tokens.is_empty() {
            return;
        }
        let length = tokens.len() as f64;
        let occurrences = tokens.iter().counts();
        let mut seen = FnvHashSet::default();
        for token in tokens {
            *self.count.entry(token.clone()).or_insert(0.0) += weight;
            if seen.insert(token) {
                *self.text.entry(token.clone()).or_insert(0.0) += weight;
                let frequency = occurrences[&token] as f64 / length;
                *self.norm.entry(token.clone()).or_insert(0.0) += frequency * weight;
            }
        }
    }
}

/// What a trend computation ran with.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    pub date_range: DateRange,
    /// Normalized weights, empty when every column counted with weight 1.
    pub weights: Vec<f64>,
    /// Rows inside the date range.
    pub rows: usize,
}

/// Scales weights to sum to 1. An empty list stays empty.
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>> {
    if weights.is_empty() {
        return Ok(Vec::new());
    }
    let sum: f64 = weights.iter().sum();
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || !sum.is_finite() || sum <= 0.0 {
        return Err(Error::InvalidWeights(weights.to_vec()));
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}

/// Scores the token lists of `columns` for rows whose DATE lies in
/// `date_range`. Either every column gets a weight (normalized to sum to 1)
/// or none does, in which case each column counts with weight 1.
///
/// Nothing is accumulated unless all columns exist and are tokenized.
pub fn compute_trend(
    table: &ArticleTable,
    columns: &[&str],
    column_weights: &[f64],
    date_range: &DateRange,
) -> Result<(TrendScores, TrendSummary)> {
    table.require_columns(columns)?;
    for name in columns {
        if !table.column(name)?.is_tokenized() {
            return Err(Error::NotTokenized(name.to_string()));
        }
    }
    if !column_weights.is_empty() && column_weights.len() != columns.len() {
        return Err(Error::WeightCount {
            columns: columns.len(),
            weights: column_weights.len(),
        });
    }
    let weights = normalize_weights(column_weights)?;
    let mask = table.date_mask(date_range)?;
    log::debug!(
        "date range {} to {}, weights {:?}",
        date_range.min_date,
        date_range.max_date,
        weights
    );

    let mut scores = TrendScores::default();
    for (i, name) in columns.iter().enumerate() {
        let weight = weights.get(i).copied().unwrap_or(1.0);
        let column = table.column(name)?;
        column
            .cells
            .iter()
            .zip(mask.iter())
            .filter(|(_, in_range)| **in_range)
            .filter_map(|(cell, _)| cell.as_tokens())
            .for_each(|tokens| scores.accumulate(tokens, weight));
    }

    let summary = TrendSummary {
        date_range: date_range.clone(),
        weights,
        rows: mask.iter().filter(|in_range| **in_range).count(),
    };
    log::info!(
        "{} tokens scored over {} rows",
        scores.count.len(),
        summary.rows
    );
    Ok((scores, summary))
}

pub type RankEntry = (Token, f64);

/// Score mappings sorted high to low. Equal scores are ordered by token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendRank {
    count: Vec<RankEntry>,
    text: Vec<RankEntry>,
    norm: Vec<RankEntry>,
}

fn rank(scores: &ScoreMap) -> Vec<RankEntry> {
    let mut ranked: Vec<RankEntry> = scores
        .iter()
        .map(|(token, score)| (token.clone(), *score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

impl TrendRank {
    pub fn new(scores: &TrendScores) -> TrendRank {
        TrendRank {
            count: rank(&scores.count),
            text: rank(&scores.text),
            norm: rank(&scores.norm),
        }
    }

    pub fn get(&self, method: Method) -> &[RankEntry] {
        match method {
            Method::Count => &self.count,
            Method::Text => &self.text,
            Method::Norm => &self.norm,
        }
    }

    /// The first `n` entries, or with `top == false` the last `n`, still
    /// listed from high to low.
    pub fn trending(&self, method: Method, n: usize, top: bool) -> &[RankEntry] {
        let ranked = self.get(method);
        let n = n.min(ranked.len());
        if top {
            &ranked[..n]
        } else {
            &ranked[ranked.len() - n..]
        }
    }
}

#[cfg(test)]
fn tokens(words: &[&str]) -> Vec<Token> {
    words.iter().map(|w| Token::from(*w)).collect()
}

#[cfg(test)]
fn score(map: &ScoreMap, token: &str) -> f64 {
    map.get(&Token::from(token)).copied().unwrap_or(0.0)
}

#[cfg(test)]
fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn test_two_rows() {
    let mut scores = TrendScores::default();
    scores.accumulate(&tokens(&["a", "b", "a"]), 1.0);
    scores.accumulate(&tokens(&["b", "c"]), 1.0);

    assert_eq!(score(&scores.count, "a"), 2.0);
    assert_eq!(score(&scores.count, "b"), 2.0);
    assert_eq!(score(&scores.count, "c"), 1.0);
    assert_eq!(score(&scores.text, "a"), 1.0);
    assert_eq!(score(&scores.text, "b"), 2.0);
    assert_eq!(score(&scores.text, "c"), 1.0);
    assert!(close(score(&scores.norm, "a"), 2.0 / 3.0));
    assert!(close(score(&scores.norm, "b"), 1.0 / 3.0 + 0.5));
    assert!(close(score(&scores.norm, "c"), 0.5));
}

#[test]
fn test_empty_list_changes_nothing() {
    let mut scores = TrendScores::default();
    scores.accumulate(&tokens(&["x"]), 0.5);
    let before = scores.clone();
    scores.accumulate(&[], 1.0);
    assert_eq!(scores, before);
}

#[test]
fn test_weighted_row() {
    let mut scores = TrendScores::default();
    scores.accumulate(&tokens(&["oil", "oil", "oil", "gas"]), 0.25);
    assert_eq!(score(&scores.count, "oil"), 0.75);
    assert_eq!(score(&scores.text, "oil"), 0.25);
    assert_eq!(score(&scores.text, "gas"), 0.25);
    assert!(close(score(&scores.norm, "oil"), 0.25 * 0.75));
    assert!(close(score(&scores.norm, "gas"), 0.25 * 0.25));
}

#[test]
fn test_norm_sums_to_one_per_row() {
    let mut scores = TrendScores::default();
    scores.accumulate(&tokens(&["to", "be", "or", "not", "to", "be", "that"]), 1.0);
    let total: f64 = scores.norm.values().sum();
    assert!(close(total, 1.0));
}

#[test]
fn test_normalize_weights() {
    assert_eq!(normalize_weights(&[1.0, 3.0]).unwrap(), vec![0.25, 0.75]);
    assert!(normalize_weights(&[]).unwrap().is_empty());
    assert!(matches!(normalize_weights(&[0.0, 0.0]), Err(Error::InvalidWeights(_))));
    assert!(matches!(normalize_weights(&[2.0, -1.0]), Err(Error::InvalidWeights(_))));
    assert!(matches!(normalize_weights(&[f64::NAN]), Err(Error::InvalidWeights(_))));
    // the sum overflows even though each weight is finite
    assert!(matches!(normalize_weights(&[1e308, 1e308]), Err(Error::InvalidWeights(_))));
}

#[test]
fn test_method_names() {
    assert_eq!("norm".parse::<Method>().unwrap(), Method::Norm);
    assert_eq!(Method::Text.to_string(), "text");
    assert!(matches!("tfidf".parse::<Method>(), Err(Error::UnknownMethod(_))));
}

#[test]
fn test_rank_order_and_slices() {
    let mut scores = TrendScores::default();
    scores.accumulate(&tokens(&["d", "c", "c", "b", "b", "b", "a", "e"]), 1.0);
    let rank = TrendRank::new(&scores);
    let counts: Vec<(&str, f64)> = rank
        .get(Method::Count)
        .iter()
        .map(|(t, s)| (t.as_str(), *s))
        .collect();
    // a, d and e tie at 1 and fall back to token order
    assert_eq!(counts, vec![("b", 3.0), ("c", 2.0), ("a", 1.0), ("d", 1.0), ("e", 1.0)]);

    for method in Method::ALL {
        let ranked = rank.get(method);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    let top = rank.trending(Method::Count, 2, true);
    let bottom = rank.trending(Method::Count, 2, false);
    assert_eq!(top.len(), 2);
    assert_eq!(bottom.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(), vec!["d", "e"]);
    assert!(top.iter().all(|entry| !bottom.contains(entry)));

    assert_eq!(rank.trending(Method::Text, 50, true).len(), 5);
    assert_eq!(rank.trending(Method::Text, 50, false).len(), 5);
    assert!(rank.trending(Method::Norm, 0, false).is_empty());
}
