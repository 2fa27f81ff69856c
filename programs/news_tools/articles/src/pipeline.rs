use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::normalize::{self, Lemmatizer, StopWords};
use crate::scores;
use crate::table::{ArticleTable, DateRange, MANDATORY_COLUMNS};
use crate::trend::{self, Method, RankEntry, TrendRank, TrendScores, TrendSummary};

/// An article table together with the trend state computed from it.
///
/// The active date range starts as the span of the DATE column and is
/// replaced whenever a computation or a score-file load brings its own.
#[derive(Debug, Clone)]
pub struct Articles {
    table: ArticleTable,
    stop_words: Option<StopWords>,
    date_range: DateRange,
    scores: TrendScores,
    rank: TrendRank,
}

impl Articles {
    pub fn new(
        table: ArticleTable,
        stop_words: Option<StopWords>,
        date_range: Option<DateRange>,
    ) -> Result<Articles> {
        table.require_columns(&MANDATORY_COLUMNS)?;
        let date_range = match date_range {
            Some(range) => range,
            None => table.date_span()?.unwrap_or_default(),
        };
        Ok(Articles {
            table,
            stop_words,
            date_range,
            scores: TrendScores::default(),
            rank: TrendRank::default(),
        })
    }

    pub fn table(&self) -> &ArticleTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut ArticleTable {
        &mut self.table
    }

    pub fn into_table(self) -> ArticleTable {
        self.table
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn scores(&self) -> &TrendScores {
        &self.scores
    }

    pub fn set_stop_words(&mut self, stop_words: StopWords) {
        self.stop_words = Some(stop_words);
    }

    pub fn remove_noise(&mut self, columns: &[&str]) -> Result<()> {
        log::debug!("removing newlines, tabs, HTML entities and URLs from {:?}", columns);
        self.table.map_text(columns, normalize::remove_noise)
    }

    pub fn replace_punctuations(&mut self, columns: &[&str], replacement: &str) -> Result<()> {
        log::debug!("replacing punctuation in {:?} with {:?}", columns, replacement);
        self.table
            .map_text(columns, |text| normalize::replace_punctuations(text, replacement))
    }

    /// Splits the text cells of `columns` into tokens, on `sep` or on
    /// whitespace runs. An empty `sep` is an error.
    pub fn tokenize(&mut self, columns: &[&str], sep: Option<&str>, lower: bool) -> Result<()> {
        if sep == Some("") {
            return Err(Error::EmptySeparator);
        }
        log::debug!("tokenizing {:?}", columns);
        self.table
            .tokenize_with(columns, |text| normalize::tokenize(text, sep, lower))
    }

    /// Drops stop words and digit-bearing tokens from tokenized columns.
    pub fn remove_stop_words(&mut self, columns: &[&str]) -> Result<()> {
        let stop_words = self.stop_words.as_ref().ok_or(Error::NoStopWords)?;
        log::debug!("removing {} stop words from {:?}", stop_words.len(), columns);
        self.table
            .map_tokens(columns, |tokens| normalize::remove_stop_words(tokens, stop_words))
    }

    pub fn lemmatize<L: Lemmatizer>(&mut self, columns: &[&str], lemmatizer: &L) -> Result<()> {
        self.table
            .map_tokens(columns, |tokens| normalize::lemmatize(tokens, lemmatizer))
    }

    /// Recomputes all three score mappings from scratch. With `date_range`
    /// given it also becomes the active range; otherwise the active one is used.
    /// On error the previous scores and range are left untouched.
    pub fn compute_trend(
        &mut self,
        columns: &[&str],
        column_weights: &[f64],
        date_range: Option<DateRange>,
    ) -> Result<TrendSummary> {
        let date_range = date_range.unwrap_or_else(|| self.date_range.clone());
        let (scores, summary) =
            trend::compute_trend(&self.table, columns, column_weights, &date_range)?;
        self.scores = scores;
        self.date_range = date_range;
        Ok(summary)
    }

    /// Saves the scores into `save_loc` (the working directory when `None`).
    pub fn save_trend_scores(&self, save_loc: Option<&Path>, date_prefix: bool) -> Result<Vec<PathBuf>> {
        let dir = save_loc.unwrap_or_else(|| Path::new("."));
        scores::save_scores(&self.scores, dir, &self.date_range, date_prefix)
    }

    /// Replaces one score mapping with the contents of `file`. With
    /// `date_prefix` the active date range is taken from the file too.
    pub fn load_trend_scores(&mut self, method: Method, file: &Path, date_prefix: bool) -> Result<()> {
        let date_range = if date_prefix {
            Some(scores::date_range_of(file)?)
        } else {
            None
        };
        let loaded = scores::read_score_map(file)?;
        *self.scores.get_mut(method) = loaded;
        if let Some(range) = date_range {
            log::debug!("date range changed to {} to {}", range.min_date, range.max_date);
            self.date_range = range;
        }
        Ok(())
    }

    pub fn rank_tokens(&mut self) {
        self.rank = TrendRank::new(&self.scores);
    }

    /// Top (or bottom) `n` entries of the last ranking. Call `rank_tokens`
    /// after the scores change, the ranking is not refreshed on its own.
    pub fn get_trending_words(&self, method: Method, n: usize, top: bool) -> &[RankEntry] {
        self.rank.trending(method, n, top)
    }

    /// A plain-text listing of `get_trending_words` under a title with the date range.
    pub fn report(&self, method: Method, n: usize, top: bool) -> String {
        let mut out = format!(
            "{} {} trending words ({} to {}), {} score\n",
            if top { "Top" } else { "Bottom" },
            n,
            self.date_range.min_date,
            self.date_range.max_date,
            method
        );
        for (token, score) in self.get_trending_words(method, n, top) {
            let token: &str = token;
            let _ = writeln!(out, "{:<24} {:.4}", token, score);
        }
        out
    }
}
