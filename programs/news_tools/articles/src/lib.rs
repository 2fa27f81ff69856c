//! Cleans, tokenizes and scores a table of news articles, then ranks the
//! words trending over a date window.

pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod scores;
pub mod table;
pub mod trend;

pub use error::{Error, Result};
pub use normalize::{Lemmatizer, StopWords, Token};
pub use pipeline::Articles;
pub use table::{ArticleRecord, ArticleTable, Cell, Column, DateRange, MANDATORY_COLUMNS};
pub use trend::{Method, RankEntry, TrendRank, TrendScores, TrendSummary};
