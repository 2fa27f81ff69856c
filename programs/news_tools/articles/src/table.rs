use miniserde::{json, Deserialize};
use rayon::prelude::*;
use std::path::Path;

use crate::error::{Error, Result};
use crate::normalize::Token;

pub const MANDATORY_COLUMNS: [&str; 8] = [
    "DATE", "TIME", "TITLE", "ID", "TEXT", "PLATFORMS", "TOPICS", "LANGUAGE",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Tokens(Vec<Token>),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            Cell::Tokens(_) => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&[Token]> {
        match self {
            Cell::Tokens(tokens) => Some(tokens),
            Cell::Text(_) => None,
        }
    }

    pub fn is_tokens(&self) -> bool {
        matches!(self, Cell::Tokens(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn text<S: Into<String>>(name: &str, cells: impl IntoIterator<Item = S>) -> Column {
        Column {
            name: name.to_string(),
            cells: cells.into_iter().map(|s| Cell::Text(s.into())).collect(),
        }
    }

    pub fn is_tokenized(&self) -> bool {
        self.cells.iter().all(Cell::is_tokens)
    }
}

/// Inclusive `[min_date, max_date]`, compared as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub min_date: String,
    pub max_date: String,
}

impl DateRange {
    pub fn new<S: Into<String>>(min_date: S, max_date: S) -> DateRange {
        DateRange {
            min_date: min_date.into(),
            max_date: max_date.into(),
        }
    }

    pub fn contains(&self, date: &str) -> bool {
        self.min_date.as_str() <= date && date <= self.max_date.as_str()
    }
}

/// One article as it arrives on a JSON line. Only DATE is required; any
/// other missing value becomes an empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "DATE")]
    pub date: String,
    #[serde(rename = "TIME")]
    pub time: Option<String>,
    #[serde(rename = "TITLE")]
    pub title: Option<String>,
    #[serde(rename = "ID")]
    pub id: Option<String>,
    #[serde(rename = "TEXT")]
    pub text: Option<String>,
    #[serde(rename = "PLATFORMS")]
    pub platforms: Option<String>,
    #[serde(rename = "TOPICS")]
    pub topics: Option<String>,
    #[serde(rename = "LANGUAGE")]
    pub language: Option<String>,
}

impl ArticleRecord {
    pub fn from_json(line: &str) -> std::result::Result<ArticleRecord, miniserde::Error> {
        json::from_str(line)
    }

    /// Reads line `line_number` (1-based) of a JSON-lines input. Blank lines
    /// give `None`.
    pub fn from_line(line_number: usize, line: &[u8]) -> Option<Result<ArticleRecord>> {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(_) => return Some(Err(Error::NotUtf8(line_number))),
        };
        if line.is_empty() {
            return None;
        }
        Some(ArticleRecord::from_json(line).map_err(|_| Error::Record(line_number)))
    }

    fn into_values(self) -> [String; 8] {
        [
            self.date,
            self.time.unwrap_or_default(),
            self.title.unwrap_or_default(),
            self.id.unwrap_or_default(),
            self.text.unwrap_or_default(),
            self.platforms.unwrap_or_default(),
            self.topics.unwrap_or_default(),
            self.language.unwrap_or_default(),
        ]
    }
}

/// Column-major article store. Every column holds one cell per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleTable {
    columns: Vec<Column>,
}

impl ArticleTable {
    pub fn from_columns(columns: Vec<Column>) -> ArticleTable {
        ArticleTable { columns }
    }

    pub fn from_records(records: Vec<ArticleRecord>) -> ArticleTable {
        let mut columns: Vec<Column> = MANDATORY_COLUMNS
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                cells: Vec::with_capacity(records.len()),
            })
            .collect();
        for record in records {
            for (column, value) in columns.iter_mut().zip(record.into_values()) {
                column.cells.push(Cell::Text(value));
            }
        }
        ArticleTable { columns }
    }

    /// Reads one JSON article per line; blank lines are skipped.
    pub fn load_json_lines(path: &Path) -> Result<ArticleTable> {
        let data = std::fs::read(path)?;
        let records = data
            .split(|b| *b == b'\n')
            .enumerate()
            .filter_map(|(i, line)| ArticleRecord::from_line(i + 1, line))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("{} articles read from {}", records.len(), path.display());
        Ok(ArticleTable::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Adds a column, or replaces the one with the same name.
    pub fn insert_column(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(Error::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    fn text_column_mut(&mut self, name: &str) -> Result<&mut Column> {
        let column = self.column_mut(name)?;
        if column.cells.iter().any(Cell::is_tokens) {
            return Err(Error::CellKind {
                column: name.to_string(),
                expected: "text",
            });
        }
        Ok(column)
    }

    fn token_column_mut(&mut self, name: &str) -> Result<&mut Column> {
        let column = self.column_mut(name)?;
        if !column.is_tokenized() {
            return Err(Error::NotTokenized(name.to_string()));
        }
        Ok(column)
    }

    /// Rewrites every text cell of the named columns. Columns are handled in
    /// order; a failing column is left as it was, earlier ones keep their change.
    pub fn map_text<F>(&mut self, columns: &[&str], f: F) -> Result<()>
    where
        F: Fn(&str) -> String + Sync,
    {
        for name in columns {
            let column = self.text_column_mut(name)?;
            column.cells.par_iter_mut().for_each(|cell| {
                if let Cell::Text(text) = cell {
                    *text = f(text);
                }
            });
        }
        Ok(())
    }

    /// Turns the text cells of the named columns into token cells.
    pub fn tokenize_with<F>(&mut self, columns: &[&str], f: F) -> Result<()>
    where
        F: Fn(&str) -> Vec<Token> + Sync,
    {
        for name in columns {
            let column = self.text_column_mut(name)?;
            column.cells.par_iter_mut().for_each(|cell| {
                if let Cell::Text(text) = cell {
                    let tokens = f(text);
                    *cell = Cell::Tokens(tokens);
                }
            });
        }
        Ok(())
    }

    pub fn map_tokens<F>(&mut self, columns: &[&str], f: F) -> Result<()>
    where
        F: Fn(&[Token]) -> Vec<Token> + Sync,
    {
        for name in columns {
            let column = self.token_column_mut(name)?;
            column.cells.par_iter_mut().for_each(|cell| {
                if let Cell::Tokens(tokens) = cell {
                    *tokens = f(tokens);
                }
            });
        }
        Ok(())
    }

    fn dates(&self) -> Result<impl Iterator<Item = &str>> {
        let column = self.column("DATE")?;
        if column.cells.iter().any(Cell::is_tokens) {
            return Err(Error::CellKind {
                column: "DATE".to_string(),
                expected: "text",
            });
        }
        Ok(column.cells.iter().filter_map(Cell::as_text))
    }

    /// Smallest and largest DATE in the table, or `None` when it has no rows.
    pub fn date_span(&self) -> Result<Option<DateRange>> {
        let mut dates = self.dates()?;
        let first = match dates.next() {
            Some(date) => date,
            None => return Ok(None),
        };
        let (min, max) = dates.fold((first, first), |(min, max), date| {
            (min.min(date), max.max(date))
        });
        Ok(Some(DateRange::new(min, max)))
    }

    /// One flag per row: is its DATE inside `range`.
    pub fn date_mask(&self, range: &DateRange) -> Result<Vec<bool>> {
        Ok(self.dates()?.map(|date| range.contains(date)).collect())
    }
}

#[cfg(test)]
fn sample_table() -> ArticleTable {
    let mut columns: Vec<Column> = MANDATORY_COLUMNS
        .iter()
        .map(|name| Column::text(name, vec![""; 3]))
        .collect();
    columns[0] = Column::text("DATE", vec!["2013-06-02", "2013-06-01", "2013-06-03"]);
    columns[4] = Column::text("TEXT", vec!["Oil prices rise", "Fed holds", ""]);
    ArticleTable::from_columns(columns)
}

#[test]
fn test_date_range_is_inclusive() {
    let range = DateRange::new("2013-06-01", "2013-06-02");
    assert!(range.contains("2013-06-01"));
    assert!(range.contains("2013-06-02"));
    assert!(!range.contains("2013-05-31"));
    assert!(!range.contains("2013-06-03"));
}

#[test]
fn test_date_span_and_mask() {
    let table = sample_table();
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.date_span().unwrap(),
        Some(DateRange::new("2013-06-01", "2013-06-03"))
    );
    let mask = table.date_mask(&DateRange::new("2013-06-02", "2013-06-03")).unwrap();
    assert_eq!(mask, vec![true, false, true]);
    assert_eq!(ArticleTable::default().date_mask(&DateRange::default()).ok(), None);
}

#[test]
fn test_transforms_check_column_kind() {
    let mut table = sample_table();
    table.map_text(&["TEXT"], |text| text.to_uppercase()).unwrap();
    assert_eq!(table.column("TEXT").unwrap().cells[0].as_text(), Some("OIL PRICES RISE"));

    table
        .tokenize_with(&["TEXT"], |text| text.split_whitespace().map(Token::from).collect())
        .unwrap();
    let text = table.column("TEXT").unwrap();
    assert!(text.is_tokenized());
    assert_eq!(text.cells[2].as_tokens().map(|t| t.len()), Some(0));

    assert!(matches!(
        table.map_text(&["TEXT"], |text| text.to_string()),
        Err(Error::CellKind { .. })
    ));
    assert!(matches!(
        table.map_tokens(&["TITLE"], |tokens| tokens.to_vec()),
        Err(Error::NotTokenized(_))
    ));
}

#[test]
fn test_missing_column_keeps_earlier_changes() {
    let mut table = sample_table();
    let result = table.map_text(&["TEXT", "BODY"], |text| text.to_lowercase());
    match result {
        Err(Error::MissingColumn(name)) => assert_eq!(name, "BODY"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(table.column("TEXT").unwrap().cells[1].as_text(), Some("fed holds"));
}

#[test]
fn test_record_from_json() {
    let record = ArticleRecord::from_json(
        r#"{"DATE":"2013-06-01","TIME":"09:30","ID":"nL1N0EC","TEXT":"Oil &amp; gas","EXTRA":1}"#,
    )
    .unwrap();
    assert_eq!(record.date, "2013-06-01");
    assert_eq!(record.text.as_deref(), Some("Oil &amp; gas"));
    assert_eq!(record.topics, None);

    let table = ArticleTable::from_records(vec![record]);
    assert_eq!(table.len(), 1);
    assert!(MANDATORY_COLUMNS.iter().all(|name| table.has_column(name)));
    assert_eq!(table.column("LANGUAGE").unwrap().cells[0].as_text(), Some(""));
    assert!(ArticleRecord::from_json(r#"{"TEXT":"no date"}"#).is_err());
}

#[test]
fn test_record_from_line() {
    assert!(ArticleRecord::from_line(1, b"").is_none());
    assert!(ArticleRecord::from_line(1, b"  \r").is_none());
    assert!(matches!(
        ArticleRecord::from_line(2, b"\xff\xfe bad"),
        Some(Err(Error::NotUtf8(2)))
    ));
    assert!(matches!(
        ArticleRecord::from_line(3, br#"{"TEXT":"nodate"}"#),
        Some(Err(Error::Record(3)))
    ));
    let record = ArticleRecord::from_line(4, br#"{"DATE":"2013-06-01","TEXT":"ok"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(record.date, "2013-06-01");
}

#[test]
fn test_load_json_lines_reports_bad_line() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("articles.jsonl");
    std::fs::write(
        &path,
        b"{\"DATE\":\"2013-06-01\"}\n\n{\"DATE\":\"2013-06-02\"}\n".as_slice(),
    )
    .unwrap();
    assert_eq!(ArticleTable::load_json_lines(&path).unwrap().len(), 2);

    std::fs::write(&path, b"{\"DATE\":\"2013-06-01\"}\n\xff\n".as_slice()).unwrap();
    assert!(matches!(
        ArticleTable::load_json_lines(&path),
        Err(Error::NotUtf8(2))
    ));
}
