//! Score files: one JSON object (token -> score) per method, optionally
//! prefixed with `<min_date>_<max_date>_`, plus a small metadata record
//! carrying the date range next to them.

use miniserde::{json, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::normalize::Token;
use crate::table::DateRange;
use crate::trend::{Method, ScoreMap, TrendScores};

pub const META_FILE: &str = "trend_scores.meta.json";

#[derive(Serialize, Deserialize)]
struct ScoreMeta {
    min_date: String,
    max_date: String,
}

pub fn file_prefix(date_range: &DateRange, date_prefix: bool) -> String {
    if date_prefix {
        format!("{}_{}_", date_range.min_date, date_range.max_date)
    } else {
        String::new()
    }
}

pub fn write_score_map(scores: &ScoreMap, path: &Path) -> Result<()> {
    let sorted: BTreeMap<String, f64> = scores
        .iter()
        .map(|(token, score)| (token.to_string(), *score))
        .collect();
    std::fs::write(path, json::to_string(&sorted))?;
    Ok(())
}

pub fn read_score_map(path: &Path) -> Result<ScoreMap> {
    let data = std::fs::read_to_string(path)?;
    let scores: BTreeMap<String, f64> =
        json::from_str(&data).map_err(|_| Error::Json(path.to_path_buf()))?;
    Ok(scores
        .into_iter()
        .map(|(token, score)| (Token::from(token), score))
        .collect())
}

/// Writes the three score files and the metadata record into `dir`,
/// returning the paths written.
pub fn save_scores(
    scores: &TrendScores,
    dir: &Path,
    date_range: &DateRange,
    date_prefix: bool,
) -> Result<Vec<PathBuf>> {
    let prefix = file_prefix(date_range, date_prefix);
    let mut written = Vec::with_capacity(Method::ALL.len() + 1);
    for method in Method::ALL {
        let path = dir.join(format!("{}{}", prefix, method.file_name()));
        write_score_map(scores.get(method), &path)?;
        written.push(path);
    }
    let meta = ScoreMeta {
        min_date: date_range.min_date.clone(),
        max_date: date_range.max_date.clone(),
    };
    let meta_path = dir.join(format!("{}{}", prefix, META_FILE));
    std::fs::write(&meta_path, json::to_string(&meta))?;
    written.push(meta_path);
    log::debug!("saved trend scores to {}", dir.display());
    Ok(written)
}

/// The metadata record belonging to a score file, if the file has a known
/// score file name.
pub fn meta_path(score_file: &Path) -> Option<PathBuf> {
    let name = score_file.file_name()?.to_str()?;
    let prefix = Method::ALL
        .iter()
        .find_map(|method| name.strip_suffix(method.file_name()))?;
    Some(score_file.with_file_name(format!("{}{}", prefix, META_FILE)))
}

pub fn read_meta(path: &Path) -> Result<DateRange> {
    let data = std::fs::read_to_string(path)?;
    let meta: ScoreMeta = json::from_str(&data).map_err(|_| Error::Json(path.to_path_buf()))?;
    Ok(DateRange::new(meta.min_date, meta.max_date))
}

/// Reads `<min_date>_<max_date>_<rest>` from a file name. Fragile by
/// nature: the dates themselves must not contain underscores.
pub fn parse_date_prefix(score_file: &Path) -> Result<DateRange> {
    let malformed = || Error::MalformedFileName(score_file.to_path_buf());
    let name = score_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(malformed)?;
    if Method::ALL.iter().any(|method| method.file_name() == name) {
        return Err(malformed());
    }
    let mut parts = name.trim().splitn(3, '_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(min), Some(max), Some(rest)) if !min.is_empty() && !max.is_empty() && !rest.is_empty() => {
            Ok(DateRange::new(min, max))
        }
        _ => Err(malformed()),
    }
}

/// Date range of a score file: its metadata record when one sits next to
/// it, otherwise the date prefix of its name.
pub fn date_range_of(score_file: &Path) -> Result<DateRange> {
    match meta_path(score_file) {
        Some(meta) if meta.is_file() => read_meta(&meta),
        _ => parse_date_prefix(score_file),
    }
}

#[test]
fn test_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let mut scores = TrendScores::default();
    scores.accumulate(
        &["crude", "oil", "crude", "opec"].iter().map(|t| Token::from(*t)).collect::<Vec<_>>(),
        0.5,
    );
    let range = DateRange::new("2013-06-01", "2013-06-30");
    let written = save_scores(&scores, dir, &range, true).unwrap();
    assert_eq!(written.len(), 4);
    assert!(dir.join("2013-06-01_2013-06-30_trend_norm_score.json").is_file());

    for method in Method::ALL {
        let path = dir.join(format!("2013-06-01_2013-06-30_{}", method.file_name()));
        let loaded = read_score_map(&path).unwrap();
        let saved = scores.get(method);
        assert_eq!(loaded.len(), saved.len());
        assert!(saved
            .iter()
            .all(|(token, score)| (loaded[token] - score).abs() < 1e-12));
        assert_eq!(date_range_of(&path).unwrap(), range);
    }
}

#[test]
fn test_unprefixed_save_keeps_dates_in_meta() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let range = DateRange::new("2013-06-03", "2013-06-04");
    save_scores(&TrendScores::default(), dir, &range, false).unwrap();
    let path = dir.join("trend_count_score.json");
    assert_eq!(read_score_map(&path).unwrap().len(), 0);
    assert_eq!(date_range_of(&path).unwrap(), range);
}

#[test]
fn test_parse_date_prefix() {
    assert_eq!(
        parse_date_prefix(Path::new("out/2013-06-01_2013-06-07_trend_text_score.json")).unwrap(),
        DateRange::new("2013-06-01", "2013-06-07")
    );
    assert!(matches!(
        parse_date_prefix(Path::new("out/trend_text_score.json")),
        Err(Error::MalformedFileName(_))
    ));
    assert!(matches!(
        parse_date_prefix(Path::new("scores.json")),
        Err(Error::MalformedFileName(_))
    ));
}

#[test]
fn test_read_python_style_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let path = dir.join("counts.json");
    std::fs::write(&path, r#"{"oil": 3, "gas": 1.5}"#).unwrap();
    let scores = read_score_map(&path).unwrap();
    assert_eq!(scores.get(&Token::from("oil")), Some(&3.0));
    assert_eq!(scores.get(&Token::from("gas")), Some(&1.5));

    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(read_score_map(&path), Err(Error::Json(_))));
    assert!(matches!(read_score_map(&dir.join("missing.json")), Err(Error::Io(_))));
}
