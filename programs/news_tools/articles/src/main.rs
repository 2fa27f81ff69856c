use articles::normalize::load_stop_words;
use articles::{ArticleRecord, ArticleTable, Articles, DateRange, Error, Method};
use std::path::PathBuf;
use term_macros::*;

fn main() {
    tool! {
        args:
            - columns: Vec<String> = vec!["TEXT".to_string()];
            - weights: Vec<f64> = Vec::new();
            - min_date: Option<String> = None;
            - max_date: Option<String> = None;
            - stop_words: Option<PathBuf> = None;
            - method: String = "count".to_string();
            - top_n: usize = 10;
            - bottom;
            - save_dir: Option<PathBuf> = None;
            - no_date_prefix;
            - keep_case;
        ;

        body: || {
            let method: Method = method.parse()?;
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

            let mut records = Vec::new();
            let mut line_number = 0;
            readin!(_wtr, |line: &[u8]| {
                line_number += 1;
                match ArticleRecord::from_line(line_number, line) {
                    Some(Ok(record)) => records.push(record),
                    Some(Err(e)) => log::warn!("{}, skipped", e),
                    None => {}
                }
            });
            log::info!("{} articles read", records.len());

            let mut articles = Articles::new(ArticleTable::from_records(records), None, None)?;
            if let Some(path) = stop_words {
                articles.set_stop_words(load_stop_words(&path)?);
            }
            let date_range = match (min_date, max_date) {
                (None, None) => None,
                (min, max) => {
                    let span = articles.date_range().clone();
                    Some(DateRange::new(
                        min.unwrap_or(span.min_date),
                        max.unwrap_or(span.max_date),
                    ))
                }
            };

            articles.remove_noise(&columns)?;
            articles.replace_punctuations(&columns, " ")?;
            articles.tokenize(&columns, None, !keep_case)?;
            match articles.remove_stop_words(&columns) {
                Err(Error::NoStopWords) => log::debug!("no stop word list given"),
                other => other?,
            }
            articles.compute_trend(&columns, &weights, date_range)?;
            articles.rank_tokens();

            print!("{}", articles.report(method, top_n, !bottom));

            if let Some(dir) = save_dir {
                std::fs::create_dir_all(&dir)?;
                for path in articles.save_trend_scores(Some(&dir), !no_date_prefix)? {
                    log::info!("wrote {}", path.display());
                }
            }
            Ok::<(), Error>(())
        }
    };
}
