use articles::normalize::stop_words_from_lines;
use articles::trend::ScoreMap;
use articles::{
    ArticleRecord, ArticleTable, Articles, Cell, Column, DateRange, Error, Method, Token,
};

fn record(date: &str, title: &str, text: &str) -> ArticleRecord {
    ArticleRecord {
        date: date.to_string(),
        title: Some(title.to_string()),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

fn articles(records: Vec<ArticleRecord>) -> Articles {
    Articles::new(ArticleTable::from_records(records), None, None).unwrap()
}

fn score(map: &ScoreMap, token: &str) -> f64 {
    map.get(&Token::from(token)).copied().unwrap_or(0.0)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn test_two_article_scenario() {
    let mut articles = articles(vec![
        record("2013-06-01", "", "a b a"),
        record("2013-06-02", "", "b c"),
    ]);
    articles.tokenize(&["TEXT"], None, true).unwrap();
    let summary = articles.compute_trend(&["TEXT"], &[], None).unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.date_range, DateRange::new("2013-06-01", "2013-06-02"));
    assert!(summary.weights.is_empty());

    let scores = articles.scores();
    assert_eq!(score(&scores.count, "a"), 2.0);
    assert_eq!(score(&scores.count, "b"), 2.0);
    assert_eq!(score(&scores.count, "c"), 1.0);
    assert_eq!(score(&scores.text, "a"), 1.0);
    assert_eq!(score(&scores.text, "b"), 2.0);
    assert_eq!(score(&scores.text, "c"), 1.0);
    assert!(close(score(&scores.norm, "a"), 2.0 / 3.0));
    assert!(close(score(&scores.norm, "b"), 1.0 / 3.0 + 1.0 / 2.0));
    assert!(close(score(&scores.norm, "c"), 1.0 / 2.0));
}

#[test]
fn test_full_cleaning_pipeline() {
    let stop_words = stop_words_from_lines("the\nto\nof\n");
    let mut articles = Articles::new(
        ArticleTable::from_records(vec![
            record(
                "2013-06-03",
                "Oil &amp; gas",
                "The price of OIL rose\tto $98, see http://reut.rs/x",
            ),
            record("2013-06-04", "Fed", "Oil, oil and G20 talks..."),
        ]),
        Some(stop_words),
        None,
    )
    .unwrap();
    let columns = ["TEXT"];
    articles.remove_noise(&columns).unwrap();
    articles.replace_punctuations(&columns, " ").unwrap();
    articles.tokenize(&columns, None, true).unwrap();
    articles.remove_stop_words(&columns).unwrap();

    let text = articles.table().column("TEXT").unwrap();
    assert_eq!(
        text.cells[0],
        Cell::Tokens(["price", "oil", "rose", "see"].iter().map(|t| Token::from(*t)).collect())
    );
    assert_eq!(
        text.cells[1],
        Cell::Tokens(["oil", "oil", "and", "talks"].iter().map(|t| Token::from(*t)).collect())
    );

    articles.compute_trend(&columns, &[], None).unwrap();
    articles.rank_tokens();
    let top = articles.get_trending_words(Method::Count, 1, true);
    assert_eq!(top, &[(Token::from("oil"), 3.0)]);
    let top = articles.get_trending_words(Method::Text, 1, true);
    assert_eq!(top, &[(Token::from("oil"), 2.0)]);
}

#[test]
fn test_date_window_is_inclusive() {
    let mut articles = articles(vec![
        record("2013-05-31", "", "early"),
        record("2013-06-01", "", "first"),
        record("2013-06-15", "", "middle"),
        record("2013-06-30", "", "last"),
        record("2013-07-01", "", "late"),
    ]);
    articles.tokenize(&["TEXT"], None, true).unwrap();
    let summary = articles
        .compute_trend(&["TEXT"], &[], Some(DateRange::new("2013-06-01", "2013-06-30")))
        .unwrap();
    assert_eq!(summary.rows, 3);
    let scores = articles.scores();
    for inside in ["first", "middle", "last"] {
        assert_eq!(score(&scores.count, inside), 1.0);
    }
    for outside in ["early", "late"] {
        assert_eq!(score(&scores.count, outside), 0.0);
        assert_eq!(score(&scores.text, outside), 0.0);
        assert_eq!(score(&scores.norm, outside), 0.0);
    }
    // the range sticks for the next call
    assert_eq!(articles.date_range(), &DateRange::new("2013-06-01", "2013-06-30"));
    articles.compute_trend(&["TEXT"], &[], None).unwrap();
    assert_eq!(score(&articles.scores().count, "early"), 0.0);
}

#[test]
fn test_weight_regimes() {
    let mut articles = articles(vec![record("2013-06-01", "oil", "oil gas")]);
    articles.tokenize(&["TITLE", "TEXT"], None, true).unwrap();

    let summary = articles.compute_trend(&["TITLE", "TEXT"], &[1.0, 3.0], None).unwrap();
    assert_eq!(summary.weights, vec![0.25, 0.75]);
    assert_eq!(score(&articles.scores().count, "oil"), 1.0);
    assert_eq!(score(&articles.scores().text, "gas"), 0.75);
    assert!(close(score(&articles.scores().norm, "oil"), 0.25 + 0.75 * 0.5));

    // no weights: each column counts fully
    articles.compute_trend(&["TITLE", "TEXT"], &[], None).unwrap();
    assert_eq!(score(&articles.scores().count, "oil"), 2.0);
    assert_eq!(score(&articles.scores().text, "oil"), 2.0);
}

#[test]
fn test_errors_leave_state_alone() {
    let mut articles = articles(vec![record("2013-06-01", "t", "x y")]);

    assert!(matches!(
        articles.compute_trend(&["TEXT"], &[], None),
        Err(Error::NotTokenized(_))
    ));
    assert!(matches!(
        articles.remove_stop_words(&["TEXT"]),
        Err(Error::NoStopWords)
    ));
    assert!(matches!(
        articles.tokenize(&["TEXT"], Some(""), true),
        Err(Error::EmptySeparator)
    ));
    assert_eq!(articles.table().column("TEXT").unwrap().cells[0], Cell::Text("x y".to_string()));
    articles.set_stop_words(stop_words_from_lines("x"));
    assert!(matches!(
        articles.remove_stop_words(&["TEXT"]),
        Err(Error::NotTokenized(_))
    ));

    articles.tokenize(&["TEXT"], None, true).unwrap();
    articles.compute_trend(&["TEXT"], &[], None).unwrap();
    let before = articles.scores().clone();

    match articles.compute_trend(&["TEXT", "BODY"], &[], None) {
        Err(Error::MissingColumn(name)) => assert_eq!(name, "BODY"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        articles.compute_trend(&["TEXT"], &[1.0, 2.0], Some(DateRange::new("2000-01-01", "2000-01-02"))),
        Err(Error::WeightCount { columns: 1, weights: 2 })
    ));
    assert_eq!(articles.scores(), &before);
    assert_eq!(articles.date_range(), &DateRange::new("2013-06-01", "2013-06-01"));
    assert!(matches!(
        articles.remove_noise(&["TEXT"]),
        Err(Error::CellKind { .. })
    ));
}

#[test]
fn test_missing_mandatory_column() {
    let table = ArticleTable::from_columns(vec![Column::text("DATE", vec!["2013-06-01"])]);
    match Articles::new(table, None, None) {
        Err(Error::MissingColumn(name)) => assert_eq!(name, "TIME"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_save_and_load_with_dates() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let mut source = articles(vec![
        record("2013-06-01", "", "banks banks rates"),
        record("2013-06-05", "", "rates"),
    ]);
    source.tokenize(&["TEXT"], None, true).unwrap();
    source.compute_trend(&["TEXT"], &[], None).unwrap();
    source.save_trend_scores(Some(dir), true).unwrap();

    let mut target = articles(vec![record("2014-01-01", "", "")]);
    let path = dir.join("2013-06-01_2013-06-05_trend_norm_score.json");
    target.load_trend_scores(Method::Norm, &path, true).unwrap();
    assert_eq!(target.date_range(), &DateRange::new("2013-06-01", "2013-06-05"));
    assert!(target.scores().count.is_empty());
    assert!(close(score(&target.scores().norm, "banks"), 2.0 / 3.0));
    assert!(close(score(&target.scores().norm, "rates"), 1.0 / 3.0 + 1.0));

    // without the flag the active range stays
    let mut other = articles(vec![record("2014-01-01", "", "")]);
    other
        .load_trend_scores(Method::Count, &dir.join("2013-06-01_2013-06-05_trend_count_score.json"), false)
        .unwrap();
    assert_eq!(other.date_range(), &DateRange::new("2014-01-01", "2014-01-01"));
    assert_eq!(score(&other.scores().count, "banks"), 2.0);
}

#[test]
fn test_legacy_file_name_range() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let path = dir.join("2013-06-10_2013-06-12_trend_text_score.json");
    std::fs::write(&path, r#"{"opec": 4}"#).unwrap();
    let mut articles = articles(vec![record("2014-01-01", "", "")]);
    articles.load_trend_scores(Method::Text, &path, true).unwrap();
    assert_eq!(articles.date_range(), &DateRange::new("2013-06-10", "2013-06-12"));
    assert_eq!(score(&articles.scores().text, "opec"), 4.0);

    let bare = dir.join("trend_text_score.json");
    std::fs::write(&bare, "{}").unwrap();
    assert!(matches!(
        articles.load_trend_scores(Method::Text, &bare, true),
        Err(Error::MalformedFileName(_))
    ));
}

#[test]
fn test_ranking_is_stale_until_reranked() {
    let mut articles = articles(vec![record("2013-06-01", "", "alpha beta beta")]);
    articles.tokenize(&["TEXT"], None, true).unwrap();
    articles.compute_trend(&["TEXT"], &[], None).unwrap();
    assert!(articles.get_trending_words(Method::Count, 5, true).is_empty());
    articles.rank_tokens();
    assert_eq!(articles.get_trending_words(Method::Count, 5, true).len(), 2);

    let report = articles.report(Method::Count, 2, true);
    let mut lines = report.lines();
    assert_eq!(
        lines.next(),
        Some("Top 2 trending words (2013-06-01 to 2013-06-01), count score")
    );
    assert!(lines.next().unwrap().starts_with("beta"));
    assert!(lines.next().unwrap().starts_with("alpha"));

    let bottom = articles.report(Method::Norm, 1, false);
    assert!(bottom.starts_with("Bottom 1 trending words"));
    assert!(bottom.lines().nth(1).unwrap().starts_with("alpha"));
}
