use std::path::PathBuf;

/// Converts one raw command-line value into a typed argument.
pub trait FromArg: Sized {
    fn from_arg(raw: &str) -> Result<Self, String>;
}

macro_rules! parsed_arg {
    ($($t:ty),*) => {
        $(
            impl FromArg for $t {
                fn from_arg(raw: &str) -> Result<Self, String> {
                    raw.parse::<$t>()
                        .map_err(|e| format!("could not read {:?} as {}: {}", raw, stringify!($t), e))
                }
            }
        )*
    };
}

parsed_arg!(usize, u32, u64, i32, i64, f32, f64, bool);

impl FromArg for String {
    fn from_arg(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromArg for PathBuf {
    fn from_arg(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(raw: &str) -> Result<Self, String> {
        T::from_arg(raw).map(Some)
    }
}

// Comma separated, empty pieces skipped
impl<T: FromArg> FromArg for Vec<T> {
    fn from_arg(raw: &str) -> Result<Self, String> {
        raw.split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(T::from_arg)
            .collect()
    }
}

/// `--name value`, `--name=value` and bare `--flag` pairs, in the order given.
/// Dashes inside names are read as underscores so `--top-n` and `--top_n` agree.
#[derive(Debug, Default)]
pub struct Args {
    pairs: Vec<(String, Option<String>)>,
}

impl Args {
    pub fn from_env() -> Args {
        Args::parse(std::env::args().skip(1))
    }

    pub fn parse<I: IntoIterator<Item = String>>(raw: I) -> Args {
        let mut pairs = Vec::new();
        let mut raw = raw.into_iter().peekable();
        while let Some(arg) = raw.next() {
            let name = match arg.strip_prefix("--") {
                Some(name) => name,
                None => continue,
            };
            if let Some((name, value)) = name.split_once('=') {
                pairs.push((name.replace('-', "_"), Some(value.to_string())));
                continue;
            }
            let value = match raw.peek() {
                Some(next) if !next.starts_with("--") => raw.next(),
                _ => None,
            };
            pairs.push((name.replace('-', "_"), value));
        }
        Args { pairs }
    }

    fn last(&self, name: &str) -> Option<&Option<String>> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn flag(&self, name: &str) -> bool {
        match self.last(name) {
            Some(Some(value)) => value != "false" && value != "0",
            Some(None) => true,
            None => false,
        }
    }

    pub fn value<T: FromArg>(&self, name: &str) -> Result<Option<T>, String> {
        match self.last(name) {
            Some(Some(raw)) => T::from_arg(raw).map(Some),
            Some(None) => Err(format!("--{} expects a value", name)),
            None => Ok(None),
        }
    }
}

#[test]
fn test_parse_pairs() {
    let args = Args::parse(
        vec!["--top-n", "5", "--bottom", "--weights=1,3", "--min_date", "2013-06-01", "stray"]
            .into_iter()
            .map(String::from),
    );
    assert_eq!(args.value::<usize>("top_n").unwrap(), Some(5));
    assert!(args.flag("bottom"));
    assert!(!args.flag("verbose"));
    assert_eq!(args.value::<Vec<f64>>("weights").unwrap(), Some(vec![1.0, 3.0]));
    assert_eq!(
        args.value::<Option<String>>("min_date").unwrap(),
        Some(Some("2013-06-01".to_string()))
    );
    assert_eq!(args.value::<String>("max_date").unwrap(), None);
}

#[test]
fn test_bad_values() {
    let args = Args::parse(vec!["--top_n", "many", "--save_dir"].into_iter().map(String::from));
    assert!(args.value::<usize>("top_n").is_err());
    assert!(args.value::<PathBuf>("save_dir").is_err());
    assert!(args.flag("save_dir"));
}

#[test]
fn test_negative_numbers_are_values() {
    let args = Args::parse(vec!["--offset", "-3"].into_iter().map(String::from));
    assert_eq!(args.value::<i32>("offset").unwrap(), Some(-3));
}
