//! Plumbing shared by the terminal tools: argument declarations, the stdin
//! line loop and the stderr logger.

mod args;
pub mod logger;

pub use args::{Args, FromArg};

// Reached through the macros only, so a glob import of this crate does not
// shadow the tool's own `log`.
#[doc(hidden)]
pub mod __private {
    pub use linereader;
    pub use log;
}

/// What a tool body may hand back. `()` means success; an `Err` is logged and
/// the process exits with status 1.
pub trait Finish {
    fn finish(self);
}

impl Finish for () {
    fn finish(self) {}
}

impl<E: std::fmt::Display> Finish for Result<(), E> {
    fn finish(self) {
        if let Err(e) = self {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

pub fn bail(msg: &str) -> ! {
    log::error!("{}", msg);
    std::process::exit(2)
}

/// Drops the trailing `\n` (and `\r`) that the line reader leaves on each line.
pub fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// Declares the command-line arguments of a tool and runs its body.
///
/// ```ignore
/// tool! {
///     args:
///         - bottom;                          // flag, false unless given
///         - top_n: usize = 10;               // optional with default
///         - input: String;                   // required
///     ;
///     body: || {
///         println!("{} {} {}", bottom, top_n, input);
///     }
/// }
/// ```
///
/// `--verbose` always switches the logger to debug, declared or not.
#[macro_export]
macro_rules! tool {
    (
        args:
            $(- $name:ident $(: $ty:ty $(= $default:expr)?)?;)*
        ;
        body: || $body:block
    ) => {{
        let __args = $crate::Args::from_env();
        $crate::logger::init(__args.flag("verbose"));
        if __args.flag("help") {
            eprintln!("arguments:");
            $(
                eprintln!("    --{}", stringify!($name $(: $ty $(= $default)?)?));
            )*
            return;
        }
        $(
            $crate::__tool_arg!(__args, $name $(: $ty $(= $default)?)?);
        )*
        #[allow(unused_mut)]
        let mut __body = || $body;
        $crate::Finish::finish(__body());
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __tool_arg {
    ($args:ident, $name:ident) => {
        let $name: bool = $args.flag(stringify!($name));
    };
    ($args:ident, $name:ident : $ty:ty = $default:expr) => {
        let $name: $ty = match $args.value::<$ty>(stringify!($name)) {
            Ok(Some(value)) => value,
            Ok(None) => $default,
            Err(e) => $crate::bail(&e),
        };
    };
    ($args:ident, $name:ident : $ty:ty) => {
        let $name: $ty = match $args.value::<$ty>(stringify!($name)) {
            Ok(Some(value)) => value,
            Ok(None) => $crate::bail(&format!("missing --{}", stringify!($name))),
            Err(e) => $crate::bail(&e),
        };
    };
}

/// Feeds every stdin line (without its newline) to the closure. The first
/// argument names a buffered stdout writer the closure may write to; it is
/// flushed once stdin is exhausted.
#[macro_export]
macro_rules! readin {
    ($wtr:ident, $on_line:expr) => {{
        #[allow(unused_imports)]
        use std::io::Write;
        let __stdin = std::io::stdin();
        let mut __reader = $crate::__private::linereader::LineReader::new(__stdin.lock());
        let __stdout = std::io::stdout();
        #[allow(unused_mut)]
        let mut $wtr = std::io::BufWriter::new(__stdout.lock());
        {
            let mut __on_line = $on_line;
            while let Some(__line) = __reader.next_line() {
                match __line {
                    Ok(__line) => __on_line($crate::trim_line(__line)),
                    Err(e) => {
                        $crate::__private::log::error!("stdin: {}", e);
                        break;
                    }
                }
            }
        }
        let _ = $wtr.flush();
    }};
}

#[test]
fn test_trim_line() {
    assert_eq!(trim_line(b"abc\n"), b"abc");
    assert_eq!(trim_line(b"abc\r\n"), b"abc");
    assert_eq!(trim_line(b"abc"), b"abc");
    assert_eq!(trim_line(b"\n"), b"");
}
