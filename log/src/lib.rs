use std::sync::Mutex;

use slog::Drain;
use slog::{Discard, Fuse};
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Level, Logger};

/// Builds the root logger: JSON lines on stderr, written from a
/// background thread and tagged with the build information.
///
/// Records below `level` are dropped. With the `env_logging` feature,
/// `RUST_LOG` filters on top of that.
pub fn initialize_logger(level: Level) -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = Async::new(drain).build().fuse();

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain).fuse();

    let drain = drain.filter_level(level).fuse();

    Logger::root(
        drain,
        o!("version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP),
    )
}

/// Parses a level name such as `debug` or `warning`, falling back to
/// `Info` for anything unrecognized.
pub fn parse_level(name: &str) -> Level {
    name.parse().unwrap_or(Level::Info)
}

/// A logger that swallows everything, for tests and helpers.
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

#[cfg(test)]
mod tests {
    use super::{parse_level, Level};

    #[test]
    fn level_names_are_parsed() {
        assert_eq!(parse_level("debug"), Level::Debug);
        assert_eq!(parse_level("warn"), Level::Warning);
        assert_eq!(parse_level("nonsense"), Level::Info);
    }
}
