use tracing_subscriber::EnvFilter;

/// Maps `-v`/`-q` to a default log level. `RUST_LOG` takes precedence when set.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    if quiet {
        return tracing::Level::ERROR;
    }
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Installs the global subscriber. Logs go to stderr so stdout stays clean JSON.
pub fn init(verbose: u8, quiet: bool) {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(level_for(3, true), tracing::Level::ERROR);
        assert_eq!(level_for(0, false), tracing::Level::WARN);
        assert_eq!(level_for(2, false), tracing::Level::DEBUG);
        assert_eq!(level_for(9, false), tracing::Level::TRACE);
    }
}
