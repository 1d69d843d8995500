//! Tracing subscriber setup.
//!
//! Everything logs through `tracing` macros. The binary installs one `fmt`
//! subscriber at startup; `RUST_LOG` overrides the level chosen here.

use tracing_subscriber::EnvFilter;

/// Default filter: `info`, or `debug` for this crate with `--verbose`.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "info,imgserve=debug" } else { "info" }
}

/// Install the global subscriber. A second call is a no-op, so tests and
/// embedders that already set one up are left alone.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "info,imgserve=debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(false);
        init_logging(true);
    }
}
