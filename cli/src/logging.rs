use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "larder=info,larder_core=info";
const VERBOSE_FILTER: &str = "larder=debug,larder_core=debug";

/// Filter directive used when `RUST_LOG` is unset.
pub(crate) fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays clean. `RUST_LOG` wins over `--verbose`.
pub(crate) fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
