//! Tracing subscriber setup for the command line tools.

use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `cheque_intake=debug` with
/// `verbose`. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "cheque_intake=debug,info"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
