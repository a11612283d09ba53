// ABOUTME: Tracing subscriber setup for the CLI
// ABOUTME: RUST_LOG controls verbosity; logs go to stderr so command output stays clean

use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

pub fn init_logging(verbose: bool) {
    // A second init (tests, embedding) is harmless, so the result is ignored
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
