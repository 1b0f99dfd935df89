use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `-v`/`-q` win over `RUST_LOG`, which in
/// turn wins over the `info` default. A second call is a no-op.
pub fn init(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
