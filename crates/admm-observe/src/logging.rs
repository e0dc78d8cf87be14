use tracing_subscriber::EnvFilter;

/// Initializes a `tracing_subscriber` using `ADMM_LOG` first, then `RUST_LOG`, then a default.
///
/// Log field contract for the optimization driver:
/// - Always include `iteration` on round-level events.
/// - Include `status` once a round's convergence status has been read.
/// - Include `signal_data` and `output_base` once per run (the run span).
/// - Include `splits` on any split-planning event.
pub fn init_tracing() {
    let filter = env_filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("ADMM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
