// 📝 Logging - tracing subscriber for the binaries
//
// RUST_LOG overrides the default `info` level, e.g.
//   RUST_LOG=bike_rental_reports=debug bike-reports report all

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. Logs go to stderr so report output on
/// stdout stays pipeable. Safe to call more than once.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
