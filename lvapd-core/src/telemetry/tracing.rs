use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber for the binary. Call once,
/// at process startup.
pub fn init_tracing(log_level: &str, show_target: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(show_target);
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
