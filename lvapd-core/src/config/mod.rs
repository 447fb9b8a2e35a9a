//! Layered TOML configuration, split into small per-concern structs the
//! way a reverse proxy's config layer does it.

mod loader;
mod root;
mod security;
mod telemetry;
mod timeout;

pub use loader::{load_from_path, validate_config};
pub use root::Config;
pub use security::{IpFilterConfig, IpFilterMode, SecurityConfig};
pub use telemetry::LoggingConfig;
pub use timeout::TimeoutConfig;
