//! Logging setup on top of `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
pub fn init(default_filter: &str) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(default_filter))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.try_init();
}

/// Map a `-v` count onto a filter directive
pub fn filter_for_verbosity(verbosity: u8, configured: &str) -> String {
	match verbosity {
		0 => configured.to_string(),
		1 => "debug".to_string(),
		_ => "trace".to_string(),
	}
}
