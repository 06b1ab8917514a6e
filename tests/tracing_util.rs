use tracing_subscriber::EnvFilter;

/// Scoped tracing for one test: installs a thread-default subscriber that
/// writes through the libtest capture buffer and is torn down when the
/// guard drops.
pub struct TestTracing {
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let filter = EnvFilter::try_from_env("RESTLINK_LOG")
            .unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}
