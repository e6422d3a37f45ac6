use tracing_subscriber::EnvFilter;

use crate::Tracer;

/// Subscriber for test binaries.
///
/// Output goes through the test harness writer, so it only shows for failing tests. `RUST_LOG`
/// wins over the fallback directives.
#[derive(Debug, Clone)]
pub struct TestTracer {
    fallback: String,
}

impl Default for TestTracer {
    fn default() -> Self {
        Self { fallback: "warn".to_string() }
    }
}

impl TestTracer {
    /// Sets the filter used when `RUST_LOG` is unset.
    pub fn with_fallback(mut self, directives: impl Into<String>) -> Self {
        self.fallback = directives.into();
        self
    }
}

impl Tracer for TestTracer {
    fn init(self) -> eyre::Result<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.fallback)?,
        };
        // another test in the same binary may have installed one already
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
        Ok(())
    }
}
