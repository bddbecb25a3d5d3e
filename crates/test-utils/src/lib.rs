//! Shared test utilities for the imagery-export workspace.
//!
//! Provides an in-memory [`ComputeService`](compute_client::ComputeService)
//! implementation plus scene fixtures, so orchestration crates can be
//! tested without a remote session.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod scenes;
pub mod service;

pub use scenes::{DatasetSeed, SceneSeed};
pub use service::InMemoryCompute;

/// Initialize tracing for tests. Honors `RUST_LOG`; safe to call from
/// every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
