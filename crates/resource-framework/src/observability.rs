//! # Observability
//!
//! Every log line of the framework carries a `resource` field (and `code` for
//! single-record actions), so one resource's traffic can be isolated with
//! `RUST_LOG` and a field filter:
//!
//! ```text
//! INFO Actor started resource="users"
//! INFO Created resource="users" code="8f14e45f..."
//! WARN Follow-up failed resource="users" code="8f14e45f..." error=UnableToSendEmail: ...
//! ```
//!
//! Levels:
//! - `info`: actor lifecycle and committed mutations
//! - `warn`: failed actions, accessor timeouts, failed follow-ups
//! - `debug`: reads with cache outcome, request payloads
//! - `trace`: event fan-out

/// Installs the global subscriber. Reads the filter from `RUST_LOG`.
///
/// Call once, at process start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // the `resource` field already says where a line comes from
        .compact()
        .init();
}
