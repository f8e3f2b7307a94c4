//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server crate only talks to `service`.

/// Warn about a missing frontend directory or pages; returns the missing page names.
pub async fn ensure_frontend(frontend_dir: &str) -> anyhow::Result<Vec<&'static str>> {
    common::env::ensure_frontend(frontend_dir).await
}
