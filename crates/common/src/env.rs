//! Environment/runtime helpers
//!
//! Sanity checks run once at startup.

use std::path::Path;

use tracing::warn;

/// Page files the HTTP surface expects inside the frontend directory.
pub const REQUIRED_PAGES: [&str; 2] = ["index.html", "tracker.html"];

/// Check the frontend directory and its pages; missing ones are only warned about,
/// the server still starts and those routes will 404.
///
/// Returns the names of the pages that could not be found.
pub async fn ensure_frontend(frontend_dir: &str) -> anyhow::Result<Vec<&'static str>> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend directory not found; pages will 404");
        return Ok(REQUIRED_PAGES.to_vec());
    }
    let mut missing = Vec::new();
    for page in REQUIRED_PAGES {
        let path = Path::new(frontend_dir).join(page);
        if tokio::fs::metadata(&path).await.is_err() {
            warn!(page = %path.display(), "frontend page missing");
            missing.push(page);
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_reports_every_page() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("frontend_{}", uuid::Uuid::new_v4()));
        let missing = ensure_frontend(&dir.to_string_lossy()).await?;
        assert_eq!(missing, REQUIRED_PAGES.to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn partial_directory_reports_missing_page() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("frontend_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("index.html"), "<html></html>").await?;

        let missing = ensure_frontend(&dir.to_string_lossy()).await?;
        assert_eq!(missing, vec!["tracker.html"]);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
