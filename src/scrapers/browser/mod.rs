//! Headless browser rendering for client-rendered sites.
//!
//! A browser is opened for exactly one enhanced extraction and closed again
//! before the result is returned. [`with_browser_page`] is the only place a
//! session is acquired, so release happens on every exit path.

mod config;

#[cfg(feature = "browser")]
mod chromium;

pub use config::BrowserEngineConfig;

#[cfg(feature = "browser")]
pub use chromium::ChromiumLauncher;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// Opens browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

/// One open browser.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, wait for the page to settle and return its DOM.
    async fn render(&mut self, url: &str) -> Result<String, ScrapeError>;

    /// Release the browser. Called exactly once per session.
    async fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Acquire a browser, render `url`, hand the DOM to `use_page`, release.
///
/// Errors from rendering or from `use_page` are returned after the session
/// has been closed; a failure to close is logged and does not mask them.
pub async fn with_browser_page<T, F>(
    launcher: &dyn BrowserLauncher,
    url: &str,
    use_page: F,
) -> Result<T, ScrapeError>
where
    F: FnOnce(&str) -> Result<T, ScrapeError>,
{
    let mut session = launcher.launch().await?;
    debug!(url, "Browser session opened");

    let outcome = match session.render(url).await {
        Ok(html) => use_page(&html),
        Err(e) => Err(e),
    };

    if let Err(e) = session.close().await {
        warn!(url, error = %e, "Failed to close browser session");
    } else {
        debug!(url, "Browser session closed");
    }

    outcome
}

/// Launcher used when the crate is built without the `browser` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLauncher;

#[async_trait]
impl BrowserLauncher for UnavailableLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        Err(ScrapeError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

/// The launcher matching how the crate was built.
pub fn default_launcher(config: BrowserEngineConfig) -> std::sync::Arc<dyn BrowserLauncher> {
    #[cfg(feature = "browser")]
    {
        std::sync::Arc::new(ChromiumLauncher::new(config))
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = config;
        std::sync::Arc::new(UnavailableLauncher)
    }
}
