//! chromiumoxide (CDP) implementation of the browser seam.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{BrowserEngineConfig, BrowserLauncher, BrowserSession};
use crate::error::ScrapeError;

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

fn browser_error(context: &str, e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Browser(format!("{}: {}", context, e))
}

/// Find a Chrome executable on disk or in PATH.
fn find_chrome() -> Result<PathBuf, ScrapeError> {
    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            debug!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(cmd) {
            debug!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(ScrapeError::Browser(
        "Chrome/Chromium not found. Install it or set BROWSER_URL to a remote DevTools endpoint"
            .to_string(),
    ))
}

/// Launches a fresh Chrome per session, or connects to a remote one.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserEngineConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }

    fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        })
    }

    async fn launch_local(&self) -> Result<ChromiumSession, ScrapeError> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| browser_error("Failed to build browser config", e))?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| browser_error("Failed to launch browser", e))?;

        Ok(ChromiumSession {
            browser,
            handler: Self::spawn_handler(handler),
            config: self.config.clone(),
            remote: false,
        })
    }

    async fn connect_remote(&self, url: &str) -> Result<ChromiumSession, ScrapeError> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(self.config.navigation_timeout())
            .send()
            .await
            .map_err(|e| browser_error("Failed to connect to remote browser", e))?
            .json()
            .await
            .map_err(|e| browser_error("Failed to parse browser version info", e))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::Browser("No webSocketDebuggerUrl in response".into()))?;

        let (browser, handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| browser_error("Failed to connect to remote browser", e))?;

        Ok(ChromiumSession {
            browser,
            handler: Self::spawn_handler(handler),
            config: self.config.clone(),
            remote: true,
        })
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let session = match self.config.remote_url.clone() {
            Some(url) => self.connect_remote(&url).await?,
            None => self.launch_local().await?,
        };
        Ok(Box::new(session))
    }
}

/// One open Chrome instance (or remote connection).
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    config: BrowserEngineConfig,
    remote: bool,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn render(&mut self, url: &str) -> Result<String, ScrapeError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error("Failed to open page", e))?;

        info!("Navigating to {}", url);
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        let timeout = self.config.navigation_timeout();
        let navigated = tokio::time::timeout(timeout, navigation).await;
        let result = match navigated {
            Err(_) => Err(ScrapeError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(browser_error("Navigation failed", e)),
            Ok(Ok(())) => {
                // Client-rendered content keeps arriving after the load event
                tokio::time::sleep(self.config.settle_delay()).await;
                page.content()
                    .await
                    .map_err(|e| browser_error("Failed to read page content", e))
            }
        };

        // Close the page to prevent tab accumulation
        let _ = page.close().await;
        result
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        let closed = if self.remote {
            Ok(())
        } else {
            let closed = self
                .browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| browser_error("Failed to close browser", e));
            let _ = tokio::time::timeout(Duration::from_secs(5), self.browser.wait()).await;
            closed
        };
        self.handler.abort();
        closed
    }
}
