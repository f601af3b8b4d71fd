//! Headless browser session and the page operations the scrapers rely on.
//!
//! Scraping logic only talks to [`PageQuery`], a deliberately small surface:
//! navigate, click, wait, scroll and pull structured data out of the page.
//! [`ChromePage`] implements it on top of `chromiumoxide`; tests implement it
//! with an in-memory page.
//!
//! A [`ChromeSession`] owns the browser process. Call [`ChromeSession::close`]
//! on every exit path so no Chromium processes are left behind.

use crate::error::ScrapeError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

/// Flags the digest has always launched Chromium with (container friendly).
pub const DEFAULT_LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

/// How often polling waits re-check the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Quiet period with no new network resources that counts as "idle".
const IDLE_QUIET: Duration = Duration::from_millis(500);

/// One post row as read from the page, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub points: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    /// The row is present but styled `display: none` by the active filter.
    #[serde(default)]
    pub hidden: bool,
}

/// One day section as read from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawDaySection {
    /// The section element id, normally a `YYYYMMDD` key.
    pub id: String,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// The page operations available to scrapers.
pub trait PageQuery {
    /// Navigate and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), ScrapeError>;

    /// Wait until `selector` matches something, or fail after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Wait until the page stops issuing network requests, or fail after `timeout`.
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), ScrapeError>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError>;

    /// Id of the last (oldest) loaded day section, if any is loaded.
    async fn oldest_section_id(&self) -> Result<Option<String>, ScrapeError>;

    /// Every loaded day section with its rows.
    async fn day_sections(&self) -> Result<Vec<RawDaySection>, ScrapeError>;
}

/// Launch options for the browser.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub launch_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// A running Chromium with a single page.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromePage,
}

impl ChromeSession {
    #[instrument(level = "info", skip_all, fields(headless = settings.headless))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        for arg in &settings.launch_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (mut browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shut_down(&mut browser).await;
                handler.abort();
                return Err(e.into());
            }
        };
        info!("Browser launched");

        Ok(Self {
            browser,
            handler,
            page: ChromePage { page },
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Shut the browser down and reap its process.
    #[instrument(level = "info", skip_all)]
    pub async fn close(mut self) {
        shut_down(&mut self.browser).await;
        if let Err(e) = self.handler.await {
            debug!(error = %e, "Browser handler task ended abnormally");
        }
        info!("Browser closed");
    }
}

/// The process-level controls [`shut_down`] needs from a browser.
trait BrowserProcess {
    /// Ask the browser to exit over CDP.
    async fn request_close(&mut self) -> Result<(), String>;

    /// Kill the child process; `None` when there is no child to kill.
    async fn force_kill(&mut self) -> Option<io::Result<()>>;

    /// Wait for the child process to exit.
    async fn reap(&mut self) -> io::Result<()>;
}

impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn force_kill(&mut self) -> Option<io::Result<()>> {
        self.kill().await
    }

    async fn reap(&mut self) -> io::Result<()> {
        self.wait().await.map(|_| ())
    }
}

/// Close the browser, killing it first if it refused, then reap it.
///
/// A browser that failed to close may be hung, and waiting on it would
/// block forever.
async fn shut_down<B: BrowserProcess>(browser: &mut B) {
    if let Err(e) = browser.request_close().await {
        warn!(error = %e, "Browser did not close cleanly; killing it");
        if let Some(Err(e)) = browser.force_kill().await {
            warn!(error = %e, "Failed to kill browser process");
        }
    }
    if let Err(e) = browser.reap().await {
        warn!(error = %e, "Failed waiting for browser process");
    }
}

/// [`PageQuery`] backed by a live Chromium page.
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, ScrapeError> {
        let result = self.page.evaluate(script).await?;
        result
            .into_value::<T>()
            .map_err(|e| ScrapeError::Script(e.to_string()))
    }
}

impl PageQuery for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout {
                    what: format!("selector {selector}"),
                    timeout_ms: timeout.as_millis(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), ScrapeError> {
        const RESOURCE_COUNT: &str = "performance.getEntriesByType('resource').length";

        let deadline = Instant::now() + timeout;
        let mut last_count: u64 = self.eval(RESOURCE_COUNT).await?;
        let mut quiet_since = Instant::now();
        loop {
            sleep(POLL_INTERVAL).await;
            let ready: bool = self.eval("document.readyState === 'complete'").await?;
            let count: u64 = self.eval(RESOURCE_COUNT).await?;
            if count != last_count || !ready {
                last_count = count;
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= IDLE_QUIET {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout {
                    what: "network idle".to_string(),
                    timeout_ms: timeout.as_millis(),
                });
            }
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn oldest_section_id(&self) -> Result<Option<String>, ScrapeError> {
        // The script answers "" rather than null when nothing is loaded yet
        let id: String = self.eval(crate::scrapers::hckrnews::OLDEST_SECTION_SCRIPT).await?;
        Ok(Some(id).filter(|id| !id.is_empty()))
    }

    async fn day_sections(&self) -> Result<Vec<RawDaySection>, ScrapeError> {
        self.eval(crate::scrapers::hckrnews::DAY_SECTIONS_SCRIPT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the order of shutdown calls.
    struct FakeProcess {
        close_fails: bool,
        calls: Vec<&'static str>,
    }

    impl BrowserProcess for FakeProcess {
        async fn request_close(&mut self) -> Result<(), String> {
            self.calls.push("close");
            if self.close_fails {
                Err("connection reset".to_string())
            } else {
                Ok(())
            }
        }

        async fn force_kill(&mut self) -> Option<io::Result<()>> {
            self.calls.push("kill");
            Some(Ok(()))
        }

        async fn reap(&mut self) -> io::Result<()> {
            self.calls.push("wait");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_close_kills_before_waiting() {
        let mut process = FakeProcess {
            close_fails: true,
            calls: Vec::new(),
        };
        shut_down(&mut process).await;
        assert_eq!(process.calls, vec!["close", "kill", "wait"]);
    }

    #[tokio::test]
    async fn test_clean_close_does_not_kill() {
        let mut process = FakeProcess {
            close_fails: false,
            calls: Vec::new(),
        };
        shut_down(&mut process).await;
        assert_eq!(process.calls, vec!["close", "wait"]);
    }

    #[test]
    fn test_default_settings_are_headless_with_container_flags() {
        let settings = BrowserSettings::default();
        assert!(settings.headless);
        assert!(settings.launch_args.iter().any(|a| a == "--no-sandbox"));
        assert_eq!(settings.launch_args.len(), 3);
    }

    #[test]
    fn test_raw_section_deserializes_page_payload() {
        let payload = r#"[{"id":"20261016","rows":[
            {"title":"A","url":"https://a.example","points":"120","comments":"33","hidden":false},
            {"title":"B","url":"https://b.example","points":"5","comments":null,"hidden":true}
        ]},{"id":"20261015"}]"#;

        let sections: Vec<RawDaySection> = serde_json::from_str(payload).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].rows.len(), 2);
        assert!(sections[0].rows[1].hidden);
        assert_eq!(sections[0].rows[1].comments, None);
        assert!(sections[1].rows.is_empty());
    }
}
