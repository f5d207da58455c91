//! Real browser sessions over the WebDriver protocol.
//!
//! All browser configuration (headless mode, sandbox flags, geolocation,
//! profile directory, proxy) happens here when the session is opened. The
//! pipeline only ever sees a [`BrowserSession`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info, engine_warn};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::session::{BrowserSession, SessionError, SessionFactory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebDriverSettings {
    /// chromedriver / geckodriver endpoint.
    pub endpoint: String,
    pub headless: bool,
    pub proxy: Option<String>,
    pub user_data_dir: Option<PathBuf>,
    pub window_size: (u32, u32),
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9515".to_string(),
            headless: true,
            proxy: None,
            user_data_dir: None,
            window_size: (1920, 1080),
        }
    }
}

impl WebDriverSettings {
    fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--window-size={},{}", self.window_size.0, self.window_size.1),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }
        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy-server={proxy}"));
        }

        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "prefs": { "profile.default_content_setting_values.geolocation": 2 },
            }),
        );
        caps
    }
}

/// Opens one Chrome session per job against a running WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    settings: WebDriverSettings,
}

impl WebDriverFactory {
    pub fn new(settings: WebDriverSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    async fn open(&self) -> Result<WebDriverSession, SessionError> {
        engine_info!("Connecting to WebDriver at {}", self.settings.endpoint);
        if let Some(proxy) = &self.settings.proxy {
            engine_info!("Using proxy {}", proxy);
        }
        let mut builder = ClientBuilder::rustls()
            .map_err(|err| SessionError::Unavailable(err.to_string()))?;
        let client = builder
            .capabilities(self.settings.capabilities())
            .connect(&self.settings.endpoint)
            .await
            .map_err(|err| SessionError::Unavailable(err.to_string()))?;
        engine_info!("Browser session ready");
        Ok(WebDriverSession { client })
    }

    async fn close(&self, session: WebDriverSession) {
        match session.client.close().await {
            Ok(()) => engine_info!("Browser session closed"),
            Err(err) => engine_warn!("Browser session did not close cleanly: {}", err),
        }
    }
}

pub struct WebDriverSession {
    client: Client,
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        engine_debug!("goto {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|err| SessionError::navigation(url, err.to_string()))
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let url = self.client.current_url().await.map_err(map_cmd_error)?;
        Ok(url.to_string())
    }

    async fn page_text(&self) -> Result<String, SessionError> {
        self.client.source().await.map_err(map_cmd_error)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>, SessionError> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|err| match err {
                CmdError::WaitTimeout => SessionError::timeout(selector, timeout),
                other => map_cmd_error(other),
            })?;
        self.find_all(selector).await
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        match self.client.find_all(Locator::Css(selector)).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_miss() => Ok(Vec::new()),
            Err(err) => Err(map_cmd_error(err)),
        }
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, SessionError> {
        element.attr(name).await.map_err(map_cmd_error)
    }

    async fn text(&self, element: &Element) -> Result<String, SessionError> {
        element.text().await.map_err(map_cmd_error)
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), SessionError> {
        self.client
            .execute("window.scrollBy(0, arguments[0]);", vec![json!(delta_y)])
            .await
            .map(|_| ())
            .map_err(|err| SessionError::Script(err.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        self.client.screenshot().await.map_err(map_cmd_error)
    }
}

fn map_cmd_error(err: CmdError) -> SessionError {
    if err.is_miss() {
        return SessionError::InvalidSelector(err.to_string());
    }
    let message = err.to_string();
    if message.contains("stale element") {
        SessionError::StaleElement(message)
    } else if matches!(err, CmdError::WaitTimeout) {
        SessionError::timeout("browser", Duration::ZERO)
    } else {
        SessionError::Unavailable(message)
    }
}
