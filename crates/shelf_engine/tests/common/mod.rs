#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shelf_engine::{
    BrowserSession, FailureCapture, FixtureSite, HarvestSettings, HtmlElement, HtmlSession,
    SessionError, SiteSettings,
};
use tokio_util::sync::CancellationToken;

pub const SHOP: &str = "https://shop.test";
pub const SEARCH_PAGE: &str = "https://shop.test/search/";
pub const STAMP: &str = "2024-05-01_13-45-09-120";
/// Smallest valid PNG header, enough to check bytes land on disk.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn product_url(slug: &str) -> String {
    format!("{SHOP}/product/{slug}/")
}

/// Results grid as the marketplace renders it: relative links with tracking
/// parameters, plus an unrelated link outside the grid.
pub fn search_html(slugs: &[&str]) -> String {
    let tiles: String = slugs
        .iter()
        .map(|slug| format!(r#"<div class="tile"><a href="/product/{slug}/?asb=2&from=search">{slug}</a></div>"#))
        .collect();
    format!(
        r#"<html><body>
<a href="/product/banner-ad/">ad</a>
<div data-widget="tileGridDesktop">{tiles}</div>
</body></html>"#
    )
}

pub fn product_html(title: Option<&str>, price: Option<&str>, score: Option<&str>) -> String {
    let title = title.map(|t| format!("<h1>{t}</h1>")).unwrap_or_default();
    let price = price
        .map(|p| {
            format!(r#"<div data-widget="webPrice"><span class="tsHeadline600Large">{p}</span></div>"#)
        })
        .unwrap_or_default();
    let score = score
        .map(|s| format!(r#"<div data-widget="webSingleProductScore"><div>{s}</div></div>"#))
        .unwrap_or_default();
    format!("<html><body>{title}{price}{score}</body></html>")
}

pub fn settings(artifact_dir: &Path) -> HarvestSettings {
    let mut settings = HarvestSettings::default()
        .without_delays()
        .with_artifact_dir(artifact_dir);
    settings.site = SiteSettings {
        base_url: SHOP.to_string(),
        ..SiteSettings::default()
    };
    settings.collector.wait_timeout = Duration::from_millis(200);
    settings.extractor.title_timeout = Duration::from_millis(200);
    settings.navigation_timeout = Duration::from_secs(5);
    settings
}

pub fn fixed_capture(dir: &Path) -> FailureCapture {
    FailureCapture::with_stamp(dir, Arc::new(|| STAMP.to_string()))
}

/// A static-HTML session with injectable browser faults.
pub struct ScriptedSession {
    inner: HtmlSession<FixtureSite>,
    /// Selector whose waits time out once it has succeeded this many times.
    pub fail_wait: Option<(String, usize)>,
    wait_hits: AtomicUsize,
    /// `None` makes screenshots fail.
    pub screenshot: Option<Vec<u8>>,
    pub page_text_fails: bool,
    /// `current_url` never resolves.
    pub hang_current_url: bool,
    /// Cancelled on the first scroll.
    pub cancel_on_scroll: Option<CancellationToken>,
}

impl ScriptedSession {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            inner: HtmlSession::new(site),
            fail_wait: None,
            wait_hits: AtomicUsize::new(0),
            screenshot: Some(PNG.to_vec()),
            page_text_fails: false,
            hang_current_url: false,
            cancel_on_scroll: None,
        }
    }

    pub fn failing_wait(mut self, selector: &str, after: usize) -> Self {
        self.fail_wait = Some((selector.to_string(), after));
        self
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    type Element = HtmlElement;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.inner.navigate(url).await
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        if self.hang_current_url {
            std::future::pending::<()>().await;
        }
        self.inner.current_url().await
    }

    async fn page_text(&self) -> Result<String, SessionError> {
        if self.page_text_fails {
            return Err(SessionError::Script("document unavailable".to_string()));
        }
        self.inner.page_text().await
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<HtmlElement>, SessionError> {
        if let Some((failing, after)) = &self.fail_wait {
            if failing == selector && self.wait_hits.fetch_add(1, Ordering::SeqCst) >= *after {
                return Err(SessionError::timeout(selector, timeout));
            }
        }
        self.inner.wait_for_selector(selector, timeout).await
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<HtmlElement>, SessionError> {
        self.inner.find_all(selector).await
    }

    async fn attribute(
        &self,
        element: &HtmlElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        self.inner.attribute(element, name).await
    }

    async fn text(&self, element: &HtmlElement) -> Result<String, SessionError> {
        self.inner.text(element).await
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), SessionError> {
        if let Some(token) = &self.cancel_on_scroll {
            token.cancel();
        }
        self.inner.scroll_by(delta_y).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        self.screenshot
            .clone()
            .ok_or_else(|| SessionError::Script("renderer crashed".to_string()))
    }
}
