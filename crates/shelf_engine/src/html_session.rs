use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::session::{BrowserSession, SessionError, SessionFactory};

/// A page as delivered by a [`PageLoader`].
///
/// `frames` are successive renderings of the same page: frame 0 on load, each
/// downward scroll reveals the next one. Plain HTTP pages have one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub final_url: String,
    pub frames: Vec<String>,
}

#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<LoadedPage, SessionError>;
}

/// Snapshot of one element taken when it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

/// Session over static HTML: no scripting, no rendering, no screenshots.
///
/// Waiting cannot change a static document, so `wait_for_selector` answers
/// immediately.
pub struct HtmlSession<L> {
    loader: L,
    page: Option<LoadedPage>,
    frame: usize,
}

impl<L: PageLoader> HtmlSession<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            page: None,
            frame: 0,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    fn current_html(&self) -> Result<&str, SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NoPage)?;
        let last = page.frames.len().saturating_sub(1);
        page.frames
            .get(self.frame.min(last))
            .map(String::as_str)
            .ok_or(SessionError::NoPage)
    }
}

#[async_trait]
impl<L: PageLoader> BrowserSession for HtmlSession<L> {
    type Element = HtmlElement;

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let page = self.loader.load(url).await?;
        self.page = Some(page);
        self.frame = 0;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.page
            .as_ref()
            .map(|p| p.final_url.clone())
            .ok_or(SessionError::NoPage)
    }

    async fn page_text(&self) -> Result<String, SessionError> {
        self.current_html().map(str::to_string)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<HtmlElement>, SessionError> {
        let found = select_elements(self.current_html()?, selector)?;
        if found.is_empty() {
            return Err(SessionError::timeout(selector, timeout));
        }
        Ok(found)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<HtmlElement>, SessionError> {
        select_elements(self.current_html()?, selector)
    }

    async fn attribute(
        &self,
        element: &HtmlElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(element
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone()))
    }

    async fn text(&self, element: &HtmlElement) -> Result<String, SessionError> {
        Ok(element.text.clone())
    }

    async fn scroll_by(&mut self, delta_y: i64) -> Result<(), SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NoPage)?;
        let last = page.frames.len().saturating_sub(1);
        if delta_y > 0 {
            self.frame = (self.frame + 1).min(last);
        } else if delta_y < 0 {
            self.frame = self.frame.saturating_sub(1);
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        Err(SessionError::Unsupported("screenshot"))
    }
}

/// Hands every job a fresh [`HtmlSession`] over a clone of one loader.
#[derive(Debug, Clone)]
pub struct HtmlSessionFactory<L> {
    loader: L,
}

impl<L: PageLoader + Clone + 'static> HtmlSessionFactory<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

#[async_trait]
impl<L: PageLoader + Clone + 'static> SessionFactory for HtmlSessionFactory<L> {
    type Session = HtmlSession<L>;

    async fn open(&self) -> Result<HtmlSession<L>, SessionError> {
        Ok(HtmlSession::new(self.loader.clone()))
    }

    async fn close(&self, _session: HtmlSession<L>) {}
}

fn select_elements(html: &str, selector: &str) -> Result<Vec<HtmlElement>, SessionError> {
    let parsed = Selector::parse(selector)
        .map_err(|err| SessionError::InvalidSelector(format!("{selector}: {err:?}")))?;
    let document = Html::parse_document(html);
    Ok(document.select(&parsed).map(snapshot).collect())
}

fn snapshot(element: ElementRef<'_>) -> HtmlElement {
    let value = element.value();
    HtmlElement {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(key, val)| (key.to_string(), val.to_string()))
            .collect(),
        text: normalize_text(element.text()),
    }
}

/// Join text nodes and collapse whitespace runs, roughly like `innerText`.
fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{normalize_text, select_elements};
    use crate::SessionError;

    #[test]
    fn text_whitespace_is_collapsed() {
        let parts = ["  4.8 ", "\n•\t", " 12  отзывов "];
        assert_eq!(normalize_text(parts.into_iter()), "4.8 • 12 отзывов");
    }

    #[test]
    fn invalid_selector_is_reported() {
        let err = select_elements("<p>x</p>", "div[").unwrap_err();
        assert!(matches!(err, SessionError::InvalidSelector(_)));
    }

    #[test]
    fn nested_selector_matches_scoped_links() {
        let html = r#"<div data-widget="tileGridDesktop"><a href="/product/1">one</a></div>
                      <a href="/product/2">outside</a>"#;
        let found = select_elements(html, "div[data-widget='tileGridDesktop'] a").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "one");
        assert_eq!(found[0].attrs, vec![("href".to_string(), "/product/1".to_string())]);
    }
}
