use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};

use crate::decode::decode_page;
use crate::html_session::{LoadedPage, PageLoader};
use crate::session::SessionError;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 8 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            accept_language: "ru-RU,ru;q=0.9,en;q=0.6".to_string(),
        }
    }
}

/// Loads pages with plain HTTP GETs. No JavaScript runs, so pages that build
/// their product grid client-side come back without it.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(settings: FetchSettings) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| SessionError::Unavailable(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait]
impl PageLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<LoadedPage, SessionError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| SessionError::navigation(url, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .header(ACCEPT_LANGUAGE, self.settings.accept_language.as_str())
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, err, self.settings.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::navigation(url, format!("http status {}", status.as_u16())));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(SessionError::navigation(
                    url,
                    format!("response too large (max {}, actual {content_len})", self.settings.max_bytes),
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(SessionError::navigation(url, format!("unsupported content type {ct}")));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(url, err, self.settings.request_timeout))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(SessionError::navigation(
                    url,
                    format!("response too large (max {}, actual {next_len})", self.settings.max_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let html = decode_page(&bytes, content_type.as_deref())?;
        Ok(LoadedPage {
            final_url,
            frames: vec![html],
        })
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error, waited: Duration) -> SessionError {
    if err.is_timeout() {
        return SessionError::timeout(url, waited);
    }
    if err.is_redirect() {
        return SessionError::navigation(url, "redirect limit exceeded");
    }
    SessionError::Network(err.to_string())
}
