use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const QUERY_PREFIX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    Query { text: String },
    AnalogsOf { seed_url: String },
}

/// What the caller wants harvested. Built once, consumed by one workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRequest {
    pub kind: RequestKind,
    pub pages: u32,
    pub max_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("seed url is not an absolute http(s) url: {0}")]
    InvalidSeedUrl(String),
    #[error("pages must be at least 1")]
    ZeroPages,
    #[error("max items must be at least 1")]
    ZeroItems,
}

impl CollectionRequest {
    pub fn query(text: impl Into<String>, pages: u32, max_items: usize) -> Self {
        Self {
            kind: RequestKind::Query { text: text.into() },
            pages,
            max_items,
        }
    }

    pub fn analogs_of(seed_url: impl Into<String>, pages: u32, max_items: usize) -> Self {
        Self {
            kind: RequestKind::AnalogsOf {
                seed_url: seed_url.into(),
            },
            pages,
            max_items,
        }
    }

    /// Classify free-form user input: an absolute http(s) URL asks for
    /// analogs of that product, anything else is a search query.
    pub fn from_input(input: &str, pages: u32, max_items: usize) -> Self {
        let trimmed = input.trim();
        let is_url = trimmed.starts_with("http")
            && Url::parse(trimmed).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
        if is_url {
            Self::analogs_of(trimmed, pages, max_items)
        } else {
            Self::query(trimmed, pages, max_items)
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.pages == 0 {
            return Err(RequestError::ZeroPages);
        }
        if self.max_items == 0 {
            return Err(RequestError::ZeroItems);
        }
        match &self.kind {
            RequestKind::Query { text } if text.trim().is_empty() => Err(RequestError::EmptyQuery),
            RequestKind::Query { .. } => Ok(()),
            RequestKind::AnalogsOf { seed_url } => match Url::parse(seed_url.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
                _ => Err(RequestError::InvalidSeedUrl(seed_url.clone())),
            },
        }
    }

    /// File name prefix for saved results: `analogs`, or `query_` followed by
    /// the first characters of the query with spaces replaced.
    pub fn result_prefix(&self) -> String {
        match &self.kind {
            RequestKind::AnalogsOf { .. } => "analogs".to_string(),
            RequestKind::Query { text } => {
                let short: String = text
                    .trim()
                    .replace(' ', "_")
                    .chars()
                    .take(QUERY_PREFIX_CHARS)
                    .collect();
                format!("query_{short}")
            }
        }
    }
}
