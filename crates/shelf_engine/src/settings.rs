use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use shelf_core::DEFAULT_SCORE_SEPARATOR;

/// Inclusive range for a randomized pause. `ZERO` disables pausing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: Self = Self {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if hi.is_zero() || lo == hi {
            return hi;
        }
        let millis = rand::rng().random_range(lo.as_millis()..=hi.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub async fn pause(&self) {
        let wait = self.sample();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Where the catalogue lives and how a search URL is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub base_url: String,
    pub search_path: String,
    /// Extra fixed query pairs appended after the search text.
    pub search_params: Vec<(String, String)>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.ozon.ru".to_string(),
            search_path: "/search/".to_string(),
            search_params: vec![("from_global".to_string(), "true".to_string())],
        }
    }
}

impl SiteSettings {
    pub fn search_url(&self, query: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?.join(&self.search_path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("text", query);
            for (key, value) in &self.search_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorSettings {
    pub results_selector: String,
    /// Matched inside the results container.
    pub link_selector: String,
    /// How many links to gather before extraction starts. `None` gathers
    /// exactly as many as the request extracts.
    pub link_target: Option<usize>,
    pub wait_timeout: Duration,
    /// Upper bound for reading the URL, one link list or one href.
    pub read_timeout: Duration,
    pub scroll_delta: i64,
    pub scroll_pause: DelayRange,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            results_selector: "div[data-widget='tileGridDesktop']".to_string(),
            link_selector: "a[href*='/product/']".to_string(),
            link_target: None,
            wait_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(20),
            scroll_delta: 1200,
            scroll_pause: DelayRange::secs(3, 5),
        }
    }
}

impl CollectorSettings {
    pub(crate) fn scoped_link_selector(&self) -> String {
        format!("{} {}", self.results_selector, self.link_selector)
    }

    /// Link cap for a run that extracts `max_items` records.
    pub fn link_target_for(&self, max_items: usize) -> usize {
        self.link_target.unwrap_or(max_items).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorSettings {
    pub title_selector: String,
    pub title_timeout: Duration,
    /// Upper bound for the location, each lookup and each text read.
    pub read_timeout: Duration,
    pub price_selector: String,
    pub score_selector: String,
    pub score_separator: char,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            title_selector: "h1".to_string(),
            title_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            price_selector: "div[data-widget='webPrice'] span.tsHeadline600Large".to_string(),
            score_selector: "div[data-widget='webSingleProductScore'] div".to_string(),
            score_separator: DEFAULT_SCORE_SEPARATOR,
        }
    }
}

/// Everything the pipeline needs besides the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSettings {
    pub site: SiteSettings,
    pub collector: CollectorSettings,
    pub extractor: ExtractorSettings,
    /// Upper bound for a single `navigate` call.
    pub navigation_timeout: Duration,
    /// Upper bound for opening or closing a session.
    pub session_timeout: Duration,
    /// Per artifact, screenshot and page dump each.
    pub capture_timeout: Duration,
    pub product_pause: DelayRange,
    pub artifact_dir: PathBuf,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            site: SiteSettings::default(),
            collector: CollectorSettings::default(),
            extractor: ExtractorSettings::default(),
            navigation_timeout: Duration::from_secs(30),
            session_timeout: Duration::from_secs(60),
            capture_timeout: Duration::from_secs(20),
            product_pause: DelayRange::secs(2, 4),
            artifact_dir: PathBuf::from("static").join("debug"),
        }
    }
}

impl HarvestSettings {
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Same settings with every pacing pause removed.
    pub fn without_delays(mut self) -> Self {
        self.collector.scroll_pause = DelayRange::ZERO;
        self.product_pause = DelayRange::ZERO;
        self
    }
}
