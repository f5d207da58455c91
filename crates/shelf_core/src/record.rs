use serde::{Deserialize, Serialize};

use crate::ScoreLine;

/// One harvested product.
///
/// `url` is always canonical and non-empty. A record without a title is kept;
/// the missing title is how a failed product-page parse shows up.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    pub title: Option<String>,
    pub price: Option<u64>,
    pub rating: Option<f32>,
    pub reviews_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_seed: Option<bool>,
}

impl ProductRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn apply_score(&mut self, score: ScoreLine) {
        self.rating = score.rating;
        self.reviews_count = score.reviews_count;
    }
}
