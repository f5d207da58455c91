//! `settings.json` runner configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shelf_core::CollectionRequest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("run_mode \"{0}\" needs a non-empty \"{1}\"")]
    MissingInput(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Query,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParseSettings {
    #[serde(default = "default_pages")]
    pub pages_to_parse: u32,
    #[serde(default = "default_max_items")]
    pub max_analogs_or_products: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            pages_to_parse: default_pages(),
            max_analogs_or_products: default_max_items(),
        }
    }
}

fn default_pages() -> u32 {
    1
}

fn default_max_items() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsFile {
    pub run_mode: RunMode,
    #[serde(default)]
    pub input_query: Option<String>,
    #[serde(default)]
    pub input_url: Option<String>,
    #[serde(default)]
    pub parse_settings: ParseSettings,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default)]
    pub headless: Option<bool>,
    #[serde(default)]
    pub proxy: Option<String>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The request this file describes. The input for the selected mode must
    /// be present; the other one is ignored.
    pub fn request(&self) -> Result<CollectionRequest, SettingsError> {
        let pages = self.parse_settings.pages_to_parse;
        let max_items = self.parse_settings.max_analogs_or_products;
        match self.run_mode {
            RunMode::Query => non_empty(&self.input_query)
                .map(|text| CollectionRequest::query(text, pages, max_items))
                .ok_or(SettingsError::MissingInput("query", "input_query")),
            RunMode::Url => non_empty(&self.input_url)
                .map(|url| CollectionRequest::analogs_of(url, pages, max_items))
                .ok_or(SettingsError::MissingInput("url", "input_url")),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
