//! `shelf`: harvest product records from a marketplace catalogue.

mod run;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use engine_logging::{level_from_verbosity, LogDestination};
use shelf_core::CollectionRequest;
use shelf_engine::HarvestSettings;

use crate::run::{Backend, BrowserOptions, RunPlan};
use crate::settings::SettingsFile;

const DEFAULT_PAGES: u32 = 1;
const DEFAULT_MAX_ITEMS: usize = 5;
const DEFAULT_OUTPUT_DIR: &str = "results";
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const LOG_FILE: &str = "shelf.log";

#[derive(Debug, Parser)]
#[command(
    name = "shelf",
    version,
    about = "Collect product records from catalogue searches or find analogs of a product"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Search result scroll iterations.
    #[arg(long, global = true, value_name = "N")]
    pages: Option<u32>,

    /// Maximum products (or analogs) to extract.
    #[arg(long, global = true, value_name = "N")]
    max_items: Option<usize>,

    #[arg(long, global = true, value_enum, default_value_t = Backend::default())]
    backend: Backend,

    #[arg(long, global = true, value_name = "URL")]
    webdriver_url: Option<String>,

    #[arg(long, global = true, value_name = "BOOL", action = ArgAction::Set)]
    headless: Option<bool>,

    #[arg(long, global = true, value_name = "URL")]
    proxy: Option<String>,

    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Where screenshots and page dumps of failures go.
    #[arg(long, global = true, value_name = "DIR")]
    debug_dir: Option<PathBuf>,

    /// Skip the randomized pauses between scrolls and product pages.
    #[arg(long, global = true, default_value_t = false)]
    no_delay: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogArg::Terminal)]
    log: LogArg,

    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search the catalogue and extract the first products found.
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Extract a product, then search for analogs by its title.
    Analogs { url: String },
    /// Read mode, input and limits from a settings file.
    Run {
        #[arg(long, value_name = "FILE", default_value = "settings.json")]
        settings: PathBuf,
    },
    /// A product URL means analogs, anything else a query.
    Auto {
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(value: LogArg) -> Self {
        match value {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(
        cli.log.into(),
        level_from_verbosity(cli.verbose),
        Path::new(LOG_FILE),
    );
    let plan = build_plan(cli)?;
    run::execute(plan)
}

/// Merge command line, settings file and defaults. Flags win over the file.
fn build_plan(cli: Cli) -> anyhow::Result<RunPlan> {
    let file = match &cli.command {
        Command::Run { settings } => Some(
            SettingsFile::load(settings)
                .with_context(|| format!("cannot use settings {}", settings.display()))?,
        ),
        _ => None,
    };

    let file_limits = file.as_ref().map(|f| &f.parse_settings);
    let pages = cli
        .pages
        .or(file_limits.map(|p| p.pages_to_parse))
        .unwrap_or(DEFAULT_PAGES);
    let max_items = cli
        .max_items
        .or(file_limits.map(|p| p.max_analogs_or_products))
        .unwrap_or(DEFAULT_MAX_ITEMS);

    let mut request = match &cli.command {
        Command::Query { text } => CollectionRequest::query(text.join(" "), pages, max_items),
        Command::Analogs { url } => CollectionRequest::analogs_of(url.clone(), pages, max_items),
        Command::Auto { input } => CollectionRequest::from_input(&input.join(" "), pages, max_items),
        Command::Run { .. } => match &file {
            Some(file) => file.request()?,
            None => anyhow::bail!("settings file was not loaded"),
        },
    };
    request.pages = pages;
    request.max_items = max_items;

    let mut harvest = HarvestSettings::default();
    if let Some(dir) = cli
        .debug_dir
        .clone()
        .or_else(|| file.as_ref().and_then(|f| f.debug_dir.clone()))
    {
        harvest = harvest.with_artifact_dir(dir);
    }
    if cli.no_delay {
        harvest = harvest.without_delays();
    }

    let browser = BrowserOptions {
        webdriver_url: cli
            .webdriver_url
            .or_else(|| file.as_ref().and_then(|f| f.webdriver_url.clone()))
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
        headless: cli
            .headless
            .or(file.as_ref().and_then(|f| f.headless))
            .unwrap_or(true),
        proxy: cli
            .proxy
            .or_else(|| file.as_ref().and_then(|f| f.proxy.clone())),
    };

    let output_dir = cli
        .output_dir
        .or_else(|| file.as_ref().and_then(|f| f.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    Ok(RunPlan {
        request,
        harvest,
        backend: cli.backend,
        browser,
        output_dir,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use shelf_core::{CollectionRequest, RequestKind};

    use super::{build_plan, Cli};

    fn plan(args: &[&str]) -> super::RunPlan {
        build_plan(Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn query_words_are_joined() {
        let plan = plan(&["shelf", "query", "wireless", "mouse", "--max-items", "3"]);
        assert_eq!(plan.request, CollectionRequest::query("wireless mouse", 1, 3));
        assert_eq!(plan.output_dir, std::path::PathBuf::from("results"));
    }

    #[test]
    fn auto_detects_product_urls() {
        let plan = plan(&["shelf", "auto", "https://www.ozon.ru/product/mouse-1/", "--pages", "2"]);
        assert!(matches!(plan.request.kind, RequestKind::AnalogsOf { .. }));
        assert_eq!(plan.request.pages, 2);
    }

    #[test]
    fn no_delay_zeroes_pauses() {
        let plan = plan(&["shelf", "--no-delay", "analogs", "https://www.ozon.ru/product/x-1/"]);
        assert!(plan.harvest.product_pause.max.is_zero());
        assert!(plan.harvest.collector.scroll_pause.max.is_zero());
    }

    #[test]
    fn settings_file_limits_yield_to_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "run_mode": "query", "input_query": "кофемолка",
                 "parse_settings": { "pages_to_parse": 4, "max_analogs_or_products": 9 },
                 "debug_dir": "dbg" }"#,
        )
        .unwrap();

        let plan = plan(&["shelf", "run", "--settings", path.to_str().unwrap(), "--pages", "2"]);

        assert_eq!(plan.request, CollectionRequest::query("кофемолка", 2, 9));
        assert_eq!(plan.harvest.artifact_dir, std::path::PathBuf::from("dbg"));
    }
}
