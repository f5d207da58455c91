use std::path::PathBuf;

use anyhow::Context;
use clap::ValueEnum;
use engine_logging::{engine_info, engine_warn};
use shelf_core::{CollectionRequest, HarvestResult};
use shelf_engine::{
    save_results, EngineHandle, FetchSettings, HarvestEvent, HarvestSettings, HtmlSessionFactory,
    HttpLoader, SessionFactory, RESULT_STAMP_FORMAT,
};

const JOB_ID: u64 = 1;

/// How pages are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// A real browser behind a WebDriver endpoint.
    Webdriver,
    /// Plain HTTP requests; no scripts run, no screenshots.
    Http,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "webdriver") {
            Backend::Webdriver
        } else {
            Backend::Http
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub headless: bool,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub request: CollectionRequest,
    pub harvest: HarvestSettings,
    pub backend: Backend,
    pub browser: BrowserOptions,
    pub output_dir: PathBuf,
}

pub fn execute(plan: RunPlan) -> anyhow::Result<()> {
    match plan.backend {
        Backend::Http => {
            if let Some(proxy) = &plan.browser.proxy {
                engine_warn!("Proxy {} is only used by the webdriver backend", proxy);
            }
            let loader = HttpLoader::new(FetchSettings::default())?;
            harvest(HtmlSessionFactory::new(loader), &plan)
        }
        Backend::Webdriver => execute_webdriver(&plan),
    }
}

#[cfg(feature = "webdriver")]
fn execute_webdriver(plan: &RunPlan) -> anyhow::Result<()> {
    use shelf_engine::{WebDriverFactory, WebDriverSettings};

    let settings = WebDriverSettings {
        endpoint: plan.browser.webdriver_url.clone(),
        headless: plan.browser.headless,
        proxy: plan.browser.proxy.clone(),
        ..WebDriverSettings::default()
    };
    harvest(WebDriverFactory::new(settings), plan)
}

#[cfg(not(feature = "webdriver"))]
fn execute_webdriver(_plan: &RunPlan) -> anyhow::Result<()> {
    anyhow::bail!("built without WebDriver support; rebuild with `--features webdriver` or pass `--backend http`")
}

fn harvest<F: SessionFactory + 'static>(factory: F, plan: &RunPlan) -> anyhow::Result<()> {
    let engine = EngineHandle::new(factory, plan.harvest.clone(), 1);
    engine.submit(JOB_ID, plan.request.clone());

    let mut outcome = None;
    while let Some(event) = engine.recv() {
        match event {
            HarvestEvent::Progress(progress) => {
                println!(
                    "[{}] links: {} records: {}",
                    progress.stage, progress.links, progress.records
                );
            }
            HarvestEvent::JobCompleted { result, .. } => {
                outcome = Some(result);
                engine.shutdown();
            }
        }
    }

    let result = outcome.context("engine stopped before the job completed")??;
    report(&result);

    let stamp = chrono::Local::now().format(RESULT_STAMP_FORMAT).to_string();
    match save_results(&result, &plan.request, &plan.output_dir, &stamp)? {
        Some(saved) => {
            println!("--- DONE ---");
            println!("{} records saved to {}", result.records.len(), saved.csv_path.display());
            println!("Full result: {}", saved.json_path.display());
        }
        None => println!("Nothing to save."),
    }
    Ok(())
}

fn report(result: &HarvestResult) {
    if let Some(reason) = &result.abort {
        engine_warn!("Run aborted: {}", reason);
    }
    if let Some(failure) = &result.failure {
        engine_warn!(
            "Stopped early on page {} ({}): {}",
            failure.page,
            failure.class,
            failure.message
        );
        for path in failure.artifacts.screenshot.iter().chain(&failure.artifacts.dom_dump) {
            engine_info!("  - debug artifact: {}", path.display());
        }
    }
    for omitted in &result.omitted {
        engine_warn!("Skipped {}: {}", omitted.url, omitted.reason);
    }
    for signal in &result.cap_signals {
        engine_info!(
            "Cap of {} reached while collecting {:?}; {} more left untouched",
            signal.cap,
            signal.stage,
            signal.skipped
        );
    }
}
