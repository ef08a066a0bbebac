//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::progress::page_bar;
use crate::config::ExportConfig;
use crate::decode::PageDecoder;
use crate::engine::{ExportEngine, ExportOutcome, ExportReport};
use crate::error::{Error, Result};
use crate::fetch::{ApiPageFetcher, PageFetcher};
use crate::http::HttpClient;
use crate::output::JsonlSink;
use crate::pagination::total_pages;
use crate::state::ProgressTracker;
use crate::types::PageRequest;
use indicatif::ProgressBar;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    progress: ProgressBar,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        let exporting = matches!(
            cli.command.clone().unwrap_or_default(),
            Commands::Export { .. }
        );
        let progress = page_bar(exporting && !cli.quiet);
        Self { cli, progress }
    }

    /// Page progress bar driven by `export`; hidden for other commands
    /// and with `--quiet`
    pub fn progress_bar(&self) -> ProgressBar {
        self.progress.clone()
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command.clone().unwrap_or_default() {
            Commands::Export { restart } => self.export(restart).await.map(|_| ()),
            Commands::Check => self.check().await,
            Commands::Status => self.status().await,
        }
    }

    /// Merge defaults, the config file and command-line/environment overrides
    pub fn config(&self) -> Result<ExportConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ExportConfig::from_file(path)?,
            None => ExportConfig::default(),
        };

        let cli = &self.cli;
        if let Some(app_id) = &cli.app_id {
            config.app_id = Some(app_id.clone());
        }
        if let Some(app_key) = &cli.app_key {
            config.app_key = Some(app_key.clone());
        }
        if let Some(base_url) = &cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(resource) = &cli.resource {
            config.resource.clone_from(resource);
        }
        if let Some(output) = &cli.output {
            config.output.clone_from(output);
        }
        if let Some(page_size) = cli.page_size {
            config.page_size = page_size;
        }
        if let Some(delay) = cli.page_delay_ms {
            config.page_delay_ms = delay;
        }
        if let Some(delay) = cli.retry_delay_ms {
            config.retry_delay_ms = delay;
        }
        if let Some(retries) = cli.max_retries {
            config.max_retries = retries;
        }

        debug!("Effective config: {config:?}");
        Ok(config)
    }

    /// Export every page, resuming from the progress marker
    pub async fn export(&self, restart: bool) -> Result<ExportReport> {
        let config = self.config()?;
        config.validate()?;

        let tracker = ProgressTracker::for_output(&config.output);
        if restart {
            tracker.clear().await?;
            info!("Cleared progress marker {}", tracker.path().display());
        }

        let fetcher = build_fetcher(&config)?;
        let sink = JsonlSink::new(&config.output);
        let mut engine = ExportEngine::new(fetcher, sink, tracker)
            .with_config(config.engine_config())
            .with_progress_bar(self.progress_bar());

        let result = engine.run().await;
        info!(
            "Completed fetching {}. Check {} for results.",
            config.resource,
            config.output.display()
        );

        let report = result?;
        if let ExportOutcome::Aborted { reason } = &report.outcome {
            warn!("Export aborted before any page was processed: {reason}");
        }
        self.output_message(&json!({
            "type": "SUMMARY",
            "summary": {
                "outcome": outcome_name(&report.outcome),
                "output": config.output.display().to_string(),
                "total_results": report.total_results,
                "total_pages": report.total_pages,
                "start_page": report.resume.start_page(),
                "pages_committed": report.pages_committed,
                "records_written": report.records_written,
                "skipped_pages": report.skipped_pages,
                "last_committed_page": report.last_committed_page,
                "requests": report.stats.requests,
                "duration_ms": report.stats.duration_ms,
            }
        }));
        Ok(report)
    }

    /// Fetch page 1 and report what a full export would cover
    async fn check(&self) -> Result<()> {
        let config = self.config()?;
        config.validate()?;
        let fetcher = build_fetcher(&config)?;

        info!("Checking connection to {}", config.base_url);
        match fetcher
            .fetch(PageRequest::new(1, config.page_size))
            .await
        {
            Ok(page) => {
                let pages = total_pages(page.total_result_count, page.effective_page_size);
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "total_results": page.total_result_count,
                        "page_size": page.effective_page_size,
                        "total_pages": pages.unwrap_or(0),
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": e.to_string(),
                    }
                }));
                Err(e)
            }
        }
    }

    /// Report local progress without touching the network
    async fn status(&self) -> Result<()> {
        let config = self.config()?;
        let tracker = ProgressTracker::for_output(&config.output);
        let sink = JsonlSink::new(&config.output);

        let (marker, corrupt) = match tracker.try_load().await {
            Ok(marker) => (marker, false),
            Err(Error::ProgressCorrupt { .. }) => (None, true),
            Err(e) => return Err(e),
        };
        let lines = sink.line_count().await?;

        self.output_message(&json!({
            "type": "STATUS",
            "status": {
                "output": config.output.display().to_string(),
                "progress_file": tracker.path().display().to_string(),
                "last_committed_page": marker,
                "progress_corrupt": corrupt,
                "records": lines,
            }
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Build the HTTP-backed fetcher described by `config`
pub(crate) fn build_fetcher(config: &ExportConfig) -> Result<ApiPageFetcher> {
    let client = HttpClient::with_auth(config.http_config(), config.auth())?;
    let fetcher = ApiPageFetcher::new(
        client,
        config.endpoint_path(),
        PageDecoder::new(config.response.clone()),
    )
    .with_params(config.query.clone());
    Ok(fetcher)
}

fn outcome_name(outcome: &ExportOutcome) -> &'static str {
    match outcome {
        ExportOutcome::Completed => "completed",
        ExportOutcome::StoppedEarly { .. } => "stopped_early",
        ExportOutcome::Empty => "empty",
        ExportOutcome::Aborted { .. } => "aborted",
    }
}
