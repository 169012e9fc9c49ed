//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::engine::{EngineStats, PaginationEngine};
use crate::error::{Error, Result, ResultExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// First retry delay; doubles per attempt
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
/// Upper bound for the retry delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Outcome of a `fetch` run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    /// Pages successfully loaded
    pub pages: usize,
    /// Records written
    pub records: usize,
    /// Final engine counters
    pub stats: EngineStats,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let mut out = std::io::stdout();
        match &self.cli.command {
            Commands::Fetch {
                source,
                max_pages,
                retries,
            } => {
                let config = SourceConfig::from_file(source)?;
                self.fetch(&config, *max_pages, *retries, &mut out)
                    .await
                    .map(|_| ())
            }
            Commands::Validate { source } => self.validate(source, &mut out),
        }
    }

    /// Page through `config`, writing one RECORD message per new record
    ///
    /// Advances after every successful page until the last page or
    /// `max_pages`. Retryable errors are retried by advancing again, up to
    /// `retries` times per page.
    pub async fn fetch<W: Write>(
        &self,
        config: &SourceConfig,
        max_pages: Option<NonZeroUsize>,
        retries: u32,
        out: &mut W,
    ) -> Result<FetchSummary> {
        let provider = config.into_provider()?;
        let initial = config.initial_request(&provider);
        info!(source = %config.name, url = %initial.url, "Starting fetch");

        let (handle, mut updates) = PaginationEngine::new(initial, provider)
            .with_config(config.engine_config())
            .spawn::<Value>();

        let mut summary = FetchSummary::default();
        let mut attempt = 0u32;

        while let Some(state) = updates.next_loaded().await {
            for record in &state.elements()[summary.records..] {
                self.output_message(out, &json!({"type": "RECORD", "record": record}))?;
            }
            summary.records = state.elements().len();

            if let Some(err) = state.error() {
                if err.is_retryable() && attempt < retries {
                    let delay = calculate_backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Page failed ({err}), attempt {}/{}, retrying in {:?}",
                        attempt,
                        retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    handle.advance().await?;
                    continue;
                }

                let _ = handle.shutdown().await;
                return Err(Error::Other(format!(
                    "Failed after {} pages: {err}",
                    summary.pages
                )));
            }

            attempt = 0;
            summary.pages += 1;

            if !state.has_more() || max_pages.is_some_and(|max| summary.pages >= max.get()) {
                break;
            }
            handle.advance().await?;
        }

        summary.stats = handle.stats();
        let _ = handle.shutdown().await;

        info!(
            source = %config.name,
            pages = summary.pages,
            records = summary.records,
            "Fetch complete"
        );
        self.output_message(
            out,
            &json!({
                "type": "SUMMARY",
                "summary": summary,
            }),
        )?;

        Ok(summary)
    }

    /// Validate a source definition
    fn validate<W: Write>(&self, source: &Path, out: &mut W) -> Result<()> {
        let config = SourceConfig::from_file(source)?;

        self.output_message(
            out,
            &json!({
                "type": "LOG",
                "log": {
                    "level": "INFO",
                    "message": format!(
                        "Source '{}' is valid: {} with {} pagination",
                        config.name,
                        config.url,
                        config.pagination.kind()
                    )
                }
            }),
        )
    }

    /// Output a message
    fn output_message<W: Write>(&self, out: &mut W, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}").context("writing output")
    }
}

/// Exponential backoff delay for a given attempt
fn calculate_backoff(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    std::cmp::min(INITIAL_BACKOFF.saturating_mul(factor), MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationConfig;
    use clap::Parser;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(format: &str) -> Runner {
        Runner::new(
            Cli::try_parse_from(["pagefeed", "--format", format, "validate", "-s", "x.yaml"])
                .unwrap(),
        )
    }

    fn lines(out: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0), Duration::from_millis(250));
        assert_eq!(calculate_backoff(2), Duration::from_secs(1));
        assert_eq!(calculate_backoff(20), MAX_BACKOFF);
        assert_eq!(calculate_backoff(40), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_fetch_pages_until_last() {
        let server = MockServer::start().await;
        for page in 1..=3 {
            let body = if page < 3 {
                json!({"items": [{"n": page * 2 - 1}, {"n": page * 2}]})
            } else {
                json!({"items": []})
            };
            Mock::given(method("GET"))
                .and(query_param("page", page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;
        }

        let mut config = SourceConfig::new("numbers", server.uri());
        config.records_path = Some("items".to_string());
        config.pagination = PaginationConfig::page_number("page", 1);

        let mut out = Vec::new();
        let summary = runner("json")
            .fetch(&config, None, 0, &mut out)
            .await
            .unwrap();

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.stats.pages_loaded, 3);

        let messages = lines(&out);
        let records: Vec<_> = messages
            .iter()
            .filter(|m| m["type"] == "RECORD")
            .map(|m| m["record"]["n"].clone())
            .collect();
        assert_eq!(records, vec![json!(1), json!(2), json!(3), json!(4)]);
        assert_eq!(messages.last().unwrap()["type"], "SUMMARY");
    }

    #[tokio::test]
    async fn test_fetch_respects_max_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(2)
            .mount(&server)
            .await;

        let mut config = SourceConfig::new("endless", server.uri());
        config.pagination = PaginationConfig::page_number("page", 1);

        let mut out = Vec::new();
        let summary = runner("json")
            .fetch(&config, NonZeroUsize::new(2), 0, &mut out)
            .await
            .unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.records, 2);
    }

    #[tokio::test]
    async fn test_fetch_retries_transient_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let config = SourceConfig::new("flaky", server.uri());
        let mut out = Vec::new();
        let summary = runner("json")
            .fetch(&config, None, 1, &mut out)
            .await
            .unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.stats.fetch_errors, 1);
    }

    #[tokio::test]
    async fn test_fetch_fails_on_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let config = SourceConfig::new("denied", server.uri());
        let mut out = Vec::new();
        let err = runner("json")
            .fetch(&config, None, 3, &mut out)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_validate_pretty_output() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"name: demo\nurl: https://example.com/items\npagination:\n  type: next_url\n  path: next\n")
            .unwrap();

        let mut out = Vec::new();
        runner("pretty").validate(file.path(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Source 'demo' is valid"));
        assert!(text.contains("next_url"));
        assert!(text.lines().count() > 1);
    }
}
