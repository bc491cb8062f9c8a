//! Veracity CLI - evaluate truth adapters from the command line
//!
//! The `veracity` command configures one adapter (or a tree of them),
//! evaluates it once and prints the result as JSON.
//!
//! ## Commands
//!
//! - `date`: is today a given date
//! - `range`: does a value lie within a range
//! - `html`: does a regex match a fetched page
//! - `select`: what does a CSS selector extract from a fetched page
//! - `chain`: birthday check, a date scraped from a page fed into a recurring date match
//! - `eval`: evaluate a JSON adapter tree from a file
//!
//! Exit status is 0 for a true answer, 1 for false and 2 for errors.

mod spec;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use veracity_adapters::{
    DateAdapter, DateParams, HttpFetcher, HtmlRegexAdapter, HtmlRegexParams, LeafEnv,
    NumericRangeAdapter, NumericRangeParams, PageFetcher, SelectorAdapter, SelectorParams,
    MATCHED_VALUE_KEY,
};
use veracity_core::{
    AdapterConfig, AdapterResult, ChainParams, ChainedAdapter, TransformError, TruthAdapter,
};

use crate::spec::TreeBuilder;

#[derive(Parser)]
#[command(name = "veracity")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate yes/no truth adapters", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print the result
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether today (UTC) is a given date
    Date {
        /// RFC 3339 date-time or YYYY-MM-DD
        #[arg(long)]
        target_date: String,

        /// Match month and day of any year
        #[arg(long)]
        recurring: bool,
    },

    /// Check whether a value lies within a range
    Range {
        #[arg(long, allow_hyphen_values = true)]
        value: f64,

        /// Lower bound
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,

        /// Upper bound
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,

        /// Exclude the bounds themselves
        #[arg(long)]
        exclusive: bool,
    },

    /// Match a regular expression against a fetched page
    Html {
        #[arg(long)]
        url: String,

        /// Pattern; capture group 1 (or the whole match) is the matched value
        #[arg(long)]
        regex: String,

        /// Value the match must equal
        #[arg(long)]
        expected: Option<String>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Extract a value from a fetched page with a CSS selector
    Select {
        #[arg(long)]
        url: String,

        /// CSS selector
        #[arg(long)]
        selector: String,

        /// Value the extracted text must equal
        #[arg(long)]
        expected: Option<String>,

        /// Read this attribute of the first match instead of the text
        #[arg(long)]
        attribute: Option<String>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Is today the birthday found on a page
    Chain {
        #[arg(long)]
        url: String,

        /// Pattern capturing the birth date in group 1
        #[arg(long)]
        regex: String,
    },

    /// Evaluate a JSON adapter tree
    Eval {
        /// Path to the spec file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    veracity_core::init_tracing(cli.json, level);

    let outcome = match run(cli.command).await {
        Ok(result) => render(&result, cli.pretty).map(|out| (out, result.answer)),
        Err(e) => Err(e),
    };
    match outcome {
        Ok((out, answer)) => {
            println!("{}", out);
            if answer {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(command: Commands) -> Result<AdapterResult> {
    match command {
        Commands::Date {
            target_date,
            recurring,
        } => cmd_date(target_date, recurring).await,
        Commands::Range {
            value,
            min,
            max,
            exclusive,
        } => cmd_range(value, min, max, exclusive).await,
        Commands::Html {
            url,
            regex,
            expected,
            timeout_ms,
        } => {
            let mut params = HtmlRegexParams::new(url, regex);
            params.expected_match = expected;
            params.timeout = timeout_ms;
            cmd_html(http_fetcher()?, params).await
        }
        Commands::Select {
            url,
            selector,
            expected,
            attribute,
            timeout_ms,
        } => {
            let mut params = SelectorParams::new(url, selector);
            params.expected_value = expected;
            params.extract_attribute = attribute;
            params.timeout = timeout_ms;
            cmd_select(http_fetcher()?, params).await
        }
        Commands::Chain { url, regex } => cmd_chain(http_fetcher()?, url, regex).await,
        Commands::Eval { file } => cmd_eval(LeafEnv::new(http_fetcher()?), &file).await,
    }
}

fn http_fetcher() -> Result<Arc<dyn PageFetcher>> {
    let fetcher = HttpFetcher::from_env().context("Failed to build HTTP client")?;
    Ok(Arc::new(fetcher))
}

fn render(result: &AdapterResult, pretty: bool) -> Result<String> {
    let value = result.to_value();
    let out = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(out)
}

/// Configure, evaluate once, dispose.
async fn evaluate_once<A>(adapter: &A, config: AdapterConfig<A::Params>) -> Result<AdapterResult>
where
    A: TruthAdapter + ?Sized,
{
    let id = config.id.clone();
    adapter
        .configure(config)
        .await
        .with_context(|| format!("Failed to configure adapter '{}'", id))?;
    let result = adapter
        .evaluate()
        .await
        .with_context(|| format!("Failed to evaluate adapter '{}'", id));
    adapter.dispose().await;
    let result = result?;
    info!(adapter_id = %id, answer = result.answer, "Evaluated");
    Ok(result)
}

async fn cmd_date(target_date: String, recurring: bool) -> Result<AdapterResult> {
    let mut params = DateParams::new(target_date);
    params.recurring_yearly = recurring;
    evaluate_once(&DateAdapter::new(), AdapterConfig::new("date", "Date", params)).await
}

async fn cmd_range(
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
    exclusive: bool,
) -> Result<AdapterResult> {
    let params = NumericRangeParams {
        value,
        min_value: min,
        max_value: max,
        inclusive: !exclusive,
    };
    evaluate_once(
        &NumericRangeAdapter::new(),
        AdapterConfig::new("range", "Range", params),
    )
    .await
}

async fn cmd_html(
    fetcher: Arc<dyn PageFetcher>,
    params: HtmlRegexParams,
) -> Result<AdapterResult> {
    evaluate_once(
        &HtmlRegexAdapter::new(fetcher),
        AdapterConfig::new("html", "Page regex", params),
    )
    .await
}

async fn cmd_select(
    fetcher: Arc<dyn PageFetcher>,
    params: SelectorParams,
) -> Result<AdapterResult> {
    evaluate_once(
        &SelectorAdapter::new(fetcher),
        AdapterConfig::new("select", "Page selector", params),
    )
    .await
}

/// Regex source feeding a recurring date target.
fn birthday_chain(
    fetcher: Arc<dyn PageFetcher>,
    url: String,
    regex: String,
) -> ChainParams<HtmlRegexAdapter, DateAdapter> {
    ChainParams::new(
        Arc::new(HtmlRegexAdapter::new(fetcher)),
        AdapterConfig::new("profile", "Profile page", HtmlRegexParams::new(url, regex)),
        Arc::new(DateAdapter::new()),
        AdapterConfig::new("birthday", "Birthday", DateParams::new("1970-01-01").recurring()),
    )
    .with_transform(|source| {
        let dob = source
            .get(MATCHED_VALUE_KEY)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TransformError::new("No birthday found"))?;
        Ok(AdapterConfig::new(
            "birthday",
            "Birthday",
            DateParams::new(dob).recurring(),
        ))
    })
}

async fn cmd_chain(
    fetcher: Arc<dyn PageFetcher>,
    url: String,
    regex: String,
) -> Result<AdapterResult> {
    let chain: ChainedAdapter<HtmlRegexAdapter, DateAdapter> = ChainedAdapter::new();
    let config = AdapterConfig::new(
        "is-birthday",
        "Is it their birthday",
        birthday_chain(fetcher, url, regex),
    );
    evaluate_once(&chain, config).await
}

async fn cmd_eval(env: LeafEnv, file: &Path) -> Result<AdapterResult> {
    let node = spec::load(file)?;
    info!(root = %node.id(), "Loaded adapter tree");
    let built = TreeBuilder::new(env).build(&node);
    evaluate_once(built.adapter.as_ref(), built.config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use veracity_adapters::fakes::StaticFetcher;
    use veracity_core::{REASON_KEY, SOURCE_RESULT_KEY};

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "veracity", "range", "--value", "-3", "--max", "0", "--pretty",
        ])
        .unwrap();
        assert!(cli.pretty);
        match cli.command {
            Commands::Range { value, min, max, .. } => {
                assert_eq!(value, -3.0);
                assert_eq!(min, None);
                assert_eq!(max, Some(0.0));
            }
            _ => panic!("expected range"),
        }
    }

    #[test]
    fn eval_requires_a_file() {
        assert!(Cli::try_parse_from(["veracity", "eval"]).is_err());
    }

    #[tokio::test]
    async fn range_command_answers() {
        let inside = cmd_range(5.0, Some(5.0), Some(5.0), false).await.unwrap();
        assert!(inside.answer);
        let outside = cmd_range(5.0, Some(5.0), Some(5.0), true).await.unwrap();
        assert!(!outside.answer);
    }

    #[tokio::test]
    async fn range_without_bounds_is_an_error() {
        let err = cmd_range(5.0, None, None, false).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to configure adapter 'range'"));
        assert!(message.contains("minValue or maxValue"));
    }

    #[tokio::test]
    async fn invalid_date_is_an_error() {
        assert!(cmd_date("someday".to_string(), false).await.is_err());
    }

    #[tokio::test]
    async fn html_command_uses_fetcher() {
        let fetcher = Arc::new(StaticFetcher::always("<title>Veracity</title>"));
        let params =
            HtmlRegexParams::new("http://test.com", "<title>(.*)</title>").expecting("Veracity");
        let result = cmd_html(fetcher.clone(), params).await.unwrap();

        assert!(result.answer);
        assert_eq!(fetcher.requests()[0].url, "http://test.com");
    }

    #[tokio::test]
    async fn select_command_extracts_attribute() {
        let fetcher = Arc::new(StaticFetcher::always(
            r#"<a id="home" href="/start">Home</a>"#,
        ));
        let params = SelectorParams::new("http://test.com", "a#home").attribute("href");
        let result = cmd_select(fetcher, params).await.unwrap();

        assert!(result.answer);
        assert_eq!(result.get(MATCHED_VALUE_KEY), Some(&json!("/start")));
    }

    #[tokio::test]
    async fn chain_command_short_circuits_without_a_date() {
        let fetcher = Arc::new(StaticFetcher::always("<p>nothing</p>"));
        let result = cmd_chain(
            fetcher,
            "http://test.com".to_string(),
            "born (\\S+)".to_string(),
        )
        .await
        .unwrap();

        assert!(!result.answer);
        assert!(result.get(REASON_KEY).is_some());
        assert!(result.sub_result(SOURCE_RESULT_KEY).is_some());
    }

    #[tokio::test]
    async fn eval_command_reads_spec_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        let spec = json!({
            "kind": "chain",
            "id": "both",
            "source": {"kind": "range", "id": "a", "value": 2, "minValue": 1},
            "target": {
                "kind": "select",
                "id": "b",
                "url": "http://test.com",
                "selector": "h1",
                "expectedValue": "Hi"
            }
        });
        std::fs::write(&path, spec.to_string()).unwrap();

        let env = LeafEnv::new(Arc::new(StaticFetcher::always("<h1> Hi </h1>")));
        let result = cmd_eval(env, &path).await.unwrap();

        assert!(result.answer);
    }

    #[tokio::test]
    async fn eval_command_reports_missing_file() {
        let env = LeafEnv::new(Arc::new(StaticFetcher::new()));
        let err = cmd_eval(env, Path::new("/nonexistent/spec.json"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read spec file"));
    }

    #[test]
    fn render_is_compact_unless_pretty() {
        let result = AdapterResult::new(true);
        assert!(!render(&result, false).unwrap().contains('\n'));
        assert!(render(&result, true).unwrap().contains('\n'));
    }
}
