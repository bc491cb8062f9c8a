//! Log subscriber setup for the `veracity` binary.
//!
//! Events from the veracity crates are shown at the requested level while
//! dependencies (reqwest, hyper, html5ever) stay at `warn`. `VERACITY_LOG`
//! takes precedence over `RUST_LOG`; either replaces the default filter
//! entirely. Output goes to stderr so stdout carries only the result.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "VERACITY_LOG";

const VERACITY_TARGETS: [&str; 3] = ["veracity_core", "veracity_adapters", "veracity"];

/// Filter directive used when neither `VERACITY_LOG` nor `RUST_LOG` is set.
pub fn default_directive(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directive = String::from("warn");
    for target in VERACITY_TARGETS {
        directive.push_str(&format!(",{}={}", target, level));
    }
    directive
}

fn env_filter(level: Level) -> EnvFilter {
    [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(level)))
}

/// Install the global subscriber; later calls are ignored.
///
/// `json` switches to newline-delimited JSON lines.
pub fn init_tracing(json: bool, level: Level) {
    let filter = env_filter(level);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
