//! Zakazflow entry point.
//!
//! Binary name: `zakazflow`
//!
//! Parses CLI arguments, loads settings, wires the aggregation engine with
//! either the OpenAI-backed or the rule-based classification stack, then
//! pumps inbound messages from stdin until EOF or Ctrl-C.

mod cli;
mod stdio;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use zakazflow_core::breaker::{GuardedClassifier, GuardedExtractor, LlmBreaker};
use zakazflow_core::classify::rules::RuleBasedClassifier;
use zakazflow_core::classify::{Classifier, FallbackClassifier};
use zakazflow_core::engine::Engine;
use zakazflow_core::extract::{FactExtractor, NullExtractor};
use zakazflow_core::sinks::{DatasetSink, NotificationSink, OrderRepository};
use zakazflow_infra::dataset::JsonlDatasetSink;
use zakazflow_infra::http::RestOrderRepository;
use zakazflow_infra::llm::{OpenAiClassifier, OpenAiExtractor};
use zakazflow_types::config::Settings;
use zakazflow_types::message::InboundMessage;

use cli::Cli;
use stdio::StdioNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    zakazflow_observe::tracing_setup::init_tracing(cli.json_logs)
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let settings = load_settings(&cli)?;
    let repository = RestOrderRepository::new(&settings);
    let dataset = JsonlDatasetSink::new(&cli.dataset);
    let notifier = StdioNotifier::new();

    match &cli.openai_api_key {
        Some(api_key) => {
            let breaker = Arc::new(LlmBreaker::new(
                settings.quota_cooldown(),
                settings.rate_limit_cooldown(),
            ));
            let extractor = GuardedExtractor::new(
                OpenAiExtractor::new(api_key, &settings),
                Arc::clone(&breaker),
            );
            let classifier = FallbackClassifier::new(
                GuardedClassifier::new(OpenAiClassifier::new(api_key, &settings), breaker),
                RuleBasedClassifier,
            );
            info!(model = %settings.openai_model, "running with llm stack");
            let engine = Engine::new(settings, extractor, classifier, repository, dataset, notifier);
            run(engine).await
        }
        None => {
            info!("no api key, running rule-based only");
            let engine = Engine::new(
                settings,
                NullExtractor,
                RuleBasedClassifier,
                repository,
                dataset,
                notifier,
            );
            run(engine).await
        }
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}

/// Pump stdin JSON lines into the engine until EOF or Ctrl-C, then drain
/// in-flight finalizers and side effects.
async fn run<X, C, R, D, N>(engine: Engine<X, C, R, D, N>) -> anyhow::Result<()>
where
    X: FactExtractor + 'static,
    C: Classifier + 'static,
    R: OrderRepository + 'static,
    D: DatasetSink + 'static,
    N: NotificationSink + 'static,
{
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<InboundMessage>(line) {
                        Ok(message) => engine.handle_message(message).await,
                        Err(err) => warn!(error = %err, "skipping unparseable inbound line"),
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    info!("draining in-flight work");
    engine.shutdown().await;
    Ok(())
}
