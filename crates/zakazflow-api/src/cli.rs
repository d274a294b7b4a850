//! CLI argument definitions for the `zakazflow` binary.

use std::path::PathBuf;

use clap::Parser;

/// Group-chat order aggregation engine.
///
/// Reads inbound chat messages as JSON lines on stdin and emits outbound
/// notification actions as JSON lines on stdout; the chat-platform adapter
/// sits on the other side of that pipe.
#[derive(Parser)]
#[command(name = "zakazflow", version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML settings file. Omit to run on defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path of the append-only JSONL dataset.
    #[arg(long, default_value = "dataset.jsonl")]
    pub dataset: PathBuf,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,

    /// OpenAI API key. Omit to run with rule-based classification only.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["zakazflow"]).unwrap();
        assert!(cli.config.is_none());
        assert_eq!(cli.dataset, PathBuf::from("dataset.jsonl"));
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_cli_config_and_dataset() {
        let cli = Cli::try_parse_from([
            "zakazflow",
            "--config",
            "/etc/zakazflow.toml",
            "--dataset",
            "/var/log/zakaz/dataset.jsonl",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/zakazflow.toml")));
        assert!(cli.json_logs);
    }
}
