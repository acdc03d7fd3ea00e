//! Retrovote: run a voting workflow for every configured account.

mod prompt;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use retrovote_client::HttpConnector;
use retrovote_crypto::load_accounts;
use retrovote_engine::{Dispatcher, FileRecorder, RunConfig, RunContext};
use retrovote_network::{load_proxies, ProxyCycler};
use retrovote_types::WorkflowKind;
use retrovote_utils::{init_logging, read_lines, LogFormat};

#[derive(Parser)]
#[command(name = "retrovote", about = "Multi-account voting client")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "RETROVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Workflow to run: "record", "vote" or "delete". Asked interactively when absent.
    #[arg(long, env = "RETROVOTE_WORKFLOW")]
    workflow: Option<WorkflowKind>,

    /// Number of accounts processed at once. Asked interactively when absent
    /// and no config file is given.
    #[arg(long, env = "RETROVOTE_THREADS")]
    threads: Option<usize>,

    /// Accounts file: one mnemonic or private key per line.
    #[arg(long, env = "RETROVOTE_ACCOUNTS")]
    accounts: Option<PathBuf>,

    /// Proxies file: one proxy per line in any supported shape.
    #[arg(long, env = "RETROVOTE_PROXIES")]
    proxies: Option<PathBuf>,

    /// Export file for accounts found eligible by the record workflow.
    #[arg(long, env = "RETROVOTE_RECORDED_ACCOUNTS")]
    recorded_accounts: Option<PathBuf>,

    /// Voting round id.
    #[arg(long, env = "RETROVOTE_ROUND_ID")]
    round_id: Option<String>,

    /// Base URL of the voting API.
    #[arg(long, env = "RETROVOTE_API_URL")]
    api_url: Option<String>,

    /// Total attempts per remote call; unbounded when absent.
    #[arg(long, env = "RETROVOTE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Pause between retries in milliseconds.
    #[arg(long, env = "RETROVOTE_RETRY_DELAY_MS")]
    retry_delay_ms: Option<u64>,

    /// Seed for reproducible vote allocations.
    #[arg(long, env = "RETROVOTE_SEED")]
    seed: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "RETROVOTE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "RETROVOTE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Also append every log line to this file.
    #[arg(long, env = "RETROVOTE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay flags on top of the file (or default) configuration.
    fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(workflow) = self.workflow {
            config.workflow = Some(workflow);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(path) = self.accounts {
            config.accounts_path = path;
        }
        if let Some(path) = self.proxies {
            config.proxies_path = path;
        }
        if let Some(path) = self.recorded_accounts {
            config.recorded_accounts_path = path;
        }
        if let Some(round_id) = self.round_id {
            config.round_id = round_id;
        }
        if let Some(url) = self.api_url {
            config.api_base_url = url;
        }
        if let Some(max) = self.max_attempts {
            config.retry.max_attempts = Some(max);
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry.delay_ms = delay;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(path) = self.log_file {
            config.log_file = Some(path);
        }
        config
    }
}

fn load_proxy_cycler(path: &Path) -> anyhow::Result<ProxyCycler> {
    if !path.exists() {
        tracing::info!("no proxies file at {}, connecting directly", path.display());
        return Ok(ProxyCycler::direct());
    }
    let lines = read_lines(path)?;
    let cycler = load_proxies(lines.iter().map(String::as_str));
    if cycler.is_empty() {
        tracing::info!("no usable proxies in {}, connecting directly", path.display());
    } else {
        tracing::info!("loaded {} proxies", cycler.len());
    }
    Ok(cycler)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => RunConfig::from_toml_file(path)?,
        None => RunConfig::default(),
    };
    let interactive_threads = cli.threads.is_none() && cli.config.is_none();
    let mut config = cli.apply(base);

    let stdin = std::io::stdin();
    let can_prompt = stdin.is_terminal();
    if config.workflow.is_none() || interactive_threads {
        if !can_prompt && config.workflow.is_none() {
            bail!("no workflow given; pass --workflow or set it in the config file");
        }
        if can_prompt {
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            if config.workflow.is_none() {
                config.workflow = Some(prompt::prompt_workflow(&mut input, &mut output)?);
            }
            if interactive_threads {
                config.threads = prompt::prompt_threads(&mut input, &mut output)?;
            }
        }
    }
    config.validate()?;

    let log_format: LogFormat = config.log_format.parse().map_err(anyhow::Error::msg)?;
    init_logging(log_format, &config.log_level, config.log_file.as_deref())?;

    let workflow = config
        .workflow
        .context("workflow must be resolved before dispatch")?;

    let lines = read_lines(&config.accounts_path)
        .with_context(|| format!("cannot load accounts from {}", config.accounts_path.display()))?;
    let accounts = load_accounts(lines.iter().map(String::as_str));
    if accounts.is_empty() {
        bail!("no valid accounts in {}", config.accounts_path.display());
    }
    tracing::info!("loaded {} accounts", accounts.len());

    let proxies = load_proxy_cycler(&config.proxies_path)?;

    let context = RunContext {
        connector: Arc::new(HttpConnector::new(config.http_config())),
        proxies: Arc::new(proxies),
        retry: config.retry_policy(),
        recorder: Arc::new(FileRecorder::new(&config.recorded_accounts_path)),
        seed: config.seed,
    };
    let dispatcher = Dispatcher::new(context, config.threads)?;

    let report = dispatcher.run(workflow, accounts.into_accounts()).await;
    tracing::info!(
        "done: {}/{} accounts succeeded, {} failed",
        report.succeeded,
        report.total,
        report.failures.len()
    );
    if workflow == WorkflowKind::Record {
        tracing::info!(
            "eligible accounts exported to {}",
            config.recorded_accounts_path.display()
        );
    }
    Ok(())
}
