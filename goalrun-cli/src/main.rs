//! # goalrun CLI
//!
//! Command-line front end: send a goal to one of the LLM backends, watch the
//! run as it happens, and keep the reply.
//!
//! Usage:
//!   goalrun run --backend <BACKEND> --goal <GOAL> [--command <COMMAND>]
//!   goalrun extract <TRANSCRIPT> [--save <PATH>]
//!   goalrun backends
//!
//! Examples:
//!   goalrun run -b ChatGPT -g "parse a CSV file" -c "python parse.py data.csv"
//!   goalrun run -b Mistral -g "write a short poem about rust" --save poem
//!   goalrun extract session.log --save reply.py

use clap::{Args, Parser, Subcommand};
use goalrun_agent::{
    require_last_response, save_to_path, with_default_extension, Orchestrator, OrchestratorConfig,
    RunRequest, SaveOutcome, Transcript,
};
use goalrun_backend::{
    BackendConfig, BackendKind, Error, ErrorKind, Result, RunOutcome, DEFAULT_AZURE_API_VERSION,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "goalrun")]
#[command(author, version, about = "goalrun - send a goal to an LLM backend and keep the reply")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a goal against a backend
    Run(RunArgs),
    /// Pull the latest reply out of a saved transcript
    Extract {
        /// Transcript file to scan
        #[arg(required = true)]
        file: PathBuf,

        /// Write the reply here instead of printing it
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List the available backends
    Backends,
}

#[derive(Args)]
struct RunArgs {
    /// Backend to use (ChatGPT, Azure, Gemini, Nano, DeepSeek, Mistral)
    #[arg(short, long, default_value = "ChatGPT")]
    backend: BackendKind,

    /// What you want to achieve
    #[arg(short, long)]
    goal: String,

    /// Command to run, or creative instruction for prose backends
    #[arg(short = 'c', long = "command", default_value = "")]
    run_command: String,

    /// API key; falls back to the backend's usual environment variable
    #[arg(long, env = "GOALRUN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Azure resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    api_base: Option<String>,

    /// Azure API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_AZURE_API_VERSION)]
    api_version: String,

    /// Azure deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    deployment: Option<String>,

    /// Override the backend's default model
    #[arg(long)]
    model: Option<String>,

    /// Override the backend's endpoint root
    #[arg(long)]
    base_url: Option<String>,

    /// HTTP timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory the reply is auto-saved to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also save the reply to this path
    #[arg(long)]
    save: Option<PathBuf>,
}

impl RunArgs {
    fn backend_config(&self) -> BackendConfig {
        let kind = self.backend;
        let mut config = BackendConfig::for_kind(kind)
            .with_api_version(self.api_version.clone())
            .with_output_dir(&self.output_dir);

        config.api_key = self.api_key.clone().or_else(|| env_api_key(kind));
        config.api_base = self.api_base.clone();
        config.deployment = self.deployment.clone();
        config.model = self.model.clone();
        config.base_url = self.base_url.clone().or_else(|| env_base_url(kind));
        config.timeout_secs = self.timeout;
        config
    }
}

/// Conventional key variable for each backend
fn env_api_key(kind: BackendKind) -> Option<String> {
    let var = match kind {
        BackendKind::ChatGpt | BackendKind::Nano => "OPENAI_API_KEY",
        BackendKind::Azure => "AZURE_OPENAI_API_KEY",
        BackendKind::Gemini => "GEMINI_API_KEY",
        BackendKind::DeepSeek | BackendKind::Mistral => return None,
    };
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn env_base_url(kind: BackendKind) -> Option<String> {
    if kind.requires_api_key() {
        return None;
    }
    std::env::var("OLLAMA_HOST").ok().filter(|v| !v.is_empty()).map(|host| {
        if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("http://{}", host)
        }
    })
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}

fn print_event(event: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(event.as_bytes());
    let _ = stdout.flush();
}

async fn run_goal(args: RunArgs) -> Result<()> {
    let transcript = Transcript::new();
    let mut live = transcript.subscribe();
    let orchestrator = Orchestrator::start(transcript.clone(), OrchestratorConfig::default());

    orchestrator.submit(RunRequest::new(
        args.goal.clone(),
        args.run_command.clone(),
        args.backend_config(),
    ));

    let drained = orchestrator.drain();
    tokio::pin!(drained);
    let outcome = loop {
        tokio::select! {
            event = live.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(missed)) => warn!(missed, "display fell behind the transcript"),
                Err(RecvError::Closed) => break (&mut drained).await,
            },
            outcome = &mut drained => break outcome,
        }
    };
    while let Ok(event) = live.try_recv() {
        print_event(&event);
    }
    println!();

    let Some(path) = args.save else {
        return Ok(());
    };
    report_save(save_reply(outcome.as_deref(), &path, args.backend)?);
    Ok(())
}

/// Save the reply a finished run handed back, verbatim
fn save_reply(outcome: Option<&RunOutcome>, path: &Path, kind: BackendKind) -> Result<SaveOutcome> {
    let reply = outcome
        .and_then(RunOutcome::reply)
        .ok_or_else(|| Error::response_not_found().with_operation("cli::save_reply"))?;
    let path = with_default_extension(path, kind.output_extension());
    save_to_path(reply, Some(&path))
}

fn extract_file(file: &Path, save: Option<PathBuf>) -> Result<()> {
    let transcript = std::fs::read_to_string(file).map_err(|e| {
        Error::from(e)
            .with_operation("cli::extract")
            .with_context("file", file.display().to_string())
    })?;

    let reply = require_last_response(&transcript)?;

    match save {
        Some(path) => report_save(save_to_path(&reply, Some(&path))?),
        None => println!("{}", reply),
    }
    Ok(())
}

fn report_save(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Saved(path) => println!("💾 Saved output to: {}", path.display()),
        SaveOutcome::Cancelled => println!("❌ Save cancelled."),
    }
}

fn list_backends() {
    println!("{:<10} {:<16} {:<10} {}", "BACKEND", "MODEL", "STYLE", "AUTO-SAVE");
    for kind in BackendKind::ALL {
        println!(
            "{:<10} {:<16} {:<10} {}",
            kind.display_name(),
            kind.default_model(),
            format!("{:?}", kind.prompt_style()).to_lowercase(),
            kind.output_file()
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run_goal(args).await,
        Commands::Extract { file, save } => extract_file(&file, save),
        Commands::Backends => {
            list_backends();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

fn failure_message(err: &Error) -> String {
    let kind = err.kind();
    if kind == ErrorKind::ResponseNotFound {
        "⚠️ No LLM response found to save.".to_string()
    } else if kind.is_transport() {
        format!("Error: {} (check the endpoint and credentials)", err.message())
    } else if kind.is_io() {
        format!("Error: {} (check the path and its permissions)", err.message())
    } else {
        format!("Error: {}", err.message())
    }
}
