use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use rc_ai::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use rc_ai::{BackendConfig, Reasoner};
use rc_core::error::{codes, AppError};
use rc_core::text::DEFAULT_SUMMARY_SENTENCES;
use researchcrew_lib::{
    analyze, check_backend, digest, AnalyzeRequest, DEFAULT_DIGEST_LINES, DEFAULT_GRAPH_FILE,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Research crew text tools
///
/// Summaries and structured reasoning over local documents, using a remote
/// language model when a credential is configured and a heuristic otherwise.
#[derive(Parser, Debug)]
#[command(name = "researchcrew", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Remote backend credential; without it every call uses the heuristic path
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model name sent with each completion request
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Request timeout for the remote backend, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl From<BackendArgs> for BackendConfig {
    fn from(a: BackendArgs) -> Self {
        BackendConfig {
            api_key: a.api_key,
            base_url: a.base_url,
            model: a.model,
            timeout_secs: a.timeout_secs,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a text file, extract summary/claims/evidence, and save the
    /// exchange graph
    Analyze {
        /// UTF-8 text file to analyze
        path: PathBuf,

        /// Sentences kept by the heuristic summary
        #[arg(long, default_value_t = DEFAULT_SUMMARY_SENTENCES)]
        max_sentences: usize,

        /// Where to write the exchange graph JSON
        #[arg(long, default_value = DEFAULT_GRAPH_FILE)]
        graph_out: PathBuf,

        /// Append to an existing graph file instead of replacing it
        #[arg(long)]
        append: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Print the first non-empty lines of a file as bullets
    Digest {
        path: PathBuf,

        #[arg(long, default_value_t = DEFAULT_DIGEST_LINES)]
        lines: usize,
    },

    /// Check that the remote backend accepts the configured credential
    Check {
        #[command(flatten)]
        backend: BackendArgs,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::OUTPUT_ENCODE_FAILED, "Failed to encode output")
            .with_details(e.to_string())
    })?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Analyze {
            path,
            max_sentences,
            graph_out,
            append,
            backend,
        } => {
            let config: BackendConfig = backend.into();
            let reasoner = Reasoner::from_config(&config);
            let resp = analyze(
                &reasoner,
                &AnalyzeRequest {
                    path,
                    max_sentences,
                    graph_out,
                    append,
                },
            )?;
            print_json(&resp)
        }
        Commands::Digest { path, lines } => {
            println!("{}", digest(&path, lines)?);
            Ok(())
        }
        Commands::Check { backend } => {
            let config: BackendConfig = backend.into();
            check_backend(&config)?;
            println!("ok");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = %e.code, retryable = e.retryable, "{e}");
            ExitCode::FAILURE
        }
    }
}
