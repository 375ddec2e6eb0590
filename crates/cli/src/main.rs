// unfollowers - recent unfollowers for a social-graph identity

mod config_cmd;
mod exit_codes;
mod host;
mod logging;
mod present;

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use unfollowers_config::{Session, Settings};
use unfollowers_core::RefreshLifecycle;
use unfollowers_graph_client::{ApiCredentials, FetchError, GraphClient};
use unfollowers_recon::Identity;

use exit_codes::{fetch_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "unfollowers")]
#[command(about = "Show who recently stopped following you")]
#[command(version)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass and print the result
    #[command(after_help = "\
Examples:
  unfollowers check --fid 3
  unfollowers check --limit 10 --json
  NEYNAR_API_KEY=... unfollowers check --fid 3")]
    Check(CheckArgs),

    /// Drive the refresh lifecycle from JSONL host events on stdin
    #[command(after_help = "\
Protocol:
  stdin:  one host event per line, e.g. {\"type\":\"context\",\"fid\":3}
  stdout: {\"type\":\"ready\",...} once, then {\"type\":\"state\",...} per change")]
    Host(ConnectionArgs),

    /// Inspect or change stored configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args)]
struct CheckArgs {
    /// Identity to check (defaults to the saved session)
    #[arg(long, env = "UNFOLLOWERS_FID")]
    fid: Option<u64>,

    /// Maximum unfollowers to report
    #[arg(long)]
    limit: Option<usize>,

    /// Print the lifecycle view as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Args)]
struct ConnectionArgs {
    /// API key (overrides NEYNAR_API_KEY and the keychain)
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Graph API base URL
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective settings and where the API key comes from
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Store the API key in the OS keychain
    SetKey {
        key: String,
    },
    /// Remove the API key from the OS keychain
    DeleteKey,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => cmd_check(args),
        Commands::Host(args) => cmd_host(args),
        Commands::Config(command) => match command {
            ConfigCommands::Show { json } => config_cmd::show(json),
            ConfigCommands::SetKey { key } => config_cmd::set_key(&key),
            ConfigCommands::DeleteKey => config_cmd::delete_key(),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Fetch failures show the generic message; detail is already logged.
    pub fn fetch(err: &FetchError) -> Self {
        let hint = match err {
            FetchError::MissingCredential { env } => {
                Some(format!("no API key found; set {} or run `unfollowers config set-key <KEY>`", env))
            }
            FetchError::Timeout { .. } => {
                Some("raise request_timeout_secs in settings.json or pass --timeout".to_string())
            }
            FetchError::Http { status: 401 | 403, .. } => Some("check the API key".to_string()),
            _ => Some("run with --verbose for details".to_string()),
        };
        Self { code: fetch_exit_code(err), message: err.user_message().to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// shared setup
// ============================================================================

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io(format!("failed to start runtime: {}", e)))
}

fn build_client(settings: &Settings, args: ConnectionArgs) -> Result<GraphClient, CliError> {
    let api_base = args.api_base.unwrap_or_else(|| settings.api_base.clone());
    let timeout = Duration::from_secs(args.timeout.unwrap_or(settings.request_timeout_secs));
    let creds = ApiCredentials::resolve(args.api_key, api_base);
    GraphClient::new(creds, timeout).map_err(|e| CliError::fetch(&e))
}

/// `--fid` / `UNFOLLOWERS_FID`, else the saved session.
fn resolve_identity(fid: Option<u64>) -> Result<Identity, CliError> {
    fid.or_else(|| Session::load().and_then(|s| s.fid))
        .map(Identity)
        .ok_or_else(|| {
            CliError::args("no identity to check")
                .with_hint("pass --fid <FID> or set UNFOLLOWERS_FID")
        })
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(args: CheckArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let identity = resolve_identity(args.fid)?;
    let limit = args.limit.unwrap_or(settings.unfollowers_limit);
    let client = build_client(&settings, args.connection)?;

    let mut lifecycle = RefreshLifecycle::new(client, limit);
    let outcome = runtime()?.block_on(lifecycle.refresh_once(identity));
    let view = lifecycle.view();

    if args.json {
        let json = serde_json::to_string_pretty(&view)
            .map_err(|e| CliError::io(format!("failed to encode view: {}", e)))?;
        println!("{}", json);
    } else if outcome.is_ok() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        present::render_view(&view, *Local::now().offset(), &mut handle)
            .and_then(|_| handle.flush())
            .map_err(|e| CliError::io(e.to_string()))?;
    }

    match outcome {
        Ok(_) => {
            if args.fid.is_some() {
                remember_identity(identity);
            }
            Ok(())
        }
        Err(err) => Err(CliError::fetch(&err)),
    }
}

fn remember_identity(identity: Identity) {
    let session = Session::new(identity.get(), None);
    if let Err(e) = session.save() {
        warn!(error = %e, "could not save session");
    }
}

// ============================================================================
// host
// ============================================================================

fn cmd_host(args: ConnectionArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    // A missing key is reported through the Error state, not up front
    let client = build_client(&settings, args)?;
    let lifecycle = RefreshLifecycle::new(client, settings.unfollowers_limit);

    let rt = runtime()?;
    rt.block_on(async {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        host::run_host(lifecycle, input, tokio::io::stdout()).await
    })
    .map(|_| ())
    .map_err(|e| CliError::io(format!("host I/O failed: {}", e)))
}
