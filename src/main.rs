//! `out2nite` command-line client.
//!
//! Drives the session controller against a live backend: sign in or out,
//! inspect the persisted session, ask the route guard about a view, and list
//! activities once authenticated. Results go to stdout as JSON; logs go to
//! stderr.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use out2nite::activities::{self, ActivityError, ActivityFilter};
use out2nite::config::{ClientConfig, ConfigError, ConfigOverrides};
use out2nite::session::{LOGIN_FAILED, REGISTRATION_FAILED};
use out2nite::{FileCredentialStore, GatewayError, GuardDecision, HttpGateway, RouteGuard, Session, SessionController};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Rejected(String),
    #[error("not signed in; run `out2nite login` first")]
    NotSignedIn,
    #[error("activities request failed: {0}")]
    Activities(#[from] ActivityError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "out2nite", about = "Out2Nite session client")]
struct Cli {
    /// Backend base URL (overrides `OUT2NITE_API_URL`).
    #[arg(long, env = "OUT2NITE_API_URL")]
    api_url: Option<String>,

    /// Where the access token is persisted (overrides `OUT2NITE_CREDENTIAL_PATH`).
    #[arg(long, env = "OUT2NITE_CREDENTIAL_PATH")]
    credential_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange username and password for a token, then load the profile.
    Login(LoginArgs),
    /// Create an account and sign in with it.
    Register(RegisterArgs),
    /// Invalidate the server session and forget the local token.
    Logout,
    /// Print the signed-in user's profile.
    Whoami,
    /// Print the full session snapshot.
    Status,
    /// Ask the route guard whether a view may render.
    Route { path: String },
    /// List activities, optionally filtered.
    Activities(ActivitiesArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    username: String,
    #[arg(long, env = "OUT2NITE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "OUT2NITE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct ActivitiesArgs {
    /// Case-insensitive match on name, event type and music link.
    #[arg(long)]
    search: Option<String>,
    /// Event type chip, e.g. `Concert`.
    #[arg(long = "type")]
    event_type: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let controller = build_controller(&cli)?;

    match cli.command {
        Command::Login(args) => {
            let session = controller.login(&args.username, &args.password).await;
            signed_in_user(session, LOGIN_FAILED)
        }
        Command::Register(args) => {
            let session = controller.register(&args.username, &args.email, &args.password).await;
            signed_in_user(session, REGISTRATION_FAILED)
        }
        Command::Logout => {
            let session = controller.logout().await;
            print_json(&session)
        }
        Command::Whoami => {
            let session = controller.restore().await;
            match session.user {
                Some(user) if session.is_authenticated => print_json(&user),
                _ => Err(CliError::NotSignedIn),
            }
        }
        Command::Status => {
            let session = controller.restore().await;
            print_json(&json!({ "phase": session.phase(), "session": session }))
        }
        Command::Route { path } => {
            let session = controller.restore().await;
            let decision = match RouteGuard::default().check(&session, &path) {
                GuardDecision::Allow => json!({ "path": path, "decision": "allow" }),
                GuardDecision::Redirect(to) => json!({ "path": path, "decision": "redirect", "to": to }),
                GuardDecision::Pending => json!({ "path": path, "decision": "pending" }),
            };
            print_json(&decision)
        }
        Command::Activities(args) => {
            controller.restore().await;
            let all = activities::fetch_activities(&controller).await?;
            let filter = ActivityFilter { query: args.search, event_type: args.event_type };
            print_json(&filter.apply(&all))
        }
    }
}

fn build_controller(cli: &Cli) -> Result<SessionController, CliError> {
    let config = ClientConfig::from_env_with(ConfigOverrides {
        api_url: cli.api_url.clone(),
        credential_path: cli.credential_path.clone(),
    })?;
    tracing::debug!(base_url = %config.base_url, path = %config.credential_path.display(), "client configured");

    let gateway = HttpGateway::from_config(&config)?;
    let store = FileCredentialStore::new(config.credential_path);
    Ok(SessionController::new(Arc::new(gateway), Arc::new(store)))
}

fn signed_in_user(session: Session, fallback: &str) -> Result<(), CliError> {
    match session.user {
        Some(user) if session.is_authenticated => print_json(&user),
        _ => Err(CliError::Rejected(session.error.unwrap_or_else(|| fallback.to_owned()))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
