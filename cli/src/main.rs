use std::path::PathBuf;
use std::sync::Arc;

use authsession::{AuthController, ClientConfig, FileStore, FlowOutcome, HttpAuthApi};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] authsession::ConfigError),
    #[error("http client setup failed: {0}")]
    Api(#[from] authsession::ApiError),
    #[error("missing password; pass --password or set AUTH_PASSWORD")]
    MissingPassword,
    #[error("invalid field `{0}`; expected key=value")]
    InvalidField(String),
    #[error("{0}")]
    Flow(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authsession-cli", about = "Log in, register and inspect the persisted auth session")]
struct Cli {
    /// Overrides `AUTH_BACKEND_URL`.
    #[arg(long)]
    backend_url: Option<String>,

    /// Overrides `AUTH_TOKEN_FILE`.
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the restored session state and user.
    Status,
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Register {
        /// Registration field as `key=value`; values that parse as JSON are sent as JSON.
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(path) = cli.token_file {
        config.token_file = path;
    }

    let store = Arc::new(FileStore::new(&config.token_file));
    let api = Arc::new(HttpAuthApi::from_config(&config)?);
    let mut session = AuthController::new(store, api);
    session.restore_session().await;

    match cli.command {
        Command::Status => print_status(&session),
        Command::Login { username, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let outcome = session.login(&username, &password).await;
            finish(outcome)
        }
        Command::Register { fields } => {
            let body = parse_fields(&fields)?;
            let outcome = session.register(&body).await;
            finish(outcome)
        }
        Command::Logout => {
            let destination = session.logout();
            println!("navigate: {destination}");
            Ok(())
        }
    }
}

fn print_status(session: &AuthController) -> Result<(), CliError> {
    println!("state: {}", session.state().as_str());
    if let Some(user) = session.user() {
        println!("{}", serde_json::to_string_pretty(user)?);
    }
    Ok(())
}

fn finish(outcome: FlowOutcome) -> Result<(), CliError> {
    match outcome {
        FlowOutcome::Success { navigate } => {
            println!("navigate: {navigate}");
            Ok(())
        }
        FlowOutcome::Failure { message } => Err(CliError::Flow(message)),
    }
}

fn parse_fields(raw: &[String]) -> Result<Map<String, Value>, CliError> {
    let mut body = Map::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CliError::InvalidField(entry.clone()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::InvalidField(entry.clone()));
        }
        let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_owned()));
        body.insert(key.to_owned(), value);
    }
    Ok(body)
}
