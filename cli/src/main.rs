use clap::{Parser, Subcommand};
use minehut::{ClientConfig, Credentials, MinehutClient, MinehutError, ServerClient, Session};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no credentials; pass --token/--session-id or --email/--password (or the MINEHUT_* env vars)")]
    MissingCredentials,
    #[error(transparent)]
    Api(#[from] MinehutError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "minehut-cli", about = "Minehut server hosting API CLI")]
struct Cli {
    #[arg(long, env = "MINEHUT_BASE_URL", default_value = minehut::config::DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "MINEHUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "MINEHUT_SESSION_ID", hide_env_values = true)]
    session_id: Option<String>,

    #[arg(long, env = "MINEHUT_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "MINEHUT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the session (token, session id, user id).
    Login,
    /// Exchange the token/session pair for a fresh session.
    GhostLogin,
    Servers,
    TopServers,
    Stats,
    PublicPlugins,
    Plugins,
    /// Show a user; defaults to the logged-in account.
    User {
        id: Option<String>,
    },
    /// Look up a server by id, or by name with --by-name.
    Lookup {
        id: String,
        #[arg(long, default_value_t = false)]
        by_name: bool,
    },
    Create {
        name: String,
        #[arg(long, default_value = "java")]
        platform: String,
    },
    /// Operate on one server.
    Server {
        id: String,
        #[command(subcommand)]
        action: ServerAction,
    },
}

#[derive(Subcommand, Debug)]
enum ServerAction {
    Status,
    Data,
    Start,
    Shutdown,
    StartService,
    DestroyService,
    RepairFiles,
    ResetAll,
    ResetWorld,
    Save,
    Command { command: String },
    Rename { name: String },
    Motd { motd: String },
    Visibility {
        #[arg(action = clap::ArgAction::Set)]
        visible: bool,
    },
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    Edit {
        path: String,
        #[arg(long)]
        content: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::default().with_base_url(&cli.base_url)?;
    let mut client = MinehutClient::from_config(&config)?;
    let credentials = Credentials::from_parts(cli.token, cli.session_id, cli.email, cli.password);

    let json = run(&mut client, credentials, cli.command).await?;
    print_json(&json)
}

async fn run(client: &mut MinehutClient, credentials: Option<Credentials>, command: Command) -> Result<Value, CliError> {
    match command {
        Command::Login => {
            let session = match credentials {
                Some(Credentials::Password { email, password }) => client.login(&email, &password).await?,
                Some(Credentials::Ghost { token, session_id }) => client.ghost_login(&token, &session_id).await?,
                None => return Err(CliError::MissingCredentials),
            };
            Ok(session_json(&session))
        }
        Command::GhostLogin => match credentials {
            Some(Credentials::Ghost { token, session_id }) => {
                Ok(session_json(&client.ghost_login(&token, &session_id).await?))
            }
            _ => Err(CliError::MissingCredentials),
        },
        Command::Servers => Ok(client.servers().await?),
        Command::TopServers => Ok(client.top_servers().await?),
        Command::Stats => Ok(client.simple_stats().await?),
        Command::PublicPlugins => Ok(client.public_plugins().await?),
        Command::Lookup { id, by_name } => Ok(client.get_server(&id, by_name).await?),
        Command::Plugins => {
            authenticate(client, credentials).await?;
            Ok(client.plugins().await?)
        }
        Command::User { id: Some(id) } => {
            authenticate(client, credentials).await?;
            Ok(client.get_user(&id).await?)
        }
        Command::User { id: None } => {
            authenticate_with_user_id(client, credentials).await?;
            Ok(client.get_current_user().await?)
        }
        Command::Create { name, platform } => {
            authenticate(client, credentials).await?;
            Ok(client.create_server(&name, &platform).await?)
        }
        Command::Server { id, action } => {
            authenticate(client, credentials).await?;
            run_server(&client.server(id)?, action).await
        }
    }
}

async fn run_server(server: &ServerClient, action: ServerAction) -> Result<Value, CliError> {
    let json = match action {
        ServerAction::Status => server.status().await?,
        ServerAction::Data => server.data().await?,
        ServerAction::Start => server.start().await?,
        ServerAction::Shutdown => server.shutdown().await?,
        ServerAction::StartService => server.start_service().await?,
        ServerAction::DestroyService => server.destroy_service().await?,
        ServerAction::RepairFiles => server.repair_files().await?,
        ServerAction::ResetAll => server.reset_all().await?,
        ServerAction::ResetWorld => server.reset_world().await?,
        ServerAction::Save => server.save().await?,
        ServerAction::Command { command } => server.send_command(&command).await?,
        ServerAction::Rename { name } => server.rename(&name).await?,
        ServerAction::Motd { motd } => server.set_motd(&motd).await?,
        ServerAction::Visibility { visible } => server.set_visibility(visible).await?,
        ServerAction::Ls { path } => server.list_files(&path).await?,
        ServerAction::Edit { path, content } => server.edit_file(&path, &content).await?,
    };
    Ok(json)
}

/// A token/session pair is installed as-is; email/password logs in first.
async fn authenticate(client: &mut MinehutClient, credentials: Option<Credentials>) -> Result<(), CliError> {
    match credentials {
        Some(Credentials::Ghost { token, session_id }) => {
            client.set_session(Session::new(token, session_id)?);
            Ok(())
        }
        Some(Credentials::Password { email, password }) => {
            client.login(&email, &password).await?;
            Ok(())
        }
        None => Err(CliError::MissingCredentials),
    }
}

/// Like [`authenticate`], but a token/session pair goes through ghost login
/// so the session learns its user id.
async fn authenticate_with_user_id(client: &mut MinehutClient, credentials: Option<Credentials>) -> Result<(), CliError> {
    match credentials {
        Some(Credentials::Ghost { token, session_id }) => {
            client.ghost_login(&token, &session_id).await?;
            Ok(())
        }
        other => authenticate(client, other).await,
    }
}

fn session_json(session: &Session) -> Value {
    json!({
        "token": session.token(),
        "sessionId": session.session_id(),
        "userId": session.user_id(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
