use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use clap::{Args, Parser, Subcommand};
use finsight_session::config::ClientConfig;
use finsight_session::guard::{self, GuardDecision};
use finsight_session::net::error::TransportError;
use finsight_session::net::types::ProfileUpdate;
use finsight_session::store::{FileCookieJar, FileStore};
use finsight_session::validation::{self, ValidationError};
use finsight_session::{ApiError, ApiGateway, Navigator, PersistedSessionStore, SessionController, SessionShell};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid query parameter `{0}`; expected key=value")]
    InvalidParam(String),
    #[error("--data must be a JSON object")]
    NotAnObject,
    #[error("no home directory; pass --state-dir or set FINSIGHT_STATE_DIR")]
    NoStateDir,
    #[error("not signed in; run `finsight auth login`")]
    NotSignedIn,
}

#[derive(Parser, Debug)]
#[command(name = "finsight", about = "FinSight finance API client")]
struct Cli {
    /// API base URL.
    #[arg(long, env = "FINSIGHT_API_URL")]
    api_url: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, env = "FINSIGHT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Auth(AuthCommand),
    Transactions(TransactionsCommand),
    Analytics(AnalyticsCommand),
    Insights(InsightsCommand),
    /// Upload a CSV of transactions.
    Upload { file: PathBuf },
    /// Download the CSV template.
    Template {
        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Show what the edge guard would do for a path with the current cookie.
    Guard { path: String },
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "", help = "Login page query string, e.g. ?redirect=%2Finsights")]
        redirect: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Google {
        #[arg(long)]
        credential: String,
    },
    Logout,
    Status,
    Profile {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args, Debug)]
struct TransactionsCommand {
    #[command(subcommand)]
    command: TransactionsSubcommand,
}

#[derive(Subcommand, Debug)]
enum TransactionsSubcommand {
    List {
        #[arg(long = "param", help = "Query filter as key=value; repeatable")]
        params: Vec<String>,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct AnalyticsCommand {
    #[command(subcommand)]
    command: AnalyticsSubcommand,
}

#[derive(Subcommand, Debug)]
enum AnalyticsSubcommand {
    Summary {
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    Anomalies,
    Trends {
        #[arg(long, default_value_t = 3)]
        months: u32,
    },
}

#[derive(Args, Debug)]
struct InsightsCommand {
    #[command(subcommand)]
    command: InsightsSubcommand,
}

#[derive(Subcommand, Debug)]
enum InsightsSubcommand {
    Generate {
        #[arg(long, default_value = "month")]
        period: String,
    },
    List {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Terminal stand-in for the browser location. "Navigating" tells the user
/// where the web app would have sent them.
struct TerminalNavigator {
    path: Mutex<String>,
}

impl TerminalNavigator {
    fn at(path: &str) -> Self {
        Self { path: Mutex::new(path.to_owned()) }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = path.to_owned();
        if path == guard::LOGIN_PATH {
            eprintln!("session expired; run `finsight auth login`");
        } else {
            eprintln!("-> {path}");
        }
    }
}

/// Web view a command corresponds to.
fn view_path(command: &Command) -> &'static str {
    match command {
        Command::Auth(auth) => match auth.command {
            AuthSubcommand::Register { .. } => "/auth/register",
            AuthSubcommand::Profile { .. } | AuthSubcommand::ChangePassword { .. } => "/settings",
            AuthSubcommand::Status => "/home",
            AuthSubcommand::Login { .. } | AuthSubcommand::Google { .. } | AuthSubcommand::Logout => "/auth/login",
        },
        Command::Transactions(_) => "/transactions",
        Command::Analytics(_) => "/dashboard",
        Command::Insights(_) => "/insights",
        Command::Upload { .. } | Command::Template { .. } => "/upload",
        Command::Guard { .. } => "/",
    }
}

// =============================================================================
// ENTRY
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let state_dir = cli.state_dir.or_else(default_state_dir).ok_or(CliError::NoStateDir)?;
    std::fs::create_dir_all(&state_dir)?;

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
    }

    let store = file_store(&state_dir).with_secure_cookie(config.cookie_secure);
    let gateway = Arc::new(ApiGateway::from_config(&config, store)?);
    let controller = Arc::new(SessionController::new(gateway.clone()));
    controller.initialize();

    let navigator = Arc::new(TerminalNavigator::at(view_path(&cli.command)));
    let shell = SessionShell::new(controller.clone(), navigator);
    let mut events = gateway.subscribe();

    let result = dispatch(&controller, cli.command).await;

    while let Ok(event) = events.try_recv() {
        shell.handle_event(event);
    }
    result
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".finsight"))
}

fn file_store(dir: &Path) -> PersistedSessionStore {
    PersistedSessionStore::new(Arc::new(FileStore::in_dir(dir)), Arc::new(FileCookieJar::in_dir(dir)))
}

async fn dispatch(controller: &SessionController, command: Command) -> Result<(), CliError> {
    match command {
        Command::Auth(auth) => run_auth(controller, auth).await,
        Command::Transactions(tx) => run_transactions(controller.gateway(), tx).await,
        Command::Analytics(analytics) => run_analytics(controller.gateway(), analytics).await,
        Command::Insights(insights) => run_insights(controller.gateway(), insights).await,
        Command::Upload { file } => {
            let bytes = std::fs::read(&file)?;
            let name = file.file_name().map_or_else(|| "upload.csv".to_owned(), |n| n.to_string_lossy().into_owned());
            let json = controller.gateway().upload_csv(&name, bytes).await?;
            print_json(&json)
        }
        Command::Template { output } => {
            let csv = controller.gateway().download_template().await?;
            match output {
                Some(path) => std::fs::write(path, csv)?,
                None => print!("{csv}"),
            }
            Ok(())
        }
        Command::Guard { path } => {
            let store = controller.gateway().store();
            let decision = if guard::is_static_asset(&path) {
                GuardDecision::Allow
            } else {
                guard::evaluate(&path, store.cookie_present())
            };
            match decision.location() {
                Some(location) => println!("redirect {location}"),
                None => println!("allow"),
            }
            Ok(())
        }
    }
}

async fn run_auth(controller: &SessionController, auth: AuthCommand) -> Result<(), CliError> {
    match auth.command {
        AuthSubcommand::Login { email, password, redirect } => {
            let user = controller.login(&email, &password).await?;
            println!("signed in as {} <{}>", user.username, user.email);
            println!("next: {}", guard::login_redirect_target(&redirect));
            Ok(())
        }
        AuthSubcommand::Register { email, username, password, confirm } => {
            validation::validate_registration(&email, &username, &password, &confirm)?;
            let user = controller.register(&email, &password, &username).await?;
            println!("registered {} <{}>", user.username, user.email);
            Ok(())
        }
        AuthSubcommand::Google { credential } => {
            let user = controller.login_with_google(&credential).await?;
            println!("signed in as {} <{}>", user.username, user.email);
            Ok(())
        }
        AuthSubcommand::Logout => {
            controller.logout();
            println!("signed out");
            Ok(())
        }
        AuthSubcommand::Status => {
            match controller.user() {
                Some(user) => println!("signed in as {} <{}> ({})", user.username, user.email, user.id),
                None => println!("signed out"),
            }
            Ok(())
        }
        AuthSubcommand::Profile { username, email } => {
            if controller.user().is_none() {
                return Err(CliError::NotSignedIn);
            }
            let user = controller
                .update_profile(ProfileUpdate { username, email })
                .await?
                .ok_or(CliError::NotSignedIn)?;
            println!("profile updated: {} <{}>", user.username, user.email);
            Ok(())
        }
        AuthSubcommand::ChangePassword { current, new, confirm } => {
            validation::validate_password_change(&current, &new, &confirm)?;
            controller.gateway().change_password(&current, &new).await?;
            println!("password changed");
            Ok(())
        }
    }
}

async fn run_transactions(gateway: &ApiGateway, tx: TransactionsCommand) -> Result<(), CliError> {
    let json = match tx.command {
        TransactionsSubcommand::List { params } => {
            let pairs = params.iter().map(|raw| parse_param(raw)).collect::<Result<Vec<_>, _>>()?;
            gateway.list_transactions(&pairs).await?
        }
        TransactionsSubcommand::Create { data } => gateway.create_transaction(parse_object(&data)?).await?,
        TransactionsSubcommand::Update { id, data } => gateway.update_transaction(&id, parse_object(&data)?).await?,
        TransactionsSubcommand::Delete { id } => gateway.delete_transaction(&id).await?,
    };
    print_json(&json)
}

async fn run_analytics(gateway: &ApiGateway, analytics: AnalyticsCommand) -> Result<(), CliError> {
    let json = match analytics.command {
        AnalyticsSubcommand::Summary { start_date, end_date } => {
            gateway.summary(start_date.as_deref(), end_date.as_deref()).await?
        }
        AnalyticsSubcommand::Anomalies => gateway.anomalies().await?,
        AnalyticsSubcommand::Trends { months } => gateway.trends(months).await?,
    };
    print_json(&json)
}

async fn run_insights(gateway: &ApiGateway, insights: InsightsCommand) -> Result<(), CliError> {
    let json = match insights.command {
        InsightsSubcommand::Generate { period } => gateway.generate_insights(&period).await?,
        InsightsSubcommand::List { limit } => gateway.insights(limit).await?,
    };
    print_json(&json)
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_param(raw: &str) -> Result<(&str, &str), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(CliError::InvalidParam(raw.to_owned())),
    }
}

fn parse_object(raw: &str) -> Result<Value, CliError> {
    let value = serde_json::from_str::<Value>(raw)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CliError::NotAnObject)
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
