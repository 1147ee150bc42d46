use clap::{Parser, Subcommand};
use diesel::{Connection, SqliteConnection};
use diesel_migrations::MigrationHarness;
use matchday::{
    MIGRATIONS,
    auth::bootstrap::ensure_admin,
    config::{Config, app_state, create_app, normalize_database_url},
    state::build_pool,
};
use tokio::task::spawn_blocking;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Runs a football league: teams, fixtures, results and the table.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server (the default).
    Serve {
        /// Overrides BIND_ADDRESS.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create an admin account in the database named by DATABASE_URL.
    CreateAdmin { username: String, password: String },
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let res = match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(bind).await,
        Command::CreateAdmin { username, password } => {
            create_admin(username, password).await
        }
    };

    if let Err(e) = res {
        tracing::error!(error = %e, "exiting");
        std::process::exit(1);
    }
}

async fn serve(bind: Option<String>) -> Result<(), BoxError> {
    let config = Config::from_env()?;
    let key = config.session_key()?;
    let addr = bind.unwrap_or_else(|| config.bind_address.clone());
    let environment = config.environment;

    let pool = config.database_url.as_deref().map(build_pool);
    let state = app_state(pool, key, config);

    match state.pool.clone() {
        Some(pool) => {
            let setup = state.clone();
            let prepared = spawn_blocking(move || -> Result<(), BoxError> {
                let mut conn = pool.get()?;
                setup.ensure_prepared(&mut conn)?;
                Ok(())
            })
            .await?;

            // retried on every request until it succeeds
            if let Err(e) = prepared {
                tracing::error!(
                    error = %e,
                    "could not prepare the database; database pages will fail until it is reachable"
                );
            }
        }
        None => {
            tracing::warn!(
                "DATABASE_URL is not set; pages which need the database will \
                 answer 503 until it is configured"
            );
        }
    }

    tracing::info!(
        %addr,
        environment = environment.as_str(),
        "starting matchday"
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_admin(username: String, password: String) -> Result<(), BoxError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set to create an admin")?;
    let url = normalize_database_url(&url)?;

    spawn_blocking(move || -> Result<(), BoxError> {
        let mut conn = SqliteConnection::establish(&url)?;
        conn.run_pending_migrations(MIGRATIONS)?;

        if ensure_admin(username.trim(), &password, &mut conn)? {
            tracing::info!(username = username.trim(), "created admin");
        } else {
            tracing::warn!(username = username.trim(), "that admin already exists");
        }
        Ok(())
    })
    .await?
}
